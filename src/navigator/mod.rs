//! Navigator controller
//!
//! Owns the response under construction and interprets Select against the
//! focused cell of the [`FocusGrid`]. Every operation is a synchronous
//! reducer: it mutates state and returns the [`Effect`]s the runtime must
//! carry out. Network results come back through [`Navigator::on_suggestions`].
//!
//! ```text
//! Idle ──start──▶ AwaitingSpeech ──Select "Start Typing"──▶ SuggestionsLoading
//!                     ▲                                           │
//!                     │ settle                                    ▼
//!                 Submitting ◀──Submit / sentence / Enter── SuggestionsReady
//!
//! speech error (aborted, no-speech) ──▶ RepeatPrompt ──Select──▶ AwaitingSpeech
//! ```

pub mod draft;

pub use draft::ResponseDraft;

use crate::effects::Effect;
use crate::grid::{
    move_selection, reconcile_selection, Direction, FocusCell, FocusGrid, GridInputs, KeyAction,
    KeyCell, KeyboardLayout,
};
use crate::suggest::{
    RequestTracker, SentenceSuggestion, SuggestError, SuggestionNode, SuggestionRequest,
    Suggestions,
};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// Placeholder labels and fixed prompts
// ─────────────────────────────────────────────────────────────────────────────

pub const START_TYPING: &str = "Start Typing";
pub const LOADING_RESPONSES: &str = "Loading Responses...";
pub const UPDATING_SUGGESTIONS: &str = "Updating suggestions...";
pub const NO_SUGGESTIONS: &str = "No suggestions available";
pub const UNABLE_TO_LOAD: &str = "Unable to load responses";
pub const REPEAT_OPTION: &str = "Ask to repeat again";
pub const REPEAT_SPOKEN_TEXT: &str = "Can you please repeat that";
pub const REPEAT_ERROR_MESSAGE: &str = "We didn't catch that. Please ask them to repeat.";
pub const MICROPHONE_BLOCKED: &str =
    "Microphone access was blocked. Allow it in your system settings and try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No session, or listening is off with no active question
    Idle,
    AwaitingSpeech,
    SuggestionsLoading,
    SuggestionsReady,
    /// Response spoken; waiting for the settle timer
    Submitting,
    RepeatPrompt,
}

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guest,
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Guest => write!(f, "guest"),
            Role::User => write!(f, "user"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationEntry {
    pub role: Role,
    pub text: String,
}

/// Errors reported by the transcription collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechErrorKind {
    /// Microphone permission denied (`not-allowed`, `service-not-allowed`)
    NotAllowed,
    Aborted,
    NoSpeech,
    Other(String),
}

impl SpeechErrorKind {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "not-allowed" | "service-not-allowed" => Self::NotAllowed,
            "aborted" => Self::Aborted,
            "no-speech" => Self::NoSpeech,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Tunables for the navigator
#[derive(Debug, Clone)]
pub struct NavigatorSettings {
    pub suggestions_count: u32,
    pub settle_delay: Duration,
    pub viewport_width: u16,
}

impl Default for NavigatorSettings {
    fn default() -> Self {
        Self {
            suggestions_count: 5,
            settle_delay: Duration::from_millis(220),
            viewport_width: 1024,
        }
    }
}

/// Serializable view of the navigator for rendering and replay output
#[derive(Debug, Clone, Serialize)]
pub struct NavigatorSnapshot {
    pub phase: Phase,
    pub listening: bool,
    pub transcription_disabled: bool,
    pub transcript: String,
    pub question: Option<String>,
    pub speech_error: Option<String>,
    pub sentences: Vec<SentenceSuggestion>,
    pub words: Vec<String>,
    pub response: String,
    pub confirmed: Vec<String>,
    pub pending: String,
    pub submit_visible: bool,
    pub keyboard_open: bool,
    pub cells: Vec<FocusCell>,
    pub selected: usize,
    pub focused: Option<FocusCell>,
    pub history: Vec<ConversationEntry>,
}

pub struct Navigator {
    settings: NavigatorSettings,
    phase: Phase,
    running: bool,
    listening: bool,
    /// One-way for the session; only `start_session` clears it
    transcription_disabled: bool,
    finals: Vec<String>,
    interim: String,
    speech_error: Option<String>,
    active_question: Option<String>,
    /// Labels of the word section (placeholders included)
    options: Vec<String>,
    /// Nodes behind `options` when they are real suggestions
    forest: Vec<SuggestionNode>,
    sentences: Vec<SentenceSuggestion>,
    draft: ResponseDraft,
    keyboard_open: bool,
    grid: FocusGrid,
    selected: usize,
    history: Vec<ConversationEntry>,
    tracker: RequestTracker,
    settle_generation: u64,
    settle_pending: bool,
}

impl Navigator {
    pub fn new(settings: NavigatorSettings) -> Self {
        let mut navigator = Self {
            settings,
            phase: Phase::Idle,
            running: false,
            listening: false,
            transcription_disabled: false,
            finals: Vec::new(),
            interim: String::new(),
            speech_error: None,
            active_question: None,
            options: vec![START_TYPING.to_string()],
            forest: Vec::new(),
            sentences: Vec::new(),
            draft: ResponseDraft::new(),
            keyboard_open: false,
            grid: FocusGrid::default(),
            selected: 0,
            history: Vec::new(),
            tracker: RequestTracker::new(),
            settle_generation: 0,
            settle_pending: false,
        };
        navigator.refresh(true);
        navigator
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn transcription_disabled(&self) -> bool {
        self.transcription_disabled
    }

    pub fn grid(&self) -> &FocusGrid {
        &self.grid
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn focused(&self) -> Option<&FocusCell> {
        self.grid.get(self.selected)
    }

    pub fn draft(&self) -> &ResponseDraft {
        &self.draft
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn sentences(&self) -> &[SentenceSuggestion] {
        &self.sentences
    }

    pub fn history(&self) -> &[ConversationEntry] {
        &self.history
    }

    pub fn speech_error(&self) -> Option<&str> {
        self.speech_error.as_deref()
    }

    pub fn keyboard_open(&self) -> bool {
        self.keyboard_open
    }

    /// Final and interim transcript, space-joined
    pub fn transcript(&self) -> String {
        let finals = self.finals.join(" ");
        [finals.as_str(), self.interim.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    }

    pub fn snapshot(&self) -> NavigatorSnapshot {
        NavigatorSnapshot {
            phase: self.phase,
            listening: self.listening,
            transcription_disabled: self.transcription_disabled,
            transcript: self.transcript(),
            question: self.active_question.clone(),
            speech_error: self.speech_error.clone(),
            sentences: self.sentences.clone(),
            words: self.options.clone(),
            response: self.draft.trimmed(),
            confirmed: self.draft.confirmed().to_vec(),
            pending: self.draft.pending().to_string(),
            submit_visible: !self.draft.is_blank(),
            keyboard_open: self.keyboard_open,
            cells: self.grid.cells().to_vec(),
            selected: self.selected,
            focused: self.focused().cloned(),
            history: self.history.clone(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    pub fn start_session(&mut self) -> Vec<Effect> {
        tracing::info!("Session started");
        self.running = true;
        self.transcription_disabled = false;
        let mut effects = self.reset();
        effects.extend(self.start_transcription());
        self.phase = self.resting_phase();
        effects
    }

    pub fn stop_session(&mut self) -> Vec<Effect> {
        tracing::info!("Session stopped");
        self.running = false;
        let mut effects = self.stop_transcription();
        effects.extend(self.reset());
        self.phase = Phase::Idle;
        effects
    }

    /// Entering agent mode silences transcription for the rest of the session
    pub fn disable_transcription(&mut self) -> Vec<Effect> {
        if !self.transcription_disabled {
            tracing::info!("Transcription disabled for this session");
        }
        self.transcription_disabled = true;
        if self.listening {
            let effects = self.stop_transcription();
            if self.phase == Phase::AwaitingSpeech {
                self.phase = Phase::Idle;
            }
            return effects;
        }
        Vec::new()
    }

    pub fn set_viewport_width(&mut self, width: u16) {
        if self.settings.viewport_width != width {
            self.settings.viewport_width = width;
            self.refresh(false);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transcription collaborator
    // ─────────────────────────────────────────────────────────────────────────

    pub fn on_transcript(&mut self, text: &str, is_final: bool) {
        if !self.listening {
            tracing::debug!("Ignoring transcript while not listening");
            return;
        }
        let text = text.trim();
        if is_final {
            if !text.is_empty() {
                self.finals.push(text.to_string());
            }
            self.interim.clear();
        } else {
            self.interim = text.to_string();
        }
    }

    pub fn on_speech_error(&mut self, error: SpeechErrorKind) -> Vec<Effect> {
        tracing::warn!(?error, "Speech recognition error");
        match error {
            SpeechErrorKind::NotAllowed => {
                self.speech_error = Some(MICROPHONE_BLOCKED.to_string());
                let effects = self.stop_transcription();
                if self.phase == Phase::AwaitingSpeech {
                    self.phase = Phase::Idle;
                }
                effects
            }
            SpeechErrorKind::Aborted | SpeechErrorKind::NoSpeech => {
                self.repeat_prompt(Some(REPEAT_ERROR_MESSAGE))
            }
            SpeechErrorKind::Other(message) => {
                self.speech_error = Some(if message.is_empty() {
                    "Speech recognition error".to_string()
                } else {
                    message
                });
                Vec::new()
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Gestures
    // ─────────────────────────────────────────────────────────────────────────

    /// Directional gestures only move the selection
    pub fn navigate(&mut self, direction: Direction) {
        self.selected = move_selection(self.selected, direction, self.grid.shape());
        tracing::trace!(%direction, selected = self.selected, "navigate");
    }

    pub fn toggle_keyboard(&mut self) {
        self.keyboard_open = !self.keyboard_open;
        tracing::debug!(open = self.keyboard_open, "keyboard toggled");
        self.refresh(false);
    }

    /// Interpret Select against the focused cell
    pub fn select(&mut self) -> Vec<Effect> {
        let Some(cell) = self.focused().cloned() else {
            return Vec::new();
        };

        match cell {
            FocusCell::Key(key) => self.press_key(&key),
            FocusCell::Submit => {
                if self.draft.is_blank() {
                    return Vec::new();
                }
                self.submit(None)
            }
            FocusCell::Sentence { index } => self.select_sentence(index),
            FocusCell::Word { index } => self.select_word(index),
        }
    }

    fn select_sentence(&mut self, index: usize) -> Vec<Effect> {
        let Some(text) = self.sentences.get(index).map(|s| s.text.trim().to_string()) else {
            return Vec::new();
        };
        if text.is_empty() {
            return Vec::new();
        }

        self.draft.replace_with(&text);
        self.sentences.clear();
        self.forest.clear();
        self.options.clear();
        self.refresh(true);
        self.submit(Some(text))
    }

    fn select_word(&mut self, index: usize) -> Vec<Effect> {
        let Some(label) = self.options.get(index).map(|o| o.trim().to_string()) else {
            return Vec::new();
        };
        let normalized = label.to_lowercase();

        if label.is_empty()
            || normalized == LOADING_RESPONSES.to_lowercase()
            || normalized == UPDATING_SUGGESTIONS.to_lowercase()
        {
            return Vec::new();
        }

        if normalized == REPEAT_OPTION.to_lowercase() {
            return self.ask_to_repeat();
        }

        if matches!(self.phase, Phase::SuggestionsLoading | Phase::Submitting) {
            tracing::debug!(phase = ?self.phase, "Ignoring word selection");
            return Vec::new();
        }

        if normalized == START_TYPING.to_lowercase() {
            return self.capture_question();
        }

        let Some(node) = self.forest.get(index).cloned() else {
            // Placeholder rows such as "No suggestions available"
            return Vec::new();
        };

        self.draft.accept_word(&node.word);
        self.sentences.clear();
        if node.children.is_empty() {
            self.forest.clear();
            self.options = vec![START_TYPING.to_string()];
        } else {
            self.options = node.children.iter().map(|c| c.word.clone()).collect();
            self.forest = node.children;
        }
        tracing::debug!(word = %node.word, response = %self.draft.text(), "word accepted");
        self.refresh(true);
        Vec::new()
    }

    /// "Start Typing": the transcript so far becomes the question
    fn capture_question(&mut self) -> Vec<Effect> {
        let question = self.transcript();
        let mut effects = self.stop_transcription();

        if question.is_empty() {
            effects.extend(self.repeat_prompt(Some(REPEAT_ERROR_MESSAGE)));
            return effects;
        }

        let duplicate = self
            .history
            .last()
            .is_some_and(|last| last.role == Role::Guest && last.text == question);
        if !duplicate {
            self.history.push(ConversationEntry {
                role: Role::Guest,
                text: question.clone(),
            });
        }

        tracing::info!(question = %question, "Question captured");
        self.active_question = Some(question);
        let partial = self.draft.trimmed();
        effects.extend(self.request_suggestions(partial, LOADING_RESPONSES));
        effects
    }

    /// Re-speak the fixed prompt and go back to listening
    fn ask_to_repeat(&mut self) -> Vec<Effect> {
        let mut effects = vec![Effect::Speak(REPEAT_SPOKEN_TEXT.to_string())];
        self.speech_error = None;
        effects.extend(self.stop_transcription());
        effects.extend(self.reset());
        effects.extend(self.start_transcription());
        self.phase = self.resting_phase();
        effects
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Keyboard
    // ─────────────────────────────────────────────────────────────────────────

    fn press_key(&mut self, key: &KeyCell) -> Vec<Effect> {
        if self.phase == Phase::Submitting && key.action != KeyAction::Enter {
            return Vec::new();
        }

        match key.action {
            KeyAction::Input => {
                let value = key.value.as_deref().unwrap_or(&key.label);
                if value.is_empty() {
                    return Vec::new();
                }
                self.draft.push(value);
                self.refresh(false);
                Vec::new()
            }
            KeyAction::Space => {
                if !self.draft.commit_pending() {
                    self.refresh(false);
                    return Vec::new();
                }
                self.sentences.clear();
                let partial = self.draft.confirmed_text();
                self.request_suggestions(partial, UPDATING_SUGGESTIONS)
            }
            KeyAction::Backspace => {
                self.draft.backspace();
                self.refresh(false);
                Vec::new()
            }
            KeyAction::Clear => {
                self.draft.clear();
                self.sentences.clear();
                self.request_suggestions(String::new(), UPDATING_SUGGESTIONS)
            }
            KeyAction::Enter => {
                self.draft.commit_pending();
                let text = self.draft.trimmed();
                if text.is_empty() {
                    self.refresh(false);
                    return Vec::new();
                }
                self.submit(Some(text))
            }
            KeyAction::Suggestion => {
                let word = key
                    .value
                    .as_deref()
                    .unwrap_or(&key.label)
                    .trim()
                    .to_string();
                if word.is_empty() {
                    self.draft.commit_pending();
                    self.refresh(false);
                    return Vec::new();
                }
                self.draft.complete_fragment(&word);
                self.sentences.clear();
                let partial = self.draft.confirmed_text();
                self.request_suggestions(partial, UPDATING_SUGGESTIONS)
            }
            KeyAction::Noop => Vec::new(),
        }
    }

    /// Type free text as if picked key by key (developer console). A newline
    /// presses Enter and `\u{8}` Backspace.
    pub fn type_text(&mut self, text: &str) -> Vec<Effect> {
        let mut effects = Vec::new();
        for ch in text.chars() {
            let action = match ch {
                ' ' => KeyAction::Space,
                '\n' => KeyAction::Enter,
                '\u{8}' => KeyAction::Backspace,
                _ => KeyAction::Input,
            };
            let key = KeyCell {
                row: 0,
                column: 0,
                action,
                label: ch.to_string(),
                value: Some(ch.to_lowercase().to_string()),
            };
            effects.extend(self.press_key(&key));
        }
        effects
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Suggestions
    // ─────────────────────────────────────────────────────────────────────────

    fn request_suggestions(&mut self, partial_answer: String, loading: &str) -> Vec<Effect> {
        let Some(question) = self
            .active_question
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string)
        else {
            tracing::debug!("No active question, skipping suggestion request");
            self.refresh(false);
            return Vec::new();
        };

        let conversation = self
            .history
            .iter()
            .map(|entry| format!("{}: {}", entry.role, entry.text))
            .collect::<Vec<_>>()
            .join("\n");

        let request_id = self.tracker.issue();
        self.options = vec![loading.to_string()];
        self.forest.clear();
        self.sentences.clear();
        self.phase = Phase::SuggestionsLoading;
        self.refresh(true);

        tracing::debug!(request_id, partial_answer = %partial_answer, "suggestions requested");
        vec![Effect::RequestSuggestions {
            request_id,
            request: SuggestionRequest {
                question,
                partial_answer,
                conversation,
                suggestions_count: self.settings.suggestions_count,
            },
        }]
    }

    /// Apply a finished suggestion round. Stale rounds are dropped silently.
    pub fn on_suggestions(&mut self, request_id: u64, result: Result<Suggestions, SuggestError>) {
        if !self.tracker.is_current(request_id) {
            tracing::debug!(request_id, "Discarding stale suggestion result");
            return;
        }

        match result {
            Ok(suggestions) => {
                self.sentences = suggestions.sentences;
                if suggestions.forest.is_empty() {
                    self.forest.clear();
                    self.options = vec![NO_SUGGESTIONS.to_string(), START_TYPING.to_string()];
                } else {
                    self.options = suggestions.forest.iter().map(|n| n.word.clone()).collect();
                    self.forest = suggestions.forest;
                }
                tracing::info!(
                    words = self.forest.len(),
                    sentences = self.sentences.len(),
                    "Suggestions loaded"
                );
            }
            Err(e) => {
                tracing::warn!("Failed to load suggestions: {}", e);
                self.forest.clear();
                self.sentences.clear();
                self.options = vec![UNABLE_TO_LOAD.to_string(), START_TYPING.to_string()];
            }
        }

        self.phase = Phase::SuggestionsReady;
        self.refresh(true);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Submission
    // ─────────────────────────────────────────────────────────────────────────

    fn submit(&mut self, text: Option<String>) -> Vec<Effect> {
        let spoken = text.unwrap_or_else(|| self.draft.trimmed());
        let spoken = spoken.trim().to_string();
        if spoken.is_empty() {
            return Vec::new();
        }

        let duplicate = self
            .history
            .last()
            .is_some_and(|last| last.role == Role::User && last.text == spoken);
        if !duplicate {
            self.history.push(ConversationEntry {
                role: Role::User,
                text: spoken.clone(),
            });
        }

        let mut effects = Vec::new();
        if self.settle_pending {
            effects.push(Effect::CancelSettle);
        }
        effects.push(Effect::Speak(spoken.clone()));
        effects.extend(self.stop_transcription());

        // A round requested for the old draft no longer applies
        self.tracker.invalidate();
        self.settle_generation += 1;
        self.settle_pending = true;
        self.phase = Phase::Submitting;
        effects.push(Effect::ScheduleSettle {
            generation: self.settle_generation,
            delay: self.settings.settle_delay,
        });

        tracing::info!(response = %spoken, "Response submitted");
        self.refresh(false);
        effects
    }

    /// Settle timer fired: clear the turn and listen again
    pub fn on_settle(&mut self, generation: u64) -> Vec<Effect> {
        if !self.settle_pending || generation != self.settle_generation {
            tracing::debug!(generation, "Ignoring superseded settle timer");
            return Vec::new();
        }
        self.settle_pending = false;
        self.finals.clear();
        self.interim.clear();

        let mut effects = self.reset();
        if self.running {
            effects.extend(self.start_transcription());
        }
        self.phase = self.resting_phase();
        effects
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    fn start_transcription(&mut self) -> Vec<Effect> {
        if self.transcription_disabled {
            tracing::debug!("Transcription disabled, not starting");
            return Vec::new();
        }
        self.speech_error = None;
        self.finals.clear();
        self.interim.clear();
        if self.listening {
            return Vec::new();
        }
        self.listening = true;
        vec![Effect::StartTranscription]
    }

    fn stop_transcription(&mut self) -> Vec<Effect> {
        self.interim.clear();
        if !self.listening {
            return Vec::new();
        }
        self.listening = false;
        vec![Effect::StopTranscription]
    }

    fn repeat_prompt(&mut self, message: Option<&str>) -> Vec<Effect> {
        if let Some(message) = message.filter(|m| !m.trim().is_empty()) {
            self.speech_error = Some(message.to_string());
        }
        let effects = self.stop_transcription();
        self.tracker.invalidate();
        self.options = vec![REPEAT_OPTION.to_string()];
        self.sentences.clear();
        self.forest.clear();
        self.draft.clear();
        self.keyboard_open = false;
        self.finals.clear();
        self.interim.clear();
        self.phase = Phase::RepeatPrompt;
        self.refresh(true);
        effects
    }

    /// Back to a fresh turn. Cancels any pending settle timer.
    fn reset(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.settle_pending {
            self.settle_pending = false;
            effects.push(Effect::CancelSettle);
        }
        self.options = vec![START_TYPING.to_string()];
        self.forest.clear();
        self.sentences.clear();
        self.draft.clear();
        self.active_question = None;
        self.tracker.invalidate();
        self.keyboard_open = false;
        self.selected = 0;
        self.phase = self.resting_phase();
        self.refresh(true);
        effects
    }

    fn resting_phase(&self) -> Phase {
        if self.running && self.listening {
            Phase::AwaitingSpeech
        } else {
            Phase::Idle
        }
    }

    /// Rebuild the grid from current state and carry the selection over
    fn refresh(&mut self, new_round: bool) {
        let layout = self
            .keyboard_open
            .then(|| KeyboardLayout::build(self.draft.pending()));
        let grid = FocusGrid::build(GridInputs {
            sentence_count: self.sentences.len(),
            word_count: self.options.len(),
            submit: !self.draft.is_blank(),
            keyboard: layout.as_ref(),
            viewport_width: self.settings.viewport_width,
        });
        self.selected = reconcile_selection(self.grid.shape(), self.selected, grid.shape(), new_round);
        self.grid = grid;
    }
}
