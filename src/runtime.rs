// Runtime - executes controller effects and owns the event loop
//
// The session is only ever touched from one task. Network calls and the
// settle timer run as spawned tasks and report back over the event channel,
// tagged with the id or generation they were issued under.
//
//   input (replay / console) ──┐
//                              ├──► Runtime::handle ──► Session ──► Vec<Effect>
//   spawned tasks ─────────────┘          ▲                              │
//                                         └──────── Runtime::execute ◄───┘

use crate::agent::{DemoMailSender, MailClient, MailError, MailSender};
use crate::chat::{
    converse, ChatClient, ChatError, DemoChatClient, HttpChatClient, MailTools, ToolRunner,
};
use crate::config::Config;
use crate::effects::Effect;
use crate::http::SharedHttpClient;
use crate::input::{read_events, InputEvent, SessionAction};
use crate::navigator::SpeechErrorKind;
use crate::session::{Session, SessionSnapshot};
use crate::speech::{build_speaker, SpeechOutput};
use crate::suggest::{
    DemoSuggestionSource, HttpSuggestionSource, SuggestError, SuggestionSource, Suggestions,
};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncBufRead;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Channel capacity for input and completion events
pub const CHANNEL_CAPACITY: usize = 256;

/// Everything the loop can be woken up by
#[derive(Debug)]
pub enum AppEvent {
    Input(InputEvent),
    SuggestionsLoaded {
        request_id: u64,
        result: Result<Suggestions, SuggestError>,
    },
    MailSent {
        request_id: u64,
        result: Result<(), MailError>,
    },
    SettleElapsed {
        generation: u64,
    },
    ChatReplied {
        request_id: u64,
        result: Result<String, ChatError>,
    },
}

/// External collaborators the effects are carried out against
pub struct Services {
    pub suggestions: Arc<dyn SuggestionSource>,
    pub mailer: Arc<dyn MailSender>,
    pub chat: Arc<dyn ChatClient>,
    /// Tools the chat assistant may call
    pub chat_tools: Arc<dyn ToolRunner>,
    pub speaker: Box<dyn SpeechOutput>,
}

impl Services {
    pub fn from_config(config: &Config) -> Self {
        let speaker = build_speaker(config.speech_command.as_deref());
        if config.demo {
            tracing::info!("Running in DEMO MODE - canned suggestions, mail is only logged");
            let mailer: Arc<dyn MailSender> = Arc::new(DemoMailSender);
            return Self {
                suggestions: Arc::new(DemoSuggestionSource::new()),
                chat: Arc::new(DemoChatClient),
                chat_tools: Arc::new(MailTools::new(mailer.clone())),
                mailer,
                speaker,
            };
        }

        let http = Arc::new(SharedHttpClient::new(config.request_timeout()));
        let mailer: Arc<dyn MailSender> =
            Arc::new(MailClient::new(http.clone(), &config.mail_base_url));
        Self {
            suggestions: Arc::new(HttpSuggestionSource::new(http.clone(), &config.api_base_url)),
            chat: Arc::new(HttpChatClient::new(
                http,
                &config.chat_base_url,
                &config.chat_model,
                config.chat_api_key.clone(),
            )),
            chat_tools: Arc::new(MailTools::new(mailer.clone())),
            mailer,
            speaker,
        }
    }
}

pub struct Runtime {
    session: Session,
    services: Services,
    events_tx: mpsc::Sender<AppEvent>,
    /// Pending settle timer and the generation it will report
    settle_timer: Option<(u64, JoinHandle<()>)>,
    /// Spawned network tasks that have not reported back
    in_flight: usize,
    transcribing: bool,
}

impl Runtime {
    pub fn new(session: Session, services: Services, events_tx: mpsc::Sender<AppEvent>) -> Self {
        Self {
            session,
            services,
            events_tx,
            settle_timer: None,
            in_flight: 0,
            transcribing: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Whether the speech-to-text stream is running
    pub fn is_transcribing(&self) -> bool {
        self.transcribing
    }

    /// Nothing outstanding: no network task and no settle timer
    pub fn is_idle(&self) -> bool {
        self.in_flight == 0 && self.settle_timer.is_none()
    }

    pub fn start_session(&mut self) {
        self.apply(|session| session.navigator_mut().start_session());
    }

    /// Run a session operation and carry out what it asks for
    pub fn apply<F>(&mut self, op: F)
    where
        F: FnOnce(&mut Session) -> Vec<Effect>,
    {
        let effects = op(&mut self.session);
        self.execute(effects);
    }

    pub fn handle(&mut self, event: AppEvent) {
        let effects = match event {
            AppEvent::Input(input) => self.handle_input(input),
            AppEvent::SuggestionsLoaded { request_id, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.session
                    .navigator_mut()
                    .on_suggestions(request_id, result);
                Vec::new()
            }
            AppEvent::MailSent { request_id, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.session.agent_mut().on_mail_result(request_id, result);
                Vec::new()
            }
            AppEvent::SettleElapsed { generation } => {
                if matches!(self.settle_timer, Some((pending, _)) if pending == generation) {
                    self.settle_timer = None;
                }
                self.session.navigator_mut().on_settle(generation)
            }
            AppEvent::ChatReplied { request_id, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.session.chat_mut().on_reply(request_id, result);
                Vec::new()
            }
        };
        self.execute(effects);
    }

    fn handle_input(&mut self, input: InputEvent) -> Vec<Effect> {
        let now = Instant::now();
        match input {
            InputEvent::Frame { scores } => self.session.on_frame(&scores, now),
            InputEvent::Gesture { name } => self.session.dispatch(&[name], now),
            InputEvent::Transcript { text, is_final } => {
                self.session.navigator_mut().on_transcript(&text, is_final);
                Vec::new()
            }
            InputEvent::SpeechError { error } => self
                .session
                .navigator_mut()
                .on_speech_error(SpeechErrorKind::from_code(&error)),
            InputEvent::Keys { text } => self.session.type_text(&text),
            InputEvent::Chat { text } => self.session.chat_mut().send(&text),
            InputEvent::ChatClear => {
                self.session.chat_mut().clear();
                Vec::new()
            }
            InputEvent::Session { action } => match action {
                SessionAction::Start => self.session.navigator_mut().start_session(),
                SessionAction::Stop => self.session.navigator_mut().stop_session(),
            },
            InputEvent::Resize { width } => {
                self.session.navigator_mut().set_viewport_width(width);
                Vec::new()
            }
            // Pacing is consumed by the reader
            InputEvent::Wait { .. } => Vec::new(),
        }
    }

    /// Carry out effects in order
    pub fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            tracing::trace!(effect = effect.kind(), "execute");
            match effect {
                Effect::RequestSuggestions {
                    request_id,
                    request,
                } => {
                    let source = self.services.suggestions.clone();
                    let tx = self.events_tx.clone();
                    self.in_flight += 1;
                    tokio::spawn(async move {
                        tracing::debug!(request_id, source = source.name(), "Fetching suggestions");
                        let result = source.fetch(request).await;
                        let _ = tx
                            .send(AppEvent::SuggestionsLoaded { request_id, result })
                            .await;
                    });
                }
                Effect::SendMail {
                    request_id,
                    message,
                } => {
                    let mailer = self.services.mailer.clone();
                    let tx = self.events_tx.clone();
                    self.in_flight += 1;
                    tokio::spawn(async move {
                        let result = mailer.send(message).await;
                        let _ = tx.send(AppEvent::MailSent { request_id, result }).await;
                    });
                }
                Effect::Chat {
                    request_id,
                    messages,
                } => {
                    let chat = self.services.chat.clone();
                    let tools = self.services.chat_tools.clone();
                    let tx = self.events_tx.clone();
                    self.in_flight += 1;
                    tokio::spawn(async move {
                        tracing::debug!(request_id, client = chat.name(), "Sending chat");
                        let result = converse(chat.as_ref(), tools.as_ref(), messages).await;
                        let _ = tx.send(AppEvent::ChatReplied { request_id, result }).await;
                    });
                }
                Effect::Speak(text) => self.services.speaker.speak(&text),
                Effect::StartTranscription => {
                    tracing::info!("Transcription started");
                    self.transcribing = true;
                }
                Effect::StopTranscription => {
                    tracing::info!("Transcription stopped");
                    self.transcribing = false;
                }
                Effect::ScheduleSettle { generation, delay } => {
                    self.cancel_settle();
                    let tx = self.events_tx.clone();
                    let handle = tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = tx.send(AppEvent::SettleElapsed { generation }).await;
                    });
                    self.settle_timer = Some((generation, handle));
                }
                Effect::CancelSettle => self.cancel_settle(),
            }
        }
    }

    fn cancel_settle(&mut self) {
        if let Some((generation, handle)) = self.settle_timer.take() {
            tracing::debug!(generation, "Settle timer cancelled");
            handle.abort();
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Headless replay
// ─────────────────────────────────────────────────────────────────────────────

pub fn build_session(config: &Config) -> Session {
    Session::new(
        config.gestures.clone(),
        config.navigator_settings(),
        config.toggle_cooldown(),
    )
}

/// Drive a session from newline-delimited input events until EOF and every
/// outstanding task has reported back. Returns the final state.
pub async fn run_replay<R>(session: Session, services: Services, reader: R) -> Result<SessionSnapshot>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let (events_tx, mut events_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (input_tx, mut input_rx) = mpsc::channel(CHANNEL_CAPACITY);

    let mut runtime = Runtime::new(session, services, events_tx);
    runtime.start_session();

    let reader_task = tokio::spawn(read_events(reader, input_tx));
    let mut input_open = true;

    loop {
        if !input_open && runtime.is_idle() {
            break;
        }
        tokio::select! {
            input = input_rx.recv(), if input_open => match input {
                Some(event) => runtime.handle(AppEvent::Input(event)),
                None => {
                    tracing::debug!("Input finished, draining outstanding tasks");
                    input_open = false;
                }
            },
            Some(event) = events_rx.recv() => runtime.handle(event),
            else => break,
        }
    }

    reader_task.await.context("Input reader task failed")??;
    Ok(runtime.session().snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::mail::MailStep;
    use crate::gesture::default_gestures;
    use crate::navigator::{NavigatorSettings, Phase, Role};
    use crate::session::DEFAULT_TOGGLE_COOLDOWN;
    use crate::speech::LogSpeaker;
    use std::time::Duration;

    fn services() -> Services {
        let mailer: Arc<dyn MailSender> = Arc::new(DemoMailSender);
        Services {
            suggestions: Arc::new(DemoSuggestionSource::instant()),
            chat: Arc::new(DemoChatClient),
            chat_tools: Arc::new(MailTools::new(mailer.clone())),
            mailer,
            speaker: Box::new(LogSpeaker),
        }
    }

    fn session() -> Session {
        let settings = NavigatorSettings {
            settle_delay: Duration::from_millis(5),
            ..NavigatorSettings::default()
        };
        Session::new(default_gestures(), settings, DEFAULT_TOGGLE_COOLDOWN)
    }

    async fn replay(script: &'static str) -> SessionSnapshot {
        run_replay(session(), services(), script.as_bytes())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_replay_question_to_submitted_answer() {
        // Sentences fill the first row, so step down into the words
        let snapshot = replay(
            r#"{"type":"transcript","text":"How are you","final":true}
{"type":"gesture","name":"Select"}
{"type":"wait","ms":20}
{"type":"gesture","name":"Down"}
{"type":"gesture","name":"Select"}
{"type":"gesture","name":"Select"}
{"type":"gesture","name":"Down"}
{"type":"gesture","name":"Select"}
"#,
        )
        .await;

        let navigator = snapshot.navigator;
        assert_eq!(navigator.history.len(), 2);
        assert_eq!(navigator.history[0].role, Role::Guest);
        assert_eq!(navigator.history[0].text, "How are you");
        assert_eq!(navigator.history[1].role, Role::User);
        assert_eq!(navigator.history[1].text, "good thanks");
        // Settled and listening again
        assert_eq!(navigator.phase, Phase::AwaitingSpeech);
        assert!(navigator.listening);
        assert!(navigator.response.is_empty());
    }

    #[tokio::test]
    async fn test_replay_skips_malformed_lines() {
        let snapshot = replay(
            r#"{"type":"gesture","name":"Open keyboard"}
this is not json
{"type":"gesture","name":"Down"}
"#,
        )
        .await;
        assert!(snapshot.navigator.keyboard_open);
        assert_eq!(snapshot.navigator.selected, 1);
    }

    #[tokio::test]
    async fn test_replay_empty_question_prompts_repeat() {
        let snapshot = replay("{\"type\":\"gesture\",\"name\":\"Select\"}\n").await;
        assert_eq!(snapshot.navigator.phase, Phase::RepeatPrompt);
    }

    #[tokio::test]
    async fn test_replay_sends_mail_through_agent_mode() {
        let snapshot = replay(
            r#"{"type":"gesture","name":"Left Wink"}
{"type":"gesture","name":"Select"}
{"type":"gesture","name":"Select"}
{"type":"gesture","name":"Select"}
{"type":"gesture","name":"Select"}
"#,
        )
        .await;
        assert!(snapshot.agent.open);
        assert!(snapshot.navigator.transcription_disabled);
        assert_eq!(snapshot.agent.mail.step, MailStep::Result);
        assert_eq!(snapshot.agent.mail.activity.len(), 1);
    }

    #[tokio::test]
    async fn test_replay_chat_runs_tool_round() {
        let snapshot = replay(
            r#"{"type":"chat","text":"   "}
{"type":"chat","text":"Email Jordan that I'm running late"}
"#,
        )
        .await;
        let chat = snapshot.chat;
        assert!(!chat.loading);
        assert_eq!(chat.messages.len(), 2);
        assert_eq!(chat.messages[0].content, "Email Jordan that I'm running late");
        assert_eq!(
            chat.messages[1].content,
            "Done. Email sent to jordan.lee@example.com."
        );
    }

    #[tokio::test]
    async fn test_chat_reply_after_clear_is_dropped() {
        let (tx, _rx) = mpsc::channel(8);
        let mut runtime = Runtime::new(session(), services(), tx);
        runtime.handle(AppEvent::Input(InputEvent::Chat { text: "hi".into() }));
        assert!(!runtime.is_idle());
        runtime.handle(AppEvent::Input(InputEvent::ChatClear));
        runtime.handle(AppEvent::ChatReplied {
            request_id: 1,
            result: Ok("late".into()),
        });
        assert!(runtime.is_idle());
        assert!(runtime.session().chat().snapshot().messages.is_empty());
    }

    #[tokio::test]
    async fn test_new_settle_replaces_pending_timer() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut runtime = Runtime::new(session(), services(), tx);
        runtime.execute(vec![Effect::ScheduleSettle {
            generation: 1,
            delay: Duration::from_millis(50),
        }]);
        runtime.execute(vec![Effect::ScheduleSettle {
            generation: 2,
            delay: Duration::from_millis(1),
        }]);
        assert!(!runtime.is_idle());

        match rx.recv().await {
            Some(AppEvent::SettleElapsed { generation }) => assert_eq!(generation, 2),
            other => panic!("unexpected {:?}", other),
        }
        runtime.handle(AppEvent::SettleElapsed { generation: 2 });
        assert!(runtime.is_idle());

        // The aborted timer never reports
        let late = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(late.is_err());
    }

    #[tokio::test]
    async fn test_transcription_flag_follows_effects() {
        let (tx, _rx) = mpsc::channel(8);
        let mut runtime = Runtime::new(session(), services(), tx);
        runtime.start_session();
        assert!(runtime.is_transcribing());
        runtime.handle(AppEvent::Input(InputEvent::Gesture {
            name: "Left Wink".into(),
        }));
        assert!(!runtime.is_transcribing());
    }
}
