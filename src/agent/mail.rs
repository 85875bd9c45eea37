// Mail composer wizard
//
// recipient → subject → body → result, forward only. Each step shows a row of
// quick options above an input field (recipient, subject) and an action
// button. The body step has no input field; its quick options are the body
// suggestions of the chosen subject.

use super::mailer::{MailError, MailMessage};
use crate::effects::Effect;
use crate::grid::movement::wrap_index;
use crate::grid::Direction;
use chrono::Local;
use serde::Serialize;

pub const DEFAULT_RECIPIENT: &str = "jordan.lee@example.com";

/// Activity log capacity
pub const MAX_ACTIVITY: usize = 6;

const MISSING_FIELDS: &str = "Fill in all fields to send an email with AgentMail.";

pub struct QuickOption {
    pub label: &'static str,
    pub value: &'static str,
}

pub const RECIPIENTS: [QuickOption; 4] = [
    QuickOption {
        label: "Jordan Lee",
        value: "jordan.lee@example.com",
    },
    QuickOption {
        label: "Sam Patel",
        value: "sam.patel@example.com",
    },
    QuickOption {
        label: "VoiceLink Care",
        value: "care@voicelink.ai",
    },
    QuickOption {
        label: "Community Support",
        value: "support@communitycare.org",
    },
];

pub struct SubjectOption {
    pub value: &'static str,
    pub bodies: [&'static str; 3],
}

pub const SUBJECTS: [SubjectOption; 3] = [
    SubjectOption {
        value: "Quick project update",
        bodies: [
            "Thanks for the latest details. Everything looks on track from my side.",
            "Sharing a quick status note, no blockers, moving ahead as planned.",
            "Appreciate the update! I'll keep the team posted and follow up tomorrow.",
        ],
    },
    SubjectOption {
        value: "Scheduling our next session",
        bodies: [
            "Does Thursday at 2 PM work for you? Happy to adjust if needed.",
            "I'm free later this week, let me know a time that fits your schedule.",
            "Looking forward to the next session. Suggesting Tuesday afternoon if that helps.",
        ],
    },
    SubjectOption {
        value: "Thanks for the update",
        bodies: [
            "Really appreciate the insight. I'll review and get back shortly.",
            "Thanks for looping me in, this helps me plan the next steps.",
            "Great notes! I'll circle back with any follow-up questions soon.",
        ],
    },
];

pub const DEFAULT_BODIES: [&str; 3] = [
    "Thanks for the update, I'll review and respond soon.",
    "Appreciate the quick note. I'll follow up with next steps shortly.",
    "Let me know if there's anything else you'd like me to cover.",
];

/// Body suggestions for a subject, case-insensitive match
fn bodies_for(subject: &str) -> Vec<String> {
    let subject = subject.trim().to_lowercase();
    SUBJECTS
        .iter()
        .find(|option| option.value.to_lowercase() == subject)
        .map(|option| option.bodies.to_vec())
        .unwrap_or_else(|| DEFAULT_BODIES.to_vec())
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MailStep {
    Recipient,
    Subject,
    Body,
    Result,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "target", content = "index", rename_all = "snake_case")]
pub enum MailFocus {
    Quick(usize),
    RecipientInput,
    SubjectInput,
    Next,
    Send,
    Result,
}

impl MailFocus {
    fn is_input(self) -> bool {
        matches!(self, Self::RecipientInput | Self::SubjectInput)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailDraft {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Default for MailDraft {
    fn default() -> Self {
        Self {
            to: DEFAULT_RECIPIENT.to_string(),
            subject: String::new(),
            body: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityEntry {
    pub timestamp: String,
    pub message: String,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum SendStatus {
    Idle,
    Success,
    Error(String),
}

/// Keys of the agent keyboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentKey {
    Char(char),
    Space,
    Backspace,
    Enter,
    Suggestion(String),
}

/// Apply an editing key to a text field; other keys are ignored
pub(super) fn edit_field(field: &mut String, key: &AgentKey) {
    match key {
        AgentKey::Char(c) => field.extend(c.to_lowercase()),
        AgentKey::Space => field.push(' '),
        AgentKey::Backspace => {
            field.pop();
        }
        AgentKey::Enter | AgentKey::Suggestion(_) => {}
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MailSnapshot {
    pub step: MailStep,
    pub draft: MailDraft,
    pub quick_options: Vec<String>,
    pub focus: Option<MailFocus>,
    pub enter_label: &'static str,
    pub sending: bool,
    pub result: SendStatus,
    pub last_submission: Option<(String, String)>,
    pub activity: Vec<ActivityEntry>,
}

pub struct MailWizard {
    step: MailStep,
    draft: MailDraft,
    body_options: Vec<String>,
    focus: usize,
    activity: Vec<ActivityEntry>,
    result: SendStatus,
    last_submission: Option<(String, String)>,
    /// Id of the send in flight
    sending: Option<u64>,
    next_send_id: u64,
}

impl Default for MailWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl MailWizard {
    pub fn new() -> Self {
        Self {
            step: MailStep::Recipient,
            draft: MailDraft::default(),
            body_options: bodies_for(SUBJECTS[0].value),
            focus: 0,
            activity: Vec::new(),
            result: SendStatus::Idle,
            last_submission: None,
            sending: None,
            next_send_id: 0,
        }
    }

    pub fn is_sending(&self) -> bool {
        self.sending.is_some()
    }

    /// Back to the first step, keeping the draft and activity log
    pub fn rewind(&mut self) {
        self.body_options = bodies_for(SUBJECTS[0].value);
        self.advance(MailStep::Recipient);
    }

    /// Display labels of the quick options row
    fn quick_options(&self) -> Vec<String> {
        match self.step {
            MailStep::Recipient => RECIPIENTS
                .iter()
                .map(|o| format!("{} <{}>", o.label, o.value))
                .collect(),
            MailStep::Subject => SUBJECTS.iter().map(|o| o.value.to_string()).collect(),
            MailStep::Body => self.body_options.clone(),
            MailStep::Result => Vec::new(),
        }
    }

    /// Focusable targets of the current step, in order
    pub fn targets(&self) -> Vec<MailFocus> {
        let mut targets: Vec<MailFocus> = (0..self.quick_options().len())
            .map(MailFocus::Quick)
            .collect();
        match self.step {
            MailStep::Recipient => targets.extend([MailFocus::RecipientInput, MailFocus::Next]),
            MailStep::Subject => targets.extend([MailFocus::SubjectInput, MailFocus::Next]),
            MailStep::Body => targets.push(MailFocus::Send),
            MailStep::Result => targets.push(MailFocus::Result),
        }
        targets
    }

    pub fn focus(&self) -> Option<MailFocus> {
        let targets = self.targets();
        targets
            .get(self.focus)
            .or_else(|| targets.first())
            .copied()
    }

    pub fn enter_label(&self) -> &'static str {
        match self.step {
            MailStep::Body => "Send email",
            MailStep::Result => "Close",
            _ => "Next",
        }
    }

    /// Quick options form the top row, then the input, then the action.
    /// The action button never moves sideways.
    pub fn navigate(&mut self, direction: Direction) {
        let total = self.targets().len();
        if total == 0 {
            self.focus = 0;
            return;
        }
        let quick = self.quick_options().len();
        let Some(focus) = self.focus() else {
            return;
        };

        let next = match (focus, direction) {
            (MailFocus::Quick(_), Direction::Down) => quick,
            (MailFocus::Quick(_), _) => wrap_index(self.focus, direction.step(), quick),
            (f, Direction::Up) if f.is_input() => 0,
            (f, Direction::Down) if f.is_input() => quick + 1,
            (MailFocus::Next | MailFocus::Send | MailFocus::Result, Direction::Up) => {
                if self.step == MailStep::Body {
                    0
                } else {
                    quick
                }
            }
            _ => self.focus,
        };

        self.focus = next.min(total - 1);
    }

    pub fn select(&mut self) -> Vec<Effect> {
        match self.focus() {
            Some(MailFocus::Quick(index)) => self.pick_quick_option(index),
            Some(_) => self.go_next(),
            None => Vec::new(),
        }
    }

    fn pick_quick_option(&mut self, index: usize) -> Vec<Effect> {
        match self.step {
            MailStep::Recipient => {
                if let Some(option) = RECIPIENTS.get(index) {
                    self.draft.to = option.value.to_string();
                    self.advance(MailStep::Subject);
                }
                Vec::new()
            }
            MailStep::Subject => {
                if let Some(option) = SUBJECTS.get(index) {
                    self.draft.subject = option.value.to_string();
                    self.body_options = bodies_for(option.value);
                    self.advance(MailStep::Body);
                }
                Vec::new()
            }
            MailStep::Body => match self.body_options.get(index).cloned() {
                Some(body) => {
                    self.draft.body = body;
                    self.send()
                }
                None => Vec::new(),
            },
            MailStep::Result => Vec::new(),
        }
    }

    /// Advance one step if the current field is filled
    fn go_next(&mut self) -> Vec<Effect> {
        match self.step {
            MailStep::Recipient => {
                if self.draft.to.trim().is_empty() {
                    tracing::warn!("Recipient missing before advancing");
                    return Vec::new();
                }
                self.advance(MailStep::Subject);
                Vec::new()
            }
            MailStep::Subject => {
                if self.draft.subject.trim().is_empty() {
                    tracing::warn!("Subject missing before advancing");
                    return Vec::new();
                }
                self.body_options = bodies_for(&self.draft.subject);
                self.advance(MailStep::Body);
                Vec::new()
            }
            MailStep::Body => self.send(),
            MailStep::Result => {
                self.advance(MailStep::Recipient);
                Vec::new()
            }
        }
    }

    fn advance(&mut self, step: MailStep) {
        self.step = step;
        self.focus = 0;
        if step != MailStep::Result {
            self.result = SendStatus::Idle;
        }
    }

    pub fn press_key(&mut self, key: &AgentKey) -> Vec<Effect> {
        if let AgentKey::Suggestion(value) = key {
            return self.apply_suggestion(value);
        }

        let focus = self.focus();
        if let Some(f) = focus.filter(|f| f.is_input()) {
            if *key == AgentKey::Enter {
                return self.go_next();
            }
            let field = if f == MailFocus::RecipientInput {
                &mut self.draft.to
            } else {
                &mut self.draft.subject
            };
            edit_field(field, key);
            return Vec::new();
        }

        if *key == AgentKey::Enter {
            return if focus == Some(MailFocus::Send) {
                self.send()
            } else {
                self.go_next()
            };
        }
        if self.step == MailStep::Body {
            edit_field(&mut self.draft.body, key);
        }
        Vec::new()
    }

    /// Free-text suggestion for the current step's field
    fn apply_suggestion(&mut self, value: &str) -> Vec<Effect> {
        match self.step {
            MailStep::Recipient => {
                self.draft.to = value.to_string();
                self.advance(MailStep::Subject);
            }
            MailStep::Subject => {
                self.draft.subject = value.to_string();
                self.body_options = bodies_for(value);
                self.advance(MailStep::Body);
            }
            MailStep::Body => self.draft.body = value.to_string(),
            MailStep::Result => {}
        }
        Vec::new()
    }

    fn send(&mut self) -> Vec<Effect> {
        if self.sending.is_some() {
            return Vec::new();
        }

        let to = self.draft.to.trim().to_string();
        let subject = self.draft.subject.trim().to_string();
        let body = self.draft.body.trim().to_string();

        if to.is_empty() || subject.is_empty() || body.is_empty() {
            tracing::warn!(
                to = %to,
                subject = %subject,
                body_length = body.len(),
                "Missing required mail fields"
            );
            self.record(MISSING_FIELDS.to_string(), Tone::Warning);
            return Vec::new();
        }

        self.next_send_id += 1;
        self.sending = Some(self.next_send_id);
        vec![Effect::SendMail {
            request_id: self.next_send_id,
            message: MailMessage::new(&to, &subject, &body),
        }]
    }

    pub fn on_send_result(&mut self, request_id: u64, result: Result<(), MailError>) {
        if self.sending != Some(request_id) {
            tracing::debug!(request_id, "Ignoring unexpected mail result");
            return;
        }
        self.sending = None;

        let to = self.draft.to.trim().to_string();
        let subject = self.draft.subject.trim().to_string();
        self.last_submission = Some((to.clone(), subject.clone()));

        match result {
            Ok(()) => {
                tracing::info!(to = %to, subject = %subject, "Email sent");
                self.record(
                    format!("Sent email to {} with subject \"{}\".", to, subject),
                    Tone::Info,
                );
                self.result = SendStatus::Success;
                self.advance(MailStep::Result);
                self.draft = MailDraft::default();
                self.body_options = bodies_for(SUBJECTS[0].value);
            }
            Err(e) => {
                tracing::error!("Mail send failed: {}", e);
                let message = e.to_string();
                self.result = SendStatus::Error(message.clone());
                self.advance(MailStep::Result);
                self.record(format!("Failed to send email: {}", message), Tone::Warning);
            }
        }
    }

    /// Newest first, bounded
    fn record(&mut self, message: String, tone: Tone) {
        let entry = ActivityEntry {
            timestamp: Local::now().format("%-I:%M %p").to_string(),
            message,
            tone,
        };
        self.activity.insert(0, entry);
        self.activity.truncate(MAX_ACTIVITY);
    }

    pub fn snapshot(&self) -> MailSnapshot {
        MailSnapshot {
            step: self.step,
            draft: self.draft.clone(),
            quick_options: self.quick_options(),
            focus: self.focus(),
            enter_label: self.enter_label(),
            sending: self.is_sending(),
            result: self.result.clone(),
            last_submission: self.last_submission.clone(),
            activity: self.activity.clone(),
        }
    }
}
