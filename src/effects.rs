// Side effects requested by the controllers
//
// Controllers never perform I/O. Each operation returns the effects it needs
// and the runtime carries them out, posting any results back as events.

use crate::agent::MailMessage;
use crate::chat::ChatMessage;
use crate::suggest::SuggestionRequest;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Fetch a suggestion round; the result must come back tagged with `request_id`
    RequestSuggestions {
        request_id: u64,
        request: SuggestionRequest,
    },
    /// Speak text aloud, cutting off anything still being spoken
    Speak(String),
    StartTranscription,
    StopTranscription,
    /// Wake the navigator after `delay` with this generation token
    ScheduleSettle { generation: u64, delay: Duration },
    /// Drop any pending settle timer
    CancelSettle,
    SendMail { request_id: u64, message: MailMessage },
    /// Answer the last user turn of `messages`, tools allowed once
    Chat {
        request_id: u64,
        messages: Vec<ChatMessage>,
    },
}

impl Effect {
    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RequestSuggestions { .. } => "request_suggestions",
            Self::Speak(_) => "speak",
            Self::StartTranscription => "start_transcription",
            Self::StopTranscription => "stop_transcription",
            Self::ScheduleSettle { .. } => "schedule_settle",
            Self::CancelSettle => "cancel_settle",
            Self::SendMail { .. } => "send_mail",
            Self::Chat { .. } => "chat",
        }
    }
}
