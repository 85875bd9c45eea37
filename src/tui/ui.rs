// UI rendering for the developer console
//
// Everything here reads state and draws; nothing mutates. The focus grid is
// drawn section by section from the grid shape so what you see lines up
// with how directional gestures move.

use super::app::ConsoleApp;
use crate::agent::{AgentKind, AgentSnapshot, MailSnapshot, SearchSnapshot};
use crate::agent::mail::{MailFocus, MailStep, SendStatus, Tone};
use crate::agent::search::SearchFocus;
use crate::chat::{ChatRole, ChatSnapshot};
use crate::grid::{FocusCell, Section};
use crate::logging::{LogEntry, LogLevel};
use crate::navigator::{Navigator, Phase, Role};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Main UI render function - called on every frame
pub fn draw(f: &mut Frame, app: &ConsoleApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Navigator and side panel
            Constraint::Length(8), // System logs
            Constraint::Length(1), // Help line
        ])
        .split(f.area());

    render_title(f, chunks[0], app);

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(chunks[1]);

    render_navigator(f, main[0], app.runtime.session().navigator());

    // The chat panel takes the lower half of the side column once used
    let chat = app.runtime.session().chat().snapshot();
    let side = if chat.messages.is_empty() && !chat.loading {
        main[1]
    } else {
        let split = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(main[1]);
        render_chat(f, split[1], &chat);
        split[0]
    };

    let agent = app.runtime.session().agent().snapshot();
    if agent.open {
        render_agent(f, side, &agent);
    } else {
        render_history(f, side, app.runtime.session().navigator());
    }

    render_logs_panel(f, chunks[2], app);
    render_help(f, chunks[3], app);
}

fn render_title(f: &mut Frame, area: Rect, app: &ConsoleApp) {
    let navigator = app.runtime.session().navigator();
    let mic = mic_label(app.runtime.is_transcribing(), navigator.is_listening());
    let transcription = if navigator.transcription_disabled() {
        " │ transcription off"
    } else {
        ""
    };
    let gesture = app
        .last_gesture
        .as_deref()
        .map(|g| format!(" │ last: {}", g))
        .unwrap_or_default();

    let title = Paragraph::new(format!(
        " voicelink │ {} │ {}{}{}",
        phase_label(navigator.phase()),
        mic,
        transcription,
        gesture
    ))
    .style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
    .block(Block::default().borders(Borders::ALL));

    f.render_widget(title, area);
}

/// Lit while transcribing and listening; half-lit while results are ignored
fn mic_label(transcribing: bool, listening: bool) -> &'static str {
    match (transcribing, listening) {
        (true, true) => "● mic",
        (true, false) => "◐ mic",
        (false, _) => "○ mic",
    }
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "idle",
        Phase::AwaitingSpeech => "listening",
        Phase::SuggestionsLoading => "thinking…",
        Phase::SuggestionsReady => "ready",
        Phase::Submitting => "speaking",
        Phase::RepeatPrompt => "please repeat",
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Navigator
// ─────────────────────────────────────────────────────────────────────────────

fn render_navigator(f: &mut Frame, area: Rect, navigator: &Navigator) {
    let mut lines = Vec::new();

    let transcript = navigator.transcript();
    lines.push(Line::from(vec![
        Span::styled("Heard: ", Style::default().fg(Color::DarkGray)),
        Span::raw(if transcript.is_empty() {
            "…".to_string()
        } else {
            transcript
        }),
    ]));

    let draft = navigator.draft();
    lines.push(Line::from(vec![
        Span::styled("Reply: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            draft.confirmed_text(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {}", draft.pending()),
            Style::default().fg(Color::Yellow),
        ),
    ]));

    if let Some(error) = navigator.speech_error() {
        lines.push(Line::styled(
            format!("Speech error: {}", error),
            Style::default().fg(Color::Red),
        ));
    }
    lines.push(Line::raw(""));

    if navigator.phase() == Phase::SuggestionsLoading && navigator.grid().is_empty() {
        lines.push(Line::styled(
            "Finding suggestions…",
            Style::default().fg(Color::DarkGray),
        ));
    }

    let inner_width = area.width.saturating_sub(2) as usize;
    let grid = navigator.grid();
    let shape = grid.shape();
    let selected = navigator.selected();

    for section in Section::ALL {
        let rows = shape.section_rows(section);
        if rows.is_empty() {
            continue;
        }
        lines.push(Line::styled(
            section_title(section),
            Style::default().fg(Color::DarkGray),
        ));

        let mut index = shape.section_start(section);
        for &len in rows {
            // Brackets and the gap take three columns per cell
            let cell_width = (inner_width / len.max(1)).saturating_sub(3);
            let mut spans = Vec::with_capacity(len * 2);
            for _ in 0..len {
                if let Some(cell) = grid.get(index) {
                    let style = if index == selected {
                        Style::default()
                            .fg(Color::Black)
                            .bg(Color::Cyan)
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default()
                    };
                    spans.push(Span::styled(
                        format!("[{}]", truncate_to_width(&cell_label(navigator, cell), cell_width)),
                        style,
                    ));
                    spans.push(Span::raw(" "));
                }
                index += 1;
            }
            lines.push(Line::from(spans));
        }
    }

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Navigator "),
        );
    f.render_widget(paragraph, area);
}

fn section_title(section: Section) -> &'static str {
    match section {
        Section::Sentences => "Sentences",
        Section::Words => "Words",
        Section::Submit => "Send",
        Section::Keyboard => "Keyboard",
    }
}

/// Text shown inside a grid cell
fn cell_label(navigator: &Navigator, cell: &FocusCell) -> String {
    match cell {
        FocusCell::Sentence { index } => navigator
            .sentences()
            .get(*index)
            .map(|s| format!("{}: {}", s.style, s.text))
            .unwrap_or_default(),
        FocusCell::Word { index } => navigator.options().get(*index).cloned().unwrap_or_default(),
        FocusCell::Submit => "Submit".to_string(),
        FocusCell::Key(key) => key.label.clone(),
    }
}

/// Cut `text` to at most `max` display columns, ending in an ellipsis
fn truncate_to_width(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let target = max.saturating_sub(1);
    let mut width = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if width + w > target {
            break;
        }
        width += w;
        out.push(c);
    }
    out.push('…');
    out
}

fn render_history(f: &mut Frame, area: Rect, navigator: &Navigator) {
    let height = area.height.saturating_sub(2) as usize;
    let history = navigator.history();
    let skip = history.len().saturating_sub(height);

    let items: Vec<ListItem> = history
        .iter()
        .skip(skip)
        .map(|entry| {
            let color = match entry.role {
                Role::Guest => Color::Magenta,
                Role::User => Color::Green,
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{}: ", entry.role), Style::default().fg(color)),
                Span::raw(entry.text.clone()),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Conversation "),
    );
    f.render_widget(list, area);
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat
// ─────────────────────────────────────────────────────────────────────────────

fn chat_lines(chat: &ChatSnapshot) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = chat
        .messages
        .iter()
        .map(|message| {
            let (label, color) = match message.role {
                ChatRole::User => ("you", Color::Green),
                _ => ("assistant", Color::Cyan),
            };
            Line::from(vec![
                Span::styled(format!("{}: ", label), Style::default().fg(color)),
                Span::raw(message.content.clone()),
            ])
        })
        .collect();
    if chat.loading {
        lines.push(Line::styled("assistant is thinking…", Style::default().fg(Color::DarkGray)));
    }
    lines
}

fn render_chat(f: &mut Frame, area: Rect, chat: &ChatSnapshot) {
    let lines = chat_lines(chat);
    // Keep the newest turns in view
    let height = area.height.saturating_sub(2) as usize;
    let skip = lines.len().saturating_sub(height);
    let paragraph = Paragraph::new(lines.into_iter().skip(skip).collect::<Vec<_>>())
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(" Chat "));
    f.render_widget(paragraph, area);
}

// ─────────────────────────────────────────────────────────────────────────────
// Agent mode
// ─────────────────────────────────────────────────────────────────────────────

fn focused(active: bool) -> Style {
    if active {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

fn render_agent(f: &mut Frame, area: Rect, agent: &AgentSnapshot) {
    let mut lines = Vec::new();

    if agent.selecting {
        lines.push(Line::styled(
            "Choose an agent",
            Style::default().fg(Color::DarkGray),
        ));
        for (i, kind) in AgentKind::ALL.iter().enumerate() {
            lines.push(Line::styled(
                format!(" {} ", kind.label()),
                focused(i == agent.cursor),
            ));
            lines.push(Line::styled(
                format!("   {}", kind.description()),
                Style::default().fg(Color::DarkGray),
            ));
        }
    } else {
        match agent.active {
            AgentKind::Mail => mail_lines(&agent.mail, &mut lines),
            AgentKind::Search => search_lines(&agent.search, &mut lines),
        }
    }

    if !agent.keyboard_suggestions.is_empty() {
        lines.push(Line::raw(""));
        let spans: Vec<Span> = agent
            .keyboard_suggestions
            .iter()
            .enumerate()
            .map(|(i, s)| Span::raw(format!("{}) {}  ", i + 1, s)))
            .collect();
        lines.push(Line::from(spans));
    }

    let title = if agent.selecting {
        " Agent Mode ".to_string()
    } else {
        format!(" {} ", agent.active.label())
    };
    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(paragraph, area);
}

fn mail_lines(mail: &MailSnapshot, lines: &mut Vec<Line<'static>>) {
    let step = match mail.step {
        MailStep::Recipient => "Step 1 of 3: recipient",
        MailStep::Subject => "Step 2 of 3: subject",
        MailStep::Body => "Step 3 of 3: message",
        MailStep::Result => "Done",
    };
    lines.push(Line::styled(step, Style::default().fg(Color::DarkGray)));

    let field = |label: &str, value: &str, target: Option<MailFocus>| {
        let active = target.is_some() && mail.focus == target;
        Line::from(vec![
            Span::styled(format!("{:>8} ", label), Style::default().fg(Color::DarkGray)),
            Span::styled(value.to_string(), focused(active)),
        ])
    };
    lines.push(field("To:", &mail.draft.to, Some(MailFocus::RecipientInput)));
    lines.push(field("Subject:", &mail.draft.subject, Some(MailFocus::SubjectInput)));
    lines.push(field("Body:", &mail.draft.body, None));
    lines.push(Line::raw(""));

    for (i, option) in mail.quick_options.iter().enumerate() {
        lines.push(Line::styled(
            format!(" {} ", option),
            focused(mail.focus == Some(MailFocus::Quick(i))),
        ));
    }

    if mail.step != MailStep::Result {
        let target = if mail.step == MailStep::Body {
            MailFocus::Send
        } else {
            MailFocus::Next
        };
        let label = if mail.sending { "Sending…" } else { mail.enter_label };
        lines.push(Line::styled(
            format!(" {} ", label),
            focused(mail.focus == Some(target)),
        ));
    } else {
        let (text, color) = match &mail.result {
            SendStatus::Success => ("Sent".to_string(), Color::Green),
            SendStatus::Error(message) => (message.clone(), Color::Red),
            SendStatus::Idle => (String::new(), Color::Reset),
        };
        lines.push(Line::styled(
            format!(" {} ", text),
            focused(mail.focus == Some(MailFocus::Result)).fg(color),
        ));
    }

    if !mail.activity.is_empty() {
        lines.push(Line::raw(""));
        for entry in mail.activity.iter().rev().take(3) {
            let color = match entry.tone {
                Tone::Info => Color::Blue,
                Tone::Warning => Color::Yellow,
            };
            lines.push(Line::styled(
                format!("{} {}", entry.timestamp, entry.message),
                Style::default().fg(color),
            ));
        }
    }
}

fn search_lines(search: &SearchSnapshot, lines: &mut Vec<Line<'static>>) {
    lines.push(Line::from(vec![
        Span::styled("Query: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            search.query.clone(),
            focused(search.focus == SearchFocus::Query),
        ),
    ]));
    lines.push(Line::from(vec![
        Span::styled(" Run ", focused(search.focus == SearchFocus::Run)),
        Span::raw(" "),
        Span::styled(" Reset ", focused(search.focus == SearchFocus::Reset)),
    ]));
    lines.push(Line::raw(""));
    lines.push(Line::raw(search.summary.clone()));
    for result in &search.results {
        lines.push(Line::styled(
            result.title,
            Style::default().add_modifier(Modifier::BOLD),
        ));
        lines.push(Line::styled(result.url, Style::default().fg(Color::Blue)));
        lines.push(Line::raw(result.snippet));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logs and help
// ─────────────────────────────────────────────────────────────────────────────

pub fn render_logs_panel(f: &mut Frame, area: Rect, app: &ConsoleApp) {
    let height = area.height.saturating_sub(2) as usize; // Account for borders
    let items: Vec<ListItem> = app
        .log_buffer
        .recent(height)
        .iter()
        .map(|entry| ListItem::new(format_log_entry(entry)).style(log_level_style(&entry.level)))
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" System Logs ({}) ", app.log_buffer.len())),
    );
    f.render_widget(list, area);
}

fn format_log_entry(entry: &LogEntry) -> String {
    format!(
        "[{}] {:5} {}",
        entry.timestamp.format("%H:%M:%S"),
        entry.level.as_str(),
        entry.message
    )
}

fn log_level_style(level: &LogLevel) -> Style {
    match level {
        LogLevel::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        LogLevel::Warn => Style::default().fg(Color::Yellow),
        LogLevel::Info => Style::default().fg(Color::Blue),
        LogLevel::Debug => Style::default().fg(Color::Gray),
        LogLevel::Trace => Style::default().fg(Color::DarkGray),
    }
}

fn render_help(f: &mut Frame, area: Rect, app: &ConsoleApp) {
    let line = match &app.prompt {
        Some(prompt) => Line::from(vec![
            Span::styled(
                format!(" {}> ", prompt.kind.title()),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(prompt.text.clone()),
            Span::styled("▏", Style::default().fg(Color::Yellow)),
        ]),
        None => Line::styled(
            " ←↑↓→ move │ Space select │ k keyboard │ [ ] agent │ : say │ / type │ c chat │ x clear chat │ 1-3 pick │ s session │ q quit",
            Style::default().fg(Color::DarkGray),
        ),
    };
    f.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::NavigatorSettings;

    #[test]
    fn test_static_cell_labels() {
        let navigator = Navigator::new(NavigatorSettings::default());
        assert_eq!(cell_label(&navigator, &FocusCell::Submit), "Submit");
        // Out-of-range indices render empty rather than panic
        assert_eq!(cell_label(&navigator, &FocusCell::Word { index: 9 }), "");
    }

    #[test]
    fn test_mic_label_tracks_transcription() {
        assert_eq!(mic_label(true, true), "● mic");
        assert_eq!(mic_label(true, false), "◐ mic");
        // Listening without a running stream still shows the mic off
        assert_eq!(mic_label(false, true), "○ mic");
    }

    #[test]
    fn test_chat_lines_show_pending_reply() {
        let chat = ChatSnapshot {
            messages: vec![crate::chat::ChatMessage::user("hi")],
            loading: true,
        };
        let lines = chat_lines(&chat);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans[0].content, "you: ");
        assert_eq!(lines[1].spans[0].content, "assistant is thinking…");
    }

    #[test]
    fn test_truncate_counts_display_columns() {
        assert_eq!(truncate_to_width("hello", 5), "hello");
        assert_eq!(truncate_to_width("hello world", 6), "hello…");
        // Wide characters take two columns each
        assert_eq!(truncate_to_width("日本語です", 5), "日本…");
    }

    #[test]
    fn test_log_entry_format() {
        let entry = LogEntry {
            timestamp: chrono::Local::now(),
            level: LogLevel::Warn,
            message: "late".to_string(),
        };
        assert!(format_log_entry(&entry).ends_with("WARN  late"));
    }
}
