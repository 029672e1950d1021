use mantis::session::TrackedDocument;
use mantis::types::{ChatMessage, ChatMessageType, DocumentStatus, RunStatus, Team, ThreadInfo};

pub fn message(message: &ChatMessage) -> String {
    let time = message.created_at.format("%H:%M");
    let who = match message.message_type {
        ChatMessageType::User => "you",
        ChatMessageType::Agent if message.is_system() => "!!",
        ChatMessageType::Agent => "mantis",
    };
    format!("[{time}] {who:>6} | {}", message.content)
}

pub fn thread(index: usize, thread: &ThreadInfo) -> String {
    let preview = thread
        .last_message
        .as_deref()
        .or(thread.first_message.as_deref())
        .map(|text| truncate(text, 60))
        .unwrap_or_else(|| "(empty)".to_string());
    let when = thread.last_activity_at.unwrap_or(thread.created_at).format("%Y-%m-%d %H:%M");
    format!("{index:>3}. {} ({when}, {} messages) {preview}", thread.id, thread.message_count)
}

pub fn run_status(status: &RunStatus) -> String {
    match status {
        RunStatus::Queued => "queued...".to_string(),
        RunStatus::InProgress => "thinking...".to_string(),
        RunStatus::Completed => "completed".to_string(),
        other => other.to_string(),
    }
}

pub fn document(tracked: &TrackedDocument) -> String {
    let marker = match tracked.status {
        DocumentStatus::Processing => "..",
        DocumentStatus::Completed => "ok",
        DocumentStatus::Failed => "!!",
    };
    let mut line = format!(
        "[{marker}] {} {} ({} bytes, {})",
        tracked.document.id, tracked.document.name, tracked.document.size, tracked.status
    );
    if let Some(error) = tracked.error.as_deref().or(tracked.message.as_deref()) {
        line.push_str(&format!(" - {error}"));
    }
    line
}

pub fn team(team: &Team) -> String {
    let mut line = format!("{} {}", team.id, team.name);
    for project in &team.projects {
        line.push_str(&format!("\n    - {} {}", project.id, project.name));
    }
    line
}

fn truncate(text: &str, max_chars: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() <= max_chars {
        return line.to_string();
    }
    let cut: String = line.chars().take(max_chars).collect();
    format!("{cut}...")
}
