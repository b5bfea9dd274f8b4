use crate::logs::entry::LogEntry;

/// Render a log snapshot as markdown, one `###` section per entry.
pub fn render_markdown(entries: &[LogEntry]) -> String {
    entries
        .iter()
        .map(render_entry)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_entry(entry: &LogEntry) -> String {
    let mut section = format!(
        "### {} {}\n{}",
        entry.level.icon(),
        entry.time_label(),
        entry.message
    );

    if let Some(details) = &entry.details {
        let body = match details {
            serde_json::Value::String(text) => text.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        };
        section.push_str("\n```json\n");
        section.push_str(&body);
        section.push_str("\n```");
    }

    section.push('\n');
    section
}
