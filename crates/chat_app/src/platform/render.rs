use std::collections::HashMap;
use std::fmt::Display;

use chat_core::{ChatViewModel, MessageId, MessageRowView};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

/// Turns view models into terminal lines, printing each row only when its
/// rendering changes.
#[derive(Debug, Default)]
pub struct Renderer {
    printed: HashMap<MessageId, String>,
    last_error: Option<String>,
    loading_shown: bool,
}

impl Renderer {
    pub fn render(&mut self, view: &ChatViewModel) -> Vec<String> {
        self.render_in(view, &Local)
    }

    fn render_in<Tz>(&mut self, view: &ChatViewModel, tz: &Tz) -> Vec<String>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut lines = Vec::new();
        if view.loading_history && !self.loading_shown {
            lines.push("Loading conversation...".to_string());
        }
        self.loading_shown = view.loading_history;

        for row in &view.messages {
            let block = render_row(row, tz);
            if self.printed.get(&row.id) != Some(&block) {
                lines.push(block.clone());
                self.printed.insert(row.id.clone(), block);
            }
        }

        if view.last_error != self.last_error {
            if let Some(error) = &view.last_error {
                lines.push(format!("! {error}"));
            }
            self.last_error = view.last_error.clone();
        }
        lines
    }
}

fn render_row<Tz>(row: &MessageRowView, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let time = time_label(&row.created_at, tz).unwrap_or_else(|| "--:--".to_string());
    let mut block = format!("[{time}] {} You: {}", row.id, row.user_text);
    if let Some(system_text) = &row.system_text {
        block.push_str(&format!("\n        System: {system_text}"));
    }
    match row.attempts {
        Some(attempts) if attempts > 0 => block.push_str(&format!(
            "\n        Status: {} (attempt {attempts})",
            row.status_label
        )),
        _ => block.push_str(&format!("\n        Status: {}", row.status_label)),
    }
    block
}

/// `HH:MM` in `tz`. Timestamps without an offset are taken as UTC.
fn time_label<Tz>(raw: &str, tz: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let utc = match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => parsed.with_timezone(&Utc),
        Err(_) => NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()?
            .and_utc(),
    };
    Some(utc.with_timezone(tz).format("%H:%M").to_string())
}
