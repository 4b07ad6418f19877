use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;

use chat_core::Msg;
use chat_logging::chat_warn;

const CANCEL_COMMAND: &str = "/cancel";
const QUIT_COMMAND: &str = "/quit";

/// Reads stdin line by line on its own thread. End of input, or `/quit`,
/// closes the input side.
pub fn spawn_reader(msg_tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    chat_warn!("stdin read failed: {}", err);
                    break;
                }
            };
            let Some(msg) = parse_line(&line) else {
                continue;
            };
            let closing = msg == Msg::InputClosed;
            if msg_tx.send(msg).is_err() || closing {
                return;
            }
        }
        let _ = msg_tx.send(Msg::InputClosed);
    });
}

pub fn parse_line(line: &str) -> Option<Msg> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed == QUIT_COMMAND {
        return Some(Msg::InputClosed);
    }
    if let Some(rest) = trimmed.strip_prefix(CANCEL_COMMAND) {
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            let id = rest.trim();
            return (!id.is_empty()).then(|| Msg::CancelRequested(id.to_string()));
        }
    }
    Some(Msg::SendRequested(line.to_string()))
}
