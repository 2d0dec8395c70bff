//! Thin adapters from front-end events to engine [`Command`]s.
//!
//! The native viewer and the generated document view both end up here, so
//! neither carries its own copy of the click rules.

use serde::{Deserialize, Serialize};

use crate::harmonic::{Button, Command, HarmonicGraphEngine, Outcome};

/// Keyboard shortcuts shared by every front end.
pub fn key_command(key: &str) -> Option<Command> {
    match key {
        "c" => Some(Command::ClearSelection),
        "r" => Some(Command::ResetAll),
        "a" => Some(Command::FullyConnect),
        "d" => Some(Command::ToggleScale),
        "m" => Some(Command::RatioMatrix),
        _ => None,
    }
}

/// Native pointer click: time already in seconds, `x` in Hz.
pub fn pointer_command(button: Button, time: f64, x: f64) -> Command {
    Command::Click {
        button,
        time,
        frequency: x,
    }
}

// ---------------------------------------------------------------------------
// Document view
// ---------------------------------------------------------------------------

/// One recorded browser event.
///
/// ```json
/// {"type": "click", "button": 0, "timeStamp": 1532.4, "x": 440.0}
/// {"type": "keypress", "key": "a"}
/// ```
///
/// `button` follows the DOM convention (0 primary, 2 secondary) and
/// `timeStamp` is in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DocumentEvent {
    Click {
        button: u8,
        #[serde(rename = "timeStamp")]
        time_stamp: f64,
        x: f64,
    },
    Keypress {
        key: String,
    },
}

impl DocumentEvent {
    /// `None` for buttons and keys the engine does not handle.
    pub fn to_command(&self) -> Option<Command> {
        match self {
            DocumentEvent::Click {
                button,
                time_stamp,
                x,
            } => {
                let button = match button {
                    0 => Button::Left,
                    2 => Button::Right,
                    _ => return None,
                };
                Some(pointer_command(button, time_stamp / 1000.0, *x))
            }
            DocumentEvent::Keypress { key } => key_command(key),
        }
    }
}

pub fn parse_event_log(json: &str) -> serde_json::Result<Vec<DocumentEvent>> {
    serde_json::from_str(json)
}

/// Feed recorded events through `engine`, skipping unmapped ones.
pub fn replay(engine: &mut HarmonicGraphEngine, events: &[DocumentEvent]) -> Vec<Outcome> {
    let mut skipped = 0usize;
    let outcomes = events
        .iter()
        .filter_map(|ev| {
            let cmd = ev.to_command();
            if cmd.is_none() {
                skipped += 1;
            }
            cmd
        })
        .map(|cmd| engine.apply(cmd))
        .collect();
    if skipped > 0 {
        log::debug!("Skipped {skipped} unmapped document events");
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_commands() {
        assert_eq!(key_command("a"), Some(Command::FullyConnect));
        assert_eq!(key_command("m"), Some(Command::RatioMatrix));
        assert_eq!(key_command("x"), None);
    }

    #[test]
    fn document_events_parse_and_convert() {
        let events = parse_event_log(
            r#"[
                {"type": "click", "button": 2, "timeStamp": 1500, "x": 440.5},
                {"type": "click", "button": 1, "timeStamp": 1600, "x": 10},
                {"type": "keypress", "key": "r"}
            ]"#,
        )
        .unwrap();
        assert_eq!(
            events[0].to_command(),
            Some(Command::Click {
                button: Button::Right,
                time: 1.5,
                frequency: 440.5
            })
        );
        assert_eq!(events[1].to_command(), None);
        assert_eq!(events[2].to_command(), Some(Command::ResetAll));
    }
}
