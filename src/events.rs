use serde::{Deserialize, Serialize};

use crate::player::Transition;

/// One decoded frame payload, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    Play { url: String },
    Pause,
    Resume,
    Notification { message: String },
}

/// Outcome of decoding one inbound frame.
///
/// Parse failures and unrecognized types both end in "do nothing", but they
/// are distinct outcomes so callers can log and tests can assert which one
/// happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Event(Event),
    UnknownType(String),
    Malformed,
}

// extra fields on the wire are ignored
#[derive(Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: String,
    url: Option<String>,
    message: Option<String>,
}

pub fn decode(frame: &str) -> Decoded {
    let raw: RawFrame = match serde_json::from_str(frame) {
        Ok(raw) => raw,
        Err(_) => return Decoded::Malformed,
    };

    match raw.kind.as_str() {
        "play" => match raw.url {
            Some(url) => Decoded::Event(Event::Play { url }),
            None => Decoded::Malformed,
        },
        "pause" => Decoded::Event(Event::Pause),
        "resume" => Decoded::Event(Event::Resume),
        "notification" => Decoded::Event(Event::Notification {
            message: raw.message.unwrap_or_default(),
        }),
        other => Decoded::UnknownType(other.to_owned()),
    }
}

pub fn encode(event: &Event) -> String {
    // serialization of Event cannot fail
    serde_json::to_string(event).unwrap()
}

impl From<Transition> for Event {
    fn from(transition: Transition) -> Self {
        match transition {
            Transition::Playing => Event::Resume,
            Transition::Paused => Event::Pause,
        }
    }
}
