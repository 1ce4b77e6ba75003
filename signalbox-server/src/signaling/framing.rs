//! Outer framing used on the WebSocket: every protocol message travels as a
//! JSON string literal, e.g. `"/to|b2|hello"`.

use std::borrow::Cow;

/// Strip the JSON string quoting from an inbound text frame.
///
/// Frames that are not a JSON string are passed through untouched.
pub fn unwrap_frame(text: &str) -> Cow<'_, str> {
    match serde_json::from_str::<String>(text) {
        Ok(inner) => Cow::Owned(inner),
        Err(_) => Cow::Borrowed(text),
    }
}

pub fn wrap_frame(message: &str) -> String {
    serde_json::Value::String(message.to_owned()).to_string()
}
