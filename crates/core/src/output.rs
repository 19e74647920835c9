//! Display values, the output buffer, and the UI sink traits
//!
//! The socket and proxy clients never touch a rendering surface directly.
//! They write through [`StatusSink`] and [`OutputSink`], so the networking
//! crates stay testable with in-memory sinks.

use serde_json::Value;

/// A value headed for an output panel: verbatim text, or JSON to be
/// pretty-printed with a 2-space indent.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputValue {
    Text(String),
    Json(Value),
}

impl OutputValue {
    pub fn text(s: impl Into<String>) -> Self {
        OutputValue::Text(s.into())
    }

    pub fn json(value: Value) -> Self {
        OutputValue::Json(value)
    }

    /// Format for display. Best effort: a JSON value that fails to
    /// pretty-print falls back to its compact `Display` form rather
    /// than surfacing an error.
    pub fn to_display_string(&self) -> String {
        match self {
            OutputValue::Text(s) => s.clone(),
            OutputValue::Json(v) => {
                serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
            }
        }
    }
}

impl From<&str> for OutputValue {
    fn from(s: &str) -> Self {
        OutputValue::Text(s.to_string())
    }
}

impl From<String> for OutputValue {
    fn from(s: String) -> Self {
        OutputValue::Text(s)
    }
}

impl From<Value> for OutputValue {
    fn from(v: Value) -> Self {
        OutputValue::Json(v)
    }
}

/// The currently rendered text of one panel.
///
/// Either replaced wholesale or appended to with a newline separator.
/// No size bound: append-mode growth is unbounded on purpose.
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer {
    text: String,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render a value into the buffer.
    ///
    /// With `append` set and a non-empty buffer, the result is
    /// `old + "\n" + new`; in every other case the buffer is replaced.
    pub fn render(&mut self, value: &OutputValue, append: bool) {
        let s = value.to_display_string();
        if append && !self.text.is_empty() {
            self.text.push('\n');
            self.text.push_str(&s);
        } else {
            self.text = s;
        }
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn contents(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Projection of the latest known connectivity boolean.
///
/// No internal state machine; implementations just overwrite whatever
/// they showed before.
pub trait StatusSink: Send + Sync {
    fn set_connected(&self, connected: bool);
}

/// Sink for rendered output lines (one per panel).
pub trait OutputSink: Send + Sync {
    fn render(&self, value: &OutputValue, append: bool);

    fn clear(&self) {
        self.render(&OutputValue::text(""), false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_replace_overwrites_prior_content() {
        let mut buf = OutputBuffer::new();
        buf.render(&OutputValue::text("first"), false);
        buf.render(&OutputValue::text("second"), false);
        assert_eq!(buf.contents(), "second");
    }

    #[test]
    fn test_append_joins_with_newline() {
        let mut buf = OutputBuffer::new();
        buf.render(&OutputValue::text("old"), false);
        buf.render(&OutputValue::text("new"), true);
        assert_eq!(buf.contents(), "old\nnew");
    }

    #[test]
    fn test_append_on_empty_buffer_does_not_prepend_newline() {
        let mut buf = OutputBuffer::new();
        buf.render(&OutputValue::text("only"), true);
        assert_eq!(buf.contents(), "only");
    }

    #[test]
    fn test_json_pretty_printed_with_two_space_indent() {
        let mut buf = OutputBuffer::new();
        buf.render(&OutputValue::json(json!({"a": 1})), false);
        assert_eq!(buf.contents(), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_json_replaces_then_raw_text_appends() {
        let mut buf = OutputBuffer::new();
        buf.render(&OutputValue::text("stale"), false);
        buf.render(&OutputValue::json(json!({"a": 1})), false);
        buf.render(&OutputValue::text("hello"), true);
        assert_eq!(buf.contents(), "{\n  \"a\": 1\n}\nhello");
    }

    #[test]
    fn test_clear_empties_buffer() {
        let mut buf = OutputBuffer::new();
        buf.render(&OutputValue::text("something"), false);
        buf.clear();
        assert!(buf.is_empty());
    }
}
