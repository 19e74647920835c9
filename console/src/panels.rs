//! Console implementations of the status and output sinks

use relay_core::{OutputBuffer, OutputSink, OutputValue, StatusSink};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Connectivity line on the console
///
/// Remembers the latest boolean so the `status` command can repeat it
/// without re-probing.
pub struct ConsoleStatus {
    connected: AtomicBool,
}

impl ConsoleStatus {
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    pub fn label(&self) -> &'static str {
        if self.is_connected() {
            "Connected"
        } else {
            "Disconnected"
        }
    }
}

impl Default for ConsoleStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusSink for ConsoleStatus {
    fn set_connected(&self, connected: bool) {
        let previous = self.connected.swap(connected, Ordering::Relaxed);
        if previous != connected {
            println!("* {}", if connected { "Connected" } else { "Disconnected" });
        }
    }
}

/// A labelled output panel: prints rendered lines as they arrive and
/// keeps the buffer as observable panel state
pub struct ConsolePanel {
    label: &'static str,
    buffer: Mutex<OutputBuffer>,
}

impl ConsolePanel {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            buffer: Mutex::new(OutputBuffer::new()),
        }
    }

    pub fn contents(&self) -> String {
        self.buffer.lock().unwrap().contents().to_string()
    }
}

impl OutputSink for ConsolePanel {
    fn render(&self, value: &OutputValue, append: bool) {
        self.buffer.lock().unwrap().render(value, append);

        let text = value.to_display_string();
        if text.is_empty() {
            return;
        }
        for line in text.lines() {
            println!("[{}] {}", self.label, line);
        }
    }

    fn clear(&self) {
        self.buffer.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_panel_buffer_tracks_replace_and_append() {
        let panel = ConsolePanel::new("feed");
        panel.render(&OutputValue::json(json!({"a": 1})), false);
        panel.render(&OutputValue::text("hello"), true);
        assert_eq!(panel.contents(), "{\n  \"a\": 1\n}\nhello");
    }

    #[test]
    fn test_panel_clear_empties_buffer() {
        let panel = ConsolePanel::new("api");
        panel.render(&OutputValue::text("x"), false);
        panel.clear();
        assert_eq!(panel.contents(), "");
    }

    #[test]
    fn test_status_remembers_latest_boolean() {
        let status = ConsoleStatus::new();
        status.set_connected(true);
        assert!(status.is_connected());
        assert_eq!(status.label(), "Connected");

        status.set_connected(false);
        assert_eq!(status.label(), "Disconnected");
    }
}
