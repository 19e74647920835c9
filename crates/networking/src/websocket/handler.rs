//! Feed event core: one dispatch function over the socket event enum
//!
//! All state transitions happen here, synchronously, against injected
//! sinks. The async driver feeds real socket events in; tests feed
//! synthetic ones.

use super::{FeedEvent, FeedState};
use relay_core::{OutputSink, OutputValue, StatusSink};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// What the driver must do after an event was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    None,
    /// Force-close the current socket handle (error path)
    CloseHandle,
    /// Arm the one-shot reconnect timer
    ScheduleReconnect,
}

/// Synchronous state machine behind the feed client.
///
/// Each socket handle gets a generation number when the handler starts a
/// connection; events carry the generation of the handle that produced
/// them, and events from a replaced handle are discarded so a stale
/// callback can never resurrect old status.
pub struct FeedHandler {
    state: FeedState,
    generation: u64,
    reconnect_pending: bool,
    status: Arc<dyn StatusSink>,
    output: Arc<dyn OutputSink>,
}

impl FeedHandler {
    pub fn new(status: Arc<dyn StatusSink>, output: Arc<dyn OutputSink>) -> Self {
        Self {
            state: FeedState::Disconnected,
            generation: 0,
            reconnect_pending: false,
            status,
            output,
        }
    }

    pub fn state(&self) -> FeedState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a reconnect timer is currently armed
    pub fn is_pending(&self) -> bool {
        self.reconnect_pending
    }

    /// Start a new connection attempt: retires the previous handle by
    /// bumping the generation and returns the new one. The driver must
    /// close the old handle before opening the new one.
    pub fn begin_connect(&mut self) -> u64 {
        self.generation += 1;
        self.state = FeedState::Connecting;
        debug!("Feed connecting (generation {})", self.generation);
        self.generation
    }

    /// Arm the reconnect timer. Idempotent: returns false if one is
    /// already pending, and the driver must not arm a second timer.
    pub fn schedule_reconnect(&mut self) -> bool {
        if self.reconnect_pending {
            debug!("Reconnect already pending, not scheduling another");
            return false;
        }
        self.reconnect_pending = true;
        true
    }

    /// The armed timer fired; clear the pending flag. The driver follows
    /// up with [`begin_connect`](Self::begin_connect).
    pub fn reconnect_fired(&mut self) {
        self.reconnect_pending = false;
    }

    /// Terminal close requested by the owner. No reconnect follows; the
    /// status projection goes to disconnected one last time.
    pub fn shutdown(&mut self) {
        self.state = FeedState::Disconnected;
        self.reconnect_pending = false;
        self.status.set_connected(false);
    }

    /// Dispatch one socket event.
    ///
    /// Events from a generation other than the current one are dropped.
    pub fn on_event(&mut self, generation: u64, event: FeedEvent) -> Directive {
        if generation != self.generation {
            debug!(
                "Dropping {:?} from stale handle (generation {} != {})",
                event, generation, self.generation
            );
            return Directive::None;
        }

        match event {
            FeedEvent::Open => {
                self.state = FeedState::Open;
                self.status.set_connected(true);
                // Status change only; the bare open event gets no output line.
                Directive::None
            }
            FeedEvent::Closed => {
                self.state = FeedState::Disconnected;
                self.status.set_connected(false);
                if self.schedule_reconnect() {
                    Directive::ScheduleReconnect
                } else {
                    Directive::None
                }
            }
            FeedEvent::Error(msg) => {
                warn!("Feed socket error: {}", msg);
                self.output
                    .render(&OutputValue::text(format!("WebSocket error: {}", msg)), false);
                self.state = FeedState::Closing;
                Directive::CloseHandle
            }
            FeedEvent::Message(text) => {
                match serde_json::from_str::<Value>(&text) {
                    // Parsed frames replace the buffer; unparsable frames
                    // append as raw text so they accumulate instead of
                    // clobbering prior output.
                    Ok(value) => self.output.render(&OutputValue::json(value), false),
                    Err(_) => self.output.render(&OutputValue::text(text), true),
                }
                Directive::None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::OutputBuffer;
    use std::sync::Mutex;

    struct RecordingStatus(Mutex<Vec<bool>>);

    impl RecordingStatus {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(Vec::new())))
        }

        fn history(&self) -> Vec<bool> {
            self.0.lock().unwrap().clone()
        }
    }

    impl StatusSink for RecordingStatus {
        fn set_connected(&self, connected: bool) {
            self.0.lock().unwrap().push(connected);
        }
    }

    struct RecordingPanel(Mutex<OutputBuffer>);

    impl RecordingPanel {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(OutputBuffer::new())))
        }

        fn contents(&self) -> String {
            self.0.lock().unwrap().contents().to_string()
        }
    }

    impl OutputSink for RecordingPanel {
        fn render(&self, value: &OutputValue, append: bool) {
            self.0.lock().unwrap().render(value, append);
        }
    }

    fn handler() -> (FeedHandler, Arc<RecordingStatus>, Arc<RecordingPanel>) {
        let status = RecordingStatus::new();
        let panel = RecordingPanel::new();
        let h = FeedHandler::new(status.clone(), panel.clone());
        (h, status, panel)
    }

    #[test]
    fn test_open_sets_connected_without_output_line() {
        let (mut h, status, panel) = handler();
        let gen = h.begin_connect();

        assert_eq!(h.on_event(gen, FeedEvent::Open), Directive::None);

        assert_eq!(h.state(), FeedState::Open);
        assert_eq!(status.history(), vec![true]);
        assert!(panel.contents().is_empty());
    }

    #[test]
    fn test_closed_sets_disconnected_and_schedules_reconnect() {
        let (mut h, status, _panel) = handler();
        let gen = h.begin_connect();
        h.on_event(gen, FeedEvent::Open);

        assert_eq!(h.on_event(gen, FeedEvent::Closed), Directive::ScheduleReconnect);

        assert_eq!(h.state(), FeedState::Disconnected);
        assert!(h.is_pending());
        assert_eq!(status.history(), vec![true, false]);
    }

    #[test]
    fn test_schedule_reconnect_is_idempotent() {
        let (mut h, _status, _panel) = handler();

        assert!(h.schedule_reconnect());
        assert!(!h.schedule_reconnect());
        assert!(h.is_pending());

        h.reconnect_fired();
        assert!(!h.is_pending());
        assert!(h.schedule_reconnect());
    }

    #[test]
    fn test_second_close_while_pending_does_not_rearm_timer() {
        let (mut h, _status, _panel) = handler();
        let gen = h.begin_connect();

        assert_eq!(h.on_event(gen, FeedEvent::Closed), Directive::ScheduleReconnect);
        assert_eq!(h.on_event(gen, FeedEvent::Closed), Directive::None);
    }

    #[test]
    fn test_stale_generation_events_are_dropped() {
        let (mut h, status, _panel) = handler();
        let old_gen = h.begin_connect();
        let new_gen = h.begin_connect();

        // The replaced handle reports events after the new one opened.
        h.on_event(new_gen, FeedEvent::Open);
        assert_eq!(h.on_event(old_gen, FeedEvent::Closed), Directive::None);

        assert_eq!(h.state(), FeedState::Open);
        assert_eq!(status.history(), vec![true]);
        assert!(!h.is_pending());
    }

    #[test]
    fn test_json_message_replaces_then_raw_message_appends() {
        let (mut h, _status, panel) = handler();
        let gen = h.begin_connect();
        h.on_event(gen, FeedEvent::Open);

        h.on_event(gen, FeedEvent::Message("{\"a\":1}".to_string()));
        assert_eq!(panel.contents(), "{\n  \"a\": 1\n}");

        h.on_event(gen, FeedEvent::Message("hello".to_string()));
        assert_eq!(panel.contents(), "{\n  \"a\": 1\n}\nhello");
    }

    #[test]
    fn test_error_renders_diagnostic_and_forces_close() {
        let (mut h, _status, panel) = handler();
        let gen = h.begin_connect();
        h.on_event(gen, FeedEvent::Open);

        let d = h.on_event(gen, FeedEvent::Error("connection reset".to_string()));

        assert_eq!(d, Directive::CloseHandle);
        assert_eq!(h.state(), FeedState::Closing);
        assert_eq!(panel.contents(), "WebSocket error: connection reset");
    }

    #[test]
    fn test_error_then_close_runs_the_full_reconnect_path() {
        let (mut h, status, _panel) = handler();
        let gen = h.begin_connect();
        h.on_event(gen, FeedEvent::Open);

        assert_eq!(
            h.on_event(gen, FeedEvent::Error("broken pipe".to_string())),
            Directive::CloseHandle
        );
        assert_eq!(h.on_event(gen, FeedEvent::Closed), Directive::ScheduleReconnect);

        assert_eq!(h.state(), FeedState::Disconnected);
        assert_eq!(status.history(), vec![true, false]);
    }
}
