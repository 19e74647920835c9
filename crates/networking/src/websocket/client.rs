//! Tokio driver for the feed: supervisor task, per-generation socket
//! readers, and the one-shot reconnect timer

use super::handler::{Directive, FeedHandler};
use super::{FeedConfig, FeedEvent, FeedState};
use futures_util::{SinkExt, StreamExt};
use relay_core::{OutputSink, StatusSink};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Message into the supervisor task
enum Internal {
    /// Open a fresh handle, closing the current one first
    Connect,
    /// Event from the reader of the given generation
    Socket { generation: u64, event: FeedEvent },
    /// The armed reconnect timer elapsed
    ReconnectFired,
}

/// Handle to the running feed client
///
/// Cloneable control surface over the supervisor task. Dropping the
/// handle does not stop the feed; call [`close`](Self::close).
#[derive(Clone)]
pub struct FeedHandle {
    handler: Arc<Mutex<FeedHandler>>,
    tx: mpsc::UnboundedSender<Internal>,
    cancel_token: CancellationToken,
}

impl FeedHandle {
    /// Force a new connection attempt, closing any existing handle first
    pub fn connect(&self) {
        let _ = self.tx.send(Internal::Connect);
    }

    /// Stop the feed entirely. Terminal: no reconnect follows.
    pub fn close(&self) {
        self.cancel_token.cancel();
    }

    /// Whether a reconnect timer is currently armed
    pub fn is_pending(&self) -> bool {
        self.handler.lock().unwrap().is_pending()
    }

    /// Current connection state
    pub fn state(&self) -> FeedState {
        self.handler.lock().unwrap().state()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == FeedState::Open
    }
}

/// Spawn the feed client and connect immediately.
///
/// Status changes and message lines flow into the given sinks for the
/// lifetime of the task.
pub fn spawn_feed(
    config: FeedConfig,
    status: Arc<dyn StatusSink>,
    output: Arc<dyn OutputSink>,
) -> FeedHandle {
    let handler = Arc::new(Mutex::new(FeedHandler::new(status, output)));
    let (tx, rx) = mpsc::unbounded_channel();
    let cancel_token = CancellationToken::new();

    let handle = FeedHandle {
        handler: handler.clone(),
        tx: tx.clone(),
        cancel_token: cancel_token.clone(),
    };

    tokio::spawn(feed_loop(config, handler, tx, rx, cancel_token));

    handle
}

/// Supervisor loop: owns the event core and the current reader's token
async fn feed_loop(
    config: FeedConfig,
    handler: Arc<Mutex<FeedHandler>>,
    tx: mpsc::UnboundedSender<Internal>,
    mut rx: mpsc::UnboundedReceiver<Internal>,
    cancel_token: CancellationToken,
) {
    info!("Feed client started for {}", config.url);

    let mut reader_token = start_connection(&config, &handler, &tx, &cancel_token, None);

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                reader_token.cancel();
                handler.lock().unwrap().shutdown();
                info!("Feed client closed");
                break;
            }
            msg = rx.recv() => {
                let Some(msg) = msg else { break };
                match msg {
                    Internal::Connect => {
                        reader_token = start_connection(
                            &config, &handler, &tx, &cancel_token, Some(reader_token),
                        );
                    }
                    Internal::Socket { generation, event } => {
                        let directive = handler.lock().unwrap().on_event(generation, event);
                        match directive {
                            Directive::None => {}
                            Directive::CloseHandle => reader_token.cancel(),
                            Directive::ScheduleReconnect => {
                                arm_reconnect_timer(&config, &tx, &cancel_token);
                            }
                        }
                    }
                    Internal::ReconnectFired => {
                        handler.lock().unwrap().reconnect_fired();
                        reader_token = start_connection(
                            &config, &handler, &tx, &cancel_token, Some(reader_token),
                        );
                    }
                }
            }
        }
    }
}

/// Close the previous handle (if any) and spawn a reader for a fresh one.
/// Returns the new reader's cancellation token.
fn start_connection(
    config: &FeedConfig,
    handler: &Arc<Mutex<FeedHandler>>,
    tx: &mpsc::UnboundedSender<Internal>,
    cancel_token: &CancellationToken,
    previous: Option<CancellationToken>,
) -> CancellationToken {
    // Close-before-reopen: the single-socket invariant lives here.
    if let Some(prev) = previous {
        prev.cancel();
    }

    let generation = handler.lock().unwrap().begin_connect();
    let reader_token = cancel_token.child_token();

    tokio::spawn(run_socket(
        config.url.clone(),
        generation,
        tx.clone(),
        reader_token.clone(),
    ));

    reader_token
}

/// Arm the one-shot reconnect timer. The handler already guarantees at
/// most one of these is in flight.
fn arm_reconnect_timer(
    config: &FeedConfig,
    tx: &mpsc::UnboundedSender<Internal>,
    cancel_token: &CancellationToken,
) {
    let delay = config.reconnect_delay;
    let tx = tx.clone();
    let cancel = cancel_token.clone();

    debug!("Reconnect armed, retrying in {:?}", delay);
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(delay) => {
                let _ = tx.send(Internal::ReconnectFired);
            }
        }
    });
}

/// One socket handle: connect, pump events upward, report Closed on exit
async fn run_socket(
    url: String,
    generation: u64,
    tx: mpsc::UnboundedSender<Internal>,
    cancel: CancellationToken,
) {
    let send = |event: FeedEvent| {
        let _ = tx.send(Internal::Socket { generation, event });
    };

    match connect_async(url.as_str()).await {
        Ok((stream, _response)) => {
            send(FeedEvent::Open);
            let (mut write, mut read) = stream.split();

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                    msg = read.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                send(FeedEvent::Message(text.to_string()));
                            }
                            Some(Ok(Message::Close(_))) | None => break,
                            Some(Ok(_)) => {
                                // Binary, ping, pong: the feed is text-only.
                            }
                            Some(Err(e)) => {
                                send(FeedEvent::Error(e.to_string()));
                                break;
                            }
                        }
                    }
                }
            }
        }
        Err(e) => {
            send(FeedEvent::Error(e.to_string()));
        }
    }

    // Every handle ends in Closed, clean or not; the handler decides
    // whether it still matters.
    send(FeedEvent::Closed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::{OutputBuffer, OutputValue};
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    struct TestStatus(Mutex<Vec<bool>>);

    impl StatusSink for TestStatus {
        fn set_connected(&self, connected: bool) {
            self.0.lock().unwrap().push(connected);
        }
    }

    struct TestPanel(Mutex<OutputBuffer>);

    impl OutputSink for TestPanel {
        fn render(&self, value: &OutputValue, append: bool) {
            self.0.lock().unwrap().render(value, append);
        }
    }

    fn test_sinks() -> (Arc<TestStatus>, Arc<TestPanel>) {
        (
            Arc::new(TestStatus(Mutex::new(Vec::new()))),
            Arc::new(TestPanel(Mutex::new(OutputBuffer::new()))),
        )
    }

    fn config_for(addr: std::net::SocketAddr) -> FeedConfig {
        FeedConfig {
            url: format!("ws://{}/ws", addr),
            reconnect_delay: Duration::from_millis(100),
        }
    }

    /// Poll until `pred` holds or two seconds elapse
    async fn wait_until(mut pred: impl FnMut() -> bool) -> bool {
        for _ in 0..200 {
            if pred() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_feed_connects_and_renders_messages() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(socket).await.unwrap();
            ws.send(Message::Text("{\"a\":1}".into())).await.unwrap();
            ws.send(Message::Text("hello".into())).await.unwrap();
            // Hold the connection open until the client goes away.
            while ws.next().await.is_some() {}
        });

        let (status, panel) = test_sinks();
        let handle = spawn_feed(config_for(addr), status.clone(), panel.clone());

        assert!(
            wait_until(|| panel.0.lock().unwrap().contents() == "{\n  \"a\": 1\n}\nhello").await,
            "feed output was: {:?}",
            panel.0.lock().unwrap().contents()
        );
        assert!(handle.is_connected());
        assert_eq!(status.0.lock().unwrap().first(), Some(&true));

        handle.close();
    }

    #[tokio::test]
    async fn test_feed_reconnects_after_server_drop() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            // First connection: accept, then drop straight away.
            let (socket, _) = listener.accept().await.unwrap();
            let ws = accept_async(socket).await.unwrap();
            drop(ws);

            // Second connection: greet and stay up.
            let (socket, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(socket).await.unwrap();
            ws.send(Message::Text("back".into())).await.unwrap();
            while ws.next().await.is_some() {}
        });

        let (status, panel) = test_sinks();
        let handle = spawn_feed(config_for(addr), status.clone(), panel.clone());

        // The abrupt drop may render a transport-error line first; the
        // greeting from the second connection appends after it.
        assert!(
            wait_until(|| panel.0.lock().unwrap().contents().ends_with("back")).await,
            "feed output was: {:?}",
            panel.0.lock().unwrap().contents()
        );

        // Connected, dropped, connected again.
        let history = status.0.lock().unwrap().clone();
        assert!(history.starts_with(&[true, false, true]), "history: {:?}", history);

        handle.close();
    }

    #[tokio::test]
    async fn test_feed_retries_when_server_is_down() {
        // Reserve an address nobody is listening on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (status, panel) = test_sinks();
        let handle = spawn_feed(config_for(addr), status.clone(), panel.clone());

        // The failed attempt renders a diagnostic and arms the timer.
        assert!(
            wait_until(|| panel.0.lock().unwrap().contents().starts_with("WebSocket error")).await
        );
        assert!(wait_until(|| handle.is_pending()).await);
        assert!(!handle.is_connected());

        handle.close();
    }

    #[tokio::test]
    async fn test_close_is_terminal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(socket).await.unwrap();
            while ws.next().await.is_some() {}
        });

        let (status, panel) = test_sinks();
        let handle = spawn_feed(config_for(addr), status.clone(), panel.clone());

        assert!(wait_until(|| handle.is_connected()).await);
        handle.close();

        assert!(wait_until(|| handle.state() == FeedState::Disconnected).await);
        assert_eq!(status.0.lock().unwrap().last(), Some(&false));
    }
}
