//! Native WebSocket client — `tokio-tungstenite`.
//!
//! Owns the connection lifecycle:
//! - Explicit `connect()` with an application-level `connected` handshake
//! - Background receive loop feeding the message router
//! - Exponential-backoff reconnection after unexpected drops
//! - Subscription replay on reconnect
//! - Stream-based lifecycle event delivery to the consumer

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use async_lock::Mutex;
use futures_util::stream::{SplitSink, SplitStream, Stream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::error::{ConnectionError, SubscriptionError};
use crate::ws::registry::SubscriptionRegistry;
use crate::ws::router::MessageRouter;
use crate::ws::{
    CallbackError, Channel, ChannelType, Frame, MessageOut, StreamEvent, WsConfig, WsEvent,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

// ─── Connection state ────────────────────────────────────────────────────────

/// Lifecycle state of the streaming connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    /// No socket; `connect()` may be called.
    Disconnected = 0,
    /// Handshake in flight.
    Connecting = 1,
    /// Handshake done, receive loop running.
    Connected = 2,
    /// Lost the socket; background reconnection in progress.
    Reconnecting = 3,
    /// Terminal. Further `connect()` calls fail.
    Closed = 4,
}

impl From<u8> for ConnectionState {
    fn from(value: u8) -> Self {
        match value {
            0 => ConnectionState::Disconnected,
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            3 => ConnectionState::Reconnecting,
            _ => ConnectionState::Closed,
        }
    }
}

// ─── Shared state ────────────────────────────────────────────────────────────

struct Inner {
    config: WsConfig,
    state: AtomicU8,
    sink: Mutex<Option<WsSink>>,
    registry: Arc<SubscriptionRegistry>,
    router: MessageRouter,
    event_tx: mpsc::Sender<WsEvent>,
    recv_task: StdMutex<Option<JoinHandle<()>>>,
    reconnect_task: StdMutex<Option<JoinHandle<()>>>,
}

impl Inner {
    fn state(&self) -> ConnectionState {
        ConnectionState::from(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    fn cas_state(&self, from: ConnectionState, to: ConnectionState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Claim the `Connecting` slot. Exactly one caller wins; losers get the
    /// state they observed instead.
    fn begin_connect(&self) -> Result<(), ConnectionState> {
        for from in [ConnectionState::Disconnected, ConnectionState::Reconnecting] {
            if self.cas_state(from, ConnectionState::Connecting) {
                return Ok(());
            }
        }
        Err(self.state())
    }

    fn emit(&self, event: WsEvent) {
        let _ = self.event_tx.try_send(event);
    }

    async fn send(&self, msg: &MessageOut) -> Result<(), ConnectionError> {
        let json =
            serde_json::to_string(msg).map_err(|e| ConnectionError::Transport(e.to_string()))?;
        let mut sink = self.sink.lock().await;
        match sink.as_mut() {
            Some(sink) => sink
                .send(Message::Text(json.into()))
                .await
                .map_err(|e| ConnectionError::Transport(e.to_string())),
            None => Err(ConnectionError::NotConnected),
        }
    }

    async fn send_raw(&self, msg: Message) {
        let mut sink = self.sink.lock().await;
        if let Some(sink) = sink.as_mut() {
            if let Err(e) = sink.send(msg).await {
                warn!("failed to send frame: {e}");
            }
        }
    }

    fn abort_reconnect(&self) {
        if let Some(handle) = self.reconnect_task.lock().ok().and_then(|mut g| g.take()) {
            handle.abort();
        }
    }

    fn abort_recv(&self) {
        if let Some(handle) = self.recv_task.lock().ok().and_then(|mut g| g.take()) {
            handle.abort();
        }
    }
}

// ─── Public WsClient ─────────────────────────────────────────────────────────

/// WebSocket client for the venue's streaming API.
///
/// Cheap to share: internally an `Arc`. Subscriptions survive both graceful
/// disconnects and automatic reconnects; `close()` is terminal.
pub struct WsClient {
    inner: Arc<Inner>,
    event_rx: tokio::sync::Mutex<mpsc::Receiver<WsEvent>>,
}

impl WsClient {
    /// Create a new WS client. Does not connect yet.
    pub fn new(config: WsConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(256);
        let registry = Arc::new(SubscriptionRegistry::new());
        Self {
            inner: Arc::new(Inner {
                config,
                state: AtomicU8::new(ConnectionState::Disconnected as u8),
                sink: Mutex::new(None),
                registry: registry.clone(),
                router: MessageRouter::new(registry),
                event_tx,
                recv_task: StdMutex::new(None),
                reconnect_task: StdMutex::new(None),
            }),
            event_rx: tokio::sync::Mutex::new(event_rx),
        }
    }

    /// Open the connection and wait for the server's `connected` handshake
    /// frame.
    ///
    /// Idempotent while connecting or connected: returns `Ok(is_connected())`
    /// without touching the socket. Supersedes an in-flight reconnection.
    /// After `close()` this always fails with [`ConnectionError::Closed`].
    ///
    /// On success any tracked subscriptions are replayed per the configured
    /// resubscribe policy.
    pub async fn connect(&self) -> Result<bool, ConnectionError> {
        // Single CAS claim: concurrent connects cannot both open a socket.
        if let Err(observed) = self.inner.begin_connect() {
            return match observed {
                ConnectionState::Closed => Err(ConnectionError::Closed),
                _ => Ok(self.is_connected()),
            };
        }

        // A manual connect supersedes the backoff timer.
        self.inner.abort_reconnect();

        match establish(&self.inner).await {
            Ok(()) => Ok(true),
            Err(err) => {
                self.inner
                    .cas_state(ConnectionState::Connecting, ConnectionState::Disconnected);
                Err(err)
            }
        }
    }

    /// Gracefully close the socket. Subscriptions stay tracked, so a later
    /// `connect()` replays them. Cancels any in-flight reconnection.
    pub async fn disconnect(&self) -> Result<(), ConnectionError> {
        self.inner.abort_reconnect();
        let was_live = self.inner.state() == ConnectionState::Connected;
        self.inner.set_state(ConnectionState::Disconnected);
        self.inner.abort_recv();

        let mut sink = self.inner.sink.lock().await;
        if let Some(mut sink) = sink.take() {
            let _ = sink
                .send(Message::Close(Some(CloseFrame {
                    code: CloseCode::Normal,
                    reason: "client disconnect".into(),
                })))
                .await;
        }
        drop(sink);

        if was_live {
            self.inner.emit(WsEvent::Disconnected {
                reason: "client disconnect".into(),
            });
        }
        Ok(())
    }

    /// Permanently shut the client down. Drops all tracked subscriptions;
    /// further `connect()` calls fail with [`ConnectionError::Closed`].
    pub async fn close(&self) -> Result<(), ConnectionError> {
        self.disconnect().await?;
        self.inner.registry.clear().await;
        self.inner.set_state(ConnectionState::Closed);
        Ok(())
    }

    /// Subscribe to a channel by type name (`"order_book"`, `"trade"`,
    /// `"account_all"`, `"ticker"`) and identifier.
    ///
    /// An unknown type name is an error. When not connected this is a no-op
    /// returning `Ok(false)`; nothing is queued. Every call sends the wire
    /// subscribe and appends its callback; repeated callbacks on one channel
    /// all receive events.
    pub async fn subscribe<F>(
        &self,
        channel_type: &str,
        identifier: &str,
        callback: F,
    ) -> Result<bool, SubscriptionError>
    where
        F: Fn(StreamEvent, &serde_json::Value) -> Result<(), CallbackError>
            + Send
            + Sync
            + 'static,
    {
        let channel_type: ChannelType = channel_type.parse()?;
        if !self.is_connected() {
            warn!(
                channel = %channel_type,
                identifier,
                "subscribe ignored: not connected"
            );
            return Ok(false);
        }

        let channel = Channel::new(channel_type, identifier);
        info!(%channel, "subscribing");
        if let Err(err) = self.inner.send(&MessageOut::subscribe(&channel)).await {
            warn!(%channel, %err, "subscribe send failed");
            return Ok(false);
        }
        self.inner
            .registry
            .insert(channel, Arc::new(callback))
            .await;
        Ok(true)
    }

    /// Unsubscribe from a channel, removing every registered callback.
    ///
    /// An unknown type name is an error. When not connected this is a no-op
    /// returning `Ok(false)`: the subscription stays tracked and will be
    /// replayed on the next connect. Returns `Ok(false)` likewise when no
    /// such subscription exists.
    pub async fn unsubscribe(
        &self,
        channel_type: &str,
        identifier: &str,
    ) -> Result<bool, SubscriptionError> {
        let channel_type: ChannelType = channel_type.parse()?;
        let channel = Channel::new(channel_type, identifier);

        if !self.is_connected() {
            warn!(%channel, "unsubscribe ignored: not connected");
            return Ok(false);
        }
        if !self.inner.registry.remove(&channel).await {
            return Ok(false);
        }

        info!(%channel, "unsubscribing");
        if let Err(err) = self.inner.send(&MessageOut::unsubscribe(&channel)).await {
            warn!(%channel, %err, "unsubscribe send failed");
        }
        Ok(true)
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.inner.state()
    }

    /// Whether the handshake has completed and the receive loop is running.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Subscription counts per channel type.
    pub async fn subscription_counts(&self) -> HashMap<ChannelType, usize> {
        self.inner.registry.counts().await
    }

    /// Stream of lifecycle events.
    ///
    /// The returned stream borrows `self`, so it must be dropped before
    /// calling `close()`.
    pub fn events(&self) -> Pin<Box<dyn Stream<Item = WsEvent> + Send + '_>> {
        Box::pin(futures_util::stream::unfold(
            &self.event_rx,
            |rx| async move {
                let mut guard = rx.lock().await;
                guard.recv().await.map(|event| (event, rx))
            },
        ))
    }
}

impl Drop for WsClient {
    fn drop(&mut self) {
        self.inner.abort_recv();
        self.inner.abort_reconnect();
    }
}

// ─── Connection establishment ────────────────────────────────────────────────

/// Open the socket, run the handshake, install the sink, spawn the receive
/// loop, and replay subscriptions. On error the caller decides the next
/// state.
// Returns a boxed future: `establish` → `receive_loop` → `reconnect_loop`
// → `establish` form a cycle of async fns, and the type erasure is what lets
// the compiler prove the futures are `Send`.
fn establish<'a>(
    inner: &'a Arc<Inner>,
) -> Pin<Box<dyn Future<Output = Result<(), ConnectionError>> + Send + 'a>> {
    Box::pin(async move {
        let timeout = inner.config.handshake_timeout;
        let (ws_stream, _) = tokio::time::timeout(timeout, connect_async(&inner.config.url))
            .await
            .map_err(|_| ConnectionError::HandshakeTimeout(timeout))?
            .map_err(|e| ConnectionError::Transport(e.to_string()))?;
        let (sink, mut stream) = ws_stream.split();

        tokio::time::timeout(timeout, await_handshake(&mut stream))
            .await
            .map_err(|_| ConnectionError::HandshakeTimeout(timeout))??;

        *inner.sink.lock().await = Some(sink);
        inner.set_state(ConnectionState::Connected);
        info!(url = %inner.config.url, "websocket connected");
        inner.emit(WsEvent::Connected);

        let handle = tokio::spawn(receive_loop(Arc::clone(inner), stream));
        if let Ok(mut guard) = inner.recv_task.lock() {
            *guard = Some(handle);
        }

        let channels = inner
            .registry
            .channels_for_resubscribe(inner.config.resubscribe_policy)
            .await;
        if !channels.is_empty() {
            info!(count = channels.len(), "replaying subscriptions");
            for channel in channels {
                if let Err(err) = inner.send(&MessageOut::subscribe(&channel)).await {
                    warn!(%channel, %err, "resubscribe send failed");
                }
            }
        }
        Ok(())
    })
}

/// Wait for the first text frame and require it to be `connected`.
async fn await_handshake(stream: &mut SplitStream<WsStream>) -> Result<(), ConnectionError> {
    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                return match Frame::parse(text.as_ref()) {
                    Ok(Frame::Connected) => Ok(()),
                    Ok(frame) => Err(ConnectionError::HandshakeRejected(frame_kind(&frame))),
                    Err(err) => Err(ConnectionError::HandshakeRejected(err.to_string())),
                };
            }
            Ok(Message::Close(_)) => {
                return Err(ConnectionError::Transport(
                    "connection closed during handshake".into(),
                ));
            }
            Ok(_) => continue,
            Err(e) => return Err(ConnectionError::Transport(e.to_string())),
        }
    }
    Err(ConnectionError::Transport(
        "stream ended during handshake".into(),
    ))
}

fn frame_kind(frame: &Frame) -> String {
    match frame {
        Frame::Connected => "connected".into(),
        Frame::Ping => "ping".into(),
        Frame::Pong => "pong".into(),
        Frame::Subscribed { channel, .. } => format!("subscribed ({channel})"),
        Frame::Update { channel, .. } => format!("update ({channel})"),
        Frame::Unknown { kind } => kind.clone(),
    }
}

// ─── Receive loop ────────────────────────────────────────────────────────────

async fn receive_loop(inner: Arc<Inner>, mut stream: SplitStream<WsStream>) {
    let reason: String = loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                if let Some(reply) = inner.router.dispatch(text.as_ref()).await {
                    if let Err(err) = inner.send(&reply).await {
                        warn!(%err, "failed to send protocol reply");
                    }
                }
            }
            Some(Ok(Message::Ping(data))) => {
                inner.send_raw(Message::Pong(data)).await;
            }
            Some(Ok(Message::Close(frame))) => {
                break frame
                    .map(|f| f.reason.to_string())
                    .unwrap_or_else(|| "connection closed".into());
            }
            Some(Ok(_)) => {} // Binary, Pong, Frame — ignore
            Some(Err(e)) => break e.to_string(),
            None => break "stream ended".into(),
        }
    };

    // A drop while Connected is unexpected; anything else means the user
    // already tore the connection down.
    if inner.state() == ConnectionState::Connected {
        warn!(%reason, "websocket connection lost");
        inner.sink.lock().await.take();
        inner.emit(WsEvent::Disconnected {
            reason: reason.clone(),
        });
        inner.set_state(ConnectionState::Reconnecting);

        let handle = tokio::spawn(reconnect_loop(Arc::clone(&inner)));
        if let Ok(mut guard) = inner.reconnect_task.lock() {
            *guard = Some(handle);
        }
    } else {
        debug!(%reason, "receive loop exiting");
    }
}

// ─── Reconnection ────────────────────────────────────────────────────────────

async fn reconnect_loop(inner: Arc<Inner>) {
    let max_attempts = inner.config.max_reconnect_attempts;
    let mut delay = inner.config.initial_reconnect_delay;

    for attempt in 1..=max_attempts {
        info!(attempt, max_attempts, ?delay, "reconnecting");
        inner.emit(WsEvent::Reconnecting { attempt, delay });
        tokio::time::sleep(delay).await;

        // Cancelled by a manual connect/disconnect during the backoff; only
        // this CAS winner may open the socket.
        if !inner.cas_state(ConnectionState::Reconnecting, ConnectionState::Connecting) {
            return;
        }

        match establish(&inner).await {
            Ok(()) => return,
            Err(err) => {
                warn!(attempt, %err, "reconnect attempt failed");
                inner.cas_state(ConnectionState::Connecting, ConnectionState::Reconnecting);
                delay = next_delay(delay, inner.config.max_reconnect_delay);
            }
        }
    }

    warn!(max_attempts, "reconnection attempts exhausted");
    inner.set_state(ConnectionState::Disconnected);
    inner.emit(WsEvent::ReconnectFailed {
        attempts: max_attempts,
    });
}

/// Doubling backoff, capped.
fn next_delay(delay: Duration, cap: Duration) -> Duration {
    (delay * 2).min(cap)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    const CONNECTED_FRAME: &str = r#"{"type":"connected"}"#;

    async fn local_server() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        (listener, url)
    }

    fn quick_config(url: String) -> WsConfig {
        WsConfig {
            url,
            handshake_timeout: Duration::from_millis(300),
            initial_reconnect_delay: Duration::from_millis(50),
            max_reconnect_delay: Duration::from_millis(100),
            ..WsConfig::default()
        }
    }

    #[test]
    fn test_connection_state_round_trip() {
        for state in [
            ConnectionState::Disconnected,
            ConnectionState::Connecting,
            ConnectionState::Connected,
            ConnectionState::Reconnecting,
            ConnectionState::Closed,
        ] {
            assert_eq!(ConnectionState::from(state as u8), state);
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = WsConfig::default();
        let mut delay = config.initial_reconnect_delay;
        let mut observed = vec![delay];
        for _ in 1..config.max_reconnect_attempts {
            delay = next_delay(delay, config.max_reconnect_delay);
            observed.push(delay);
        }
        let secs: Vec<u64> = observed.iter().map(|d| d.as_secs()).collect();
        assert_eq!(secs, vec![1, 2, 4, 8, 16]);

        // One more doubling hits the 30s cap.
        assert_eq!(
            next_delay(delay, config.max_reconnect_delay),
            Duration::from_secs(30)
        );
        assert_eq!(
            next_delay(Duration::from_secs(30), config.max_reconnect_delay),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_new_client_starts_disconnected() {
        let client = WsClient::new(WsConfig::default());
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_subscribe_rejects_unknown_channel_type() {
        let client = WsClient::new(WsConfig::default());
        let result = client.subscribe("depth", "0", |_, _| Ok(())).await;
        assert!(matches!(
            result,
            Err(SubscriptionError::UnsupportedChannel(s)) if s == "depth"
        ));
    }

    #[tokio::test]
    async fn test_subscribe_when_not_connected_is_noop() {
        let client = WsClient::new(WsConfig::default());
        let result = client.subscribe("order_book", "0", |_, _| Ok(())).await;
        assert_eq!(result.unwrap(), false);
        assert!(client.subscription_counts().await.is_empty());
    }

    #[tokio::test]
    async fn test_unsubscribe_without_subscription() {
        let client = WsClient::new(WsConfig::default());
        assert_eq!(client.unsubscribe("trade", "0").await.unwrap(), false);
        assert!(matches!(
            client.unsubscribe("depth", "0").await,
            Err(SubscriptionError::UnsupportedChannel(_))
        ));
    }

    #[tokio::test]
    async fn test_disconnect_when_not_connected() {
        let client = WsClient::new(WsConfig::default());
        assert!(client.disconnect().await.is_ok());
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_after_close_fails() {
        let client = WsClient::new(WsConfig::default());
        client.close().await.unwrap();
        assert_eq!(client.state(), ConnectionState::Closed);
        assert!(matches!(
            client.connect().await,
            Err(ConnectionError::Closed)
        ));
    }

    #[test]
    fn test_begin_connect_claim_is_exclusive() {
        let client = WsClient::new(WsConfig::default());
        assert!(client.inner.begin_connect().is_ok());
        // The loser of the race observes the winner's claim.
        assert_eq!(
            client.inner.begin_connect(),
            Err(ConnectionState::Connecting)
        );

        client.inner.set_state(ConnectionState::Reconnecting);
        assert!(client.inner.begin_connect().is_ok());
        assert_eq!(client.state(), ConnectionState::Connecting);
    }

    #[tokio::test]
    async fn test_connect_is_noop_while_connecting() {
        let client = WsClient::new(WsConfig::default());
        client.inner.set_state(ConnectionState::Connecting);
        // Another caller holds the handshake; no second socket is opened.
        assert_eq!(client.connect().await.unwrap(), false);
        assert_eq!(client.state(), ConnectionState::Connecting);
    }

    #[tokio::test]
    async fn test_unsubscribe_when_not_connected_keeps_tracking() {
        let client = WsClient::new(WsConfig::default());
        let channel = Channel::new(ChannelType::OrderBook, "0");
        client
            .inner
            .registry
            .insert(channel.clone(), Arc::new(|_, _| Ok(())))
            .await;

        assert_eq!(client.unsubscribe("order_book", "0").await.unwrap(), false);
        assert!(client.inner.registry.is_subscribed(&channel).await);
    }

    #[tokio::test]
    async fn test_connect_times_out_without_handshake_frame() {
        let (listener, url) = local_server().await;
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            // Never send the handshake; hold the socket open.
            let _ = ws.next().await;
        });

        let client = WsClient::new(quick_config(url));
        let err = client.connect().await.unwrap_err();
        assert!(matches!(err, ConnectionError::HandshakeTimeout(_)));
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_rejects_non_connected_first_frame() {
        let (listener, url) = local_server().await;
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            ws.send(Message::Text(r#"{"type":"ready"}"#.into()))
                .await
                .unwrap();
            let _ = ws.next().await;
        });

        let client = WsClient::new(quick_config(url));
        let err = client.connect().await.unwrap_err();
        assert!(matches!(err, ConnectionError::HandshakeRejected(kind) if kind == "ready"));
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_reconnect_replays_one_subscribe_per_channel() {
        let (listener, url) = local_server().await;
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        tokio::spawn(async move {
            // First connection: handshake, swallow the three subscribe
            // commands, then drop the socket mid-session.
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            ws.send(Message::Text(CONNECTED_FRAME.into())).await.unwrap();
            let mut seen = 0;
            while seen < 3 {
                match ws.next().await {
                    Some(Ok(Message::Text(_))) => seen += 1,
                    Some(Ok(_)) => {}
                    _ => panic!("first connection ended early"),
                }
            }
            drop(ws);

            // Second connection: handshake, then forward every frame out.
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            ws.send(Message::Text(CONNECTED_FRAME.into())).await.unwrap();
            while let Some(Ok(msg)) = ws.next().await {
                if let Message::Text(text) = msg {
                    let _ = tx.send(text.to_string());
                }
            }
        });

        let client = WsClient::new(quick_config(url));
        assert!(client.connect().await.unwrap());
        client
            .subscribe("order_book", "0", |_, _| Ok(()))
            .await
            .unwrap();
        client
            .subscribe("order_book", "0", |_, _| Ok(()))
            .await
            .unwrap();
        client.subscribe("trade", "0", |_, _| Ok(())).await.unwrap();

        // Exactly two resubscribe commands arrive on the fresh connection.
        let mut replayed = Vec::new();
        for _ in 0..2 {
            let frame = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("timed out waiting for resubscribe")
                .expect("server task ended");
            let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
            assert_eq!(value["type"], "subscribe");
            replayed.push(value["channel"].as_str().unwrap().to_string());
        }
        replayed.sort();
        assert_eq!(replayed, vec!["order_book/0", "trade/0"]);

        // No extra replay for the duplicate callback, which was truncated.
        assert!(tokio::time::timeout(Duration::from_millis(300), rx.recv())
            .await
            .is_err());
        let channel = Channel::new(ChannelType::OrderBook, "0");
        assert_eq!(client.inner.registry.callbacks(&channel).await.len(), 1);
        client.close().await.unwrap();
    }
}
