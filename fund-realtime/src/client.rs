//! Realtime client
//!
//! One spawned task owns the transport for the lifetime of a session. It
//! selects over inbound frames, caller commands and the heartbeat, and
//! after a drop sleeps through the backoff before opening the next
//! transport. Callers only touch the shared desired-topic set, the handler
//! registry and the command channel, so every public method returns
//! immediately.

use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use fund_core::{
    ConnectionStatus, ControlMessage, InboundMessage, MarketTick, ModelPrediction,
    PortfolioDelta, RiskAlert, Topic, UserEvent,
};
use futures_util::FutureExt;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::RealtimeConfig;
use crate::error::RealtimeError;
use crate::handlers::{panic_message, HandlerHandle, HandlerRegistry};
use crate::transport::{Connector, Frame, Transport};
use crate::ws::WsConnector;

/// Commands sent to the connection task
#[derive(Debug)]
enum Command {
    Send(ControlMessage),
    Disconnect,
}

/// State shared between the client handle and its connection task
struct Shared {
    /// Topics the caller wants, whatever the transport is doing
    desired: Mutex<BTreeSet<Topic>>,
    status_tx: watch::Sender<ConnectionStatus>,
    handlers: HandlerRegistry,
}

impl Shared {
    fn status(&self) -> ConnectionStatus {
        *self.status_tx.borrow()
    }

    fn set_status(&self, status: ConnectionStatus) {
        let previous = self.status_tx.send_replace(status);
        if previous != status {
            debug!("[Realtime] Status {} -> {}", previous, status);
        }
    }
}

/// A running connection task
struct Session {
    command_tx: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

/// Reconnecting pub/sub client
///
/// Construct one per backend connection and share it (e.g. in an `Arc`);
/// there is no process-wide instance.
pub struct RealtimeClient<C: Connector = WsConnector> {
    config: RealtimeConfig,
    connector: Arc<C>,
    shared: Arc<Shared>,
    session: Mutex<Option<Session>>,
}

impl RealtimeClient<WsConnector> {
    /// Create a client that connects over WebSocket
    pub fn new(config: RealtimeConfig) -> Self {
        Self::with_connector(config, WsConnector)
    }
}

impl<C: Connector> RealtimeClient<C> {
    /// Create a client with a custom transport
    pub fn with_connector(config: RealtimeConfig, connector: C) -> Self {
        let (status_tx, _) = watch::channel(ConnectionStatus::Disconnected);
        Self {
            config,
            connector: Arc::new(connector),
            shared: Arc::new(Shared {
                desired: Mutex::new(BTreeSet::new()),
                status_tx,
                handlers: HandlerRegistry::new(),
            }),
            session: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    /// Open the connection
    ///
    /// No-op if already connected or connecting. A reconnect that is still
    /// waiting out its backoff is cancelled and replaced by a fresh attempt.
    /// Must be called from within a tokio runtime.
    pub fn connect(&self, credential: Option<&str>) -> Result<(), RealtimeError> {
        let mut session = self.session.lock();

        let status = self.shared.status();
        if status != ConnectionStatus::Disconnected {
            let alive = session.as_ref().is_some_and(|s| !s.task.is_finished());
            if alive {
                warn!("[Realtime] connect() ignored, already {}", status);
                return Ok(());
            }
            warn!("[Realtime] Connection task gone while {}, starting over", status);
            self.shared.set_status(ConnectionStatus::Disconnected);
        }

        self.config.validate()?;
        let url = self.config.endpoint_url(credential)?;

        let previous = session.take().map(|previous| {
            if !previous.task.is_finished() {
                info!("[Realtime] Cancelling pending reconnect");
                previous.task.abort();
            }
            previous.task
        });

        self.shared.set_status(ConnectionStatus::Connecting);

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(supervise(
            self.config.clone(),
            Arc::clone(&self.connector),
            Arc::clone(&self.shared),
            command_rx,
            url,
            previous,
        ));

        *session = Some(Session { command_tx, task });
        Ok(())
    }

    /// Close the connection and forget every desired topic
    ///
    /// Cancels any pending reconnect and the heartbeat. When this returns the
    /// connection task has exited, so no further pings or reconnect attempts
    /// happen until [`connect`](Self::connect) is called again.
    pub async fn disconnect(&self) {
        let session = self.session.lock().take();
        self.shared.desired.lock().clear();

        if let Some(Session {
            command_tx,
            mut task,
        }) = session
        {
            if command_tx.send(Command::Disconnect).is_ok() {
                if tokio::time::timeout(self.config.close_timeout, &mut task)
                    .await
                    .is_err()
                {
                    warn!(
                        "[Realtime] Connection task did not stop within {:?}, aborting",
                        self.config.close_timeout
                    );
                    task.abort();
                    let _ = task.await;
                }
            } else {
                // Task already gave up; make sure it is gone
                task.abort();
                let _ = task.await;
            }
        }

        self.shared.set_status(ConnectionStatus::Disconnected);
        info!("[Realtime] Disconnected");
    }

    /// Add topics to the desired set
    ///
    /// Sent immediately when connected, otherwise replayed on the next open.
    pub fn subscribe<I>(&self, topics: I)
    where
        I: IntoIterator<Item = Topic>,
    {
        let mut desired = self.shared.desired.lock();
        let added: Vec<Topic> = topics.into_iter().filter(|t| desired.insert(*t)).collect();

        if added.is_empty() {
            return;
        }

        // Still holding the desired lock: the task flips to Connected under
        // the same lock, so each topic goes out once (here or in the replay).
        if self.shared.status() == ConnectionStatus::Connected {
            self.send_control(ControlMessage::Subscribe { topics: added });
        } else {
            debug!(
                "[Realtime] Queued subscribe for {:?} until connected",
                added
            );
        }
    }

    /// Remove topics from the desired set
    pub fn unsubscribe<I>(&self, topics: I)
    where
        I: IntoIterator<Item = Topic>,
    {
        let mut desired = self.shared.desired.lock();
        let removed: Vec<Topic> = topics.into_iter().filter(|t| desired.remove(t)).collect();

        if removed.is_empty() {
            return;
        }

        if self.shared.status() == ConnectionStatus::Connected {
            self.send_control(ControlMessage::Unsubscribe { topics: removed });
        } else {
            debug!("[Realtime] Dropped {:?} from desired topics", removed);
        }
    }

    /// Topics that will be (re)subscribed on every open
    pub fn desired_topics(&self) -> Vec<Topic> {
        self.shared.desired.lock().iter().copied().collect()
    }

    /// Register a callback for every message on `topic`
    pub fn add_message_handler<F>(&self, topic: Topic, handler: F) -> HandlerHandle
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        self.shared.handlers.add(topic, handler)
    }

    pub fn on_market_data<F>(&self, handler: F) -> HandlerHandle
    where
        F: Fn(MarketTick) + Send + Sync + 'static,
    {
        self.on_typed(Topic::MarketData, handler)
    }

    pub fn on_portfolio_update<F>(&self, handler: F) -> HandlerHandle
    where
        F: Fn(PortfolioDelta) + Send + Sync + 'static,
    {
        self.on_typed(Topic::PortfolioUpdates, handler)
    }

    pub fn on_prediction<F>(&self, handler: F) -> HandlerHandle
    where
        F: Fn(ModelPrediction) + Send + Sync + 'static,
    {
        self.on_typed(Topic::MlPredictions, handler)
    }

    pub fn on_risk_alert<F>(&self, handler: F) -> HandlerHandle
    where
        F: Fn(RiskAlert) + Send + Sync + 'static,
    {
        self.on_typed(Topic::RiskAlerts, handler)
    }

    pub fn on_user_event<F>(&self, handler: F) -> HandlerHandle
    where
        F: Fn(UserEvent) + Send + Sync + 'static,
    {
        self.on_typed(Topic::UserEvents, handler)
    }

    /// Handler that decodes the payload first; undecodable payloads are logged and skipped
    fn on_typed<T, F>(&self, topic: Topic, handler: F) -> HandlerHandle
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        self.add_message_handler(topic, move |message| match message.decode::<T>() {
            Ok(value) => handler(value),
            Err(e) => warn!("[Realtime] {}", e),
        })
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.shared.handlers
    }

    /// Current connection status
    pub fn status(&self) -> ConnectionStatus {
        self.shared.status()
    }

    /// Watch status transitions
    pub fn status_watch(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status_tx.subscribe()
    }

    fn send_control(&self, message: ControlMessage) {
        let session = self.session.lock();
        let kind = message.kind();
        let sent = session
            .as_ref()
            .map(|s| s.command_tx.send(Command::Send(message)).is_ok())
            .unwrap_or(false);
        if !sent {
            warn!("[Realtime] Dropping {} message, not connected", kind);
        }
    }
}

impl<C: Connector> Drop for RealtimeClient<C> {
    fn drop(&mut self) {
        if let Some(session) = self.session.get_mut().take() {
            session.task.abort();
        }
    }
}

impl<C: Connector> std::fmt::Debug for RealtimeClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeClient")
            .field("config", &self.config)
            .field("status", &self.status())
            .field("desired_topics", &self.desired_topics())
            .finish()
    }
}

// ============================================================================
// Connection task
// ============================================================================

/// Why a session ended
enum SessionEnd {
    /// Caller asked to disconnect (or dropped the client)
    Stopped,
    /// Transport went away; reconnect
    Dropped,
}

/// Run the connection loop, leaving the status at `Disconnected` if it panics
///
/// `previous` is a task being replaced; it is awaited first so that two
/// transports are never open at once.
async fn supervise<C: Connector>(
    config: RealtimeConfig,
    connector: Arc<C>,
    shared: Arc<Shared>,
    command_rx: mpsc::UnboundedReceiver<Command>,
    url: Url,
    previous: Option<JoinHandle<()>>,
) {
    if let Some(previous) = previous {
        let _ = previous.await;
    }

    let run = connection_loop(config, connector, Arc::clone(&shared), command_rx, url);
    if let Err(panic) = AssertUnwindSafe(run).catch_unwind().await {
        error!(
            "[Realtime] Connection task panicked: {}",
            panic_message(panic.as_ref())
        );
        shared.set_status(ConnectionStatus::Disconnected);
    }
}

/// Main connection loop with reconnection logic
async fn connection_loop<C: Connector>(
    config: RealtimeConfig,
    connector: Arc<C>,
    shared: Arc<Shared>,
    mut command_rx: mpsc::UnboundedReceiver<Command>,
    url: Url,
) {
    let endpoint = display_endpoint(&url);
    let mut reconnect_attempts = 0u32;

    loop {
        shared.set_status(ConnectionStatus::Connecting);
        info!("[Realtime] Connecting to {}", endpoint);

        let attempt = tokio::select! {
            result = connector.connect(&url) => Some(result),
            _ = wait_for_stop(&mut command_rx) => None,
        };

        let Some(result) = attempt else {
            shared.set_status(ConnectionStatus::Disconnected);
            info!("[Realtime] Stopped while connecting");
            return;
        };

        match result {
            Ok(mut transport) => {
                reconnect_attempts = 0;

                match run_session(&config, &shared, &mut transport, &mut command_rx).await {
                    SessionEnd::Stopped => {
                        if let Err(e) = transport.close().await {
                            debug!("[Realtime] Close handshake failed: {}", e);
                        }
                        shared.set_status(ConnectionStatus::Disconnected);
                        info!("[Realtime] Connection closed by client");
                        return;
                    }
                    SessionEnd::Dropped => {}
                }
            }
            Err(e) => {
                error!("[Realtime] Connection failed: {}", e);
            }
        }

        shared.set_status(ConnectionStatus::Disconnected);

        reconnect_attempts += 1;
        if reconnect_attempts > config.max_reconnect_attempts {
            error!(
                "[Realtime] Max reconnect attempts ({}) reached, giving up",
                config.max_reconnect_attempts
            );
            return;
        }

        let delay = config.reconnect_delay(reconnect_attempts);
        info!(
            "[Realtime] Reconnecting in {:?} (attempt {}/{})",
            delay, reconnect_attempts, config.max_reconnect_attempts
        );

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = wait_for_stop(&mut command_rx) => {
                info!("[Realtime] Pending reconnect cancelled");
                return;
            }
        }
    }
}

/// Drive one open transport until it drops or the caller stops it
async fn run_session<T: Transport>(
    config: &RealtimeConfig,
    shared: &Shared,
    transport: &mut T,
    command_rx: &mut mpsc::UnboundedReceiver<Command>,
) -> SessionEnd {
    let replay: Vec<Topic> = {
        let desired = shared.desired.lock();
        shared.set_status(ConnectionStatus::Connected);
        desired.iter().copied().collect()
    };
    info!("[Realtime] Connected");

    // Re-subscribe to every desired topic (first open or reconnect)
    if !replay.is_empty() {
        debug!("[Realtime] Subscribing to {:?}", replay);
        if let Err(e) = send_control(transport, &ControlMessage::Subscribe { topics: replay }).await
        {
            warn!("[Realtime] Failed to re-subscribe: {}", e);
            return SessionEnd::Dropped;
        }
    }

    let period = config.heartbeat_interval;
    let mut heartbeat = interval_at(Instant::now() + period, period);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            frame = transport.next_frame() => {
                match frame {
                    Some(Ok(Frame::Text(text))) => handle_message(&shared.handlers, &text),
                    Some(Ok(Frame::Close { code, reason })) => {
                        info!("[Realtime] Connection closed by server ({:?} {})", code, reason);
                        return SessionEnd::Dropped;
                    }
                    Some(Err(e)) => {
                        error!("[Realtime] Error: {}", e);
                        return SessionEnd::Dropped;
                    }
                    None => {
                        info!("[Realtime] Stream ended");
                        return SessionEnd::Dropped;
                    }
                }
            }

            command = command_rx.recv() => {
                match command {
                    Some(Command::Send(message)) => {
                        if let Err(e) = send_control(transport, &message).await {
                            warn!("[Realtime] Failed to send {}: {}", message.kind(), e);
                            return SessionEnd::Dropped;
                        }
                    }
                    Some(Command::Disconnect) | None => return SessionEnd::Stopped,
                }
            }

            _ = heartbeat.tick() => {
                if let Err(e) = send_control(transport, &ControlMessage::Ping).await {
                    warn!("[Realtime] Failed to send ping: {}", e);
                    return SessionEnd::Dropped;
                }
                debug!("[Realtime] Ping sent");
            }
        }
    }
}

/// Resolve once the caller stops the client; control messages that arrive
/// in the meantime are dropped, the desired set covers subscriptions
async fn wait_for_stop(command_rx: &mut mpsc::UnboundedReceiver<Command>) {
    loop {
        match command_rx.recv().await {
            Some(Command::Send(message)) => {
                warn!("[Realtime] Dropping {} message, not connected", message.kind());
            }
            Some(Command::Disconnect) | None => return,
        }
    }
}

fn handle_message(handlers: &HandlerRegistry, text: &str) {
    match InboundMessage::from_json(text) {
        Ok(message) => {
            let delivered = handlers.dispatch(&message);
            debug!("[Realtime] {} delivered to {} handler(s)", message.kind, delivered);
        }
        Err(e) => warn!("[Realtime] Discarding message: {}", e),
    }
}

async fn send_control<T: Transport>(
    transport: &mut T,
    message: &ControlMessage,
) -> Result<(), RealtimeError> {
    let json = serde_json::to_string(message)?;
    transport.send(json).await
}

/// Endpoint without the query string, so credentials stay out of logs
fn display_endpoint(url: &Url) -> String {
    format!("{}{}", url.origin().ascii_serialization(), url.path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_endpoint_hides_token() {
        let url = Url::parse("wss://rt.example.com:8443/ws?token=secret").unwrap();
        assert_eq!(display_endpoint(&url), "wss://rt.example.com:8443/ws");
    }
}
