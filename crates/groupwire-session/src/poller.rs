//! Background polling of relay conversations.
//!
//! A [`Poller`] owns one [`HistoryCursor`] per registered conversation
//! and sweeps them all on a fixed interval, decoding each new message
//! and handing the results to a [`FrameHandler`]. A running poller is
//! steered through its cloneable [`PollerHandle`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use groupwire_protocol::FrameError;
use groupwire_relay::{RawMessage, Relay, RelayError};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use crate::cursor::HistoryCursor;

/// Tuning knobs for a [`Poller`].
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Delay between sweeps.
    pub interval: Duration,
    /// Maximum messages fetched per conversation per sweep.
    pub limit: usize,
    /// Stop the run loop once no conversations remain registered.
    pub stop_when_empty: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            limit: 20,
            stop_when_empty: false,
        }
    }
}

impl PollerConfig {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    /// Builder: set the per-sweep message limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Builder: stop once the conversation set becomes empty.
    pub fn with_stop_when_empty(mut self, stop: bool) -> Self {
        self.stop_when_empty = stop;
        self
    }
}

/// Control messages accepted by a running poller.
#[derive(Debug)]
pub enum PollerCommand {
    Register(String),
    Unregister(String),
    SweepNow,
    Stop,
}

/// A decoded frame together with where and when it was observed.
#[derive(Debug, Clone)]
pub struct InboundFrame {
    pub conversation_id: String,
    pub message_id: String,
    pub created_at: DateTime<Utc>,
    pub sender: String,
    pub payload: String,
}

/// Receives the results of a sweep.
///
/// Messages that do not decode as frames (ordinary chatter in the
/// conversation, say) go to `on_undecodable`, which ignores them by
/// default.
pub trait FrameHandler: Send {
    fn on_frame(&mut self, frame: InboundFrame);

    fn on_undecodable(&mut self, conversation_id: &str, message: &RawMessage, error: &FrameError) {
        let _ = (conversation_id, message, error);
    }
}

/// Counters accumulated over the life of a poller.
#[derive(Debug, Clone, Default)]
pub struct PollerStats {
    pub sweeps: u64,
    pub messages_seen: u64,
    pub frames_delivered: u64,
    pub decode_failures: u64,
    pub relay_failures: u64,
    pub last_error: Option<String>,
}

impl PollerStats {
    fn record_relay_failure(&mut self, error: &RelayError) {
        self.relay_failures += 1;
        self.last_error = Some(error.to_string());
    }
}

/// Stats shared between a poller and its handles.
pub type SharedPollerStats = Arc<RwLock<PollerStats>>;

enum LoopStep {
    Continue,
    SweepNow,
    Stop,
}

/// Periodically reads registered conversations and delivers frames.
pub struct Poller {
    relay: Arc<dyn Relay>,
    config: PollerConfig,
    cursors: BTreeMap<String, HistoryCursor>,
    stats: SharedPollerStats,
    command_tx: mpsc::Sender<PollerCommand>,
    command_rx: mpsc::Receiver<PollerCommand>,
}

impl Poller {
    pub fn new(relay: Arc<dyn Relay>, config: PollerConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        Self {
            relay,
            config,
            cursors: BTreeMap::new(),
            stats: Arc::new(RwLock::new(PollerStats::default())),
            command_tx,
            command_rx,
        }
    }

    /// Registers a conversation before the loop starts. Re-registering
    /// an id keeps the existing cursor.
    pub fn register(&mut self, conversation_id: impl Into<String>) {
        let conversation_id = conversation_id.into();
        self.cursors
            .entry(conversation_id.clone())
            .or_insert_with(|| HistoryCursor::new(conversation_id));
    }

    /// Returns a remote control for this poller.
    pub fn handle(&self) -> PollerHandle {
        PollerHandle {
            command_tx: self.command_tx.clone(),
            stats: Arc::clone(&self.stats),
        }
    }

    /// Runs until stopped, sweeping every `interval`.
    ///
    /// The first sweep happens immediately; the interval paces the
    /// later ones.
    pub async fn run<H: FrameHandler>(mut self, mut handler: H) {
        info!(interval = ?self.config.interval, "poller started");

        if !self.sweep(&mut handler).await {
            info!("poller stopped");
            return;
        }

        loop {
            if self.config.stop_when_empty && self.cursors.is_empty() {
                break;
            }

            let step = tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => LoopStep::SweepNow,
                command = self.command_rx.recv() => self.apply_command(command),
            };

            match step {
                LoopStep::Continue => {}
                LoopStep::SweepNow => {
                    if !self.sweep(&mut handler).await {
                        break;
                    }
                }
                LoopStep::Stop => break,
            }
        }

        info!("poller stopped");
    }

    fn apply_command(&mut self, command: Option<PollerCommand>) -> LoopStep {
        match command {
            Some(PollerCommand::Register(conversation_id)) => {
                debug!(%conversation_id, "registering conversation");
                self.cursors
                    .entry(conversation_id.clone())
                    .or_insert_with(|| HistoryCursor::new(conversation_id));
                LoopStep::Continue
            }
            Some(PollerCommand::Unregister(conversation_id)) => {
                debug!(%conversation_id, "unregistering conversation");
                self.cursors.remove(&conversation_id);
                LoopStep::Continue
            }
            Some(PollerCommand::SweepNow) => LoopStep::SweepNow,
            Some(PollerCommand::Stop) => LoopStep::Stop,
            // Every handle is gone, so nothing can steer us any more.
            None => LoopStep::Stop,
        }
    }

    /// Polls every registered conversation once. Returns false when a
    /// stop arrived while sweeping.
    async fn sweep<H: FrameHandler>(&mut self, handler: &mut H) -> bool {
        let ids: Vec<String> = self.cursors.keys().cloned().collect();
        for id in ids {
            // Commands queued while sweeping are applied between
            // conversations; a queued SweepNow is satisfied by this
            // pass.
            while let Ok(command) = self.command_rx.try_recv() {
                match self.apply_command(Some(command)) {
                    LoopStep::Stop => return false,
                    LoopStep::Continue | LoopStep::SweepNow => {}
                }
            }

            let Some(cursor) = self.cursors.get_mut(&id) else {
                // Unregistered while this sweep was in flight.
                continue;
            };

            match cursor.poll(self.relay.as_ref(), self.config.limit).await {
                Ok(messages) => {
                    if !messages.is_empty() {
                        self.dispatch(&id, messages, handler).await;
                    }
                }
                Err(err) => {
                    warn!(conversation_id = %id, error = %err, "poll failed");
                    self.stats.write().await.record_relay_failure(&err);
                }
            }
        }

        self.stats.write().await.sweeps += 1;
        true
    }

    async fn dispatch<H: FrameHandler>(
        &self,
        conversation_id: &str,
        messages: Vec<RawMessage>,
        handler: &mut H,
    ) {
        let mut seen = 0u64;
        let mut delivered = 0u64;
        let mut failed = 0u64;

        for message in &messages {
            seen += 1;
            match groupwire_protocol::decode(&message.text) {
                Ok(frame) => {
                    delivered += 1;
                    handler.on_frame(InboundFrame {
                        conversation_id: conversation_id.to_string(),
                        message_id: message.id.clone(),
                        created_at: message.created_at,
                        sender: frame.sender,
                        payload: frame.payload,
                    });
                }
                Err(err) => {
                    failed += 1;
                    handler.on_undecodable(conversation_id, message, &err);
                }
            }
        }

        // One stats write per batch; the lock is never held across a
        // handler call.
        let mut stats = self.stats.write().await;
        stats.messages_seen += seen;
        stats.frames_delivered += delivered;
        stats.decode_failures += failed;
    }
}

/// Cloneable remote control for a running [`Poller`].
#[derive(Debug, Clone)]
pub struct PollerHandle {
    command_tx: mpsc::Sender<PollerCommand>,
    stats: SharedPollerStats,
}

impl PollerHandle {
    pub async fn register(
        &self,
        conversation_id: impl Into<String>,
    ) -> Result<(), mpsc::error::SendError<PollerCommand>> {
        self.command_tx
            .send(PollerCommand::Register(conversation_id.into()))
            .await
    }

    pub async fn unregister(
        &self,
        conversation_id: impl Into<String>,
    ) -> Result<(), mpsc::error::SendError<PollerCommand>> {
        self.command_tx
            .send(PollerCommand::Unregister(conversation_id.into()))
            .await
    }

    /// Asks the poller to sweep without waiting out the interval.
    pub async fn sweep_now(&self) -> Result<(), mpsc::error::SendError<PollerCommand>> {
        self.command_tx.send(PollerCommand::SweepNow).await
    }

    pub async fn stop(&self) -> Result<(), mpsc::error::SendError<PollerCommand>> {
        self.command_tx.send(PollerCommand::Stop).await
    }

    pub async fn stats(&self) -> PollerStats {
        self.stats.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groupwire_protocol::encode;
    use groupwire_relay::MemoryRelay;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

    struct Collector {
        frames: UnboundedSender<InboundFrame>,
        rejects: UnboundedSender<String>,
    }

    impl FrameHandler for Collector {
        fn on_frame(&mut self, frame: InboundFrame) {
            let _ = self.frames.send(frame);
        }

        fn on_undecodable(
            &mut self,
            _conversation_id: &str,
            message: &RawMessage,
            _error: &FrameError,
        ) {
            let _ = self.rejects.send(message.text.clone());
        }
    }

    fn collector() -> (
        Collector,
        UnboundedReceiver<InboundFrame>,
        UnboundedReceiver<String>,
    ) {
        let (frames_tx, frames_rx) = unbounded_channel();
        let (rejects_tx, rejects_rx) = unbounded_channel();
        (
            Collector {
                frames: frames_tx,
                rejects: rejects_tx,
            },
            frames_rx,
            rejects_rx,
        )
    }

    #[tokio::test]
    async fn sweep_delivers_frames_in_order_and_skips_chatter() {
        let relay = Arc::new(MemoryRelay::new("u1", "tester"));
        let conversation = relay.create_conversation("test").await.unwrap();
        relay
            .post_message(&conversation.id, &encode("p1", "rock").unwrap())
            .await
            .unwrap();
        relay
            .post_message(&conversation.id, "just chatting")
            .await
            .unwrap();
        relay
            .post_message(&conversation.id, &encode("p2", "paper").unwrap())
            .await
            .unwrap();

        let mut poller = Poller::new(relay, PollerConfig::default());
        poller.register(&conversation.id);
        let handle = poller.handle();
        let (mut collector, mut frames, mut rejects) = collector();

        assert!(poller.sweep(&mut collector).await);

        let first = frames.try_recv().unwrap();
        assert_eq!((first.sender.as_str(), first.payload.as_str()), ("p1", "rock"));
        let second = frames.try_recv().unwrap();
        assert_eq!(second.payload, "paper");
        assert!(frames.try_recv().is_err());

        assert_eq!(rejects.try_recv().unwrap(), "just chatting");

        let stats = handle.stats().await;
        assert_eq!(stats.messages_seen, 3);
        assert_eq!(stats.frames_delivered, 2);
        assert_eq!(stats.decode_failures, 1);
        assert_eq!(stats.sweeps, 1);
    }

    #[tokio::test]
    async fn unregistering_the_last_conversation_stops_the_loop() {
        let relay = Arc::new(MemoryRelay::new("u1", "tester"));
        let conversation = relay.create_conversation("test").await.unwrap();

        let config = PollerConfig::new(Duration::from_millis(10)).with_stop_when_empty(true);
        let mut poller = Poller::new(relay, config);
        poller.register(&conversation.id);
        let handle = poller.handle();
        let (collector, _frames, _rejects) = collector();

        let task = tokio::spawn(poller.run(collector));
        handle.unregister(&conversation.id).await.unwrap();

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("poller did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn sweep_now_delivers_without_waiting_out_the_interval() {
        let relay = Arc::new(MemoryRelay::new("u1", "tester"));
        let conversation = relay.create_conversation("test").await.unwrap();

        // An interval far longer than the test timeout, so only an
        // explicit sweep can deliver.
        let config = PollerConfig::new(Duration::from_secs(3600));
        let mut poller = Poller::new(relay.clone(), config);
        poller.register(&conversation.id);
        let handle = poller.handle();
        let (collector, mut frames, _rejects) = collector();
        let task = tokio::spawn(poller.run(collector));

        relay
            .post_message(&conversation.id, &encode("p1", "rock").unwrap())
            .await
            .unwrap();
        handle.sweep_now().await.unwrap();

        let frame = tokio::time::timeout(Duration::from_secs(1), frames.recv())
            .await
            .expect("no frame delivered")
            .unwrap();
        assert_eq!(frame.payload, "rock");

        handle.stop().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn conversations_can_be_registered_through_the_handle() {
        let relay = Arc::new(MemoryRelay::new("u1", "tester"));
        let conversation = relay.create_conversation("test").await.unwrap();
        relay
            .post_message(&conversation.id, &encode("p1", "scissors").unwrap())
            .await
            .unwrap();

        let poller = Poller::new(relay, PollerConfig::new(Duration::from_secs(3600)));
        let handle = poller.handle();
        let (collector, mut frames, _rejects) = collector();
        let task = tokio::spawn(poller.run(collector));

        handle.register(&conversation.id).await.unwrap();
        handle.sweep_now().await.unwrap();

        let frame = tokio::time::timeout(Duration::from_secs(1), frames.recv())
            .await
            .expect("no frame delivered")
            .unwrap();
        assert_eq!(frame.sender, "p1");

        handle.stop().await.unwrap();
        task.await.unwrap();
    }
}
