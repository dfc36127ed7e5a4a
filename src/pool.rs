// pool.rs: Central event loop for polling and lyric fetching

use crate::event::{Command, Event, SyncEngine};
use crate::lyrics::{LyricProvider, normalize};
use crate::player::{PlaybackProbe, TrackIdentity};
use crate::state::Update;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};

const EVENT_CHANNEL_CAPACITY: usize = 32;
const UPDATE_CHANNEL_CAPACITY: usize = 32;

/// Presenter-side handle to a running engine.
pub struct EngineHandle {
    events: mpsc::Sender<Event>,
    updates: mpsc::Receiver<Update>,
    task: JoinHandle<()>,
}

impl EngineHandle {
    /// Next state snapshot, or `None` once the engine has stopped.
    pub async fn next_update(&mut self) -> Option<Update> {
        self.updates.recv().await
    }

    /// Request a lyric re-fetch for the current track. Never waits: when the
    /// event queue is full the request is dropped.
    pub fn refresh(&self) {
        if let Err(e) = self.events.try_send(Event::ManualRefresh) {
            tracing::debug!(error = %e, "refresh request dropped");
        }
    }

    /// Stop the engine and wait for its loop to exit.
    pub async fn shutdown(self) {
        // Receiver goes first so an engine blocked on a full update channel exits.
        drop(self.updates);
        let _ = self.events.send(Event::Shutdown).await;
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "engine task ended abnormally");
        }
    }
}

/// Start the poller and the engine loop.
pub fn spawn<P, L>(probe: Arc<P>, provider: Arc<L>, poll_interval: Duration) -> EngineHandle
where
    P: PlaybackProbe,
    L: LyricProvider,
{
    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let (update_tx, update_rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
    let poller = tokio::spawn(poll(probe, poll_interval, event_tx.clone()));
    let task = tokio::spawn(listen(provider, event_rx, event_tx.clone(), update_tx, poller));
    EngineHandle {
        events: event_tx,
        updates: update_rx,
        task,
    }
}

/// Sample the probe on a fixed cadence and post each result as a tick.
async fn poll<P: PlaybackProbe>(probe: Arc<P>, interval: Duration, event_tx: mpsc::Sender<Event>) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let result = probe.probe().await;
        if event_tx.send(Event::Tick(result)).await.is_err() {
            break;
        }
    }
}

/// Single owner of the engine state. Applies events in arrival order and
/// publishes a snapshot whenever the state changes.
async fn listen<L: LyricProvider>(
    provider: Arc<L>,
    mut event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    update_tx: mpsc::Sender<Update>,
    poller: JoinHandle<()>,
) {
    let mut engine = SyncEngine::new();
    let mut last_sent: Option<u64> = None;

    if send_update(&engine, &update_tx, &mut last_sent).await {
        while let Some(event) = event_rx.recv().await {
            if matches!(event, Event::Shutdown) {
                tracing::debug!("engine shutting down");
                break;
            }
            if let Some(Command::Fetch(track)) = engine.handle(event) {
                spawn_fetch(provider.clone(), track, event_tx.clone());
            }
            if !send_update(&engine, &update_tx, &mut last_sent).await {
                tracing::debug!("presenter gone, stopping engine");
                break;
            }
        }
    }
    poller.abort();
}

/// Run one lyric fetch off the polling path and feed the result back in.
fn spawn_fetch<L: LyricProvider>(provider: Arc<L>, track: TrackIdentity, event_tx: mpsc::Sender<Event>) {
    tokio::spawn(async move {
        let result = provider.fetch(&track).await.map_text(|t| normalize(&t));
        // A closed channel means the engine stopped; the result is dropped.
        let _ = event_tx
            .send(Event::FetchCompleted {
                result,
                for_track: track,
            })
            .await;
    });
}

/// Publish the current snapshot if its version has not been sent yet.
/// Returns `false` when the presenter has gone away.
async fn send_update(engine: &SyncEngine, update_tx: &mpsc::Sender<Update>, last_sent: &mut Option<u64>) -> bool {
    let version = engine.state().version;
    if *last_sent == Some(version) {
        return true;
    }
    if update_tx.send(engine.state().to_update()).await.is_err() {
        return false;
    }
    *last_sent = Some(version);
    true
}
