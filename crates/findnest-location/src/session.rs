//! Hosts a reconciler on its own task.
//!
//! User input, map callbacks, debounce deadlines, the map ready timeout and
//! settled network responses are merged in one `select!` loop, so the
//! reconciler is only ever mutated from that task. After each input the
//! loop publishes a fresh [`LocationSnapshot`] on a watch channel.

use std::time::Duration;

use findnest_core::{Coordinates, ListingLocation};
use findnest_geo::StyleDocument;
use findnest_map::{MapEvent, MapLifecycle, StyleEpoch};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;

use crate::event::{LocationEvent, Settled};
use crate::notice::Notice;
use crate::reconciler::{LocationReconciler, LocationSnapshot};

/// Input to a running session.
#[derive(Debug, Clone)]
pub enum SessionInput {
    Event(LocationEvent),
    /// The rendering library finished loading the style with this epoch
    /// (see [`LocationSnapshot::style_epoch`]). Loads for a replaced style
    /// are ignored.
    MapLoaded(StyleEpoch),
    MapClicked(Coordinates),
    MarkerDragged(Coordinates),
    ReloadStyle(StyleDocument),
}

enum Command {
    Input(SessionInput),
    Barrier(oneshot::Sender<()>),
}

/// State at the end of a session.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub last: LocationSnapshot,
    /// The submit payload, if the session ended with coordinates.
    pub listing: Option<ListingLocation>,
    pub stale_discarded: u64,
}

pub struct LocationSession {
    inputs: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<LocationSnapshot>,
    notices: mpsc::UnboundedReceiver<Notice>,
    task: JoinHandle<SessionSummary>,
}

impl LocationSession {
    /// Moves `reconciler` onto a new task. `settled` is the receiver returned
    /// by [`LocationReconciler::new`].
    #[must_use]
    pub fn spawn(
        mut reconciler: LocationReconciler,
        settled: mpsc::UnboundedReceiver<Settled>,
    ) -> Self {
        let (inputs_tx, inputs_rx) = mpsc::unbounded_channel();
        let (notices_tx, notices_rx) = mpsc::unbounded_channel();
        let (snapshots_tx, snapshots_rx) = watch::channel(reconciler.snapshot());
        let map_events = reconciler.map_mut().subscribe();

        let task = tokio::spawn(run(
            reconciler,
            inputs_rx,
            settled,
            map_events,
            snapshots_tx,
            notices_tx,
        ));

        Self {
            inputs: inputs_tx,
            snapshots: snapshots_rx,
            notices: notices_rx,
            task,
        }
    }

    /// Returns `false` if the session task has already stopped.
    pub fn send(&self, input: SessionInput) -> bool {
        self.inputs.send(Command::Input(input)).is_ok()
    }

    /// Resolves once every input sent before it has been applied and its
    /// snapshot published. Returns `false` if the session task has stopped.
    pub async fn sync(&self) -> bool {
        let (tx, rx) = oneshot::channel();
        self.inputs.send(Command::Barrier(tx)).is_ok() && rx.await.is_ok()
    }

    pub fn dispatch(&self, event: LocationEvent) -> bool {
        self.send(SessionInput::Event(event))
    }

    #[must_use]
    pub fn snapshot(&self) -> LocationSnapshot {
        self.snapshots.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LocationSnapshot> {
        self.snapshots.clone()
    }

    pub async fn next_notice(&mut self) -> Option<Notice> {
        self.notices.recv().await
    }

    pub fn try_next_notice(&mut self) -> Option<Notice> {
        self.notices.try_recv().ok()
    }

    /// Stops the loop, tears the reconciler down and returns the final state.
    ///
    /// # Errors
    ///
    /// Returns the [`JoinError`] if the session task panicked.
    pub async fn shutdown(self) -> Result<SessionSummary, JoinError> {
        let Self { inputs, task, .. } = self;
        drop(inputs);
        task.await
    }
}

async fn run(
    mut reconciler: LocationReconciler,
    mut inputs: mpsc::UnboundedReceiver<Command>,
    mut settled: mpsc::UnboundedReceiver<Settled>,
    mut map_events: mpsc::UnboundedReceiver<MapEvent>,
    snapshots: watch::Sender<LocationSnapshot>,
    notices: mpsc::UnboundedSender<Notice>,
) -> SessionSummary {
    let ready_timeout = reconciler.config().map_ready_timeout;
    let mut ready_deadline = loading_deadline(&reconciler, ready_timeout);

    loop {
        let debounce_at = reconciler.debounce_deadline();
        let ready_at =
            ready_deadline.filter(|_| reconciler.map().lifecycle() == MapLifecycle::Loading);

        tokio::select! {
            command = inputs.recv() => {
                let input = match command {
                    Some(Command::Input(input)) => input,
                    // Earlier inputs were applied and published in earlier
                    // iterations.
                    Some(Command::Barrier(ack)) => {
                        let _ = ack.send(());
                        continue;
                    }
                    None => break,
                };
                match input {
                    SessionInput::Event(event) => reconciler.dispatch(event),
                    SessionInput::MapLoaded(epoch) => {
                        reconciler.map_mut().on_style_loaded(epoch);
                    }
                    SessionInput::MapClicked(at) => reconciler.map_mut().map_clicked(at),
                    SessionInput::MarkerDragged(to) => {
                        if !reconciler.map_mut().marker_dragged(to) {
                            tracing::debug!(%to, "drag ignored, marker not draggable");
                        }
                    }
                    SessionInput::ReloadStyle(style) => {
                        match reconciler.map_mut().reload_style(&style) {
                            Ok(_) => ready_deadline = loading_deadline(&reconciler, ready_timeout),
                            Err(e) => tracing::warn!(error = %e, style = %style.name, "style reload failed"),
                        }
                    }
                }
                // Clicks and drags surface as map events; apply them before
                // the next input so user actions keep their order.
                while let Ok(event) = map_events.try_recv() {
                    reconciler.dispatch(event.into());
                }
            }
            Some(response) = settled.recv() => {
                reconciler.dispatch(LocationEvent::Settled(response));
            }
            Some(event) = map_events.recv() => reconciler.dispatch(event.into()),
            () = sleep_until(debounce_at) => reconciler.dispatch(LocationEvent::DebounceElapsed),
            () = sleep_until(ready_at) => {
                reconciler.map_mut().on_ready_timeout();
                ready_deadline = None;
            }
        }

        for notice in reconciler.take_notices() {
            // Nobody listening is fine; notices are advisory.
            let _ = notices.send(notice);
        }
        snapshots.send_replace(reconciler.snapshot());
    }

    let summary = SessionSummary {
        last: reconciler.snapshot(),
        listing: reconciler.finalize().ok(),
        stale_discarded: reconciler.stale_discarded(),
    };
    reconciler.teardown();
    snapshots.send_replace(reconciler.snapshot());
    summary
}

fn loading_deadline(reconciler: &LocationReconciler, timeout: Duration) -> Option<Instant> {
    (reconciler.map().lifecycle() == MapLifecycle::Loading).then(|| Instant::now() + timeout)
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
