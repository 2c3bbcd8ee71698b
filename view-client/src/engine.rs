//! The reconciliation engine.
//!
//! One Tokio task owns the [`Reconciler`] and is the only place loader events
//! are turned into host mutations.
//!
//! # Architecture
//!
//! ```text
//! ArrayLoader ──events──▶ Engine task ──mutation──▶ PresentationHost
//!                            ▲   │                       │
//!       Controller ─commands─┘   └──◀── completion ──────┘
//! ```
//!
//! The task awaits each mutation before reading the next event, so mutations
//! never overlap and every batch is computed against the snapshot the host
//! already reflects. Events that arrive meanwhile queue in the subscription
//! channel and are applied in order afterwards.
//!
//! Attaching a new subscription drops the previous receiver. Events still
//! queued for the old loader are discarded with it; the new subscription's
//! `Current` event reloads everything.

use arrayview_core::{
    LoaderEvent, Mutation, Outcome, Presented, PullMode, Reconciler, RegionLayout,
};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

use crate::error::ClientError;
use crate::host::PresentationHost;
use crate::loader::LoaderEvents;

/// Instructions from the controller to the engine task.
pub(crate) enum Command<T, E> {
    /// Start consuming a new loader subscription, dropping the old one.
    Attach {
        /// The new subscription.
        events: LoaderEvents<T, E>,
    },
    /// Settle an owed resync if the host is attached. With `force`, reload
    /// everything even if nothing is owed.
    Resync {
        /// Reload regardless of whether a resync is owed.
        force: bool,
    },
    /// Change the pull region's mode.
    SetPullMode(PullMode),
}

/// Controller-side handle to a running engine.
pub(crate) struct EngineHandle<T, E> {
    commands: mpsc::UnboundedSender<Command<T, E>>,
    presented: watch::Receiver<Presented<T, E>>,
    outcomes: broadcast::Sender<Outcome>,
    task: JoinHandle<()>,
}

impl<T, E> EngineHandle<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Spawn the engine task onto the current Tokio runtime.
    pub(crate) fn spawn<H: PresentationHost>(
        layout: RegionLayout,
        host: Arc<H>,
        outcome_buffer: usize,
    ) -> Self {
        let reconciler = Reconciler::new(Default::default(), layout);
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (presented_tx, presented_rx) = watch::channel(reconciler.presented().clone());
        let (outcomes_tx, _) = broadcast::channel(outcome_buffer);

        let engine = Engine {
            reconciler,
            host,
            commands: commands_rx,
            events: None,
            presented: presented_tx,
            outcomes: outcomes_tx.clone(),
        };
        let task = tokio::spawn(engine.run());

        Self {
            commands: commands_tx,
            presented: presented_rx,
            outcomes: outcomes_tx,
            task,
        }
    }

    /// Queue a command for the engine task.
    pub(crate) fn send(&self, command: Command<T, E>) -> Result<(), ClientError> {
        self.commands
            .send(command)
            .map_err(|_| ClientError::EngineStopped)
    }

    /// Watch the presented snapshot.
    pub(crate) fn presented(&self) -> watch::Receiver<Presented<T, E>> {
        self.presented.clone()
    }

    /// Subscribe to reconciliation outcomes.
    pub(crate) fn outcomes(&self) -> broadcast::Receiver<Outcome> {
        self.outcomes.subscribe()
    }

    /// Stop accepting commands and wait for the task to finish its current
    /// mutation.
    pub(crate) async fn shutdown(self) {
        let Self { commands, task, .. } = self;
        drop(commands);
        if let Err(e) = task.await {
            tracing::error!("Engine task failed: {}", e);
        }
    }
}

struct Engine<T, E, H> {
    reconciler: Reconciler<T, E>,
    host: Arc<H>,
    commands: mpsc::UnboundedReceiver<Command<T, E>>,
    events: Option<LoaderEvents<T, E>>,
    presented: watch::Sender<Presented<T, E>>,
    outcomes: broadcast::Sender<Outcome>,
}

impl<T, E, H> Engine<T, E, H>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    H: PresentationHost,
{
    async fn run(mut self) {
        tracing::info!("Engine started");
        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },

                event = next_event(&mut self.events), if self.events.is_some() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        tracing::debug!("Loader subscription closed");
                        self.events = None;
                    }
                },
            }
        }
        tracing::info!("Engine stopped");
    }

    async fn handle_command(&mut self, command: Command<T, E>) {
        match command {
            Command::Attach { events } => {
                tracing::info!("Attaching loader subscription");
                self.events = Some(events);
            }
            Command::Resync { force } => {
                if !self.host.is_attached() {
                    tracing::debug!("Resync requested while detached, deferring");
                    return;
                }
                if force || self.reconciler.resync_owed() {
                    tracing::debug!("Resyncing presentation (forced: {})", force);
                    let mutation = self.reconciler.resync();
                    self.apply(Outcome::Applied(mutation)).await;
                }
            }
            Command::SetPullMode(pull_mode) => {
                let attached = self.host.is_attached();
                let outcome = self.reconciler.set_pull_mode(pull_mode, attached);
                self.publish();
                self.apply(outcome).await;
            }
        }
    }

    async fn handle_event(&mut self, event: LoaderEvent<T, E>) {
        let name = event.name();
        let delta = LoadedDelta::of(&event, self.reconciler.presented().state().len());
        let resync_owed = self.reconciler.resync_owed();

        let attached = self.host.is_attached();
        let outcome = self.reconciler.process(event, attached);
        tracing::debug!(
            "Reconciled {} (attached: {}): {:?}",
            name,
            attached,
            outcome
        );

        if let Some(delta) = reload_fallback(delta, resync_owed, &outcome) {
            tracing::warn!(
                "Loader went from {} to {} elements ({} new, {} removed) during {}, reloading all",
                delta.before,
                delta.after,
                delta.inserted,
                delta.removed,
                name
            );
        }

        self.publish();
        self.apply(outcome).await;
    }

    /// Hand the outcome's mutation to the host, wait for completion, then
    /// announce the outcome.
    async fn apply(&mut self, outcome: Outcome) {
        if let Some(mutation) = outcome.mutation() {
            if matches!(mutation, Mutation::ReloadAll) {
                tracing::debug!("Reloading all regions");
            }
            self.host.perform_batched_mutation(mutation.clone()).await;
        }
        // No subscribers is fine.
        let _ = self.outcomes.send(outcome);
    }

    fn publish(&self) {
        self.presented.send_replace(self.reconciler.presented().clone());
    }
}

/// Element counts around a loaded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LoadedDelta {
    before: usize,
    after: usize,
    inserted: usize,
    removed: usize,
}

impl LoadedDelta {
    /// Counts for `event` against `before` presented elements. `None` unless
    /// the event loaded a page.
    fn of<T, E>(event: &LoaderEvent<T, E>, before: usize) -> Option<Self> {
        match event {
            LoaderEvent::PreviousPageLoaded {
                state,
                removed,
                new_elements,
            }
            | LoaderEvent::NextPageLoaded {
                state,
                removed,
                new_elements,
            } => Some(Self {
                before,
                after: state.len(),
                inserted: new_elements.len(),
                removed: *removed,
            }),
            _ => None,
        }
    }
}

/// The delta of a loaded event that fell back to a full reload. An owed
/// resync also reloads everything and is not a fallback.
fn reload_fallback(
    delta: Option<LoadedDelta>,
    resync_owed: bool,
    outcome: &Outcome,
) -> Option<LoadedDelta> {
    match outcome {
        Outcome::Applied(Mutation::ReloadAll) if !resync_owed => delta,
        _ => None,
    }
}

async fn next_event<T, E>(events: &mut Option<LoaderEvents<T, E>>) -> Option<LoaderEvent<T, E>> {
    match events {
        Some(events) => events.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MockHost;
    use arrayview_core::{BatchUpdate, LoaderState, PageState, Region};
    use std::collections::BTreeSet;
    use std::time::Duration;

    type Handle = EngineHandle<&'static str, String>;

    fn spawn(host: &MockHost) -> Handle {
        EngineHandle::spawn(RegionLayout::default(), Arc::new(host.clone()), 16)
    }

    fn reload(regions: &[Region]) -> Mutation {
        Mutation::Batch(BatchUpdate {
            reload: regions.iter().copied().collect::<BTreeSet<_>>(),
            insert: Vec::new(),
        })
    }

    fn attach(handle: &Handle) -> mpsc::UnboundedSender<LoaderEvent<&'static str, String>> {
        let (tx, rx) = mpsc::unbounded_channel();
        handle.send(Command::Attach { events: rx }).unwrap();
        tx
    }

    fn loading() -> LoaderEvent<&'static str, String> {
        LoaderEvent::NextPageLoading {
            state: LoaderState::new(vec![], PageState::Completed, PageState::Loading),
        }
    }

    // ===========================================
    // Event Processing Tests
    // ===========================================

    #[tokio::test]
    async fn events_become_host_mutations_in_order() {
        let host = MockHost::new();
        let handle = spawn(&host);
        let events = attach(&handle);

        events
            .send(LoaderEvent::Current {
                state: LoaderState::empty(),
            })
            .unwrap();
        events.send(loading()).unwrap();

        host.wait_for_completed(2).await;
        assert_eq!(
            host.mutations(),
            vec![Mutation::ReloadAll, reload(&[Region::NextActivity])]
        );
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn presented_snapshot_is_published() {
        let host = MockHost::new();
        let handle = spawn(&host);
        let mut presented = handle.presented();
        let events = attach(&handle);

        events
            .send(LoaderEvent::Current {
                state: LoaderState::complete(vec!["a", "b"]),
            })
            .unwrap();

        presented.wait_for(|p| p.state().len() == 2).await.unwrap();
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn outcomes_are_broadcast_after_completion() {
        let host = MockHost::new();
        let handle = spawn(&host);
        let mut outcomes = handle.outcomes();
        let events = attach(&handle);

        events
            .send(LoaderEvent::Current {
                state: LoaderState::empty(),
            })
            .unwrap();

        let outcome = outcomes.recv().await.unwrap();
        assert_eq!(outcome, Outcome::Applied(Mutation::ReloadAll));
        assert_eq!(host.completed(), 1);
        handle.shutdown().await;
    }

    // ===========================================
    // Serialization Tests
    // ===========================================

    #[tokio::test]
    async fn next_mutation_waits_for_completion() {
        let host = MockHost::new();
        host.hold_completions();
        let handle = spawn(&host);
        let events = attach(&handle);

        events
            .send(LoaderEvent::Current {
                state: LoaderState::empty(),
            })
            .unwrap();
        events.send(loading()).unwrap();

        host.wait_for_mutations(1).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(host.mutations().len(), 1);

        host.release(2);
        host.wait_for_completed(2).await;
        assert_eq!(host.mutations().len(), 2);
        handle.shutdown().await;
    }

    // ===========================================
    // Fallback Tests
    // ===========================================

    fn trimmed_page() -> LoaderEvent<&'static str, String> {
        LoaderEvent::NextPageLoaded {
            state: LoaderState::new(vec!["b", "c"], PageState::Completed, PageState::HasMore),
            removed: 1,
            new_elements: vec!["c"],
        }
    }

    #[test]
    fn loaded_delta_counts_page_and_removals() {
        let delta = LoadedDelta::of(&trimmed_page(), 2);
        assert_eq!(
            delta,
            Some(LoadedDelta {
                before: 2,
                after: 2,
                inserted: 1,
                removed: 1,
            })
        );
        assert_eq!(LoadedDelta::of(&loading(), 0), None);
    }

    #[test]
    fn reload_fallback_only_for_attached_full_reload() {
        let delta = LoadedDelta::of(&trimmed_page(), 2);
        let reload_all = Outcome::Applied(Mutation::ReloadAll);

        assert_eq!(reload_fallback(delta, false, &reload_all), delta);
        // detached: the snapshot moved but nothing was reloaded
        assert_eq!(reload_fallback(delta, false, &Outcome::Suppressed), None);
        // the reload settles an owed resync
        assert_eq!(reload_fallback(delta, true, &reload_all), None);
        let batch = Outcome::Applied(reload(&[Region::NextActivity]));
        assert_eq!(reload_fallback(delta, false, &batch), None);
        assert_eq!(reload_fallback(None, false, &reload_all), None);
    }

    // ===========================================
    // Attachment Tests
    // ===========================================

    #[tokio::test]
    async fn detached_events_defer_to_resync() {
        let host = MockHost::detached();
        let handle = spawn(&host);
        let mut outcomes = handle.outcomes();
        let events = attach(&handle);

        events
            .send(LoaderEvent::Current {
                state: LoaderState::complete(vec!["a"]),
            })
            .unwrap();
        assert_eq!(outcomes.recv().await.unwrap(), Outcome::Suppressed);
        assert!(host.mutations().is_empty());

        host.set_attached(true);
        handle.send(Command::Resync { force: false }).unwrap();
        assert_eq!(
            outcomes.recv().await.unwrap(),
            Outcome::Applied(Mutation::ReloadAll)
        );

        // Nothing is owed any more.
        handle.send(Command::Resync { force: false }).unwrap();
        handle.send(Command::Resync { force: true }).unwrap();
        host.wait_for_completed(2).await;
        assert_eq!(host.mutations().len(), 2);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn attach_replaces_previous_subscription() {
        let host = MockHost::new();
        let handle = spawn(&host);
        let old = attach(&handle);
        let new = attach(&handle);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(old.is_closed());

        new.send(LoaderEvent::Current {
            state: LoaderState::complete(vec!["x"]),
        })
        .unwrap();
        host.wait_for_completed(1).await;
        assert_eq!(host.mutations(), vec![Mutation::ReloadAll]);
        handle.shutdown().await;
    }
}
