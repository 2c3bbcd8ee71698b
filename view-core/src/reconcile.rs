//! Event-to-mutation reconciliation.
//!
//! [`Reconciler`] owns the presented snapshot and turns each
//! [`LoaderEvent`] into the smallest [`Mutation`] that moves the presentation
//! from the old snapshot to the event's snapshot:
//!
//! | Event | Reloaded regions | Inserted values |
//! |---|---|---|
//! | `Current` | everything | - |
//! | `PreviousPageLoading` / `PreviousPageFailed` | PreviousPull, PreviousActivity, PreviousError | - |
//! | `NextPageLoading` / `NextPageFailed` | NextActivity, NextError | - |
//! | `PreviousPageLoaded` | PreviousPull, PreviousActivity, PreviousError | `[0, n)` |
//! | `NextPageLoaded` | NextActivity, NextError, NextCompleted | `[len - n, len)` |
//!
//! Only the regions an event touches are compared, and a touched region is
//! reloaded only when it holds an item in the old or the new snapshot.
//! Removals are never diffed: a loaded event that removed elements, or whose
//! element delta does not match its payload, falls back to a full reload.
//!
//! Like the rest of this crate the reconciler performs no I/O. The runtime
//! applies the returned mutation to the host and waits for completion before
//! feeding the next event.

use std::collections::BTreeSet;

use crate::page::Direction;
use crate::presented::Presented;
use crate::region::{ItemPath, PullMode, Region, RegionLayout};
use crate::state::{LoaderEvent, LoaderState};

/// Regions touched by previous-direction loading and failure events.
const PREVIOUS_REGIONS: [Region; 3] = [
    Region::PreviousPull,
    Region::PreviousActivity,
    Region::PreviousError,
];

/// Regions touched by next-direction loading and failure events.
const NEXT_STATUS_REGIONS: [Region; 2] = [Region::NextActivity, Region::NextError];

/// Regions touched by next-direction loaded events.
const NEXT_LOADED_REGIONS: [Region; 3] = [
    Region::NextActivity,
    Region::NextError,
    Region::NextCompleted,
];

/// A change to apply to the presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Reload the entire presentation.
    ReloadAll,
    /// Reload some regions and insert items, as one atomic batch.
    Batch(BatchUpdate),
}

/// Region reloads plus item insertions applied together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchUpdate {
    /// Regions to reload, in layout order.
    pub reload: BTreeSet<Region>,
    /// Inserted items, ascending.
    pub insert: Vec<ItemPath>,
}

impl BatchUpdate {
    /// Check if the batch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.reload.is_empty() && self.insert.is_empty()
    }
}

/// Result of reconciling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Apply this mutation, then wait for the host to finish.
    Applied(Mutation),
    /// Nothing visible changed; no mutation is needed.
    Unchanged,
    /// The presentation is detached. The snapshot was updated and a full
    /// reload is owed on reattachment.
    Suppressed,
}

impl Outcome {
    /// The mutation to apply, if any.
    pub fn mutation(&self) -> Option<&Mutation> {
        match self {
            Self::Applied(mutation) => Some(mutation),
            Self::Unchanged | Self::Suppressed => None,
        }
    }
}

/// Owner of the presented snapshot.
///
/// The snapshot is replaced on every processed event, including suppressed
/// ones, so item lookups always read the newest state.
#[derive(Debug, Clone)]
pub struct Reconciler<T, E> {
    presented: Presented<T, E>,
    resync_owed: bool,
}

impl<T: Clone, E: Clone> Reconciler<T, E> {
    /// Create a reconciler presenting `state` under `layout`.
    pub fn new(state: LoaderState<T, E>, layout: RegionLayout) -> Self {
        Self {
            presented: Presented::new(state, layout),
            resync_owed: false,
        }
    }

    /// The presented snapshot.
    pub fn presented(&self) -> &Presented<T, E> {
        &self.presented
    }

    /// Whether a full reload is owed from a detached period.
    pub fn resync_owed(&self) -> bool {
        self.resync_owed
    }

    /// Reconcile one event.
    ///
    /// `attached` is whether the presentation is currently attached to a live
    /// view. When it is not, the snapshot is still replaced but no mutation is
    /// produced.
    pub fn process(&mut self, event: LoaderEvent<T, E>, attached: bool) -> Outcome {
        let layout = self.presented.layout().clone();
        let old = self.presented.state().clone();

        let (state, plan) = match event {
            LoaderEvent::Current { state } => (state, Plan::ReloadAll),
            LoaderEvent::PreviousPageLoading { state }
            | LoaderEvent::PreviousPageFailed { state } => (state, Plan::Reload(&PREVIOUS_REGIONS)),
            LoaderEvent::NextPageLoading { state } | LoaderEvent::NextPageFailed { state } => {
                (state, Plan::Reload(&NEXT_STATUS_REGIONS))
            }
            LoaderEvent::PreviousPageLoaded {
                state,
                removed,
                new_elements,
            } => (
                state,
                Plan::Insert {
                    regions: &PREVIOUS_REGIONS,
                    direction: Direction::Previous,
                    removed,
                    inserted: new_elements.len(),
                },
            ),
            LoaderEvent::NextPageLoaded {
                state,
                removed,
                new_elements,
            } => (
                state,
                Plan::Insert {
                    regions: &NEXT_LOADED_REGIONS,
                    direction: Direction::Next,
                    removed,
                    inserted: new_elements.len(),
                },
            ),
        };

        self.presented = Presented::new(state, layout.clone());

        if !attached {
            self.resync_owed = true;
            return Outcome::Suppressed;
        }
        if self.resync_owed {
            self.resync_owed = false;
            return Outcome::Applied(Mutation::ReloadAll);
        }

        let new = self.presented.state();
        let batch = match plan {
            Plan::ReloadAll => return Outcome::Applied(Mutation::ReloadAll),
            Plan::Reload(regions) => BatchUpdate {
                reload: changed_regions(regions, &layout, &old, new),
                insert: Vec::new(),
            },
            Plan::Insert {
                regions,
                direction,
                removed,
                inserted,
            } => {
                if removed > 0 || old.len() + inserted != new.len() {
                    return Outcome::Applied(Mutation::ReloadAll);
                }
                let start = match direction {
                    Direction::Previous => 0,
                    Direction::Next => new.len() - inserted,
                };
                BatchUpdate {
                    reload: changed_regions(regions, &layout, &old, new),
                    insert: (start..start + inserted).map(ItemPath::value).collect(),
                }
            }
        };

        if batch.is_empty() {
            Outcome::Unchanged
        } else {
            Outcome::Applied(Mutation::Batch(batch))
        }
    }

    /// Change the previous-page pull mode.
    ///
    /// The pull region is reloaded when it is shown before or after the
    /// change.
    pub fn set_pull_mode(&mut self, pull_mode: PullMode, attached: bool) -> Outcome {
        let old_layout = self.presented.layout().clone();
        let layout = RegionLayout::new(pull_mode, old_layout.header);
        let state = self.presented.state().clone();

        let shown_before = old_layout.item_count(Region::PreviousPull, &state) > 0;
        let shown_after = layout.item_count(Region::PreviousPull, &state) > 0;
        let title_changed = old_layout.pull_mode.title() != layout.pull_mode.title();
        self.presented = Presented::new(state, layout);

        if !(shown_before || shown_after) || (!title_changed && shown_before == shown_after) {
            return Outcome::Unchanged;
        }
        if !attached {
            self.resync_owed = true;
            return Outcome::Suppressed;
        }
        if self.resync_owed {
            self.resync_owed = false;
            return Outcome::Applied(Mutation::ReloadAll);
        }
        Outcome::Applied(Mutation::Batch(BatchUpdate {
            reload: BTreeSet::from([Region::PreviousPull]),
            insert: Vec::new(),
        }))
    }

    /// Force a full reload, settling any owed resync.
    pub fn resync(&mut self) -> Mutation {
        self.resync_owed = false;
        Mutation::ReloadAll
    }
}

enum Plan {
    ReloadAll,
    Reload(&'static [Region]),
    Insert {
        regions: &'static [Region],
        direction: Direction,
        removed: usize,
        inserted: usize,
    },
}

/// Touched regions that hold an item on either side of the transition.
fn changed_regions<T, E>(
    regions: &[Region],
    layout: &RegionLayout,
    old: &LoaderState<T, E>,
    new: &LoaderState<T, E>,
) -> BTreeSet<Region> {
    regions
        .iter()
        .copied()
        .filter(|&region| {
            layout.item_count(region, old) > 0 || layout.item_count(region, new) > 0
        })
        .collect()
}
