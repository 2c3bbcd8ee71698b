//! # arrayview-core
//!
//! Pure logic for arrayview (no I/O, instant tests).
//!
//! This crate implements the pagination state machine, the region layout and
//! the event-to-mutation reconciliation that keep a windowed list in sync with
//! a two-direction paginated array loader.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects:
//! - [`PageState::on_trigger`] returns the next page state plus actions
//! - [`Reconciler::process`] returns the [`Mutation`] to apply for an event
//! - [`AutoLoadPolicy`] returns the [`LoadRequest`] to issue, if any
//!
//! The actual work (fetching, applying mutations to a host, waiting for
//! completion) is performed by `arrayview-client`, which interprets these
//! results.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod page;
pub mod policy;
pub mod presented;
pub mod reconcile;
pub mod region;
pub mod state;

pub use page::{Direction, FetchFailure, PageAction, PageEvent, PageState, PageTrigger};
pub use policy::{on_pull_released, pull_progress, AutoLoadPolicy, LoadRequest};
pub use presented::{ErrorDisplay, Presented, PresentedItem, PullDisplay, ValueDisplay};
pub use reconcile::{BatchUpdate, Mutation, Outcome, Reconciler};
pub use region::{
    region_item_count, InvalidRegionIndex, ItemPath, PullMode, Region, RegionCounts, RegionLayout,
};
pub use state::{LoaderEvent, LoaderState};
