//! Presentation host abstraction.
//!
//! The host is the list view being kept in sync. It renders items from the
//! presented snapshot and applies the mutations the engine computes.
//!
//! # Design
//!
//! `perform_batched_mutation()` returns when the host has finished applying
//! the mutation (including any animation). The engine never issues the next
//! mutation before the previous one returns, so a host sees at most one
//! mutation at a time.

mod mock;

pub use mock::MockHost;

use arrayview_core::Mutation;
use async_trait::async_trait;

/// A presentation that displays the region layout.
#[async_trait]
pub trait PresentationHost: Send + Sync + 'static {
    /// Check if the presentation is currently attached to a visible surface.
    ///
    /// While detached, mutations are suppressed and a full reload is owed.
    fn is_attached(&self) -> bool;

    /// Apply one mutation and return once it has completed.
    ///
    /// [`Mutation::ReloadAll`] discards everything and re-reads the presented
    /// snapshot. [`Mutation::Batch`] reloads the listed regions and inserts
    /// the listed item paths atomically.
    async fn perform_batched_mutation(&self, mutation: Mutation);
}
