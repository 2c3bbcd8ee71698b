//! Auto-load and pull-to-refresh decisions.
//!
//! The policy decides *when* to ask the loader for more; the loader's page
//! state machine decides whether a request actually starts a fetch. Because a
//! request while `Loading` is a no-op there, repeated scroll notifications
//! never produce more than one in-flight fetch per direction.
//!
//! Previous pages never load automatically. They load only when the user
//! completes a pull gesture and the [`PullMode`] allows it.

use crate::page::Direction;
use crate::region::{ItemPath, PullMode, Region};
use crate::state::LoaderState;

/// A request the policy wants issued against the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadRequest {
    /// Call `load_next_page()`.
    NextPage,
    /// Call `load_previous_page()`.
    PreviousPage,
    /// Replace the loader using the mode's replacement factory.
    ReplaceLoader,
}

/// Tunables for [`AutoLoadPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoLoadPolicy {
    /// Request the first page when an empty loader is attached.
    pub load_on_attach: bool,
    /// Retry a failed next page when its error item scrolls into view.
    pub retry_failed_on_scroll: bool,
}

impl Default for AutoLoadPolicy {
    fn default() -> Self {
        Self {
            load_on_attach: true,
            retry_failed_on_scroll: false,
        }
    }
}

impl AutoLoadPolicy {
    /// Decision for a newly attached loader.
    pub fn on_attach<T, E>(&self, state: &LoaderState<T, E>) -> Option<LoadRequest> {
        (self.load_on_attach && state.is_empty() && state.next_page_state().is_has_more())
            .then_some(LoadRequest::NextPage)
    }

    /// Decision for a scroll or visibility notification.
    ///
    /// `visible` lists the items currently on screen. `state` is the loader's
    /// authoritative state, not the presented snapshot.
    pub fn on_scroll<T, E>(
        &self,
        state: &LoaderState<T, E>,
        visible: &[ItemPath],
    ) -> Option<LoadRequest> {
        let shows = |region: Region| visible.iter().any(|path| path.region == region);
        let next = state.next_page_state();

        if next.is_has_more() && shows(Region::NextActivity) {
            return Some(LoadRequest::NextPage);
        }
        if self.retry_failed_on_scroll && next.error().is_some() && shows(Region::NextError) {
            return Some(LoadRequest::NextPage);
        }
        None
    }

    /// Decision for an explicit retry of `direction`.
    pub fn on_retry<T, E>(
        &self,
        state: &LoaderState<T, E>,
        direction: Direction,
    ) -> Option<LoadRequest> {
        state.page_state(direction).error()?;
        Some(match direction {
            Direction::Previous => LoadRequest::PreviousPage,
            Direction::Next => LoadRequest::NextPage,
        })
    }
}

/// Fraction of the required pull distance covered, clamped to `[0, 1]`.
///
/// Negative or non-finite inputs count as no pull.
pub fn pull_progress(current: f32, required: f32) -> f32 {
    if !(current.is_finite() && required.is_finite()) || required <= 0.0 || current <= 0.0 {
        return 0.0;
    }
    (current / required).min(1.0)
}

/// Decision when the user releases a pull of `amount`.
///
/// `LoadPreviousPage` only acts while the pull region is shown (the previous
/// page is `HasMore`); `Replace` always acts.
pub fn on_pull_released<T, E>(
    mode: &PullMode,
    state: &LoaderState<T, E>,
    amount: f32,
    required: f32,
) -> Option<LoadRequest> {
    if pull_progress(amount, required) < 1.0 {
        return None;
    }
    match mode {
        PullMode::Disallow => None,
        PullMode::LoadPreviousPage { .. } => state
            .previous_page_state()
            .is_has_more()
            .then_some(LoadRequest::PreviousPage),
        PullMode::Replace { .. } => Some(LoadRequest::ReplaceLoader),
    }
}
