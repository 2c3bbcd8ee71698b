//! Per-direction pagination state machine.
//!
//! Each loader keeps one [`PageState`] for the previous direction and one for
//! the next direction. Transitions are pure: a trigger goes in, the new state
//! plus a list of actions comes out. The loader interprets the actions
//! (starting the fetch, emitting the matching [`LoaderEvent`](crate::LoaderEvent)).

use std::fmt;

/// Pagination direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    /// Prepends elements before the current first element.
    Previous,
    /// Appends elements after the current last element.
    Next,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Previous => write!(f, "previous"),
            Direction::Next => write!(f, "next"),
        }
    }
}

/// Load state of one pagination direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageState<E> {
    /// More items may exist. Nothing in flight.
    HasMore,
    /// A fetch for this direction is in flight.
    Loading,
    /// The last fetch failed. A new load request retries.
    Failed(E),
    /// No more items exist in this direction. Terminal.
    Completed,
}

impl<E> PageState<E> {
    /// Check if more items may be fetched and nothing is in flight.
    pub fn is_has_more(&self) -> bool {
        matches!(self, Self::HasMore)
    }

    /// Check if a fetch is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Check if pagination is exhausted.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// The retained error of a failed fetch.
    pub fn error(&self) -> Option<&E> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Check if a load request would start a fetch (`HasMore` or `Failed`).
    pub fn can_load(&self) -> bool {
        matches!(self, Self::HasMore | Self::Failed(_))
    }

    /// Process a trigger and return the new state plus actions to execute.
    ///
    /// This is a pure function. Triggers that are not valid for the current
    /// state leave it unchanged and produce no actions; in particular a load
    /// request while `Loading` or `Completed` is a no-op.
    pub fn on_trigger(self, trigger: PageTrigger<E>) -> (Self, Vec<PageAction<E>>)
    where
        E: Clone,
    {
        match (self, trigger) {
            (Self::HasMore | Self::Failed(_), PageTrigger::LoadRequested) => (
                Self::Loading,
                vec![PageAction::Fetch, PageAction::Emit(PageEvent::Loading)],
            ),

            (Self::Loading, PageTrigger::FetchSucceeded { has_more }) => {
                let next = if has_more {
                    Self::HasMore
                } else {
                    Self::Completed
                };
                (next, vec![PageAction::Emit(PageEvent::Loaded)])
            }
            (Self::Loading, PageTrigger::FetchFailed { error }) => (
                Self::Failed(error.clone()),
                vec![PageAction::Emit(PageEvent::Failed(error))],
            ),

            // Invalid transitions - stay in current state
            (state, _) => (state, vec![]),
        }
    }
}

impl<E> Default for PageState<E> {
    fn default() -> Self {
        Self::HasMore
    }
}

/// Inputs to the page state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageTrigger<E> {
    /// A load (or retry) was requested for this direction.
    LoadRequested,
    /// The in-flight fetch succeeded.
    FetchSucceeded {
        /// Whether further pages may exist.
        has_more: bool,
    },
    /// The in-flight fetch failed.
    FetchFailed {
        /// The fetch error, retained in [`PageState::Failed`].
        error: E,
    },
}

/// Actions to be executed by the loader.
///
/// These are instructions, not side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAction<E> {
    /// Start fetching a page in this direction.
    Fetch,
    /// Emit the matching loader event to subscribers.
    Emit(PageEvent<E>),
}

/// Page-level transition kinds, mapped onto [`LoaderEvent`](crate::LoaderEvent)
/// variants by the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent<E> {
    /// The direction started loading.
    Loading,
    /// A page arrived.
    Loaded,
    /// The fetch failed.
    Failed(E),
}

/// A failed fetch, viewed together with its direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchFailure<'a, E> {
    /// Direction whose fetch failed.
    pub direction: Direction,
    /// The error retained by [`PageState::Failed`].
    pub error: &'a E,
}

impl<E: fmt::Display> fmt::Display for FetchFailure<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} page fetch failed: {}", self.direction, self.error)
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for FetchFailure<'_, E> {}
