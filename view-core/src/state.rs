//! Loader snapshots and the events that carry them.
//!
//! A [`LoaderState`] is immutable: every transition of an array loader
//! produces a fresh snapshot. Elements are shared behind an `Arc` so that
//! handing a snapshot to the engine, the presented-state channel and every
//! event subscriber does not copy the collection.

use std::sync::Arc;

use crate::page::{Direction, FetchFailure, PageState};

/// Immutable snapshot of an array loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderState<T, E> {
    elements: Arc<[T]>,
    previous_page_state: PageState<E>,
    next_page_state: PageState<E>,
}

impl<T, E> LoaderState<T, E> {
    /// Create a snapshot from its parts.
    pub fn new(
        elements: impl Into<Arc<[T]>>,
        previous_page_state: PageState<E>,
        next_page_state: PageState<E>,
    ) -> Self {
        Self {
            elements: elements.into(),
            previous_page_state,
            next_page_state,
        }
    }

    /// An empty snapshot with no previous page and a next page to load.
    ///
    /// This is what a freshly created remote loader looks like.
    pub fn empty() -> Self {
        Self::new(Vec::new(), PageState::Completed, PageState::HasMore)
    }

    /// A snapshot whose pagination is exhausted in both directions.
    pub fn complete(elements: impl Into<Arc<[T]>>) -> Self {
        Self::new(elements, PageState::Completed, PageState::Completed)
    }

    /// The ordered elements.
    pub fn elements(&self) -> &[T] {
        &self.elements
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The element at `index`, if any.
    pub fn element(&self, index: usize) -> Option<&T> {
        self.elements.get(index)
    }

    /// State of the previous-page direction.
    pub fn previous_page_state(&self) -> &PageState<E> {
        &self.previous_page_state
    }

    /// State of the next-page direction.
    pub fn next_page_state(&self) -> &PageState<E> {
        &self.next_page_state
    }

    /// State of the given direction.
    pub fn page_state(&self, direction: Direction) -> &PageState<E> {
        match direction {
            Direction::Previous => &self.previous_page_state,
            Direction::Next => &self.next_page_state,
        }
    }

    /// The failure of the given direction, if its last fetch failed.
    pub fn fetch_failure(&self, direction: Direction) -> Option<FetchFailure<'_, E>> {
        self.page_state(direction)
            .error()
            .map(|error| FetchFailure { direction, error })
    }

    /// A new snapshot with the given direction's state replaced.
    pub fn with_page_state(&self, direction: Direction, state: PageState<E>) -> Self
    where
        E: Clone,
    {
        let mut next = Self {
            elements: Arc::clone(&self.elements),
            previous_page_state: self.previous_page_state.clone(),
            next_page_state: self.next_page_state.clone(),
        };
        match direction {
            Direction::Previous => next.previous_page_state = state,
            Direction::Next => next.next_page_state = state,
        }
        next
    }

    /// A new snapshot with `page` inserted at the given direction's end.
    ///
    /// Previous pages prepend, next pages append.
    pub fn inserting(&self, direction: Direction, page: &[T]) -> Self
    where
        T: Clone,
        E: Clone,
    {
        let mut elements = Vec::with_capacity(self.elements.len() + page.len());
        match direction {
            Direction::Previous => {
                elements.extend_from_slice(page);
                elements.extend_from_slice(&self.elements);
            }
            Direction::Next => {
                elements.extend_from_slice(&self.elements);
                elements.extend_from_slice(page);
            }
        }
        Self {
            elements: elements.into(),
            previous_page_state: self.previous_page_state.clone(),
            next_page_state: self.next_page_state.clone(),
        }
    }
}

impl<T, E> Default for LoaderState<T, E> {
    fn default() -> Self {
        Self::empty()
    }
}

/// A loader transition, carrying the resulting snapshot.
///
/// Events for one loader arrive strictly ordered. Each event's state reflects
/// the cumulative effect of every payload seen so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderEvent<T, E> {
    /// The loader's current state, sent first to every new subscriber and
    /// whenever the loader changes in a way not covered by a page event.
    Current {
        /// Resulting snapshot.
        state: LoaderState<T, E>,
    },
    /// The previous page started loading.
    PreviousPageLoading {
        /// Resulting snapshot.
        state: LoaderState<T, E>,
    },
    /// A previous page arrived and was prepended.
    PreviousPageLoaded {
        /// Resulting snapshot.
        state: LoaderState<T, E>,
        /// Number of elements the loader dropped while applying the page.
        removed: usize,
        /// The prepended elements.
        new_elements: Vec<T>,
    },
    /// The previous page failed to load.
    PreviousPageFailed {
        /// Resulting snapshot.
        state: LoaderState<T, E>,
    },
    /// The next page started loading.
    NextPageLoading {
        /// Resulting snapshot.
        state: LoaderState<T, E>,
    },
    /// A next page arrived and was appended.
    NextPageLoaded {
        /// Resulting snapshot.
        state: LoaderState<T, E>,
        /// Number of elements the loader dropped while applying the page.
        removed: usize,
        /// The appended elements.
        new_elements: Vec<T>,
    },
    /// The next page failed to load.
    NextPageFailed {
        /// Resulting snapshot.
        state: LoaderState<T, E>,
    },
}

impl<T, E> LoaderEvent<T, E> {
    /// The snapshot carried by this event.
    pub fn state(&self) -> &LoaderState<T, E> {
        match self {
            Self::Current { state }
            | Self::PreviousPageLoading { state }
            | Self::PreviousPageLoaded { state, .. }
            | Self::PreviousPageFailed { state }
            | Self::NextPageLoading { state }
            | Self::NextPageLoaded { state, .. }
            | Self::NextPageFailed { state } => state,
        }
    }

    /// Consume the event, keeping its snapshot.
    pub fn into_state(self) -> LoaderState<T, E> {
        match self {
            Self::Current { state }
            | Self::PreviousPageLoading { state }
            | Self::PreviousPageLoaded { state, .. }
            | Self::PreviousPageFailed { state }
            | Self::NextPageLoading { state }
            | Self::NextPageLoaded { state, .. }
            | Self::NextPageFailed { state } => state,
        }
    }

    /// The pagination direction this event belongs to, `None` for `Current`.
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Self::Current { .. } => None,
            Self::PreviousPageLoading { .. }
            | Self::PreviousPageLoaded { .. }
            | Self::PreviousPageFailed { .. } => Some(Direction::Previous),
            Self::NextPageLoading { .. }
            | Self::NextPageLoaded { .. }
            | Self::NextPageFailed { .. } => Some(Direction::Next),
        }
    }

    /// Short name of the variant, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Current { .. } => "current",
            Self::PreviousPageLoading { .. } => "previous_page_loading",
            Self::PreviousPageLoaded { .. } => "previous_page_loaded",
            Self::PreviousPageFailed { .. } => "previous_page_failed",
            Self::NextPageLoading { .. } => "next_page_loading",
            Self::NextPageLoaded { .. } => "next_page_loaded",
            Self::NextPageFailed { .. } => "next_page_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type State = LoaderState<u32, String>;

    #[test]
    fn empty_snapshot_has_next_page() {
        let state = State::empty();
        assert!(state.is_empty());
        assert!(state.next_page_state().is_has_more());
        assert!(state.previous_page_state().is_completed());
    }

    #[test]
    fn inserting_previous_prepends() {
        let state = State::complete(vec![3, 4]);
        let state = state.inserting(Direction::Previous, &[1, 2]);
        assert_eq!(state.elements(), &[1, 2, 3, 4]);
    }

    #[test]
    fn inserting_next_appends() {
        let state = State::complete(vec![1, 2]);
        let state = state.inserting(Direction::Next, &[3]);
        assert_eq!(state.elements(), &[1, 2, 3]);
    }

    #[test]
    fn with_page_state_leaves_original_untouched() {
        let original = State::empty();
        let loading = original.with_page_state(Direction::Next, PageState::Loading);

        assert!(original.next_page_state().is_has_more());
        assert!(loading.next_page_state().is_loading());
        assert!(loading.previous_page_state().is_completed());
    }

    #[test]
    fn fetch_failure_only_for_failed_direction() {
        let state =
            State::empty().with_page_state(Direction::Next, PageState::Failed("503".into()));

        assert!(state.fetch_failure(Direction::Previous).is_none());
        let failure = state.fetch_failure(Direction::Next).unwrap();
        assert_eq!(failure.direction, Direction::Next);
        assert_eq!(failure.error, "503");
    }

    #[test]
    fn event_accessors() {
        let event = LoaderEvent::NextPageLoaded {
            state: State::complete(vec![1]),
            removed: 0,
            new_elements: vec![1],
        };
        assert_eq!(event.direction(), Some(Direction::Next));
        assert_eq!(event.name(), "next_page_loaded");
        assert_eq!(event.state().len(), 1);

        let current = LoaderEvent::<u32, String>::Current {
            state: State::empty(),
        };
        assert_eq!(current.direction(), None);
        assert!(current.into_state().is_empty());
    }
}
