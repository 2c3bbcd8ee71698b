//! Mock array loader for testing.
//!
//! Page requests run through the real page state machine; fetch results are
//! supplied by the test with `finish_*` calls.

use super::{ArrayLoader, LoaderEventSender, LoaderEvents};
use arrayview_core::{
    Direction, LoaderEvent, LoaderState, PageAction, PageEvent, PageState, PageTrigger,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

/// A fetched page handed to [`MockArrayLoader::finish_page`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Elements of the page, in display order.
    pub elements: Vec<T>,
    /// Whether further pages may exist in this direction.
    pub has_more: bool,
}

impl<T> Page<T> {
    /// A page with more to follow.
    pub fn more(elements: Vec<T>) -> Self {
        Self {
            elements,
            has_more: true,
        }
    }

    /// The final page in its direction.
    pub fn last(elements: Vec<T>) -> Self {
        Self {
            elements,
            has_more: false,
        }
    }
}

/// Mock loader for testing.
///
/// Records fetch requests and lets tests complete them in any order. Clones
/// share state, so a test can keep a handle after giving the loader to a
/// controller.
pub struct MockArrayLoader<T, E> {
    inner: Arc<Mutex<MockLoaderInner<T, E>>>,
}

struct MockLoaderInner<T, E> {
    state: LoaderState<T, E>,
    subscribers: Vec<LoaderEventSender<T, E>>,
    previous_fetches: usize,
    next_fetches: usize,
    max_len: Option<usize>,
}

impl<T, E> MockArrayLoader<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Create an empty loader: no previous pages, next page `HasMore`.
    pub fn new() -> Self {
        Self::with_state(LoaderState::empty())
    }

    /// Create a loader starting from `state`.
    pub fn with_state(state: LoaderState<T, E>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockLoaderInner {
                state,
                subscribers: Vec::new(),
                previous_fetches: 0,
                next_fetches: 0,
                max_len: None,
            })),
        }
    }

    /// Keep at most `max_len` elements. A loaded page that overflows drops
    /// elements from the opposite end and reports them as removed.
    pub fn with_max_len(self, max_len: usize) -> Self {
        self.inner().max_len = Some(max_len);
        self
    }

    /// Number of fetches started for `direction`.
    pub fn fetch_count(&self, direction: Direction) -> usize {
        let inner = self.inner();
        match direction {
            Direction::Previous => inner.previous_fetches,
            Direction::Next => inner.next_fetches,
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        let inner = self.inner();
        inner
            .subscribers
            .iter()
            .filter(|sender| !sender.is_closed())
            .count()
    }

    /// Complete the in-flight next page fetch.
    pub fn finish_next_page(&self, result: Result<Page<T>, E>) {
        self.finish_page(Direction::Next, result);
    }

    /// Complete the in-flight previous page fetch.
    pub fn finish_previous_page(&self, result: Result<Page<T>, E>) {
        self.finish_page(Direction::Previous, result);
    }

    /// Complete the in-flight fetch for `direction`.
    ///
    /// Ignored if no fetch is in flight for that direction.
    pub fn finish_page(&self, direction: Direction, result: Result<Page<T>, E>) {
        let mut inner = self.inner();
        let (trigger, page) = match result {
            Ok(page) => (
                PageTrigger::FetchSucceeded {
                    has_more: page.has_more,
                },
                page.elements,
            ),
            Err(error) => (PageTrigger::FetchFailed { error }, Vec::new()),
        };

        let current = inner.state.page_state(direction).clone();
        let (next, actions) = current.on_trigger(trigger);
        for action in actions {
            if let PageAction::Emit(event) = action {
                inner.apply(direction, event, next.clone(), &page);
            }
        }
    }

    /// Replace every element at once. Subscribers see a `Current` event.
    pub fn replace_elements(&self, elements: Vec<T>) {
        let mut inner = self.inner();
        let state = LoaderState::new(
            elements,
            inner.state.previous_page_state().clone(),
            inner.state.next_page_state().clone(),
        );
        inner.state = state.clone();
        inner.broadcast(LoaderEvent::Current { state });
    }

    fn request(&self, direction: Direction) {
        let mut inner = self.inner();
        let current = inner.state.page_state(direction).clone();
        let (next, actions) = current.on_trigger(PageTrigger::LoadRequested);
        for action in actions {
            match action {
                PageAction::Fetch => match direction {
                    Direction::Previous => inner.previous_fetches += 1,
                    Direction::Next => inner.next_fetches += 1,
                },
                PageAction::Emit(event) => inner.apply(direction, event, next.clone(), &[]),
            }
        }
    }

    fn inner(&self) -> MutexGuard<'_, MockLoaderInner<T, E>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T, E> MockLoaderInner<T, E>
where
    T: Clone,
    E: Clone,
{
    fn apply(
        &mut self,
        direction: Direction,
        event: PageEvent<E>,
        page_state: PageState<E>,
        page: &[T],
    ) {
        let mut state = self.state.with_page_state(direction, page_state);
        let event = match (direction, event) {
            (Direction::Previous, PageEvent::Loading) => {
                LoaderEvent::PreviousPageLoading { state }
            }
            (Direction::Next, PageEvent::Loading) => LoaderEvent::NextPageLoading { state },
            (Direction::Previous, PageEvent::Failed(_)) => {
                LoaderEvent::PreviousPageFailed { state }
            }
            (Direction::Next, PageEvent::Failed(_)) => LoaderEvent::NextPageFailed { state },
            (direction, PageEvent::Loaded) => {
                state = state.inserting(direction, page);
                let removed = self.trim(direction, &mut state);
                let new_elements = page.to_vec();
                match direction {
                    Direction::Previous => LoaderEvent::PreviousPageLoaded {
                        state,
                        removed,
                        new_elements,
                    },
                    Direction::Next => LoaderEvent::NextPageLoaded {
                        state,
                        removed,
                        new_elements,
                    },
                }
            }
        };
        self.state = event.state().clone();
        self.broadcast(event);
    }

    /// Drop overflow from the end opposite `direction`, returning the count.
    fn trim(&self, direction: Direction, state: &mut LoaderState<T, E>) -> usize {
        let Some(max_len) = self.max_len else {
            return 0;
        };
        let overflow = state.len().saturating_sub(max_len);
        if overflow == 0 {
            return 0;
        }
        let elements = state.elements();
        let kept = match direction {
            Direction::Next => elements[overflow..].to_vec(),
            Direction::Previous => elements[..max_len].to_vec(),
        };
        let trimmed = LoaderState::new(
            kept,
            state.previous_page_state().clone(),
            state.next_page_state().clone(),
        );
        *state = trimmed;
        overflow
    }

    fn broadcast(&mut self, event: LoaderEvent<T, E>) {
        self.subscribers
            .retain(|sender| sender.send(event.clone()).is_ok());
    }
}

impl<T, E> Default for MockArrayLoader<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Clone for MockArrayLoader<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, E> ArrayLoader for MockArrayLoader<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    type Element = T;
    type Error = E;

    fn state(&self) -> LoaderState<T, E> {
        self.inner().state.clone()
    }

    fn subscribe(&self) -> LoaderEvents<T, E> {
        let mut inner = self.inner();
        let (tx, rx) = mpsc::unbounded_channel();
        // A fresh receiver cannot be closed yet.
        let _ = tx.send(LoaderEvent::Current {
            state: inner.state.clone(),
        });
        inner.subscribers.push(tx);
        rx
    }

    fn load_next_page(&self) {
        self.request(Direction::Next);
    }

    fn load_previous_page(&self) {
        self.request(Direction::Previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Loader = MockArrayLoader<&'static str, String>;

    type Event = LoaderEvent<&'static str, String>;

    fn drain(events: &mut LoaderEvents<&'static str, String>) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(event) = events.try_recv() {
            out.push(event);
        }
        out
    }

    // ===========================================
    // Subscription Tests
    // ===========================================

    #[test]
    fn subscribe_starts_with_current() {
        let loader = Loader::with_state(LoaderState::complete(vec!["a"]));
        let mut events = loader.subscribe();

        let first = events.try_recv().unwrap();
        assert_eq!(
            first,
            LoaderEvent::Current {
                state: LoaderState::complete(vec!["a"])
            }
        );
        assert_eq!(loader.subscriber_count(), 1);
    }

    #[test]
    fn dropped_subscriber_is_pruned_on_next_event() {
        let loader = Loader::new();
        let events = loader.subscribe();
        drop(events);

        loader.load_next_page();
        assert_eq!(loader.subscriber_count(), 0);
        assert!(loader.inner().subscribers.is_empty());
    }

    // ===========================================
    // Paging Tests
    // ===========================================

    #[test]
    fn next_page_loads_and_appends() {
        let loader = Loader::new();
        let mut events = loader.subscribe();

        loader.load_next_page();
        loader.finish_next_page(Ok(Page::last(vec!["a", "b", "c"])));

        let events = drain(&mut events);
        assert_eq!(events.len(), 3);
        assert_eq!(events[1].name(), "next_page_loading");
        assert!(events[1].state().next_page_state().is_loading());

        match &events[2] {
            LoaderEvent::NextPageLoaded {
                state,
                removed,
                new_elements,
            } => {
                assert_eq!(state.elements(), &["a", "b", "c"]);
                assert!(state.next_page_state().is_completed());
                assert_eq!(*removed, 0);
                assert_eq!(new_elements, &vec!["a", "b", "c"]);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(loader.fetch_count(Direction::Next), 1);
    }

    #[test]
    fn duplicate_request_while_loading_is_ignored() {
        let loader = Loader::new();
        let mut events = loader.subscribe();

        loader.load_next_page();
        loader.load_next_page();

        assert_eq!(drain(&mut events).len(), 2);
        assert_eq!(loader.fetch_count(Direction::Next), 1);
    }

    #[test]
    fn previous_page_prepends() {
        let loader = Loader::with_state(LoaderState::new(
            vec!["c"],
            PageState::HasMore,
            PageState::Completed,
        ));

        loader.load_previous_page();
        loader.finish_previous_page(Ok(Page::more(vec!["a", "b"])));

        let state = loader.state();
        assert_eq!(state.elements(), &["a", "b", "c"]);
        assert!(state.previous_page_state().is_has_more());
    }

    #[test]
    fn failure_is_retained_and_retry_refetches() {
        let loader = Loader::new();
        loader.load_next_page();
        loader.finish_next_page(Err("timeout".into()));

        assert_eq!(
            loader.state().next_page_state(),
            &PageState::Failed("timeout".to_string())
        );

        loader.load_next_page();
        assert!(loader.state().next_page_state().is_loading());
        assert_eq!(loader.fetch_count(Direction::Next), 2);
    }

    #[test]
    fn failure_in_one_direction_does_not_block_the_other() {
        let loader = Loader::with_state(LoaderState::new(
            vec!["m"],
            PageState::HasMore,
            PageState::HasMore,
        ));
        loader.load_previous_page();
        loader.finish_previous_page(Err("offline".into()));

        loader.load_next_page();
        loader.finish_next_page(Ok(Page::more(vec!["n"])));

        let state = loader.state();
        assert_eq!(state.elements(), &["m", "n"]);
        assert_eq!(
            state.previous_page_state(),
            &PageState::Failed("offline".to_string())
        );
        assert_eq!(loader.fetch_count(Direction::Next), 1);
        assert_eq!(loader.fetch_count(Direction::Previous), 1);
    }

    #[test]
    fn finish_without_fetch_is_ignored() {
        let loader = Loader::new();
        let mut events = loader.subscribe();

        loader.finish_next_page(Ok(Page::more(vec!["x"])));

        assert_eq!(drain(&mut events).len(), 1);
        assert!(loader.state().is_empty());
    }

    #[test]
    fn window_overflow_reports_removed() {
        let loader = Loader::with_state(LoaderState::new(
            vec!["a", "b"],
            PageState::Completed,
            PageState::HasMore,
        ))
        .with_max_len(3);
        let mut events = loader.subscribe();

        loader.load_next_page();
        loader.finish_next_page(Ok(Page::more(vec!["c", "d"])));

        match drain(&mut events).pop() {
            Some(LoaderEvent::NextPageLoaded { state, removed, .. }) => {
                assert_eq!(removed, 1);
                assert_eq!(state.elements(), &["b", "c", "d"]);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn previous_window_overflow_drops_from_the_end() {
        let loader = Loader::with_state(LoaderState::new(
            vec!["c", "d"],
            PageState::HasMore,
            PageState::HasMore,
        ))
        .with_max_len(3);
        let mut events = loader.subscribe();

        loader.load_previous_page();
        loader.finish_previous_page(Ok(Page::last(vec!["a", "b"])));

        match drain(&mut events).pop() {
            Some(LoaderEvent::PreviousPageLoaded {
                state,
                removed,
                new_elements,
            }) => {
                assert_eq!(removed, 1);
                assert_eq!(new_elements, vec!["a", "b"]);
                assert_eq!(state.elements(), &["a", "b", "c"]);
                assert!(state.previous_page_state().is_completed());
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn replace_elements_emits_current() {
        let loader = Loader::with_state(LoaderState::complete(vec!["a", "b"]));
        let mut events = loader.subscribe();

        loader.replace_elements(vec!["z"]);

        let events = drain(&mut events);
        assert_eq!(events[1].name(), "current");
        assert_eq!(events[1].state().elements(), &["z"]);
    }
}
