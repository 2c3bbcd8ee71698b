//! Array loader abstraction.
//!
//! An [`ArrayLoader`] owns an ordered collection that grows a page at a time in
//! either direction. The controller never fetches anything itself: it asks the
//! loader to load a page and then observes the resulting [`LoaderEvent`]s.
//!
//! # Design
//!
//! The trait is synchronous and subscription-oriented:
//! - `state()` returns the current snapshot
//! - `subscribe()` returns a channel whose first event is `Current`
//! - `load_next_page()` / `load_previous_page()` request a page; a request
//!   while that direction is loading or completed is ignored, a request after
//!   a failure retries
//!
//! Events are delivered in the order the loader produced them. Dropping the
//! receiver cancels the subscription; the loader drops the sender on its side
//! when the next event fails to send.
//!
//! # Example
//!
//! ```ignore
//! let loader = MockArrayLoader::<u32, String>::new();
//! let mut events = loader.subscribe();
//! loader.load_next_page();
//! loader.finish_next_page(Ok(Page::more(vec![1, 2, 3])));
//! ```

mod mock;

pub use mock::{MockArrayLoader, Page};

use arrayview_core::{LoaderEvent, LoaderState};
use tokio::sync::mpsc;

/// Receiving side of a loader subscription.
pub type LoaderEvents<T, E> = mpsc::UnboundedReceiver<LoaderEvent<T, E>>;

/// Sending side of a loader subscription.
pub type LoaderEventSender<T, E> = mpsc::UnboundedSender<LoaderEvent<T, E>>;

/// A two-direction paginated source of elements.
pub trait ArrayLoader: Send + Sync + 'static {
    /// The element type.
    type Element: Clone + Send + Sync + 'static;

    /// The fetch error type.
    type Error: Clone + Send + Sync + 'static;

    /// The current snapshot.
    fn state(&self) -> LoaderState<Self::Element, Self::Error>;

    /// Start observing the loader.
    ///
    /// The first event on the returned channel is always
    /// [`LoaderEvent::Current`] carrying the state at subscription time.
    fn subscribe(&self) -> LoaderEvents<Self::Element, Self::Error>;

    /// Request the next page. No-op while the next page is `Loading` or
    /// `Completed`.
    fn load_next_page(&self);

    /// Request the previous page. No-op while the previous page is `Loading`
    /// or `Completed`.
    fn load_previous_page(&self);
}
