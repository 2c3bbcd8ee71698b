//! Item lookup against the presented snapshot.
//!
//! The host populates its items from [`Presented`], never from the loader
//! directly: the presented snapshot is the state the presentation currently
//! reflects, so counts and contents always agree with the last mutation.

use crate::page::Direction;
use crate::region::{ItemPath, Region, RegionCounts, RegionLayout};
use crate::state::LoaderState;

/// The presented snapshot together with the layout it is shown under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presented<T, E> {
    state: LoaderState<T, E>,
    layout: RegionLayout,
}

impl<T, E> Presented<T, E> {
    /// Wrap a snapshot and layout.
    pub fn new(state: LoaderState<T, E>, layout: RegionLayout) -> Self {
        Self { state, layout }
    }

    /// The presented loader snapshot.
    pub fn state(&self) -> &LoaderState<T, E> {
        &self.state
    }

    /// The layout in effect.
    pub fn layout(&self) -> &RegionLayout {
        &self.layout
    }

    /// Item count of one region.
    pub fn item_count(&self, region: Region) -> usize {
        self.layout.item_count(region, &self.state)
    }

    /// Item counts of every region.
    pub fn counts(&self) -> RegionCounts {
        self.layout.counts(&self.state)
    }

    /// What to display at `path`, or `None` if the path is out of range.
    pub fn item(&self, path: ItemPath) -> Option<PresentedItem<'_, T, E>> {
        if path.item >= self.item_count(path.region) {
            return None;
        }
        let item = match path.region {
            Region::PreviousPull => PresentedItem::Pull {
                title: self.layout.pull_mode.title().unwrap_or_default(),
            },
            Region::PreviousActivity => PresentedItem::Activity(Direction::Previous),
            Region::PreviousError => PresentedItem::Error {
                direction: Direction::Previous,
                error: self.state.previous_page_state().error()?,
            },
            Region::Header => PresentedItem::Header,
            Region::Values => PresentedItem::Value {
                index: path.item,
                value: self.state.element(path.item)?,
            },
            Region::NextActivity => PresentedItem::Activity(Direction::Next),
            Region::NextError => PresentedItem::Error {
                direction: Direction::Next,
                error: self.state.next_page_state().error()?,
            },
            Region::NextCompleted => PresentedItem::Completed,
        };
        Some(item)
    }

    /// The element at `path` if it is a selectable value item.
    pub fn selectable_value(&self, path: ItemPath) -> Option<&T> {
        if !path.region.is_selectable() {
            return None;
        }
        self.state.element(path.item)
    }
}

/// The content of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentedItem<'a, T, E> {
    /// Previous-page pull control.
    Pull {
        /// Title of the control.
        title: &'a str,
    },
    /// Activity indicator for a direction.
    Activity(Direction),
    /// Error display for a direction.
    Error {
        /// The failed direction.
        direction: Direction,
        /// The retained error.
        error: &'a E,
    },
    /// The caller's header.
    Header,
    /// One element.
    Value {
        /// Index among the values.
        index: usize,
        /// The element.
        value: &'a T,
    },
    /// Next-direction completion footer.
    Completed,
}

/// A display that shows one element.
pub trait ValueDisplay {
    /// The element type shown.
    type Value;

    /// Show `value`, or clear the display with `None`.
    fn set_value(&mut self, value: Option<Self::Value>);
}

/// A display that shows a fetch error.
pub trait ErrorDisplay {
    /// The error type shown.
    type Error;

    /// Show `error`, or clear the display with `None`.
    fn set_error(&mut self, error: Option<Self::Error>);
}

/// A pull-to-refresh display.
pub trait PullDisplay {
    /// Distance the user must pull to trigger the action. Positive.
    const REQUIRED_PULL_AMOUNT: f32;

    /// Update the distance currently pulled. Non-negative.
    fn set_current_pull_amount(&mut self, amount: f32);
}

impl<T: Clone, E: Clone> Presented<T, E> {
    /// Populate a value display for `path`. Returns `false` if `path` holds no
    /// value.
    pub fn configure_value<D>(&self, path: ItemPath, display: &mut D) -> bool
    where
        D: ValueDisplay<Value = T>,
    {
        match self.item(path) {
            Some(PresentedItem::Value { value, .. }) => {
                display.set_value(Some(value.clone()));
                true
            }
            _ => false,
        }
    }

    /// Populate an error display for `path`. Returns `false` if `path` holds no
    /// error.
    pub fn configure_error<D>(&self, path: ItemPath, display: &mut D) -> bool
    where
        D: ErrorDisplay<Error = E>,
    {
        match self.item(path) {
            Some(PresentedItem::Error { error, .. }) => {
                display.set_error(Some(error.clone()));
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageState;
    use crate::region::PullMode;

    #[derive(Default)]
    struct Cell {
        value: Option<u32>,
        error: Option<String>,
    }

    impl ValueDisplay for Cell {
        type Value = u32;
        fn set_value(&mut self, value: Option<u32>) {
            self.value = value;
        }
    }

    impl ErrorDisplay for Cell {
        type Error = String;
        fn set_error(&mut self, error: Option<String>) {
            self.error = error;
        }
    }

    fn presented(previous: PageState<String>, next: PageState<String>) -> Presented<u32, String> {
        Presented::new(
            LoaderState::new(vec![10, 20], previous, next),
            RegionLayout::new(
                PullMode::LoadPreviousPage {
                    title: "Earlier".into(),
                },
                false,
            ),
        )
    }

    #[test]
    fn next_error_region_shows_next_error() {
        let presented = presented(
            PageState::Failed("previous broke".into()),
            PageState::Failed("next broke".into()),
        );

        let item = presented.item(ItemPath::new(Region::NextError, 0));
        assert_eq!(
            item,
            Some(PresentedItem::Error {
                direction: Direction::Next,
                error: &"next broke".to_string(),
            })
        );

        let mut cell = Cell::default();
        let error = ItemPath::new(Region::PreviousError, 0);
        assert!(presented.configure_error(error, &mut cell));
        assert_eq!(cell.error.as_deref(), Some("previous broke"));
    }

    #[test]
    fn values_are_read_from_snapshot() {
        let presented = presented(PageState::HasMore, PageState::Completed);

        let mut cell = Cell::default();
        assert!(presented.configure_value(ItemPath::value(1), &mut cell));
        assert_eq!(cell.value, Some(20));

        assert!(!presented.configure_value(ItemPath::value(2), &mut cell));
        let footer = ItemPath::new(Region::NextCompleted, 0);
        assert!(!presented.configure_value(footer, &mut cell));
    }

    #[test]
    fn pull_item_carries_title() {
        let presented = presented(PageState::HasMore, PageState::HasMore);
        assert_eq!(
            presented.item(ItemPath::new(Region::PreviousPull, 0)),
            Some(PresentedItem::Pull { title: "Earlier" })
        );
    }

    #[test]
    fn empty_regions_have_no_items() {
        let presented = presented(PageState::Completed, PageState::HasMore);
        assert_eq!(presented.item(ItemPath::new(Region::PreviousPull, 0)), None);
        assert_eq!(presented.item(ItemPath::new(Region::Header, 0)), None);
        assert_eq!(
            presented.item(ItemPath::new(Region::NextActivity, 0)),
            Some(PresentedItem::Activity(Direction::Next))
        );
    }

    #[test]
    fn only_values_select() {
        let presented = presented(PageState::HasMore, PageState::HasMore);
        assert_eq!(presented.selectable_value(ItemPath::value(0)), Some(&10));
        assert_eq!(
            presented.selectable_value(ItemPath::new(Region::NextActivity, 0)),
            None
        );
    }
}
