//! The fixed partition of the presentation into regions.
//!
//! The presentation is laid out as eight regions in a fixed order. Each
//! region's item count is a pure function of a [`LoaderState`], the
//! previous-page [`PullMode`] and whether a header is configured. Hosts that
//! address items by section index convert through [`Region::index`] and
//! `Region::try_from(usize)`; hosts that use one flat list convert through
//! [`RegionCounts`].

use thiserror::Error;

use crate::page::{Direction, PageState};
use crate::state::LoaderState;

/// One partition of the presentation, in layout order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Region {
    /// Pull-to-refresh control for the previous page.
    PreviousPull,
    /// Activity indicator while the previous page loads.
    PreviousActivity,
    /// The previous page's error.
    PreviousError,
    /// Optional caller-supplied header.
    Header,
    /// One item per loaded element.
    Values,
    /// Activity indicator while more next-page content may load.
    NextActivity,
    /// The next page's error.
    NextError,
    /// Footer shown once the next direction is exhausted.
    NextCompleted,
}

impl Region {
    /// Number of regions.
    pub const COUNT: usize = 8;

    /// Every region, in layout order.
    pub const ALL: [Region; Region::COUNT] = [
        Region::PreviousPull,
        Region::PreviousActivity,
        Region::PreviousError,
        Region::Header,
        Region::Values,
        Region::NextActivity,
        Region::NextError,
        Region::NextCompleted,
    ];

    /// Position of this region in layout order (the host's section index).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether items in this region can be highlighted and selected.
    pub fn is_selectable(self) -> bool {
        self == Region::Values
    }

    /// The pagination direction this region reports on, if any.
    pub fn direction(self) -> Option<Direction> {
        match self {
            Region::PreviousPull | Region::PreviousActivity | Region::PreviousError => {
                Some(Direction::Previous)
            }
            Region::NextActivity | Region::NextError | Region::NextCompleted => {
                Some(Direction::Next)
            }
            Region::Header | Region::Values => None,
        }
    }
}

/// Error for a section index outside the region layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no region at section index {0}")]
pub struct InvalidRegionIndex(pub usize);

impl TryFrom<usize> for Region {
    type Error = InvalidRegionIndex;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Region::ALL
            .get(index)
            .copied()
            .ok_or(InvalidRegionIndex(index))
    }
}

/// How the previous-page pull region behaves, stripped of any replacement
/// factory.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PullMode {
    /// No pull region; previous pages never load from the interface.
    #[default]
    Disallow,
    /// Pulling loads the previous page while one may exist.
    LoadPreviousPage {
        /// Title shown by the pull control.
        title: String,
    },
    /// Pulling replaces the loader entirely. Always shown.
    Replace {
        /// Title shown by the pull control.
        title: String,
    },
}

impl PullMode {
    /// Check for [`PullMode::LoadPreviousPage`].
    pub fn is_load_previous_page(&self) -> bool {
        matches!(self, Self::LoadPreviousPage { .. })
    }

    /// Check for [`PullMode::Replace`].
    pub fn is_replace(&self) -> bool {
        matches!(self, Self::Replace { .. })
    }

    /// Title of the pull control, `None` when disallowed.
    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Disallow => None,
            Self::LoadPreviousPage { title } | Self::Replace { title } => Some(title.as_str()),
        }
    }
}

/// Layout inputs that are not part of the loader state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegionLayout {
    /// Previous-page pull behavior.
    pub pull_mode: PullMode,
    /// Whether a header was configured.
    pub header: bool,
}

impl RegionLayout {
    /// Create a layout.
    pub fn new(pull_mode: PullMode, header: bool) -> Self {
        Self { pull_mode, header }
    }

    /// Item count of `region` for `state` under this layout.
    pub fn item_count<T, E>(&self, region: Region, state: &LoaderState<T, E>) -> usize {
        region_item_count(region, state, &self.pull_mode, self.header)
    }

    /// Item counts of every region for `state` under this layout.
    pub fn counts<T, E>(&self, state: &LoaderState<T, E>) -> RegionCounts {
        RegionCounts::new(Region::ALL.map(|region| self.item_count(region, state)))
    }
}

/// Number of items `region` holds for `state`.
///
/// Every region except [`Region::Values`] yields 0 or 1.
pub fn region_item_count<T, E>(
    region: Region,
    state: &LoaderState<T, E>,
    mode: &PullMode,
    header_present: bool,
) -> usize {
    let present = match region {
        Region::PreviousPull => {
            (state.previous_page_state().is_has_more() && mode.is_load_previous_page())
                || mode.is_replace()
        }
        Region::PreviousActivity => state.previous_page_state().is_loading(),
        Region::PreviousError => state.previous_page_state().error().is_some(),
        Region::Header => header_present,
        Region::Values => return state.len(),
        Region::NextActivity => matches!(
            state.next_page_state(),
            PageState::HasMore | PageState::Loading
        ),
        Region::NextError => state.next_page_state().error().is_some(),
        Region::NextCompleted => state.next_page_state().is_completed(),
    };
    usize::from(present)
}

/// Address of one item: a region plus an index inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemPath {
    /// The region holding the item.
    pub region: Region,
    /// Index inside the region.
    pub item: usize,
}

impl ItemPath {
    /// Create a path.
    pub fn new(region: Region, item: usize) -> Self {
        Self { region, item }
    }

    /// Path of the `index`-th value.
    pub fn value(index: usize) -> Self {
        Self::new(Region::Values, index)
    }
}

/// Item counts of all regions for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionCounts([usize; Region::COUNT]);

impl RegionCounts {
    /// Wrap counts given in layout order.
    pub fn new(counts: [usize; Region::COUNT]) -> Self {
        Self(counts)
    }

    /// Count of one region.
    pub fn get(&self, region: Region) -> usize {
        self.0[region.index()]
    }

    /// Total number of items across all regions.
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    /// Flat position of `path`, or `None` if the region has no such item.
    pub fn flat_index(&self, path: ItemPath) -> Option<usize> {
        if path.item >= self.get(path.region) {
            return None;
        }
        let before: usize = self.0[..path.region.index()].iter().sum();
        Some(before + path.item)
    }

    /// Path of the item at flat position `index`.
    pub fn path_at(&self, index: usize) -> Option<ItemPath> {
        let mut remaining = index;
        for region in Region::ALL {
            let count = self.get(region);
            if remaining < count {
                return Some(ItemPath::new(region, remaining));
            }
            remaining -= count;
        }
        None
    }
}
