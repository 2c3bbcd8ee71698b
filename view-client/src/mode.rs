//! Previous-page loading modes.

use arrayview_core::PullMode;
use std::fmt;
use std::sync::Arc;

/// Builds the loader that replaces the current one on a completed pull.
pub type ReplacementFactory<L> = Arc<dyn Fn() -> L + Send + Sync>;

/// How the previous-page pull control behaves.
pub enum PreviousPageLoadingMode<L> {
    /// No pull control.
    Disallow,
    /// A completed pull loads the previous page. The control is shown only
    /// while the previous page is `HasMore`.
    LoadPreviousPage {
        /// Title of the pull control.
        title: String,
    },
    /// A completed pull replaces the loader with a freshly built one. The
    /// control is always shown.
    Replace {
        /// Title of the pull control.
        title: String,
        /// Builds the replacement loader.
        factory: ReplacementFactory<L>,
    },
}

impl<L> PreviousPageLoadingMode<L> {
    /// A `LoadPreviousPage` mode with the given title.
    pub fn load_previous_page(title: impl Into<String>) -> Self {
        Self::LoadPreviousPage {
            title: title.into(),
        }
    }

    /// A `Replace` mode with the given title and factory.
    pub fn replace<F>(title: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> L + Send + Sync + 'static,
    {
        Self::Replace {
            title: title.into(),
            factory: Arc::new(factory),
        }
    }

    /// The layout-level pull mode, without the factory.
    pub fn pull_mode(&self) -> PullMode {
        match self {
            Self::Disallow => PullMode::Disallow,
            Self::LoadPreviousPage { title } => PullMode::LoadPreviousPage {
                title: title.clone(),
            },
            Self::Replace { title, .. } => PullMode::Replace {
                title: title.clone(),
            },
        }
    }

    /// The replacement factory, if this is a `Replace` mode.
    pub fn factory(&self) -> Option<&ReplacementFactory<L>> {
        match self {
            Self::Replace { factory, .. } => Some(factory),
            _ => None,
        }
    }
}

impl<L> Default for PreviousPageLoadingMode<L> {
    fn default() -> Self {
        Self::Disallow
    }
}

impl<L> Clone for PreviousPageLoadingMode<L> {
    fn clone(&self) -> Self {
        match self {
            Self::Disallow => Self::Disallow,
            Self::LoadPreviousPage { title } => Self::LoadPreviousPage {
                title: title.clone(),
            },
            Self::Replace { title, factory } => Self::Replace {
                title: title.clone(),
                factory: Arc::clone(factory),
            },
        }
    }
}

impl<L> fmt::Debug for PreviousPageLoadingMode<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disallow => f.write_str("Disallow"),
            Self::LoadPreviousPage { title } => f
                .debug_struct("LoadPreviousPage")
                .field("title", title)
                .finish(),
            Self::Replace { title, .. } => f
                .debug_struct("Replace")
                .field("title", title)
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pull_mode_drops_factory() {
        let mode = PreviousPageLoadingMode::replace("Refresh", || 7u8);
        assert_eq!(
            mode.pull_mode(),
            PullMode::Replace {
                title: "Refresh".into()
            }
        );
        let factory = mode.factory().unwrap();
        assert_eq!(factory(), 7);
    }

    #[test]
    fn default_disallows() {
        let mode = PreviousPageLoadingMode::<u8>::default();
        assert_eq!(mode.pull_mode(), PullMode::Disallow);
        assert!(mode.factory().is_none());
        assert_eq!(format!("{mode:?}"), "Disallow");
    }

    #[test]
    fn default_places_no_bound_on_loader() {
        // `File` has no `Default`
        let mode = PreviousPageLoadingMode::<std::fs::File>::default();
        assert!(matches!(mode, PreviousPageLoadingMode::Disallow));
    }

    #[test]
    fn debug_hides_factory() {
        let mode = PreviousPageLoadingMode::replace("Refresh", || 1u8);
        assert_eq!(
            format!("{:?}", mode.clone()),
            "Replace { title: \"Refresh\", .. }"
        );

        let load = PreviousPageLoadingMode::<u8>::load_previous_page("Earlier");
        assert_eq!(
            load.pull_mode(),
            PullMode::LoadPreviousPage {
                title: "Earlier".into()
            }
        );
    }
}
