//! # arrayview-client
//!
//! Async binding between a paginated array loader and a list presentation.
//!
//! This is the library applications use to drive a list view from an
//! [`ArrayLoader`].
//!
//! ## Features
//!
//! - **Serialized reconciliation**: one engine task applies loader events in
//!   order and waits for each host mutation to complete
//! - **Loader supersession**: replacing the loader discards the old one's
//!   pending events
//! - **Auto-loading**: first page on attach, next page on scroll, previous
//!   page or loader replacement on pull
//! - **Pure core**: uses arrayview-core for side-effect-free logic
//!
//! ## Example
//!
//! ```ignore
//! use arrayview_client::{ArrayLoaderController, ControllerConfig};
//!
//! let config = ControllerConfig::from_file("arrayview.toml".as_ref())?;
//! let mut controller = ArrayLoaderController::new(loader, host, &config)?;
//!
//! // Forward host notifications
//! controller.did_scroll(&visible_paths);
//! controller.did_end_pull(pulled)?;
//!
//! // Populate items from the presented snapshot
//! let presented = controller.presented();
//! let item = presented.borrow().item(path);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod controller;
mod engine;
pub mod error;
pub mod host;
pub mod loader;
pub mod mode;

pub use arrayview_core;
pub use config::{
    AutoLoadConfig, ConfigError, ControllerConfig, EngineConfig, LayoutConfig, PullConfig,
};
pub use controller::ArrayLoaderController;
pub use error::ClientError;
pub use host::{MockHost, PresentationHost};
pub use loader::{ArrayLoader, LoaderEventSender, LoaderEvents, MockArrayLoader, Page};
pub use mode::{PreviousPageLoadingMode, ReplacementFactory};
