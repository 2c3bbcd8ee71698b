//! ArrayLoaderController - binds an array loader to a presentation host.
//!
//! # Architecture
//!
//! The controller is the caller-facing half of the binding. It owns the
//! current loader, forwards its subscription to the engine task, and turns
//! host notifications (visibility, scrolling, pulls, retries) into load
//! requests through the auto-load policy from arrayview-core.
//!
//! ```text
//! Host notifications → Controller → AutoLoadPolicy → ArrayLoader
//!                          │                             │
//!                          └── commands ──▶ Engine ◀── events
//! ```
//!
//! # Example
//!
//! ```ignore
//! use arrayview_client::{ArrayLoaderController, ControllerConfig, MockArrayLoader, MockHost};
//!
//! let loader = MockArrayLoader::<String, String>::new();
//! let config = ControllerConfig::default();
//! let controller = ArrayLoaderController::new(loader, MockHost::new(), &config)?;
//!
//! // An empty loader requests its first page on attach.
//! controller.loader().finish_next_page(Ok(Page::more(vec!["a".into()])));
//! ```

use arrayview_core::{
    on_pull_released, pull_progress, AutoLoadPolicy, Direction, ItemPath, LoadRequest, Outcome,
    Presented, PullMode, RegionLayout,
};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

use crate::config::ControllerConfig;
use crate::engine::{Command, EngineHandle};
use crate::error::ClientError;
use crate::host::PresentationHost;
use crate::loader::ArrayLoader;
use crate::mode::PreviousPageLoadingMode;

/// Keeps a presentation host in sync with an array loader.
///
/// Must be created inside a Tokio runtime: construction spawns the engine
/// task. Dropping the controller stops the task after its current mutation.
pub struct ArrayLoaderController<L: ArrayLoader> {
    loader: L,
    mode: PreviousPageLoadingMode<L>,
    policy: AutoLoadPolicy,
    required_pull_amount: f32,
    engine: EngineHandle<L::Element, L::Error>,
}

impl<L: ArrayLoader> ArrayLoaderController<L> {
    /// Bind `loader` to `host`.
    ///
    /// The host receives a full reload for the loader's current state. An
    /// empty loader with more to load requests its first page unless
    /// `autoload.load_on_attach` is off.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn new<H: PresentationHost>(
        loader: L,
        host: H,
        config: &ControllerConfig,
    ) -> Result<Self, ClientError> {
        config.validate()?;

        let layout = RegionLayout::new(PullMode::Disallow, config.layout.header);
        let engine = EngineHandle::spawn(layout, Arc::new(host), config.engine.outcome_buffer);
        let controller = Self {
            loader,
            mode: PreviousPageLoadingMode::Disallow,
            policy: config.auto_load_policy(),
            required_pull_amount: config.pull.required_amount,
            engine,
        };
        controller.attach()?;
        Ok(controller)
    }

    /// The current loader.
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Replace the loader.
    ///
    /// Events from the old loader that the engine has not yet consumed are
    /// discarded. A mutation already in flight completes first.
    pub fn set_loader(&mut self, loader: L) -> Result<(), ClientError> {
        tracing::info!("Replacing loader");
        self.loader = loader;
        self.attach()
    }

    /// The previous-page loading mode.
    pub fn previous_page_loading_mode(&self) -> &PreviousPageLoadingMode<L> {
        &self.mode
    }

    /// Change the previous-page loading mode. The pull region reloads if its
    /// visibility or title changes.
    pub fn set_previous_page_loading_mode(
        &mut self,
        mode: PreviousPageLoadingMode<L>,
    ) -> Result<(), ClientError> {
        tracing::debug!("Previous page loading mode: {:?}", mode);
        self.engine.send(Command::SetPullMode(mode.pull_mode()))?;
        self.mode = mode;
        Ok(())
    }

    /// Notify that the host's attachment or visible items may have changed.
    ///
    /// If the host is attached and events were suppressed while it was not,
    /// the host receives one full reload. `visible` then goes through the
    /// same auto-load rule as [`did_scroll`](Self::did_scroll). Returns the
    /// load request issued, if any.
    pub fn visibility_changed(
        &self,
        visible: &[ItemPath],
    ) -> Result<Option<LoadRequest>, ClientError> {
        self.engine.send(Command::Resync { force: false })?;
        Ok(self.did_scroll(visible))
    }

    /// Reload the whole presentation from the presented snapshot.
    pub fn reload(&self) -> Result<(), ClientError> {
        self.engine.send(Command::Resync { force: true })
    }

    /// Notify that the visible items changed. Returns the load request
    /// issued, if any.
    pub fn did_scroll(&self, visible: &[ItemPath]) -> Option<LoadRequest> {
        let request = self.policy.on_scroll(&self.loader.state(), visible)?;
        tracing::debug!("Scroll triggered {:?}", request);
        self.issue(request);
        Some(request)
    }

    /// Progress of a pull in progress, in `[0, 1]`.
    pub fn pull_progress(&self, amount: f32) -> f32 {
        pull_progress(amount, self.required_pull_amount)
    }

    /// Distance a pull must cover to trigger the pull action.
    pub fn required_pull_amount(&self) -> f32 {
        self.required_pull_amount
    }

    /// Notify that the user released a pull of `amount`. Returns the action
    /// taken, if any.
    ///
    /// In `Replace` mode a completed pull builds a new loader from the
    /// mode's factory and attaches it.
    pub fn did_end_pull(&mut self, amount: f32) -> Result<Option<LoadRequest>, ClientError> {
        let request = on_pull_released(
            &self.mode.pull_mode(),
            &self.loader.state(),
            amount,
            self.required_pull_amount,
        );
        match request {
            Some(LoadRequest::ReplaceLoader) => {
                if let Some(factory) = self.mode.factory().cloned() {
                    self.set_loader(factory())?;
                }
            }
            Some(request) => self.issue(request),
            None => {}
        }
        Ok(request)
    }

    /// Retry a failed direction. Returns the request issued, or `None` if
    /// the direction has not failed.
    pub fn retry(&self, direction: Direction) -> Option<LoadRequest> {
        let request = self.policy.on_retry(&self.loader.state(), direction)?;
        tracing::debug!("Retrying {} page", direction);
        self.issue(request);
        Some(request)
    }

    /// The element behind a selected item. Only value items select.
    pub fn did_select(&self, path: ItemPath) -> Option<L::Element> {
        self.engine
            .presented()
            .borrow()
            .selectable_value(path)
            .cloned()
    }

    /// Watch the presented snapshot the host should populate items from.
    pub fn presented(&self) -> watch::Receiver<Presented<L::Element, L::Error>> {
        self.engine.presented()
    }

    /// Subscribe to reconciliation outcomes, announced after each mutation
    /// completes.
    pub fn outcomes(&self) -> broadcast::Receiver<Outcome> {
        self.engine.outcomes()
    }

    /// Stop the engine, waiting for its current mutation to complete.
    pub async fn shutdown(self) {
        self.engine.shutdown().await;
    }

    fn attach(&self) -> Result<(), ClientError> {
        let events = self.loader.subscribe();
        self.engine.send(Command::Attach { events })?;

        if let Some(request) = self.policy.on_attach(&self.loader.state()) {
            tracing::debug!("Loading first page on attach");
            self.issue(request);
        }
        Ok(())
    }

    fn issue(&self, request: LoadRequest) {
        match request {
            LoadRequest::NextPage => self.loader.load_next_page(),
            LoadRequest::PreviousPage => self.loader.load_previous_page(),
            // Needs `&mut self`; handled in `did_end_pull`.
            LoadRequest::ReplaceLoader => {}
        }
    }
}
