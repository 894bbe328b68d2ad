//! The gallery aggregate and its shareable handle.
//!
//! `GallerySession` owns the registry, the last rendered layout, the auto-tune
//! state, selection and the lightbox cursor, and talks to one `Presenter`.
//! `Gallery` wraps a session for event handlers: timer callbacks capture a weak
//! reference to it instead of reaching for a global instance.

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use crate::config::GalleryConfig;
use crate::error::{GalleryError, Result};
use crate::layout::{apply_layout, AutoTune, LayoutCache, LayoutOutcome, RenderedLayout};
use crate::models::{ImageEntry, ImageId, ImageRegistry, LayoutRow, SettleOutcome};
use crate::ui::{command_for, CheckChange, Debouncer, InputEvent, Lightbox, Presenter, Selection};

pub struct GallerySession<P: Presenter> {
    config: GalleryConfig,
    presenter: Option<P>,
    registry: ImageRegistry,
    layout: RenderedLayout,
    tune: AutoTune,
    cache: LayoutCache,
    selection: Selection,
    lightbox: Lightbox,
}

impl<P: Presenter> GallerySession<P> {
    /// Attaches a gallery to a container.
    ///
    /// A missing container or an invalid image set is reported and leaves the
    /// session inert: no images, no layout, every operation a no-op.
    pub fn new(
        container_id: &str,
        container: Option<P>,
        entries: Vec<ImageEntry>,
        config: GalleryConfig,
    ) -> Self {
        match Self::try_new(container_id, container, entries, config.clone()) {
            Ok(session) => session,
            Err(err) => {
                error!(error = %err, container = container_id, "Gallery left inert");
                Self::inert(config)
            }
        }
    }

    pub fn try_new(
        container_id: &str,
        container: Option<P>,
        entries: Vec<ImageEntry>,
        config: GalleryConfig,
    ) -> Result<Self> {
        config.validate()?;
        let presenter =
            container.ok_or_else(|| GalleryError::ContainerNotFound(container_id.to_string()))?;
        let registry = ImageRegistry::build(entries, config.fallback_size_px)?;
        info!(
            container = container_id,
            images = registry.len(),
            "Attached gallery"
        );
        Ok(Self {
            presenter: Some(presenter),
            registry,
            ..Self::inert(config)
        })
    }

    fn inert(config: GalleryConfig) -> Self {
        Self {
            tune: AutoTune::new(
                config.target_row_height_px,
                config.offset_range,
                config.max_tune_retries,
            ),
            selection: Selection::new(config.selectable),
            lightbox: Lightbox::new(config.lightbox_enabled),
            presenter: None,
            registry: ImageRegistry::default(),
            layout: RenderedLayout::default(),
            cache: LayoutCache::new(),
            config,
        }
    }

    pub fn is_inert(&self) -> bool {
        self.presenter.is_none()
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    pub fn presenter(&self) -> Option<&P> {
        self.presenter.as_ref()
    }

    pub fn presenter_mut(&mut self) -> Option<&mut P> {
        self.presenter.as_mut()
    }

    pub fn registry(&self) -> &ImageRegistry {
        &self.registry
    }

    pub fn rows(&self) -> &[LayoutRow] {
        &self.layout.rows
    }

    /// Total height of the last rendered layout.
    pub fn layout_height(&self) -> u32 {
        self.layout.total_height
    }

    pub fn offset(&self) -> i32 {
        self.tune.offset
    }

    pub fn image_count(&self) -> usize {
        self.registry.len()
    }

    pub fn loaded_count(&self) -> usize {
        self.registry.loaded_count()
    }

    pub fn failed_count(&self) -> usize {
        self.registry.failed_count()
    }

    /// Every image has either loaded or failed.
    pub fn is_ready(&self) -> bool {
        self.registry.is_fully_settled()
    }

    pub fn record_settled(&mut self, id: &str, outcome: SettleOutcome) -> Result<bool> {
        if self.is_inert() {
            return Ok(false);
        }
        self.registry.record_settled(id, outcome)
    }

    /// Runs one corrected layout pass against the container.
    pub fn apply_layout(&mut self) -> LayoutOutcome {
        let Some(presenter) = self.presenter.as_mut() else {
            return LayoutOutcome::Inert;
        };
        if !self.registry.is_fully_settled() {
            warn!(
                pending = self.registry.pending_count(),
                "Layout requested before all images settled"
            );
            return LayoutOutcome::NotSettled;
        }

        let (outcome, rendered) = apply_layout(
            &self.registry,
            &self.cache,
            presenter,
            &mut self.tune,
            self.config.image_border_px,
        );
        debug!(?outcome, rows = rendered.rows.len(), "Layout finished");
        self.layout = rendered;
        outcome
    }

    // ---------------------------------------------------------------------
    // Selection
    // ---------------------------------------------------------------------

    pub fn is_selectable(&self) -> bool {
        self.selection.is_selectable()
    }

    pub fn set_modifier_source<F>(&mut self, source: F)
    where
        F: Fn() -> bool + Send + 'static,
    {
        self.selection.set_modifier_source(source);
    }

    pub fn set_selectable(&mut self, enabled: bool) {
        let changes = self.selection.set_selectable(&mut self.registry, enabled);
        self.publish_checks(&changes);
    }

    pub fn toggle(&mut self, id: &str) -> Result<Vec<CheckChange>> {
        let changes = self.selection.toggle(&mut self.registry, id)?;
        self.publish_checks(&changes);
        Ok(changes)
    }

    /// Sets one image's check mark without looking at its current state.
    pub fn set_checked(&mut self, id: &str, checked: bool) -> Result<Vec<CheckChange>> {
        let changes = self.selection.set_checked(&mut self.registry, id, checked)?;
        self.publish_checks(&changes);
        Ok(changes)
    }

    pub fn extend_shift(&mut self, from_id: &str, modifier_held: bool) -> Result<Vec<CheckChange>> {
        let changes = self
            .selection
            .extend_shift(&mut self.registry, from_id, modifier_held)?;
        self.publish_checks(&changes);
        Ok(changes)
    }

    pub fn check_all(&mut self) {
        let changes = self.selection.check_all(&mut self.registry);
        self.publish_checks(&changes);
    }

    pub fn uncheck_all(&mut self) {
        let changes = self.selection.uncheck_all(&mut self.registry);
        self.publish_checks(&changes);
    }

    pub fn checked_ids(&self) -> Vec<ImageId> {
        self.registry
            .iter()
            .filter(|(_, r)| r.checked)
            .map(|(_, r)| r.id.clone())
            .collect()
    }

    fn publish_checks(&mut self, changes: &[CheckChange]) {
        if let Some(presenter) = self.presenter.as_mut() {
            for change in changes {
                presenter.set_checked(&change.id, change.checked);
            }
        }
    }

    /// Click on an image: opens the lightbox when enabled, otherwise toggles
    /// selection (extending it while the modifier is held).
    pub fn click(&mut self, id: &str) -> Result<()> {
        if self.is_inert() {
            return Ok(());
        }
        if self.lightbox.is_enabled() {
            return self.open_lightbox(id);
        }
        if self.selection.is_selectable() {
            let changes = self.selection.toggle_with_modifier(&mut self.registry, id)?;
            self.publish_checks(&changes);
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Lightbox
    // ---------------------------------------------------------------------

    pub fn set_lightbox_enabled(&mut self, enabled: bool) {
        self.lightbox.set_enabled(enabled);
    }

    pub fn is_lightbox_open(&self) -> bool {
        self.lightbox.is_open()
    }

    pub fn lightbox_cursor(&self) -> Option<&ImageId> {
        self.lightbox
            .cursor()
            .and_then(|idx| self.registry.get(idx))
            .map(|r| &r.id)
    }

    /// Opens the lightbox on `id`. No-op while the lightbox is disabled.
    pub fn open_lightbox(&mut self, id: &str) -> Result<()> {
        let idx = self
            .registry
            .index_of(id)
            .ok_or_else(|| GalleryError::UnknownImage(id.to_string()))?;
        if !self.lightbox.is_enabled() {
            debug!(%id, "Lightbox disabled, not opening");
            return Ok(());
        }
        if let Some(presenter) = self.presenter.as_mut() {
            self.lightbox.open(&self.registry, idx, presenter);
        }
        Ok(())
    }

    pub fn close_lightbox(&mut self) {
        if let Some(presenter) = self.presenter.as_mut() {
            self.lightbox.close(presenter);
        }
    }

    pub fn lightbox_next(&mut self) -> bool {
        match self.presenter.as_mut() {
            Some(presenter) => self.lightbox.next(&self.registry, presenter),
            None => false,
        }
    }

    pub fn lightbox_prev(&mut self) -> bool {
        match self.presenter.as_mut() {
            Some(presenter) => self.lightbox.prev(&self.registry, presenter),
            None => false,
        }
    }

    pub fn lightbox_first(&mut self) -> bool {
        match self.presenter.as_mut() {
            Some(presenter) => self.lightbox.first(&self.registry, presenter),
            None => false,
        }
    }

    pub fn lightbox_last(&mut self) -> bool {
        match self.presenter.as_mut() {
            Some(presenter) => self.lightbox.last(&self.registry, presenter),
            None => false,
        }
    }

    /// Routes wheel, key and control-click input to the open lightbox.
    pub fn handle_input(&mut self, event: InputEvent) -> bool {
        let Some(command) = command_for(event) else {
            return false;
        };
        match self.presenter.as_mut() {
            Some(presenter) => self.lightbox.execute(command, &self.registry, presenter),
            None => false,
        }
    }

    // ---------------------------------------------------------------------
    // Rebuild
    // ---------------------------------------------------------------------

    /// Replaces the image set: closes the lightbox, drops the layout and
    /// builds a fresh registry. Selection state does not carry over.
    pub fn rebuild(&mut self, entries: Vec<ImageEntry>) -> Result<()> {
        let Some(presenter) = self.presenter.as_mut() else {
            return Ok(());
        };
        let registry = ImageRegistry::build(entries, self.config.fallback_size_px)?;
        self.lightbox.reset(presenter);
        self.cache.clear();
        self.layout = RenderedLayout::default();
        self.tune.offset = 0;
        self.registry = registry;
        info!(images = self.registry.len(), "Rebuilt gallery");
        Ok(())
    }
}

struct Shared<P: Presenter> {
    session: Mutex<GallerySession<P>>,
    debouncer: Mutex<Debouncer>,
}

/// Shareable handle to a session, driving debounced layout passes.
pub struct Gallery<P: Presenter> {
    shared: Arc<Shared<P>>,
}

impl<P: Presenter> Clone for Gallery<P> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<P> Gallery<P>
where
    P: Presenter + Send + 'static,
{
    /// Wraps a session; a session that is already settled gets its first
    /// layout scheduled right away.
    pub fn new(session: GallerySession<P>) -> Self {
        let delay = session.config().layout_debounce();
        let schedule = !session.is_inert() && !session.registry().is_empty() && session.is_ready();
        let gallery = Self {
            shared: Arc::new(Shared {
                session: Mutex::new(session),
                debouncer: Mutex::new(Debouncer::new(delay)),
            }),
        };
        if schedule {
            gallery.request_layout();
        }
        gallery
    }

    pub fn lock(&self) -> MutexGuard<'_, GallerySession<P>> {
        self.shared.session.lock()
    }

    /// Schedules a layout pass after the debounce delay (resize, refresh).
    ///
    /// Each call restarts the delay; only the last of a burst runs. Outside a
    /// tokio runtime the pass runs immediately.
    pub fn request_layout(&self) {
        if tokio::runtime::Handle::try_current().is_err() {
            debug!("No async runtime, laying out immediately");
            self.lock().apply_layout();
            return;
        }
        let weak: Weak<Shared<P>> = Arc::downgrade(&self.shared);
        self.shared.debouncer.lock().schedule(async move {
            if let Some(shared) = weak.upgrade() {
                let outcome = shared.session.lock().apply_layout();
                debug!(?outcome, "Debounced layout pass");
            }
        });
    }

    /// Cancels any pending pass and lays out now.
    pub fn flush_layout(&self) -> LayoutOutcome {
        self.shared.debouncer.lock().cancel();
        self.lock().apply_layout()
    }

    pub fn is_layout_pending(&self) -> bool {
        self.shared.debouncer.lock().is_pending()
    }

    /// Records one image's natural size; the last one to settle schedules
    /// the layout.
    pub fn record_settled(&self, id: &str, outcome: SettleOutcome) -> Result<bool> {
        let (changed, ready) = {
            let mut session = self.lock();
            let changed = session.record_settled(id, outcome)?;
            (changed, session.is_ready())
        };
        if changed && ready {
            debug!("All images settled");
            self.request_layout();
        }
        Ok(changed)
    }

    /// Replaces the image set and schedules a layout if it is already settled.
    pub fn rebuild(&self, entries: Vec<ImageEntry>) -> Result<()> {
        self.shared.debouncer.lock().cancel();
        let ready = {
            let mut session = self.lock();
            session.rebuild(entries)?;
            !session.registry().is_empty() && session.is_ready()
        };
        if ready {
            self.request_layout();
        }
        Ok(())
    }
}
