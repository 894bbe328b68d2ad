//! Lightbox navigator: a cursor over the registry's linked sequence.
//!
//! The cursor is an arena index, not ownership. While open, the navigator
//! holds the wheel and keyboard listener registrations and hands them back on
//! close, so repeated open/close cycles never accumulate listeners.

use tracing::{debug, trace};

use crate::models::ImageRegistry;
use crate::ui::keybindings::NavCommand;
use crate::ui::presenter::{ListenerId, ListenerKind, Presenter};

#[derive(Debug, Default)]
pub struct Lightbox {
    enabled: bool,
    cursor: Option<usize>,
    listeners: Vec<ListenerId>,
}

impl Lightbox {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            cursor: None,
            listeners: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_open(&self) -> bool {
        !self.listeners.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Points the cursor at `idx`, shows it, and registers input listeners.
    ///
    /// Opening an already open lightbox only moves the cursor.
    pub fn open<P: Presenter + ?Sized>(
        &mut self,
        registry: &ImageRegistry,
        idx: usize,
        presenter: &mut P,
    ) -> bool {
        let Some(record) = registry.get(idx) else {
            return false;
        };
        self.cursor = Some(idx);
        presenter.show_lightbox(&record.source_path);
        if self.listeners.is_empty() {
            self.listeners.push(presenter.add_listener(ListenerKind::Wheel));
            self.listeners.push(presenter.add_listener(ListenerKind::Keyboard));
        }
        debug!(id = %record.id, "Opened lightbox");
        true
    }

    /// Hides the lightbox and deregisters its listeners. Safe to call twice.
    pub fn close<P: Presenter + ?Sized>(&mut self, presenter: &mut P) {
        if self.listeners.is_empty() {
            return;
        }
        for id in self.listeners.drain(..) {
            presenter.remove_listener(id);
        }
        presenter.hide_lightbox();
        debug!("Closed lightbox");
    }

    pub fn next<P: Presenter + ?Sized>(&mut self, registry: &ImageRegistry, presenter: &mut P) -> bool {
        let target = self.cursor.and_then(|idx| registry.next_of(idx));
        self.move_to(registry, target, presenter)
    }

    pub fn prev<P: Presenter + ?Sized>(&mut self, registry: &ImageRegistry, presenter: &mut P) -> bool {
        let target = self.cursor.and_then(|idx| registry.prev_of(idx));
        self.move_to(registry, target, presenter)
    }

    pub fn first<P: Presenter + ?Sized>(&mut self, registry: &ImageRegistry, presenter: &mut P) -> bool {
        self.move_to(registry, registry.first(), presenter)
    }

    pub fn last<P: Presenter + ?Sized>(&mut self, registry: &ImageRegistry, presenter: &mut P) -> bool {
        self.move_to(registry, registry.last(), presenter)
    }

    /// Runs a command; navigation is ignored while closed.
    pub fn execute<P: Presenter + ?Sized>(
        &mut self,
        command: NavCommand,
        registry: &ImageRegistry,
        presenter: &mut P,
    ) -> bool {
        if !self.is_open() {
            trace!(?command, "Lightbox closed, ignoring command");
            return false;
        }
        match command {
            NavCommand::First => self.first(registry, presenter),
            NavCommand::Prev => self.prev(registry, presenter),
            NavCommand::Next => self.next(registry, presenter),
            NavCommand::Last => self.last(registry, presenter),
            NavCommand::Close => {
                self.close(presenter);
                true
            }
        }
    }

    /// Forgets the cursor, e.g. when the registry is rebuilt.
    pub fn reset<P: Presenter + ?Sized>(&mut self, presenter: &mut P) {
        self.close(presenter);
        self.cursor = None;
    }

    fn move_to<P: Presenter + ?Sized>(
        &mut self,
        registry: &ImageRegistry,
        target: Option<usize>,
        presenter: &mut P,
    ) -> bool {
        if !self.is_open() {
            return false;
        }
        let Some(idx) = target else {
            return false;
        };
        if self.cursor == Some(idx) {
            return false;
        }
        let Some(record) = registry.get(idx) else {
            return false;
        };
        self.cursor = Some(idx);
        presenter.show_lightbox(&record.source_path);
        true
    }
}
