//! Presentation boundary of the gallery.
//!
//! The engine never renders anything itself. A `Presenter` receives geometry,
//! check marks and lightbox state, reports the container's client size and the
//! widths it actually rendered, and owns the real input listeners.

use std::collections::HashMap;

use crate::models::{ImageId, Placement};

/// Input listeners the lightbox registers while it is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Wheel,
    Keyboard,
}

/// Handle returned by a listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

pub trait Presenter {
    /// Current inner width of the gallery container, scrollbar excluded.
    fn client_width(&self) -> u32;

    /// Current visible height of the gallery container.
    fn client_height(&self) -> u32;

    /// Applies one full layout pass; replaces any previous geometry.
    fn apply_placements(&mut self, placements: &[Placement]);

    /// Width actually rendered for an image's outer box.
    fn rendered_width(&self, id: &ImageId) -> Option<u32>;

    fn set_checked(&mut self, _id: &ImageId, _checked: bool) {}

    /// Shows the lightbox on the given asset (also used when navigating).
    fn show_lightbox(&mut self, _source_path: &str) {}

    fn hide_lightbox(&mut self) {}

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId;

    fn remove_listener(&mut self, id: ListenerId);
}

/// In-memory presenter with an optional vertical scrollbar.
///
/// The scrollbar appears when the applied layout is taller than the viewport
/// and eats `scrollbar_width` pixels of client width, which is exactly the
/// situation the auto-tune loop exists for.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    pub outer_width: u32,
    pub viewport_height: u32,
    pub scrollbar_width: u32,
    /// Added to every rendered width; models a renderer that never agrees.
    pub width_skew: i32,
    placements: Vec<Placement>,
    rendered: HashMap<ImageId, u32>,
    checked: HashMap<ImageId, bool>,
    lightbox: Option<String>,
    listeners: HashMap<ListenerId, ListenerKind>,
    next_listener: u64,
    passes: usize,
}

impl HeadlessSurface {
    pub fn new(outer_width: u32, viewport_height: u32) -> Self {
        Self {
            outer_width,
            viewport_height,
            scrollbar_width: 0,
            width_skew: 0,
            placements: Vec::new(),
            rendered: HashMap::new(),
            checked: HashMap::new(),
            lightbox: None,
            listeners: HashMap::new(),
            next_listener: 1,
            passes: 0,
        }
    }

    pub fn with_scrollbar(mut self, width: u32) -> Self {
        self.scrollbar_width = width;
        self
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn content_height(&self) -> u32 {
        self.placements
            .iter()
            .map(|p| p.top.saturating_add(p.height))
            .max()
            .unwrap_or(0)
    }

    pub fn scrollbar_visible(&self) -> bool {
        self.content_height() > self.viewport_height
    }

    pub fn is_checked(&self, id: &str) -> bool {
        self.checked.get(id).copied().unwrap_or(false)
    }

    pub fn lightbox_source(&self) -> Option<&str> {
        self.lightbox.as_deref()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Number of layout passes applied so far.
    pub fn passes(&self) -> usize {
        self.passes
    }

    pub fn resize(&mut self, outer_width: u32, viewport_height: u32) {
        self.outer_width = outer_width;
        self.viewport_height = viewport_height;
    }
}

impl Presenter for HeadlessSurface {
    fn client_width(&self) -> u32 {
        if self.scrollbar_visible() {
            self.outer_width.saturating_sub(self.scrollbar_width)
        } else {
            self.outer_width
        }
    }

    fn client_height(&self) -> u32 {
        self.viewport_height
    }

    fn apply_placements(&mut self, placements: &[Placement]) {
        self.passes += 1;
        self.placements = placements.to_vec();
        self.rendered = placements
            .iter()
            .map(|p| {
                let width = (p.width as i64 + self.width_skew as i64).clamp(0, u32::MAX as i64) as u32;
                (p.id.clone(), width)
            })
            .collect();
    }

    fn rendered_width(&self, id: &ImageId) -> Option<u32> {
        self.rendered.get(id).copied()
    }

    fn set_checked(&mut self, id: &ImageId, checked: bool) {
        self.checked.insert(id.clone(), checked);
    }

    fn show_lightbox(&mut self, source_path: &str) {
        self.lightbox = Some(source_path.to_string());
    }

    fn hide_lightbox(&mut self) {
        self.lightbox = None;
    }

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.insert(id, kind);
        id
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(id: &str, top: u32, height: u32, width: u32) -> Placement {
        Placement {
            id: ImageId::new(id),
            row_index: 0,
            top,
            left: 0,
            width,
            height,
            inner_width: width,
            inner_height: height,
        }
    }

    #[test]
    fn test_scrollbar_narrows_client_width() {
        let mut surface = HeadlessSurface::new(500, 100).with_scrollbar(15);
        assert_eq!(surface.client_width(), 500);
        surface.apply_placements(&[placement("a", 0, 90, 500), placement("b", 90, 90, 500)]);
        assert!(surface.scrollbar_visible());
        assert_eq!(surface.client_width(), 485);
    }

    #[test]
    fn test_skew_applies_to_rendered_width() {
        let mut surface = HeadlessSurface::new(500, 100);
        surface.width_skew = -1;
        surface.apply_placements(&[placement("a", 0, 90, 200)]);
        assert_eq!(surface.rendered_width(&ImageId::new("a")), Some(199));
        assert_eq!(surface.rendered_width(&ImageId::new("zz")), None);
    }

    #[test]
    fn test_listener_bookkeeping() {
        let mut surface = HeadlessSurface::new(500, 100);
        let wheel = surface.add_listener(ListenerKind::Wheel);
        let keys = surface.add_listener(ListenerKind::Keyboard);
        assert_ne!(wheel, keys);
        assert_eq!(surface.listener_count(), 2);
        surface.remove_listener(wheel);
        surface.remove_listener(wheel);
        assert_eq!(surface.listener_count(), 1);
    }
}
