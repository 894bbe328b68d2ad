//! Layout pass with rounding correction and the auto-tune retry loop.
//!
//! Applying a layout can itself change the container width (a vertical
//! scrollbar appears or disappears once the content height changes), which
//! leaves the first row too wide or too narrow. The loop re-runs the pass with
//! the target height nudged by one pixel at a time inside `[-range, +range]`
//! until the rendered first row matches the client width.
//!
//! Termination: at most `max_retries` extra passes. If the mismatch persists
//! across the whole range the last layout is kept as is; it is visually off by
//! a few pixels but otherwise valid.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::layout::justified::stacked_height;
use crate::layout::LayoutCache;
use crate::models::{ImageRegistry, LayoutRow, Placement};
use crate::ui::Presenter;

/// Auto-tune state that persists across layout passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoTune {
    pub base_height: u32,
    pub offset: i32,
    pub range: i32,
    pub max_retries: u32,
}

impl AutoTune {
    pub fn new(base_height: u32, range: i32, max_retries: u32) -> Self {
        Self {
            base_height,
            offset: 0,
            range: range.max(1),
            max_retries,
        }
    }

    pub fn target_height(&self) -> u32 {
        (self.base_height as i64 + self.offset as i64).max(1) as u32
    }

    /// Moves the offset one step, wrapping from `+range` to `-range`.
    pub fn advance(&mut self) {
        self.offset += 1;
        if self.offset > self.range {
            self.offset = -self.range;
        }
    }
}

/// Result of a corrected layout request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutOutcome {
    /// Rendered widths match the container.
    Converged { passes: u32 },
    /// Retry budget exhausted; the last pass stays rendered.
    Unconverged { passes: u32 },
    /// Some images have not settled yet; nothing was rendered.
    NotSettled,
    /// Session has no container.
    Inert,
}

/// Rows and total height produced by the last rendered pass.
#[derive(Debug, Clone, Default)]
pub struct RenderedLayout {
    pub rows: Arc<Vec<LayoutRow>>,
    pub total_height: u32,
    pub container_width: u32,
    pub target_height: u32,
}

/// Turns rows into positioned boxes.
///
/// `top` accumulates row heights, `left` accumulates widths within a row; the
/// inner image loses `border_px` on every side. Offsets saturate at `u32::MAX`.
pub fn place_rows(rows: &[LayoutRow], border_px: u32) -> Vec<Placement> {
    let mut placements = Vec::with_capacity(rows.iter().map(|r| r.items.len()).sum());
    let border = border_px.saturating_mul(2);
    let mut top = 0u32;
    for row in rows {
        let mut left = 0u32;
        for item in &row.items {
            placements.push(Placement {
                id: item.id.clone(),
                row_index: row.row_index,
                top,
                left,
                width: item.width,
                height: item.height,
                inner_width: item.width.saturating_sub(border),
                inner_height: item.height.saturating_sub(border),
            });
            left = left.saturating_add(item.width);
        }
        top = top.saturating_add(row.height_px);
    }
    placements
}

/// Packs at `target_height`, re-packing once if the client width moved while
/// the layout already overflows the viewport.
fn pack_for_container<P: Presenter + ?Sized>(
    registry: &ImageRegistry,
    cache: &LayoutCache,
    presenter: &P,
    target_height: u32,
) -> RenderedLayout {
    let mut width = presenter.client_width();
    let mut rows = cache.get_or_compute(registry, width, target_height);
    let mut total_height = stacked_height(&rows);

    let current = presenter.client_width();
    if total_height >= presenter.client_height() && current != width {
        debug!(from = width, to = current, "Client width moved, re-packing");
        width = current;
        rows = cache.get_or_compute(registry, width, target_height);
        total_height = stacked_height(&rows);
    }

    RenderedLayout {
        rows,
        total_height,
        container_width: width,
        target_height,
    }
}

/// Sum of the rendered outer widths of the first row.
fn measured_first_row<P: Presenter + ?Sized>(presenter: &P, rows: &[LayoutRow]) -> Option<u32> {
    let first = rows.first()?;
    first
        .items
        .iter()
        .try_fold(0u32, |acc, item| {
            presenter
                .rendered_width(&item.id)
                .map(|w| acc.saturating_add(w))
        })
}

/// Runs layout passes until the first row matches the client width or the
/// retry budget runs out.
///
/// The caller guarantees the registry is fully settled.
pub fn apply_layout<P: Presenter + ?Sized>(
    registry: &ImageRegistry,
    cache: &LayoutCache,
    presenter: &mut P,
    tune: &mut AutoTune,
    border_px: u32,
) -> (LayoutOutcome, RenderedLayout) {
    let mut passes = 0u32;
    loop {
        passes += 1;
        let rendered = pack_for_container(registry, cache, presenter, tune.target_height());
        let placements = place_rows(&rendered.rows, border_px);
        presenter.apply_placements(&placements);
        debug!(
            rows = rendered.rows.len(),
            width = rendered.container_width,
            target = rendered.target_height,
            height = rendered.total_height,
            "Applied layout pass"
        );

        if rendered.rows.len() <= 1 {
            return (LayoutOutcome::Converged { passes }, rendered);
        }

        let client = presenter.client_width();
        let measured = measured_first_row(presenter, &rendered.rows);
        if measured == Some(client) {
            return (LayoutOutcome::Converged { passes }, rendered);
        }

        warn!(
            offset = tune.offset,
            measured = ?measured,
            client,
            "First row does not match container width"
        );
        if passes > tune.max_retries {
            warn!(passes, "Auto-tune gave up, keeping last layout");
            return (LayoutOutcome::Unconverged { passes }, rendered);
        }
        tune.advance();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImageEntry, ImageId};
    use crate::ui::{HeadlessSurface, ListenerId, ListenerKind};
    use std::cell::Cell;

    fn registry(count: usize) -> ImageRegistry {
        let entries = (0..count).map(|i| {
            let (w, h) = match i % 3 {
                0 => (1600, 900),
                1 => (1000, 1000),
                _ => (800, 1200),
            };
            ImageEntry::loaded(format!("img{i}"), format!("{i}.jpg"), w, h)
        });
        ImageRegistry::build(entries, 90).unwrap()
    }

    #[test]
    fn test_offset_wraps_within_range() {
        let mut tune = AutoTune::new(90, 2, 4);
        let mut seen = Vec::new();
        for _ in 0..6 {
            tune.advance();
            seen.push(tune.offset);
        }
        assert_eq!(seen, [1, 2, -2, -1, 0, 1]);
    }

    #[test]
    fn test_target_height_never_zero() {
        let mut tune = AutoTune::new(1, 5, 10);
        tune.offset = -5;
        assert_eq!(tune.target_height(), 1);
    }

    #[test]
    fn test_placements_accumulate_positions_and_border() {
        let reg = registry(7);
        let rows = crate::layout::JustifiedLayout::new(90).compute(reg.iter().map(|(_, r)| r), 400);
        let placements = place_rows(&rows, 2);

        let mut expected_top = 0;
        for row in &rows {
            let in_row: Vec<&Placement> = placements
                .iter()
                .filter(|p| p.row_index == row.row_index)
                .collect();
            let mut expected_left = 0;
            for p in in_row {
                assert_eq!(p.top, expected_top);
                assert_eq!(p.left, expected_left);
                assert_eq!(p.inner_width, p.width - 4);
                assert_eq!(p.inner_height, p.height - 4);
                expected_left += p.width;
            }
            expected_top += row.height_px;
        }
    }

    #[test]
    fn test_converges_without_scrollbar() {
        let reg = registry(12);
        let cache = LayoutCache::new();
        let mut surface = HeadlessSurface::new(640, 2000);
        let mut tune = AutoTune::new(90, 5, 10);

        let (outcome, rendered) = apply_layout(&reg, &cache, &mut surface, &mut tune, 0);
        assert_eq!(outcome, LayoutOutcome::Converged { passes: 1 });
        assert_eq!(tune.offset, 0);
        assert_eq!(rendered.container_width, 640);
        assert_eq!(surface.placements().len(), 12);
    }

    #[test]
    fn test_scrollbar_triggers_retry() {
        let reg = registry(30);
        let cache = LayoutCache::new();
        let mut surface = HeadlessSurface::new(640, 200).with_scrollbar(15);
        let mut tune = AutoTune::new(90, 5, 10);

        let (outcome, rendered) = apply_layout(&reg, &cache, &mut surface, &mut tune, 0);
        match outcome {
            LayoutOutcome::Converged { passes } => assert!(passes >= 2),
            other => panic!("expected convergence, got {:?}", other),
        }
        assert_eq!(tune.offset, 1);
        assert_eq!(rendered.container_width, 625);
        assert_eq!(rendered.rows[0].width(), 625);
    }

    #[test]
    fn test_persistent_mismatch_is_capped() {
        let reg = registry(30);
        let cache = LayoutCache::new();
        let mut surface = HeadlessSurface::new(640, 5000);
        surface.width_skew = 1;
        let mut tune = AutoTune::new(90, 5, 10);

        let (outcome, _) = apply_layout(&reg, &cache, &mut surface, &mut tune, 0);
        assert_eq!(outcome, LayoutOutcome::Unconverged { passes: 11 });
        assert_eq!(surface.passes(), 11);
        // ten advances from 0: 1..=5, then wrap to -5 and climb to -1
        assert_eq!(tune.offset, -1);
    }

    /// Client width drops to `narrowed_width` after the first read, as when a
    /// scrollbar appears while a pass is being computed.
    struct NarrowingSurface {
        inner: HeadlessSurface,
        reads: Cell<u32>,
        narrowed_width: u32,
    }

    impl NarrowingSurface {
        fn new(inner: HeadlessSurface, narrowed_width: u32) -> Self {
            Self {
                inner,
                reads: Cell::new(0),
                narrowed_width,
            }
        }
    }

    impl Presenter for NarrowingSurface {
        fn client_width(&self) -> u32 {
            let reads = self.reads.get();
            self.reads.set(reads + 1);
            if reads == 0 {
                self.inner.client_width()
            } else {
                self.narrowed_width
            }
        }

        fn client_height(&self) -> u32 {
            self.inner.client_height()
        }

        fn apply_placements(&mut self, placements: &[Placement]) {
            self.inner.apply_placements(placements);
        }

        fn rendered_width(&self, id: &ImageId) -> Option<u32> {
            self.inner.rendered_width(id)
        }

        fn add_listener(&mut self, kind: ListenerKind) -> ListenerId {
            self.inner.add_listener(kind)
        }

        fn remove_listener(&mut self, id: ListenerId) {
            self.inner.remove_listener(id);
        }
    }

    #[test]
    fn test_repacks_when_width_moves_on_tall_layout() {
        let reg = registry(30);
        let cache = LayoutCache::new();
        let mut surface = NarrowingSurface::new(HeadlessSurface::new(640, 200), 625);
        let mut tune = AutoTune::new(90, 5, 10);

        let (outcome, rendered) = apply_layout(&reg, &cache, &mut surface, &mut tune, 0);
        assert_eq!(outcome, LayoutOutcome::Converged { passes: 1 });
        assert_eq!(tune.offset, 0);
        assert_eq!(rendered.container_width, 625);
        assert!(rendered.rows.len() > 1);
        for row in &rendered.rows[..rendered.rows.len() - 1] {
            assert_eq!(row.width(), 625);
        }
        assert_eq!(surface.inner.passes(), 1);
    }

    #[test]
    fn test_short_layout_keeps_first_width() {
        let reg = registry(30);
        let cache = LayoutCache::new();
        let mut surface = NarrowingSurface::new(HeadlessSurface::new(640, 100_000), 625);
        let mut tune = AutoTune::new(90, 5, 10);

        // no re-pack below the client height; the mismatch goes to auto-tune
        let (outcome, rendered) = apply_layout(&reg, &cache, &mut surface, &mut tune, 0);
        assert_eq!(outcome, LayoutOutcome::Converged { passes: 2 });
        assert_eq!(tune.offset, 1);
        assert_eq!(rendered.container_width, 625);
    }

    #[test]
    fn test_sliver_images_saturate_instead_of_overflowing() {
        let dims = [(1, 3_000_000_000), (3000, 100), (1, 3_000_000_000), (3000, 100)];
        let entries = dims
            .iter()
            .enumerate()
            .map(|(i, (w, h))| ImageEntry::loaded(format!("img{i}"), format!("{i}.jpg"), *w, *h));
        let reg = ImageRegistry::build(entries, 90).unwrap();
        let cache = LayoutCache::new();
        let mut surface = HeadlessSurface::new(800, 600);
        let mut tune = AutoTune::new(90, 5, 10);

        let (outcome, rendered) = apply_layout(&reg, &cache, &mut surface, &mut tune, 2);
        assert_eq!(outcome, LayoutOutcome::Converged { passes: 1 });
        assert_eq!(rendered.rows.len(), 4);
        assert_eq!(rendered.total_height, u32::MAX);

        let placements = surface.placements();
        assert_eq!(placements.len(), 4);
        assert_eq!(placements[0].top, 0);
        assert!(placements[1..].iter().all(|p| p.top == u32::MAX));
        assert_eq!(surface.content_height(), u32::MAX);
    }

    #[test]
    fn test_single_row_skips_measurement() {
        let reg = registry(2);
        let cache = LayoutCache::new();
        let mut surface = HeadlessSurface::new(2000, 500);
        surface.width_skew = 3;
        let mut tune = AutoTune::new(90, 5, 10);

        let (outcome, rendered) = apply_layout(&reg, &cache, &mut surface, &mut tune, 0);
        assert_eq!(outcome, LayoutOutcome::Converged { passes: 1 });
        assert_eq!(rendered.rows.len(), 1);
    }
}
