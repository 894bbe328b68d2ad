//! Checked/unchecked state of gallery images.
//!
//! The extend modifier (shift) makes a toggle spread backwards: every
//! contiguous predecessor in the opposite state takes the new state, stopping
//! at the first one already in it.

use tracing::debug;

use crate::error::{GalleryError, Result};
use crate::models::{ImageId, ImageRegistry};

/// One check-state change, reported so the presenter can repaint it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckChange {
    pub id: ImageId,
    pub checked: bool,
}

/// Source of the "extend selection" modifier, read at toggle time.
pub type ModifierSource = Box<dyn Fn() -> bool + Send>;

pub struct Selection {
    selectable: bool,
    modifier: Option<ModifierSource>,
}

impl std::fmt::Debug for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selection")
            .field("selectable", &self.selectable)
            .field("modifier", &self.modifier.as_ref().map(|_| "<closure>"))
            .finish()
    }
}

impl Selection {
    pub fn new(selectable: bool) -> Self {
        Self {
            selectable,
            modifier: None,
        }
    }

    pub fn is_selectable(&self) -> bool {
        self.selectable
    }

    /// Installs the callback reporting whether the extend modifier is held.
    pub fn set_modifier_source<F>(&mut self, source: F)
    where
        F: Fn() -> bool + Send + 'static,
    {
        self.modifier = Some(Box::new(source));
    }

    pub fn modifier_held(&self) -> bool {
        self.modifier.as_ref().is_some_and(|held| held())
    }

    /// Enables or disables selection; disabling clears every check mark.
    pub fn set_selectable(&mut self, registry: &mut ImageRegistry, enabled: bool) -> Vec<CheckChange> {
        self.selectable = enabled;
        if enabled {
            Vec::new()
        } else {
            self.uncheck_all(registry)
        }
    }

    /// Flips one image. No-op while selection is disabled.
    pub fn toggle(&self, registry: &mut ImageRegistry, id: &str) -> Result<Vec<CheckChange>> {
        let idx = registry
            .index_of(id)
            .ok_or_else(|| GalleryError::UnknownImage(id.to_string()))?;
        if !self.selectable {
            return Ok(Vec::new());
        }
        let Some(record) = registry.get_mut(idx) else {
            return Ok(Vec::new());
        };
        record.checked = !record.checked;
        Ok(vec![CheckChange {
            id: record.id.clone(),
            checked: record.checked,
        }])
    }

    /// Puts one image in the given state. No-op while selection is disabled
    /// or when the image is already in that state.
    pub fn set_checked(
        &self,
        registry: &mut ImageRegistry,
        id: &str,
        checked: bool,
    ) -> Result<Vec<CheckChange>> {
        let idx = registry
            .index_of(id)
            .ok_or_else(|| GalleryError::UnknownImage(id.to_string()))?;
        if !self.selectable {
            return Ok(Vec::new());
        }
        match registry.get_mut(idx) {
            Some(record) if record.checked != checked => {
                record.checked = checked;
                Ok(vec![CheckChange {
                    id: record.id.clone(),
                    checked,
                }])
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Spreads the state of `from_id` over its contiguous predecessors.
    ///
    /// Walks `prev` links and gives each predecessor in the opposite state the
    /// same state as `from_id`, stopping at the first that already has it.
    /// Does nothing unless `modifier_held`.
    pub fn extend_shift(
        &self,
        registry: &mut ImageRegistry,
        from_id: &str,
        modifier_held: bool,
    ) -> Result<Vec<CheckChange>> {
        let idx = registry
            .index_of(from_id)
            .ok_or_else(|| GalleryError::UnknownImage(from_id.to_string()))?;
        if !modifier_held || !self.selectable {
            return Ok(Vec::new());
        }

        let state = registry.get(idx).is_some_and(|r| r.checked);
        let run: Vec<usize> = registry
            .predecessors(idx)
            .take_while(|(_, record)| record.checked != state)
            .map(|(i, _)| i)
            .collect();

        let mut changes = Vec::with_capacity(run.len());
        for i in run {
            if let Some(record) = registry.get_mut(i) {
                record.checked = state;
                changes.push(CheckChange {
                    id: record.id.clone(),
                    checked: state,
                });
            }
        }
        if !changes.is_empty() {
            debug!(from = %from_id, count = changes.len(), checked = state, "Extended selection");
        }
        Ok(changes)
    }

    /// Toggle followed by a shift-extend using the installed modifier source.
    pub fn toggle_with_modifier(
        &self,
        registry: &mut ImageRegistry,
        id: &str,
    ) -> Result<Vec<CheckChange>> {
        let mut changes = self.toggle(registry, id)?;
        if !changes.is_empty() {
            changes.extend(self.extend_shift(registry, id, self.modifier_held())?);
        }
        Ok(changes)
    }

    /// Checks every image. No-op while selection is disabled.
    pub fn check_all(&self, registry: &mut ImageRegistry) -> Vec<CheckChange> {
        if !self.selectable {
            return Vec::new();
        }
        set_all(registry, true)
    }

    /// Unchecks every image, whatever the selection mode.
    pub fn uncheck_all(&self, registry: &mut ImageRegistry) -> Vec<CheckChange> {
        set_all(registry, false)
    }
}

fn set_all(registry: &mut ImageRegistry, checked: bool) -> Vec<CheckChange> {
    registry
        .records_mut()
        .map(|record| {
            record.checked = checked;
            CheckChange {
                id: record.id.clone(),
                checked,
            }
        })
        .collect()
}
