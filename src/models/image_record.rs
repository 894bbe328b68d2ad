use std::borrow::Borrow;
use std::fmt;

/// Stable key of an image for the lifetime of a gallery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(String);

impl ImageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ImageId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ImageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Natural pixel size of an image asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn square(edge: u32) -> Self {
        Self::new(edge, edge)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// How an image's natural size became known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    Loaded(Dimensions),
    Failed,
}

/// Input row for building a registry: one image as found in the container.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageEntry {
    pub id: ImageId,
    pub source_path: String,
    pub natural: Dimensions,
    pub loaded: bool,
}

impl ImageEntry {
    /// An entry whose asset has not finished loading yet.
    pub fn pending(id: impl Into<ImageId>, source_path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_path: source_path.into(),
            natural: Dimensions::default(),
            loaded: false,
        }
    }

    /// An entry whose natural size is already known.
    pub fn loaded(
        id: impl Into<ImageId>,
        source_path: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            id: id.into(),
            source_path: source_path.into(),
            natural: Dimensions::new(width, height),
            loaded: true,
        }
    }
}

/// One gallery image: immutable natural properties plus layout/selection state.
///
/// `prev` and `next` are arena indices into the owning registry.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub id: ImageId,
    pub source_path: String,
    natural: Dimensions,
    ratio: f64,
    pub loaded: bool,
    pub failed: bool,
    pub checked: bool,
    pub(crate) prev: Option<usize>,
    pub(crate) next: Option<usize>,
}

impl ImageRecord {
    pub(crate) fn from_entry(entry: ImageEntry, fallback_edge: u32) -> Self {
        let mut record = Self {
            id: entry.id,
            source_path: entry.source_path,
            natural: Dimensions::default(),
            ratio: 1.0,
            loaded: entry.loaded,
            failed: false,
            checked: false,
            prev: None,
            next: None,
        };
        record.set_dimensions(entry.natural, fallback_edge);
        record
    }

    /// Stores natural dimensions, substituting a square when either side is zero.
    pub fn set_dimensions(&mut self, dims: Dimensions, fallback_edge: u32) {
        self.natural = if dims.is_empty() {
            Dimensions::square(fallback_edge.max(1))
        } else {
            dims
        };
        self.ratio = self.natural.height as f64 / self.natural.width as f64;
    }

    pub fn natural(&self) -> Dimensions {
        self.natural
    }

    /// `height / width`; always finite and positive.
    pub fn aspect_ratio(&self) -> f64 {
        self.ratio
    }

    pub fn prev_index(&self) -> Option<usize> {
        self.prev
    }

    pub fn next_index(&self) -> Option<usize> {
        self.next
    }
}
