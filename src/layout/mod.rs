pub mod corrector;
pub mod justified;
pub mod layout_cache;

pub use corrector::{apply_layout, place_rows, AutoTune, LayoutOutcome, RenderedLayout};
pub use justified::JustifiedLayout;
pub use layout_cache::LayoutCache;
