pub mod image_record;
pub mod registry;
pub mod row_model;

pub use image_record::*;
pub use registry::*;
pub use row_model::*;
