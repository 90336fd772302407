//! Ruimtelijke basistypes: vectoren, transformaties en bounding boxes.

mod core;

pub use core::{BBox, Transform, Vec3};
