//! Brand marks rendered as interactive 3D particle fields.
//!
//! A glyph is rasterized onto a small grid, each lit pixel is extruded into
//! a few depth layers of particles, and every frame the particles drift,
//! dodge the pointer and ease back. Emblems can be dragged around, spin
//! on their own and open a link when clicked.

pub mod animator;
pub mod click;
pub mod damp;
pub mod emblem;
pub mod error;
pub mod field;
pub mod glyph;
pub mod hit_test;
pub mod mondrian;
pub mod rotation;
pub mod settings;
pub mod zone;

pub use emblem::Emblem;
pub use error::{EmblemError, Result};
pub use rotation::DragArbiter;
pub use settings::{EmblemSettings, Settings};
