//! Shape animation: rotation clock, trailed shapes and the surface that
//! drives them once per frame.

pub mod clock;
pub mod shape;
pub mod surface;
pub mod theme;

pub use shape::{Point, Primitive, ShapeFrame};
pub use surface::{RenderedFrame, VisualizationState, VisualizationSurface, MAX_SIZE_SCALE};
pub use theme::{ColorTheme, Rgb};
