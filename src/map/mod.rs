mod geometry;
mod projection;
mod renderer;
mod spatial;

pub use geometry::{draw_circle, draw_line, fill_polygon};
pub use projection::{Viewport, TILE_SIZE};
pub use renderer::{MapFrame, MapLabel, MapRenderer, MARKER_SCALE};
pub use spatial::{BBox, FeatureGrid};
