//! Geometry kernel: stroke smoothing, path descriptors and hit testing.
//!
//! All functions are pure and never fail; degenerate input yields empty output.

mod hit;
mod outline;
mod path;

pub use hit::{point_in_polygon, polygon_bounds};
pub use outline::{Easing, StrokeOptions, smooth};
pub use path::{parse_path, to_path_string};
