//! Roll planning for a six-bar tensegrity.
//!
//! - [`find_path`]: fewest-roll face sequence between two faces (Dijkstra
//!   with uniform cost and deterministic tie-breaking).
//! - [`best_aligned_face`]: target face for a travel direction.

pub mod dijkstra;
pub mod target;

pub use dijkstra::find_path;
pub use target::best_aligned_face;
