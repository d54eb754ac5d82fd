//! **cycling_mazes** generates perfect mazes one step at a time with a randomized depth first
//! search, and renders the search as a colour cycling animation or still image.
//!
//! The engine (`grid` and `generators`) knows nothing about pixels: it reports each carve or
//! backtrack as display grid coordinates. `colours` and `renderers` turn those reports into
//! images.

// error_chain! expands deeply.
#![recursion_limit = "1024"]

pub mod cells;
pub mod colours;
pub mod errors;
pub mod generators;
pub mod grid;
pub mod renderers;
pub mod units;
