//! A-B-C formation detection
//!
//! The scanner searches the compressed series for the three-point zig-zag
//! pattern; the level book holds the resulting pending levels across bars and
//! drops the ones later price action invalidates.

pub mod levels;
pub mod scanner;

pub use levels::LevelBook;
pub use scanner::{scan, FormationParams};
