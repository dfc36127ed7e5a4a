// lyrics/mod.rs - top-level lyrics module re-exporting submodules
pub mod parse;
pub mod providers;
pub mod types;

pub use parse::normalize;
pub use providers::{GeniusProvider, LyricProvider};
pub use types::LyricResult;
