//! Shared types for the pivot engine
//! 
//! All types are exported to TypeScript via tsify.

pub mod messages;
pub mod data;
pub mod pivot;
pub mod chart;
pub mod format;

pub use messages::*;
pub use data::*;
pub use pivot::*;
pub use chart::*;
pub use format::*;
