//! Utility modules shared across pipeline stages.

pub mod path;
pub mod plural;

pub use plural::plural_count;
