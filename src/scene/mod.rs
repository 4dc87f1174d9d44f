//! Scene interpretation
//!
//! Pure functions over a classified batch: a canonical summary used for
//! narration and debounce comparison, and the hazard warnings that pre-empt it.

mod summary;
mod warnings;

pub use summary::{NO_OBJECT, SceneSummary};
pub use warnings::{Warning, WarningSet};
