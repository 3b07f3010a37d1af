//! Command resolution
//!
//! Maps recognized transcripts onto page-control actions.

mod resolver;

pub use resolver::{resolve, Action, HELP_TEXT};
