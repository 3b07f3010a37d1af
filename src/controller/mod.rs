//! Voice interaction controller
//!
//! Owns the listening state, arbitrates the two speech engines, and
//! dispatches recognized transcripts to the confirmation dialogue and
//! the command resolver.

mod machine;

pub use machine::{ControlEvent, Controller, ListeningState};
