//! Speech engine seams
//!
//! The controller drives two engines through narrow traits: a
//! continuous recognizer and a one-shot synthesizer. Engine completion
//! and failure signals come back asynchronously over an event channel.

mod console;
mod engine;

pub use console::{ConsoleInput, ConsoleOutput};
pub use engine::{EngineError, EngineEvent, SpeechInput, SpeechOutput};
