//! Engine traits and signal types
//!
//! Recognition and synthesis are external capabilities. The traits
//! capture the surface the controller needs: open/close a capture
//! session, start/cancel an utterance. Everything asynchronous comes
//! back as an `EngineEvent` on the controller's event channel, so the
//! controller can be exercised with fake engines in tests.

use thiserror::Error;

/// Signals emitted by the speech engines
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The recognizer produced a transcript
    Transcript(String),

    /// The capture session ended, whether from silence timeout, an
    /// engine error, or an explicit close
    InputEnded,

    /// The recognizer reported an error mid-session
    InputError(String),

    /// The current utterance finished playing
    SpeechEnded,
}

/// Errors surfaced when opening a capture session
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("capture session is already open")]
    AlreadyOpen,

    #[error("microphone access denied")]
    PermissionDenied,

    #[error("engine unavailable: {0}")]
    Unavailable(String),
}

/// Continuous speech recognizer
///
/// Sessions are restart-prone: the engine may end one at any time,
/// signalled by `EngineEvent::InputEnded`. Reopening is the caller's
/// job.
pub trait SpeechInput: Send {
    /// Open a capture session. Fails if one is already open or the
    /// microphone cannot be acquired.
    fn open(&mut self) -> Result<(), EngineError>;

    /// Close the capture session. A session-end signal still follows
    /// on the event channel.
    fn close(&mut self);
}

/// One-shot speech synthesizer
pub trait SpeechOutput: Send {
    /// Start speaking `text`, displacing any utterance in flight.
    /// `EngineEvent::SpeechEnded` follows once playback completes.
    fn speak(&mut self, text: &str);

    /// Cancel the utterance in flight, if any. No end signal follows
    /// a cancelled utterance.
    fn cancel(&mut self);
}
