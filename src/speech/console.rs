//! Console speech adapters
//!
//! Development stand-ins for a real audio stack: the input engine
//! reads transcripts as lines from stdin, the output engine prints
//! utterances and completes them immediately. Both push their signals
//! onto the shared engine event channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::engine::{EngineError, EngineEvent, SpeechInput, SpeechOutput};

/// Reads stdin lines and emits each as a transcript while a capture
/// session is open. Lines arriving with the session closed are dropped,
/// the way a closed microphone hears nothing.
pub struct ConsoleInput {
    event_tx: mpsc::UnboundedSender<EngineEvent>,
    open: Arc<AtomicBool>,
    reader_started: bool,
}

impl ConsoleInput {
    pub fn new(event_tx: mpsc::UnboundedSender<EngineEvent>) -> Self {
        Self {
            event_tx,
            open: Arc::new(AtomicBool::new(false)),
            reader_started: false,
        }
    }

    fn spawn_reader(&self) -> Result<(), EngineError> {
        let event_tx = self.event_tx.clone();
        let open = Arc::clone(&self.open);

        thread::Builder::new()
            .name("console-input".to_string())
            .spawn(move || {
                debug!("console input thread started");
                let stdin = std::io::stdin();
                let mut line = String::new();

                loop {
                    line.clear();
                    match stdin.read_line(&mut line) {
                        Ok(0) | Err(_) => break,
                        Ok(_) => {}
                    }
                    if !open.load(Ordering::SeqCst) {
                        debug!("capture closed, dropping line");
                        continue;
                    }
                    let transcript = line.trim_end_matches('\n').to_string();
                    if event_tx.send(EngineEvent::Transcript(transcript)).is_err() {
                        break;
                    }
                }

                // stdin gone: surface one final session end
                open.store(false, Ordering::SeqCst);
                let _ = event_tx.send(EngineEvent::InputEnded);
                debug!("console input thread stopped");
            })
            .map_err(|e| EngineError::Unavailable(e.to_string()))?;

        Ok(())
    }
}

impl SpeechInput for ConsoleInput {
    fn open(&mut self) -> Result<(), EngineError> {
        if self.open.swap(true, Ordering::SeqCst) {
            return Err(EngineError::AlreadyOpen);
        }
        if !self.reader_started {
            if let Err(e) = self.spawn_reader() {
                self.open.store(false, Ordering::SeqCst);
                return Err(e);
            }
            self.reader_started = true;
        }
        debug!("console capture opened");
        Ok(())
    }

    fn close(&mut self) {
        if self.open.swap(false, Ordering::SeqCst) {
            debug!("console capture closed");
            let _ = self.event_tx.send(EngineEvent::InputEnded);
        }
    }
}

/// Prints utterances and reports them complete immediately.
pub struct ConsoleOutput {
    event_tx: mpsc::UnboundedSender<EngineEvent>,
}

impl ConsoleOutput {
    pub fn new(event_tx: mpsc::UnboundedSender<EngineEvent>) -> Self {
        Self { event_tx }
    }
}

impl SpeechOutput for ConsoleOutput {
    fn speak(&mut self, text: &str) {
        info!(text, "speaking");
        let _ = self.event_tx.send(EngineEvent::SpeechEnded);
    }

    fn cancel(&mut self) {
        debug!("utterance cancelled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_twice_fails() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut input = ConsoleInput::new(tx);

        assert!(input.open().is_ok());
        assert!(matches!(input.open(), Err(EngineError::AlreadyOpen)));
    }

    #[test]
    fn test_close_signals_session_end() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut input = ConsoleInput::new(tx);

        input.open().unwrap();
        input.close();

        assert!(matches!(rx.try_recv(), Ok(EngineEvent::InputEnded)));
    }

    #[test]
    fn test_close_without_open_is_silent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut input = ConsoleInput::new(tx);

        input.close();

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_output_completes_immediately() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut output = ConsoleOutput::new(tx);

        output.speak("hello");

        assert!(matches!(rx.try_recv(), Ok(EngineEvent::SpeechEnded)));
    }
}
