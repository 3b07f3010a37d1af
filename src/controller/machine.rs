//! Controller state machine
//!
//! Two primary states, Inactive and Active, plus sub-status for the
//! capture session handle and the utterance in flight. Engine signals
//! and UI requests funnel through one event channel, so every mutable
//! field has a single owner and the handlers can be exercised with
//! fake engines.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::commands::{self, Action};
use crate::dialogue::{Confirmation, DialogueOutcome, PendingAction, PendingKind};
use crate::events::RelayEvent;
use crate::ipc::{ControllerStatus, Request, Response};
use crate::page::PageActions;
use crate::speech::{EngineEvent, SpeechInput, SpeechOutput};

/// Separator inserted between button labels when reading them aloud.
const PAUSE_MARKER: &str = ", ";

const ACTIVATED_PROMPT: &str = "Voice control activated.";
const DEACTIVATED_PROMPT: &str = "Voice control deactivated.";
const CANCELLED_PROMPT: &str = "Okay, cancelled.";
const NO_BUTTONS_PROMPT: &str = "No buttons found on this page.";
const NO_LINK_PROMPT: &str = "No link found on this page.";
const NOTHING_TO_READ_PROMPT: &str = "There is no readable content on this page.";

/// Whether the agent is trying to hear commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListeningState {
    /// Not listening, capture closed
    Inactive,
    /// Listening; capture is kept open except while speaking
    Active,
}

impl Default for ListeningState {
    fn default() -> Self {
        Self::Inactive
    }
}

impl std::fmt::Display for ListeningState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListeningState::Inactive => write!(f, "inactive"),
            ListeningState::Active => write!(f, "active"),
        }
    }
}

/// Everything the controller reacts to, funnelled into one channel
#[derive(Debug)]
pub enum ControlEvent {
    /// A speech engine signal
    Engine(EngineEvent),

    /// A request from the UI surface; the acknowledgement goes back
    /// over the oneshot channel
    Request {
        request: Request,
        reply: oneshot::Sender<Response>,
    },
}

/// The orchestrator: listening state, engine arbitration, command log,
/// and the confirmation dialogue
pub struct Controller<I, O, P> {
    listening: ListeningState,
    /// Whether an input capture session handle is currently open
    capture_open: bool,
    /// Whether an utterance is in flight
    speaking: bool,
    input: I,
    output: O,
    page: P,
    dialogue: Confirmation,
    /// Transcripts in the order they were heard; append-only
    log: Vec<String>,
    relay_tx: broadcast::Sender<RelayEvent>,
    started_at: Instant,
}

impl<I, O, P> Controller<I, O, P>
where
    I: SpeechInput,
    O: SpeechOutput,
    P: PageActions,
{
    pub fn new(input: I, output: O, page: P, relay_tx: broadcast::Sender<RelayEvent>) -> Self {
        Self {
            listening: ListeningState::Inactive,
            capture_open: false,
            speaking: false,
            input,
            output,
            page,
            dialogue: Confirmation::new(),
            log: Vec::new(),
            relay_tx,
            started_at: Instant::now(),
        }
    }

    pub fn listening(&self) -> ListeningState {
        self.listening
    }

    /// Run until the event channel closes.
    pub async fn run(&mut self, mut event_rx: mpsc::UnboundedReceiver<ControlEvent>) {
        info!("controller started, listening inactive");

        while let Some(event) = event_rx.recv().await {
            match event {
                ControlEvent::Engine(signal) => self.handle_engine(signal),
                ControlEvent::Request { request, reply } => {
                    let response = self.handle_request(request);
                    if reply.send(response).is_err() {
                        debug!("requester went away before the reply");
                    }
                }
            }
        }

        info!("controller stopped");
    }

    /// Apply a UI request, returning its acknowledgement.
    pub fn handle_request(&mut self, request: Request) -> Response {
        match request {
            Request::StartListening => {
                self.activate();
                Response::Ack {
                    listening: self.listening,
                }
            }
            Request::StopListening => {
                self.deactivate();
                Response::Ack {
                    listening: self.listening,
                }
            }
            Request::ToggleListening => {
                self.toggle();
                Response::Ack {
                    listening: self.listening,
                }
            }
            Request::GetStatus => Response::Status(self.status()),
            Request::GetLog => Response::Log {
                entries: self.log.clone(),
            },
            Request::Ping => Response::Pong,
            Request::Subscribe => Response::Subscribed,
        }
    }

    /// Apply an engine signal.
    pub fn handle_engine(&mut self, signal: EngineEvent) {
        match signal {
            EngineEvent::Transcript(raw) => self.on_transcript(&raw),
            EngineEvent::InputEnded => self.on_input_ended(),
            EngineEvent::InputError(reason) => {
                // Recovery is driven by the end signal that follows.
                warn!(%reason, "recognizer error");
            }
            EngineEvent::SpeechEnded => self.on_speech_ended(),
        }
    }

    fn activate(&mut self) {
        if self.listening == ListeningState::Active {
            debug!("already listening");
            return;
        }
        self.listening = ListeningState::Active;
        info!("listening activated");

        self.open_capture();
        self.speak(ACTIVATED_PROMPT);
        self.notify_status();
    }

    fn deactivate(&mut self) {
        if self.listening == ListeningState::Inactive {
            debug!("already inactive");
            return;
        }
        self.listening = ListeningState::Inactive;
        info!("listening deactivated");

        self.close_capture();
        self.stop_speaking();
        self.dialogue.clear();
        self.speak(DEACTIVATED_PROMPT);
        self.notify_status();
    }

    fn toggle(&mut self) {
        match self.listening {
            ListeningState::Inactive => self.activate(),
            ListeningState::Active => self.deactivate(),
        }
    }

    /// Capture session ended. While listening this immediately attempts
    /// exactly one reopen, which is what keeps recognition continuous
    /// across engine-imposed session limits. While speaking the reopen
    /// is deferred to the utterance-end signal.
    fn on_input_ended(&mut self) {
        self.capture_open = false;

        if self.listening != ListeningState::Active {
            debug!("capture ended while inactive");
            return;
        }
        if self.speaking {
            debug!("capture ended during speech, reopen deferred");
            return;
        }
        debug!("capture ended, reopening");
        self.open_capture();
    }

    fn on_speech_ended(&mut self) {
        self.speaking = false;
        if self.listening == ListeningState::Active && !self.capture_open {
            self.open_capture();
        }
    }

    fn on_transcript(&mut self, raw: &str) {
        let transcript = raw.trim().to_lowercase();
        info!(%transcript, "heard");

        self.log.push(transcript.clone());
        self.notify(RelayEvent::LogEntry {
            transcript: transcript.clone(),
        });

        match self.dialogue.offer(&transcript) {
            DialogueOutcome::Confirmed(pending) => self.execute_pending(pending),
            DialogueOutcome::Declined => self.speak(CANCELLED_PROMPT),
            DialogueOutcome::PassThrough => match commands::resolve(&transcript) {
                Some(action) => self.execute(action),
                None => debug!("no command matched"),
            },
        }
    }

    fn execute(&mut self, action: Action) {
        debug!(?action, "executing");
        match action {
            Action::ScrollBy { dx, dy } => self.page.scroll_by(dx, dy),
            Action::NavigateBack => self.page.navigate_back(),
            Action::NavigateForward => self.page.navigate_forward(),
            Action::OpenFirstLink => match self.page.open_first_link() {
                Some(target) => info!(%target, "opened first link"),
                None => self.speak(NO_LINK_PROMPT),
            },
            Action::ReadMainContent => match self.page.main_content() {
                Some(text) => self.speak(&text),
                None => self.speak(NOTHING_TO_READ_PROMPT),
            },
            Action::CancelSpeech => self.stop_speaking(),
            Action::EnumerateButtons => self.enumerate_buttons(),
            Action::SpeakHelp => self.speak(commands::HELP_TEXT),
        }
    }

    /// Propose reading the button labels instead of launching straight
    /// into a possibly long list.
    fn enumerate_buttons(&mut self) {
        let labels = self.page.button_labels();
        if labels.is_empty() {
            self.speak(NO_BUTTONS_PROMPT);
            return;
        }

        let prompt = if labels.len() == 1 {
            "Found 1 button. Say yes to hear it, or no to cancel.".to_string()
        } else {
            format!(
                "Found {} buttons. Say yes to hear them, or no to cancel.",
                labels.len()
            )
        };
        self.dialogue.arm(PendingAction {
            kind: PendingKind::ReadButtons,
            labels,
        });
        self.speak(&prompt);
    }

    fn execute_pending(&mut self, pending: PendingAction) {
        match pending.kind {
            PendingKind::ReadButtons => {
                let spoken = pending.labels.join(PAUSE_MARKER);
                self.speak(&spoken);
            }
        }
    }

    /// Open a capture session; failures are logged and swallowed so
    /// the next session-end signal can retry.
    fn open_capture(&mut self) {
        match self.input.open() {
            Ok(()) => {
                self.capture_open = true;
                debug!("capture session open");
            }
            Err(e) => {
                warn!(error = %e, "could not open capture session");
            }
        }
    }

    fn close_capture(&mut self) {
        if self.capture_open {
            self.input.close();
            self.capture_open = false;
        }
    }

    /// Speak, closing the capture session first so the microphone does
    /// not hear the synthesized voice. A new utterance displaces the
    /// one in flight.
    fn speak(&mut self, text: &str) {
        self.close_capture();
        self.output.speak(text);
        self.speaking = true;
    }

    /// Cancel the utterance in flight and resume capture if still
    /// listening. Cancelled utterances emit no end signal, so capture
    /// is resumed here.
    fn stop_speaking(&mut self) {
        if self.speaking {
            self.output.cancel();
            self.speaking = false;
        }
        if self.listening == ListeningState::Active && !self.capture_open {
            self.open_capture();
        }
    }

    fn status(&self) -> ControllerStatus {
        ControllerStatus {
            version: env!("CARGO_PKG_VERSION").to_string(),
            listening: self.listening,
            log_entries: self.log.len(),
            uptime_secs: self.started_at.elapsed().as_secs(),
        }
    }

    fn notify_status(&self) {
        self.notify(RelayEvent::StatusChanged {
            listening: self.listening,
        });
    }

    /// A send error only means no client is currently subscribed.
    fn notify(&self, event: RelayEvent) {
        let _ = self.relay_tx.send(event);
    }
}
