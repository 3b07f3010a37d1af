//! Phrase table and action resolution
//!
//! Resolution is first-match over an ordered table of substring
//! predicates. The order is a contract: phrases can overlap, and the
//! earliest satisfied entry wins.

/// How far one scroll command moves the viewport, in pixels.
const SCROLL_STEP: i32 = 500;

/// Spoken in response to a help request.
pub const HELP_TEXT: &str = "You can say: scroll down, scroll up, go back, go forward, \
    open first link, read page, stop reading, list buttons, or help.";

/// A page-control action resolved from a transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Scroll the viewport by a pixel delta
    ScrollBy { dx: i32, dy: i32 },
    /// Go one step back in history
    NavigateBack,
    /// Go one step forward in history
    NavigateForward,
    /// Open the first link in the content scope
    OpenFirstLink,
    /// Read the main content region aloud
    ReadMainContent,
    /// Cancel the utterance in flight
    CancelSpeech,
    /// Enumerate button labels, asking before reading them
    EnumerateButtons,
    /// Speak the list of recognized phrases
    SpeakHelp,
}

/// Trigger phrases in priority order. First match wins, even when a
/// later entry would also match.
const COMMAND_TABLE: &[(&[&str], Action)] = &[
    (&["scroll down"], Action::ScrollBy { dx: 0, dy: SCROLL_STEP }),
    (&["scroll up"], Action::ScrollBy { dx: 0, dy: -SCROLL_STEP }),
    (&["go back"], Action::NavigateBack),
    (&["go forward"], Action::NavigateForward),
    (&["open first article", "open first link"], Action::OpenFirstLink),
    (&["read this section aloud", "read page"], Action::ReadMainContent),
    (&["stop reading"], Action::CancelSpeech),
    (&["read buttons", "list buttons"], Action::EnumerateButtons),
    (&["help", "what can i say", "show commands"], Action::SpeakHelp),
];

/// Resolve a normalized (lower-cased, trimmed) transcript to at most
/// one action. `None` means the transcript is not a command.
pub fn resolve(text: &str) -> Option<Action> {
    let text = text.trim();
    for (phrases, action) in COMMAND_TABLE {
        if phrases.iter().any(|phrase| text.contains(phrase)) {
            return Some(action.clone());
        }
    }
    None
}
