//! Confirmation sub-dialogue
//!
//! At most one action waits for a yes/no answer at any time. Whatever
//! the user says next settles it: an affirmative executes the stored
//! action, a negative acknowledges the cancellation, anything else
//! drops the pending slot and is reinterpreted as a fresh command.

/// An action parked until the user confirms it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAction {
    pub kind: PendingKind,
    /// Payload gathered when the action was proposed
    pub labels: Vec<String>,
}

/// What the parked action will do once confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
    /// Read enumerated button labels aloud
    ReadButtons,
}

/// What became of a transcript offered to the dialogue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueOutcome {
    /// The transcript confirmed the pending action; execute it
    Confirmed(PendingAction),
    /// The transcript declined the pending action
    Declined,
    /// Nothing was pending, or the transcript was neither an
    /// affirmative nor a negative; hand it to the resolver
    PassThrough,
}

/// Single-slot holder for the action awaiting confirmation
#[derive(Debug, Default)]
pub struct Confirmation {
    pending: Option<PendingAction>,
}

impl Confirmation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park an action awaiting confirmation, replacing any earlier one.
    pub fn arm(&mut self, action: PendingAction) {
        self.pending = Some(action);
    }

    /// Drop the pending action without executing it.
    pub fn clear(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Offer a normalized transcript to the dialogue. The pending slot
    /// is emptied on every call that finds one, whatever the outcome.
    pub fn offer(&mut self, text: &str) -> DialogueOutcome {
        let Some(action) = self.pending.take() else {
            return DialogueOutcome::PassThrough;
        };

        if text.contains("yes") || text.contains("confirm") {
            DialogueOutcome::Confirmed(action)
        } else if text.contains("no") || text.contains("cancel") {
            DialogueOutcome::Declined
        } else {
            DialogueOutcome::PassThrough
        }
    }
}
