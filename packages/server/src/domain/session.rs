//! Handshake state machine of a single connection.
//!
//! ```text
//! Connecting -> Authenticating -> Joined -> Active -> Closed
//!      \______________\______________\_______\______/
//! ```
//!
//! `Closed` is reachable from every state and is terminal.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transport upgrade in progress.
    Connecting,
    /// Waiting for the single handshake frame and its verification.
    Authenticating,
    /// Registered in a room, lifecycle notifications not yet sent.
    Joined,
    /// Accepting application messages.
    Active,
    Closed,
}

impl SessionState {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Connecting, Authenticating)
                | (Authenticating, Joined)
                | (Joined, Active)
                | (Connecting | Authenticating | Joined | Active, Closed)
        )
    }

    /// Move to `next`, staying put on an illegal transition.
    pub fn advance(&mut self, next: SessionState) -> bool {
        if self.can_transition_to(next) {
            *self = next;
            true
        } else {
            tracing::warn!("Ignoring illegal session transition {} -> {}", self, next);
            false
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Connecting => "connecting",
            SessionState::Authenticating => "authenticating",
            SessionState::Joined => "joined",
            SessionState::Active => "active",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}
