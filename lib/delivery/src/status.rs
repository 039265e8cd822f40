//! Delivery status state machine.
//!
//! Pure transition logic; the message store applies these rules under its
//! own lock so readers never observe a status regression.

use serde::{Deserialize, Serialize};

/// Delivery status of a persisted message.
///
/// Valid forward transitions: `Sent → {Delivered, Pending}`,
/// `Pending → Delivered`, `{Sent, Pending, Delivered} → Read`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageStatus {
    /// Persisted, presence not yet consulted. The initial state.
    Sent,
    /// Receiver was offline at send time; awaiting reconnect.
    Pending,
    /// Handed to the receiver's connection.
    Delivered,
    /// Acknowledged as read by the receiver.
    Read,
}

impl MessageStatus {
    /// Forward-progress rank. `Sent` and `Pending` are branches of the
    /// same stage and share a rank.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Sent | Self::Pending => 0,
            Self::Delivered => 1,
            Self::Read => 2,
        }
    }
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Sent => "SENT",
            Self::Pending => "PENDING",
            Self::Delivered => "DELIVERED",
            Self::Read => "READ",
        };
        write!(f, "{name}")
    }
}

/// Outcome of applying a requested status to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The status moved forward.
    Advanced,
    /// The status was already there; idempotent re-application.
    NoOp,
    /// The request would move the status backward.
    Rejected,
}

/// Computes the transition outcome for a requested status change.
///
/// Re-applying the current status is a `NoOp`, never an error, so delivery
/// and read acknowledgments are idempotent.
#[must_use]
pub fn apply(current: MessageStatus, requested: MessageStatus) -> Transition {
    use MessageStatus::{Delivered, Pending, Read, Sent};

    if requested == current {
        return Transition::NoOp;
    }

    match (current, requested) {
        (Sent, Pending | Delivered | Read) => Transition::Advanced,
        (Pending, Delivered | Read) => Transition::Advanced,
        (Delivered, Read) => Transition::Advanced,
        _ => Transition::Rejected,
    }
}

/// Returns true if the requested change is a valid forward transition.
#[must_use]
pub fn can_transition(current: MessageStatus, requested: MessageStatus) -> bool {
    apply(current, requested) == Transition::Advanced
}

#[cfg(test)]
mod tests {
    use super::*;
    use MessageStatus::{Delivered, Pending, Read, Sent};

    #[test]
    fn sent_branches_to_delivered_or_pending() {
        assert_eq!(apply(Sent, Delivered), Transition::Advanced);
        assert_eq!(apply(Sent, Pending), Transition::Advanced);
    }

    #[test]
    fn pending_advances_to_delivered() {
        assert_eq!(apply(Pending, Delivered), Transition::Advanced);
    }

    #[test]
    fn read_is_reachable_from_any_lower_state() {
        assert_eq!(apply(Sent, Read), Transition::Advanced);
        assert_eq!(apply(Pending, Read), Transition::Advanced);
        assert_eq!(apply(Delivered, Read), Transition::Advanced);
    }

    #[test]
    fn no_transition_regresses() {
        assert_eq!(apply(Read, Delivered), Transition::Rejected);
        assert_eq!(apply(Read, Pending), Transition::Rejected);
        assert_eq!(apply(Read, Sent), Transition::Rejected);
        assert_eq!(apply(Delivered, Sent), Transition::Rejected);
        assert_eq!(apply(Delivered, Pending), Transition::Rejected);
        assert_eq!(apply(Pending, Sent), Transition::Rejected);
    }

    #[test]
    fn reapplication_is_idempotent() {
        assert_eq!(apply(Delivered, Delivered), Transition::NoOp);
        assert_eq!(apply(Read, Read), Transition::NoOp);
        assert_eq!(apply(Pending, Pending), Transition::NoOp);
    }

    #[test]
    fn rank_is_monotone_over_advances() {
        let all = [Sent, Pending, Delivered, Read];
        for from in all {
            for to in all {
                if apply(from, to) == Transition::Advanced {
                    assert!(
                        to.rank() >= from.rank(),
                        "advance {from} -> {to} lowered rank"
                    );
                }
            }
        }
    }

    #[test]
    fn status_display_matches_wire_names() {
        assert_eq!(Sent.to_string(), "SENT");
        assert_eq!(Read.to_string(), "READ");
    }
}
