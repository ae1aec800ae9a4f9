use thiserror::Error;

use crate::pitch::{PitchAction, PitchStatus};

/// Errors raised by domain validation in the core crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A status string did not name any known pitch or queue status.
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// The requested action is not allowed from the pitch's current status.
    #[error("invalid transition: cannot {action} a pitch in status {from}")]
    InvalidTransition { from: PitchStatus, action: PitchAction },

    /// No single action moves a pitch between the two statuses.
    #[error("invalid transition: no operator action moves a pitch from {from} to {to}")]
    UnlistedTransition { from: PitchStatus, to: PitchStatus },

    /// Content fields may only change while the pitch is pending.
    #[error("pitch in status {0} cannot be edited (only pending pitches are editable)")]
    NotEditable(PitchStatus),

    #[error("invalid pillar: {0}")]
    InvalidPillar(String),

    #[error("invalid origin: {0}")]
    InvalidOrigin(String),

    #[error("invalid strategy: {0} (expected direct|structured|proxy)")]
    InvalidStrategy(String),

    #[error("invalid output target: {0} (expected draft|pitch)")]
    InvalidOutputTarget(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
