//! Pitch status state machine.
//!
//! `TRANSITIONS` is the only place that decides which status changes are legal
//! and which queue side effect each one carries. Storage, services and the CLI
//! all go through [`PitchStatus::apply`].

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Lifecycle status of a pitch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PitchStatus {
    /// Submitted, awaiting an editor's decision. The only editable status.
    Pending,
    /// Accepted for generation.
    Approved,
    /// Rejected by an editor.
    Refused,
    /// Picked up by the reconciliation sweep and queued for generation.
    Processing,
    /// Content was generated. Terminal for the pipeline.
    Generated,
    /// Generated content went live.
    Published,
}

impl PitchStatus {
    pub const ALL: &'static [PitchStatus] = &[
        Self::Pending,
        Self::Approved,
        Self::Refused,
        Self::Processing,
        Self::Generated,
        Self::Published,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Refused => "refused",
            Self::Processing => "processing",
            Self::Generated => "generated",
            Self::Published => "published",
        }
    }

    /// Content fields may only be edited while pending.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(*self, Self::Pending)
    }

    /// Statuses from which a queued generation job may still complete.
    #[must_use]
    pub const fn accepts_generation(&self) -> bool {
        matches!(*self, Self::Approved | Self::Processing)
    }

    /// Validates `action` against the transition table.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidTransition` when the table has no row for
    /// `(self, action)`.
    pub fn apply(self, action: PitchAction) -> Result<Transition, CoreError> {
        TRANSITIONS
            .iter()
            .find(|rule| rule.action == action && rule.from.contains(&self))
            .map(|rule| Transition {
                from: self,
                to: rule.to,
                action,
                side_effect: rule.side_effect,
            })
            .ok_or(CoreError::InvalidTransition { from: self, action })
    }

    /// Maps a raw "move to status X" request onto the operator action that
    /// performs it. Pipeline-only edges are never returned.
    ///
    /// # Errors
    /// Returns `CoreError::UnlistedTransition` when no operator action moves
    /// the pitch from `self` to `target`.
    pub fn operator_action_to(self, target: PitchStatus) -> Result<PitchAction, CoreError> {
        TRANSITIONS
            .iter()
            .find(|rule| {
                rule.action.actor() == Actor::Operator
                    && rule.to == target
                    && rule.from.contains(&self)
                    && rule.to != self
            })
            .map(|rule| rule.action)
            .ok_or(CoreError::UnlistedTransition { from: self, to: target })
    }
}

impl Display for PitchStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for PitchStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "refused" => Ok(Self::Refused),
            "processing" => Ok(Self::Processing),
            "generated" => Ok(Self::Generated),
            "published" => Ok(Self::Published),
            other => Err(CoreError::InvalidStatus(other.to_owned())),
        }
    }
}

/// Who is allowed to trigger an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    Operator,
    Pipeline,
}

/// Named status change requested on a pitch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PitchAction {
    Approve,
    Refuse,
    Reopen,
    /// Approve (if needed) and jump the queue.
    ForceGenerate,
    /// Re-approve a pitch whose generation failed while processing.
    Retry,
    Publish,
    /// Reconciliation sweep picked the pitch up.
    StartProcessing,
    /// Queue processor stored generated content.
    Complete,
}

impl PitchAction {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Approve => "approve",
            Self::Refuse => "refuse",
            Self::Reopen => "reopen",
            Self::ForceGenerate => "force-generate",
            Self::Retry => "retry",
            Self::Publish => "publish",
            Self::StartProcessing => "start-processing",
            Self::Complete => "complete",
        }
    }

    #[must_use]
    pub const fn actor(&self) -> Actor {
        match *self {
            Self::StartProcessing | Self::Complete => Actor::Pipeline,
            _ => Actor::Operator,
        }
    }
}

impl Display for PitchAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for PitchAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(Self::Approve),
            "refuse" => Ok(Self::Refuse),
            "reopen" => Ok(Self::Reopen),
            "force-generate" | "generate" => Ok(Self::ForceGenerate),
            "retry" => Ok(Self::Retry),
            "publish" => Ok(Self::Publish),
            "start-processing" => Ok(Self::StartProcessing),
            "complete" => Ok(Self::Complete),
            other => Err(CoreError::InvalidInput(format!("unknown pitch action: {other}"))),
        }
    }
}

/// Queue work that must accompany a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideEffect {
    None,
    Enqueue,
    EnqueueWithPriority,
}

/// A validated status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: PitchStatus,
    pub to: PitchStatus,
    pub action: PitchAction,
    pub side_effect: SideEffect,
}

impl Transition {
    /// Whether the stored status actually changes.
    #[must_use]
    pub fn changes_status(&self) -> bool {
        self.from != self.to
    }
}

struct Rule {
    action: PitchAction,
    from: &'static [PitchStatus],
    to: PitchStatus,
    side_effect: SideEffect,
}

use PitchStatus::{Approved, Generated, Pending, Processing, Published, Refused};

const TRANSITIONS: &[Rule] = &[
    Rule {
        action: PitchAction::Approve,
        from: &[Pending],
        to: Approved,
        side_effect: SideEffect::Enqueue,
    },
    Rule {
        action: PitchAction::Refuse,
        from: &[Pending, Approved],
        to: Refused,
        side_effect: SideEffect::None,
    },
    Rule { action: PitchAction::Reopen, from: &[Refused], to: Pending, side_effect: SideEffect::None },
    Rule {
        action: PitchAction::ForceGenerate,
        from: &[Pending, Approved],
        to: Approved,
        side_effect: SideEffect::EnqueueWithPriority,
    },
    Rule {
        action: PitchAction::Retry,
        from: &[Processing],
        to: Approved,
        side_effect: SideEffect::Enqueue,
    },
    Rule {
        action: PitchAction::Publish,
        from: &[Generated],
        to: Published,
        side_effect: SideEffect::None,
    },
    Rule {
        action: PitchAction::StartProcessing,
        from: &[Approved],
        to: Processing,
        side_effect: SideEffect::None,
    },
    Rule {
        action: PitchAction::Complete,
        from: &[Approved, Processing],
        to: Generated,
        side_effect: SideEffect::None,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ACTIONS: &[PitchAction] = &[
        PitchAction::Approve,
        PitchAction::Refuse,
        PitchAction::Reopen,
        PitchAction::ForceGenerate,
        PitchAction::Retry,
        PitchAction::Publish,
        PitchAction::StartProcessing,
        PitchAction::Complete,
    ];

    #[test]
    fn test_approve_enqueues() {
        let t = Pending.apply(PitchAction::Approve).unwrap();
        assert_eq!(t.to, Approved);
        assert_eq!(t.side_effect, SideEffect::Enqueue);
    }

    #[test]
    fn test_force_generate_uses_priority() {
        for from in [Pending, Approved] {
            let t = from.apply(PitchAction::ForceGenerate).unwrap();
            assert_eq!(t.to, Approved);
            assert_eq!(t.side_effect, SideEffect::EnqueueWithPriority);
        }
        assert!(Refused.apply(PitchAction::ForceGenerate).is_err());
    }

    #[test]
    fn test_refuse_reopen_cycle() {
        assert_eq!(Approved.apply(PitchAction::Refuse).unwrap().to, Refused);
        assert_eq!(Refused.apply(PitchAction::Reopen).unwrap().to, Pending);
    }

    #[test]
    fn test_generated_only_leaves_via_publish() {
        for action in ALL_ACTIONS {
            let result = Generated.apply(*action);
            if *action == PitchAction::Publish {
                assert_eq!(result.unwrap().to, Published);
            } else {
                assert!(result.is_err(), "generated must reject {action}");
            }
        }
    }

    #[test]
    fn test_published_is_final() {
        for action in ALL_ACTIONS {
            assert!(Published.apply(*action).is_err());
        }
    }

    #[test]
    fn test_only_pipeline_reaches_generated() {
        for from in PitchStatus::ALL {
            assert!(from.operator_action_to(Generated).is_err());
        }
        assert_eq!(PitchAction::Complete.actor(), Actor::Pipeline);
    }

    #[test]
    fn test_every_allowed_transition_is_in_table() {
        let mut allowed = Vec::new();
        for from in PitchStatus::ALL {
            for action in ALL_ACTIONS {
                if let Ok(t) = from.apply(*action) {
                    allowed.push((t.from, t.to));
                }
            }
        }
        let expected = [
            (Pending, Approved),
            (Pending, Refused),
            (Approved, Refused),
            (Refused, Pending),
            (Approved, Approved),
            (Processing, Approved),
            (Generated, Published),
            (Approved, Processing),
            (Approved, Generated),
            (Processing, Generated),
        ];
        for edge in &allowed {
            assert!(expected.contains(edge), "unexpected edge {edge:?}");
        }
        assert_eq!(allowed.len(), 11);
    }

    #[test]
    fn test_operator_action_to_maps_raw_status_requests() {
        assert_eq!(Pending.operator_action_to(Approved).unwrap(), PitchAction::Approve);
        assert_eq!(Pending.operator_action_to(Refused).unwrap(), PitchAction::Refuse);
        assert_eq!(Refused.operator_action_to(Pending).unwrap(), PitchAction::Reopen);
        assert_eq!(Processing.operator_action_to(Approved).unwrap(), PitchAction::Retry);
        assert!(Pending.operator_action_to(Processing).is_err());
        assert!(Refused.operator_action_to(Approved).is_err());
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert_eq!("assign".parse::<PitchStatus>(), Err(CoreError::InvalidStatus("assign".into())));
        for status in PitchStatus::ALL {
            assert_eq!(status.as_str().parse::<PitchStatus>().unwrap(), *status);
        }
    }
}
