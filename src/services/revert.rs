use thiserror::Error;

use crate::error::AppError;

/// Revert reasons the lottery contract is known to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevertKind {
    OrganizerCannotParticipate,
    NotStarted,
    OnlyOrganizer,
    NotEnoughParticipants,
    OrganizerChangeMidRound,
}

impl RevertKind {
    /// Exact text of the contract's `require` message.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::OrganizerCannotParticipate => "Organizer cannot participate",
            Self::NotStarted => "Lottery is not yet started. Please choose an organizer.",
            Self::OnlyOrganizer => "Only the organizer can get the results",
            Self::NotEnoughParticipants => "Lottery must have at least 3 participants",
            Self::OrganizerChangeMidRound => "Cannot change organizer in the middle of a lottery",
        }
    }

    #[cfg(test)]
    pub(crate) fn all() -> Vec<Self> {
        vec![
            Self::OrganizerCannotParticipate,
            Self::NotStarted,
            Self::OnlyOrganizer,
            Self::NotEnoughParticipants,
            Self::OrganizerChangeMidRound,
        ]
    }
}

// Ordered tables, first match wins.
pub const PARTICIPATE_REVERTS: &[RevertKind] = &[
    RevertKind::OrganizerCannotParticipate,
    RevertKind::NotStarted,
];

pub const RESULTS_REVERTS: &[RevertKind] = &[
    RevertKind::OnlyOrganizer,
    RevertKind::NotEnoughParticipants,
    RevertKind::NotStarted,
];

pub const ROTATE_REVERTS: &[RevertKind] = &[RevertKind::OrganizerChangeMidRound];

/// User-facing failure of a lottery write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LotteryFailure {
    #[error("{}", .0.reason())]
    Known(RevertKind),

    #[error("please switch to network {expected} (connected to {actual})")]
    WrongNetwork { expected: u64, actual: u64 },

    #[error("{0}")]
    Unknown(String),
}

impl LotteryFailure {
    pub fn kind(&self) -> Option<RevertKind> {
        match self {
            Self::Known(kind) => Some(*kind),
            _ => None,
        }
    }
}

/// Maps a failed contract interaction onto the first matching entry of `table`.
///
/// A structured revert reason is compared exactly before falling back to a
/// substring search over the raw provider message.
pub fn classify(error: &AppError, table: &[RevertKind]) -> LotteryFailure {
    if let AppError::Revert(reason) = error {
        if let Some(kind) = table.iter().find(|kind| kind.reason() == reason.trim()) {
            return LotteryFailure::Known(*kind);
        }
    }

    let raw = error.raw_message();
    classify_message(&raw, table)
}

pub fn classify_message(raw: &str, table: &[RevertKind]) -> LotteryFailure {
    table
        .iter()
        .find(|kind| raw.contains(kind.reason()))
        .map(|kind| LotteryFailure::Known(*kind))
        .unwrap_or_else(|| LotteryFailure::Unknown(raw.to_string()))
}
