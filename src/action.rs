use thiserror::Error;

use crate::assign::Round;
use crate::cost::Tier;
use crate::model::entity::{ParticipantId, SegmentIndex, Weight};
use crate::model::segment::SizeMode;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Pick(SegmentIndex),
    Reset,
    Reconfigure { persons: u32, slices_per_person: u32 },
    SelectSizeMode(SizeMode),
    SubmitSizes(String),
    SelectProduct(String),
    Rename { participant: ParticipantId, name: String },
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ActionError {
    #[error("invalid size value {token:?} at position {position}; use comma-separated positive numbers")]
    Parse { token: String, position: usize },
    #[error("expected {expected} values, found {found}")]
    CountMismatch { expected: usize, found: usize },
    #[error("values sum to {found}, expected {expected} (tolerance {tolerance})")]
    SumMismatch { expected: Weight, found: Weight, tolerance: f64 },
    #[error("segment {index} is already taken by participant {owner}")]
    AlreadyTaken { index: SegmentIndex, owner: ParticipantId },
    #[error("segment {index} is out of range for {len} segments")]
    OutOfRange { index: SegmentIndex, len: usize },
    #[error("price not available for {product} ({tier})")]
    PriceUnavailable { product: String, tier: Tier },
    #[error("insufficient data: no segment has been assigned")]
    InsufficientData,
    #[error("a resource needs at least one segment")]
    EmptySegmentSet,
    #[error("{requested} segments requested, at most {max} are supported")]
    TooManySegments { requested: usize, max: usize },
    #[error("invalid dimensions: {persons} persons with {slices_per_person} slices each")]
    InvalidDimensions { persons: u32, slices_per_person: u32 },
    #[error("invalid tolerance {0}")]
    InvalidTolerance(f64),
    #[error("unknown participant {participant}; there are {persons} persons")]
    UnknownParticipant { participant: ParticipantId, persons: u32 },
}

impl ActionError {
    /// Errors a collaborator is expected to swallow without telling the user.
    pub fn is_silent(&self) -> bool {
        matches!(self, ActionError::AlreadyTaken { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Assigned(Round),
    Reset,
    Rebuilt { segments: usize },
    Unchanged,
    Renamed(ParticipantId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_already_taken_is_silent() {
        assert!(ActionError::AlreadyTaken { index: 0, owner: 1 }.is_silent());
        assert!(!ActionError::InsufficientData.is_silent());
        assert!(!ActionError::CountMismatch { expected: 4, found: 3 }.is_silent());
    }

    #[test]
    fn messages_carry_detail() {
        let err = ActionError::CountMismatch { expected: 8, found: 7 };
        assert_eq!(err.to_string(), "expected 8 values, found 7");
        let err = ActionError::PriceUnavailable { product: "Hawaiian".into(), tier: Tier::Small };
        assert_eq!(err.to_string(), "price not available for Hawaiian (Small Pizza)");
    }
}
