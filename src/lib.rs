//! Claiming a circular resource split into weighted segments.
//!
//! A [`Session`] owns the validated [`SegmentSet`], the assignment state and the configuration.
//! Callers feed it [`Action`]s and read everything they display from [`Session::recompute`].

pub mod action;
pub mod assign;
pub mod config;
pub mod cost;
pub mod fairness;
pub mod model;
pub mod session;

pub use action::{Action, ActionError, ActionOutcome};
pub use assign::{AssignmentEngine, Claim, Direction, Round};
pub use config::Config;
pub use cost::{allocate, classify_tier, CostSplit, Price, PriceTable, Tier};
pub use fairness::{metrics, per_participant_weight, FairnessMetrics, FairnessReport};
pub use model::assignment::AssignmentMap;
pub use model::entity::{ParticipantId, Segment, SegmentIndex, Weight};
pub use model::segment::{SegmentSet, SizeMode};
pub use session::{recompute, ParticipantReport, SegmentView, Session, Snapshot};
