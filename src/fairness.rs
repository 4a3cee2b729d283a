use std::collections::BTreeMap;

use serde::Serialize;

use crate::action::ActionError;
use crate::model::assignment::AssignmentMap;
use crate::model::entity::{ParticipantId, Weight};
use crate::model::segment::SegmentSet;

/// Total weight held by every participant owning at least one segment.
///
/// Participants without a segment are absent rather than zero.
pub fn per_participant_weight(map: &AssignmentMap, segments: &SegmentSet) -> BTreeMap<ParticipantId, Weight> {
    let mut totals = BTreeMap::new();
    for (index, owner) in map.assigned() {
        if let Some(weight) = segments.weight(index) {
            *totals.entry(owner).or_insert(0.0) += weight;
        }
    }
    totals
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FairnessMetrics {
    pub per_participant_weight: BTreeMap<ParticipantId, Weight>,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// `mean / max`; 1.0 when every share is equal.
    pub symmetry_score: f64,
}

pub fn metrics(weights: &BTreeMap<ParticipantId, Weight>) -> Result<FairnessMetrics, ActionError> {
    if weights.is_empty() {
        return Err(ActionError::InsufficientData);
    }
    let count = weights.len() as f64;
    let mean = weights.values().sum::<f64>() / count;
    let variance = weights.values().map(|w| (w - mean).powi(2)).sum::<f64>() / count;
    let max = weights.values().copied().fold(f64::NEG_INFINITY, f64::max);
    if max <= 0.0 {
        return Err(ActionError::InsufficientData);
    }
    Ok(FairnessMetrics {
        per_participant_weight: weights.clone(),
        mean,
        std_dev: variance.sqrt(),
        symmetry_score: mean / max,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FairnessReport {
    InsufficientData,
    Measured(FairnessMetrics),
}

impl FairnessReport {
    pub fn metrics(&self) -> Option<&FairnessMetrics> {
        match self {
            FairnessReport::Measured(metrics) => Some(metrics),
            FairnessReport::InsufficientData => None,
        }
    }
}

pub fn analyze(map: &AssignmentMap, segments: &SegmentSet) -> FairnessReport {
    match metrics(&per_participant_weight(map, segments)) {
        Ok(metrics) => FairnessReport::Measured(metrics),
        Err(_) => FairnessReport::InsufficientData,
    }
}
