pub mod entity {
    use serde::{Deserialize, Serialize};

    pub type SegmentIndex = usize;
    pub type ParticipantId = u32;
    pub type Weight = f64;

    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Segment {
        pub index: SegmentIndex,
        pub weight: Weight,
    }
}


pub mod segment {
    use serde::{Deserialize, Serialize};
    use tracing::{debug, warn};

    use super::entity::{Segment, SegmentIndex, Weight};
    use crate::action::ActionError;

    pub const DEGREE_CAPACITY: Weight = 360.0;
    pub const PERCENTAGE_CAPACITY: Weight = 100.0;
    pub const DEFAULT_TOLERANCE: f64 = 1e-6;
    pub const MAX_SEGMENTS: usize = 10_000;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum SizeMode {
        #[default]
        Degrees,
        Percentages,
    }

    impl SizeMode {
        pub fn capacity(self) -> Weight {
            match self {
                SizeMode::Degrees => DEGREE_CAPACITY,
                SizeMode::Percentages => PERCENTAGE_CAPACITY,
            }
        }
    }

    /// Validated, immutable partition of the resource into weighted segments.
    ///
    /// Weights always sum to the capacity of `mode` (within the tolerance the set was built
    /// with) and there is at least one segment.
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct SegmentSet {
        mode: SizeMode,
        segments: Vec<Segment>,
    }

    impl SegmentSet {
        /// `raw_spec == None` builds an equal-share set; otherwise the comma-separated weights
        /// are parsed and validated against the segment count and the mode's capacity.
        pub fn build(
            total_segments: usize,
            mode: SizeMode,
            raw_spec: Option<&str>,
            tolerance: f64,
        ) -> Result<SegmentSet, ActionError> {
            match raw_spec {
                None => SegmentSet::equal(total_segments, mode),
                Some(raw) => SegmentSet::custom(total_segments, mode, raw, tolerance),
            }
        }

        pub fn equal(total_segments: usize, mode: SizeMode) -> Result<SegmentSet, ActionError> {
            check_count(total_segments)?;
            let weight = mode.capacity() / total_segments as Weight;
            debug!(total_segments, ?mode, weight, "built equal-share segment set");
            Ok(SegmentSet::from_weights(mode, std::iter::repeat(weight).take(total_segments)))
        }

        pub fn custom(
            total_segments: usize,
            mode: SizeMode,
            raw: &str,
            tolerance: f64,
        ) -> Result<SegmentSet, ActionError> {
            check_count(total_segments)?;
            let weights = parse_weights(raw).map_err(|err| {
                warn!(%err, "rejected size spec");
                err
            })?;
            if weights.len() != total_segments {
                warn!(expected = total_segments, found = weights.len(), "segment count mismatch");
                return Err(ActionError::CountMismatch { expected: total_segments, found: weights.len() });
            }
            let capacity = mode.capacity();
            let sum: Weight = weights.iter().sum();
            if (sum - capacity).abs() > tolerance * capacity {
                warn!(expected = capacity, found = sum, tolerance, "segment weights do not fill capacity");
                return Err(ActionError::SumMismatch { expected: capacity, found: sum, tolerance });
            }
            debug!(total_segments, ?mode, "built custom segment set");
            Ok(SegmentSet::from_weights(mode, weights))
        }

        fn from_weights(mode: SizeMode, weights: impl IntoIterator<Item = Weight>) -> SegmentSet {
            let segments = weights
                .into_iter()
                .enumerate()
                .map(|(index, weight)| Segment { index, weight })
                .collect();
            SegmentSet { mode, segments }
        }

        pub fn mode(&self) -> SizeMode {
            self.mode
        }

        pub fn capacity(&self) -> Weight {
            self.mode.capacity()
        }

        pub fn len(&self) -> usize {
            self.segments.len()
        }

        pub fn is_empty(&self) -> bool {
            self.segments.is_empty()
        }

        pub fn segments(&self) -> &[Segment] {
            &self.segments
        }

        pub fn weight(&self, index: SegmentIndex) -> Option<Weight> {
            self.segments.get(index).map(|segment| segment.weight)
        }

        pub fn total_weight(&self) -> Weight {
            self.segments.iter().map(|segment| segment.weight).sum()
        }

        /// Cumulative `(start, end)` angles in degrees, in segment order.
        pub fn angles(&self) -> Vec<(f64, f64)> {
            let capacity = self.capacity();
            self.segments
                .iter()
                .scan(0.0, |start, segment| {
                    let end = *start + segment.weight / capacity * 360.0;
                    let span = (*start, end);
                    *start = end;
                    Some(span)
                })
                .collect()
        }
    }

    fn check_count(total_segments: usize) -> Result<(), ActionError> {
        match total_segments {
            0 => Err(ActionError::EmptySegmentSet),
            n if n > MAX_SEGMENTS => Err(ActionError::TooManySegments { requested: n, max: MAX_SEGMENTS }),
            _ => Ok(()),
        }
    }

    /// Parses a comma-separated list of positive, finite numbers.
    ///
    /// Every token must be a number; an empty token (including one produced by a trailing
    /// comma) is a formatting error.
    pub fn parse_weights(raw: &str) -> Result<Vec<Weight>, ActionError> {
        raw.split(',')
            .enumerate()
            .map(|(position, token)| {
                let token = token.trim();
                match token.parse::<Weight>() {
                    Ok(weight) if weight.is_finite() && weight > 0.0 => Ok(weight),
                    _ => Err(ActionError::Parse { token: token.to_string(), position }),
                }
            })
            .collect()
    }

}


pub mod assignment {
    use serde::Serialize;

    use super::entity::{ParticipantId, SegmentIndex};

    /// Ownership of every segment: `None` while unassigned.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    pub struct AssignmentMap {
        owners: Vec<Option<ParticipantId>>,
    }

    impl AssignmentMap {
        pub fn new(len: usize) -> AssignmentMap {
            AssignmentMap { owners: vec![None; len] }
        }

        pub fn len(&self) -> usize {
            self.owners.len()
        }

        pub fn is_empty(&self) -> bool {
            self.owners.is_empty()
        }

        pub fn owner(&self, index: SegmentIndex) -> Option<ParticipantId> {
            self.owners.get(index).copied().flatten()
        }

        pub fn is_free(&self, index: SegmentIndex) -> bool {
            matches!(self.owners.get(index), Some(None))
        }

        pub fn free_count(&self) -> usize {
            self.owners.iter().filter(|owner| owner.is_none()).count()
        }

        pub fn all_assigned(&self) -> bool {
            self.owners.iter().all(Option::is_some)
        }

        /// Assigned `(index, owner)` pairs in index order.
        pub fn assigned(&self) -> impl Iterator<Item = (SegmentIndex, ParticipantId)> + '_ {
            self.owners
                .iter()
                .enumerate()
                .filter_map(|(index, owner)| owner.map(|owner| (index, owner)))
        }

        pub(crate) fn assign(&mut self, index: SegmentIndex, participant: ParticipantId) {
            self.owners[index] = Some(participant);
        }
    }

}
