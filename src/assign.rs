use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, trace};

use crate::action::ActionError;
use crate::model::assignment::AssignmentMap;
use crate::model::entity::{ParticipantId, SegmentIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

impl Direction {
    /// Even participants walk counter-clockwise, odd ones clockwise.
    pub fn for_participant(participant: ParticipantId) -> Direction {
        if participant % 2 == 0 {
            Direction::CounterClockwise
        } else {
            Direction::Clockwise
        }
    }

    fn step(self, index: SegmentIndex, len: usize) -> SegmentIndex {
        match self {
            Direction::Clockwise => (index + 1) % len,
            Direction::CounterClockwise => (index + len - 1) % len,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claim {
    pub participant: ParticipantId,
    pub index: SegmentIndex,
    pub probes: usize,
}

/// Segments handed out by one `pick`, in assignment order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Round {
    pub start: SegmentIndex,
    pub claims: Vec<Claim>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentEngine {
    persons: u32,
    map: AssignmentMap,
    owned: BTreeMap<ParticipantId, Vec<SegmentIndex>>,
}

impl AssignmentEngine {
    pub fn new(persons: u32, segments: usize) -> AssignmentEngine {
        AssignmentEngine {
            persons,
            map: AssignmentMap::new(segments),
            owned: BTreeMap::new(),
        }
    }

    pub fn persons(&self) -> u32 {
        self.persons
    }

    pub fn map(&self) -> &AssignmentMap {
        &self.map
    }

    pub fn all_assigned(&self) -> bool {
        self.map.all_assigned()
    }

    pub fn owned(&self) -> &BTreeMap<ParticipantId, Vec<SegmentIndex>> {
        &self.owned
    }

    pub fn owned_by(&self, participant: ParticipantId) -> &[SegmentIndex] {
        self.owned.get(&participant).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Runs one round starting from `start`.
    ///
    /// Participant 1 takes `start`; every following participant walks from the previously
    /// claimed segment in its own direction to the nearest free one. The round hands out
    /// `min(persons, free segments)` segments and leaves the map untouched on error.
    pub fn pick(&mut self, start: SegmentIndex) -> Result<Round, ActionError> {
        let len = self.map.len();
        if start >= len {
            return Err(ActionError::OutOfRange { index: start, len });
        }
        if let Some(owner) = self.map.owner(start) {
            return Err(ActionError::AlreadyTaken { index: start, owner });
        }

        let mut claims = Vec::with_capacity(self.persons as usize);
        self.claim(1, start);
        claims.push(Claim { participant: 1, index: start, probes: 0 });

        let mut current = start;
        for participant in 2..=self.persons {
            let direction = Direction::for_participant(participant);
            let Some((index, probes)) = self.next_free(current, direction) else {
                break;
            };
            trace!(participant, index, probes, ?direction, "claimed segment");
            self.claim(participant, index);
            claims.push(Claim { participant, index, probes });
            current = index;
        }

        debug!(start, claimed = claims.len(), remaining = self.map.free_count(), "round complete");
        Ok(Round { start, claims })
    }

    /// Nearest free segment strictly after `from` in `direction`, with the number of probes
    /// it took. Visits each other segment at most once.
    fn next_free(&self, from: SegmentIndex, direction: Direction) -> Option<(SegmentIndex, usize)> {
        let len = self.map.len();
        let mut probe = from;
        for probes in 1..len {
            probe = direction.step(probe, len);
            if self.map.is_free(probe) {
                return Some((probe, probes));
            }
        }
        None
    }

    fn claim(&mut self, participant: ParticipantId, index: SegmentIndex) {
        self.map.assign(index, participant);
        self.owned.entry(participant).or_default().push(index);
    }

    pub fn reset(&mut self) {
        self.map = AssignmentMap::new(self.map.len());
        self.owned.clear();
    }
}
