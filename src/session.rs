use std::collections::BTreeMap;

use itertools::Itertools;
use serde::Serialize;
use tracing::debug;

use crate::action::{Action, ActionError, ActionOutcome};
use crate::assign::AssignmentEngine;
use crate::config::{validate_dimensions, Config};
use crate::cost::{allocate, classify_tier, CostSplit, Price, Tier};
use crate::fairness::{self, FairnessReport};
use crate::model::entity::{ParticipantId, SegmentIndex, Weight};
use crate::model::segment::{SegmentSet, SizeMode};

/// All state of one sharing session.
///
/// Every action either commits completely or fails leaving the session as it was.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    config: Config,
    segments: SegmentSet,
    engine: AssignmentEngine,
    names: BTreeMap<ParticipantId, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentView {
    pub index: SegmentIndex,
    pub weight: Weight,
    pub start_angle: f64,
    pub end_angle: f64,
    pub is_taken: bool,
    pub owner: Option<ParticipantId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantReport {
    pub participant: ParticipantId,
    pub label: String,
    pub indices: Vec<SegmentIndex>,
    pub weight: Weight,
    /// Share of the whole resource, in percent.
    pub percentage: f64,
    pub cost: Option<Price>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub segments: Vec<SegmentView>,
    pub participants: Vec<ParticipantReport>,
    pub fairness: FairnessReport,
    pub tier: Tier,
    pub price: Option<Price>,
    pub costs: CostSplit,
    pub all_assigned: bool,
}

impl Session {
    pub fn new(config: Config) -> Result<Session, ActionError> {
        config.validate()?;
        let segments = SegmentSet::build(
            config.total_segments(),
            config.size_mode,
            config.raw_spec.as_deref(),
            config.tolerance,
        )?;
        let engine = AssignmentEngine::new(config.persons, segments.len());
        let session = Session { config, segments, engine, names: BTreeMap::new() };
        session.check_price();
        Ok(session)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn segments(&self) -> &SegmentSet {
        &self.segments
    }

    pub fn engine(&self) -> &AssignmentEngine {
        &self.engine
    }

    pub fn all_assigned(&self) -> bool {
        self.engine.all_assigned()
    }

    pub fn tier(&self) -> Tier {
        classify_tier(self.segments.len())
    }

    pub fn act(&mut self, action: Action) -> Result<ActionOutcome, ActionError> {
        debug!(?action, "applying action");
        match action {
            Action::Pick(index) => self.pick(index),
            Action::Reset => Ok(self.reset()),
            Action::Reconfigure { persons, slices_per_person } => self.reconfigure(persons, slices_per_person),
            Action::SelectSizeMode(mode) => self.select_size_mode(mode),
            Action::SubmitSizes(raw) => self.submit_sizes(&raw),
            Action::SelectProduct(product) => Ok(self.select_product(product)),
            Action::Rename { participant, name } => self.rename(participant, name),
        }
    }

    pub fn pick(&mut self, index: SegmentIndex) -> Result<ActionOutcome, ActionError> {
        self.engine.pick(index).map(ActionOutcome::Assigned)
    }

    /// Clears ownership and costs; keeps the segment set and names.
    pub fn reset(&mut self) -> ActionOutcome {
        self.engine.reset();
        ActionOutcome::Reset
    }

    /// Changing either dimension rebuilds an equal-share set in the current size mode.
    pub fn reconfigure(&mut self, persons: u32, slices_per_person: u32) -> Result<ActionOutcome, ActionError> {
        let total = validate_dimensions(persons, slices_per_person)?;
        if persons == self.config.persons && slices_per_person == self.config.slices_per_person {
            return Ok(self.reset());
        }
        let segments = SegmentSet::equal(total, self.segments.mode())?;
        self.config.persons = persons;
        self.config.slices_per_person = slices_per_person;
        self.config.raw_spec = None;
        self.names.retain(|participant, _| *participant <= persons);
        Ok(self.replace_segments(segments))
    }

    pub fn select_size_mode(&mut self, mode: SizeMode) -> Result<ActionOutcome, ActionError> {
        if mode == self.segments.mode() {
            return Ok(ActionOutcome::Unchanged);
        }
        let segments = SegmentSet::equal(self.config.total_segments(), mode)?;
        self.config.size_mode = mode;
        self.config.raw_spec = None;
        Ok(self.replace_segments(segments))
    }

    pub fn submit_sizes(&mut self, raw: &str) -> Result<ActionOutcome, ActionError> {
        let segments = SegmentSet::custom(
            self.config.total_segments(),
            self.segments.mode(),
            raw,
            self.config.tolerance,
        )?;
        self.config.raw_spec = Some(raw.to_string());
        Ok(self.replace_segments(segments))
    }

    pub fn select_product(&mut self, product: String) -> ActionOutcome {
        self.config.product = product;
        self.check_price();
        self.reset()
    }

    /// A blank name restores the default label.
    pub fn rename(&mut self, participant: ParticipantId, name: String) -> Result<ActionOutcome, ActionError> {
        if participant == 0 || participant > self.config.persons {
            return Err(ActionError::UnknownParticipant { participant, persons: self.config.persons });
        }
        let name = name.trim();
        if name.is_empty() {
            self.names.remove(&participant);
        } else {
            self.names.insert(participant, name.to_string());
        }
        Ok(ActionOutcome::Renamed(participant))
    }

    pub fn label(&self, participant: ParticipantId) -> String {
        self.names
            .get(&participant)
            .cloned()
            .unwrap_or_else(|| format!("Person {participant}"))
    }

    pub fn recompute(&self) -> Snapshot {
        recompute(self)
    }

    fn replace_segments(&mut self, segments: SegmentSet) -> ActionOutcome {
        debug!(segments = segments.len(), mode = ?segments.mode(), "segment set replaced");
        self.engine = AssignmentEngine::new(self.config.persons, segments.len());
        self.segments = segments;
        self.check_price();
        ActionOutcome::Rebuilt { segments: self.segments.len() }
    }

    /// Logs a missing price once per product or segment set change; snapshots stay quiet.
    fn check_price(&self) {
        let _ = self.config.prices.lookup(&self.config.product, self.tier());
    }

    fn cost_split(&self, weights: &BTreeMap<ParticipantId, Weight>) -> (Option<Price>, CostSplit) {
        let tier = self.tier();
        let price = self.config.prices.get(&self.config.product, tier);
        if !self.all_assigned() {
            return (price, CostSplit::Pending);
        }
        let split = match price {
            None => CostSplit::Unavailable { product: self.config.product.clone(), tier },
            Some(price) => allocate(weights, price)
                .map_or(CostSplit::Pending, |shares| CostSplit::Allocated { price, shares }),
        };
        (price, split)
    }
}

/// Derives every output from the current state; nothing is cached between calls.
pub fn recompute(session: &Session) -> Snapshot {
    let map = session.engine.map();
    let segments = session
        .segments
        .segments()
        .iter()
        .zip_eq(session.segments.angles())
        .map(|(segment, (start_angle, end_angle))| SegmentView {
            index: segment.index,
            weight: segment.weight,
            start_angle,
            end_angle,
            is_taken: map.owner(segment.index).is_some(),
            owner: map.owner(segment.index),
        })
        .collect();

    let weights = fairness::per_participant_weight(map, &session.segments);
    let (price, costs) = session.cost_split(&weights);
    let total = session.segments.total_weight();
    let participants = session
        .engine
        .owned()
        .iter()
        .map(|(participant, indices)| {
            let weight = weights.get(participant).copied().unwrap_or(0.0);
            ParticipantReport {
                participant: *participant,
                label: session.label(*participant),
                indices: indices.clone(),
                weight,
                percentage: weight / total * 100.0,
                cost: costs.share(*participant),
            }
        })
        .collect();

    Snapshot {
        segments,
        participants,
        fairness: fairness::analyze(map, &session.segments),
        tier: session.tier(),
        price,
        costs,
        all_assigned: session.all_assigned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(persons: u32, slices_per_person: u32) -> Session {
        Session::new(Config { persons, slices_per_person, ..Config::default() }).unwrap()
    }

    #[test]
    fn fresh_session_reports_no_data() {
        let snapshot = session(4, 2).recompute();
        assert_eq!(snapshot.segments.len(), 8);
        assert!(snapshot.segments.iter().all(|s| !s.is_taken && s.owner.is_none()));
        assert!(snapshot.participants.is_empty());
        assert_eq!(snapshot.fairness, FairnessReport::InsufficientData);
        assert_eq!(snapshot.costs, CostSplit::Pending);
        assert_eq!(snapshot.tier, Tier::Medium);
        assert_eq!(snapshot.price, Some(8.0));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = Config { raw_spec: Some("1,2".into()), ..Config::default() };
        assert_eq!(Session::new(config).unwrap_err(), ActionError::CountMismatch { expected: 8, found: 2 });
    }

    #[test]
    fn failed_submit_keeps_prior_state() {
        let mut session = session(2, 1);
        session.pick(0).unwrap();
        let before = session.clone();
        assert!(session.submit_sizes("200,100").is_err());
        assert!(session.submit_sizes("200,x").is_err());
        assert_eq!(session, before);
    }

    #[test]
    fn submit_replaces_set_and_clears_map() {
        let mut session = session(2, 1);
        session.pick(0).unwrap();
        let outcome = session.submit_sizes("270,90").unwrap();
        assert_eq!(outcome, ActionOutcome::Rebuilt { segments: 2 });
        assert_eq!(session.segments().weight(0), Some(270.0));
        assert_eq!(session.engine().map().free_count(), 2);
        assert_eq!(session.config().raw_spec.as_deref(), Some("270,90"));
    }

    #[test]
    fn reconfigure_rebuilds_equal_set() {
        let mut session = session(2, 1);
        session.submit_sizes("270,90").unwrap();
        session.reconfigure(3, 2).unwrap();
        assert_eq!(session.segments().len(), 6);
        assert!(session.segments().segments().iter().all(|s| s.weight == 60.0));
        assert_eq!(session.engine().persons(), 3);
        assert_eq!(session.config().raw_spec, None);
    }

    #[test]
    fn reconfigure_with_same_dimensions_keeps_custom_set() {
        let mut session = session(2, 1);
        session.submit_sizes("270,90").unwrap();
        session.pick(1).unwrap();
        assert_eq!(session.reconfigure(2, 1), Ok(ActionOutcome::Reset));
        assert_eq!(session.segments().weight(0), Some(270.0));
        assert_eq!(session.engine().map().free_count(), 2);
    }

    #[test]
    fn reconfigure_rejects_zero() {
        let mut session = session(2, 1);
        let before = session.clone();
        assert!(session.reconfigure(0, 3).is_err());
        assert_eq!(session, before);
    }

    #[test]
    fn reconfigure_rejects_oversized() {
        let mut session = session(2, 1);
        session.pick(0).unwrap();
        let before = session.clone();
        assert_eq!(
            session.act(Action::Reconfigure { persons: u32::MAX, slices_per_person: u32::MAX }),
            Err(ActionError::InvalidDimensions { persons: u32::MAX, slices_per_person: u32::MAX })
        );
        assert!(session.reconfigure(100_000, 100_000).is_err());
        assert_eq!(session, before);

        let config = Config { persons: u32::MAX, slices_per_person: u32::MAX, ..Config::default() };
        assert!(Session::new(config).is_err());
    }

    #[test]
    fn size_mode_switch_uses_new_capacity() {
        let mut session = session(2, 2);
        assert_eq!(session.select_size_mode(SizeMode::Degrees), Ok(ActionOutcome::Unchanged));
        session.select_size_mode(SizeMode::Percentages).unwrap();
        assert_eq!(session.segments().weight(0), Some(25.0));
        assert_eq!(session.segments().capacity(), 100.0);
    }

    #[test]
    fn names_fall_back_to_default_label() {
        let mut session = session(3, 1);
        session.rename(2, "  Ana ".into()).unwrap();
        assert_eq!(session.label(2), "Ana");
        assert_eq!(session.label(1), "Person 1");
        session.rename(2, " ".into()).unwrap();
        assert_eq!(session.label(2), "Person 2");
        assert_eq!(
            session.rename(4, "Bo".into()),
            Err(ActionError::UnknownParticipant { participant: 4, persons: 3 })
        );
    }

    #[test]
    fn names_beyond_new_persons_are_dropped() {
        let mut session = session(3, 1);
        session.rename(3, "Cy".into()).unwrap();
        session.rename(1, "Al".into()).unwrap();
        session.reconfigure(2, 1).unwrap();
        assert_eq!(session.label(3), "Person 3");
        assert_eq!(session.label(1), "Al");
    }

    #[test]
    fn product_switch_clears_assignments() {
        let mut session = session(2, 1);
        session.pick(0).unwrap();
        assert_eq!(session.select_product("margherita".into()), ActionOutcome::Reset);
        assert_eq!(session.engine().map().free_count(), 2);
        assert_eq!(session.recompute().price, Some(3.0));
    }
}
