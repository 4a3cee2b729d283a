use std::collections::BTreeMap;
use std::fmt::{self, Display};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::action::ActionError;
use crate::model::entity::{ParticipantId, Weight};

pub type Price = f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Small,
    Medium,
    Large,
    ExtraLarge,
    Party,
    Unknown,
}

const TIER_THRESHOLDS: [(usize, Tier); 5] = [
    (6, Tier::Small),
    (8, Tier::Medium),
    (10, Tier::Large),
    (12, Tier::ExtraLarge),
    (24, Tier::Party),
];

impl Tier {
    pub fn label(self) -> &'static str {
        match self {
            Tier::Small => "Small Pizza",
            Tier::Medium => "Medium Pizza",
            Tier::Large => "Large Pizza",
            Tier::ExtraLarge => "Extra-Large Pizza",
            Tier::Party => "Party Pizza",
            Tier::Unknown => "Unknown Pizza Size",
        }
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn classify_tier(total_segments: usize) -> Tier {
    TIER_THRESHOLDS
        .iter()
        .find(|(max, _)| total_segments <= *max)
        .map_or(Tier::Unknown, |(_, tier)| *tier)
}

/// Product name to per-tier price. Product names match case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceTable(BTreeMap<String, BTreeMap<Tier, Price>>);

impl Default for PriceTable {
    fn default() -> Self {
        let mut table = PriceTable::empty();
        let tiers = [Tier::Small, Tier::Medium, Tier::Large, Tier::ExtraLarge, Tier::Party];
        for (tier, price) in tiers.iter().zip([5.0, 8.0, 12.0, 15.0, 20.0]) {
            table.insert("Pepperoni", *tier, price);
        }
        for (tier, price) in tiers.iter().zip([3.0, 5.0, 10.0, 12.0, 7.0]) {
            table.insert("margherita", *tier, price);
        }
        table
    }
}

impl PriceTable {
    pub fn empty() -> PriceTable {
        PriceTable(BTreeMap::new())
    }

    pub fn insert(&mut self, product: &str, tier: Tier, price: Price) {
        self.0.entry(product.to_string()).or_default().insert(tier, price);
    }

    pub fn products(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Like [`PriceTable::lookup`] without logging a miss.
    pub fn get(&self, product: &str, tier: Tier) -> Option<Price> {
        self.0
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(product))
            .and_then(|(_, prices)| prices.get(&tier))
            .copied()
            .filter(|_| tier != Tier::Unknown)
    }

    pub fn lookup(&self, product: &str, tier: Tier) -> Result<Price, ActionError> {
        self.get(product, tier).ok_or_else(|| {
            warn!(product, %tier, known = %self.products().join(", "), "price not available");
            ActionError::PriceUnavailable { product: product.to_string(), tier }
        })
    }
}

/// Splits `price` in proportion to each participant's weight.
pub fn allocate(
    weights: &BTreeMap<ParticipantId, Weight>,
    price: Price,
) -> Result<BTreeMap<ParticipantId, Price>, ActionError> {
    let total: Weight = weights.values().sum();
    if weights.is_empty() || total <= 0.0 {
        return Err(ActionError::InsufficientData);
    }
    let shares = weights
        .iter()
        .map(|(participant, weight)| (*participant, price * (weight / total)))
        .collect();
    debug!(participants = weights.len(), price, "allocated cost");
    Ok(shares)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CostSplit {
    /// Not every segment is assigned yet.
    Pending,
    Unavailable { product: String, tier: Tier },
    Allocated { price: Price, shares: BTreeMap<ParticipantId, Price> },
}

impl CostSplit {
    pub fn share(&self, participant: ParticipantId) -> Option<Price> {
        match self {
            CostSplit::Allocated { shares, .. } => shares.get(&participant).copied(),
            _ => None,
        }
    }
}
