use serde::{Deserialize, Serialize};

use crate::action::ActionError;
use crate::cost::PriceTable;
use crate::model::segment::{SizeMode, DEFAULT_TOLERANCE, MAX_SEGMENTS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub persons: u32,
    pub slices_per_person: u32,
    pub size_mode: SizeMode,
    /// Comma-separated custom weights; equal shares when absent.
    pub raw_spec: Option<String>,
    pub product: String,
    /// Relative tolerance for the weight sum check.
    pub tolerance: f64,
    pub prices: PriceTable,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            persons: 4,
            slices_per_person: 2,
            size_mode: SizeMode::Degrees,
            raw_spec: None,
            product: "Pepperoni".to_string(),
            tolerance: DEFAULT_TOLERANCE,
            prices: PriceTable::default(),
        }
    }
}

impl Config {
    pub fn total_segments(&self) -> usize {
        self.persons as usize * self.slices_per_person as usize
    }

    pub fn validate(&self) -> Result<(), ActionError> {
        validate_dimensions(self.persons, self.slices_per_person)?;
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ActionError::InvalidTolerance(self.tolerance));
        }
        Ok(())
    }
}

/// Returns the segment count, which must lie in `1..=MAX_SEGMENTS`.
pub(crate) fn validate_dimensions(persons: u32, slices_per_person: u32) -> Result<usize, ActionError> {
    (persons as usize)
        .checked_mul(slices_per_person as usize)
        .filter(|total| (1..=MAX_SEGMENTS).contains(total))
        .ok_or(ActionError::InvalidDimensions { persons, slices_per_person })
}
