//! Impact Accumulator

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::products::ImpactVector;

/// Running environmental impact totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImpactTotals {
    /// Plastic saved, in kilograms
    pub plastic_kg: Decimal,

    /// Water saved, in litres
    pub water_l: Decimal,

    /// CO₂ reduced, in kilograms
    pub co2_kg: Decimal,

    /// Accumulated eco score
    pub eco_score: Decimal,
}

impl ImpactTotals {
    /// Add one purchase's impact, whatever its sign.
    pub fn record(&mut self, impact: &ImpactVector) {
        self.plastic_kg = self.plastic_kg.saturating_add(impact.plastic_kg);
        self.water_l = self.water_l.saturating_add(impact.water_l);
        self.co2_kg = self.co2_kg.saturating_add(impact.co2_kg);
        self.eco_score = self.eco_score.saturating_add(impact.score);
    }

    /// Whether every total is zero.
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}
