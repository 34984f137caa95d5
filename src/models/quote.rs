use serde::{Deserialize, Serialize};

/// Itemized result of one fare calculation. Produced fresh per call and
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareQuote {
    pub base_component: f64,
    pub distance_component: f64,
    pub time_component: f64,
    pub min_fee_applied: bool,
    /// Percentage actually deducted, 0.0 when no tier band matched.
    pub tier_discount_applied_pct: f64,
    pub zone_surcharge: f64,
    pub weight_surcharge: f64,
    pub pre_surge_total: f64,
    pub surge_multiplier_applied: f64,
    /// Whole naira; never below the vehicle class minimum fee.
    pub final_price: i64,
}
