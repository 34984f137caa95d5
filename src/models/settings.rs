use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AppError;

/// Static rates for one vehicle type. Immutable per pricing epoch; changed
/// only by replacing the whole settings document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleClass {
    pub name: String,
    pub base_fare: f64,
    pub rate_per_km: f64,
    pub rate_per_minute: f64,
    pub min_distance_km: f64,
    pub min_fee: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TariffTable {
    pub vehicles: Vec<VehicleClass>,
}

impl TariffTable {
    /// Dashboards send "bike" and "Bike" interchangeably.
    pub fn find(&self, name: &str) -> Option<&VehicleClass> {
        self.vehicles
            .iter()
            .find(|v| v.name.eq_ignore_ascii_case(name))
    }
}

impl Default for TariffTable {
    fn default() -> Self {
        Self {
            vehicles: vec![
                VehicleClass {
                    name: "Bike".to_string(),
                    base_fare: 500.0,
                    rate_per_km: 150.0,
                    rate_per_minute: 10.0,
                    min_distance_km: 2.0,
                    min_fee: 1200.0,
                },
                VehicleClass {
                    name: "Car".to_string(),
                    base_fare: 1000.0,
                    rate_per_km: 250.0,
                    rate_per_minute: 15.0,
                    min_distance_km: 2.0,
                    min_fee: 2000.0,
                },
                VehicleClass {
                    name: "Van".to_string(),
                    base_fare: 2000.0,
                    rate_per_km: 400.0,
                    rate_per_minute: 20.0,
                    min_distance_km: 3.0,
                    min_fee: 4000.0,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurchargeConfig {
    pub bridge_surcharge: f64,
    pub island_premium: f64,
    pub outer_zone_surcharge: f64,
    pub weight_threshold_kg: f64,
    pub weight_unit_kg: f64,
    pub weight_surcharge_per_unit: f64,
    pub tier_enabled: bool,
    pub tier1_km: f64,
    pub tier1_discount_pct: f64,
    pub tier2_km: f64,
    pub tier2_discount_pct: f64,
}

impl Default for SurchargeConfig {
    fn default() -> Self {
        Self {
            bridge_surcharge: 500.0,
            island_premium: 750.0,
            outer_zone_surcharge: 1000.0,
            weight_threshold_kg: 5.0,
            weight_unit_kg: 1.0,
            weight_surcharge_per_unit: 100.0,
            tier_enabled: true,
            tier1_km: 15.0,
            tier1_discount_pct: 5.0,
            tier2_km: 30.0,
            tier2_discount_pct: 10.0,
        }
    }
}

/// Half-open local-time window. `end` before `start` wraps past midnight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SurgeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl SurgeWindow {
    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.start <= self.end {
            t >= self.start && t < self.end
        } else {
            t >= self.start || t < self.end
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurgeConfig {
    pub surge_enabled: bool,
    pub surge_multiplier: f64,
    pub morning_window: SurgeWindow,
    pub evening_window: SurgeWindow,
    pub rain_surge_enabled: bool,
    pub rain_surge_multiplier: f64,
    /// Windows are Lagos wall time; timestamps arrive as UTC.
    pub utc_offset_minutes: i32,
}

impl SurgeConfig {
    /// Multiplier in effect at `at`. Time-of-day surge and rain surge never
    /// stack; the larger one applies.
    pub fn multiplier_at(&self, at: DateTime<Utc>, weather_is_rainy: bool) -> f64 {
        let local = (at + Duration::minutes(self.utc_offset_minutes as i64)).time();

        let mut multiplier = 1.0;
        if self.surge_enabled
            && (self.morning_window.contains(local) || self.evening_window.contains(local))
        {
            multiplier = self.surge_multiplier;
        }
        if self.rain_surge_enabled && weather_is_rainy {
            multiplier = multiplier.max(self.rain_surge_multiplier);
        }
        multiplier
    }
}

impl Default for SurgeConfig {
    fn default() -> Self {
        Self {
            surge_enabled: true,
            surge_multiplier: 1.5,
            morning_window: SurgeWindow {
                start: NaiveTime::from_hms_opt(7, 0, 0).expect("valid window time"),
                end: NaiveTime::from_hms_opt(10, 0, 0).expect("valid window time"),
            },
            evening_window: SurgeWindow {
                start: NaiveTime::from_hms_opt(16, 30, 0).expect("valid window time"),
                end: NaiveTime::from_hms_opt(20, 0, 0).expect("valid window time"),
            },
            rain_surge_enabled: true,
            rain_surge_multiplier: 1.3,
            utc_offset_minutes: 60,
        }
    }
}

/// Cash-on-delivery handling fee: flat part plus a percentage of the amount
/// collected at dropoff. Separate from the delivery fare.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodConfig {
    pub flat_fee: f64,
    pub percent: f64,
}

impl Default for CodConfig {
    fn default() -> Self {
        Self {
            flat_fee: 100.0,
            percent: 1.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Concurrent-order cap per vehicle class name.
    pub rider_caps: HashMap<String, u32>,
    pub default_cap: u32,
}

impl DispatchConfig {
    pub fn cap_for(&self, vehicle: &str) -> usize {
        self.rider_caps
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(vehicle))
            .map(|(_, cap)| *cap as usize)
            .unwrap_or(self.default_cap as usize)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        let mut rider_caps = HashMap::new();
        rider_caps.insert("Bike".to_string(), 2);
        rider_caps.insert("Car".to_string(), 1);
        rider_caps.insert("Van".to_string(), 1);
        Self {
            rider_caps,
            default_cap: 1,
        }
    }
}

/// The whole administrative configuration, served and replaced as one
/// document. `Default` carries the hard-coded Lagos rates used whenever no
/// document was provided or the provided one does not parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemSettings {
    #[serde(default)]
    pub tariffs: TariffTable,
    #[serde(default)]
    pub surcharge: SurchargeConfig,
    #[serde(default)]
    pub surge: SurgeConfig,
    #[serde(default)]
    pub cod: CodConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

impl SystemSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.tariffs.vehicles.is_empty() {
            return Err("tariff table has no vehicle classes".to_string());
        }
        for (i, v) in self.tariffs.vehicles.iter().enumerate() {
            if v.name.trim().is_empty() {
                return Err(format!("vehicle class {i} has an empty name"));
            }
            if self.tariffs.vehicles[..i]
                .iter()
                .any(|other| other.name.eq_ignore_ascii_case(&v.name))
            {
                return Err(format!("duplicate vehicle class: {}", v.name));
            }
            for (label, value) in [
                ("base_fare", v.base_fare),
                ("rate_per_km", v.rate_per_km),
                ("rate_per_minute", v.rate_per_minute),
                ("min_distance_km", v.min_distance_km),
                ("min_fee", v.min_fee),
            ] {
                if !value.is_finite() || value < 0.0 {
                    return Err(format!("{}: {label} must be a non-negative number", v.name));
                }
            }
        }

        let s = &self.surcharge;
        for (label, value) in [
            ("bridge_surcharge", s.bridge_surcharge),
            ("island_premium", s.island_premium),
            ("outer_zone_surcharge", s.outer_zone_surcharge),
            ("weight_threshold_kg", s.weight_threshold_kg),
            ("weight_surcharge_per_unit", s.weight_surcharge_per_unit),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{label} must be a non-negative number"));
            }
        }
        if !s.weight_unit_kg.is_finite() || s.weight_unit_kg <= 0.0 {
            return Err("weight_unit_kg must be positive".to_string());
        }
        for (label, pct) in [
            ("tier1_discount_pct", s.tier1_discount_pct),
            ("tier2_discount_pct", s.tier2_discount_pct),
        ] {
            if !pct.is_finite() || !(0.0..100.0).contains(&pct) {
                return Err(format!("{label} must be in [0, 100)"));
            }
        }
        if s.tier2_km < s.tier1_km {
            return Err("tier2_km must not be below tier1_km".to_string());
        }
        if s.tier2_discount_pct < s.tier1_discount_pct {
            return Err("tier2_discount_pct must not be below tier1_discount_pct".to_string());
        }

        for (label, m) in [
            ("surge_multiplier", self.surge.surge_multiplier),
            ("rain_surge_multiplier", self.surge.rain_surge_multiplier),
        ] {
            if !m.is_finite() || m < 1.0 {
                return Err(format!("{label} must be at least 1.0"));
            }
        }

        if !self.cod.flat_fee.is_finite() || self.cod.flat_fee < 0.0 {
            return Err("cod flat_fee must be a non-negative number".to_string());
        }
        if !self.cod.percent.is_finite() || !(0.0..100.0).contains(&self.cod.percent) {
            return Err("cod percent must be in [0, 100)".to_string());
        }

        if self.dispatch.default_cap == 0 || self.dispatch.rider_caps.values().any(|c| *c == 0) {
            return Err("rider caps must be at least 1".to_string());
        }

        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            AppError::ConfigurationMissing(format!("{}: {err}", path.display()))
        })?;
        let settings: Self = serde_json::from_str(&raw).map_err(|err| {
            AppError::ConfigurationMissing(format!("{}: {err}", path.display()))
        })?;
        settings.validate().map_err(AppError::InvalidInput)?;
        Ok(settings)
    }

    /// Initial document for the process: the file at `path` when it parses
    /// and validates, the built-in defaults otherwise. Missing configuration
    /// degrades to defaults instead of failing fare calculation.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match path {
            None => Self::default(),
            Some(path) => Self::load(path).unwrap_or_else(|err| {
                warn!(error = %err, "settings not loaded; using built-in defaults");
                Self::default()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn window_matches_half_open_range() {
        let window = SurgeWindow {
            start: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        };

        assert!(window.contains(NaiveTime::from_hms_opt(7, 0, 0).unwrap()));
        assert!(window.contains(NaiveTime::from_hms_opt(9, 59, 59).unwrap()));
        assert!(!window.contains(NaiveTime::from_hms_opt(10, 0, 0).unwrap()));
        assert!(!window.contains(NaiveTime::from_hms_opt(6, 59, 59).unwrap()));
    }

    #[test]
    fn window_wraps_past_midnight() {
        let window = SurgeWindow {
            start: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(2, 0, 0).unwrap(),
        };

        assert!(window.contains(NaiveTime::from_hms_opt(23, 30, 0).unwrap()));
        assert!(window.contains(NaiveTime::from_hms_opt(1, 0, 0).unwrap()));
        assert!(!window.contains(NaiveTime::from_hms_opt(12, 0, 0).unwrap()));
    }

    #[test]
    fn surge_uses_local_time_offset() {
        let surge = SurgeConfig::default();

        // 17:30 UTC is 18:30 in Lagos, inside the evening window.
        let evening = Utc.with_ymd_and_hms(2024, 3, 12, 17, 30, 0).unwrap();
        assert_eq!(surge.multiplier_at(evening, false), 1.5);

        // 12:00 UTC is 13:00 in Lagos, outside both windows.
        let midday = Utc.with_ymd_and_hms(2024, 3, 12, 12, 0, 0).unwrap();
        assert_eq!(surge.multiplier_at(midday, false), 1.0);
    }

    #[test]
    fn larger_surge_source_wins_without_stacking() {
        let surge = SurgeConfig::default();
        let evening = Utc.with_ymd_and_hms(2024, 3, 12, 17, 30, 0).unwrap();
        let midday = Utc.with_ymd_and_hms(2024, 3, 12, 12, 0, 0).unwrap();

        // Window surge (1.5) beats rain surge (1.3); they never multiply.
        assert_eq!(surge.multiplier_at(evening, true), 1.5);
        assert_eq!(surge.multiplier_at(midday, true), 1.3);
    }

    #[test]
    fn default_settings_validate() {
        assert!(SystemSettings::default().validate().is_ok());
    }

    #[test]
    fn validation_rejects_inverted_tiers() {
        let mut settings = SystemSettings::default();
        settings.surcharge.tier2_km = 10.0;
        settings.surcharge.tier1_km = 15.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn validation_rejects_duplicate_vehicle_names() {
        let mut settings = SystemSettings::default();
        let mut dup = settings.tariffs.vehicles[0].clone();
        dup.name = "bike".to_string();
        settings.tariffs.vehicles.push(dup);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn validation_rejects_sub_unity_multiplier() {
        let mut settings = SystemSettings::default();
        settings.surge.surge_multiplier = 0.8;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn cap_lookup_is_case_insensitive_with_default() {
        let dispatch = DispatchConfig::default();
        assert_eq!(dispatch.cap_for("bike"), 2);
        assert_eq!(dispatch.cap_for("Van"), 1);
        assert_eq!(dispatch.cap_for("Keke"), 1);
    }
}
