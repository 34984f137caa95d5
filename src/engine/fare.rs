use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::order::ZoneClass;
use crate::models::quote::FareQuote;
use crate::models::settings::{CodConfig, SurchargeConfig, SurgeConfig, VehicleClass};

/// Computes one fare quote for a resolved route. Pure function of its
/// inputs and the supplied configuration snapshot.
///
/// Layer order is fixed: base + distance + time, minimum-fee floor, tier
/// discount, zone surcharge, weight surcharge, then the surge multiplier over
/// the whole running total. Routes at or under the vehicle's minimum distance
/// charge the flat minimum fee; only surge applies on top of it.
pub fn calculate(
    vehicle: &VehicleClass,
    distance_km: f64,
    duration_minutes: i64,
    zone: ZoneClass,
    weight_kg: f64,
    at: DateTime<Utc>,
    weather_is_rainy: bool,
    surcharge: &SurchargeConfig,
    surge: &SurgeConfig,
) -> Result<FareQuote, AppError> {
    if !distance_km.is_finite() || distance_km < 0.0 {
        return Err(AppError::InvalidInput(format!(
            "distance_km must be a non-negative number, got {distance_km}"
        )));
    }
    if duration_minutes < 0 {
        return Err(AppError::InvalidInput(format!(
            "duration_minutes must be non-negative, got {duration_minutes}"
        )));
    }
    if !weight_kg.is_finite() || weight_kg < 0.0 {
        return Err(AppError::InvalidInput(format!(
            "weight_kg must be a non-negative number, got {weight_kg}"
        )));
    }

    let base_component = vehicle.base_fare;
    let distance_component = distance_km * vehicle.rate_per_km;
    let time_component = duration_minutes as f64 * vehicle.rate_per_minute;
    let raw = base_component + distance_component + time_component;

    let short_route = distance_km <= vehicle.min_distance_km;
    let min_fee_applied = short_route || raw < vehicle.min_fee;

    let mut tier_discount_applied_pct = 0.0;
    let mut zone_surcharge = 0.0;
    let mut weight_surcharge = 0.0;

    let pre_surge_total = if short_route {
        vehicle.min_fee
    } else {
        let mut total = if min_fee_applied { vehicle.min_fee } else { raw };

        if surcharge.tier_enabled {
            let pct = if distance_km >= surcharge.tier2_km {
                surcharge.tier2_discount_pct
            } else if distance_km >= surcharge.tier1_km {
                surcharge.tier1_discount_pct
            } else {
                0.0
            };
            if pct > 0.0 {
                tier_discount_applied_pct = pct;
                // The floor itself is never discounted.
                total = (total * (1.0 - pct / 100.0)).max(vehicle.min_fee);
            }
        }

        zone_surcharge = match zone {
            ZoneClass::SameArea => 0.0,
            ZoneClass::BridgeCrossing => surcharge.bridge_surcharge,
            ZoneClass::Island => surcharge.island_premium,
            ZoneClass::OuterLagos => surcharge.outer_zone_surcharge,
        };
        total += zone_surcharge;

        if weight_kg > surcharge.weight_threshold_kg {
            let units =
                ((weight_kg - surcharge.weight_threshold_kg) / surcharge.weight_unit_kg).ceil();
            weight_surcharge = units * surcharge.weight_surcharge_per_unit;
            total += weight_surcharge;
        }

        total
    };

    let surge_multiplier_applied = surge.multiplier_at(at, weather_is_rainy);
    let final_price = (pre_surge_total * surge_multiplier_applied).round() as i64;

    Ok(FareQuote {
        base_component,
        distance_component,
        time_component,
        min_fee_applied,
        tier_discount_applied_pct,
        zone_surcharge,
        weight_surcharge,
        pre_surge_total,
        surge_multiplier_applied,
        final_price,
    })
}

/// Cash-on-delivery handling fee, charged when the rider collects cash at
/// dropoff. Separate from the delivery fare.
pub fn cod_fee(cod_amount: i64, cod: &CodConfig) -> i64 {
    if cod_amount <= 0 {
        return 0;
    }
    (cod.flat_fee + cod_amount as f64 * cod.percent / 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::{calculate, cod_fee};
    use crate::models::order::ZoneClass;
    use crate::models::settings::{SurchargeConfig, SurgeConfig, SystemSettings, VehicleClass};

    fn bike() -> VehicleClass {
        SystemSettings::default()
            .tariffs
            .find("Bike")
            .cloned()
            .unwrap()
    }

    fn surcharge() -> SurchargeConfig {
        SurchargeConfig::default()
    }

    fn surge() -> SurgeConfig {
        SurgeConfig::default()
    }

    /// 12:00 UTC = 13:00 Lagos, outside both surge windows.
    fn off_peak() -> chrono::DateTime<chrono::Utc> {
        chrono::Utc.with_ymd_and_hms(2024, 3, 12, 12, 0, 0).unwrap()
    }

    /// 17:30 UTC = 18:30 Lagos, inside the evening surge window.
    fn evening_peak() -> chrono::DateTime<chrono::Utc> {
        chrono::Utc.with_ymd_and_hms(2024, 3, 12, 17, 30, 0).unwrap()
    }

    #[test]
    fn bridge_route_prices_to_2700() {
        let quote = calculate(
            &bike(),
            10.0,
            20,
            ZoneClass::BridgeCrossing,
            3.0,
            off_peak(),
            false,
            &surcharge(),
            &surge(),
        )
        .unwrap();

        assert_eq!(quote.base_component, 500.0);
        assert_eq!(quote.distance_component, 1500.0);
        assert_eq!(quote.time_component, 200.0);
        assert!(!quote.min_fee_applied);
        assert_eq!(quote.tier_discount_applied_pct, 0.0);
        assert_eq!(quote.zone_surcharge, 500.0);
        assert_eq!(quote.weight_surcharge, 0.0);
        assert_eq!(quote.pre_surge_total, 2700.0);
        assert_eq!(quote.surge_multiplier_applied, 1.0);
        assert_eq!(quote.final_price, 2700);
    }

    #[test]
    fn evening_surge_multiplies_the_whole_total() {
        let quote = calculate(
            &bike(),
            10.0,
            20,
            ZoneClass::BridgeCrossing,
            3.0,
            evening_peak(),
            false,
            &surcharge(),
            &surge(),
        )
        .unwrap();

        assert_eq!(quote.pre_surge_total, 2700.0);
        assert_eq!(quote.surge_multiplier_applied, 1.5);
        assert_eq!(quote.final_price, 4050);
    }

    #[test]
    fn short_route_charges_flat_minimum_fee() {
        for zone in [
            ZoneClass::SameArea,
            ZoneClass::BridgeCrossing,
            ZoneClass::Island,
            ZoneClass::OuterLagos,
        ] {
            let quote = calculate(
                &bike(),
                1.0,
                15,
                zone,
                9.0,
                off_peak(),
                false,
                &surcharge(),
                &surge(),
            )
            .unwrap();

            assert!(quote.min_fee_applied);
            assert_eq!(quote.final_price, 1200);
        }
    }

    #[test]
    fn short_route_minimum_fee_still_surges() {
        let quote = calculate(
            &bike(),
            1.0,
            15,
            ZoneClass::SameArea,
            0.0,
            evening_peak(),
            false,
            &surcharge(),
            &surge(),
        )
        .unwrap();

        assert_eq!(quote.final_price, 1800);
    }

    #[test]
    fn cheap_route_above_min_distance_floors_to_min_fee() {
        // 2.5 km, no time: raw = 500 + 375 = 875, under the 1200 floor.
        let quote = calculate(
            &bike(),
            2.5,
            0,
            ZoneClass::SameArea,
            0.0,
            off_peak(),
            false,
            &surcharge(),
            &surge(),
        )
        .unwrap();

        assert!(quote.min_fee_applied);
        assert_eq!(quote.pre_surge_total, 1200.0);
        assert_eq!(quote.final_price, 1200);
    }

    #[test]
    fn tier_discounts_kick_in_by_band() {
        // 20 km sits in tier 1: raw = 500 + 3000 + 300 = 3800, minus 5%.
        let tier1 = calculate(
            &bike(),
            20.0,
            30,
            ZoneClass::SameArea,
            0.0,
            off_peak(),
            false,
            &surcharge(),
            &surge(),
        )
        .unwrap();
        assert_eq!(tier1.tier_discount_applied_pct, 5.0);
        assert_eq!(tier1.final_price, 3610);

        // 35 km sits in tier 2: raw = 500 + 5250 + 300 = 6050, minus 10%.
        let tier2 = calculate(
            &bike(),
            35.0,
            30,
            ZoneClass::SameArea,
            0.0,
            off_peak(),
            false,
            &surcharge(),
            &surge(),
        )
        .unwrap();
        assert_eq!(tier2.tier_discount_applied_pct, 10.0);
        assert_eq!(tier2.final_price, 5445);
    }

    #[test]
    fn tier_discount_never_undercuts_the_floor() {
        let mut cheap = bike();
        cheap.rate_per_km = 10.0;
        // 16 km: raw = 500 + 160 = 660, floored to 1200, then the tier 1
        // discount would drop it to 1140 without the clamp.
        let quote = calculate(
            &cheap,
            16.0,
            0,
            ZoneClass::SameArea,
            0.0,
            off_peak(),
            false,
            &surcharge(),
            &surge(),
        )
        .unwrap();

        assert!(quote.min_fee_applied);
        assert_eq!(quote.tier_discount_applied_pct, 5.0);
        assert_eq!(quote.final_price, 1200);
    }

    #[test]
    fn weight_surcharge_rounds_units_up() {
        // 7.2 kg over a 5 kg threshold in 1 kg units: 3 units of 100.
        let quote = calculate(
            &bike(),
            10.0,
            0,
            ZoneClass::SameArea,
            7.2,
            off_peak(),
            false,
            &surcharge(),
            &surge(),
        )
        .unwrap();

        assert_eq!(quote.weight_surcharge, 300.0);
    }

    #[test]
    fn price_is_non_decreasing_within_a_tier_band() {
        let mut last = 0;
        for tenth_km in 30..140 {
            let distance_km = tenth_km as f64 / 10.0;
            let quote = calculate(
                &bike(),
                distance_km,
                20,
                ZoneClass::SameArea,
                0.0,
                off_peak(),
                false,
                &surcharge(),
                &surge(),
            )
            .unwrap();
            assert!(
                quote.final_price >= last,
                "price dropped at {distance_km} km"
            );
            last = quote.final_price;
        }
    }

    #[test]
    fn surge_price_equals_scaled_no_surge_price() {
        let base = calculate(
            &bike(),
            22.0,
            35,
            ZoneClass::Island,
            8.0,
            off_peak(),
            false,
            &surcharge(),
            &surge(),
        )
        .unwrap();
        let surged = calculate(
            &bike(),
            22.0,
            35,
            ZoneClass::Island,
            8.0,
            evening_peak(),
            false,
            &surcharge(),
            &surge(),
        )
        .unwrap();

        assert_eq!(base.surge_multiplier_applied, 1.0);
        assert_eq!(
            surged.final_price,
            (base.pre_surge_total * 1.5).round() as i64
        );
    }

    #[test]
    fn rain_surge_applies_off_peak_but_loses_to_window_surge() {
        let rainy_off_peak = calculate(
            &bike(),
            10.0,
            20,
            ZoneClass::SameArea,
            0.0,
            off_peak(),
            true,
            &surcharge(),
            &surge(),
        )
        .unwrap();
        assert_eq!(rainy_off_peak.surge_multiplier_applied, 1.3);

        let rainy_peak = calculate(
            &bike(),
            10.0,
            20,
            ZoneClass::SameArea,
            0.0,
            evening_peak(),
            true,
            &surcharge(),
            &surge(),
        )
        .unwrap();
        assert_eq!(rainy_peak.surge_multiplier_applied, 1.5);
    }

    #[test]
    fn negative_inputs_are_rejected() {
        for (distance, duration, weight) in
            [(-1.0, 10, 0.0), (5.0, -1, 0.0), (5.0, 10, -0.5)]
        {
            let result = calculate(
                &bike(),
                distance,
                duration,
                ZoneClass::SameArea,
                weight,
                off_peak(),
                false,
                &surcharge(),
                &surge(),
            );
            assert!(result.is_err());
        }
    }

    #[test]
    fn cod_fee_is_flat_plus_percentage() {
        let cod = SystemSettings::default().cod;
        assert_eq!(cod_fee(0, &cod), 0);
        assert_eq!(cod_fee(10_000, &cod), 250);
    }
}
