//! Settlement scoring, stage thresholds, and gold accrual.

/// Aggregate settlement score from population and building counts,
/// clamped to 1.0. Gates stages, tribe formation and era display.
pub fn settlement_score(population: usize, buildings: usize) -> f32 {
    raw_score(population, buildings).min(1.0)
}

/// Unclamped variant used by the construction tier ladder.
pub fn raw_score(population: usize, buildings: usize) -> f32 {
    population as f32 * 0.03 + buildings as f32 * 0.08
}

/// Score above which villages form and professions emerge.
pub const VILLAGE_THRESHOLD: f32 = 0.25;

/// Score above which organized farming begins.
pub const FARM_THRESHOLD: f32 = 0.55;

/// Score above which industry (and with it medicine) arrives.
pub const INDUSTRY_THRESHOLD: f32 = 0.82;

/// Score above which the settlement closes ranks into a tribe.
pub const TRIBE_THRESHOLD: f32 = 0.5;

/// Faith level that unlocks religion during an active prophet call.
pub const RELIGION_CALL_FAITH: f32 = 40.0;

/// Faith level that unlocks religion spontaneously.
pub const RELIGION_SPONTANEOUS_FAITH: f32 = 60.0;

/// Gold earned per second. A city hall administration collects far more
/// efficiently than the baseline.
pub fn gold_rate(population: usize, buildings: usize, has_city_hall: bool) -> f32 {
    let admin = if has_city_hall { 1.2 } else { 0.2 };
    population as f32 * 0.1 + buildings as f32 * 0.15 + admin
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_clamped() {
        assert!(settlement_score(1000, 1000) <= 1.0);
        assert!(raw_score(1000, 1000) > 1.0);
    }

    #[test]
    fn test_score_components() {
        assert!((settlement_score(2, 0) - 0.06).abs() < 0.001);
        assert!((settlement_score(0, 3) - 0.24).abs() < 0.001);
    }

    #[test]
    fn test_stage_thresholds_ordered() {
        assert!(VILLAGE_THRESHOLD < TRIBE_THRESHOLD);
        assert!(TRIBE_THRESHOLD < FARM_THRESHOLD);
        assert!(FARM_THRESHOLD < INDUSTRY_THRESHOLD);
    }

    #[test]
    fn test_city_hall_gold_bonus() {
        let without = gold_rate(10, 5, false);
        let with = gold_rate(10, 5, true);
        assert!((with - without - 1.0).abs() < 0.001);
    }
}
