//! Climate math — seasonal temperature swing and heat-scaled thirst.

/// Seasonal temperature offset for a 1-based month. Winter (month 1) is
/// coldest, midsummer warmest, amplitude ±8°.
pub fn seasonal_offset(month: u32) -> f32 {
    let angle = ((month.saturating_sub(1)) as f32 / 12.0) * std::f32::consts::TAU;
    angle.cos() * 8.0
}

/// Instantaneous tile temperature from its generated base, the season,
/// and an altitude penalty of 10° per unit of elevation.
pub fn tile_temperature(base_temp: f32, month: u32, elevation: f32) -> f32 {
    base_temp + seasonal_offset(month) - elevation * 10.0
}

/// Thirst accrual per second; heat above 15° accelerates it.
pub fn thirst_rate(temperature: f32) -> f32 {
    0.6 + (temperature - 15.0).max(0.0) * 0.015
}
