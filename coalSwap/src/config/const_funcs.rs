use crate::config::constants::HOURS_PER_YEAR;

/// Present-value factor for a cash flow `year` years out.
pub fn calc_discount_factor(discount_rate: f64, year: u32) -> f64 {
    1.0 / (1.0 + discount_rate).powi(year as i32)
}

/// Compound growth applied to a year-1 value; year 1 is unscaled.
pub fn calc_growth_factor(annual_rate: f64, year: u32) -> f64 {
    (1.0 + annual_rate).powi(year.saturating_sub(1) as i32)
}

/// Remaining output fraction of a degrading asset in `year`; year 1 is full output.
pub fn calc_degradation_factor(annual_degradation: f64, year: u32) -> f64 {
    (1.0 - annual_degradation).powi(year.saturating_sub(1) as i32)
}

pub fn calc_annual_energy_mwh(capacity_mw: f64, capacity_factor: f64) -> f64 {
    capacity_mw * capacity_factor * HOURS_PER_YEAR
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
