use crate::config::const_funcs::calc_annual_energy_mwh;

/// Annual energy output in MWh: capacity x capacity factor x 8760 h.
/// No bounds checking; a zero capacity factor gives zero generation.
pub fn estimate_annual_generation(capacity_mw: f64, capacity_factor: f64) -> f64 {
    calc_annual_energy_mwh(capacity_mw, capacity_factor)
}

/// Emissions per unit of generation (tons/MWh). `None` instead of an
/// infinite or NaN ratio when generation is not positive and finite.
pub fn estimate_co2_intensity(annual_co2eq_tons: f64, annual_generation_mwh: f64) -> Option<f64> {
    if annual_generation_mwh > 0.0 && annual_generation_mwh.is_finite() && annual_co2eq_tons.is_finite() {
        Some(annual_co2eq_tons / annual_generation_mwh)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_formula() {
        assert_eq!(estimate_annual_generation(500.0, 0.6), 2_628_000.0);
        assert_eq!(estimate_annual_generation(500.0, 0.0), 0.0);
        assert_eq!(estimate_annual_generation(0.0, 0.9), 0.0);
    }

    #[test]
    fn intensity_guards_zero_generation() {
        assert_eq!(estimate_co2_intensity(1000.0, 0.0), None);
        assert_eq!(estimate_co2_intensity(1000.0, 500.0), Some(2.0));
    }
}
