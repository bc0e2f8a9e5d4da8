//! Discounted total-cost-of-ownership comparison between keeping a coal
//! plant running and replacing it with an equal-energy solar plant.
//!
//! Timing convention (see [`TcoAssumptions`]): solar net capex sits
//! undiscounted at year 0; operating costs for both technologies fall in
//! years `1..=horizon_years - 1`, each discounted by `(1 + r)^t`.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::const_funcs::{calc_degradation_factor, calc_discount_factor, calc_growth_factor};
use crate::config::constants::{BTU_PER_MMBTU, HOURS_PER_YEAR, MILLION};
use crate::config::scenario_config::{BatchConfig, TcoAssumptions};
use crate::error::{ConfigError, PlantIssue};
use crate::models::plant::PlantRecord;
use crate::models::tco::{CoalCostBreakdown, SolarReplacement, TcoResult};
use crate::utils::logging::{self, ComputeType, OperationCategory};

/// TCO results for a batch of coal plants, plus the plants that had to be
/// set aside.
#[derive(Debug, Clone, Default)]
pub struct TcoBatch {
    pub results: Vec<TcoResult>,
    pub issues: Vec<PlantIssue>,
}

impl TcoBatch {
    pub fn total_pv_gain_million_usd(&self) -> f64 {
        self.results.iter().map(|r| r.pv_gain_million_usd).sum()
    }
}

#[derive(Debug, Clone)]
pub struct TcoModel {
    assumptions: TcoAssumptions,
}

impl TcoModel {
    pub fn new(assumptions: TcoAssumptions) -> Result<Self, ConfigError> {
        assumptions.validate()?;
        Ok(Self { assumptions })
    }

    pub fn coal_costs(&self, capacity_mw: f64, generation_mwh: f64, co2_tons: f64) -> CoalCostBreakdown {
        let a = &self.assumptions;
        let fuel_cost_per_mwh = (a.coal_heat_rate_btu_per_mwh / BTU_PER_MMBTU) * a.coal_price_per_mmbtu;
        CoalCostBreakdown {
            fixed_om: capacity_mw * a.coal_fixed_om_per_mw,
            variable_om: generation_mwh * a.coal_variable_om_per_mwh,
            fuel_cost: generation_mwh * fuel_cost_per_mwh,
            scc_cost: co2_tons * a.scc_price_per_ton,
        }
    }

    /// Coal cost in year `t` (undiscounted, USD).
    pub fn coal_cost_in_year(&self, costs: &CoalCostBreakdown, year: u32) -> f64 {
        costs.annual_total() * calc_growth_factor(self.assumptions.coal_escalation, year)
    }

    pub fn coal_tco_million(&self, costs: &CoalCostBreakdown) -> f64 {
        let r = self.assumptions.discount_rate;
        self.assumptions
            .operating_years()
            .map(|t| self.coal_cost_in_year(costs, t) * calc_discount_factor(r, t) / MILLION)
            .sum()
    }

    pub fn size_solar(&self, generation_mwh: f64) -> SolarReplacement {
        let a = &self.assumptions;
        let solar_mw = generation_mwh / (a.solar_capacity_factor * HOURS_PER_YEAR);
        let gross_capex = solar_mw * a.solar_capex_per_mw;
        let itc = gross_capex * a.itc_rate;
        SolarReplacement {
            solar_mw,
            gross_capex,
            itc,
            net_capex: gross_capex - itc,
            annual_om: solar_mw * a.solar_om_per_mw,
            annual_generation_mwh: solar_mw * a.solar_capacity_factor * HOURS_PER_YEAR,
        }
    }

    /// Solar O&M in year `t` (undiscounted, USD).
    pub fn solar_om_in_year(&self, solar: &SolarReplacement, year: u32) -> f64 {
        solar.annual_om * calc_growth_factor(self.assumptions.solar_om_escalation, year)
    }

    pub fn solar_tco_million(&self, solar: &SolarReplacement) -> f64 {
        let r = self.assumptions.discount_rate;
        let operating: f64 = self
            .assumptions
            .operating_years()
            .map(|t| self.solar_om_in_year(solar, t) * calc_discount_factor(r, t) / MILLION)
            .sum();
        solar.net_capex / MILLION + operating
    }

    /// Discounted cost divided by discounted delivered energy, in USD/MWh.
    fn levelized_cost(&self, discounted_cost: f64, energy_in_year: impl Fn(u32) -> f64) -> Option<f64> {
        let r = self.assumptions.discount_rate;
        let discounted_energy: f64 = self
            .assumptions
            .operating_years()
            .map(|t| energy_in_year(t) * calc_discount_factor(r, t))
            .sum();
        (discounted_energy > 0.0).then(|| discounted_cost / discounted_energy)
    }

    /// Full comparison for one coal plant. Plants whose inputs would make the
    /// solar sizing or cost streams meaningless come back as a [`PlantIssue`].
    pub fn evaluate(&self, plant: &PlantRecord) -> Result<TcoResult, PlantIssue> {
        let capacity_mw = match plant.nameplate_capacity_mw {
            Some(c) if c.is_finite() && c >= 0.0 => c,
            Some(c) => {
                return Err(PlantIssue::InvalidValue {
                    plant_id: plant.plant_id,
                    field: "nameplate_capacity_mw".to_string(),
                    value: c,
                })
            }
            None => {
                return Err(PlantIssue::MissingValue {
                    plant_id: plant.plant_id,
                    field: "nameplate_capacity_mw".to_string(),
                })
            }
        };
        let capacity_factor = match plant.capacity_factor {
            Some(cf) if cf.is_finite() && cf > 0.0 => cf,
            other => {
                return Err(PlantIssue::InvalidCapacityFactor {
                    plant_id: plant.plant_id,
                    value: other,
                })
            }
        };
        let co2_tons = match plant.annual_co2eq_tons {
            Some(t) if t.is_finite() => t,
            _ => {
                return Err(PlantIssue::MissingValue {
                    plant_id: plant.plant_id,
                    field: "annual_co2eq_tons".to_string(),
                })
            }
        };

        let generation_mwh = plant.annual_generation_mwh();
        // Zero output leaves nothing to replace and no LCOE denominator.
        if !(generation_mwh > 0.0) {
            return Err(PlantIssue::ZeroGeneration {
                plant_id: plant.plant_id,
                capacity_mw,
                capacity_factor,
            });
        }
        let coal_costs = self.coal_costs(capacity_mw, generation_mwh, co2_tons);
        let coal_tco = self.coal_tco_million(&coal_costs);

        let solar = self.size_solar(generation_mwh);
        let solar_tco = self.solar_tco_million(&solar);

        let coal_lcoe = self.levelized_cost(coal_tco * MILLION, |_| generation_mwh);
        let degradation = self.assumptions.solar_degradation;
        let solar_lcoe = self.levelized_cost(solar_tco * MILLION, |t| {
            solar.annual_generation_mwh * calc_degradation_factor(degradation, t)
        });

        debug!(
            plant_id = plant.plant_id,
            coal_tco, solar_tco, solar_mw = solar.solar_mw,
            "evaluated plant"
        );

        Ok(TcoResult {
            plant_id: plant.plant_id,
            name: plant.name.clone(),
            state: plant.state.clone(),
            coal_tco_million_usd: coal_tco,
            solar_tco_million_usd: solar_tco,
            pv_gain_million_usd: coal_tco - solar_tco,
            co2_avoided_tons_per_year: co2_tons,
            solar_mw_required: solar.solar_mw,
            coal_lcoe_usd_per_mwh: coal_lcoe,
            solar_lcoe_usd_per_mwh: solar_lcoe,
            latitude: plant.latitude,
            longitude: plant.longitude,
        })
    }

    /// Evaluates every plant chunk by chunk. Output order follows input order
    /// whether or not the chunks run in parallel.
    #[tracing::instrument(skip_all, fields(plants = plants.len(), parallel = batch.parallel))]
    pub fn evaluate_all(&self, plants: &[PlantRecord], batch: &BatchConfig) -> TcoBatch {
        let _timing = logging::start_timing("evaluate_all",
            OperationCategory::Computation { subcategory: ComputeType::Tco });

        let chunk_size = batch.chunk_size.max(1);
        let evaluate_chunk = |chunk: &[PlantRecord]| -> Vec<Result<TcoResult, PlantIssue>> {
            chunk.iter().map(|plant| self.evaluate(plant)).collect()
        };

        let outcomes: Vec<Result<TcoResult, PlantIssue>> = if batch.parallel {
            plants.par_chunks(chunk_size).flat_map_iter(evaluate_chunk).collect()
        } else {
            plants.chunks(chunk_size).flat_map(evaluate_chunk).collect()
        };

        let mut out = TcoBatch::default();
        for outcome in outcomes {
            match outcome {
                Ok(result) => out.results.push(result),
                Err(issue) => {
                    warn!("{}", issue);
                    out.issues.push(issue);
                }
            }
        }

        info!(
            evaluated = out.results.len(),
            excluded = out.issues.len(),
            "TCO evaluation complete"
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::plant::FuelType;

    fn coal_plant(capacity_mw: f64, capacity_factor: Option<f64>, co2: f64) -> PlantRecord {
        PlantRecord {
            plant_id: 42,
            name: "Example Station".to_string(),
            state: "KY".to_string(),
            latitude: Some(37.5),
            longitude: Some(-87.0),
            fuel_type: FuelType::Coal,
            nameplate_capacity_mw: Some(capacity_mw),
            capacity_factor,
            annual_co2eq_tons: Some(co2),
        }
    }

    fn model() -> TcoModel {
        TcoModel::new(TcoAssumptions::default()).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn coal_stream_matches_direct_sum() {
        let m = model();
        let plant = coal_plant(500.0, Some(0.6), 2_000_000.0);
        let result = m.evaluate(&plant).unwrap();

        let gen = 500.0 * 0.6 * 8760.0;
        assert_eq!(gen, 2_628_000.0);
        let costs = m.coal_costs(500.0, gen, 2_000_000.0);
        assert_eq!(costs.scc_cost, 100_000_000.0);

        let annual = 500.0 * 45_680.0 + gen * 5.06 + gen * 8.638 * 2.5 + 100_000_000.0;
        let expected: f64 = (1..=39).map(|t| annual / 1.05f64.powi(t)).sum::<f64>() / 1e6;
        assert!(close(result.coal_tco_million_usd, expected));
    }

    #[test]
    fn solar_sizing_and_itc() {
        let m = model();
        let solar = m.size_solar(2_628_000.0);
        assert!(close(solar.solar_mw, 1200.0));
        assert!(close(solar.itc, 0.30 * solar.gross_capex));
        assert!(close(solar.net_capex, 0.70 * solar.gross_capex));
        assert!(close(solar.gross_capex, 1200.0 * 1_448_000.0));
    }

    #[test]
    fn solar_capex_is_undiscounted_year_zero() {
        let m = model();
        let solar = m.size_solar(2_628_000.0);
        let om: f64 = (1..=39).map(|t| solar.annual_om / 1.05f64.powi(t)).sum();
        assert!(close(m.solar_tco_million(&solar), (solar.net_capex + om) / 1e6));
    }

    #[test]
    fn pv_gain_is_exact_difference() {
        let result = model().evaluate(&coal_plant(800.0, Some(0.45), 4_100_000.0)).unwrap();
        assert_eq!(
            result.pv_gain_million_usd,
            result.coal_tco_million_usd - result.solar_tco_million_usd
        );
    }

    #[test]
    fn zero_capacity_factor_is_isolated() {
        let err = model().evaluate(&coal_plant(500.0, Some(0.0), 1.0)).unwrap_err();
        assert_eq!(err, PlantIssue::InvalidCapacityFactor { plant_id: 42, value: Some(0.0) });

        let err = model().evaluate(&coal_plant(500.0, None, 1.0)).unwrap_err();
        assert!(matches!(err, PlantIssue::InvalidCapacityFactor { value: None, .. }));
    }

    #[test]
    fn zero_capacity_is_isolated() {
        let err = model().evaluate(&coal_plant(0.0, Some(0.5), 1000.0)).unwrap_err();
        assert_eq!(
            err,
            PlantIssue::ZeroGeneration { plant_id: 42, capacity_mw: 0.0, capacity_factor: 0.5 }
        );
    }

    #[test]
    fn missing_emissions_are_isolated() {
        let plant = PlantRecord { annual_co2eq_tons: None, ..coal_plant(500.0, Some(0.5), 0.0) };
        assert!(matches!(model().evaluate(&plant), Err(PlantIssue::MissingValue { .. })));
    }

    #[test]
    fn zero_rates_reproduce_flat_streams() {
        let flat = model();
        let explicit = TcoModel::new(TcoAssumptions {
            coal_escalation: 0.0,
            solar_om_escalation: 0.0,
            solar_degradation: 0.0,
            ..TcoAssumptions::default()
        })
        .unwrap();
        let plant = coal_plant(650.0, Some(0.52), 3_300_000.0);
        assert_eq!(flat.evaluate(&plant).unwrap(), explicit.evaluate(&plant).unwrap());
    }

    #[test]
    fn escalation_raises_coal_cost() {
        let plant = coal_plant(650.0, Some(0.52), 3_300_000.0);
        let base = model().evaluate(&plant).unwrap();
        let escalated = TcoModel::new(TcoAssumptions { coal_escalation: 0.02, ..TcoAssumptions::default() })
            .unwrap()
            .evaluate(&plant)
            .unwrap();
        assert!(escalated.coal_tco_million_usd > base.coal_tco_million_usd);
        assert_eq!(escalated.solar_tco_million_usd, base.solar_tco_million_usd);
    }

    #[test]
    fn degradation_raises_solar_lcoe_only() {
        let plant = coal_plant(650.0, Some(0.52), 3_300_000.0);
        let base = model().evaluate(&plant).unwrap();
        let degraded = TcoModel::new(TcoAssumptions { solar_degradation: 0.005, ..TcoAssumptions::default() })
            .unwrap()
            .evaluate(&plant)
            .unwrap();
        assert!(degraded.solar_lcoe_usd_per_mwh.unwrap() > base.solar_lcoe_usd_per_mwh.unwrap());
        assert_eq!(degraded.solar_tco_million_usd, base.solar_tco_million_usd);
    }

    #[test]
    fn batch_splits_results_and_issues_in_order() {
        let plants = vec![
            PlantRecord { plant_id: 1, ..coal_plant(100.0, Some(0.5), 500_000.0) },
            PlantRecord { plant_id: 2, ..coal_plant(100.0, Some(0.0), 500_000.0) },
            PlantRecord { plant_id: 3, ..coal_plant(300.0, Some(0.7), 1_500_000.0) },
        ];
        let batch = model().evaluate_all(&plants, &BatchConfig { chunk_size: 2, parallel: false });
        let ids: Vec<_> = batch.results.iter().map(|r| r.plant_id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(batch.issues.len(), 1);
        assert_eq!(batch.issues[0].plant_id(), 2);
    }

    #[test]
    fn parallel_matches_sequential() {
        let plants: Vec<_> = (0..100)
            .map(|i| PlantRecord {
                plant_id: i,
                ..coal_plant(50.0 + i as f64 * 7.0, Some(0.2 + (i % 7) as f64 * 0.1), 10_000.0 * i as f64)
            })
            .collect();
        let m = model();
        let seq = m.evaluate_all(&plants, &BatchConfig { chunk_size: 16, parallel: false });
        let par = m.evaluate_all(&plants, &BatchConfig { chunk_size: 16, parallel: true });
        assert_eq!(seq.results, par.results);
    }
}
