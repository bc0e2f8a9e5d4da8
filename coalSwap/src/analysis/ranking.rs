use std::cmp::Ordering;

use crate::models::plant::PlantRecord;
use crate::utils::logging::{self, ComputeType, OperationCategory};

/// A plant with its position in the descending emissions order. Tied plants
/// share the average of the positions they span, so a rank can be fractional.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedPlant {
    pub plant: PlantRecord,
    pub co2eq_tons: f64,
    pub rank: f64,
}

/// Number of plants in the top `fraction` of `n`, rounded down.
pub fn top_fraction_count(n: usize, fraction: f64) -> usize {
    (n as f64 * fraction).floor() as usize
}

/// Assigns 1-based average ranks to values already sorted in descending order.
fn average_ranks(sorted_desc: &[f64]) -> Vec<f64> {
    let mut ranks = vec![0.0; sorted_desc.len()];
    let mut start = 0;
    while start < sorted_desc.len() {
        let mut end = start + 1;
        while end < sorted_desc.len() && sorted_desc[end] == sorted_desc[start] {
            end += 1;
        }
        // positions start+1 ..= end
        let avg = (start + 1 + end) as f64 / 2.0;
        for rank in &mut ranks[start..end] {
            *rank = avg;
        }
        start = end;
    }
    ranks
}

/// Ranks plants by annual CO2eq, highest first. Plants without an emissions
/// value are left out. Ties keep their source order.
pub fn rank_by_emissions(plants: &[PlantRecord]) -> Vec<RankedPlant> {
    let _timing = logging::start_timing("rank_by_emissions",
        OperationCategory::Computation { subcategory: ComputeType::Ranking });

    let mut with_emissions: Vec<(&PlantRecord, f64)> = plants
        .iter()
        .filter_map(|p| p.annual_co2eq_tons.filter(|t| t.is_finite()).map(|t| (p, t)))
        .collect();
    with_emissions.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let values: Vec<f64> = with_emissions.iter().map(|(_, t)| *t).collect();
    let ranks = average_ranks(&values);

    with_emissions
        .into_iter()
        .zip(ranks)
        .map(|((plant, co2eq_tons), rank)| RankedPlant {
            plant: plant.clone(),
            co2eq_tons,
            rank,
        })
        .collect()
}

/// Plants whose emissions rank is within the top `fraction` of all `plants`
/// (rank <= floor(fraction x N)). With ties straddling the cut-off the
/// subset can be one group smaller than the nominal count.
pub fn select_top_emitters(plants: &[PlantRecord], fraction: f64) -> Vec<RankedPlant> {
    let top_n = top_fraction_count(plants.len(), fraction) as f64;
    rank_by_emissions(plants)
        .into_iter()
        .filter(|r| r.rank <= top_n)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::plant::FuelType;

    fn plant(id: u32, co2: Option<f64>) -> PlantRecord {
        PlantRecord {
            plant_id: id,
            name: format!("Plant {}", id),
            state: "OH".to_string(),
            latitude: None,
            longitude: None,
            fuel_type: FuelType::Coal,
            nameplate_capacity_mw: Some(100.0),
            capacity_factor: Some(0.5),
            annual_co2eq_tons: co2,
        }
    }

    #[test]
    fn average_rank_on_ties() {
        assert_eq!(average_ranks(&[9.0, 7.0, 7.0, 7.0, 1.0]), vec![1.0, 3.0, 3.0, 3.0, 5.0]);
        assert!(average_ranks(&[]).is_empty());
    }

    #[test]
    fn floor_of_fraction() {
        assert_eq!(top_fraction_count(10, 0.2), 2);
        assert_eq!(top_fraction_count(14, 0.2), 2);
        assert_eq!(top_fraction_count(4, 0.2), 0);
    }

    #[test]
    fn top_twenty_percent_of_ten() {
        let plants: Vec<_> = (1..=10).map(|i| plant(i, Some(i as f64 * 1000.0))).collect();
        let top = select_top_emitters(&plants, 0.2);
        let ids: Vec<_> = top.iter().map(|r| r.plant.plant_id).collect();
        assert_eq!(ids, vec![10, 9]);
        assert_eq!(top[0].rank, 1.0);
    }

    #[test]
    fn tie_at_cutoff_is_excluded_together() {
        // Ranks: 1, 2.5, 2.5, 4, ... ; top_n = 2 keeps only rank 1.
        let mut plants = vec![plant(1, Some(100.0)), plant(2, Some(50.0)), plant(3, Some(50.0))];
        plants.extend((4..=10).map(|i| plant(i, Some(1.0 / i as f64))));
        let top = select_top_emitters(&plants, 0.2);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].plant.plant_id, 1);
    }

    #[test]
    fn missing_emissions_are_not_ranked() {
        let plants = vec![plant(1, None), plant(2, Some(5.0)), plant(3, Some(f64::NAN))];
        let ranked = rank_by_emissions(&plants);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].plant.plant_id, 2);
    }
}
