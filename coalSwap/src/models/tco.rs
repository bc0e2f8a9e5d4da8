use serde::{Deserialize, Serialize};

use super::plant::PlantId;

/// Year-1 coal operating costs in USD. Constant over the horizon unless an
/// escalation rate is configured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoalCostBreakdown {
    pub fixed_om: f64,
    pub variable_om: f64,
    pub fuel_cost: f64,
    pub scc_cost: f64,
}

impl CoalCostBreakdown {
    pub fn annual_total(&self) -> f64 {
        self.fixed_om + self.variable_om + self.fuel_cost + self.scc_cost
    }
}

/// Solar plant sized to match the coal plant's annual energy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarReplacement {
    pub solar_mw: f64,
    pub gross_capex: f64,
    pub itc: f64,
    pub net_capex: f64,
    pub annual_om: f64,
    pub annual_generation_mwh: f64,
}

/// Coal-vs-solar comparison for one coal plant. Money in millions of USD
/// unless the field name says otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TcoResult {
    #[serde(rename = "Plant_ID")]
    pub plant_id: PlantId,
    #[serde(rename = "Plant_Name")]
    pub name: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Coal TCO (mil$)")]
    pub coal_tco_million_usd: f64,
    #[serde(rename = "Solar TCO (mil$)")]
    pub solar_tco_million_usd: f64,
    #[serde(rename = "PV Gain (mil$)")]
    pub pv_gain_million_usd: f64,
    #[serde(rename = "CO2 Avoided (tons/year)")]
    pub co2_avoided_tons_per_year: f64,
    #[serde(rename = "Solar MW Required")]
    pub solar_mw_required: f64,
    #[serde(rename = "Coal LCOE ($/MWh)")]
    pub coal_lcoe_usd_per_mwh: Option<f64>,
    #[serde(rename = "Solar LCOE ($/MWh)")]
    pub solar_lcoe_usd_per_mwh: Option<f64>,
    #[serde(rename = "LAT")]
    pub latitude: Option<f64>,
    #[serde(rename = "LON")]
    pub longitude: Option<f64>,
}

pub const TCO_TABLE_HEADERS: [&str; 12] = [
    "Plant_ID",
    "Plant_Name",
    "State",
    "Coal TCO (mil$)",
    "Solar TCO (mil$)",
    "PV Gain (mil$)",
    "CO2 Avoided (tons/year)",
    "Solar MW Required",
    "Coal LCOE ($/MWh)",
    "Solar LCOE ($/MWh)",
    "LAT",
    "LON",
];
