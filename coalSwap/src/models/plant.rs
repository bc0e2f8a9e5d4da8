use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::analysis::generation::{estimate_annual_generation, estimate_co2_intensity};
use crate::config::constants::COAL_FUEL_LABEL;

pub type PlantId = u32;

/// Primary fuel category of a plant (eGRID `PLFUELCT`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FuelType {
    Coal,
    Oil,
    Gas,
    OtherFossil,
    Nuclear,
    Hydro,
    Biomass,
    Wind,
    Solar,
    Geothermal,
    Other(String),
}

impl FromStr for FuelType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        Ok(match label {
            COAL_FUEL_LABEL => FuelType::Coal,
            "OIL" => FuelType::Oil,
            "GAS" => FuelType::Gas,
            "OFSL" => FuelType::OtherFossil,
            "NUCLEAR" => FuelType::Nuclear,
            "HYDRO" => FuelType::Hydro,
            "BIOMASS" => FuelType::Biomass,
            "WIND" => FuelType::Wind,
            "SOLAR" => FuelType::Solar,
            "GEOTHERMAL" => FuelType::Geothermal,
            _ => FuelType::Other(label.to_string()),
        })
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FuelType::Coal => write!(f, "{}", COAL_FUEL_LABEL),
            FuelType::Oil => write!(f, "OIL"),
            FuelType::Gas => write!(f, "GAS"),
            FuelType::OtherFossil => write!(f, "OFSL"),
            FuelType::Nuclear => write!(f, "NUCLEAR"),
            FuelType::Hydro => write!(f, "HYDRO"),
            FuelType::Biomass => write!(f, "BIOMASS"),
            FuelType::Wind => write!(f, "WIND"),
            FuelType::Solar => write!(f, "SOLAR"),
            FuelType::Geothermal => write!(f, "GEOTHERMAL"),
            FuelType::Other(label) => write!(f, "{}", label),
        }
    }
}

impl From<String> for FuelType {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(fuel) => fuel,
            Err(never) => match never {},
        }
    }
}

impl From<FuelType> for String {
    fn from(fuel: FuelType) -> Self {
        fuel.to_string()
    }
}

/// One plant row of the source dataset, under canonical field names.
/// Numeric cells the source leaves blank are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantRecord {
    pub plant_id: PlantId,
    pub name: String,
    pub state: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub fuel_type: FuelType,
    pub nameplate_capacity_mw: Option<f64>,
    pub capacity_factor: Option<f64>,
    pub annual_co2eq_tons: Option<f64>,
}

impl PlantRecord {
    pub fn is_coal(&self) -> bool {
        self.fuel_type == FuelType::Coal
    }

    /// Missing capacity or capacity factor count as zero.
    pub fn annual_generation_mwh(&self) -> f64 {
        estimate_annual_generation(
            self.nameplate_capacity_mw.unwrap_or(0.0),
            self.capacity_factor.unwrap_or(0.0),
        )
    }

    /// Tons CO2eq per MWh; `None` when emissions are missing or generation is zero.
    pub fn co2_intensity(&self) -> Option<f64> {
        let co2 = self.annual_co2eq_tons?;
        estimate_co2_intensity(co2, self.annual_generation_mwh())
    }
}

/// Keeps only coal-fired plants, in source order.
pub fn filter_coal(plants: &[PlantRecord]) -> Vec<PlantRecord> {
    plants.iter().filter(|p| p.is_coal()).cloned().collect()
}
