use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;
use tracing::info;

use crate::config::constants::*;
use crate::error::ConfigError;

/// Economic assumptions of the coal-vs-solar cost model.
///
/// Cash-flow timing convention: the solar replacement's net capital outlay
/// is booked undiscounted at year 0, while both operating streams (coal and
/// solar) run over years `1..=horizon_years - 1`. Coal has no year-0 term;
/// the plant already exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TcoAssumptions {
    pub discount_rate: f64,
    pub horizon_years: u32,
    pub scc_price_per_ton: f64,

    pub coal_fixed_om_per_mw: f64,
    pub coal_variable_om_per_mwh: f64,
    pub coal_heat_rate_btu_per_mwh: f64,
    pub coal_price_per_mmbtu: f64,
    pub coal_escalation: f64,        // annual growth of the whole coal cost stream

    pub solar_capex_per_mw: f64,
    pub solar_om_per_mw: f64,
    pub solar_capacity_factor: f64,
    pub itc_rate: f64,
    pub solar_om_escalation: f64,
    pub solar_degradation: f64,      // annual loss of solar output
}

impl Default for TcoAssumptions {
    fn default() -> Self {
        Self {
            discount_rate: DEFAULT_DISCOUNT_RATE,
            horizon_years: DEFAULT_HORIZON_YEARS,
            scc_price_per_ton: DEFAULT_SCC_PRICE_PER_TON,
            coal_fixed_om_per_mw: DEFAULT_COAL_FIXED_OM_PER_MW,
            coal_variable_om_per_mwh: DEFAULT_COAL_VARIABLE_OM_PER_MWH,
            coal_heat_rate_btu_per_mwh: DEFAULT_COAL_HEAT_RATE_BTU_PER_MWH,
            coal_price_per_mmbtu: DEFAULT_COAL_PRICE_PER_MMBTU,
            coal_escalation: 0.0,
            solar_capex_per_mw: DEFAULT_SOLAR_CAPEX_PER_MW,
            solar_om_per_mw: DEFAULT_SOLAR_OM_PER_MW,
            solar_capacity_factor: DEFAULT_SOLAR_CAPACITY_FACTOR,
            itc_rate: DEFAULT_ITC_RATE,
            solar_om_escalation: 0.0,
            solar_degradation: 0.0,
        }
    }
}

impl TcoAssumptions {
    /// Years carrying an operating cost. Empty for a one-year horizon.
    pub fn operating_years(&self) -> RangeInclusive<u32> {
        1..=self.horizon_years.saturating_sub(1)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, value: f64, reason: &'static str) -> ConfigError {
            ConfigError::InvalidAssumption { field, value, reason }
        }

        if !(self.discount_rate > -1.0) || !self.discount_rate.is_finite() {
            return Err(invalid("discount_rate", self.discount_rate, "must be finite and greater than -1"));
        }
        if self.horizon_years < 1 {
            return Err(invalid("horizon_years", self.horizon_years as f64, "must be at least 1"));
        }
        if !(self.solar_capacity_factor > 0.0 && self.solar_capacity_factor <= 1.0) {
            return Err(invalid("solar_capacity_factor", self.solar_capacity_factor, "must be in (0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.itc_rate) {
            return Err(invalid("itc_rate", self.itc_rate, "must be in [0, 1]"));
        }
        if !(0.0..1.0).contains(&self.solar_degradation) {
            return Err(invalid("solar_degradation", self.solar_degradation, "must be in [0, 1)"));
        }
        if !(self.coal_escalation > -1.0) || !self.coal_escalation.is_finite() {
            return Err(invalid("coal_escalation", self.coal_escalation, "must be finite and greater than -1"));
        }
        if !(self.solar_om_escalation > -1.0) || !self.solar_om_escalation.is_finite() {
            return Err(invalid("solar_om_escalation", self.solar_om_escalation, "must be finite and greater than -1"));
        }
        Ok(())
    }
}

/// Source header for each canonical plant field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub plant_id: String,
    pub name: String,
    pub state: String,
    pub latitude: String,
    pub longitude: String,
    pub fuel_type: String,
    pub nameplate_capacity_mw: String,
    pub capacity_factor: String,
    pub annual_co2eq_tons: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            plant_id: "ORISPL".to_string(),
            name: "PNAME".to_string(),
            state: "PSTATABB".to_string(),
            latitude: "LAT".to_string(),
            longitude: "LON".to_string(),
            fuel_type: "PLFUELCT".to_string(),
            nameplate_capacity_mw: "NAMEPCAP".to_string(),
            capacity_factor: "CAPFAC".to_string(),
            annual_co2eq_tons: "PLCO2EQA".to_string(),
        }
    }
}

impl ColumnMapping {
    /// (canonical name, source header) pairs in canonical order.
    pub fn pairs(&self) -> [(&'static str, &str); 9] {
        [
            ("plant_id", &self.plant_id),
            ("name", &self.name),
            ("state", &self.state),
            ("latitude", &self.latitude),
            ("longitude", &self.longitude),
            ("fuel_type", &self.fuel_type),
            ("nameplate_capacity_mw", &self.nameplate_capacity_mw),
            ("capacity_factor", &self.capacity_factor),
            ("annual_co2eq_tons", &self.annual_co2eq_tons),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub header_offset: usize,     // rows above the header line
    pub delimiter: char,
    pub columns: ColumnMapping,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            header_offset: DEFAULT_HEADER_OFFSET,
            delimiter: ',',
            columns: ColumnMapping::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisThresholds {
    pub top_emitter_fraction: f64,
    pub min_co2_intensity: f64,          // tons/MWh, exclusive
    pub min_pv_gain_million_usd: f64,    // exclusive
}

impl Default for AnalysisThresholds {
    fn default() -> Self {
        Self {
            top_emitter_fraction: DEFAULT_TOP_EMITTER_FRACTION,
            min_co2_intensity: DEFAULT_MIN_CO2_INTENSITY,
            min_pv_gain_million_usd: DEFAULT_MIN_PV_GAIN_MILLION_USD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub chunk_size: usize,
    pub parallel: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            parallel: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub input: InputConfig,
    pub tco: TcoAssumptions,
    pub thresholds: AnalysisThresholds,
    pub batch: BatchConfig,
}

impl ScenarioConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let cfg: ScenarioConfig = toml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        let cfg = Self::from_toml_str(&content)?;
        info!(path = %path.as_ref().display(), "loaded scenario config");
        Ok(cfg)
    }

    /// Loads `path` when given, otherwise the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tco.validate()?;
        // The csv reader takes a single-byte delimiter.
        if !self.input.delimiter.is_ascii() {
            return Err(ConfigError::InvalidDelimiter(self.input.delimiter));
        }
        let fraction = self.thresholds.top_emitter_fraction;
        if !(0.0..=1.0).contains(&fraction) {
            return Err(ConfigError::InvalidAssumption {
                field: "top_emitter_fraction",
                value: fraction,
                reason: "must be in [0, 1]",
            });
        }
        if self.batch.chunk_size == 0 {
            return Err(ConfigError::InvalidAssumption {
                field: "chunk_size",
                value: 0.0,
                reason: "must be positive",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        ScenarioConfig::default().validate().unwrap();
        assert_eq!(TcoAssumptions::default().operating_years(), 1..=39);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg = ScenarioConfig::from_toml_str(
            "[tco]\ndiscount_rate = 0.07\n\n[thresholds]\nmin_pv_gain_million_usd = 5000.0\n",
        )
        .unwrap();
        assert_eq!(cfg.tco.discount_rate, 0.07);
        assert_eq!(cfg.tco.scc_price_per_ton, DEFAULT_SCC_PRICE_PER_TON);
        assert_eq!(cfg.thresholds.min_pv_gain_million_usd, 5000.0);
        assert_eq!(cfg.input.columns.plant_id, "ORISPL");
    }

    #[test]
    fn toml_round_trip() {
        let cfg = ScenarioConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        assert_eq!(ScenarioConfig::from_toml_str(&text).unwrap(), cfg);
    }

    #[test]
    fn rejects_zero_solar_capacity_factor() {
        let err = ScenarioConfig::from_toml_str("[tco]\nsolar_capacity_factor = 0.0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidAssumption { field: "solar_capacity_factor", .. }
        ));
    }

    #[test]
    fn rejects_infinite_escalation() {
        let err = ScenarioConfig::from_toml_str("[tco]\ncoal_escalation = inf\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAssumption { field: "coal_escalation", .. }));

        let tco = TcoAssumptions { solar_om_escalation: f64::INFINITY, ..TcoAssumptions::default() };
        assert!(matches!(
            tco.validate(),
            Err(ConfigError::InvalidAssumption { field: "solar_om_escalation", .. })
        ));
    }

    #[test]
    fn rejects_non_ascii_delimiter() {
        let err = ScenarioConfig::from_toml_str("[input]\ndelimiter = \"§\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDelimiter('§')));

        let tabs = ScenarioConfig::from_toml_str("[input]\ndelimiter = \"\\t\"\n").unwrap();
        assert_eq!(tabs.input.delimiter, '\t');
    }

    #[test]
    fn one_year_horizon_has_no_operating_years() {
        let tco = TcoAssumptions { horizon_years: 1, ..TcoAssumptions::default() };
        assert_eq!(tco.operating_years().count(), 0);
    }
}
