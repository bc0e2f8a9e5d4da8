// Time Constants
pub const HOURS_PER_YEAR: f64 = 8760.0;

// Unit Scaling
pub const MILLION: f64 = 1e6;
pub const BILLION: f64 = 1e9;
pub const BTU_PER_MMBTU: f64 = 1e6;

// Source Dataset (eGRID plant sheet)
pub const COAL_FUEL_LABEL: &str = "COAL";
pub const DEFAULT_HEADER_OFFSET: usize = 1;      // description row above the header in PLNT23
pub const EMISSIONS_DECIMALS: i32 = 2;

// Finance Defaults
pub const DEFAULT_DISCOUNT_RATE: f64 = 0.05;
pub const DEFAULT_HORIZON_YEARS: u32 = 40;
pub const DEFAULT_SCC_PRICE_PER_TON: f64 = 50.0;   // $/ton CO2eq

// Coal Plant Defaults (EIA, March 2023)
pub const DEFAULT_COAL_FIXED_OM_PER_MW: f64 = 45_680.0;          // $/MW-yr
pub const DEFAULT_COAL_VARIABLE_OM_PER_MWH: f64 = 5.06;           // $/MWh
pub const DEFAULT_COAL_HEAT_RATE_BTU_PER_MWH: f64 = 8_638_000.0;
pub const DEFAULT_COAL_PRICE_PER_MMBTU: f64 = 2.5;

// Solar Plant Defaults
pub const DEFAULT_SOLAR_CAPEX_PER_MW: f64 = 1_448_000.0;        // $/MW
pub const DEFAULT_SOLAR_OM_PER_MW: f64 = 17_160.0;            // $/MW-yr
pub const DEFAULT_SOLAR_CAPACITY_FACTOR: f64 = 0.25;              // roughly 20-30% for utility PV
pub const DEFAULT_ITC_RATE: f64 = 0.30;                           // federal investment tax credit

// Analysis Thresholds
pub const DEFAULT_TOP_EMITTER_FRACTION: f64 = 0.20;
pub const DEFAULT_MIN_CO2_INTENSITY: f64 = 1.0;                   // tons/MWh
pub const DEFAULT_MIN_PV_GAIN_MILLION_USD: f64 = 8000.0;

// Batch Processing
pub const DEFAULT_CHUNK_SIZE: usize = 512;

// Output File Names
pub const COAL_PLANTS_FILE: &str = "coal_plants_us.csv";
pub const TOP_EMITTERS_FILE: &str = "top20_dirtiest_coal_plants.csv";
pub const TCO_TABLE_FILE: &str = "coal_to_solar_pv_gain.csv";
pub const MERGED_TABLE_FILE: &str = "pv_co2_intensity_analysis.csv";
pub const FILTERED_TABLE_FILE: &str = "filtered_by_highest_tco.csv";
pub const SCATTER_PLOT_FILE: &str = "pv_vs_co2_intensity.png";
pub const RUN_SUMMARY_FILE: &str = "run_summary.json";
pub const DEFAULT_CONFIG_FILE: &str = "coalswap.toml";

// Scatter Plot Geometry
pub const PLOT_WIDTH: u32 = 1000;
pub const PLOT_HEIGHT: u32 = 600;
pub const PLOT_MARGIN_LEFT: u32 = 90;
pub const PLOT_MARGIN_RIGHT: u32 = 180;
pub const PLOT_MARGIN_TOP: u32 = 70;
pub const PLOT_MARGIN_BOTTOM: u32 = 80;
pub const PLOT_TITLE: &str = "PV Gain vs. CO2 Intensity (tons/MWh) for Coal Plants";
pub const PLOT_X_LABEL: &str = "CO2 Intensity (tons/MWh)";
pub const PLOT_Y_LABEL: &str = "PV Gain (mil$) from Replacing with Solar";
pub const PLOT_LEGEND_TITLE: &str = "PV Gain (mil$)";
pub const PLOT_MIN_POINT_RADIUS: f64 = 2.5;
pub const PLOT_MAX_POINT_RADIUS: f64 = 8.0;
pub const PLOT_GRID_DIVISIONS: u32 = 10;
