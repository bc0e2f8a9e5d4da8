// Main module declarations for the coal-to-solar analysis crate

// Analysis runs (emissions, TCO, opportunity)
pub mod core {
    pub mod pipeline;
}

// Configuration modules
pub mod config {
    pub mod constants;
    pub mod const_funcs;
    pub mod scenario_config;
    pub mod us_states;
}

// Model definitions
pub mod models {
    pub mod plant;
    pub mod tco;
}

// Data loaders
pub mod data {
    pub mod plants_loader;
    pub mod tco_loader;
}

// Computations over the plant table
pub mod analysis {
    pub mod generation;
    pub mod tco_model;
    pub mod ranking;
    pub mod emissions;
    pub mod opportunity;
    pub mod reporting;
}

// Utility functions
pub mod utils {
    pub mod logging;
    pub mod csv_export;
    pub mod scatter_plot;
}

// CLI interface
pub mod cli {
    pub mod cli;
}

pub mod error;

// Re-export commonly used items
pub use crate::analysis::tco_model::TcoModel;
pub use crate::config::scenario_config::{ScenarioConfig, TcoAssumptions};
pub use crate::models::plant::{FuelType, PlantRecord};
pub use crate::models::tco::TcoResult;
