//! Config stores (spec.md §2.1): pure data, loaded once, process-lifetime
//! immutable. `ConfigStore` bundles the JSON and CSV tables plus the
//! feature-flag bundle into the one value the engine carries around,
//! analogous to how `NutritionalIndex::new` loads the Ciqual table once and
//! holds it for the lifetime of the index.

pub mod csv_tables;
pub mod flags;
pub mod json_tables;

use std::path::Path;

use anyhow::Result;

pub use csv_tables::{EnergyBands, MassRails};
pub use flags::EngineConfig;
pub use json_tables::JsonTables;

#[derive(Debug, Clone)]
pub struct ConfigStore {
    pub tables: JsonTables,
    pub mass_rails: MassRails,
    pub energy_bands: EnergyBands,
    pub flags: EngineConfig,
}

impl ConfigStore {
    pub fn load_defaults() -> Result<Self> {
        Ok(ConfigStore {
            tables: JsonTables::load_defaults()?,
            mass_rails: MassRails::load_defaults()?,
            energy_bands: EnergyBands::load_defaults()?,
            flags: EngineConfig::default(),
        })
    }

    pub fn load_defaults_with_flags(flags: EngineConfig) -> Result<Self> {
        let mut store = Self::load_defaults()?;
        store.flags = flags;
        Ok(store)
    }

    /// Load every table from a directory containing `tables.json`,
    /// `mass_rails.csv`, and `energy_bands.csv`.
    pub fn load_from_dir(dir: &Path, flags: EngineConfig) -> Result<Self> {
        Ok(ConfigStore {
            tables: JsonTables::load(&dir.join("tables.json"))?,
            mass_rails: MassRails::load(&dir.join("mass_rails.csv"))?,
            energy_bands: EnergyBands::load(&dir.join("energy_bands.csv"))?,
            flags,
        })
    }
}
