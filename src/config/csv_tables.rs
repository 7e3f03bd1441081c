//! Tabular config stores loaded from CSV, grounded directly on
//! `search::data_loader::load_ciqual_nutritional_data`: open the file, read
//! headers, resolve column indices once, walk records with `with_context`
//! errors that name the row.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;

use crate::model::{CoreClass, EnergyBand};

const MASS_RAILS_DEFAULT: &str = include_str!("data/mass_rails.csv");
const ENERGY_BANDS_DEFAULT: &str = include_str!("data/energy_bands.csv");

/// Soft per-class mass bound (spec.md §4.6 / §3 `(lo, hi)` rails).
#[derive(Debug, Clone, Copy)]
pub struct MassRail {
    pub lo_g: f64,
    pub hi_g: f64,
}

#[derive(Debug, Clone, Default)]
pub struct MassRails(pub HashMap<CoreClass, MassRail>);

impl MassRails {
    pub fn load_defaults() -> Result<Self> {
        Self::parse(MASS_RAILS_DEFAULT)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read mass rails CSV from {:?}", path))?;
        Self::parse(&contents)
    }

    fn parse(contents: &str) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(contents.as_bytes());
        let headers = rdr.headers()?.clone();
        let class_idx = headers
            .iter()
            .position(|h| h == "core_class")
            .ok_or_else(|| anyhow::anyhow!("Column 'core_class' not found in mass rails table"))?;
        let lo_idx = headers
            .iter()
            .position(|h| h == "lo_g")
            .ok_or_else(|| anyhow::anyhow!("Column 'lo_g' not found in mass rails table"))?;
        let hi_idx = headers
            .iter()
            .position(|h| h == "hi_g")
            .ok_or_else(|| anyhow::anyhow!("Column 'hi_g' not found in mass rails table"))?;

        let mut rails = HashMap::new();
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.with_context(|| format!("Failed to read mass rail row {}", row_index))?;
            let class = record
                .get(class_idx)
                .ok_or_else(|| anyhow::anyhow!("Missing core_class at row {}", row_index))?
                .trim()
                .to_string();
            if class.is_empty() {
                continue;
            }
            let lo_g: f64 = record
                .get(lo_idx)
                .and_then(|s| s.trim().parse().ok())
                .ok_or_else(|| anyhow::anyhow!("Invalid lo_g at row {} for '{}'", row_index, class))?;
            let hi_g: f64 = record
                .get(hi_idx)
                .and_then(|s| s.trim().parse().ok())
                .ok_or_else(|| anyhow::anyhow!("Invalid hi_g at row {} for '{}'", row_index, class))?;
            rails.insert(class, MassRail { lo_g, hi_g });
        }

        if rails.is_empty() {
            return Err(anyhow::anyhow!("No mass rails loaded"));
        }
        Ok(MassRails(rails))
    }

    pub fn get(&self, core_class: &str) -> Option<MassRail> {
        self.0.get(core_class).copied()
    }
}

/// Per-(class, method) energy plausibility bands, with a `*` generic
/// fallback row per class (spec.md §3 EnergyBand).
#[derive(Debug, Clone, Default)]
pub struct EnergyBands(pub HashMap<(CoreClass, String), EnergyBand>);

impl EnergyBands {
    pub fn load_defaults() -> Result<Self> {
        Self::parse(ENERGY_BANDS_DEFAULT)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read energy bands CSV from {:?}", path))?;
        Self::parse(&contents)
    }

    fn parse(contents: &str) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(contents.as_bytes());
        let headers = rdr.headers()?.clone();
        let class_idx = headers
            .iter()
            .position(|h| h == "core_class")
            .ok_or_else(|| anyhow::anyhow!("Column 'core_class' not found in energy bands table"))?;
        let method_idx = headers
            .iter()
            .position(|h| h == "method")
            .ok_or_else(|| anyhow::anyhow!("Column 'method' not found in energy bands table"))?;
        let min_idx = headers
            .iter()
            .position(|h| h == "min_kcal_100g")
            .ok_or_else(|| anyhow::anyhow!("Column 'min_kcal_100g' not found in energy bands table"))?;
        let max_idx = headers
            .iter()
            .position(|h| h == "max_kcal_100g")
            .ok_or_else(|| anyhow::anyhow!("Column 'max_kcal_100g' not found in energy bands table"))?;

        let mut bands = HashMap::new();
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.with_context(|| format!("Failed to read energy band row {}", row_index))?;
            let class = record
                .get(class_idx)
                .ok_or_else(|| anyhow::anyhow!("Missing core_class at row {}", row_index))?
                .trim()
                .to_string();
            if class.is_empty() {
                continue;
            }
            let method = record
                .get(method_idx)
                .ok_or_else(|| anyhow::anyhow!("Missing method at row {}", row_index))?
                .trim()
                .to_string();
            let min_kcal_100g: f64 = record
                .get(min_idx)
                .and_then(|s| s.trim().parse().ok())
                .ok_or_else(|| anyhow::anyhow!("Invalid min_kcal_100g at row {}", row_index))?;
            let max_kcal_100g: f64 = record
                .get(max_idx)
                .and_then(|s| s.trim().parse().ok())
                .ok_or_else(|| anyhow::anyhow!("Invalid max_kcal_100g at row {}", row_index))?;
            bands.insert(
                (class, method),
                EnergyBand { min_kcal_100g, max_kcal_100g },
            );
        }

        if bands.is_empty() {
            return Err(anyhow::anyhow!("No energy bands loaded"));
        }
        Ok(EnergyBands(bands))
    }

    /// Exact (class, method) band if present, else the class's `*` generic
    /// fallback (spec.md §3: "with generic category fallback").
    pub fn get(&self, core_class: &str, method: &str) -> Option<EnergyBand> {
        self.0
            .get(&(core_class.to_string(), method.to_string()))
            .or_else(|| self.0.get(&(core_class.to_string(), "*".to_string())))
            .copied()
    }

    /// The class's generic (method-agnostic) band, used by the classifier's
    /// plausibility filter which runs before method resolution.
    pub fn generic(&self, core_class: &str) -> Option<EnergyBand> {
        self.0.get(&(core_class.to_string(), "*".to_string())).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_parse() {
        let rails = MassRails::load_defaults().unwrap();
        let bacon = rails.get("bacon_strip").unwrap();
        assert_eq!(bacon.lo_g, 7.0);
        assert_eq!(bacon.hi_g, 13.0);

        let bands = EnergyBands::load_defaults().unwrap();
        let chicken = bands.get("chicken_breast", "grilled").unwrap();
        assert_eq!(chicken.min_kcal_100g, 150.0);
        // falls back to the `*` row for a method with no exact entry
        let chicken_other = bands.get("chicken_breast", "poached").unwrap();
        assert_eq!(chicken_other.min_kcal_100g, 100.0);
    }

    #[test]
    fn mass_rails_missing_column_errors() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "core_class,hi_g").unwrap();
        writeln!(file, "bacon_strip,13").unwrap();
        file.flush().unwrap();

        let result = MassRails::load(file.path());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("lo_g"));
    }

    #[test]
    fn energy_bands_unknown_class_returns_none() {
        let bands = EnergyBands::load_defaults().unwrap();
        assert!(bands.get("nonexistent_class", "grilled").is_none());
    }
}
