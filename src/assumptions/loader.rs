//! JSON-based model loader
//!
//! Loads model parameters from JSON files in a directory (default
//! `data/model/`). Every file is optional: a missing file keeps the built-in
//! defaults for that part of the model.

use super::{EconomyModel, HumanLifeModel, SocioEconomyModel};
use crate::fiscal::{FiscalError, FiscalModel};
use crate::patrimony::ValuationDiscounts;
use crate::projection::KpiSet;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default path to the model directory
pub const DEFAULT_MODEL_PATH: &str = "data/model";

/// Errors raised while loading configuration files
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Fiscal(#[from] FiscalError),
}

/// Read and deserialize one JSON file
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let file = File::open(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Read `dir/file_name` if it exists
fn load_optional<T: DeserializeOwned>(
    dir: &Path,
    file_name: &str,
) -> Result<Option<T>, ConfigError> {
    let path = dir.join(file_name);
    if path.exists() {
        load_json(&path).map(Some)
    } else {
        Ok(None)
    }
}

/// Model parts found in a model directory
#[derive(Debug, Default)]
pub struct LoadedModel {
    pub economy: Option<EconomyModel>,
    pub human_life: Option<HumanLifeModel>,
    pub socio_economy: Option<SocioEconomyModel>,
    pub fiscal: Option<FiscalModel>,
    pub valuation: Option<ValuationDiscounts>,
    pub kpis: Option<KpiSet>,
}

impl LoadedModel {
    /// Load every model part from the default path
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(DEFAULT_MODEL_PATH))
    }

    /// Load every model part from a specific directory
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let fiscal = match load_optional::<FiscalModel>(path, "fiscal.json")? {
            Some(mut fiscal) => {
                fiscal.initialize()?;
                Some(fiscal)
            }
            None => None,
        };
        Ok(Self {
            economy: load_optional(path, "economy.json")?,
            human_life: load_optional(path, "human_life.json")?,
            socio_economy: load_optional(path, "socio_economy.json")?,
            fiscal,
            valuation: load_optional(path, "valuation.json")?,
            kpis: load_optional(path, "kpis.json")?,
        })
    }
}
