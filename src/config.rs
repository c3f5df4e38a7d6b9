//! Model configuration shared by every run
//!
//! Built once, then passed by reference to the engines. Defaults follow
//! 2023 French law and neutral economic assumptions.

use crate::assumptions::loader::{load_json, DEFAULT_MODEL_PATH};
use crate::assumptions::{Assumptions, ConfigError, LoadedModel};
use crate::fiscal::FiscalModel;
use crate::patrimony::ValuationDiscounts;
use crate::projection::KpiSet;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelConfig {
    pub assumptions: Assumptions,
    pub fiscal: FiscalModel,
    pub valuation: ValuationDiscounts,
    pub kpis: KpiSet,
}

impl ModelConfig {
    /// Defaults overridden by every part found in a model directory
    pub fn from_loaded(loaded: LoadedModel) -> Self {
        let mut config = Self::default();
        if let Some(economy) = loaded.economy {
            config.assumptions.economy = economy;
        }
        if let Some(human_life) = loaded.human_life {
            config.assumptions.human_life = human_life;
        }
        if let Some(socio_economy) = loaded.socio_economy {
            config.assumptions.socio_economy = socio_economy;
        }
        if let Some(fiscal) = loaded.fiscal {
            config.fiscal = fiscal;
        }
        if let Some(valuation) = loaded.valuation {
            config.valuation = valuation;
        }
        if let Some(kpis) = loaded.kpis {
            config.kpis = kpis;
        }
        config
    }

    /// Load a model directory (one optional JSON file per part)
    pub fn load_dir(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::from_loaded(LoadedModel::load_from(path)?))
    }

    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_dir(Path::new(DEFAULT_MODEL_PATH))
    }

    /// Load a single JSON document holding the whole configuration
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let mut config: ModelConfig = load_json(path)?;
        config.fiscal.initialize()?;
        Ok(config)
    }

    /// Directory or single file, whichever `path` is
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.is_dir() {
            Self::load_dir(path)
        } else {
            Self::load_file(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::KpiKind;
    use std::fs;

    #[test]
    fn test_single_document() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        let path = dir.join("model.json");
        fs::write(
            &path,
            r#"{
                "valuation": {"rented": 0.2},
                "kpis": {"definitions": [
                    {"kind": "MinimumAdultsAsset", "objective": 50000.0, "probabilityObjective": 0.9}
                ]}
            }"#,
        )
        .unwrap();

        let config = ModelConfig::load(&path).unwrap();
        assert_eq!(config.valuation.rented, 0.2);
        assert_eq!(config.valuation.primary_residence_succession, 0.20);
        let kpi = config.kpis.definition(KpiKind::MinimumAdultsAsset).unwrap();
        assert_eq!(kpi.objective, 50_000.0);
        assert!(config.kpis.definition(KpiKind::AssetAtFirstDeath).is_none());
        assert!(config.fiscal.real_estate_capital_gains.tax(100_000.0, 10).is_ok());
    }

    #[test]
    fn test_shipped_model_directory() {
        let config = ModelConfig::load_default().unwrap();
        let first_death = config.kpis.definition(KpiKind::AssetAtFirstDeath).unwrap();
        assert_eq!(first_death.objective, 400_000.0);
        assert_eq!(config.assumptions.economy.inflation.default_value(), 0.02);
        assert_eq!(config.valuation, ValuationDiscounts::default());
    }

    #[test]
    fn test_empty_directory_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        let config = ModelConfig::load(dir).unwrap();
        assert_eq!(config.kpis, KpiSet::default());
    }
}
