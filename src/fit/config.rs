//! # 拟合配置
//!
//! TOML 格式，除 `[basis]` 外所有字段都有缺省值：
//!
//! ```toml
//! n_committee = 8
//! seed = 10
//!
//! [basis]
//! elements = ["Al"]
//! maxdeg = 6
//! r_cut = 3.75
//! r_in = 2.0
//! r_0 = 2.828
//!
//! [solver]
//! kind = "bayesian_ridge"
//!
//! [weights]
//! E = 10.0
//! F = 1.0
//! V = 1.0
//!
//! [data_keys]
//! E = "REF_energy"
//! F = "REF_forces"
//! V = "REF_virial"
//!
//! [e0s]
//! Al = 0.0
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/fit.rs` 使用
//! - 使用 `serde` + `toml`

use crate::error::{AceError, Result};
use crate::fit::basis::BasisInfo;
use crate::fit::problem::PropertyWeights;
use crate::fit::solver::SolverConfig;
use crate::report::DataKeys;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

fn default_n_committee() -> usize {
    8
}

fn default_seed() -> u64 {
    10
}

/// 拟合配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitConfig {
    pub basis: BasisInfo,

    #[serde(default)]
    pub solver: SolverConfig,

    #[serde(default)]
    pub weights: PropertyWeights,

    #[serde(default)]
    pub data_keys: DataKeys,

    /// 孤立原子能量，缺省为空（由调用方补零）
    #[serde(default)]
    pub e0s: BTreeMap<String, f64>,

    #[serde(default = "default_n_committee")]
    pub n_committee: usize,

    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl FitConfig {
    /// 从 TOML 文件读取
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AceError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = fs::read_to_string(path).map_err(|e| AceError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 孤立原子能量；未给出的元素补 0
    pub fn e0s_or_zero(&self) -> BTreeMap<String, f64> {
        let mut e0s = self.e0s.clone();
        for el in &self.basis.elements {
            e0s.entry(el.clone()).or_insert_with(|| {
                log::warn!("no E0 given for {}, using 0", el);
                0.0
            });
        }
        e0s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::solver::BayesianRidge;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = FitConfig::from_toml_str(
            r#"
            [basis]
            elements = ["Al"]
            maxdeg = 6
            r_cut = 3.75
            r_in = 2.0
            r_0 = 2.828
            "#,
        )
        .unwrap();

        assert_eq!(config.n_committee, 8);
        assert_eq!(config.seed, 10);
        assert_eq!(config.data_keys, DataKeys::default());
        assert_eq!(config.weights, PropertyWeights::default());
        assert_eq!(config.solver, SolverConfig::BayesianRidge(BayesianRidge::default()));
        assert_eq!(config.e0s_or_zero().get("Al"), Some(&0.0));
    }

    #[test]
    fn test_full_config() {
        let config = FitConfig::from_toml_str(
            r#"
            n_committee = 4
            seed = 1

            [basis]
            elements = ["Al"]
            maxdeg = 6
            r_cut = 3.75
            r_in = 2.0
            r_0 = 2.828

            [solver]
            kind = "ridge"
            lambda = 0.01

            [weights]
            E = 10.0

            [data_keys]
            E = "REF_energy"
            F = "REF_forces"
            V = "REF_virial"

            [e0s]
            Al = -0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.n_committee, 4);
        assert_eq!(config.weights, PropertyWeights::new(10.0, 1.0, 1.0));
        assert_eq!(config.data_keys.energy, "REF_energy");
        assert_eq!(config.e0s_or_zero().get("Al"), Some(&-0.5));
    }

    #[test]
    fn test_missing_basis_is_error() {
        assert!(matches!(
            FitConfig::from_toml_str("seed = 3\n"),
            Err(AceError::TomlError(_))
        ));
    }
}
