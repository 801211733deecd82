//! # 误差表构建
//!
//! 对每个构型集合计算每原子能量、受力分量、每原子维里 (Voigt 6)
//! 的均方根误差，按标签组织为误差表。
//!
//! 某性质在整个集合中都没有参考数据时，RMSE 为 NaN，
//! 同时在 `ErrorRow::missing` 中标记并输出警告日志。
//!
//! ## 依赖关系
//! - 被 `commands/errors.rs`, `report/export.rs` 使用
//! - 使用 `calculator/` 计算预测值
//! - 使用 `models/tensor.rs` 做 Voigt 转换

use crate::calculator::Calculator;
use crate::error::{AceError, Result};
use crate::models::tensor::{full_3x3_to_voigt_6, tensor_from_flat};
use crate::models::Configuration;

use serde::{Deserialize, Serialize};

/// 规范性质名到构型中参考数据键名的映射
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataKeys {
    #[serde(rename = "E")]
    pub energy: String,
    #[serde(rename = "F")]
    pub forces: String,
    #[serde(rename = "V")]
    pub virial: String,
}

impl DataKeys {
    pub fn new(energy: impl Into<String>, forces: impl Into<String>, virial: impl Into<String>) -> Self {
        DataKeys {
            energy: energy.into(),
            forces: forces.into(),
            virial: virial.into(),
        }
    }
}

impl Default for DataKeys {
    fn default() -> Self {
        DataKeys::new("energy", "forces", "virial")
    }
}

/// 误差表中的性质列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    Energy,
    Forces,
    Virial,
}

impl Property {
    pub const ALL: [Property; 3] = [Property::Energy, Property::Forces, Property::Virial];

    /// 列名
    pub fn column(&self) -> &'static str {
        match self {
            Property::Energy => "E/at",
            Property::Forces => "F",
            Property::Virial => "V/at",
        }
    }
}

impl std::fmt::Display for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// 一个构型集合，标签缺省时使用位置索引
#[derive(Debug, Clone)]
pub struct ConfigSet {
    pub label: Option<String>,
    pub configs: Vec<Configuration>,
}

impl ConfigSet {
    pub fn labeled(label: impl Into<String>, configs: Vec<Configuration>) -> Self {
        ConfigSet {
            label: Some(label.into()),
            configs,
        }
    }

    pub fn unlabeled(configs: Vec<Configuration>) -> Self {
        ConfigSet {
            label: None,
            configs,
        }
    }
}

/// 误差表的一行
#[derive(Debug, Clone)]
pub struct ErrorRow {
    pub label: String,
    /// 每原子能量 RMSE (eV/atom)
    pub energy: f64,
    /// 受力分量 RMSE (eV/Å)
    pub forces: f64,
    /// 每原子维里 RMSE (eV/atom)
    pub virial: f64,
    /// 集合中完全没有参考数据的性质
    pub missing: Vec<Property>,
}

impl ErrorRow {
    pub fn value(&self, property: Property) -> f64 {
        match property {
            Property::Energy => self.energy,
            Property::Forces => self.forces,
            Property::Virial => self.virial,
        }
    }

    pub fn is_missing(&self, property: Property) -> bool {
        self.missing.contains(&property)
    }
}

/// 按标签索引的误差表
#[derive(Debug, Clone, Default)]
pub struct ErrorTable {
    pub rows: Vec<ErrorRow>,
}

impl ErrorTable {
    /// 按标签查找行
    pub fn row(&self, label: &str) -> Option<&ErrorRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.label.as_str()).collect()
    }
}

/// 累积的残差
#[derive(Debug, Default)]
struct Residuals {
    energy: Vec<f64>,
    forces: Vec<f64>,
    virial: Vec<f64>,
}

/// 均方根误差，空输入返回 NaN
pub fn rmse(residuals: &[f64]) -> f64 {
    if residuals.is_empty() {
        return f64::NAN;
    }
    let sum_sq: f64 = residuals.iter().map(|r| r * r).sum();
    (sum_sq / residuals.len() as f64).sqrt()
}

/// 构建误差表
pub fn error_table(
    config_sets: &[ConfigSet],
    calc: &dyn Calculator,
    data_keys: &DataKeys,
) -> Result<ErrorTable> {
    let mut rows = Vec::with_capacity(config_sets.len());

    for (set_index, set) in config_sets.iter().enumerate() {
        let label = set
            .label
            .clone()
            .unwrap_or_else(|| set_index.to_string());

        let mut residuals = Residuals::default();
        for (index, config) in set.configs.iter().enumerate() {
            accumulate(config, index, calc, data_keys, &mut residuals)?;
        }

        let mut missing = Vec::new();
        for (property, values) in [
            (Property::Energy, &residuals.energy),
            (Property::Forces, &residuals.forces),
            (Property::Virial, &residuals.virial),
        ] {
            if values.is_empty() {
                log::warn!(
                    "no '{}' reference data in set '{}', RMSE reported as NaN",
                    property,
                    label
                );
                missing.push(property);
            }
        }

        log::debug!(
            "set '{}': {} energies, {} force components, {} virial components",
            label,
            residuals.energy.len(),
            residuals.forces.len(),
            residuals.virial.len()
        );

        rows.push(ErrorRow {
            label,
            energy: rmse(&residuals.energy),
            forces: rmse(&residuals.forces),
            virial: rmse(&residuals.virial),
            missing,
        });
    }

    Ok(ErrorTable { rows })
}

/// 计算单个构型的残差并累积
fn accumulate(
    config: &Configuration,
    index: usize,
    calc: &dyn Calculator,
    keys: &DataKeys,
    residuals: &mut Residuals,
) -> Result<()> {
    let results = calc.calculate(config)?;
    let n_atoms = config.len() as f64;

    if let Some(value) = config.info.get(&keys.energy) {
        let e_ref = value.as_scalar().ok_or_else(|| {
            AceError::ShapeMismatch(format!(
                "configuration {}: '{}' is not a scalar energy",
                index, keys.energy
            ))
        })?;
        residuals.energy.push((results.energy - e_ref) / n_atoms);
    }

    if let Some(f_ref) = config.arrays.get(&keys.forces) {
        if f_ref.width != 3 || f_ref.len() != results.forces.len() {
            return Err(AceError::ShapeMismatch(format!(
                "configuration {}: '{}' is not an (n_atoms, 3) array",
                index, keys.forces
            )));
        }
        residuals.forces.extend(
            results
                .flat_forces()
                .iter()
                .zip(&f_ref.data)
                .map(|(pred, reference)| pred - reference),
        );
    }

    if let Some(value) = config.info.get(&keys.virial) {
        let v_flat = value.as_vector().ok_or_else(|| {
            AceError::ShapeMismatch(format!(
                "configuration {}: '{}' is not a numeric virial",
                index, keys.virial
            ))
        })?;
        let v_ref = tensor_from_flat(v_flat).ok_or_else(|| {
            AceError::ShapeMismatch(format!(
                "configuration {}: '{}' must have 9 or 6 components, found {}",
                index,
                keys.virial,
                v_flat.len()
            ))
        })?;
        let diff = results.virial(config.volume()) - v_ref;
        residuals
            .virial
            .extend(full_3x3_to_voigt_6(&diff).iter().map(|v| v / n_atoms));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::{CalcResults, Calculator};
    use crate::models::{Cell, InfoValue, PerAtomArray};
    use approx::assert_relative_eq;
    use nalgebra::{Matrix3, Vector3};

    /// 返回固定结果的计算器
    struct FixedCalculator {
        energy: f64,
        force: [f64; 3],
        stress: Matrix3<f64>,
    }

    impl Calculator for FixedCalculator {
        fn calculate(&self, config: &Configuration) -> Result<CalcResults> {
            Ok(CalcResults {
                energy: self.energy,
                forces: vec![Vector3::from(self.force); config.len()],
                stress: self.stress,
                unbiased_energy: None,
            })
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn config_with(energy: Option<f64>, forces: Option<[f64; 3]>, virial: Option<Vec<f64>>) -> Configuration {
        let mut config = Configuration::new(
            vec!["Al".into(), "Al".into()],
            vec![Vector3::zeros(), Vector3::new(1.5, 1.5, 0.0)],
            Cell::cubic(3.0),
            [true; 3],
        )
        .unwrap();
        if let Some(e) = energy {
            config.set_info("energy", InfoValue::Scalar(e));
        }
        if let Some(f) = forces {
            config
                .set_array("forces", PerAtomArray::from_vec3(&[f, f]))
                .unwrap();
        }
        if let Some(v) = virial {
            config.set_info("virial", InfoValue::Vector(v));
        }
        config
    }

    fn calculator() -> FixedCalculator {
        FixedCalculator {
            energy: -6.0,
            force: [0.1, -0.2, 0.3],
            stress: Matrix3::from_diagonal_element(0.01),
        }
    }

    /// 与计算器输出一致的参考维里（3x3 平铺）
    fn matching_virial() -> Vec<f64> {
        let v = -27.0 * 0.01;
        vec![v, 0.0, 0.0, 0.0, v, 0.0, 0.0, 0.0, v]
    }

    #[test]
    fn test_exact_predictions_give_zero() {
        let sets = vec![ConfigSet::labeled(
            "train",
            vec![config_with(Some(-6.0), Some([0.1, -0.2, 0.3]), Some(matching_virial()))],
        )];
        let table = error_table(&sets, &calculator(), &DataKeys::default()).unwrap();
        let row = table.row("train").unwrap();
        assert_eq!(row.energy, 0.0);
        assert_eq!(row.forces, 0.0);
        assert_relative_eq!(row.virial, 0.0, epsilon = 1e-15);
        assert!(row.missing.is_empty());
    }

    #[test]
    fn test_voigt_reference_virial_accepted() {
        let v = -27.0 * 0.01;
        let sets = vec![ConfigSet::labeled(
            "voigt",
            vec![config_with(None, None, Some(vec![v, v, v, 0.0, 0.0, 0.0]))],
        )];
        let table = error_table(&sets, &calculator(), &DataKeys::default()).unwrap();
        assert_relative_eq!(table.rows[0].virial, 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_energy_error_is_per_atom() {
        let sets = vec![ConfigSet::labeled(
            "shifted",
            vec![config_with(Some(-5.0), None, None)],
        )];
        let table = error_table(&sets, &calculator(), &DataKeys::default()).unwrap();
        // (-6 - -5) / 2 atoms
        assert_relative_eq!(table.rows[0].energy, 0.5);
    }

    #[test]
    fn test_order_invariance() {
        let configs = vec![
            config_with(Some(-5.0), Some([0.0, 0.0, 0.0]), None),
            config_with(Some(-6.4), Some([0.2, -0.1, 0.3]), None),
            config_with(Some(-7.0), Some([0.5, 0.5, 0.5]), None),
        ];
        let mut reversed = configs.clone();
        reversed.reverse();

        let sets = vec![
            ConfigSet::labeled("forward", configs),
            ConfigSet::labeled("reversed", reversed),
        ];
        let table = error_table(&sets, &calculator(), &DataKeys::default()).unwrap();
        let a = table.row("forward").unwrap();
        let b = table.row("reversed").unwrap();
        assert_relative_eq!(a.energy, b.energy, epsilon = 1e-14);
        assert_relative_eq!(a.forces, b.forces, epsilon = 1e-14);
    }

    #[test]
    fn test_missing_forces_is_nan_and_flagged() {
        let sets = vec![ConfigSet::unlabeled(vec![
            config_with(Some(-6.0), None, None),
            config_with(Some(-6.0), None, None),
        ])];
        let table = error_table(&sets, &calculator(), &DataKeys::default()).unwrap();
        let row = &table.rows[0];
        assert_eq!(row.label, "0");
        assert!(row.forces.is_nan());
        assert!(row.virial.is_nan());
        assert!(row.is_missing(Property::Forces));
        assert!(!row.is_missing(Property::Energy));
    }

    #[test]
    fn test_custom_keys() {
        let mut config = config_with(None, None, None);
        config.set_info("REF_energy", InfoValue::Scalar(-6.0));
        let keys = DataKeys::new("REF_energy", "REF_forces", "REF_virial");
        let table = error_table(&[ConfigSet::unlabeled(vec![config])], &calculator(), &keys).unwrap();
        assert_eq!(table.rows[0].energy, 0.0);
    }

    #[test]
    fn test_bad_virial_shape_is_error() {
        let sets = vec![ConfigSet::unlabeled(vec![config_with(None, None, Some(vec![1.0, 2.0]))])];
        assert!(error_table(&sets, &calculator(), &DataKeys::default()).is_err());
    }

    #[test]
    fn test_non_scalar_energy_is_error() {
        let mut config = config_with(None, None, None);
        config.set_info("energy", InfoValue::Vector(vec![1.0, 2.0]));
        let sets = vec![ConfigSet::unlabeled(vec![config])];

        let result = error_table(&sets, &calculator(), &DataKeys::default());
        assert!(matches!(result, Err(AceError::ShapeMismatch(_))));
    }

    #[test]
    fn test_text_virial_is_error() {
        let mut config = config_with(None, None, None);
        config.set_info("virial", InfoValue::Text("zero".to_string()));
        let sets = vec![ConfigSet::unlabeled(vec![config])];

        let result = error_table(&sets, &calculator(), &DataKeys::default());
        assert!(matches!(result, Err(AceError::ShapeMismatch(_))));
    }

    #[test]
    fn test_rmse_empty_is_nan() {
        assert!(rmse(&[]).is_nan());
        assert_relative_eq!(rmse(&[3.0, -4.0]), (12.5f64).sqrt());
    }
}
