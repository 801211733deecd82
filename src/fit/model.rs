//! # 拟合得到的对势计算器
//!
//! E = Σ E0 + Σ_k c_k B_k，力与维里同样由描述符线性组合得到。
//! 委员会系数用于估计能量的不确定度。模型以 JSON 保存与读取。
//!
//! ## 依赖关系
//! - 被 `fit/mod.rs`, `fixtures/`, `commands/` 使用
//! - 实现 `calculator::Calculator`
//! - 使用 `serde_json` 持久化

use crate::calculator::{CalcResults, Calculator};
use crate::error::{AceError, Result};
use crate::fit::basis::{Descriptors, PairBasis};
use crate::fit::problem::reference_energy;
use crate::models::Configuration;

use nalgebra::{DVector, Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

fn default_name() -> String {
    "pair-ace".to_string()
}

/// 线性对势模型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPairCalculator {
    #[serde(default = "default_name")]
    pub name: String,
    pub basis: PairBasis,
    pub e0s: BTreeMap<String, f64>,
    pub coef: Vec<f64>,
    #[serde(default)]
    pub committee: Vec<Vec<f64>>,
}

impl FittedPairCalculator {
    pub fn new(
        basis: PairBasis,
        e0s: BTreeMap<String, f64>,
        coef: &DVector<f64>,
        committee: &[DVector<f64>],
    ) -> Result<Self> {
        let calc = FittedPairCalculator {
            name: default_name(),
            basis,
            e0s,
            coef: coef.iter().copied().collect(),
            committee: committee
                .iter()
                .map(|c| c.iter().copied().collect())
                .collect(),
        };
        calc.validate()?;
        Ok(calc)
    }

    fn validate(&self) -> Result<()> {
        let n = self.basis.len();
        if self.coef.len() != n {
            return Err(AceError::ShapeMismatch(format!(
                "{} coefficients for a basis of {} functions",
                self.coef.len(),
                n
            )));
        }
        if let Some(bad) = self.committee.iter().find(|c| c.len() != n) {
            return Err(AceError::ShapeMismatch(format!(
                "committee member has {} coefficients for a basis of {} functions",
                bad.len(),
                n
            )));
        }
        Ok(())
    }

    /// 委员会成员数
    pub fn committee_size(&self) -> usize {
        self.committee.len()
    }

    /// 每个委员会成员预测的能量
    pub fn committee_energies(&self, config: &Configuration) -> Result<Vec<f64>> {
        let desc = self.basis.descriptors(config)?;
        let e0 = reference_energy(config, &self.e0s)?;
        Ok(self
            .committee
            .iter()
            .map(|c| e0 + dot(desc.energy.as_slice(), c))
            .collect())
    }

    /// 写出 JSON
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| AceError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// 读取 JSON
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| AceError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        let calc: FittedPairCalculator = serde_json::from_str(&content)?;
        calc.validate()?;
        Ok(calc)
    }

    fn evaluate(&self, config: &Configuration, desc: &Descriptors) -> Result<CalcResults> {
        let c = DVector::from_column_slice(&self.coef);

        let energy = reference_energy(config, &self.e0s)? + desc.energy.dot(&c);

        let flat = &desc.forces * &c;
        let forces = flat
            .as_slice()
            .chunks_exact(3)
            .map(|f| Vector3::new(f[0], f[1], f[2]))
            .collect();

        let virial: Matrix3<f64> = desc
            .virial
            .iter()
            .zip(&self.coef)
            .map(|(w, ck)| w * *ck)
            .sum();
        let volume = config.volume();
        let stress = if config.is_periodic() && volume > 0.0 {
            -virial / volume
        } else {
            Matrix3::zeros()
        };

        Ok(CalcResults {
            energy,
            forces,
            stress,
            unbiased_energy: None,
        })
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

impl Calculator for FittedPairCalculator {
    fn calculate(&self, config: &Configuration) -> Result<CalcResults> {
        let desc = self.basis.descriptors(config)?;
        self.evaluate(config, &desc)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::basis::{define_basis, BasisFlavour, BasisInfo};
    use crate::models::Cell;
    use approx::assert_relative_eq;

    fn model() -> FittedPairCalculator {
        let basis = define_basis(&BasisInfo {
            elements: vec!["Al".into()],
            cor_order: 2,
            maxdeg: 3,
            r_cut: 3.75,
            r_in: 2.0,
            r_0: 2.828,
            pairs_r_dict: BTreeMap::new(),
            maxdeg_pair: None,
            r_cut_pair: None,
            flavour: BasisFlavour::Standard,
        })
        .unwrap()
        .basis;
        let coef = DVector::from_vec(vec![-1.0, 0.5, 0.2]);
        let committee = vec![coef.clone(), DVector::from_vec(vec![-1.1, 0.4, 0.3])];
        FittedPairCalculator::new(basis, BTreeMap::from([("Al".to_string(), -0.1)]), &coef, &committee)
            .unwrap()
    }

    fn distorted_fcc() -> Configuration {
        let prim = Configuration::new(
            vec!["Al".into()],
            vec![Vector3::zeros()],
            Cell::from_vectors([[2.0, 2.0, 0.0], [2.0, 0.0, 2.0], [0.0, 2.0, 2.0]]),
            [true; 3],
        )
        .unwrap();
        let mut sc = prim.repeat([2, 2, 2]);
        sc.positions[1] += Vector3::new(0.04, -0.02, 0.03);
        sc.positions[6] += Vector3::new(-0.05, 0.02, 0.01);
        sc
    }

    #[test]
    fn test_forces_match_finite_difference() {
        let calc = model();
        let config = distorted_fcc();
        let results = calc.calculate(&config).unwrap();

        let h = 1e-5;
        for (atom, k) in [(1, 0), (1, 2), (6, 1), (0, 0)] {
            let mut plus = config.clone();
            plus.positions[atom][k] += h;
            let mut minus = config.clone();
            minus.positions[atom][k] -= h;
            let numeric =
                -(calc.calculate(&plus).unwrap().energy - calc.calculate(&minus).unwrap().energy) / (2.0 * h);
            assert_relative_eq!(results.forces[atom][k], numeric, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_stress_matches_strain_derivative() {
        let calc = model();
        let config = distorted_fcc();
        let results = calc.calculate(&config).unwrap();
        let volume = config.volume();

        let h = 1e-5;
        for (a, b) in [(0, 0), (2, 2), (0, 2)] {
            let mut eps = Matrix3::zeros();
            eps[(a, b)] += 0.5 * h;
            eps[(b, a)] += 0.5 * h;
            let strained = |sign: f64| {
                let mut c = config.clone();
                let cell = crate::models::Cell {
                    matrix: config.cell.matrix * (Matrix3::identity() + eps * sign),
                };
                c.set_cell_scaled(cell).unwrap();
                calc.calculate(&c).unwrap().energy
            };
            let numeric = (strained(1.0) - strained(-1.0)) / (2.0 * h) / volume;
            assert_relative_eq!(results.stress[(a, b)], numeric, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_committee_energies() {
        let calc = model();
        let config = distorted_fcc();
        let energies = calc.committee_energies(&config).unwrap();
        assert_eq!(energies.len(), 2);
        // 第一个成员与均值系数相同
        assert_relative_eq!(energies[0], calc.calculate(&config).unwrap().energy, epsilon = 1e-10);
        assert!((energies[1] - energies[0]).abs() > 1e-6);
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let calc = model();
        calc.save_json(&path).unwrap();
        let loaded = FittedPairCalculator::load_json(&path).unwrap();
        assert_eq!(loaded, calc);
    }

    #[test]
    fn test_load_rejects_wrong_coefficient_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let mut calc = model();
        calc.coef.push(1.0);
        std::fs::write(&path, serde_json::to_string(&calc).unwrap()).unwrap();
        assert!(matches!(
            FittedPairCalculator::load_json(&path),
            Err(AceError::ShapeMismatch(_))
        ));
    }
}
