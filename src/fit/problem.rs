//! # 线性拟合问题
//!
//! 将带参考数据的构型组装为加权线性问题 psi · c = y。
//! 每个构型依次贡献：能量 1 行、受力 3N 行、维里 6 行 (Voigt)。
//! 行权重为 `weights[p] * info["<key>_weight"]`，能量目标扣除孤立原子能量。
//!
//! ## 依赖关系
//! - 被 `fit/mod.rs` 使用
//! - 使用 `fit/basis.rs` 的描述符
//! - 使用 `rayon` 并行计算各构型的行块

use crate::error::{AceError, Result};
use crate::fit::basis::PairBasis;
use crate::models::tensor::{full_3x3_to_voigt_6, tensor_from_flat};
use crate::models::Configuration;
use crate::report::{DataKeys, Property};

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 各性质的全局拟合权重
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropertyWeights {
    #[serde(rename = "E", default = "unit_weight")]
    pub energy: f64,
    #[serde(rename = "F", default = "unit_weight")]
    pub forces: f64,
    #[serde(rename = "V", default = "unit_weight")]
    pub virial: f64,
}

fn unit_weight() -> f64 {
    1.0
}

impl PropertyWeights {
    pub fn new(energy: f64, forces: f64, virial: f64) -> Self {
        PropertyWeights {
            energy,
            forces,
            virial,
        }
    }

    pub fn get(&self, property: Property) -> f64 {
        match property {
            Property::Energy => self.energy,
            Property::Forces => self.forces,
            Property::Virial => self.virial,
        }
    }
}

impl Default for PropertyWeights {
    fn default() -> Self {
        PropertyWeights::new(1.0, 1.0, 1.0)
    }
}

/// 每种性质在设计矩阵中的行号
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropRowIndices {
    pub energy: Vec<usize>,
    pub forces: Vec<usize>,
    pub virial: Vec<usize>,
}

impl PropRowIndices {
    pub fn get(&self, property: Property) -> &[usize] {
        match property {
            Property::Energy => &self.energy,
            Property::Forces => &self.forces,
            Property::Virial => &self.virial,
        }
    }

    fn get_mut(&mut self, property: Property) -> &mut Vec<usize> {
        match property {
            Property::Energy => &mut self.energy,
            Property::Forces => &mut self.forces,
            Property::Virial => &mut self.virial,
        }
    }
}

/// 加权线性问题
#[derive(Debug, Clone)]
pub struct LinearProblem {
    pub psi: DMatrix<f64>,
    pub y: DVector<f64>,
    pub prop_row_inds: PropRowIndices,
}

impl LinearProblem {
    pub fn n_observations(&self) -> usize {
        self.psi.nrows()
    }
}

/// 单个构型的行块
struct RowBlock {
    rows: Vec<(Property, Vec<f64>, f64)>,
}

/// 孤立原子能量之和
pub fn reference_energy(config: &Configuration, e0s: &BTreeMap<String, f64>) -> Result<f64> {
    config
        .symbols
        .iter()
        .map(|s| {
            e0s.get(s).copied().ok_or_else(|| {
                AceError::InvalidArgument(format!("no isolated-atom energy (E0) for {}", s))
            })
        })
        .sum()
}

fn config_rows(
    index: usize,
    config: &Configuration,
    basis: &PairBasis,
    e0s: &BTreeMap<String, f64>,
    keys: &DataKeys,
    weights: &PropertyWeights,
) -> Result<RowBlock> {
    let desc = basis.descriptors(config)?;
    let mut rows = Vec::new();

    if let Some(value) = config.info.get(&keys.energy) {
        let energy = value.as_scalar().ok_or_else(|| {
            AceError::ShapeMismatch(format!(
                "configuration {}: energy '{}' is not a scalar",
                index, keys.energy
            ))
        })?;
        let w = weights.energy * config.weight(&keys.energy);
        let target = energy - reference_energy(config, e0s)?;
        let row = desc.energy.iter().map(|v| v * w).collect();
        rows.push((Property::Energy, row, target * w));
    }

    if let Some(forces) = config.arrays.get(&keys.forces) {
        if forces.width != 3 || forces.len() != config.len() {
            return Err(AceError::ShapeMismatch(format!(
                "configuration {}: forces '{}' must have shape ({}, 3)",
                index,
                keys.forces,
                config.len()
            )));
        }
        let w = weights.forces * config.weight(&keys.forces);
        for (r, target) in forces.data.iter().enumerate() {
            let row = desc.forces.row(r).iter().map(|v| v * w).collect();
            rows.push((Property::Forces, row, target * w));
        }
    }

    if let Some(value) = config.info.get(&keys.virial) {
        let values = value.as_vector().ok_or_else(|| {
            AceError::ShapeMismatch(format!(
                "configuration {}: virial '{}' is not numeric",
                index, keys.virial
            ))
        })?;
        let reference = tensor_from_flat(values).ok_or_else(|| {
            AceError::ShapeMismatch(format!(
                "configuration {}: virial '{}' has {} values, expected 6 or 9",
                index,
                keys.virial,
                values.len()
            ))
        })?;
        let w = weights.virial * config.weight(&keys.virial);
        let target = full_3x3_to_voigt_6(&reference);
        let per_function: Vec<[f64; 6]> = desc.virial.iter().map(full_3x3_to_voigt_6).collect();
        for (c, t) in target.iter().enumerate() {
            let row = per_function.iter().map(|v| v[c] * w).collect();
            rows.push((Property::Virial, row, t * w));
        }
    }

    Ok(RowBlock { rows })
}

/// 组装线性问题，行顺序与构型顺序一致
pub fn assemble_linear_problem(
    configs: &[Configuration],
    basis: &PairBasis,
    e0s: &BTreeMap<String, f64>,
    keys: &DataKeys,
    weights: &PropertyWeights,
) -> Result<LinearProblem> {
    let blocks = configs
        .par_iter()
        .enumerate()
        .map(|(i, config)| config_rows(i, config, basis, e0s, keys, weights))
        .collect::<Result<Vec<_>>>()?;

    let n_cols = basis.len();
    let n_rows: usize = blocks.iter().map(|b| b.rows.len()).sum();
    if n_rows == 0 {
        return Err(AceError::InvalidArgument(
            "no reference data found for the requested keys".to_string(),
        ));
    }

    let mut flat = Vec::with_capacity(n_rows * n_cols);
    let mut y = Vec::with_capacity(n_rows);
    let mut prop_row_inds = PropRowIndices::default();

    for (property, row, target) in blocks.into_iter().flat_map(|b| b.rows) {
        prop_row_inds.get_mut(property).push(y.len());
        flat.extend(row);
        y.push(target);
    }

    log::debug!("assembled linear problem: {} rows x {} columns", n_rows, n_cols);

    Ok(LinearProblem {
        psi: DMatrix::from_row_slice(n_rows, n_cols, &flat),
        y: DVector::from_vec(y),
        prop_row_inds,
    })
}
