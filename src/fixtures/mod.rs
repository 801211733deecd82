//! # 合成数据与拟合模型夹具
//!
//! 生成扰动的周期性 fcc 铝超胞，用固定的 Lennard-Jones 参考计算器
//! 标注能量、受力与维里，再拟合对基模型。测试和 `synth` 子命令共用。
//!
//! 随机数生成器固定种子，结果可复现：结构生成用种子 5，委员会采样用种子 10。
//!
//! ## 依赖关系
//! - 被 `commands/synth.rs` 与集成测试使用
//! - 使用 `calculator/pair.rs` 作为参考
//! - 使用 `fit/` 拟合模型
//! - 使用 `rayon` 并行标注构型

use crate::calculator::{Calculator, LennardJones, PairCalculator};
use crate::error::{AceError, Result};
use crate::fit::{
    define_basis, fit, BasisDescriptor, BasisFlavour, BasisInfo, BayesianRidge, FittedPairCalculator,
    LinearProblem, PropertyWeights,
};
use crate::models::tensor::flatten_3x3;
use crate::models::{Cell, Configuration, InfoValue, PerAtomArray};
use crate::report::DataKeys;

use nalgebra::{DVector, Matrix3, Vector3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use rayon::prelude::*;
use std::collections::BTreeMap;

pub const ENERGY_KEY: &str = "REF_energy";
pub const FORCES_KEY: &str = "REF_forces";
pub const VIRIAL_KEY: &str = "REF_virial";

/// 结构生成的随机种子
pub const DATA_SEED: u64 = 5;

/// 委员会采样的随机种子
pub const COMMITTEE_SEED: u64 = 10;

pub const N_COMMITTEE: usize = 8;

const N_GENERATED: usize = 10;
const N_FIT_KEPT: usize = 3;
const RATTLE_STDEV: f64 = 0.001;
const STRAIN_STDEV: f64 = 0.02;

/// 合成数据集
#[derive(Debug, Clone)]
pub struct FitData {
    pub fit_configs: Vec<Configuration>,
    pub test_configs: Vec<Configuration>,
    pub e0s: BTreeMap<String, f64>,
    pub data_keys: DataKeys,
    pub weights: PropertyWeights,
}

/// 拟合模型及诊断信息
#[derive(Debug, Clone)]
pub struct FittedModelInfo {
    pub calc: FittedPairCalculator,
    pub linear_problem: LinearProblem,
    pub coef: DVector<f64>,
    pub n_observations: usize,
    pub basis: BasisDescriptor,
}

/// 参考计算器
pub fn reference_calculator() -> PairCalculator<LennardJones> {
    PairCalculator::new(LennardJones::aluminium(), "lj-al")
}

/// fcc 铝原胞，单原子位于原点
pub fn fcc_aluminium_primitive() -> Configuration {
    Configuration {
        symbols: vec!["Al".to_string()],
        positions: vec![Vector3::zeros()],
        cell: Cell::from_vectors([[2.0, 2.0, 0.0], [2.0, 0.0, 2.0], [0.0, 2.0, 2.0]]),
        pbc: [true; 3],
        info: BTreeMap::new(),
        arrays: BTreeMap::new(),
    }
}

/// 4x4x4 超胞，随机位移后施加随机应变 F = I + N(0, 0.02)
pub fn synthetic_structure<R: Rng>(prim: &Configuration, rng: &mut R) -> Result<Configuration> {
    let mut sc = prim.repeat([4, 4, 4]);
    sc.rattle(RATTLE_STDEV, rng);

    let deform = Matrix3::identity()
        + Matrix3::from_fn(|_, _| {
            let z: f64 = rng.sample(StandardNormal);
            STRAIN_STDEV * z
        });
    let cell = Cell {
        matrix: sc.cell.matrix * deform,
    };
    sc.set_cell_scaled(cell)?;
    Ok(sc)
}

/// 用计算器写入参考能量、受力与维里 (3x3)
pub fn label_configuration(config: &mut Configuration, calc: &dyn Calculator) -> Result<()> {
    let results = calc.calculate(config)?;
    let virial = results.virial(config.volume());
    let forces: Vec<[f64; 3]> = results.forces.iter().map(|f| [f.x, f.y, f.z]).collect();

    config.set_info(ENERGY_KEY, InfoValue::Scalar(results.energy));
    config.set_array(FORCES_KEY, PerAtomArray::from_vec3(&forces))?;
    config.set_info(VIRIAL_KEY, InfoValue::Vector(flatten_3x3(&virial)));
    Ok(())
}

/// 生成合成数据集
pub fn fit_data() -> Result<FitData> {
    let calc = reference_calculator();

    let isolated = Configuration::new(
        vec!["Al".to_string()],
        vec![Vector3::zeros()],
        Cell::cubic(10.0),
        [false; 3],
    )?;
    let e0s = BTreeMap::from([("Al".to_string(), calc.calculate(&isolated)?.energy)]);

    // 结构按顺序生成，保证随机序列可复现
    let mut rng = ChaCha8Rng::seed_from_u64(DATA_SEED);
    let prim = fcc_aluminium_primitive();
    let mut fit_configs = (0..N_GENERATED)
        .map(|_| synthetic_structure(&prim, &mut rng))
        .collect::<Result<Vec<_>>>()?;
    let mut test_configs = (0..N_GENERATED)
        .map(|_| synthetic_structure(&prim, &mut rng))
        .collect::<Result<Vec<_>>>()?;

    fit_configs
        .par_iter_mut()
        .chain(test_configs.par_iter_mut())
        .try_for_each(|config| label_configuration(config, &calc))?;

    // 能量与维里按原子数计权
    for config in fit_configs.iter_mut().chain(test_configs.iter_mut()) {
        let per_atom = 1.0 / config.len() as f64;
        config.set_info(format!("{}_weight", ENERGY_KEY), InfoValue::Scalar(per_atom));
        config.set_info(format!("{}_weight", VIRIAL_KEY), InfoValue::Scalar(per_atom));
    }

    // 数据越少，可迁移性越差
    fit_configs.truncate(N_FIT_KEPT);

    Ok(FitData {
        fit_configs,
        test_configs,
        e0s,
        data_keys: DataKeys::new(ENERGY_KEY, FORCES_KEY, VIRIAL_KEY),
        weights: PropertyWeights::new(10.0, 1.0, 1.0),
    })
}

/// 标准对基
pub fn standard_basis_info() -> BasisInfo {
    BasisInfo {
        elements: vec!["Al".to_string()],
        cor_order: 2,
        maxdeg: 6,
        r_cut: 3.75,
        r_in: 2.0,
        r_0: 2.0 * 1.414,
        pairs_r_dict: BTreeMap::new(),
        maxdeg_pair: None,
        r_cut_pair: None,
        flavour: BasisFlavour::Standard,
    }
}

/// 平滑对基 (Agnesi q = 4)
pub fn smooth_basis_info() -> BasisInfo {
    BasisInfo {
        elements: vec!["Al".to_string()],
        cor_order: 2,
        maxdeg: 6,
        r_cut: 3.75,
        r_in: 0.0,
        r_0: 2.0 * 1.414,
        pairs_r_dict: BTreeMap::new(),
        maxdeg_pair: Some(8),
        r_cut_pair: Some(3.75),
        flavour: BasisFlavour::Smooth { agnesi_q: 4.0 },
    }
}

/// 观测数：每个构型 1 个能量与 6 个维里分量，加上 3N 个受力分量
pub fn n_observations(configs: &[Configuration]) -> usize {
    configs.len() * (1 + 6) + 3 * configs.iter().map(Configuration::len).sum::<usize>()
}

fn fit_with_basis(data: &FitData, info: &BasisInfo) -> Result<FittedModelInfo> {
    let basis = define_basis(info)?;
    let solver = BayesianRidge {
        fit_intercept: false,
        compute_score: true,
        ..Default::default()
    };

    let mut rng = ChaCha8Rng::seed_from_u64(COMMITTEE_SEED);
    let output = fit(
        &data.fit_configs,
        &solver,
        &basis,
        &data.e0s,
        &data.data_keys,
        &data.weights,
        N_COMMITTEE,
        &mut rng,
        true,
    )?;

    let linear_problem = output.linear_problem.ok_or_else(|| {
        AceError::Other("fit did not return the linear problem".to_string())
    })?;

    Ok(FittedModelInfo {
        calc: output.calc,
        linear_problem,
        coef: output.coef,
        n_observations: n_observations(&data.fit_configs),
        basis,
    })
}

/// 标准对基模型及诊断信息
pub fn fit_model_all_info(data: &FitData) -> Result<FittedModelInfo> {
    fit_with_basis(data, &standard_basis_info())
}

/// 只返回标准对基模型
pub fn fit_model(data: &FitData) -> Result<FittedPairCalculator> {
    Ok(fit_model_all_info(data)?.calc)
}

/// 平滑对基模型及诊断信息
pub fn fit_model_smooth_all_info(data: &FitData) -> Result<FittedModelInfo> {
    fit_with_basis(data, &smooth_basis_info())
}

/// 只返回平滑对基模型
pub fn fit_model_smooth(data: &FitData) -> Result<FittedPairCalculator> {
    Ok(fit_model_smooth_all_info(data)?.calc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_synthetic_structure_shape() {
        let mut rng = ChaCha8Rng::seed_from_u64(DATA_SEED);
        let sc = synthetic_structure(&fcc_aluminium_primitive(), &mut rng).unwrap();
        assert_eq!(sc.len(), 64);
        // 2% 应变下体积接近 64 * 16
        assert!((sc.volume() / 1024.0 - 1.0).abs() < 0.2);
    }

    #[test]
    fn test_label_configuration_stores_reference() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut sc = synthetic_structure(&fcc_aluminium_primitive(), &mut rng).unwrap();
        let calc = reference_calculator();
        label_configuration(&mut sc, &calc).unwrap();

        let results = calc.calculate(&sc).unwrap();
        assert_relative_eq!(sc.info_scalar(ENERGY_KEY).unwrap(), results.energy);
        assert_eq!(sc.arrays[FORCES_KEY].len(), 64);
        let virial = sc.info_vector(VIRIAL_KEY).unwrap();
        assert_eq!(virial.len(), 9);
        assert_relative_eq!(virial[0], -sc.volume() * results.stress[(0, 0)]);
    }

    #[test]
    fn test_n_observations() {
        let prim = fcc_aluminium_primitive();
        let configs = vec![prim.repeat([2, 1, 1]), prim.clone()];
        assert_eq!(n_observations(&configs), 2 * 7 + 3 * 3);
    }
}
