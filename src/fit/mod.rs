//! # 线性拟合模块
//!
//! 对基 + 线性求解器 + 委员会采样的最小拟合流程：
//!
//! 1. 组装加权线性问题 (`problem`)
//! 2. 按基函数归一化设计矩阵的列后求解 (`solver`)
//! 3. 从后验 N(coef, cov) 中抽取委员会系数
//! 4. 系数还原到未归一化的基上，构建 `FittedPairCalculator`
//!
//! ## 子模块
//! - `basis`: 对基定义
//! - `problem`: 线性问题组装
//! - `solver`: 岭回归 / 贝叶斯岭回归
//! - `model`: 拟合得到的计算器
//! - `config`: TOML 拟合配置
//!
//! ## 依赖关系
//! - 被 `fixtures/`, `commands/fit.rs` 使用
//! - 使用 `rand` / `rand_distr` 采样委员会

pub mod basis;
pub mod config;
pub mod model;
pub mod problem;
pub mod solver;

pub use basis::{define_basis, BasisDescriptor, BasisFlavour, BasisInfo, PairBasis};
pub use config::FitConfig;
pub use model::FittedPairCalculator;
pub use problem::{assemble_linear_problem, LinearProblem, PropRowIndices, PropertyWeights};
pub use solver::{BayesianRidge, LinearSolver, RidgeSolver, SolverConfig, SolverFit};

use crate::error::Result;
use crate::models::Configuration;
use crate::report::DataKeys;

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use std::collections::BTreeMap;

/// 拟合输出
#[derive(Debug, Clone)]
pub struct FitOutput {
    pub calc: FittedPairCalculator,
    /// 未归一化的设计矩阵与目标，仅在请求时返回
    pub linear_problem: Option<LinearProblem>,
    pub coef: DVector<f64>,
    pub n_iter: usize,
}

/// 从多元正态 N(mean, cov) 抽样，cov 可以半正定
pub fn sample_committee<R: Rng>(
    mean: &DVector<f64>,
    cov: &DMatrix<f64>,
    n_committee: usize,
    rng: &mut R,
) -> Vec<DVector<f64>> {
    let eig = cov.clone().symmetric_eigen();
    let scale = eig.eigenvalues.map(|e| e.max(0.0).sqrt());
    let n = mean.len();

    (0..n_committee)
        .map(|_| {
            let z = DVector::from_fn(n, |_, _| StandardNormal.sample(rng));
            mean + &eig.eigenvectors * scale.component_mul(&z)
        })
        .collect()
}

/// 拟合线性对势
#[allow(clippy::too_many_arguments)]
pub fn fit<R: Rng>(
    configs: &[Configuration],
    solver: &dyn LinearSolver,
    basis: &BasisDescriptor,
    e0s: &BTreeMap<String, f64>,
    data_keys: &DataKeys,
    weights: &PropertyWeights,
    n_committee: usize,
    rng: &mut R,
    return_linear_problem: bool,
) -> Result<FitOutput> {
    let problem = assemble_linear_problem(configs, &basis.basis, e0s, data_keys, weights)?;
    log::info!(
        "fitting {} coefficients to {} observations with {}",
        basis.len,
        problem.n_observations(),
        solver.name()
    );

    let mut psi = problem.psi.clone();
    for (k, mut column) in psi.column_iter_mut().enumerate() {
        column /= basis.norm[k];
    }

    let solution = solver.fit(&psi, &problem.y)?;
    let committee: Vec<DVector<f64>> =
        sample_committee(&solution.coef, &solution.posterior_cov, n_committee, rng)
            .into_iter()
            .map(|c| c.component_div(&basis.norm))
            .collect();
    let coef = solution.coef.component_div(&basis.norm);

    let calc = FittedPairCalculator::new(basis.basis.clone(), e0s.clone(), &coef, &committee)?;

    Ok(FitOutput {
        calc,
        linear_problem: return_linear_problem.then_some(problem),
        coef,
        n_iter: solution.n_iter,
    })
}
