//! # 线性求解器
//!
//! - `RidgeSolver`: 固定正则化的岭回归
//! - `BayesianRidge`: 证据最大化迭代更新噪声精度 α 与权重精度 λ
//!   (MacKay 更新，Gamma 超先验)，不拟合截距
//!
//! 两者都返回系数与后验协方差，供委员会采样使用。
//!
//! ## 依赖关系
//! - 被 `fit/mod.rs`, `commands/fit.rs` 使用
//! - 使用 `nalgebra` 的 Cholesky 与对称特征分解

use crate::error::{AceError, Result};

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// 求解结果
#[derive(Debug, Clone)]
pub struct SolverFit {
    pub coef: DVector<f64>,
    pub posterior_cov: DMatrix<f64>,
    /// 每次迭代的对数边际似然（仅在开启时记录）
    pub scores: Vec<f64>,
    pub n_iter: usize,
}

/// 线性求解器接口
pub trait LinearSolver: Send + Sync {
    fn fit(&self, psi: &DMatrix<f64>, y: &DVector<f64>) -> Result<SolverFit>;

    fn name(&self) -> &str;
}

fn check_shapes(psi: &DMatrix<f64>, y: &DVector<f64>) -> Result<()> {
    if psi.nrows() != y.len() {
        return Err(AceError::ShapeMismatch(format!(
            "design matrix has {} rows but target has {} entries",
            psi.nrows(),
            y.len()
        )));
    }
    if psi.ncols() == 0 || psi.nrows() == 0 {
        return Err(AceError::Solver("empty linear problem".to_string()));
    }
    Ok(())
}

/// 岭回归
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RidgeSolver {
    pub lambda: f64,
}

impl Default for RidgeSolver {
    fn default() -> Self {
        RidgeSolver { lambda: 1e-3 }
    }
}

impl LinearSolver for RidgeSolver {
    fn fit(&self, psi: &DMatrix<f64>, y: &DVector<f64>) -> Result<SolverFit> {
        check_shapes(psi, y)?;
        let (n, p) = psi.shape();

        let gram = psi.tr_mul(psi) + DMatrix::identity(p, p) * self.lambda;
        let chol = gram
            .cholesky()
            .ok_or_else(|| AceError::Solver("regularised normal matrix is not positive definite".to_string()))?;

        let coef = chol.solve(&psi.tr_mul(y));
        let residual = y - psi * &coef;
        let dof = n.saturating_sub(p).max(1) as f64;
        let sigma2 = residual.norm_squared() / dof;

        Ok(SolverFit {
            coef,
            posterior_cov: chol.inverse() * sigma2,
            scores: Vec::new(),
            n_iter: 1,
        })
    }

    fn name(&self) -> &str {
        "ridge"
    }
}

/// 贝叶斯岭回归
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BayesianRidge {
    pub max_iter: usize,
    pub tol: f64,
    pub fit_intercept: bool,
    pub compute_score: bool,
    pub alpha_1: f64,
    pub alpha_2: f64,
    pub lambda_1: f64,
    pub lambda_2: f64,
}

impl Default for BayesianRidge {
    fn default() -> Self {
        BayesianRidge {
            max_iter: 300,
            tol: 1e-3,
            fit_intercept: false,
            compute_score: false,
            alpha_1: 1e-6,
            alpha_2: 1e-6,
            lambda_1: 1e-6,
            lambda_2: 1e-6,
        }
    }
}

impl BayesianRidge {
    /// 对数边际似然
    fn log_marginal_likelihood(
        &self,
        n_samples: usize,
        eigen: &DVector<f64>,
        alpha: f64,
        lambda: f64,
        coef: &DVector<f64>,
        rss: f64,
    ) -> f64 {
        let n = n_samples as f64;
        let p = coef.len() as f64;
        let logdet_sigma: f64 = -eigen.iter().map(|e| (lambda + alpha * e).ln()).sum::<f64>();

        let mut score = self.lambda_1 * lambda.ln() - self.lambda_2 * lambda;
        score += self.alpha_1 * alpha.ln() - self.alpha_2 * alpha;
        score += 0.5
            * (p * lambda.ln() + n * alpha.ln() - alpha * rss - lambda * coef.norm_squared() + logdet_sigma
                - n * (2.0 * std::f64::consts::PI).ln());
        score
    }
}

impl LinearSolver for BayesianRidge {
    fn fit(&self, psi: &DMatrix<f64>, y: &DVector<f64>) -> Result<SolverFit> {
        check_shapes(psi, y)?;
        if self.fit_intercept {
            return Err(AceError::Solver(
                "intercept fitting is not available, the pair model has no constant term".to_string(),
            ));
        }

        let (n, p) = psi.shape();
        let eig = psi.tr_mul(psi).symmetric_eigen();
        let eigen = eig.eigenvalues.map(|e| e.max(0.0));
        let v = eig.eigenvectors;
        let vty = v.tr_mul(&psi.tr_mul(y));

        // 后验均值 V diag(1 / (e + λ/α)) Vᵀ Xᵀ y
        let posterior_mean = |alpha: f64, lambda: f64| -> DVector<f64> {
            let w = DVector::from_iterator(
                p,
                vty.iter()
                    .zip(eigen.iter())
                    .map(|(b, e)| b / (e + lambda / alpha)),
            );
            &v * w
        };

        let mean_y = y.mean();
        let var_y = y.iter().map(|t| (t - mean_y).powi(2)).sum::<f64>() / n as f64;
        let mut alpha = 1.0 / (var_y + f64::EPSILON);
        let mut lambda = 1.0;

        let mut scores = Vec::new();
        let mut previous: Option<DVector<f64>> = None;
        let mut n_iter = self.max_iter;
        let mut converged = false;

        for iter in 0..self.max_iter {
            let coef = posterior_mean(alpha, lambda);
            let rss = (y - psi * &coef).norm_squared();

            if self.compute_score {
                scores.push(self.log_marginal_likelihood(n, &eigen, alpha, lambda, &coef, rss));
            }

            let gamma: f64 = eigen.iter().map(|e| alpha * e / (lambda + alpha * e)).sum();
            lambda = (gamma + 2.0 * self.lambda_1) / (coef.norm_squared() + 2.0 * self.lambda_2);
            alpha = (n as f64 - gamma + 2.0 * self.alpha_1) / (rss + 2.0 * self.alpha_2);

            if let Some(prev) = &previous {
                if (prev - &coef).abs().sum() < self.tol {
                    log::debug!("bayesian ridge converged after {} iterations", iter + 1);
                    n_iter = iter + 1;
                    converged = true;
                    break;
                }
            }
            previous = Some(coef);
        }

        if !converged {
            log::warn!("bayesian ridge did not converge in {} iterations", self.max_iter);
        }

        let coef = posterior_mean(alpha, lambda);
        if self.compute_score {
            let rss = (y - psi * &coef).norm_squared();
            scores.push(self.log_marginal_likelihood(n, &eigen, alpha, lambda, &coef, rss));
        }

        if !alpha.is_finite() || !lambda.is_finite() || coef.iter().any(|c| !c.is_finite()) {
            return Err(AceError::Solver(format!(
                "evidence maximisation diverged (alpha = {}, lambda = {})",
                alpha, lambda
            )));
        }
        log::info!("bayesian ridge: alpha = {:.4e}, lambda = {:.4e}", alpha, lambda);

        let scale = DVector::from_iterator(p, eigen.iter().map(|e| 1.0 / (alpha * e + lambda)));
        let posterior_cov = &v * DMatrix::from_diagonal(&scale) * v.transpose();

        Ok(SolverFit {
            coef,
            posterior_cov,
            scores,
            n_iter,
        })
    }

    fn name(&self) -> &str {
        "bayesian_ridge"
    }
}

/// 求解器配置（TOML）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SolverConfig {
    Ridge(RidgeSolver),
    BayesianRidge(BayesianRidge),
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig::BayesianRidge(BayesianRidge::default())
    }
}

impl SolverConfig {
    pub fn build(&self) -> Box<dyn LinearSolver> {
        match *self {
            SolverConfig::Ridge(s) => Box::new(s),
            SolverConfig::BayesianRidge(s) => Box::new(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn synthetic_problem(noise: f64) -> (DMatrix<f64>, DVector<f64>, DVector<f64>) {
        let n = 60;
        let psi = DMatrix::from_fn(n, 3, |i, j| {
            let x = i as f64 / n as f64;
            match j {
                0 => 1.0,
                1 => x,
                _ => (3.0 * x).sin(),
            }
        });
        let truth = DVector::from_vec(vec![0.5, -2.0, 1.5]);
        let y = &psi * &truth + DVector::from_fn(n, |i, _| noise * (7.3 * i as f64).sin());
        (psi, y, truth)
    }

    #[test]
    fn test_ridge_recovers_noise_free_coefficients() {
        let (psi, y, truth) = synthetic_problem(0.0);
        let fit = RidgeSolver { lambda: 1e-10 }.fit(&psi, &y).unwrap();
        for k in 0..3 {
            assert_relative_eq!(fit.coef[k], truth[k], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_bayesian_ridge_recovers_coefficients() {
        let (psi, y, truth) = synthetic_problem(1e-3);
        let solver = BayesianRidge {
            compute_score: true,
            ..Default::default()
        };
        let fit = solver.fit(&psi, &y).unwrap();
        for k in 0..3 {
            assert_relative_eq!(fit.coef[k], truth[k], epsilon = 1e-2);
        }
        assert!(!fit.scores.is_empty());
        assert!(fit.n_iter <= solver.max_iter);
    }

    #[test]
    fn test_posterior_covariance_is_symmetric_positive() {
        let (psi, y, _) = synthetic_problem(1e-2);
        let fit = BayesianRidge::default().fit(&psi, &y).unwrap();
        let cov = &fit.posterior_cov;
        assert_eq!(cov.shape(), (3, 3));
        for i in 0..3 {
            assert!(cov[(i, i)] > 0.0);
            for j in 0..3 {
                assert_relative_eq!(cov[(i, j)], cov[(j, i)], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_shape_mismatch() {
        let psi = DMatrix::zeros(4, 2);
        let y = DVector::zeros(3);
        assert!(matches!(
            RidgeSolver::default().fit(&psi, &y),
            Err(AceError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_intercept_is_rejected() {
        let (psi, y, _) = synthetic_problem(0.0);
        let solver = BayesianRidge {
            fit_intercept: true,
            ..Default::default()
        };
        assert!(matches!(solver.fit(&psi, &y), Err(AceError::Solver(_))));
    }

    #[test]
    fn test_solver_config_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            solver: SolverConfig,
        }
        let w: Wrapper = toml::from_str("[solver]\nkind = \"ridge\"\nlambda = 0.1\n").unwrap();
        assert_eq!(w.solver, SolverConfig::Ridge(RidgeSolver { lambda: 0.1 }));

        let w: Wrapper = toml::from_str("[solver]\nkind = \"bayesian_ridge\"\nmax_iter = 50\n").unwrap();
        match w.solver {
            SolverConfig::BayesianRidge(b) => {
                assert_eq!(b.max_iter, 50);
                assert_eq!(b.tol, 1e-3);
            }
            _ => panic!("expected bayesian ridge"),
        }
    }
}
