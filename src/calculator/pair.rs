//! # 对势参考计算器
//!
//! 截断平移的 Lennard-Jones 与 Morse 对势，支持周期性晶胞下的
//! 能量、受力与完整应力张量。用作合成参考数据的“真值”计算器。
//!
//! ## 依赖关系
//! - 被 `fixtures/`, `commands/` 使用
//! - 使用 `models/neighbors.rs` 枚举近邻对

use crate::calculator::{CalcResults, Calculator};
use crate::error::Result;
use crate::models::{neighbor_pairs, Configuration};

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// 对势函数
pub trait PairPotential: Send + Sync {
    /// φ(r)
    fn energy(&self, r: f64) -> f64;

    /// dφ/dr
    fn derivative(&self, r: f64) -> f64;

    /// 截断半径
    fn cutoff(&self) -> f64;
}

/// Lennard-Jones 对势，在截断处平移为零
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LennardJones {
    pub epsilon: f64,
    pub sigma: f64,
    pub cutoff: f64,
}

impl LennardJones {
    /// 铝的近似参数，最近邻距离约 2.83 Å
    pub fn aluminium() -> Self {
        LennardJones {
            epsilon: 0.4,
            sigma: 2.52,
            cutoff: 6.0,
        }
    }

    fn raw_energy(&self, r: f64) -> f64 {
        let s6 = (self.sigma / r).powi(6);
        4.0 * self.epsilon * (s6 * s6 - s6)
    }
}

impl PairPotential for LennardJones {
    fn energy(&self, r: f64) -> f64 {
        if r >= self.cutoff {
            return 0.0;
        }
        self.raw_energy(r) - self.raw_energy(self.cutoff)
    }

    fn derivative(&self, r: f64) -> f64 {
        if r >= self.cutoff {
            return 0.0;
        }
        let s6 = (self.sigma / r).powi(6);
        24.0 * self.epsilon * (s6 - 2.0 * s6 * s6) / r
    }

    fn cutoff(&self) -> f64 {
        self.cutoff
    }
}

/// Morse 对势 D[(1 - e^{-a(r-r_e)})^2 - 1]，在截断处平移为零
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Morse {
    pub d_e: f64,
    pub alpha: f64,
    pub r_e: f64,
    pub cutoff: f64,
}

impl Morse {
    /// Girifalco-Weizer 铝参数
    pub fn aluminium() -> Self {
        Morse {
            d_e: 0.2703,
            alpha: 1.1646,
            r_e: 3.253,
            cutoff: 7.0,
        }
    }

    fn raw_energy(&self, r: f64) -> f64 {
        let x = 1.0 - (-self.alpha * (r - self.r_e)).exp();
        self.d_e * (x * x - 1.0)
    }
}

impl PairPotential for Morse {
    fn energy(&self, r: f64) -> f64 {
        if r >= self.cutoff {
            return 0.0;
        }
        self.raw_energy(r) - self.raw_energy(self.cutoff)
    }

    fn derivative(&self, r: f64) -> f64 {
        if r >= self.cutoff {
            return 0.0;
        }
        let e = (-self.alpha * (r - self.r_e)).exp();
        2.0 * self.d_e * self.alpha * e * (1.0 - e)
    }

    fn cutoff(&self) -> f64 {
        self.cutoff
    }
}

/// 对势计算器
#[derive(Debug, Clone)]
pub struct PairCalculator<P> {
    potential: P,
    name: String,
}

impl<P: PairPotential> PairCalculator<P> {
    pub fn new(potential: P, name: impl Into<String>) -> Self {
        PairCalculator {
            potential,
            name: name.into(),
        }
    }

    pub fn potential(&self) -> &P {
        &self.potential
    }
}

impl<P: PairPotential> Calculator for PairCalculator<P> {
    fn calculate(&self, config: &Configuration) -> Result<CalcResults> {
        let pairs = neighbor_pairs(config, self.potential.cutoff())?;

        let mut energy = 0.0;
        let mut forces = vec![Vector3::zeros(); config.len()];
        let mut dedeps = Matrix3::zeros();

        for pair in &pairs {
            let dphi = self.potential.derivative(pair.r);
            energy += 0.5 * self.potential.energy(pair.r);
            forces[pair.i] += pair.d * (dphi / pair.r);
            dedeps += pair.d * pair.d.transpose() * (0.5 * dphi / pair.r);
        }

        // 非周期结构没有应变导数
        let volume = config.volume();
        let stress = if config.is_periodic() && volume > 0.0 {
            dedeps / volume
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

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;
    use approx::assert_relative_eq;

    fn distorted_fcc() -> Configuration {
        let prim = Configuration::new(
            vec!["Al".into()],
            vec![Vector3::zeros()],
            Cell::from_vectors([[2.0, 2.0, 0.0], [2.0, 0.0, 2.0], [0.0, 2.0, 2.0]]),
            [true; 3],
        )
        .unwrap();
        let mut sc = prim.repeat([2, 2, 2]);
        sc.positions[0] += Vector3::new(0.05, -0.03, 0.02);
        sc.positions[3] += Vector3::new(-0.04, 0.01, 0.06);
        sc
    }

    #[test]
    fn test_lj_minimum() {
        let lj = LennardJones {
            epsilon: 1.0,
            sigma: 1.0,
            cutoff: 100.0,
        };
        let r_min = 2.0_f64.powf(1.0 / 6.0);
        assert!(lj.derivative(r_min).abs() < 1e-10);
        assert_relative_eq!(lj.energy(r_min), -1.0, epsilon = 1e-6);
        assert_eq!(lj.energy(200.0), 0.0);
    }

    #[test]
    fn test_morse_minimum() {
        let morse = Morse {
            d_e: 0.5,
            alpha: 1.5,
            r_e: 2.5,
            cutoff: 50.0,
        };
        assert!(morse.derivative(2.5).abs() < 1e-12);
        assert_relative_eq!(morse.energy(2.5), -0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_forces_match_finite_difference() {
        let calc = PairCalculator::new(LennardJones::aluminium(), "lj");
        let config = distorted_fcc();
        let results = calc.calculate(&config).unwrap();

        let h = 1e-5;
        for (atom, k) in [(0, 0), (0, 2), (3, 1), (5, 0)] {
            let mut plus = config.clone();
            plus.positions[atom][k] += h;
            let mut minus = config.clone();
            minus.positions[atom][k] -= h;
            let e_plus = calc.calculate(&plus).unwrap().energy;
            let e_minus = calc.calculate(&minus).unwrap().energy;
            let numeric = -(e_plus - e_minus) / (2.0 * h);
            assert_relative_eq!(results.forces[atom][k], numeric, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_stress_matches_strain_derivative() {
        let calc = PairCalculator::new(LennardJones::aluminium(), "lj");
        let config = distorted_fcc();
        let results = calc.calculate(&config).unwrap();
        let volume = config.volume();

        let h = 1e-5;
        for (a, b) in [(0, 0), (1, 1), (0, 1), (1, 2)] {
            let mut eps = Matrix3::zeros();
            eps[(a, b)] += 0.5 * h;
            eps[(b, a)] += 0.5 * h;

            let strained = |sign: f64| {
                let mut c = config.clone();
                let deform = Matrix3::identity() + eps * sign;
                c.set_cell_scaled(Cell {
                    matrix: config.cell.matrix * deform,
                })
                .unwrap();
                calc.calculate(&c).unwrap().energy
            };
            let numeric = (strained(1.0) - strained(-1.0)) / (2.0 * h) / volume;
            assert_relative_eq!(results.stress[(a, b)], numeric, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_non_periodic_has_zero_stress() {
        let calc = PairCalculator::new(LennardJones::aluminium(), "lj");
        let dimer = Configuration::new(
            vec!["Al".into(), "Al".into()],
            vec![Vector3::zeros(), Vector3::new(2.5, 0.0, 0.0)],
            Cell::cubic(20.0),
            [false; 3],
        )
        .unwrap();
        let results = calc.calculate(&dimer).unwrap();
        assert_relative_eq!(results.energy, LennardJones::aluminium().energy(2.5));
        assert_eq!(results.stress, Matrix3::zeros());
        assert_relative_eq!(results.forces[0].x, -results.forces[1].x);
    }
}
