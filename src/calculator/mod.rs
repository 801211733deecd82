//! # 计算器模块
//!
//! 定义能量 / 力 / 应力计算器的统一接口。
//!
//! 偏置计算器通过 `CalcResults::unbiased_energy` 和 `Calculator::is_biased`
//! 暴露未偏置能量，调用方不做类型判断。
//!
//! ## 依赖关系
//! - 被 `report/`, `plot/`, `fit/`, `fixtures/` 使用
//! - 使用 `models/structure.rs`
//! - 子模块: pair, bias

pub mod bias;
pub mod pair;

pub use bias::BiasCalculator;
pub use pair::{LennardJones, Morse, PairCalculator, PairPotential};

use crate::error::Result;
use crate::models::Configuration;

use nalgebra::{Matrix3, Vector3};

/// 单次计算结果
#[derive(Debug, Clone)]
pub struct CalcResults {
    /// 势能 (eV)，偏置计算器为偏置后的能量
    pub energy: f64,

    /// 每原子受力 (eV/Å)
    pub forces: Vec<Vector3<f64>>,

    /// 完整 3x3 应力张量，stress = (1/V) dE/dε
    pub stress: Matrix3<f64>,

    /// 偏置计算器的未偏置能量
    pub unbiased_energy: Option<f64>,
}

impl CalcResults {
    /// 维里 = -V * stress
    pub fn virial(&self, volume: f64) -> Matrix3<f64> {
        -volume * self.stress
    }

    /// 有未偏置能量时返回之，否则返回报告能量
    pub fn physical_energy(&self) -> f64 {
        self.unbiased_energy.unwrap_or(self.energy)
    }

    /// 力按原子、分量平铺
    pub fn flat_forces(&self) -> Vec<f64> {
        self.forces.iter().flat_map(|f| [f.x, f.y, f.z]).collect()
    }
}

/// 计算器接口
pub trait Calculator: Send + Sync {
    /// 计算能量、力与应力
    fn calculate(&self, config: &Configuration) -> Result<CalcResults>;

    /// 计算器名称
    fn name(&self) -> &str;

    /// 是否为偏置计算器
    fn is_biased(&self) -> bool {
        false
    }
}

impl<T: Calculator + ?Sized> Calculator for Box<T> {
    fn calculate(&self, config: &Configuration) -> Result<CalcResults> {
        (**self).calculate(config)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_biased(&self) -> bool {
        (**self).is_biased()
    }
}
