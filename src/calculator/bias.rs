//! # 偏置计算器
//!
//! 在基础计算器上叠加一个缩放的偏置势：E = E_base + s * E_bias，
//! 力与应力同理。未偏置能量通过 `CalcResults::unbiased_energy` 返回。
//!
//! ## 依赖关系
//! - 被 `plot/dimers.rs` 和测试使用
//! - 组合任意 `Calculator`

use crate::calculator::{CalcResults, Calculator};
use crate::error::{AceError, Result};
use crate::models::Configuration;

/// 偏置计算器
pub struct BiasCalculator {
    base: Box<dyn Calculator>,
    bias: Box<dyn Calculator>,
    strength: f64,
    name: String,
}

impl BiasCalculator {
    pub fn new(base: Box<dyn Calculator>, bias: Box<dyn Calculator>, strength: f64) -> Self {
        let name = format!("{} + {} x {}", base.name(), strength, bias.name());
        BiasCalculator {
            base,
            bias,
            strength,
            name,
        }
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }
}

impl Calculator for BiasCalculator {
    fn calculate(&self, config: &Configuration) -> Result<CalcResults> {
        let base = self.base.calculate(config)?;
        let bias = self.bias.calculate(config)?;

        if base.forces.len() != bias.forces.len() {
            return Err(AceError::ShapeMismatch(format!(
                "base calculator returned {} forces, bias returned {}",
                base.forces.len(),
                bias.forces.len()
            )));
        }

        let forces = base
            .forces
            .iter()
            .zip(&bias.forces)
            .map(|(f, b)| f + b * self.strength)
            .collect();

        Ok(CalcResults {
            energy: base.energy + self.strength * bias.energy,
            forces,
            stress: base.stress + bias.stress * self.strength,
            unbiased_energy: Some(base.physical_energy()),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_biased(&self) -> bool {
        true
    }
}
