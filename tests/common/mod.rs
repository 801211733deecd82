#![allow(dead_code)]

use acereport::calculator::{CalcResults, Calculator};
use acereport::fixtures;
use acereport::models::Configuration;
use acereport::Result;

use nalgebra::{Matrix3, Vector3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// 每个原子贡献固定能量，受力与应力为零
pub struct ConstantCalculator {
    pub energy_per_atom: f64,
}

impl Calculator for ConstantCalculator {
    fn calculate(&self, config: &Configuration) -> Result<CalcResults> {
        Ok(CalcResults {
            energy: self.energy_per_atom * config.len() as f64,
            forces: vec![Vector3::zeros(); config.len()],
            stress: Matrix3::zeros(),
            unbiased_energy: None,
        })
    }

    fn name(&self) -> &str {
        "Constant"
    }
}

/// 用参考 LJ 势标注的应变、扰动 64 原子铝超胞
pub fn labelled_bulk(n: usize, seed: u64) -> Vec<Configuration> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let prim = fixtures::fcc_aluminium_primitive();
    let calc = fixtures::reference_calculator();
    (0..n)
        .map(|_| {
            let mut config = fixtures::synthetic_structure(&prim, &mut rng).unwrap();
            fixtures::label_configuration(&mut config, &calc).unwrap();
            config
        })
        .collect()
}
