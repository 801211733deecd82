//! # 近邻搜索
//!
//! 在截断半径内枚举所有有序原子对 (i, j, 平移)，周期方向包含镜像。
//! 每个无序对出现两次，调用方按 1/2 计权。
//!
//! ## 依赖关系
//! - 被 `calculator/pair.rs`, `fit/basis.rs` 使用
//! - 使用 `models/structure.rs`

use crate::error::{AceError, Result};
use crate::models::Configuration;

use nalgebra::Vector3;

/// 有序近邻对，`d = r_j + shift - r_i`
#[derive(Debug, Clone, Copy)]
pub struct NeighborPair {
    pub i: usize,
    pub j: usize,
    pub d: Vector3<f64>,
    pub r: f64,
}

/// 枚举截断半径内的所有有序近邻对
pub fn neighbor_pairs(config: &Configuration, cutoff: f64) -> Result<Vec<NeighborPair>> {
    let positions = wrapped_positions(config)?;
    let heights = config.cell.heights();

    let mut ranges = [0i64; 3];
    for k in 0..3 {
        if config.pbc[k] {
            if !(heights[k].is_finite() && heights[k] > 0.0) {
                return Err(AceError::InvalidArgument(format!(
                    "degenerate cell along periodic direction {}",
                    k
                )));
            }
            ranges[k] = (cutoff / heights[k]).ceil() as i64;
        }
    }

    let mut shifts = Vec::new();
    for n0 in -ranges[0]..=ranges[0] {
        for n1 in -ranges[1]..=ranges[1] {
            for n2 in -ranges[2]..=ranges[2] {
                let shift = config.cell.vector(0) * n0 as f64
                    + config.cell.vector(1) * n1 as f64
                    + config.cell.vector(2) * n2 as f64;
                shifts.push(((n0, n1, n2) == (0, 0, 0), shift));
            }
        }
    }

    let cutoff_sq = cutoff * cutoff;
    let mut pairs = Vec::new();
    for (i, ri) in positions.iter().enumerate() {
        for (j, rj) in positions.iter().enumerate() {
            for (is_origin, shift) in &shifts {
                if i == j && *is_origin {
                    continue;
                }
                let d = rj + shift - ri;
                let r_sq = d.norm_squared();
                if r_sq < cutoff_sq {
                    pairs.push(NeighborPair {
                        i,
                        j,
                        d,
                        r: r_sq.sqrt(),
                    });
                }
            }
        }
    }

    Ok(pairs)
}

/// 周期方向上把原子折回晶胞内，非周期方向保持原样
fn wrapped_positions(config: &Configuration) -> Result<Vec<Vector3<f64>>> {
    if !config.is_periodic() {
        return Ok(config.positions.clone());
    }

    config
        .positions
        .iter()
        .map(|p| {
            let mut f = config.cell.to_fractional(p).ok_or_else(|| {
                AceError::InvalidArgument("singular cell in periodic structure".to_string())
            })?;
            for k in 0..3 {
                if config.pbc[k] {
                    f[k] -= f[k].floor();
                }
            }
            Ok(config.cell.to_cartesian(&f))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;

    #[test]
    fn test_simple_cubic_coordination() {
        let config = Configuration::new(
            vec!["Po".into()],
            vec![Vector3::zeros()],
            Cell::cubic(3.0),
            [true; 3],
        )
        .unwrap();
        // 6 nearest neighbours at 3.0 Å, cutoff between first and second shell
        let pairs = neighbor_pairs(&config, 3.5).unwrap();
        assert_eq!(pairs.len(), 6);
        assert!(pairs.iter().all(|p| (p.r - 3.0).abs() < 1e-12));
    }

    #[test]
    fn test_non_periodic_dimer() {
        let config = Configuration::new(
            vec!["Al".into(), "Al".into()],
            vec![Vector3::zeros(), Vector3::new(2.5, 0.0, 0.0)],
            Cell::cubic(20.0),
            [false; 3],
        )
        .unwrap();
        let pairs = neighbor_pairs(&config, 5.0).unwrap();
        assert_eq!(pairs.len(), 2);
        assert!((pairs[0].d.x - 2.5).abs() < 1e-12);
        assert!((pairs[1].d.x + 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_atoms_outside_cell_are_wrapped() {
        let inside = Configuration::new(
            vec!["Po".into(), "Po".into()],
            vec![Vector3::zeros(), Vector3::new(1.5, 1.5, 1.5)],
            Cell::cubic(3.0),
            [true; 3],
        )
        .unwrap();
        let mut outside = inside.clone();
        outside.positions[1] += Vector3::new(6.0, -3.0, 9.0);

        let a = neighbor_pairs(&inside, 4.0).unwrap();
        let b = neighbor_pairs(&outside, 4.0).unwrap();
        assert_eq!(a.len(), b.len());
    }
}
