//! # 应力 / 维里张量工具
//!
//! Voigt 顺序: xx, yy, zz, yz, xz, xy

use nalgebra::Matrix3;

/// 3x3 张量 -> Voigt 6 分量，非对角项取对称平均
pub fn full_3x3_to_voigt_6(m: &Matrix3<f64>) -> [f64; 6] {
    [
        m[(0, 0)],
        m[(1, 1)],
        m[(2, 2)],
        0.5 * (m[(1, 2)] + m[(2, 1)]),
        0.5 * (m[(0, 2)] + m[(2, 0)]),
        0.5 * (m[(0, 1)] + m[(1, 0)]),
    ]
}

/// Voigt 6 分量 -> 对称 3x3 张量
pub fn voigt_6_to_full_3x3(v: &[f64; 6]) -> Matrix3<f64> {
    Matrix3::new(v[0], v[5], v[4], v[5], v[1], v[3], v[4], v[3], v[2])
}

/// 将存储的参考维里（9 个或 6 个分量）转为完整 3x3
pub fn tensor_from_flat(values: &[f64]) -> Option<Matrix3<f64>> {
    match values.len() {
        9 => Some(Matrix3::from_row_slice(values)),
        6 => {
            let v: [f64; 6] = values.try_into().ok()?;
            Some(voigt_6_to_full_3x3(&v))
        }
        _ => None,
    }
}

/// 3x3 张量按行主序平铺
pub fn flatten_3x3(m: &Matrix3<f64>) -> Vec<f64> {
    (0..3)
        .flat_map(|i| (0..3).map(move |j| (i, j)))
        .map(|(i, j)| m[(i, j)])
        .collect()
}
