//! # 原子构型数据模型
//!
//! 定义拟合与误差分析使用的统一原子构型表示：位置、晶胞、周期性边界，
//! 以及按键名存储的参考性质（每结构 `info`、每原子 `arrays`）。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `calculator/`, `report/`, `fit/`, `fixtures/` 使用
//! - 使用 `nalgebra` 做晶胞代数

use crate::error::{AceError, Result};

use nalgebra::{Matrix3, Vector3};
use rand::Rng;
use rand_distr::StandardNormal;
use std::collections::BTreeMap;

/// 晶胞，行向量表示 a, b, c
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub matrix: Matrix3<f64>,
}

impl Cell {
    /// 从晶格向量矩阵创建
    pub fn from_vectors(rows: [[f64; 3]; 3]) -> Self {
        Cell {
            matrix: Matrix3::from_row_slice(&[
                rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2],
                rows[2][0], rows[2][1], rows[2][2],
            ]),
        }
    }

    /// 立方晶胞
    pub fn cubic(edge: f64) -> Self {
        Cell {
            matrix: Matrix3::from_diagonal_element(edge),
        }
    }

    /// 第 i 个晶格向量
    pub fn vector(&self, i: usize) -> Vector3<f64> {
        self.matrix.row(i).transpose()
    }

    /// 晶胞体积（行列式绝对值）
    pub fn volume(&self) -> f64 {
        self.matrix.determinant().abs()
    }

    /// 三个方向的面间距 V / |b × c| 等
    pub fn heights(&self) -> [f64; 3] {
        let volume = self.volume();
        let a = self.vector(0);
        let b = self.vector(1);
        let c = self.vector(2);
        [
            volume / b.cross(&c).norm(),
            volume / c.cross(&a).norm(),
            volume / a.cross(&b).norm(),
        ]
    }

    /// 笛卡尔坐标转分数坐标，晶胞奇异时返回 None
    pub fn to_fractional(&self, p: &Vector3<f64>) -> Option<Vector3<f64>> {
        let inv_t = self.matrix.transpose().try_inverse()?;
        Some(inv_t * p)
    }

    /// 分数坐标转笛卡尔坐标
    pub fn to_cartesian(&self, f: &Vector3<f64>) -> Vector3<f64> {
        self.matrix.transpose() * f
    }
}

/// 每结构性质的取值
#[derive(Debug, Clone, PartialEq)]
pub enum InfoValue {
    Scalar(f64),
    Vector(Vec<f64>),
    Text(String),
}

impl InfoValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            InfoValue::Scalar(v) => Some(*v),
            InfoValue::Vector(v) if v.len() == 1 => Some(v[0]),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[f64]> {
        match self {
            InfoValue::Vector(v) => Some(v),
            InfoValue::Scalar(v) => Some(std::slice::from_ref(v)),
            InfoValue::Text(_) => None,
        }
    }
}

/// 每原子数组，按行主序平铺存储
#[derive(Debug, Clone, PartialEq)]
pub struct PerAtomArray {
    pub width: usize,
    pub data: Vec<f64>,
}

impl PerAtomArray {
    pub fn new(width: usize, data: Vec<f64>) -> Self {
        PerAtomArray { width, data }
    }

    pub fn from_vec3(rows: &[[f64; 3]]) -> Self {
        PerAtomArray {
            width: 3,
            data: rows.iter().flatten().copied().collect(),
        }
    }

    /// 行数（原子数）
    pub fn len(&self) -> usize {
        if self.width == 0 {
            0
        } else {
            self.data.len() / self.width
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.width..(i + 1) * self.width]
    }
}

/// 原子构型
#[derive(Debug, Clone)]
pub struct Configuration {
    /// 元素符号
    pub symbols: Vec<String>,

    /// 笛卡尔坐标 (Å)
    pub positions: Vec<Vector3<f64>>,

    /// 晶胞
    pub cell: Cell,

    /// 周期性边界
    pub pbc: [bool; 3],

    /// 每结构性质（能量、维里、权重等）
    pub info: BTreeMap<String, InfoValue>,

    /// 每原子性质（力等）
    pub arrays: BTreeMap<String, PerAtomArray>,
}

impl Configuration {
    pub fn new(
        symbols: Vec<String>,
        positions: Vec<Vector3<f64>>,
        cell: Cell,
        pbc: [bool; 3],
    ) -> Result<Self> {
        if symbols.len() != positions.len() {
            return Err(AceError::ShapeMismatch(format!(
                "{} symbols but {} positions",
                symbols.len(),
                positions.len()
            )));
        }
        Ok(Configuration {
            symbols,
            positions,
            cell,
            pbc,
            info: BTreeMap::new(),
            arrays: BTreeMap::new(),
        })
    }

    /// 原子数
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn volume(&self) -> f64 {
        self.cell.volume()
    }

    pub fn is_periodic(&self) -> bool {
        self.pbc.iter().any(|&p| p)
    }

    pub fn info_scalar(&self, key: &str) -> Option<f64> {
        self.info.get(key).and_then(InfoValue::as_scalar)
    }

    pub fn info_vector(&self, key: &str) -> Option<&[f64]> {
        self.info.get(key).and_then(InfoValue::as_vector)
    }

    pub fn set_info(&mut self, key: impl Into<String>, value: InfoValue) {
        self.info.insert(key.into(), value);
    }

    /// 写入每原子数组，行数必须等于原子数
    pub fn set_array(&mut self, key: impl Into<String>, array: PerAtomArray) -> Result<()> {
        let key = key.into();
        if array.len() != self.len() {
            return Err(AceError::ShapeMismatch(format!(
                "array '{}' has {} rows for {} atoms",
                key,
                array.len(),
                self.len()
            )));
        }
        self.arrays.insert(key, array);
        Ok(())
    }

    /// 性质的拟合权重，存储在 `<key>_weight`，缺省为 1
    pub fn weight(&self, key: &str) -> f64 {
        self.info_scalar(&format!("{}_weight", key)).unwrap_or(1.0)
    }

    /// 计算化学式
    pub fn formula(&self) -> String {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for symbol in &self.symbols {
            *counts.entry(symbol.as_str()).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .map(|(el, count)| {
                if count == 1 {
                    el.to_string()
                } else {
                    format!("{}{}", el, count)
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// 超胞扩展，原子按 (n0, n1, n2) 平移块依次追加；参考性质不复制
    pub fn repeat(&self, reps: [usize; 3]) -> Configuration {
        let mut symbols = Vec::with_capacity(self.len() * reps.iter().product::<usize>());
        let mut positions = Vec::with_capacity(symbols.capacity());

        for m0 in 0..reps[0] {
            for m1 in 0..reps[1] {
                for m2 in 0..reps[2] {
                    let shift = self.cell.vector(0) * m0 as f64
                        + self.cell.vector(1) * m1 as f64
                        + self.cell.vector(2) * m2 as f64;
                    for (symbol, pos) in self.symbols.iter().zip(&self.positions) {
                        symbols.push(symbol.clone());
                        positions.push(pos + shift);
                    }
                }
            }
        }

        let mut matrix = self.cell.matrix;
        for (i, &n) in reps.iter().enumerate() {
            let scaled = matrix.row(i) * n as f64;
            matrix.set_row(i, &scaled);
        }

        Configuration {
            symbols,
            positions,
            cell: Cell { matrix },
            pbc: self.pbc,
            info: BTreeMap::new(),
            arrays: BTreeMap::new(),
        }
    }

    /// 高斯随机位移
    pub fn rattle<R: Rng>(&mut self, stdev: f64, rng: &mut R) {
        for pos in &mut self.positions {
            for k in 0..3 {
                let z: f64 = rng.sample(StandardNormal);
                pos[k] += stdev * z;
            }
        }
    }

    /// 替换晶胞，原子随晶胞一起形变（保持分数坐标不变）
    pub fn set_cell_scaled(&mut self, cell: Cell) -> Result<()> {
        let fractional = self
            .positions
            .iter()
            .map(|p| self.cell.to_fractional(p))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| AceError::InvalidArgument("cannot scale atoms in a singular cell".into()))?;

        self.positions = fractional.iter().map(|f| cell.to_cartesian(f)).collect();
        self.cell = cell;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn fcc_primitive() -> Configuration {
        let cell = Cell::from_vectors([[2.0, 2.0, 0.0], [2.0, 0.0, 2.0], [0.0, 2.0, 2.0]]);
        Configuration::new(vec!["Al".into()], vec![Vector3::zeros()], cell, [true; 3]).unwrap()
    }

    #[test]
    fn test_cell_volume_cubic() {
        let cell = Cell::cubic(5.0);
        assert!((cell.volume() - 125.0).abs() < 1e-9);
        for h in cell.heights() {
            assert!((h - 5.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_fractional_round_trip() {
        let cell = Cell::from_vectors([[2.0, 2.0, 0.0], [2.0, 0.0, 2.0], [0.0, 2.0, 2.0]]);
        let p = Vector3::new(1.3, -0.4, 2.2);
        let f = cell.to_fractional(&p).unwrap();
        let back = cell.to_cartesian(&f);
        assert!((back - p).norm() < 1e-12);
    }

    #[test]
    fn test_repeat_fcc() {
        let sc = fcc_primitive().repeat([4, 4, 4]);
        assert_eq!(sc.len(), 64);
        assert!((sc.volume() - 16.0 * 64.0).abs() < 1e-9);
        assert_eq!(sc.formula(), "Al64");
    }

    #[test]
    fn test_set_cell_scaled_moves_atoms() {
        let mut sc = fcc_primitive().repeat([2, 1, 1]);
        let stretched = Cell {
            matrix: sc.cell.matrix * 1.1,
        };
        sc.set_cell_scaled(stretched).unwrap();
        assert!((sc.positions[1] - Vector3::new(2.2, 2.2, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_rattle_is_small() {
        let mut sc = fcc_primitive().repeat([2, 2, 2]);
        let before = sc.positions.clone();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        sc.rattle(0.001, &mut rng);
        let moved = before
            .iter()
            .zip(&sc.positions)
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max);
        assert!(moved > 0.0 && moved < 0.01);
    }

    #[test]
    fn test_weight_defaults_to_one() {
        let mut at = fcc_primitive();
        assert_eq!(at.weight("REF_energy"), 1.0);
        at.set_info("REF_energy_weight", InfoValue::Scalar(0.25));
        assert_eq!(at.weight("REF_energy"), 0.25);
    }

    #[test]
    fn test_set_array_checks_rows() {
        let mut at = fcc_primitive();
        let bad = PerAtomArray::from_vec3(&[[0.0; 3], [0.0; 3]]);
        assert!(at.set_array("forces", bad).is_err());
    }
}
