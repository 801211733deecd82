//! # 对基函数
//!
//! 每个元素对一组径向多项式 φ_k(r) = s(r)^(k+2)，k = 0..maxdeg-1，
//! 在截断处连同一阶导数一起趋于零。
//!
//! - 标准版: s = (r_cut - r) / (r_cut - r_in)
//! - 平滑版: 先做 Agnesi 变换 x = 1 / (1 + (r/r_0)^q)，
//!   再取 s = (x - x_cut) / (1 - x_cut)
//!
//! 归一化向量 norm_k = (k+1)^2 作为对角平滑先验。
//!
//! ## 依赖关系
//! - 被 `fit/problem.rs`, `fit/model.rs`, `fixtures/` 使用
//! - 使用 `models/neighbors.rs`, `models/elements.rs`

use crate::error::{AceError, Result};
use crate::models::elements::element_pairs;
use crate::models::{neighbor_pairs, Configuration};

use nalgebra::{DMatrix, DVector, Matrix3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 仅支持二体（对）基
pub const SUPPORTED_COR_ORDER: usize = 2;

/// 径向变换类型
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BasisFlavour {
    #[default]
    Standard,
    Smooth { agnesi_q: f64 },
}

fn default_cor_order() -> usize {
    SUPPORTED_COR_ORDER
}

/// 基组定义，可从 TOML 读取
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasisInfo {
    pub elements: Vec<String>,

    #[serde(default = "default_cor_order")]
    pub cor_order: usize,

    pub maxdeg: usize,
    pub r_cut: f64,

    #[serde(default)]
    pub r_in: f64,

    pub r_0: f64,

    /// 单独指定某些元素对的 [r_in, r_cut]，键如 "Al-Si"
    #[serde(default)]
    pub pairs_r_dict: BTreeMap<String, [f64; 2]>,

    /// 对基的最高次数，缺省用 `maxdeg`
    #[serde(default)]
    pub maxdeg_pair: Option<usize>,

    /// 对基截断，缺省用 `r_cut`
    #[serde(default)]
    pub r_cut_pair: Option<f64>,

    #[serde(default)]
    pub flavour: BasisFlavour,
}

impl BasisInfo {
    /// 从 TOML 文本读取
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// 单个元素对的基函数块
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairBlock {
    pub species: (String, String),
    pub r_in: f64,
    pub r_cut: f64,
    pub offset: usize,
}

/// 对基
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairBasis {
    pub blocks: Vec<PairBlock>,
    pub n_radial: usize,
    pub r_0: f64,
    pub flavour: BasisFlavour,
}

/// 一个构型在全部基函数上的线性描述符
#[derive(Debug, Clone)]
pub struct Descriptors {
    /// dE/dc_k
    pub energy: DVector<f64>,

    /// 力，行按 (原子, 分量) 平铺，列为基函数
    pub forces: DMatrix<f64>,

    /// 每个基函数的维里 -V * stress_k
    pub virial: Vec<Matrix3<f64>>,
}

impl PairBasis {
    /// 基函数总数
    pub fn len(&self) -> usize {
        self.blocks.len() * self.n_radial
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 最大截断半径
    pub fn cutoff(&self) -> f64 {
        self.blocks.iter().map(|b| b.r_cut).fold(0.0, f64::max)
    }

    /// 查找两个元素对应的块，顺序无关
    pub fn block_index(&self, a: &str, b: &str) -> Result<usize> {
        self.blocks
            .iter()
            .position(|blk| {
                let (x, y) = (&blk.species.0, &blk.species.1);
                (x == a && y == b) || (x == b && y == a)
            })
            .ok_or_else(|| {
                AceError::UnknownElement(format!("pair {}-{} is not covered by the basis", a, b))
            })
    }

    /// 径向坐标 s 及 ds/dr；截断外返回 None
    fn scaled_distance(&self, block: &PairBlock, r: f64) -> Option<(f64, f64)> {
        if r >= block.r_cut {
            return None;
        }
        match self.flavour {
            BasisFlavour::Standard => {
                let width = block.r_cut - block.r_in;
                Some(((block.r_cut - r) / width, -1.0 / width))
            }
            BasisFlavour::Smooth { agnesi_q: q } => {
                let agnesi = |r: f64| 1.0 / (1.0 + (r / self.r_0).powf(q));
                let x = agnesi(r);
                let x_cut = agnesi(block.r_cut);
                let dx = -q * (r / self.r_0).powf(q - 1.0) / self.r_0 * x * x;
                let width = 1.0 - x_cut;
                Some(((x - x_cut) / width, dx / width))
            }
        }
    }

    /// 一个块内所有径向函数的值与导数
    pub fn radial(&self, block: usize, r: f64) -> (Vec<f64>, Vec<f64>) {
        let mut phi = vec![0.0; self.n_radial];
        let mut dphi = vec![0.0; self.n_radial];

        if let Some((s, ds)) = self.scaled_distance(&self.blocks[block], r) {
            for k in 0..self.n_radial {
                let p = (k + 2) as i32;
                phi[k] = s.powi(p);
                dphi[k] = p as f64 * s.powi(p - 1) * ds;
            }
        }
        (phi, dphi)
    }

    /// 计算构型的描述符
    pub fn descriptors(&self, config: &Configuration) -> Result<Descriptors> {
        let n_basis = self.len();
        let mut energy = DVector::zeros(n_basis);
        let mut forces = DMatrix::zeros(3 * config.len(), n_basis);
        let mut virial = vec![Matrix3::zeros(); n_basis];

        let pairs = neighbor_pairs(config, self.cutoff())?;
        let periodic = config.is_periodic();

        for pair in &pairs {
            let block = self.block_index(&config.symbols[pair.i], &config.symbols[pair.j])?;
            let offset = self.blocks[block].offset;
            let (phi, dphi) = self.radial(block, pair.r);
            let outer = pair.d * pair.d.transpose() / pair.r;

            for k in 0..self.n_radial {
                if phi[k] == 0.0 && dphi[k] == 0.0 {
                    continue;
                }
                let col = offset + k;
                energy[col] += 0.5 * phi[k];
                for a in 0..3 {
                    forces[(3 * pair.i + a, col)] += dphi[k] * pair.d[a] / pair.r;
                }
                if periodic {
                    virial[col] -= outer * (0.5 * dphi[k]);
                }
            }
        }

        Ok(Descriptors {
            energy,
            forces,
            virial,
        })
    }
}

/// 基组、长度与归一化
#[derive(Debug, Clone, PartialEq)]
pub struct BasisDescriptor {
    pub basis: PairBasis,
    pub len: usize,
    pub norm: DVector<f64>,
}

/// 由基组定义构建对基
pub fn define_basis(info: &BasisInfo) -> Result<BasisDescriptor> {
    if info.cor_order != SUPPORTED_COR_ORDER {
        return Err(AceError::UnsupportedBasis(format!(
            "cor_order = {} (only pair bases, cor_order = {}, are available)",
            info.cor_order, SUPPORTED_COR_ORDER
        )));
    }
    if info.elements.is_empty() {
        return Err(AceError::InvalidArgument("basis has no elements".to_string()));
    }

    let n_radial = info.maxdeg_pair.unwrap_or(info.maxdeg);
    if n_radial == 0 {
        return Err(AceError::UnsupportedBasis("maxdeg must be at least 1".to_string()));
    }
    if let BasisFlavour::Smooth { agnesi_q } = info.flavour {
        if agnesi_q <= 0.0 || info.r_0 <= 0.0 {
            return Err(AceError::InvalidArgument(
                "smooth basis needs agnesi_q > 0 and r_0 > 0".to_string(),
            ));
        }
    }

    let r_cut = info.r_cut_pair.unwrap_or(info.r_cut);
    let mut blocks = Vec::new();
    for (i, (a, b)) in element_pairs(&info.elements)?.into_iter().enumerate() {
        let [r_in, r_cut] = lookup_pair_radii(&info.pairs_r_dict, a, b).unwrap_or([info.r_in, r_cut]);
        if info.flavour == BasisFlavour::Standard && r_cut <= r_in {
            return Err(AceError::InvalidArgument(format!(
                "pair {}-{}: r_cut ({}) must exceed r_in ({})",
                a, b, r_cut, r_in
            )));
        }
        blocks.push(PairBlock {
            species: (a.to_string(), b.to_string()),
            r_in,
            r_cut,
            offset: i * n_radial,
        });
    }

    let basis = PairBasis {
        blocks,
        n_radial,
        r_0: info.r_0,
        flavour: info.flavour,
    };
    let len = basis.len();
    let norm = DVector::from_iterator(
        len,
        (0..len).map(|i| {
            let k = (i % n_radial) as f64;
            (k + 1.0).powi(2)
        }),
    );

    log::debug!("pair basis with {} functions for {} pairs", len, basis.blocks.len());

    Ok(BasisDescriptor { basis, len, norm })
}

fn lookup_pair_radii(dict: &BTreeMap<String, [f64; 2]>, a: &str, b: &str) -> Option<[f64; 2]> {
    dict.get(&format!("{}-{}", a, b))
        .or_else(|| dict.get(&format!("{}-{}", b, a)))
        .copied()
}
