//! # 数据模型模块
//!
//! 定义统一的原子构型、晶胞与张量表示。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `calculator/`, `report/`, `fit/` 使用
//! - 子模块: structure, elements, neighbors, tensor

pub mod elements;
pub mod neighbors;
pub mod structure;
pub mod tensor;

pub use neighbors::{neighbor_pairs, NeighborPair};
pub use structure::{Cell, Configuration, InfoValue, PerAtomArray};
