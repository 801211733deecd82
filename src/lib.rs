//! # acereport - 线性原子间势的误差报告与诊断图
//!
//! 对拟合得到的原子间势（或任意实现 `Calculator` 的计算器）：
//! - 按构型集合计算能量 / 受力 / 维里的 RMSE 误差表
//! - 绘制轨迹量的堆叠面板图并归档为 `.npz`
//! - 绘制所有元素对的二聚体能量曲线
//!
//! 另附一套最小的对基拟合流程与合成铝数据夹具。
//!
//! ## 依赖关系
//! ```text
//! lib.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── report/    (误差表)
//!   │     ├── plot/      (轨迹图、二聚体曲线、npz 归档)
//!   │     ├── fit/       (对基、线性问题、求解器)
//!   │     └── fixtures/  (合成数据)
//!   ├── calculator/ (计算器接口与参考对势)
//!   ├── parsers/    (extxyz 读写)
//!   ├── models/     (数据模型)
//!   ├── batch/      (并行执行)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

pub mod batch;
pub mod calculator;
pub mod cli;
pub mod commands;
pub mod error;
pub mod fit;
pub mod fixtures;
pub mod models;
pub mod parsers;
pub mod plot;
pub mod report;
pub mod utils;

pub use calculator::{CalcResults, Calculator};
pub use error::{AceError, Result};
pub use models::Configuration;
