//! # 误差报告模块
//!
//! 拟合势相对参考数据的误差表构建与导出。
//!
//! ## 子模块
//! - `error_table`: RMSE 聚合
//! - `export`: 终端表格与 CSV 输出
//!
//! ## 依赖关系
//! - 被 `commands/errors.rs` 使用
//! - 使用 `calculator/`, `models/`

pub mod error_table;
pub mod export;

pub use error_table::{error_table, rmse, ConfigSet, DataKeys, ErrorRow, ErrorTable, Property};
