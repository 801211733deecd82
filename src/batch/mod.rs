//! # 批量处理模块
//!
//! 提供统一的并行执行能力。
//!
//! ## 功能
//! - 按 `--jobs` 配置线程池
//! - 并行读取输入文件
//! - 进度反馈
//!
//! ## 依赖关系
//! - 被各命令模块使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod runner;

pub use runner::BatchRunner;
