//! # fit 子命令 CLI 定义
//!
//! 由 TOML 配置与 extxyz 训练数据拟合对基模型
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/fit.rs`

use clap::Args;
use std::path::PathBuf;

/// fit 子命令参数
#[derive(Args, Debug)]
pub struct FitArgs {
    /// Fit configuration (TOML with [basis], [solver], [weights], [data_keys], [e0s])
    #[arg(short, long)]
    pub config: PathBuf,

    /// Training data files (.xyz / .extxyz)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output model JSON
    #[arg(short, long, default_value = "model.json")]
    pub output: PathBuf,

    /// Number of parallel jobs (0 = auto)
    #[arg(short = 'j', long, default_value_t = 0)]
    pub jobs: usize,
}
