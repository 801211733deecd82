//! # synth 子命令 CLI 定义
//!
//! 生成合成铝参考数据，可选同时拟合模型
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/synth.rs`

use clap::Args;
use std::path::PathBuf;

/// synth 子命令参数
#[derive(Args, Debug)]
pub struct SynthArgs {
    /// Output file for the fitting configurations
    #[arg(short, long, default_value = "synthetic_fit.xyz")]
    pub output: PathBuf,

    /// Output file for the test configurations
    #[arg(long, default_value = "synthetic_test.xyz")]
    pub test_output: PathBuf,

    /// Also fit the standard pair model and write it as JSON
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Use the smooth (Agnesi) basis when fitting
    #[arg(long, default_value_t = false, requires = "model")]
    pub smooth: bool,

    /// Number of parallel jobs (0 = auto)
    #[arg(short = 'j', long, default_value_t = 0)]
    pub jobs: usize,
}
