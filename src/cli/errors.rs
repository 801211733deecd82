//! # errors 子命令 CLI 定义
//!
//! 计算构型集合相对参考数据的误差表
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/errors.rs`

use super::common::CalculatorArgs;
use clap::Args;
use std::path::PathBuf;

/// errors 子命令参数
#[derive(Args, Debug)]
pub struct ErrorsArgs {
    /// Configuration set as `label=path.xyz` or just `path.xyz` (repeatable)
    #[arg(long = "set", required = true)]
    pub sets: Vec<String>,

    #[command(flatten)]
    pub calculator: CalculatorArgs,

    /// Info key holding the reference energy
    #[arg(long, default_value = "energy")]
    pub energy_key: String,

    /// Per-atom array key holding the reference forces
    #[arg(long, default_value = "forces")]
    pub forces_key: String,

    /// Info key holding the reference virial (9 or 6 values)
    #[arg(long, default_value = "virial")]
    pub virial_key: String,

    /// Also write the table as CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Number of parallel jobs for reading input files (0 = auto)
    #[arg(short = 'j', long, default_value_t = 0)]
    pub jobs: usize,
}
