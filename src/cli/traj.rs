//! # traj 子命令 CLI 定义
//!
//! 绘制轨迹量的堆叠面板图
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/traj.rs`

use clap::Args;
use std::path::PathBuf;

/// traj 子命令参数
#[derive(Args, Debug)]
pub struct TrajArgs {
    /// CSV file with one column per quantity and a header row
    pub input: PathBuf,

    /// Output image (.png or .svg); the data archive is written next to it
    #[arg(short, long, default_value = "trajectory.png")]
    pub output: PathBuf,

    /// Trigger marker as `name=x,y`; either coordinate may be left empty (repeatable)
    #[arg(long = "trigger")]
    pub triggers: Vec<String>,

    /// Quantities drawn with a logarithmic y axis (repeatable)
    #[arg(long = "log-y", default_values_t = vec!["criterion".to_string()])]
    pub log_y: Vec<String>,
}
