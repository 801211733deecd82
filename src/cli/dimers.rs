//! # dimers 子命令 CLI 定义
//!
//! 绘制所有元素对的二聚体能量曲线
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/dimers.rs`

use super::common::{parse_range, CalculatorArgs};
use clap::Args;
use std::path::PathBuf;

/// dimers 子命令参数
#[derive(Args, Debug)]
pub struct DimersArgs {
    /// Chemical symbols, comma separated (e.g. Al,Si)
    #[arg(long, value_delimiter = ',', required = true)]
    pub elements: Vec<String>,

    /// Output image (.png or .svg)
    #[arg(short, long, default_value = "dimers.png")]
    pub output: PathBuf,

    /// Widest energy window shown on the y axis, as `min,max` (eV)
    #[arg(long, value_parser = parse_range, default_value = "-5,5", allow_hyphen_values = true)]
    pub e_range: (f64, f64),

    /// Separation range, as `min,max` (Å)
    #[arg(long, value_parser = parse_range, default_value = "0.5,10")]
    pub r_range: (f64, f64),

    #[command(flatten)]
    pub calculator: CalculatorArgs,
}
