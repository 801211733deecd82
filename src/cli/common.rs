//! # 公共参数
//!
//! 多个子命令共用的计算器选择与并行参数。
//!
//! ## 依赖关系
//! - 被 `cli/errors.rs`, `cli/dimers.rs` 等使用
//! - 参数由 `commands/mod.rs` 解释

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 内置参考对势
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PotentialKind {
    /// Lennard-Jones fitted to aluminium
    Lj,
    /// Morse (Girifalco-Weizer aluminium)
    Morse,
}

/// 计算器选择
#[derive(Args, Debug, Clone)]
pub struct CalculatorArgs {
    /// Fitted model JSON written by `acereport fit`
    #[arg(long, env = "ACEREPORT_MODEL", conflicts_with = "potential")]
    pub model: Option<PathBuf>,

    /// Built-in reference pair potential, used when no model is given
    #[arg(long, value_enum, default_value = "lj")]
    pub potential: PotentialKind,

    /// Add a scaled bias potential on top of the calculator
    #[arg(long, value_enum)]
    pub bias: Option<PotentialKind>,

    /// Strength of the bias potential
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    pub bias_strength: f64,
}

/// 解析 "a,b" 形式的区间
pub fn parse_range(s: &str) -> Result<(f64, f64), String> {
    let (a, b) = s
        .split_once(',')
        .ok_or_else(|| format!("expected 'min,max', got '{}'", s))?;
    let lo: f64 = a.trim().parse().map_err(|_| format!("invalid number '{}'", a))?;
    let hi: f64 = b.trim().parse().map_err(|_| format!("invalid number '{}'", b))?;
    if lo.is_nan() || hi.is_nan() || lo >= hi {
        return Err(format!("range must satisfy min < max, got {}..{}", lo, hi));
    }
    Ok((lo, hi))
}
