//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `errors`: 误差表
//! - `traj`: 轨迹数据堆叠图
//! - `dimers`: 二聚体能量曲线
//! - `fit`: 拟合对基模型
//! - `synth`: 生成合成铝数据
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: common, errors, traj, dimers, fit, synth

pub mod common;
pub mod dimers;
pub mod errors;
pub mod fit;
pub mod synth;
pub mod traj;

use clap::{Parser, Subcommand};

/// acereport - 线性原子间势的误差报告与诊断图
#[derive(Parser)]
#[command(name = "acereport")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Error tables and diagnostic plots for fitted interatomic potentials", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Print per-set RMSE of energy, forces and virial against reference data
    Errors(errors::ErrorsArgs),

    /// Plot trajectory quantities as stacked panels and archive them as .npz
    Traj(traj::TrajArgs),

    /// Plot E(r) for every dimer of the given elements
    Dimers(dimers::DimersArgs),

    /// Fit a linear pair model to reference data
    Fit(fit::FitArgs),

    /// Generate the synthetic aluminium reference data set
    Synth(synth::SynthArgs),
}
