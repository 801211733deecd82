//! # 绘图模块
//!
//! 轨迹数据的堆叠面板图、二聚体能量曲线，以及轨迹数据的 npz 归档。
//!
//! ## 依赖关系
//! - 被 `commands/traj.rs`, `commands/dimers.rs` 调用
//! - 使用 `plotters` 渲染，`ndarray-npy` 写归档
//! - 子模块: trajectory, dimers, archive

pub mod archive;
pub mod dimers;
pub mod trajectory;

pub use archive::{archive_path, load_trajectory_archive, save_trajectory_archive};
pub use dimers::{clamp_y_range, dimer_curves, plot_dimers, DimerCurve, DimerCurves};
pub use trajectory::{
    layout_trajectory, plot_trajectory, trigger_overlays, Overlays, PanelLayout, TrajectoryData,
    TriggerMarker, TriggerMarkers,
};

use crate::error::AceError;
use std::path::Path;

/// 扩展名为 `.svg` 时使用 SVG 后端
pub(crate) fn is_svg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("svg"))
        .unwrap_or(false)
}

pub(crate) fn plot_error<E: std::fmt::Debug>(e: E) -> AceError {
    AceError::Plot(format!("{:?}", e))
}
