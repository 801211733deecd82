//! # traj 命令实现
//!
//! 从 CSV 读取轨迹量，绘制堆叠面板图并写出 `.npz` 归档。
//!
//! ## 依赖关系
//! - 使用 `cli/traj.rs` 定义的参数
//! - 使用 `plot/trajectory.rs`, `plot/archive.rs`
//! - 使用 `utils/output.rs`

use crate::cli::traj::TrajArgs;
use crate::error::{AceError, Result};
use crate::plot::{archive_path, plot_trajectory, TrajectoryData, TriggerMarker, TriggerMarkers};
use crate::utils::output;

/// 执行 traj 命令
pub fn execute(args: TrajArgs) -> Result<()> {
    output::print_header("Trajectory Plot");

    if !args.input.exists() {
        return Err(AceError::FileNotFound {
            path: args.input.display().to_string(),
        });
    }

    let data = TrajectoryData::from_csv(&args.input)?;
    output::print_info(&format!(
        "Read {} quantities: {}",
        data.len(),
        data.names().join(", ")
    ));

    let mut triggers = TriggerMarkers::new();
    for spec in &args.triggers {
        let (name, marker) = parse_trigger(spec)?;
        if data.get(&name).is_none() {
            output::print_warning(&format!("Trigger for unknown quantity '{}' ignored", name));
        }
        triggers.insert(name, marker);
    }

    let layout = plot_trajectory(&data, &triggers, &args.output, &args.log_y)?;

    for panel in &layout {
        if panel.overlays.horizontal.is_none() {
            if let Some(y) = triggers.get(&panel.name).and_then(|m| m.y) {
                output::print_skip(&format!(
                    "{}: trigger value {} is far outside the data range",
                    panel.name, y
                ));
            }
        }
    }

    output::print_success(&format!("Wrote {}", args.output.display()));
    output::print_success(&format!("Wrote {}", archive_path(&args.output).display()));
    Ok(())
}

/// 解析 `name=x,y`，x 或 y 可以留空
fn parse_trigger(spec: &str) -> Result<(String, TriggerMarker)> {
    let invalid = || AceError::InvalidArgument(format!("trigger must look like name=x,y, got '{}'", spec));

    let (name, coords) = spec.split_once('=').ok_or_else(invalid)?;
    let (x, y) = coords.split_once(',').unwrap_or((coords, ""));

    let parse = |s: &str| -> Result<Option<f64>> {
        let s = s.trim();
        if s.is_empty() {
            Ok(None)
        } else {
            s.parse().map(Some).map_err(|_| invalid())
        }
    };

    if name.trim().is_empty() {
        return Err(invalid());
    }
    Ok((
        name.trim().to_string(),
        TriggerMarker {
            x: parse(x)?,
            y: parse(y)?,
        },
    ))
}
