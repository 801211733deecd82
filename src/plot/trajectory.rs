//! # 轨迹数据绘图
//!
//! 每个物理量一个纵向堆叠的面板，横轴为从 0 开始的步数。
//! 触发标记 (x, y) 以红色参考线叠加：x 画竖线；y 只有落在数据范围
//! 向外一个量程宽度以内时才画横线，以免压缩可见刻度。
//! 坐标范围只由数据决定，参考线不改变范围。
//!
//! 绘图完成后，数据另存为 `<图像文件名>.npz` 压缩归档。
//!
//! ## 依赖关系
//! - 被 `commands/traj.rs` 调用
//! - 使用 `plot/archive.rs` 保存归档
//! - 使用 `plotters` 渲染图表

use crate::error::{AceError, Result};
use crate::plot::{archive, is_svg, plot_error};

use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::ranged1d::Ranged;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;

/// 每个面板的像素宽度与高度
pub const PANEL_WIDTH: u32 = 600;
pub const PANEL_HEIGHT: u32 = 250;

/// 按插入顺序保存的命名时间序列
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrajectoryData {
    series: Vec<(String, Vec<f64>)>,
}

impl TrajectoryData {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个量；同名量原位替换
    pub fn push(&mut self, name: impl Into<String>, values: Vec<f64>) {
        let name = name.into();
        match self.series.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = values,
            None => self.series.push((name, values)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.series
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.series.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.series.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// 从 CSV 读取：每列一个量，表头为量名
    ///
    /// 列长可以不同，较短的列以空单元格结尾；列中间的空单元格会打乱步号，视为错误。
    pub fn from_csv(path: &Path) -> Result<Self> {
        let mut rdr = csv::Reader::from_path(path)?;
        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];
        // 每列第一个空单元格所在行
        let mut first_blank: Vec<Option<usize>> = vec![None; headers.len()];

        let csv_error = |reason: String| AceError::ParseError {
            format: "csv".to_string(),
            path: path.display().to_string(),
            reason,
        };

        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            for col in 0..headers.len() {
                let cell = record.get(col).unwrap_or("").trim();
                if cell.is_empty() {
                    first_blank[col].get_or_insert(row);
                    continue;
                }
                if let Some(blank) = first_blank[col] {
                    return Err(csv_error(format!(
                        "column '{}': empty cell at row {} followed by a value at row {}",
                        headers[col],
                        blank + 1,
                        row + 1
                    )));
                }
                let value: f64 = cell.parse().map_err(|_| {
                    csv_error(format!("row {}, column '{}': not a number", row + 1, headers[col]))
                })?;
                columns[col].push(value);
            }
        }

        let mut data = TrajectoryData::new();
        for (name, values) in headers.into_iter().zip(columns) {
            data.push(name, values);
        }
        Ok(data)
    }
}

/// 触发点标记，两个坐标均可缺省
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TriggerMarker {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

/// 量名 -> 触发标记
pub type TriggerMarkers = BTreeMap<String, TriggerMarker>;

/// 面板上需要叠加的参考线
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Overlays {
    pub vertical: Option<f64>,
    pub horizontal: Option<f64>,
}

/// 决定某个量的参考线
///
/// 横线仅在 `min - range < y < max + range` 时绘制，`range = max - min`。
pub fn trigger_overlays(values: &[f64], marker: &TriggerMarker) -> Overlays {
    let horizontal = marker.y.filter(|&y| match finite_extent(values) {
        Some((min, max)) => {
            let range = max - min;
            y < max + range && y > min - range
        }
        None => false,
    });

    Overlays {
        vertical: marker.x,
        horizontal,
    }
}

/// 单个面板的布局
#[derive(Debug, Clone, PartialEq)]
pub struct PanelLayout {
    pub name: String,
    pub log_scale: bool,
    pub x_limits: (f64, f64),
    pub y_limits: (f64, f64),
    pub overlays: Overlays,
}

/// 计算所有面板的布局（不渲染）
pub fn layout_trajectory(
    data: &TrajectoryData,
    triggers: &TriggerMarkers,
    log_y: &[String],
) -> Vec<PanelLayout> {
    data.iter()
        .map(|(name, values)| {
            let overlays = triggers
                .get(name)
                .map(|m| trigger_overlays(values, m))
                .unwrap_or_default();

            let wants_log = log_y.iter().any(|k| k == name);
            let log_limits = if wants_log { log_limits(values) } else { None };
            if wants_log && log_limits.is_none() {
                log::warn!("'{}' has no positive values, using a linear y axis", name);
            }

            PanelLayout {
                name: name.to_string(),
                log_scale: log_limits.is_some(),
                x_limits: x_limits(values.len()),
                y_limits: log_limits.unwrap_or_else(|| linear_limits(values)),
                overlays,
            }
        })
        .collect()
}

/// 绘制轨迹数据并写出 `.npz` 归档
pub fn plot_trajectory(
    data: &TrajectoryData,
    triggers: &TriggerMarkers,
    plot_file: &Path,
    log_y: &[String],
) -> Result<Vec<PanelLayout>> {
    if data.is_empty() {
        return Err(AceError::InvalidArgument(
            "no trajectory quantities to plot".to_string(),
        ));
    }

    let layout = layout_trajectory(data, triggers, log_y);
    let size = (PANEL_WIDTH, PANEL_HEIGHT * data.len() as u32);

    if is_svg(plot_file) {
        let root = SVGBackend::new(plot_file, size).into_drawing_area();
        draw_panels(&root, data, &layout)?;
        root.present().map_err(plot_error)?;
    } else {
        let root = BitMapBackend::new(plot_file, size).into_drawing_area();
        draw_panels(&root, data, &layout)?;
        root.present().map_err(plot_error)?;
    }

    archive::save_trajectory_archive(data, &archive::archive_path(plot_file))?;

    Ok(layout)
}

/// 绘制所有面板
fn draw_panels<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    data: &TrajectoryData,
    layout: &[PanelLayout],
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(plot_error)?;

    let areas = root.split_evenly((layout.len(), 1));
    let last = layout.len().saturating_sub(1);

    for (i, ((panel, area), (_, values))) in layout.iter().zip(&areas).zip(data.iter()).enumerate() {
        // xlabel 只在最底部面板
        let is_bottom = i == last;

        if panel.log_scale {
            let mut chart = ChartBuilder::on(area)
                .margin(10)
                .x_label_area_size(if is_bottom { 40 } else { 25 })
                .y_label_area_size(70)
                .build_cartesian_2d(
                    panel.x_limits.0..panel.x_limits.1,
                    (panel.y_limits.0..panel.y_limits.1).log_scale(),
                )
                .map_err(plot_error)?;

            let mut mesh = chart.configure_mesh();
            mesh.y_desc(panel.name.as_str());
            if is_bottom {
                mesh.x_desc("time step");
            }
            mesh.draw().map_err(plot_error)?;

            draw_trace(&mut chart, values, panel, |v| v > 0.0)?;
        } else {
            let mut chart = ChartBuilder::on(area)
                .margin(10)
                .x_label_area_size(if is_bottom { 40 } else { 25 })
                .y_label_area_size(70)
                .build_cartesian_2d(
                    panel.x_limits.0..panel.x_limits.1,
                    panel.y_limits.0..panel.y_limits.1,
                )
                .map_err(plot_error)?;

            let mut mesh = chart.configure_mesh();
            mesh.y_desc(panel.name.as_str());
            if is_bottom {
                mesh.x_desc("time step");
            }
            mesh.draw().map_err(plot_error)?;

            draw_trace(&mut chart, values, panel, |_| true)?;
        }
    }

    Ok(())
}

/// 绘制数据曲线与参考线
fn draw_trace<DB, Y>(
    chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, Y>>,
    values: &[f64],
    panel: &PanelLayout,
    drawable: impl Fn(f64) -> bool,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
    Y: Ranged<ValueType = f64>,
{
    let points: Vec<(f64, f64)> = values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite() && drawable(**v))
        .map(|(i, v)| (i as f64, *v))
        .collect();

    chart
        .draw_series(LineSeries::new(points, &BLACK))
        .map_err(plot_error)?;

    let (x0, x1) = panel.x_limits;
    let (y0, y1) = panel.y_limits;

    // 超出可见范围的参考线不画
    if let Some(x) = panel.overlays.vertical.filter(|x| (x0..=x1).contains(x)) {
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(x, y0), (x, y1)],
                RED.stroke_width(1),
            )))
            .map_err(plot_error)?;
    }

    if let Some(y) = panel
        .overlays
        .horizontal
        .filter(|y| (y0..=y1).contains(y) && drawable(*y))
    {
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(x0, y), (x1, y)],
                RED.stroke_width(1),
            )))
            .map_err(plot_error)?;
    }

    Ok(())
}

/// 有限值的最小 / 最大
fn finite_extent(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// 横轴范围，两端留 5% 边距
fn x_limits(n: usize) -> (f64, f64) {
    if n <= 1 {
        return (-0.5, 0.5);
    }
    let last = (n - 1) as f64;
    let margin = 0.05 * last;
    (-margin, last + margin)
}

/// 线性纵轴范围，两端留 5% 边距
pub(crate) fn linear_limits(values: &[f64]) -> (f64, f64) {
    match finite_extent(values) {
        None => (0.0, 1.0),
        Some((lo, hi)) if lo == hi => {
            let pad = if lo == 0.0 { 0.5 } else { 0.05 * lo.abs() };
            (lo - pad, hi + pad)
        }
        Some((lo, hi)) => {
            let pad = 0.05 * (hi - lo);
            (lo - pad, hi + pad)
        }
    }
}

/// 对数纵轴范围，只考虑正值；没有正值时返回 None
fn log_limits(values: &[f64]) -> Option<(f64, f64)> {
    let positive: Vec<f64> = values.iter().copied().filter(|v| *v > 0.0).collect();
    let (lo, hi) = finite_extent(&positive)?;
    if lo == hi {
        return Some((lo / 1.1, hi * 1.1));
    }
    let factor = (hi / lo).powf(0.05);
    Some((lo / factor, hi * factor))
}
