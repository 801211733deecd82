//! # 二聚体能量曲线
//!
//! 对给定元素的每个无序元素对 (Z0 <= Z1)，在非周期双原子构型上扫描
//! 间距 r 并绘制 E(r)。偏置计算器使用未偏置能量。
//!
//! 当自然纵轴范围宽于允许的能量范围时，纵轴被截到
//! `(max(lo, Emin), min(hi, Emax))`。
//!
//! ## 依赖关系
//! - 被 `commands/dimers.rs` 调用
//! - 使用 `calculator/` 的 `Calculator` 接口
//! - 使用 `models/elements.rs` 枚举元素对
//! - 使用 `plotters` 渲染图表

use crate::calculator::Calculator;
use crate::error::{AceError, Result};
use crate::models::elements::element_pairs;
use crate::models::{Cell, Configuration};
use crate::plot::{is_svg, plot_error};

use nalgebra::Vector3;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

/// 每条曲线的采样点数
pub const N_SAMPLES: usize = 100;

/// 默认能量范围 (eV)
pub const DEFAULT_E_RANGE: (f64, f64) = (-5.0, 5.0);

/// 默认间距范围 (Å)
pub const DEFAULT_R_RANGE: (f64, f64) = (0.5, 10.0);

/// 单个元素对的 E(r) 曲线
#[derive(Debug, Clone, PartialEq)]
pub struct DimerCurve {
    pub pair: (String, String),
    pub r: Vec<f64>,
    pub energy: Vec<f64>,
}

impl DimerCurve {
    /// 图例标签，如 "Al-Si"
    pub fn label(&self) -> String {
        format!("{}-{}", self.pair.0, self.pair.1)
    }
}

/// 所有曲线及最终坐标范围
#[derive(Debug, Clone, PartialEq)]
pub struct DimerCurves {
    pub curves: Vec<DimerCurve>,
    pub x_limits: (f64, f64),
    pub y_limits: (f64, f64),
}

/// 截断纵轴范围
///
/// 仅当 `natural` 宽于 `max_e_range` 时截断，截断后宽度恰为 `max_e_range` 的宽度。
/// 保留已落在范围内的那个自然边界，另一边界由宽度决定；两者都不在范围内时取 `max_e_range`。
pub fn clamp_y_range(natural: (f64, f64), max_e_range: (f64, f64)) -> (f64, f64) {
    let (lo, hi) = natural;
    let (e_min, e_max) = max_e_range;
    let span = e_max - e_min;
    if hi - lo <= span {
        return natural;
    }

    let inside = |e: f64| e >= e_min && e <= e_max;
    if inside(lo) {
        (lo, lo + span)
    } else if inside(hi) {
        (hi - span, hi)
    } else {
        max_e_range
    }
}

/// 在 [start, end] 上等距取 n 个点（含端点）
fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// 计算所有元素对的曲线（不渲染）
pub fn dimer_curves(
    calc: &dyn Calculator,
    elements: &[String],
    max_e_range: (f64, f64),
    r_range: (f64, f64),
) -> Result<DimerCurves> {
    if elements.is_empty() {
        return Err(AceError::InvalidArgument(
            "at least one element is required".to_string(),
        ));
    }

    let pairs = element_pairs(elements)?;
    let box_edge = 2.0 * r_range.0.max(r_range.1);
    let rs = linspace(r_range.0, r_range.1, N_SAMPLES);

    let mut curves = Vec::with_capacity(pairs.len());
    for (a, b) in pairs {
        let mut energy = Vec::with_capacity(rs.len());
        for (index, &r) in rs.iter().enumerate() {
            let dimer = Configuration::new(
                vec![a.to_string(), b.to_string()],
                vec![Vector3::zeros(), Vector3::new(r, 0.0, 0.0)],
                Cell::cubic(box_edge),
                [false; 3],
            )?;
            let results = calc.calculate(&dimer)?;
            let e = if calc.is_biased() {
                results
                    .unbiased_energy
                    .ok_or_else(|| AceError::MissingProperty {
                        index,
                        key: "unbiased_energy".to_string(),
                    })?
            } else {
                results.energy
            };
            energy.push(e);
        }
        log::debug!("{}-{}: {} points", a, b, energy.len());

        curves.push(DimerCurve {
            pair: (a.to_string(), b.to_string()),
            r: rs.clone(),
            energy,
        });
    }

    let natural = natural_limits(curves.iter().flat_map(|c| c.energy.iter().copied()));
    let y_limits = clamp_y_range(natural, max_e_range);

    Ok(DimerCurves {
        curves,
        x_limits: r_range,
        y_limits,
    })
}

/// 计算并绘制二聚体曲线
pub fn plot_dimers(
    calc: &dyn Calculator,
    elements: &[String],
    plot_file: &Path,
    max_e_range: (f64, f64),
    r_range: (f64, f64),
) -> Result<DimerCurves> {
    let curves = dimer_curves(calc, elements, max_e_range, r_range)?;

    let size = (800, 600);
    if is_svg(plot_file) {
        let root = SVGBackend::new(plot_file, size).into_drawing_area();
        draw_chart(&root, &curves)?;
        root.present().map_err(plot_error)?;
    } else {
        let root = BitMapBackend::new(plot_file, size).into_drawing_area();
        draw_chart(&root, &curves)?;
        root.present().map_err(plot_error)?;
    }

    Ok(curves)
}

fn draw_chart<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, curves: &DimerCurves) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(plot_error)?;

    let (x0, x1) = curves.x_limits;
    let (y0, y1) = curves.y_limits;

    let mut chart = ChartBuilder::on(root)
        .margin(20)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .x_desc("r (Å)")
        .y_desc("E (eV)")
        .draw()
        .map_err(plot_error)?;

    for (i, curve) in curves.curves.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();

        // 图例条目单独登记，曲线本身可能被截成多段
        chart
            .draw_series(LineSeries::new(Vec::<(f64, f64)>::new(), color.stroke_width(2)))
            .map_err(plot_error)?
            .label(curve.label())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));

        for run in visible_runs(curve, (y0, y1)) {
            chart
                .draw_series(LineSeries::new(run, color.stroke_width(2)))
                .map_err(plot_error)?;
        }
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .position(SeriesLabelPosition::UpperRight)
        .draw()
        .map_err(plot_error)?;

    Ok(())
}

/// 曲线落在纵轴范围内的连续片段
fn visible_runs(curve: &DimerCurve, y_limits: (f64, f64)) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (&r, &e) in curve.r.iter().zip(&curve.energy) {
        if e.is_finite() && e >= y_limits.0 && e <= y_limits.1 {
            current.push((r, e));
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// 数据的自然纵轴范围，两端留 5% 边距
fn natural_limits(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let extent = values.filter(|v| v.is_finite()).fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
    });

    match extent {
        None => (-1.0, 1.0),
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
