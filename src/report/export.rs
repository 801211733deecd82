//! # 误差表导出
//!
//! 终端表格（`tabled`）与 CSV（`csv`）两种输出。
//! 终端中缺失数据显示为 `-`，CSV 中写 `NaN`。
//!
//! ## 依赖关系
//! - 被 `commands/errors.rs` 调用
//! - 使用 `report/error_table.rs` 的 ErrorTable

use crate::error::{AceError, Result};
use crate::report::error_table::{ErrorTable, Property};

use std::path::Path;
use tabled::{Table, Tabled};

/// 终端表格行
#[derive(Debug, Clone, Tabled)]
struct ErrorTableRow {
    #[tabled(rename = "Set")]
    label: String,
    #[tabled(rename = "E/at (meV)")]
    energy: String,
    #[tabled(rename = "F (meV/Å)")]
    forces: String,
    #[tabled(rename = "V/at (meV)")]
    virial: String,
}

fn format_cell(value: f64, missing: bool) -> String {
    if missing || value.is_nan() {
        "-".to_string()
    } else {
        format!("{:.3}", value * 1000.0)
    }
}

/// 渲染为终端表格字符串
pub fn render_table(table: &ErrorTable) -> String {
    let rows: Vec<ErrorTableRow> = table
        .rows
        .iter()
        .map(|r| ErrorTableRow {
            label: r.label.clone(),
            energy: format_cell(r.energy, r.is_missing(Property::Energy)),
            forces: format_cell(r.forces, r.is_missing(Property::Forces)),
            virial: format_cell(r.virial, r.is_missing(Property::Virial)),
        })
        .collect();

    Table::new(&rows).to_string()
}

/// 导出为 CSV，列为 label, E/at, F, V/at（eV 单位）
pub fn to_csv(table: &ErrorTable, output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    let mut header = vec!["label"];
    header.extend(Property::ALL.iter().map(|p| p.column()));
    wtr.write_record(&header)?;

    for row in &table.rows {
        let mut record = vec![row.label.clone()];
        record.extend(Property::ALL.iter().map(|&p| format_csv_value(row.value(p))));
        wtr.write_record(&record)?;
    }

    wtr.flush().map_err(|e| AceError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

fn format_csv_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:.10e}", value)
    }
}
