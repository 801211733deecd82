//! # errors 命令实现
//!
//! 读取若干 extxyz 构型集合，用所选计算器计算误差表。
//!
//! ## 功能
//! - `label=path` 形式指定集合，省略标签时使用位置索引
//! - 并行读取输入文件
//! - 终端表格输出，可选 CSV
//!
//! ## 依赖关系
//! - 使用 `cli/errors.rs` 定义的参数
//! - 使用 `report/`, `batch/`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use crate::batch::BatchRunner;
use crate::cli::errors::ErrorsArgs;
use crate::error::Result;
use crate::report::{error_table, export, ConfigSet, DataKeys, Property};
use crate::utils::{output, progress};

use std::path::PathBuf;

/// 执行 errors 命令
pub fn execute(args: ErrorsArgs) -> Result<()> {
    output::print_header("Error Table");

    let specs: Vec<(Option<String>, PathBuf)> = args.sets.iter().map(|s| parse_set_spec(s)).collect();
    let paths: Vec<PathBuf> = specs.iter().map(|(_, p)| p.clone()).collect();

    let runner = BatchRunner::new(args.jobs);
    let loaded = runner.load_all(&paths)?;

    let sets: Vec<ConfigSet> = specs
        .into_iter()
        .zip(loaded)
        .map(|((label, path), configs)| {
            output::print_info(&format!("{}: {} configurations", path.display(), configs.len()));
            ConfigSet { label, configs }
        })
        .collect();

    let calc = super::build_calculator(&args.calculator)?;
    output::print_info(&format!("Calculator: {}", calc.name()));

    let keys = DataKeys::new(args.energy_key, args.forces_key, args.virial_key);

    let spinner = progress::create_spinner("Evaluating configurations...");
    let table = error_table(&sets, calc.as_ref(), &keys);
    spinner.finish_and_clear();
    let table = table?;

    println!("{}", export::render_table(&table));

    for row in &table.rows {
        for property in Property::ALL {
            if row.is_missing(property) {
                output::print_warning(&format!(
                    "Set '{}' has no '{}' reference data",
                    row.label, property
                ));
            }
        }
    }

    if let Some(csv_path) = &args.csv {
        export::to_csv(&table, csv_path)?;
        output::print_success(&format!("Wrote {}", csv_path.display()));
    }

    Ok(())
}

/// 解析 `label=path` 或 `path`
fn parse_set_spec(spec: &str) -> (Option<String>, PathBuf) {
    match spec.split_once('=') {
        Some((label, path)) if !label.is_empty() => (Some(label.to_string()), PathBuf::from(path)),
        Some((_, path)) => (None, PathBuf::from(path)),
        None => (None, PathBuf::from(spec)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_spec() {
        assert_eq!(
            parse_set_spec("train=data/fit.xyz"),
            (Some("train".to_string()), PathBuf::from("data/fit.xyz"))
        );
        assert_eq!(parse_set_spec("data/test.xyz"), (None, PathBuf::from("data/test.xyz")));
        assert_eq!(parse_set_spec("=x.xyz"), (None, PathBuf::from("x.xyz")));
    }
}
