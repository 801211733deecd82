//! # synth 命令实现
//!
//! 生成合成铝参考数据并写为 extxyz；可选拟合模型并保存。
//!
//! ## 依赖关系
//! - 使用 `cli/synth.rs` 定义的参数
//! - 使用 `fixtures/`, `parsers/extxyz.rs`, `report/`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use crate::batch::BatchRunner;
use crate::cli::synth::SynthArgs;
use crate::error::Result;
use crate::fixtures;
use crate::parsers::extxyz::write_extxyz_file;
use crate::report::{error_table, export, ConfigSet};
use crate::utils::{output, progress};

/// 执行 synth 命令
pub fn execute(args: SynthArgs) -> Result<()> {
    output::print_header("Synthetic Aluminium Data");

    let runner = BatchRunner::new(args.jobs);

    let spinner = progress::create_spinner("Generating and labelling structures...");
    let data = runner.install(fixtures::fit_data)?;
    spinner.finish_and_clear();
    let data = data?;

    write_extxyz_file(&args.output, &data.fit_configs)?;
    output::print_success(&format!(
        "Wrote {} fitting configurations to {}",
        data.fit_configs.len(),
        args.output.display()
    ));

    write_extxyz_file(&args.test_output, &data.test_configs)?;
    output::print_success(&format!(
        "Wrote {} test configurations to {}",
        data.test_configs.len(),
        args.test_output.display()
    ));

    let Some(model_path) = &args.model else {
        return Ok(());
    };

    let spinner = progress::create_spinner("Fitting pair model...");
    let info = runner.install(|| {
        if args.smooth {
            fixtures::fit_model_smooth_all_info(&data)
        } else {
            fixtures::fit_model_all_info(&data)
        }
    })?;
    spinner.finish_and_clear();
    let info = info?;

    info.calc.save_json(model_path)?;
    output::print_success(&format!(
        "Wrote model with {} coefficients to {}",
        info.basis.len,
        model_path.display()
    ));

    let sets = vec![
        ConfigSet::labeled("fit", data.fit_configs.clone()),
        ConfigSet::labeled("test", data.test_configs.clone()),
    ];
    let table = error_table(&sets, &info.calc, &data.data_keys)?;
    println!("{}", export::render_table(&table));

    Ok(())
}
