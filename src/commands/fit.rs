//! # fit 命令实现
//!
//! 读取 TOML 拟合配置与训练数据，拟合对基模型并保存为 JSON，
//! 最后打印训练集误差表。
//!
//! ## 依赖关系
//! - 使用 `cli/fit.rs` 定义的参数
//! - 使用 `fit/`, `report/`, `batch/`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use crate::batch::BatchRunner;
use crate::cli::fit::FitArgs;
use crate::error::Result;
use crate::fit::{define_basis, fit, FitConfig};
use crate::models::Configuration;
use crate::report::{error_table, export, ConfigSet};
use crate::utils::{output, progress};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// 执行 fit 命令
pub fn execute(args: FitArgs) -> Result<()> {
    output::print_header("Fitting Pair Model");

    let config = FitConfig::load(&args.config)?;
    let basis = define_basis(&config.basis)?;
    output::print_info(&format!(
        "Basis: {} functions over {} element pairs",
        basis.len,
        basis.basis.blocks.len()
    ));

    let runner = BatchRunner::new(args.jobs);
    let configs: Vec<Configuration> = runner.load_all(&args.inputs)?.into_iter().flatten().collect();
    output::print_info(&format!(
        "Training on {} configurations from {} files",
        configs.len(),
        args.inputs.len()
    ));

    let solver = config.solver.build();
    let e0s = config.e0s_or_zero();
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

    let spinner = progress::create_spinner("Solving linear problem...");
    let result = runner.install(|| {
        fit(
            &configs,
            solver.as_ref(),
            &basis,
            &e0s,
            &config.data_keys,
            &config.weights,
            config.n_committee,
            &mut rng,
            false,
        )
    })?;
    spinner.finish_and_clear();
    let result = result?;

    output::print_info(&format!(
        "{} finished after {} iterations, {} committee members",
        solver.name(),
        result.n_iter,
        result.calc.committee_size()
    ));

    result.calc.save_json(&args.output)?;
    output::print_success(&format!("Wrote {}", args.output.display()));

    let table = error_table(
        &[ConfigSet::labeled("train", configs)],
        &result.calc,
        &config.data_keys,
    )?;
    println!("{}", export::render_table(&table));

    Ok(())
}
