//! # dimers 命令实现
//!
//! 绘制所选计算器的二聚体 E(r) 曲线。
//!
//! ## 依赖关系
//! - 使用 `cli/dimers.rs` 定义的参数
//! - 使用 `plot/dimers.rs`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use crate::cli::dimers::DimersArgs;
use crate::error::Result;
use crate::plot::plot_dimers;
use crate::utils::{output, progress};

/// 执行 dimers 命令
pub fn execute(args: DimersArgs) -> Result<()> {
    output::print_header("Dimer Curves");

    let calc = super::build_calculator(&args.calculator)?;
    output::print_info(&format!("Calculator: {}", calc.name()));
    if calc.is_biased() {
        output::print_info("Biased calculator: plotting the unbiased energy");
    }

    let spinner = progress::create_spinner("Scanning dimer separations...");
    let curves = plot_dimers(
        calc.as_ref(),
        &args.elements,
        &args.output,
        args.e_range,
        args.r_range,
    );
    spinner.finish_and_clear();
    let curves = curves?;

    for curve in &curves.curves {
        let (i_min, e_min) = curve
            .energy
            .iter()
            .enumerate()
            .fold((0, f64::INFINITY), |best, (i, &e)| if e < best.1 { (i, e) } else { best });
        output::print_info(&format!(
            "{}: minimum {:.4} eV at r = {:.3} Å",
            curve.label(),
            e_min,
            curve.r.get(i_min).copied().unwrap_or(f64::NAN)
        ));
    }
    output::print_info(&format!(
        "y range: {:.3} .. {:.3} eV",
        curves.y_limits.0, curves.y_limits.1
    ));

    output::print_success(&format!("Wrote {}", args.output.display()));
    Ok(())
}
