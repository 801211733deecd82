//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `report/`, `plot/`, `fit/`, `fixtures/`, `utils/`
//! - 子模块: errors, traj, dimers, fit, synth

pub mod dimers;
pub mod errors;
pub mod fit;
pub mod synth;
pub mod traj;

use crate::calculator::{BiasCalculator, Calculator, LennardJones, Morse, PairCalculator};
use crate::cli::common::{CalculatorArgs, PotentialKind};
use crate::cli::Commands;
use crate::error::Result;
use crate::fit::FittedPairCalculator;
use crate::utils::output;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Errors(args) => errors::execute(args),
        Commands::Traj(args) => traj::execute(args),
        Commands::Dimers(args) => dimers::execute(args),
        Commands::Fit(args) => fit::execute(args),
        Commands::Synth(args) => synth::execute(args),
    }
}

fn reference_potential(kind: PotentialKind) -> Box<dyn Calculator> {
    match kind {
        PotentialKind::Lj => Box::new(PairCalculator::new(LennardJones::aluminium(), "lj")),
        PotentialKind::Morse => Box::new(PairCalculator::new(Morse::aluminium(), "morse")),
    }
}

/// 按命令行参数构建计算器
pub(crate) fn build_calculator(args: &CalculatorArgs) -> Result<Box<dyn Calculator>> {
    let base: Box<dyn Calculator> = match &args.model {
        Some(path) => {
            let model = FittedPairCalculator::load_json(path)?;
            output::print_info(&format!(
                "Loaded model '{}' ({} coefficients, {} committee members)",
                path.display(),
                model.coef.len(),
                model.committee_size()
            ));
            Box::new(model)
        }
        None => reference_potential(args.potential),
    };

    Ok(match args.bias {
        Some(kind) => Box::new(BiasCalculator::new(
            base,
            reference_potential(kind),
            args.bias_strength,
        )),
        None => base,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_biased_calculator() {
        let args = CalculatorArgs {
            model: None,
            potential: PotentialKind::Lj,
            bias: Some(PotentialKind::Morse),
            bias_strength: 0.5,
        };
        let calc = build_calculator(&args).unwrap();
        assert!(calc.is_biased());
        assert_eq!(calc.name(), "lj + 0.5 x morse");
    }

    #[test]
    fn test_missing_model_file_is_error() {
        let args = CalculatorArgs {
            model: Some("does/not/exist.json".into()),
            potential: PotentialKind::Lj,
            bias: None,
            bias_strength: 1.0,
        };
        assert!(build_calculator(&args).is_err());
    }
}
