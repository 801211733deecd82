//! # acereport 命令行入口
//!
//! ## 子命令
//! - `errors` - 误差表
//! - `traj`   - 轨迹数据堆叠图
//! - `dimers` - 二聚体能量曲线
//! - `fit`    - 拟合对基模型
//! - `synth`  - 生成合成铝数据

use acereport::cli::Cli;
use acereport::{commands, utils};
use clap::Parser;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
