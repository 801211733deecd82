//! # 批量执行器
//!
//! 在固定大小的 rayon 线程池中执行任务。
//!
//! ## 功能
//! - 作业数为 0 时使用全部 CPU
//! - 并行读取多个构型文件，结果保持输入顺序
//! - 进度条显示
//!
//! ## 依赖关系
//! - 被 `commands/errors.rs`, `commands/fit.rs`, `commands/synth.rs` 调用
//! - 使用 `utils/progress.rs` 创建进度条
//! - 使用 `rayon` 进行并行计算

use crate::error::{AceError, Result};
use crate::models::Configuration;
use crate::parsers;
use crate::utils::progress;

use rayon::prelude::*;
use std::path::PathBuf;

/// 批量执行器
pub struct BatchRunner {
    /// 并行作业数
    jobs: usize,
}

impl BatchRunner {
    /// 创建新的批量执行器
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self { jobs }
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// 在专用线程池中执行
    pub fn install<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce() -> T + Send,
        T: Send,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| AceError::Other(format!("failed to start thread pool: {}", e)))?;
        Ok(pool.install(op))
    }

    /// 并行读取构型文件
    pub fn load_all(&self, files: &[PathBuf]) -> Result<Vec<Vec<Configuration>>> {
        let pb = progress::create_progress_bar(files.len() as u64, "Reading");

        let results = self.install(|| {
            files
                .par_iter()
                .map(|file| {
                    let result = parsers::parse_configurations_file(file);
                    pb.inc(1);
                    result
                })
                .collect::<Result<Vec<_>>>()
        })?;

        pb.finish_and_clear();
        results
    }
}
