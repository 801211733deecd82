//! # 解析器模块
//!
//! 提供原子构型数据文件的读写。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: extxyz

pub mod extxyz;

use crate::error::{AceError, Result};
use crate::models::Configuration;
use std::path::Path;

/// 从文件路径推断格式并解析
pub fn parse_configurations_file(path: &Path) -> Result<Vec<Configuration>> {
    if !path.exists() {
        return Err(AceError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "xyz" | "extxyz" => extxyz::parse_extxyz_file(path),
        _ => Err(AceError::ParseError {
            format: "unknown".to_string(),
            path: path.display().to_string(),
            reason: "expected an .xyz or .extxyz file".to_string(),
        }),
    }
}
