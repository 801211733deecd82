//! # 轨迹数据归档
//!
//! 将绘图数据保存为压缩 NumPy `.npz`，文件名为图像文件名加 `.npz` 后缀，
//! 便于之后重新分析而无需重算。
//!
//! ## 依赖关系
//! - 被 `plot/trajectory.rs` 调用
//! - 使用 `ndarray` + `ndarray-npy` 读写 npz

use crate::error::{AceError, Result};
use crate::plot::trajectory::TrajectoryData;

use ndarray::Array1;
use ndarray_npy::{NpzReader, NpzWriter};
use std::fs::File;
use std::path::{Path, PathBuf};

/// 归档后缀
pub const ARCHIVE_SUFFIX: &str = ".npz";

/// 图像文件对应的归档路径：同目录，文件名追加 `.npz`
pub fn archive_path(plot_file: &Path) -> PathBuf {
    let mut name = plot_file
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(ARCHIVE_SUFFIX);
    plot_file.with_file_name(name)
}

/// 写出压缩归档，数组按插入顺序以量名命名
pub fn save_trajectory_archive(data: &TrajectoryData, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| AceError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut npz = NpzWriter::new_compressed(file);
    for (name, values) in data.iter() {
        npz.add_array(name.to_string(), &Array1::from(values.to_vec()))
            .map_err(|e| archive_error(path, e))?;
    }
    npz.finish().map_err(|e| archive_error(path, e))?;

    Ok(())
}

/// 读取归档，恢复原始顺序
pub fn load_trajectory_archive(path: &Path) -> Result<TrajectoryData> {
    let file = File::open(path).map_err(|e| AceError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut npz = NpzReader::new(file).map_err(|e| archive_error(path, e))?;
    let names = npz.names().map_err(|e| archive_error(path, e))?;

    let mut data = TrajectoryData::new();
    for raw_name in names {
        let values: Array1<f64> = npz.by_name(&raw_name).map_err(|e| archive_error(path, e))?;
        let name = raw_name.strip_suffix(".npy").unwrap_or(&raw_name);
        data.push(name, values.to_vec());
    }

    Ok(data)
}

fn archive_error(path: &Path, e: impl std::fmt::Display) -> AceError {
    AceError::Archive {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}
