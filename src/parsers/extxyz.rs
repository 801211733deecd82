//! # 扩展 XYZ (extxyz) 格式解析器
//!
//! 读写 ASE 风格的扩展 XYZ 文件，一个文件可包含多帧。
//!
//! ## extxyz 格式说明
//! ```text
//! 2                                          # 原子数
//! Lattice="4 0 0 0 4 0 0 0 4" Properties=species:S:1:pos:R:3:REF_forces:R:3 REF_energy=-3.2 pbc="T T T"
//! Al 0.0 0.0 0.0 0.01 0.00 -0.02            # species, pos, 其他每原子列
//! Al 2.0 2.0 0.0 -0.01 0.00 0.02
//! ```
//!
//! 注释行中除 `Lattice`, `Properties`, `pbc` 外的键值对存入 `info`，
//! 数值单值为标量，多值为向量。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/structure.rs`
//! - 使用 `regex` 切分注释行键值对

use crate::error::{AceError, Result};
use crate::models::{Cell, Configuration, InfoValue, PerAtomArray};

use nalgebra::{Matrix3, Vector3};
use regex::Regex;
use std::fs;
use std::path::Path;

/// 每原子列定义
#[derive(Debug, Clone)]
struct Column {
    name: String,
    kind: char,
    width: usize,
}

/// 解析 extxyz 文件
pub fn parse_extxyz_file(path: &Path) -> Result<Vec<Configuration>> {
    let content = fs::read_to_string(path).map_err(|e| AceError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_extxyz_content(&content, &path.display().to_string())
}

/// 从字符串内容解析 extxyz 格式
pub fn parse_extxyz_content(content: &str, source_name: &str) -> Result<Vec<Configuration>> {
    let lines: Vec<&str> = content.lines().collect();
    let mut configs = Vec::new();
    let mut idx = 0;

    while idx < lines.len() {
        if lines[idx].trim().is_empty() {
            idx += 1;
            continue;
        }

        let n_atoms: usize = lines[idx]
            .trim()
            .parse()
            .map_err(|_| parse_error(source_name, idx, "expected atom count"))?;

        if idx + 2 + n_atoms > lines.len() {
            return Err(parse_error(source_name, idx, "truncated frame"));
        }

        let config = parse_frame(
            lines[idx + 1],
            &lines[idx + 2..idx + 2 + n_atoms],
            n_atoms,
            source_name,
            idx,
        )?;
        configs.push(config);
        idx += 2 + n_atoms;
    }

    Ok(configs)
}

/// 解析单帧
fn parse_frame(
    comment: &str,
    atom_lines: &[&str],
    n_atoms: usize,
    source_name: &str,
    first_line: usize,
) -> Result<Configuration> {
    if atom_lines.len() < n_atoms {
        return Err(parse_error(source_name, first_line, "truncated frame"));
    }

    let pairs = split_key_values(comment)?;

    let mut cell = Cell {
        matrix: Matrix3::zeros(),
    };
    let mut pbc: Option<[bool; 3]> = None;
    let mut has_lattice = false;
    let mut columns = default_columns();
    let mut info = Vec::new();

    for (key, value) in pairs {
        match key.to_lowercase().as_str() {
            "lattice" => {
                let values: Vec<f64> = parse_floats(&value)
                    .ok_or_else(|| parse_error(source_name, first_line + 1, "bad Lattice"))?;
                if values.len() != 9 {
                    return Err(parse_error(
                        source_name,
                        first_line + 1,
                        "Lattice needs 9 values",
                    ));
                }
                cell = Cell {
                    matrix: Matrix3::from_row_slice(&values),
                };
                has_lattice = true;
            }
            "properties" => {
                columns = parse_properties(&value)
                    .ok_or_else(|| parse_error(source_name, first_line + 1, "bad Properties"))?;
            }
            "pbc" => {
                let flags: Vec<bool> = value.split_whitespace().filter_map(parse_bool).collect();
                if flags.len() != 3 {
                    return Err(parse_error(source_name, first_line + 1, "pbc needs 3 flags"));
                }
                pbc = Some([flags[0], flags[1], flags[2]]);
            }
            _ => info.push((key, parse_info_value(&value))),
        }
    }

    let pbc = pbc.unwrap_or([has_lattice; 3]);

    if !columns.iter().any(|c| c.name == "pos") {
        return Err(parse_error(
            source_name,
            first_line + 1,
            "Properties lacks 'pos'",
        ));
    }

    let mut symbols = Vec::with_capacity(n_atoms);
    let mut positions = Vec::with_capacity(n_atoms);
    let mut arrays: Vec<(String, usize, Vec<f64>)> = columns
        .iter()
        .filter(|c| c.name != "species" && c.name != "pos" && c.kind != 'S')
        .map(|c| (c.name.clone(), c.width, Vec::with_capacity(n_atoms * c.width)))
        .collect();

    for (offset, line) in atom_lines.iter().take(n_atoms).enumerate() {
        let line_no = first_line + 2 + offset;
        let fields: Vec<&str> = line.split_whitespace().collect();
        let expected: usize = columns.iter().map(|c| c.width).sum();
        if fields.len() < expected {
            return Err(parse_error(
                source_name,
                line_no,
                &format!("expected {} columns, found {}", expected, fields.len()),
            ));
        }

        let mut cursor = 0;
        for column in &columns {
            let cells = &fields[cursor..cursor + column.width];
            cursor += column.width;

            match (column.name.as_str(), column.kind) {
                ("species", _) => symbols.push(cells[0].to_string()),
                (_, 'S') => {}
                ("pos", _) => {
                    let v = parse_cells(cells, column.kind)
                        .ok_or_else(|| parse_error(source_name, line_no, "bad position"))?;
                    if v.len() != 3 {
                        return Err(parse_error(source_name, line_no, "pos needs 3 columns"));
                    }
                    positions.push(Vector3::new(v[0], v[1], v[2]));
                }
                (name, kind) => {
                    let v = parse_cells(cells, kind).ok_or_else(|| {
                        parse_error(source_name, line_no, &format!("bad value in '{}'", name))
                    })?;
                    if let Some(slot) = arrays.iter_mut().find(|(n, _, _)| n == name) {
                        slot.2.extend(v);
                    }
                }
            }
        }
    }

    if symbols.len() != n_atoms {
        return Err(parse_error(
            source_name,
            first_line + 1,
            "Properties lacks 'species'",
        ));
    }

    let mut config = Configuration::new(symbols, positions, cell, pbc)?;
    for (key, value) in info {
        config.set_info(key, value);
    }
    for (name, width, data) in arrays {
        config.set_array(name, PerAtomArray::new(width, data))?;
    }

    Ok(config)
}

/// 切分注释行中的 key=value / key="quoted value"
fn split_key_values(comment: &str) -> Result<Vec<(String, String)>> {
    let re = Regex::new(r#"([A-Za-z_][A-Za-z0-9_\-]*)\s*=\s*(?:"([^"]*)"|(\S+))"#)
        .map_err(|e| AceError::Other(e.to_string()))?;

    Ok(re
        .captures_iter(comment)
        .map(|cap| {
            let key = cap[1].to_string();
            let value = cap
                .get(2)
                .or_else(|| cap.get(3))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            (key, value)
        })
        .collect())
}

/// 缺省列定义 species:S:1:pos:R:3
fn default_columns() -> Vec<Column> {
    vec![
        Column {
            name: "species".to_string(),
            kind: 'S',
            width: 1,
        },
        Column {
            name: "pos".to_string(),
            kind: 'R',
            width: 3,
        },
    ]
}

/// 解析 Properties=name:type:ncols:...
fn parse_properties(value: &str) -> Option<Vec<Column>> {
    let parts: Vec<&str> = value.split(':').collect();
    if parts.len() % 3 != 0 || parts.is_empty() {
        return None;
    }

    parts
        .chunks(3)
        .map(|chunk| {
            let kind = chunk[1].chars().next()?.to_ascii_uppercase();
            if !matches!(kind, 'S' | 'R' | 'I' | 'L') {
                return None;
            }
            Some(Column {
                name: chunk[0].to_string(),
                kind,
                width: chunk[2].parse().ok()?,
            })
        })
        .collect()
}

fn parse_cells(cells: &[&str], kind: char) -> Option<Vec<f64>> {
    cells
        .iter()
        .map(|s| match kind {
            'L' => parse_bool(s).map(|b| if b { 1.0 } else { 0.0 }),
            _ => s.parse::<f64>().ok(),
        })
        .collect()
}

fn parse_floats(value: &str) -> Option<Vec<f64>> {
    value
        .split_whitespace()
        .map(|s| s.parse::<f64>().ok())
        .collect()
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "T" | "True" | "true" => Some(true),
        "F" | "False" | "false" => Some(false),
        _ => None,
    }
}

fn parse_info_value(value: &str) -> InfoValue {
    match parse_floats(value) {
        Some(v) if v.len() == 1 => InfoValue::Scalar(v[0]),
        Some(v) if !v.is_empty() => InfoValue::Vector(v),
        _ => InfoValue::Text(value.to_string()),
    }
}

fn parse_error(source_name: &str, line: usize, reason: &str) -> AceError {
    AceError::ParseError {
        format: "extxyz".to_string(),
        path: source_name.to_string(),
        reason: format!("line {}: {}", line + 1, reason),
    }
}

/// 将构型列表写为 extxyz 字符串
pub fn to_extxyz_string(configs: &[Configuration]) -> String {
    let mut result = String::new();

    for config in configs {
        result.push_str(&format!("{}\n", config.len()));

        let mut header = Vec::new();

        let m = config.cell.matrix;
        if config.is_periodic() || m.iter().any(|&v| v != 0.0) {
            let lattice: Vec<String> = m.transpose().iter().map(|v| v.to_string()).collect();
            header.push(format!("Lattice=\"{}\"", lattice.join(" ")));
        }

        let mut properties = String::from("species:S:1:pos:R:3");
        for (name, array) in &config.arrays {
            properties.push_str(&format!(":{}:R:{}", name, array.width));
        }
        header.push(format!("Properties={}", properties));

        for (key, value) in &config.info {
            match value {
                InfoValue::Scalar(v) => header.push(format!("{}={}", key, v)),
                InfoValue::Vector(v) => {
                    let joined: Vec<String> = v.iter().map(|x| x.to_string()).collect();
                    header.push(format!("{}=\"{}\"", key, joined.join(" ")));
                }
                InfoValue::Text(t) => header.push(format!("{}=\"{}\"", key, t)),
            }
        }

        let flags: Vec<&str> = config
            .pbc
            .iter()
            .map(|&p| if p { "T" } else { "F" })
            .collect();
        header.push(format!("pbc=\"{}\"", flags.join(" ")));

        result.push_str(&header.join(" "));
        result.push('\n');

        for (i, (symbol, pos)) in config.symbols.iter().zip(&config.positions).enumerate() {
            result.push_str(&format!(
                "{:<3} {:16.10} {:16.10} {:16.10}",
                symbol, pos.x, pos.y, pos.z
            ));
            for array in config.arrays.values() {
                for v in array.row(i) {
                    result.push_str(&format!(" {:16.10}", v));
                }
            }
            result.push('\n');
        }
    }

    result
}

/// 写出 extxyz 文件
pub fn write_extxyz_file(path: &Path, configs: &[Configuration]) -> Result<()> {
    fs::write(path, to_extxyz_string(configs)).map_err(|e| AceError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_FRAMES: &str = r#"2
Lattice="4.0 0.0 0.0 0.0 4.0 0.0 0.0 0.0 4.0" Properties=species:S:1:pos:R:3:REF_forces:R:3 REF_energy=-3.5 REF_virial="1 0 0 0 1 0 0 0 1" config_type=bulk pbc="T T T"
Al 0.0 0.0 0.0 0.1 0.2 0.3
Al 2.0 2.0 0.0 -0.1 -0.2 -0.3
1
Properties=species:S:1:pos:R:3 energy=-0.5
Si 0.0 0.0 0.0
"#;

    #[test]
    fn test_parse_two_frames() {
        let configs = parse_extxyz_content(TWO_FRAMES, "test").unwrap();
        assert_eq!(configs.len(), 2);

        let bulk = &configs[0];
        assert_eq!(bulk.len(), 2);
        assert_eq!(bulk.pbc, [true; 3]);
        assert!((bulk.volume() - 64.0).abs() < 1e-9);
        assert_eq!(bulk.info_scalar("REF_energy"), Some(-3.5));
        assert_eq!(bulk.info_vector("REF_virial").unwrap().len(), 9);
        assert_eq!(
            bulk.info.get("config_type"),
            Some(&InfoValue::Text("bulk".to_string()))
        );
        let forces = &bulk.arrays["REF_forces"];
        assert_eq!(forces.row(1), &[-0.1, -0.2, -0.3]);

        let isolated = &configs[1];
        assert_eq!(isolated.symbols, vec!["Si".to_string()]);
        assert_eq!(isolated.pbc, [false; 3]);
    }

    #[test]
    fn test_round_trip_keeps_reference_data() {
        let configs = parse_extxyz_content(TWO_FRAMES, "test").unwrap();
        let text = to_extxyz_string(&configs);
        let reparsed = parse_extxyz_content(&text, "round_trip").unwrap();

        assert_eq!(reparsed.len(), 2);
        assert_eq!(reparsed[0].info_scalar("REF_energy"), Some(-3.5));
        assert_eq!(reparsed[0].arrays["REF_forces"], configs[0].arrays["REF_forces"]);
        assert_eq!(reparsed[0].cell, configs[0].cell);
        assert_eq!(reparsed[1].pbc, [false; 3]);
    }

    #[test]
    fn test_truncated_frame_is_error() {
        let content = "3\nProperties=species:S:1:pos:R:3\nAl 0 0 0\n";
        assert!(parse_extxyz_content(content, "short").is_err());
    }

    #[test]
    fn test_bad_atom_count() {
        assert!(parse_extxyz_content("abc\n\n", "bad").is_err());
    }
}
