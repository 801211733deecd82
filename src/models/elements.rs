//! # 元素周期表
//!
//! 元素符号与原子序数互查，索引 0 为占位符 `X`。
//!
//! ## 依赖关系
//! - 被 `plot/dimers.rs`, `fit/basis.rs` 使用

use crate::error::{AceError, Result};

pub const CHEMICAL_SYMBOLS: [&str; 119] = [
    "X", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S",
    "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge",
    "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd",
    "In", "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd",
    "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm",
    "Bk", "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn",
    "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

/// 元素符号 -> 原子序数
pub fn atomic_number(symbol: &str) -> Result<usize> {
    CHEMICAL_SYMBOLS
        .iter()
        .skip(1)
        .position(|&s| s == symbol)
        .map(|i| i + 1)
        .ok_or_else(|| AceError::UnknownElement(symbol.to_string()))
}

/// 原子序数 -> 元素符号
pub fn symbol(z: usize) -> Result<&'static str> {
    match CHEMICAL_SYMBOLS.get(z) {
        Some(s) if z > 0 => Ok(s),
        _ => Err(AceError::UnknownElement(format!("Z={}", z))),
    }
}

/// 所有无序元素对 (Z0 <= Z1)，按原子序数排序并去重
pub fn element_pairs(elements: &[String]) -> Result<Vec<(&'static str, &'static str)>> {
    let mut zs = elements
        .iter()
        .map(|e| atomic_number(e))
        .collect::<Result<Vec<_>>>()?;
    zs.sort_unstable();
    zs.dedup();

    let mut pairs = Vec::new();
    for (i, &z0) in zs.iter().enumerate() {
        for &z1 in &zs[i..] {
            pairs.push((symbol(z0)?, symbol(z1)?));
        }
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomic_number() {
        assert_eq!(atomic_number("H").unwrap(), 1);
        assert_eq!(atomic_number("Al").unwrap(), 13);
        assert_eq!(atomic_number("Og").unwrap(), 118);
        assert!(atomic_number("X").is_err());
        assert!(atomic_number("Qq").is_err());
    }

    #[test]
    fn test_element_pairs_sorted_by_z() {
        let pairs = element_pairs(&["Si".into(), "Al".into(), "Si".into()]).unwrap();
        assert_eq!(pairs, vec![("Al", "Al"), ("Al", "Si"), ("Si", "Si")]);
    }
}
