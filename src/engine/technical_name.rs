// ==========================================
// 面包生产线设定系统 - 技术名生成器
// ==========================================
// 规则: 小写化, [a-z0-9_] 以外的字符替换为 '_'
// 唯一: 冲突时追加 1, 2, ... 直到不在排除集合中
// 作用域: 由调用方决定（区块全局 / 字段按所属区块）
// ==========================================

use std::collections::HashSet;

/// 规范化为技术名候选
pub fn normalize_technical_name(label: &str) -> String {
    label
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// 根据名称生成在 existing 中不冲突的技术名
///
/// # 参数
/// - base: 原始名称（人类可读标签）
/// - existing: 调用方计算好的排除集合
///
/// # 返回
/// - 规范化后的名称；冲突时追加最小可用的整数后缀（从 1 开始）
pub fn generate_technical_name(base: &str, existing: &HashSet<String>) -> String {
    let candidate = normalize_technical_name(base);
    if !existing.contains(&candidate) {
        return candidate;
    }

    let mut suffix: u32 = 1;
    loop {
        let next = format!("{}{}", candidate, suffix);
        if !existing.contains(&next) {
            return next;
        }
        suffix += 1;
    }
}

/// 表单层允许的技术名格式：非空，仅字母、数字、下划线
pub fn is_valid_technical_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_technical_name("nouveauBloc"), "nouveaubloc");
        assert_eq!(normalize_technical_name("Température four"), "temp_rature_four");
        assert_eq!(normalize_technical_name("Écart-laminoir (mm)"), "_cart_laminoir__mm_");
    }

    #[test]
    fn test_generate_without_collision_is_normalized_form() {
        let existing = set(&["four"]);
        assert_eq!(generate_technical_name("Laminoir", &existing), "laminoir");
    }

    #[test]
    fn test_generate_appends_increasing_suffix() {
        let existing = set(&["nouveaubloc", "nouveaubloc1", "nouveaubloc3"]);
        assert_eq!(generate_technical_name("nouveauBloc", &existing), "nouveaubloc2");
    }

    #[test]
    fn test_generate_is_deterministic() {
        let existing = set(&["a", "a1"]);
        let first = generate_technical_name("A", &existing);
        let second = generate_technical_name("A", &existing);
        assert_eq!(first, second);
        assert_eq!(first, "a2");
    }

    #[test]
    fn test_is_valid_technical_name() {
        assert!(is_valid_technical_name("four_temperature2"));
        assert!(is_valid_technical_name("Four_T"));
        assert!(!is_valid_technical_name(""));
        assert!(!is_valid_technical_name("four-temp"));
        assert!(!is_valid_technical_name("température"));
    }
}
