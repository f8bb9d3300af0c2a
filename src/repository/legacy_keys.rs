// ==========================================
// 面包生产线设定系统 - 历史键名归一化
// ==========================================
// 背景: 早期记录以多种大小写/拼写写入同一逻辑字段
// 处理: 在存储边界把历史键名改写为规范技术名；新写入只用规范名
// 优先级: 已存在的规范键优先于历史别名
// ==========================================

use crate::domain::product::{core_keys, ProductRecord};
use std::collections::{BTreeMap, HashMap};

/// 核心字段的历史拼写（比较前已做 alias_form 处理）
const CORE_ALIASES: &[(&str, &[&str])] = &[
    (core_keys::CODE_ARTICLE, &["codearticle", "code", "article", "codeart"]),
    (core_keys::NUMERO_LIGNE, &["numeroligne", "numligne", "ligne", "line", "nligne"]),
    (core_keys::DESIGNATION, &["designation", "libelle", "desc"]),
];

/// 比较形式：小写，去掉下划线、空格、连字符，法文重音折叠
fn alias_form(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '_' | ' ' | '-'))
        .flat_map(char::to_lowercase)
        .map(fold_accent)
        .collect()
}

fn fold_accent(c: char) -> char {
    match c {
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'à' | 'â' => 'a',
        'î' | 'ï' => 'i',
        'ô' => 'o',
        'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        _ => c,
    }
}

/// 识别核心字段的历史拼写，返回规范键
pub fn core_key_for(key: &str) -> Option<&'static str> {
    let form = alias_form(key);
    CORE_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&form.as_str()))
        .map(|(canonical, _)| *canonical)
}

/// 历史键名归一化器
#[derive(Debug, Clone, Default)]
pub struct LegacyKeyNormalizer {
    /// 小写形式 → 规范技术名
    canonical: HashMap<String, String>,
}

impl LegacyKeyNormalizer {
    /// 以当前配置中的全部字段技术名作为规范键
    pub fn new<I, S>(technical_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let canonical = technical_names
            .into_iter()
            .map(Into::into)
            .map(|name| (name.to_lowercase(), name))
            .collect();
        Self { canonical }
    }

    /// 归一化一条记录
    ///
    /// # 返回
    /// - (归一化后的记录, 是否发生改写)
    pub fn normalize(&self, record: ProductRecord) -> (ProductRecord, bool) {
        let ProductRecord {
            mut code_article,
            mut numero_ligne,
            mut designation,
            values,
        } = record;

        let mut changed = false;
        let mut canonical_values: BTreeMap<String, String> = BTreeMap::new();
        let mut alias_values: Vec<(String, String)> = Vec::new();

        for (key, value) in values {
            // 配置中的技术名优先于核心字段别名（如字段技术名恰为 "ligne"）
            if let Some(canonical) = self.canonical.get(&key.to_lowercase()) {
                if *canonical == key {
                    canonical_values.insert(key, value);
                } else {
                    alias_values.push((canonical.clone(), value));
                    changed = true;
                }
                continue;
            }

            if let Some(core) = core_key_for(&key) {
                // 核心字段以列值为准，仅在列值为空时回填
                let slot = match core {
                    core_keys::CODE_ARTICLE => &mut code_article,
                    core_keys::NUMERO_LIGNE => &mut numero_ligne,
                    _ => &mut designation,
                };
                if slot.is_empty() {
                    *slot = value;
                }
                changed = true;
                continue;
            }

            canonical_values.insert(key, value);
        }

        for (canonical, value) in alias_values {
            canonical_values.entry(canonical).or_insert(value);
        }

        (
            ProductRecord {
                code_article,
                numero_ligne,
                designation,
                values: canonical_values,
            },
            changed,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_variants_renamed_to_canonical() {
        let normalizer = LegacyKeyNormalizer::new(["temperature_four", "duree_cuisson"]);
        let record = ProductRecord::new("BAG001", "4", "Baguette")
            .with_value("Temperature_Four", "240")
            .with_value("DUREE_CUISSON", "22")
            .with_value("inconnu", "x");

        let (normalized, changed) = normalizer.normalize(record);
        assert!(changed);
        assert_eq!(normalized.value("temperature_four"), Some("240"));
        assert_eq!(normalized.value("duree_cuisson"), Some("22"));
        assert_eq!(normalized.value("inconnu"), Some("x"));
        assert!(normalized.value("Temperature_Four").is_none());
    }

    #[test]
    fn test_canonical_value_wins_over_alias() {
        let normalizer = LegacyKeyNormalizer::new(["temperature_four"]);
        let record = ProductRecord::new("BAG001", "4", "")
            .with_value("TEMPERATURE_FOUR", "old")
            .with_value("temperature_four", "new");
        let (normalized, _) = normalizer.normalize(record);
        assert_eq!(normalized.value("temperature_four"), Some("new"));
        assert_eq!(normalized.values.len(), 1);
    }

    #[test]
    fn test_core_aliases_removed_and_backfilled() {
        let normalizer = LegacyKeyNormalizer::default();
        let mut record = ProductRecord::new("BAG001", "4", "")
            .with_value("Code_Article", "IGNORED")
            .with_value("Libelle", "Baguette tradition");
        record.code_article = "BAG001".to_string();

        let (normalized, changed) = normalizer.normalize(record);
        assert!(changed);
        assert_eq!(normalized.code_article, "BAG001");
        assert_eq!(normalized.designation, "Baguette tradition");
        assert!(normalized.values.is_empty());
    }

    #[test]
    fn test_canonical_record_is_unchanged() {
        let normalizer = LegacyKeyNormalizer::new(["temperature_four"]);
        let record = ProductRecord::new("BAG001", "4", "B").with_value("temperature_four", "240");
        let (normalized, changed) = normalizer.normalize(record.clone());
        assert!(!changed);
        assert_eq!(normalized, record);
    }

    #[test]
    fn test_core_key_for_header_spellings() {
        assert_eq!(core_key_for("Code article"), Some(core_keys::CODE_ARTICLE));
        assert_eq!(core_key_for("N° ligne"), None);
        assert_eq!(core_key_for("Numéro-Ligne"), Some(core_keys::NUMERO_LIGNE));
        assert_eq!(core_key_for("Désignation"), Some(core_keys::DESIGNATION));
    }
}
