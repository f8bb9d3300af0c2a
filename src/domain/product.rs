// ==========================================
// 面包生产线设定系统 - 产品设定记录
// ==========================================
// 职责: 一张设定单 (fiche) 的扁平键值数据
// 主键: "{codeArticle}_{numeroLigne}"
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 固定核心字段的存储键
pub mod core_keys {
    pub const CODE_ARTICLE: &str = "codeArticle";
    pub const NUMERO_LIGNE: &str = "numeroLigne";
    pub const DESIGNATION: &str = "designation";

    pub const ALL: [&str; 3] = [CODE_ARTICLE, NUMERO_LIGNE, DESIGNATION];
}

// ==========================================
// ProductRecord - 产品设定记录
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub code_article: String,
    pub numero_ligne: String,
    #[serde(default)]
    pub designation: String,
    /// 按字段技术名存放的取值
    #[serde(flatten)]
    pub values: BTreeMap<String, String>,
}

impl ProductRecord {
    pub fn new(code_article: &str, numero_ligne: &str, designation: &str) -> Self {
        Self {
            code_article: code_article.trim().to_string(),
            numero_ligne: numero_ligne.trim().to_string(),
            designation: designation.to_string(),
            values: BTreeMap::new(),
        }
    }

    /// 组合主键
    pub fn record_key(&self) -> String {
        record_key(&self.code_article, &self.numero_ligne)
    }

    pub fn with_value(mut self, technical_name: &str, value: &str) -> Self {
        self.values
            .insert(technical_name.to_string(), value.to_string());
        self
    }

    pub fn value(&self, technical_name: &str) -> Option<&str> {
        self.values.get(technical_name).map(String::as_str)
    }

    /// upsert-merge：incoming 中出现的键覆盖，未出现的键保留
    pub fn merge_from(&mut self, incoming: ProductRecord) {
        if !incoming.designation.is_empty() {
            self.designation = incoming.designation;
        }
        for (key, value) in incoming.values {
            self.values.insert(key, value);
        }
    }

    /// 转为扁平字符串映射（写入存储时使用）
    pub fn to_flat_map(&self) -> BTreeMap<String, String> {
        let mut map = self.values.clone();
        map.insert(core_keys::CODE_ARTICLE.to_string(), self.code_article.clone());
        map.insert(core_keys::NUMERO_LIGNE.to_string(), self.numero_ligne.clone());
        map.insert(core_keys::DESIGNATION.to_string(), self.designation.clone());
        map
    }

    /// 从扁平字符串映射构建（核心字段缺失时为空字符串）
    pub fn from_flat_map(mut map: BTreeMap<String, String>) -> Self {
        let code_article = map.remove(core_keys::CODE_ARTICLE).unwrap_or_default();
        let numero_ligne = map.remove(core_keys::NUMERO_LIGNE).unwrap_or_default();
        let designation = map.remove(core_keys::DESIGNATION).unwrap_or_default();
        Self {
            code_article,
            numero_ligne,
            designation,
            values: map,
        }
    }
}

/// 组合主键分隔符
pub const RECORD_KEY_SEPARATOR: char = '_';

/// 产线编号不能含主键分隔符，否则 ("A_1","2") 与 ("A","1_2") 主键相同
pub fn is_valid_line_number(numero_ligne: &str) -> bool {
    !numero_ligne.contains(RECORD_KEY_SEPARATOR)
}

/// 组合主键 "{codeArticle}_{numeroLigne}"
pub fn record_key(code_article: &str, numero_ligne: &str) -> String {
    format!("{}_{}", code_article.trim(), numero_ligne.trim())
}
