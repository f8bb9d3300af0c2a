// ==========================================
// 面包生产线设定系统 - 配置文档
// ==========================================
// 职责: 区块列表的整体存储单元（整表替换写入）
// ==========================================

use crate::domain::block::Block;
use serde::{Deserialize, Serialize};

/// 配置文档：一次保存即整体替换 blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    pub blocks: Vec<Block>,
    /// 每次保存自增
    pub revision: i64,
    pub updated_at: Option<String>,
    pub updated_by: Option<String>,
}

/// 读取配置时返回的快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSnapshot {
    pub blocks: Vec<Block>,
    /// 0 表示尚未保存过（使用内置默认配置）
    pub revision: i64,
    pub is_default: bool,
}

impl From<ConfigDocument> for ConfigSnapshot {
    fn from(doc: ConfigDocument) -> Self {
        Self {
            blocks: doc.blocks,
            revision: doc.revision,
            is_default: false,
        }
    }
}
