// ==========================================
// 面包生产线设定系统 - 领域类型定义
// ==========================================
// 职责: 配置编辑与可见性判定共用的值类型
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 适用产线通配符（适用于所有产线）
pub const ALL_LINES: &str = "*";

// ==========================================
// 移动方向 (Move Direction)
// ==========================================
// Up: 向前移动一位（order 减小）
// Down: 向后移动一位（order 增大）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MoveDirection {
    Up,
    Down,
}

impl fmt::Display for MoveDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveDirection::Up => write!(f, "UP"),
            MoveDirection::Down => write!(f, "DOWN"),
        }
    }
}

// ==========================================
// 产线规则 (Line Rule)
// ==========================================
// 叠加在 applicableLines 之上的产线例外规则
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "lines", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineRule {
    /// 对列出的产线强制隐藏
    HiddenFor(Vec<String>),
    /// 仅对列出的产线显示
    OnlyFor(Vec<String>),
}

impl LineRule {
    /// 规则是否允许该产线显示
    pub fn allows(&self, line: &str) -> bool {
        match self {
            LineRule::HiddenFor(lines) => !lines.iter().any(|l| l == line),
            LineRule::OnlyFor(lines) => lines.iter().any(|l| l == line),
        }
    }
}

impl fmt::Display for LineRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineRule::HiddenFor(lines) => write!(f, "HIDDEN_FOR({})", lines.join(",")),
            LineRule::OnlyFor(lines) => write!(f, "ONLY_FOR({})", lines.join(",")),
        }
    }
}

// ==========================================
// 区块产线覆写 (Block Line Override)
// ==========================================
// 历史上写死在页面中的工位组例外，现作为配置数据保存
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockLineOverride {
    pub block_id: String,
    pub rule: LineRule,
}

impl BlockLineOverride {
    pub fn hidden_for(block_id: &str, lines: &[&str]) -> Self {
        Self {
            block_id: block_id.to_string(),
            rule: LineRule::HiddenFor(lines.iter().map(|l| l.to_string()).collect()),
        }
    }

    pub fn only_for(block_id: &str, lines: &[&str]) -> Self {
        Self {
            block_id: block_id.to_string(),
            rule: LineRule::OnlyFor(lines.iter().map(|l| l.to_string()).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_rule_allows() {
        let hidden = LineRule::HiddenFor(vec!["2".to_string(), "5".to_string()]);
        assert!(!hidden.allows("2"));
        assert!(hidden.allows("3"));

        let only = LineRule::OnlyFor(vec!["1".to_string(), "4".to_string(), "6".to_string()]);
        assert!(only.allows("4"));
        assert!(!only.allows("5"));
    }

    #[test]
    fn test_line_rule_serde_format() {
        let rule = BlockLineOverride::hidden_for("b_diviseuse", &["2", "5"]);
        let json = serde_json::to_string(&rule).unwrap();
        assert_eq!(
            json,
            r#"{"block_id":"b_diviseuse","rule":{"type":"HIDDEN_FOR","lines":["2","5"]}}"#
        );
        let back: BlockLineOverride = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rule);
    }
}
