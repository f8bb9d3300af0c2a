// ==========================================
// 面包生产线设定系统 - 可见性判定引擎
// ==========================================
// 职责: 给定区块配置与产线号，判定区块/字段是否展示
// 红线: 全函数，查找不到一律判定为不可见（fail closed）
// 说明: 引擎只过滤不排序，排序由调用方按 order 完成
// ==========================================

use crate::domain::block::{find_block, Block, Field};
use crate::domain::types::{BlockLineOverride, ALL_LINES};

/// 产线号匹配规则（区块与字段共用）
///
/// - 产线号为空，或未声明 applicableLines：默认可见
/// - 否则：包含 "*" 或与产线号完全相等的项时可见
pub fn line_matches(applicable_lines: &[String], line: Option<&str>) -> bool {
    let line = match line {
        Some(l) if !l.is_empty() => l,
        _ => return true,
    };

    if applicable_lines.is_empty() {
        return true;
    }

    applicable_lines
        .iter()
        .any(|l| l == ALL_LINES || l == line)
}

/// 解析适用产线文本：按逗号分割、去空白、丢弃空项
///
/// "*" 不做特殊解析，只在判定时解释为通配
pub fn parse_applicable_lines(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

// ==========================================
// VisibilityResolver
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct VisibilityResolver {
    overrides: Vec<BlockLineOverride>,
}

impl VisibilityResolver {
    /// 创建判定器
    ///
    /// # 参数
    /// - overrides: 叠加在 applicableLines 之上的区块产线例外
    pub fn new(overrides: Vec<BlockLineOverride>) -> Self {
        Self { overrides }
    }

    pub fn overrides(&self) -> &[BlockLineOverride] {
        &self.overrides
    }

    /// 区块是否可见
    pub fn is_block_visible(&self, blocks: &[Block], block_id: &str, line: Option<&str>) -> bool {
        match find_block(blocks, block_id) {
            Some(block) => self.block_passes(block, line),
            None => false,
        }
    }

    /// 字段是否可见
    ///
    /// 仅检查区块自身的 visible 开关与字段规则；区块的产线规则由
    /// is_block_visible 负责，渲染方先过滤区块再过滤字段。
    pub fn is_field_visible(
        &self,
        blocks: &[Block],
        block_id: &str,
        field_id: &str,
        line: Option<&str>,
    ) -> bool {
        let block = match find_block(blocks, block_id) {
            Some(b) if b.visible => b,
            _ => return false,
        };

        match block.field(field_id) {
            Some(field) => field_passes(field, line),
            None => false,
        }
    }

    /// 区块判定（已持有实体时使用，避免重复查找）
    pub fn block_passes(&self, block: &Block, line: Option<&str>) -> bool {
        if !block.visible {
            return false;
        }
        if !line_matches(&block.applicable_lines, line) {
            return false;
        }
        self.override_allows(&block.id, line)
    }

    /// 可见区块（保持输入顺序，不排序）
    pub fn visible_blocks<'a>(&self, blocks: &'a [Block], line: Option<&str>) -> Vec<&'a Block> {
        blocks
            .iter()
            .filter(|b| self.block_passes(b, line))
            .collect()
    }

    /// 区块内可见字段（保持输入顺序，不排序）
    pub fn visible_fields<'a>(&self, block: &'a Block, line: Option<&str>) -> Vec<&'a Field> {
        if !block.visible {
            return Vec::new();
        }
        block
            .fields
            .iter()
            .filter(|f| field_passes(f, line))
            .collect()
    }

    /// 历史例外：声明的 applicableLines 与覆写规则同时生效
    fn override_allows(&self, block_id: &str, line: Option<&str>) -> bool {
        let line = match line {
            Some(l) if !l.is_empty() => l,
            _ => return true,
        };

        self.overrides
            .iter()
            .filter(|o| o.block_id == block_id)
            .all(|o| {
                let allowed = o.rule.allows(line);
                if !allowed {
                    tracing::trace!(block_id, line, rule = %o.rule, "区块被产线覆写规则隐藏");
                }
                allowed
            })
    }
}

fn field_passes(field: &Field, line: Option<&str>) -> bool {
    field.visible && line_matches(&field.applicable_lines, line)
}
