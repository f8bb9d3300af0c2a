// ==========================================
// 面包生产线设定系统 - 配置编辑器
// ==========================================
// 职责: 对区块列表做单次变更，返回新的列表（旧列表入，新列表出）
// 不变量:
// - 区块技术名全局唯一；字段技术名在所属区块内唯一
// - 增/删/移动之后 order 从 1 开始连续
// 说明: 纯函数，不做表单校验（由 api::validator 负责）
// ==========================================

use crate::domain::block::{Block, Field};
use crate::domain::types::{MoveDirection, ALL_LINES};
use crate::engine::technical_name::generate_technical_name;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

pub const DEFAULT_BLOCK_NAME: &str = "Nouveau bloc";
pub const DEFAULT_FIELD_NAME: &str = "Nouveau champ";
pub const BLOCK_TECHNICAL_BASE: &str = "nouveauBloc";
pub const FIELD_TECHNICAL_BASE: &str = "nouveauChamp";

// ==========================================
// 单属性变更
// ==========================================

/// 区块属性变更
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "property", content = "value", rename_all = "camelCase")]
pub enum BlockProperty {
    Name(String),
    TechnicalName(String),
    Order(u32),
    ApplicableLines(Vec<String>),
    Visible(bool),
}

/// 字段属性变更
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "property", content = "value", rename_all = "camelCase")]
pub enum FieldProperty {
    Name(String),
    TechnicalName(String),
    Order(u32),
    ApplicableLines(Vec<String>),
    Visible(bool),
}

/// 可排序实体（区块/字段共用的移动与重排逻辑）
trait Ordered {
    fn order(&self) -> u32;
    fn set_order(&mut self, order: u32);
    fn id(&self) -> &str;
}

impl Ordered for Block {
    fn order(&self) -> u32 {
        self.order
    }
    fn set_order(&mut self, order: u32) {
        self.order = order;
    }
    fn id(&self) -> &str {
        &self.id
    }
}

impl Ordered for Field {
    fn order(&self) -> u32 {
        self.order
    }
    fn set_order(&mut self, order: u32) {
        self.order = order;
    }
    fn id(&self) -> &str {
        &self.id
    }
}

// ==========================================
// 区块操作
// ==========================================

/// 追加新区块
///
/// # 返回
/// - (新列表, 新区块)
/// - order = 现有最大 order + 1（空列表为 1）
/// - technicalName 由 "nouveauBloc" 生成，全局唯一
pub fn add_block(blocks: &[Block]) -> (Vec<Block>, Block) {
    let existing_names = block_technical_names(blocks);
    let existing_ids: HashSet<&str> = blocks.iter().map(|b| b.id.as_str()).collect();

    let block = Block {
        id: new_entity_id("block", &existing_ids),
        name: DEFAULT_BLOCK_NAME.to_string(),
        technical_name: generate_technical_name(BLOCK_TECHNICAL_BASE, &existing_names),
        order: next_order(blocks),
        applicable_lines: vec![ALL_LINES.to_string()],
        visible: true,
        fields: Vec::new(),
    };

    let mut next = blocks.to_vec();
    next.push(block.clone());
    (next, block)
}

/// 删除区块并重排 order
pub fn delete_block(blocks: &[Block], block_id: &str) -> Vec<Block> {
    let mut remaining: Vec<Block> = blocks.iter().filter(|b| b.id != block_id).cloned().collect();
    renumber(&mut remaining);
    remaining
}

/// 与相邻区块交换位置
pub fn move_block(blocks: &[Block], block_id: &str, direction: MoveDirection) -> Vec<Block> {
    move_adjacent(blocks, block_id, direction)
}

/// 修改区块单个属性（区块不存在时原样返回）
pub fn update_block(blocks: &[Block], block_id: &str, property: BlockProperty) -> Vec<Block> {
    let mut next = blocks.to_vec();
    if let Some(block) = next.iter_mut().find(|b| b.id == block_id) {
        match property {
            BlockProperty::Name(name) => block.name = name,
            BlockProperty::TechnicalName(technical_name) => block.technical_name = technical_name,
            BlockProperty::Order(order) => block.order = order,
            BlockProperty::ApplicableLines(lines) => block.applicable_lines = lines,
            BlockProperty::Visible(visible) => block.visible = visible,
        }
    }
    next
}

// ==========================================
// 字段操作
// ==========================================

/// 在指定区块追加新字段
///
/// # 返回
/// - Some((新列表, 新字段))
/// - None: 区块不存在
pub fn add_field(blocks: &[Block], block_id: &str) -> Option<(Vec<Block>, Field)> {
    let mut next = blocks.to_vec();
    let block = next.iter_mut().find(|b| b.id == block_id)?;

    let existing_names = field_technical_names(block);
    let existing_ids: HashSet<&str> = block.fields.iter().map(|f| f.id.as_str()).collect();

    let field = Field {
        id: new_entity_id("field", &existing_ids),
        name: DEFAULT_FIELD_NAME.to_string(),
        technical_name: generate_technical_name(FIELD_TECHNICAL_BASE, &existing_names),
        order: next_order(&block.fields),
        applicable_lines: vec![ALL_LINES.to_string()],
        visible: true,
    };

    block.fields.push(field.clone());
    Some((next, field))
}

/// 删除字段并重排所属区块内的 order
pub fn delete_field(blocks: &[Block], block_id: &str, field_id: &str) -> Vec<Block> {
    let mut next = blocks.to_vec();
    if let Some(block) = next.iter_mut().find(|b| b.id == block_id) {
        block.fields.retain(|f| f.id != field_id);
        renumber(&mut block.fields);
    }
    next
}

/// 与同区块内相邻字段交换位置
pub fn move_field(
    blocks: &[Block],
    block_id: &str,
    field_id: &str,
    direction: MoveDirection,
) -> Vec<Block> {
    let mut next = blocks.to_vec();
    if let Some(block) = next.iter_mut().find(|b| b.id == block_id) {
        block.fields = move_adjacent(&block.fields, field_id, direction);
    }
    next
}

/// 修改字段单个属性（区块或字段不存在时原样返回）
pub fn update_field(
    blocks: &[Block],
    block_id: &str,
    field_id: &str,
    property: FieldProperty,
) -> Vec<Block> {
    let mut next = blocks.to_vec();
    let field = next
        .iter_mut()
        .find(|b| b.id == block_id)
        .and_then(|b| b.fields.iter_mut().find(|f| f.id == field_id));

    if let Some(field) = field {
        match property {
            FieldProperty::Name(name) => field.name = name,
            FieldProperty::TechnicalName(technical_name) => field.technical_name = technical_name,
            FieldProperty::Order(order) => field.order = order,
            FieldProperty::ApplicableLines(lines) => field.applicable_lines = lines,
            FieldProperty::Visible(visible) => field.visible = visible,
        }
    }
    next
}

// ==========================================
// 技术名作用域
// ==========================================

/// 区块技术名集合（全局作用域）
pub fn block_technical_names(blocks: &[Block]) -> HashSet<String> {
    blocks
        .iter()
        .filter(|b| !b.technical_name.is_empty())
        .map(|b| b.technical_name.clone())
        .collect()
}

/// 字段技术名集合（所属区块作用域）
pub fn field_technical_names(block: &Block) -> HashSet<String> {
    block
        .fields
        .iter()
        .filter(|f| !f.technical_name.is_empty())
        .map(|f| f.technical_name.clone())
        .collect()
}

// ==========================================
// 保存前整理
// ==========================================

/// 为缺失技术名的区块/字段补齐技术名（历史数据）
///
/// # 返回
/// - (整理后的列表, 补齐的数量)
pub fn repair_technical_names(blocks: &[Block]) -> (Vec<Block>, usize) {
    let mut next = blocks.to_vec();
    let mut repaired = 0;

    let mut block_names = block_technical_names(&next);
    for block in next.iter_mut() {
        if block.technical_name.is_empty() {
            let base = label_or(&block.name, BLOCK_TECHNICAL_BASE);
            block.technical_name = generate_technical_name(base, &block_names);
            block_names.insert(block.technical_name.clone());
            repaired += 1;
        }

        let mut field_names = field_technical_names(block);
        for field in block.fields.iter_mut() {
            if field.technical_name.is_empty() {
                let base = label_or(&field.name, FIELD_TECHNICAL_BASE);
                field.technical_name = generate_technical_name(base, &field_names);
                field_names.insert(field.technical_name.clone());
                repaired += 1;
            }
        }
    }

    (next, repaired)
}

/// 按 order 稳定排序并重新编号为 1..N（区块与各区块字段）
pub fn normalize_orders(blocks: &[Block]) -> Vec<Block> {
    let mut next = blocks.to_vec();
    renumber(&mut next);
    for block in next.iter_mut() {
        renumber(&mut block.fields);
    }
    next
}

// ==========================================
// 内部工具
// ==========================================

fn label_or<'a>(label: &'a str, fallback: &'a str) -> &'a str {
    if label.trim().is_empty() {
        fallback
    } else {
        label.trim()
    }
}

fn next_order<T: Ordered>(items: &[T]) -> u32 {
    items
        .iter()
        .map(Ordered::order)
        .max()
        .unwrap_or(0)
        .saturating_add(1)
}

fn new_entity_id(prefix: &str, existing: &HashSet<&str>) -> String {
    loop {
        let id = format!("{}_{}", prefix, Uuid::new_v4().simple());
        if !existing.contains(id.as_str()) {
            return id;
        }
    }
}

/// 按当前相对顺序稳定排序并编号为 1..N
fn renumber<T: Ordered>(items: &mut [T]) {
    items.sort_by_key(Ordered::order);
    for (idx, item) in items.iter_mut().enumerate() {
        item.set_order(idx as u32 + 1);
    }
}

/// 交换 order 值与数组位置（两者同步移动）
///
/// 已在边界（首项上移/末项下移）或 id 不存在时原样返回；
/// order 有重复时先重排为 1..N 再交换
fn move_adjacent<T: Ordered + Clone>(items: &[T], id: &str, direction: MoveDirection) -> Vec<T> {
    let mut sorted = items.to_vec();
    sorted.sort_by_key(Ordered::order);

    let idx = match sorted.iter().position(|item| item.id() == id) {
        Some(i) => i,
        None => return items.to_vec(),
    };

    let neighbor = match direction {
        MoveDirection::Up if idx > 0 => idx - 1,
        MoveDirection::Down if idx + 1 < sorted.len() => idx + 1,
        _ => return items.to_vec(),
    };

    if sorted.windows(2).any(|pair| pair[0].order() == pair[1].order()) {
        renumber(&mut sorted);
    }

    let moving_order = sorted[idx].order();
    let neighbor_order = sorted[neighbor].order();
    sorted[idx].set_order(neighbor_order);
    sorted[neighbor].set_order(moving_order);
    sorted.swap(idx, neighbor);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(id: &str, order: u32) -> Field {
        Field {
            id: id.to_string(),
            name: id.to_string(),
            technical_name: id.to_string(),
            order,
            applicable_lines: vec!["*".to_string()],
            visible: true,
        }
    }

    fn block(id: &str, order: u32, fields: Vec<Field>) -> Block {
        Block {
            id: id.to_string(),
            name: id.to_string(),
            technical_name: id.to_string(),
            order,
            applicable_lines: vec!["*".to_string()],
            visible: true,
            fields,
        }
    }

    fn orders(blocks: &[Block]) -> Vec<(String, u32)> {
        blocks.iter().map(|b| (b.id.clone(), b.order)).collect()
    }

    #[test]
    fn test_add_block_into_empty_list() {
        let (blocks, added) = add_block(&[]);
        assert_eq!(blocks.len(), 1);
        assert_eq!(added.order, 1);
        assert_eq!(added.technical_name, "nouveaubloc");
        assert_eq!(added.name, DEFAULT_BLOCK_NAME);
        assert_eq!(added.applicable_lines, vec!["*"]);
        assert!(added.visible);
        assert!(added.fields.is_empty());
    }

    #[test]
    fn test_add_block_repeatedly_yields_unique_technical_names() {
        let mut blocks = Vec::new();
        let mut names = Vec::new();
        for _ in 0..4 {
            let (next, added) = add_block(&blocks);
            names.push(added.technical_name.clone());
            blocks = next;
        }
        assert_eq!(names, vec!["nouveaubloc", "nouveaubloc1", "nouveaubloc2", "nouveaubloc3"]);

        let ids: HashSet<&str> = blocks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids.len(), 4);
        assert_eq!(blocks.iter().map(|b| b.order).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_add_block_order_uses_max_plus_one() {
        let blocks = vec![block("a", 1, vec![]), block("b", 7, vec![])];
        let (_, added) = add_block(&blocks);
        assert_eq!(added.order, 8);
    }

    #[test]
    fn test_add_block_after_max_order_does_not_overflow() {
        let blocks = vec![block("a", 1, vec![]), block("b", u32::MAX, vec![])];
        let (next, added) = add_block(&blocks);
        assert_eq!(added.order, u32::MAX);

        // 保存前整理后 order 恢复连续
        let normalized = normalize_orders(&next);
        assert_eq!(
            normalized.iter().map(|b| b.order).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );

        let (_, added_field) =
            add_field(&[block("c", 1, vec![field("f1", u32::MAX)])], "c").unwrap();
        assert_eq!(added_field.order, u32::MAX);
    }

    #[test]
    fn test_add_field_unique_within_block_only() {
        let mut other = block("other", 1, vec![]);
        other.fields.push(Field {
            technical_name: "nouveauchamp".to_string(),
            ..field("x", 1)
        });
        let blocks = vec![other, block("target", 2, vec![])];

        let (blocks, first) = add_field(&blocks, "target").unwrap();
        assert_eq!(first.technical_name, "nouveauchamp");
        assert_eq!(first.order, 1);

        let (blocks, second) = add_field(&blocks, "target").unwrap();
        assert_eq!(second.technical_name, "nouveauchamp1");
        assert_eq!(second.order, 2);
        assert_eq!(blocks[1].fields.len(), 2);
    }

    #[test]
    fn test_add_field_unknown_block() {
        let blocks = vec![block("a", 1, vec![])];
        assert!(add_field(&blocks, "missing").is_none());
    }

    #[test]
    fn test_delete_block_renumbers() {
        let blocks = vec![block("a", 1, vec![]), block("b", 2, vec![]), block("c", 3, vec![])];
        let next = delete_block(&blocks, "b");
        assert_eq!(
            orders(&next),
            vec![("a".to_string(), 1), ("c".to_string(), 2)]
        );
    }

    #[test]
    fn test_delete_field_keeps_dense_order() {
        let blocks = vec![block(
            "b1",
            1,
            vec![field("f1", 1), field("f2", 2), field("f3", 3), field("f4", 4)],
        )];
        let next = delete_field(&blocks, "b1", "f2");
        let remaining: Vec<(&str, u32)> = next[0]
            .fields
            .iter()
            .map(|f| (f.id.as_str(), f.order))
            .collect();
        assert_eq!(remaining, vec![("f1", 1), ("f3", 2), ("f4", 3)]);
    }

    #[test]
    fn test_move_block_up_at_first_is_noop() {
        let blocks = vec![block("a", 1, vec![]), block("b", 2, vec![])];
        assert_eq!(move_block(&blocks, "a", MoveDirection::Up), blocks);
        assert_eq!(move_block(&blocks, "b", MoveDirection::Down), blocks);
        assert_eq!(move_block(&blocks, "zzz", MoveDirection::Down), blocks);
    }

    #[test]
    fn test_move_block_down_swaps_order_and_position() {
        let blocks = vec![block("a", 1, vec![]), block("b", 2, vec![]), block("c", 3, vec![])];
        let next = move_block(&blocks, "a", MoveDirection::Down);
        assert_eq!(
            orders(&next),
            vec![("b".to_string(), 1), ("a".to_string(), 2), ("c".to_string(), 3)]
        );
    }

    #[test]
    fn test_move_field_up_swaps_with_previous() {
        let blocks = vec![block("b1", 1, vec![field("f1", 1), field("f2", 2), field("f3", 3)])];
        let next = move_field(&blocks, "b1", "f2", MoveDirection::Up);

        let by_id = |id: &str| next[0].fields.iter().find(|f| f.id == id).unwrap().order;
        assert_eq!(by_id("f1"), 2);
        assert_eq!(by_id("f2"), 1);
        assert_eq!(by_id("f3"), 3);

        // 数组顺序与 order 升序一致
        let ids: Vec<&str> = next[0].fields.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["f2", "f1", "f3"]);
    }

    #[test]
    fn test_move_with_duplicate_orders_keeps_array_and_order_aligned() {
        let blocks = vec![block("a", 1, vec![]), block("b", 2, vec![]), block("c", 2, vec![])];
        let next = move_block(&blocks, "a", MoveDirection::Down);
        assert_eq!(
            orders(&next),
            vec![("b".to_string(), 1), ("a".to_string(), 2), ("c".to_string(), 3)]
        );

        let fields = vec![block("b1", 1, vec![field("f1", 5), field("f2", 5)])];
        let next = move_field(&fields, "b1", "f2", MoveDirection::Up);
        let ids: Vec<(&str, u32)> = next[0]
            .fields
            .iter()
            .map(|f| (f.id.as_str(), f.order))
            .collect();
        assert_eq!(ids, vec![("f2", 1), ("f1", 2)]);
    }

    #[test]
    fn test_update_block_and_field_properties() {
        let blocks = vec![block("b1", 1, vec![field("f1", 1)])];

        let next = update_block(&blocks, "b1", BlockProperty::Name("Four".to_string()));
        let next = update_block(&next, "b1", BlockProperty::Visible(false));
        let next = update_field(
            &next,
            "b1",
            "f1",
            FieldProperty::ApplicableLines(vec!["2".to_string(), "5".to_string()]),
        );
        let next = update_field(&next, "b1", "f1", FieldProperty::TechnicalName("t_four".to_string()));

        assert_eq!(next[0].name, "Four");
        assert!(!next[0].visible);
        assert_eq!(next[0].fields[0].applicable_lines, vec!["2", "5"]);
        assert_eq!(next[0].fields[0].technical_name, "t_four");

        // 原列表不受影响
        assert_eq!(blocks[0].name, "b1");
    }

    #[test]
    fn test_update_unknown_entity_is_noop() {
        let blocks = vec![block("b1", 1, vec![field("f1", 1)])];
        assert_eq!(update_block(&blocks, "x", BlockProperty::Order(9)), blocks);
        assert_eq!(update_field(&blocks, "b1", "x", FieldProperty::Visible(false)), blocks);
    }

    #[test]
    fn test_repair_technical_names() {
        let mut legacy = block("b1", 1, vec![field("f1", 1), field("f2", 2)]);
        legacy.technical_name = String::new();
        legacy.name = "Four".to_string();
        legacy.fields[0].technical_name = String::new();
        legacy.fields[0].name = "f2".to_string();
        let blocks = vec![legacy, block("four", 2, vec![])];

        let (repaired, count) = repair_technical_names(&blocks);
        assert_eq!(count, 2);
        assert_eq!(repaired[0].technical_name, "four1");
        // "f2" 已被同区块字段占用
        assert_eq!(repaired[0].fields[0].technical_name, "f21");
    }

    #[test]
    fn test_normalize_orders() {
        let blocks = vec![
            block("b", 5, vec![field("f2", 9), field("f1", 3)]),
            block("a", 2, vec![]),
        ];
        let next = normalize_orders(&blocks);
        assert_eq!(
            orders(&next),
            vec![("a".to_string(), 1), ("b".to_string(), 2)]
        );
        let fields: Vec<(&str, u32)> = next[1]
            .fields
            .iter()
            .map(|f| (f.id.as_str(), f.order))
            .collect();
        assert_eq!(fields, vec![("f1", 1), ("f2", 2)]);
    }
}
