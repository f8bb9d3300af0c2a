// ==========================================
// 面包生产线设定系统 - 引擎层
// ==========================================
// 职责: 可见性判定、配置编辑、技术名生成等纯内存规则
// 红线: 无 I/O，无全局可变状态
// ==========================================

pub mod config_editor;
pub mod default_config;
pub mod edit_session;
pub mod sheet_view;
pub mod technical_name;
pub mod visibility;

// 重导出核心引擎
pub use config_editor::{
    add_block, add_field, delete_block, delete_field, move_block, move_field,
    normalize_orders, repair_technical_names, update_block, update_field, BlockProperty,
    FieldProperty,
};
pub use default_config::{default_blocks, default_line_overrides};
pub use edit_session::{BlockDraft, EditOutcome, EditSession, FieldDraft, FieldRef};
pub use sheet_view::{
    build_sheet_view, export_sheet_csv, visible_target_fields, SheetBlock, SheetField,
    SheetView, TargetField,
};
pub use technical_name::{generate_technical_name, is_valid_technical_name, normalize_technical_name};
pub use visibility::{line_matches, parse_applicable_lines, VisibilityResolver};
