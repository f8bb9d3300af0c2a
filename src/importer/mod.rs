// ==========================================
// 面包生产线设定系统 - 导入层
// ==========================================
// 职责: 表格文件 → 设定记录
// 支持: Excel (.xlsx/.xls), CSV
// ==========================================

// 模块声明
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod product_importer;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use field_mapper::{ColumnMapping, FieldMapper};
pub use file_parser::{CsvParser, ExcelParser, FileParser, ParsedSheet, UniversalFileParser};
pub use product_importer::{ImportPlan, ImportPreview, ProductImporter, SkippedRow, PREVIEW_SAMPLE_ROWS};
