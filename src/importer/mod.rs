// ==========================================
// 薪资单分发系统 - 导入层
// ==========================================
// 职责: 上传的薪资表 (Excel / CSV) → 规范化员工记录
// 流程: 读取 → 选表 → 定位表头 → 分类列 → 生成记录
// ==========================================

// 模块声明
pub mod amount;
pub mod error;
pub mod header_classifier;
pub mod header_locator;
pub mod slip_normalizer;
pub mod workbook_reader;

// 重导出核心类型
pub use amount::{looks_numeric, parse_amount, parse_amount_str};
pub use error::{ImportError, ImportResult};
pub use header_classifier::{
    classify_category, classify_identity, clean_item_label, is_total_marker, HeaderKeywords,
};
pub use header_locator::{HeaderCandidate, HeaderLocation, HeaderLocator, LocateStrategy};
pub use slip_normalizer::{dedupe_labels, select_sheet, SlipNormalizer};
pub use workbook_reader::{CsvReader, ExcelReader, UniversalWorkbookReader, WorkbookReader};
