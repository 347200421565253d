// ==========================================
// 薪资单分发系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体与类型
// 红线: 不含数据访问逻辑,不含渲染/发送逻辑
// ==========================================

pub mod delivery;
pub mod slip;
pub mod types;
pub mod worksheet;

// 重导出核心类型
pub use delivery::{
    DeliveryLogEntry, DeliveryLogFilter, DispatchSummary, DispatchTarget, FailedDelivery,
    Recipient, RecipientOutcome, MAX_LOG_LIST_LIMIT,
};
pub use slip::{FlatRow, HeaderCell, LineItem, NormalizedColumn, NormalizedRecord, SlipImportResult};
pub use types::{CellValue, DeliveryOutcome, IdentityRole, PayrollCategory};
pub use worksheet::{RawWorkbook, RawWorksheet};
