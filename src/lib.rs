// ==========================================
// 薪资单分发系统 - 核心库
// ==========================================
// 流程: 工作簿 → 规范化行 → 工资单 PDF → 批量邮件 + 投递台账
// 技术栈: Rust + SQLite
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "id");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 导入层 - 工作簿解析与规范化
pub mod importer;

// 渲染层 - 工资单 PDF
pub mod render;

// 分发层 - 文档存储/邮件/台账协调
pub mod dispatch;

// 数据仓储层 - 数据访问
pub mod repository;

// 配置层 - 应用设置 / SMTP
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{
    CellValue, DeliveryLogEntry, DeliveryOutcome, DispatchSummary, DispatchTarget, FlatRow,
    IdentityRole, LineItem, NormalizedRecord, PayrollCategory, Recipient, SlipImportResult,
};

pub use api::{ApiError, ApiResult, SlipApi};
pub use dispatch::{DispatchCoordinator, MailTransport, SmtpMailTransport};
pub use importer::SlipNormalizer;
pub use render::{PayslipRenderer, RenderOptions};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "Slip Gaji";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
