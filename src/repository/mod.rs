// ==========================================
// 薪资单分发系统 - 数据仓储层
// ==========================================
// 职责: 数据访问 (SQLite)
// 红线: Repository 不含业务规则, 只做数据映射
// ==========================================

pub mod delivery_log_repo;
pub mod error;
pub mod settings_repo;

pub use delivery_log_repo::{DeliveryLedger, DeliveryLogRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use settings_repo::SettingsRepository;
