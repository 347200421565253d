// ==========================================
// 薪资单分发系统 - 投递台账数据仓储
// ==========================================
// 表: delivery_log (只追加)
// 红线: (period, email) 最多一条 SENT, 由部分唯一索引保证
// ==========================================

mod core;
mod queries;

#[cfg(test)]
mod tests;

pub use self::core::DeliveryLogRepository;

use crate::domain::delivery::{DeliveryLogEntry, DeliveryLogFilter};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// DeliveryLedger Trait - 分发协调器依赖的台账能力
// ==========================================
#[async_trait]
pub trait DeliveryLedger: Send + Sync {
    /// 是否已有 (period, email) 的 SENT 记录
    async fn exists(&self, period: &str, email: &str) -> RepositoryResult<bool>;

    /// 追加 SENT 记录
    ///
    /// # 返回
    /// - Err(UniqueConstraintViolation): 已有 SENT 记录 (并发重复发送)
    async fn record_sent(
        &self,
        period: &str,
        email: &str,
        employee_name: Option<&str>,
        organization_name: Option<&str>,
    ) -> RepositoryResult<DeliveryLogEntry>;

    /// 追加 FAILED 记录
    async fn record_failed(
        &self,
        period: &str,
        email: &str,
        employee_name: Option<&str>,
        organization_name: Option<&str>,
        error_message: &str,
    ) -> RepositoryResult<DeliveryLogEntry>;

    /// 按时间倒序查询 (limit 上限 500)
    async fn list(
        &self,
        filter: &DeliveryLogFilter,
        limit: usize,
    ) -> RepositoryResult<Vec<DeliveryLogEntry>>;
}

#[async_trait]
impl DeliveryLedger for DeliveryLogRepository {
    async fn exists(&self, period: &str, email: &str) -> RepositoryResult<bool> {
        self.exists_sent(period, email)
    }

    async fn record_sent(
        &self,
        period: &str,
        email: &str,
        employee_name: Option<&str>,
        organization_name: Option<&str>,
    ) -> RepositoryResult<DeliveryLogEntry> {
        self.insert_sent(period, email, employee_name, organization_name)
    }

    async fn record_failed(
        &self,
        period: &str,
        email: &str,
        employee_name: Option<&str>,
        organization_name: Option<&str>,
        error_message: &str,
    ) -> RepositoryResult<DeliveryLogEntry> {
        self.insert_failed(period, email, employee_name, organization_name, error_message)
    }

    async fn list(
        &self,
        filter: &DeliveryLogFilter,
        limit: usize,
    ) -> RepositoryResult<Vec<DeliveryLogEntry>> {
        self.find(filter, limit)
    }
}
