use crate::domain::delivery::DeliveryLogEntry;
use crate::domain::types::DeliveryOutcome;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Local;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// created_at 存储格式 (毫秒精度, 保证同秒内排序稳定)
pub(super) const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// 台账键中的邮箱统一小写
pub(super) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// ==========================================
// DeliveryLogRepository - 投递台账仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct DeliveryLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DeliveryLogRepository {
    /// 创建新的投递台账仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入 SENT 记录
    ///
    /// # 返回
    /// - `Ok(entry)`: 成功插入
    /// - `Err(UniqueConstraintViolation)`: 同一 (period, email) 已有 SENT
    pub fn insert_sent(
        &self,
        period: &str,
        email: &str,
        employee_name: Option<&str>,
        organization_name: Option<&str>,
    ) -> RepositoryResult<DeliveryLogEntry> {
        let entry = new_entry(
            period,
            email,
            employee_name,
            organization_name,
            DeliveryOutcome::Sent,
            None,
        );
        self.insert(&entry)?;
        Ok(entry)
    }

    /// 插入 FAILED 记录 (可重复)
    pub fn insert_failed(
        &self,
        period: &str,
        email: &str,
        employee_name: Option<&str>,
        organization_name: Option<&str>,
        error_message: &str,
    ) -> RepositoryResult<DeliveryLogEntry> {
        let entry = new_entry(
            period,
            email,
            employee_name,
            organization_name,
            DeliveryOutcome::Failed,
            Some(error_message),
        );
        self.insert(&entry)?;
        Ok(entry)
    }

    fn insert(&self, entry: &DeliveryLogEntry) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO delivery_log (
                entry_id, email, employee_name, organization_name,
                period, outcome, error_message, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                entry.entry_id,
                entry.email,
                entry.employee_name.as_deref().unwrap_or(""),
                entry.organization_name.as_deref().unwrap_or(""),
                entry.period,
                entry.outcome.as_str(),
                entry.error_message,
                entry.created_at.format(TS_FORMAT).to_string(),
            ],
        )?;

        debug!(
            period = %entry.period,
            email = %entry.email,
            outcome = entry.outcome.as_str(),
            "台账已追加"
        );
        Ok(())
    }
}

fn new_entry(
    period: &str,
    email: &str,
    employee_name: Option<&str>,
    organization_name: Option<&str>,
    outcome: DeliveryOutcome,
    error_message: Option<&str>,
) -> DeliveryLogEntry {
    DeliveryLogEntry {
        entry_id: Uuid::new_v4().to_string(),
        email: normalize_email(email),
        employee_name: employee_name.map(str::to_string),
        organization_name: organization_name.map(str::to_string),
        period: period.trim().to_string(),
        created_at: Local::now().naive_local(),
        outcome,
        error_message: error_message.map(str::to_string),
    }
}
