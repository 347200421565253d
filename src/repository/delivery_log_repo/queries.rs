use super::core::{normalize_email, DeliveryLogRepository, TS_FORMAT};
use crate::domain::delivery::{DeliveryLogEntry, DeliveryLogFilter, MAX_LOG_LIST_LIMIT};
use crate::domain::types::DeliveryOutcome;
use crate::repository::error::RepositoryResult;
use chrono::NaiveDateTime;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, OptionalExtension, Result as SqliteResult, Row};

impl DeliveryLogRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 是否已有 SENT 记录
    pub fn exists_sent(&self, period: &str, email: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                r#"
                SELECT 1 FROM delivery_log
                WHERE period = ? AND email = ? AND outcome = 'SENT'
                LIMIT 1
                "#,
                params![period.trim(), normalize_email(email)],
                |_row| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// 条件查询 (按 created_at 倒序)
    ///
    /// # 参数
    /// - filter: period / email / outcome, 均可为空
    /// - limit: 0 或超过上限时取 500
    pub fn find(
        &self,
        filter: &DeliveryLogFilter,
        limit: usize,
    ) -> RepositoryResult<Vec<DeliveryLogEntry>> {
        let conn = self.get_conn()?;

        let mut sql = String::from(
            r#"
            SELECT entry_id, email, employee_name, organization_name,
                   period, outcome, error_message, created_at
            FROM delivery_log
            WHERE 1 = 1
            "#,
        );
        let mut args: Vec<Value> = Vec::new();

        if let Some(period) = filter.period.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            sql.push_str(" AND period = ?");
            args.push(Value::from(period.to_string()));
        }
        if let Some(email) = filter.email.as_deref().filter(|e| !e.trim().is_empty()) {
            sql.push_str(" AND email = ?");
            args.push(Value::from(normalize_email(email)));
        }
        if let Some(outcome) = filter.outcome {
            sql.push_str(" AND outcome = ?");
            args.push(Value::from(outcome.as_str().to_string()));
        }

        sql.push_str(" ORDER BY created_at DESC, rowid DESC LIMIT ?");
        args.push(Value::from(clamp_limit(limit) as i64));

        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params_from_iter(args.iter()), |row| self.map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(entries)
    }

    /// 统计指定期间各结果数量 (sent, failed)
    pub fn count_by_period(&self, period: &str) -> RepositoryResult<(usize, usize)> {
        let conn = self.get_conn()?;
        let (sent, failed): (i64, i64) = conn.query_row(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN outcome = 'SENT' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN outcome = 'FAILED' THEN 1 ELSE 0 END), 0)
            FROM delivery_log
            WHERE period = ?
            "#,
            params![period.trim()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok((sent as usize, failed as usize))
    }

    fn map_row(&self, row: &Row) -> SqliteResult<DeliveryLogEntry> {
        let outcome_raw: String = row.get(5)?;
        let outcome = DeliveryOutcome::parse(&outcome_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                Type::Text,
                format!("unknown outcome {outcome_raw}").into(),
            )
        })?;
        let ts_raw: String = row.get(7)?;
        let created_at = NaiveDateTime::parse_from_str(&ts_raw, TS_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;

        Ok(DeliveryLogEntry {
            entry_id: row.get(0)?,
            email: row.get(1)?,
            employee_name: non_empty(row.get(2)?),
            organization_name: non_empty(row.get(3)?),
            period: row.get(4)?,
            created_at,
            outcome,
            error_message: row.get(6)?,
        })
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

pub(super) fn clamp_limit(limit: usize) -> usize {
    if limit == 0 {
        MAX_LOG_LIST_LIMIT
    } else {
        limit.min(MAX_LOG_LIST_LIMIT)
    }
}
