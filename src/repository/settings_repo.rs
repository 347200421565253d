// ==========================================
// 薪资单分发系统 - 应用设置仓储
// ==========================================
// 表: app_setting (key PRIMARY KEY, value, updated_at)
// 红线: 空值不写入 (保留原值)
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

pub struct SettingsRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SettingsRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取单个设置
    pub fn get(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM app_setting WHERE key = ?",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 批量 upsert (事务内), 返回实际写入条数
    pub fn set_many(&self, entries: &BTreeMap<String, String>) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (key, value) in entries {
            if key.trim().is_empty() || value.trim().is_empty() {
                continue;
            }
            tx.execute(
                r#"
                INSERT INTO app_setting (key, value, updated_at)
                VALUES (?1, ?2, datetime('now'))
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                "#,
                params![key.trim(), value.trim()],
            )?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    /// 全部设置 (按 key 排序)
    pub fn list(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT key, value FROM app_setting ORDER BY key")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> SettingsRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        SettingsRepository::new(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_set_and_get() {
        let repo = setup();
        let mut entries = BTreeMap::new();
        entries.insert("SMTP_HOST".to_string(), "mail.contoh.id".to_string());
        entries.insert("SMTP_PORT".to_string(), " 587 ".to_string());
        assert_eq!(repo.set_many(&entries).unwrap(), 2);

        assert_eq!(repo.get("SMTP_HOST").unwrap().as_deref(), Some("mail.contoh.id"));
        assert_eq!(repo.get("SMTP_PORT").unwrap().as_deref(), Some("587"));
        assert_eq!(repo.get("SMTP_USER").unwrap(), None);
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let repo = setup();
        let mut entries = BTreeMap::new();
        entries.insert("SMTP_PASS".to_string(), "rahasia".to_string());
        repo.set_many(&entries).unwrap();

        entries.insert("SMTP_PASS".to_string(), "  ".to_string());
        assert_eq!(repo.set_many(&entries).unwrap(), 0);
        assert_eq!(repo.get("SMTP_PASS").unwrap().as_deref(), Some("rahasia"));
    }

    #[test]
    fn test_upsert_and_list_sorted() {
        let repo = setup();
        let mut entries = BTreeMap::new();
        entries.insert("SMTP_USER".to_string(), "a@x.id".to_string());
        entries.insert("SMTP_HOST".to_string(), "h1".to_string());
        repo.set_many(&entries).unwrap();
        entries.insert("SMTP_HOST".to_string(), "h2".to_string());
        repo.set_many(&entries).unwrap();

        let all = repo.list().unwrap();
        assert_eq!(all.keys().collect::<Vec<_>>(), vec!["SMTP_HOST", "SMTP_USER"]);
        assert_eq!(all["SMTP_HOST"], "h2");
    }
}
