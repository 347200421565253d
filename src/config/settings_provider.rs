// ==========================================
// 薪资单分发系统 - 设置提供者
// ==========================================
// 职责: 读取 / 写入应用设置, 带显式缓存
// 缓存: TTL 可注入 (Duration::ZERO = 不缓存); 写入后立即刷新被写的键
// 红线: 无进程级全局状态, 由调用方持有并传递
// ==========================================

use crate::config::error::ConfigResult;
use crate::repository::error::RepositoryResult;
use crate::repository::settings_repo::SettingsRepository;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

/// 默认缓存时长
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

// ==========================================
// 设置键
// ==========================================
pub mod setting_keys {
    pub const SMTP_SERVICE: &str = "SMTP_SERVICE";
    pub const SMTP_HOST: &str = "SMTP_HOST";
    pub const SMTP_PORT: &str = "SMTP_PORT";
    pub const SMTP_SECURE: &str = "SMTP_SECURE";
    pub const SMTP_USER: &str = "SMTP_USER";
    pub const SMTP_PASS: &str = "SMTP_PASS";
    pub const SMTP_FROM: &str = "SMTP_FROM";

    pub const ALL: [&str; 7] = [
        SMTP_SERVICE,
        SMTP_HOST,
        SMTP_PORT,
        SMTP_SECURE,
        SMTP_USER,
        SMTP_PASS,
        SMTP_FROM,
    ];

    /// 敏感键 (列表展示时打码)
    pub fn is_secret(key: &str) -> bool {
        key == SMTP_PASS
    }
}

// ==========================================
// SettingsStore Trait - 设置存储
// ==========================================
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> RepositoryResult<Option<String>>;
    fn set_many(&self, entries: &BTreeMap<String, String>) -> RepositoryResult<usize>;
    fn list(&self) -> RepositoryResult<BTreeMap<String, String>>;
}

impl SettingsStore for SettingsRepository {
    fn get(&self, key: &str) -> RepositoryResult<Option<String>> {
        SettingsRepository::get(self, key)
    }

    fn set_many(&self, entries: &BTreeMap<String, String>) -> RepositoryResult<usize> {
        SettingsRepository::set_many(self, entries)
    }

    fn list(&self) -> RepositoryResult<BTreeMap<String, String>> {
        SettingsRepository::list(self)
    }
}

// ==========================================
// SettingsCache - 带 TTL 的键值缓存
// ==========================================
pub struct SettingsCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Option<String>, Instant)>>,
}

impl SettingsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// 命中返回 Some(值), 未命中或过期返回 None
    pub fn get(&self, key: &str) -> Option<Option<String>> {
        if self.ttl.is_zero() {
            return None;
        }
        let entries = self.entries.lock().ok()?;
        entries
            .get(key)
            .filter(|(_, at)| at.elapsed() < self.ttl)
            .map(|(value, _)| value.clone())
    }

    pub fn put(&self, key: &str, value: Option<String>) {
        if self.ttl.is_zero() {
            return;
        }
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), (value, Instant::now()));
        }
    }

    pub fn invalidate(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

// ==========================================
// SettingsProvider
// ==========================================
pub struct SettingsProvider {
    store: Arc<dyn SettingsStore>,
    cache: SettingsCache,
}

impl SettingsProvider {
    pub fn new(store: Arc<dyn SettingsStore>, ttl: Duration) -> Self {
        Self {
            store,
            cache: SettingsCache::new(ttl),
        }
    }

    /// 读取设置 (缓存优先)
    pub fn get(&self, key: &str) -> ConfigResult<Option<String>> {
        if let Some(hit) = self.cache.get(key) {
            return Ok(hit);
        }
        let value = self
            .store
            .get(key)?
            .filter(|v| !v.trim().is_empty());
        self.cache.put(key, value.clone());
        Ok(value)
    }

    /// 批量写入 (空值忽略), 写入后刷新对应缓存
    pub fn set_many(&self, entries: &BTreeMap<String, String>) -> ConfigResult<usize> {
        let written = self.store.set_many(entries)?;
        for key in entries.keys() {
            self.cache.invalidate(key);
        }
        debug!(written, "设置已写入");
        Ok(written)
    }

    pub fn list(&self) -> ConfigResult<BTreeMap<String, String>> {
        Ok(self.store.list()?)
    }

    pub fn invalidate_all(&self) {
        self.cache.clear();
    }
}
