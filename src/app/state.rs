// ==========================================
// 薪资单分发系统 - 应用状态
// ==========================================
// 职责: 由数据库路径与文档目录装配仓储、设置与 API 实例
// ==========================================

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::api::SlipApi;
use crate::config::settings_provider::{SettingsProvider, DEFAULT_CACHE_TTL};
use crate::dispatch::document_store::FsDocumentStore;
use crate::repository::{DeliveryLogRepository, SettingsRepository};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "PAYSLIP_DISPATCH_DB_PATH";
/// 文档目录环境变量
pub const DOCUMENTS_DIR_ENV: &str = "PAYSLIP_DISPATCH_DOCUMENTS_DIR";

const APP_DIR_NAME: &str = "payslip-dispatch";
const DB_FILE_NAME: &str = "payslip_dispatch.db";

/// 应用状态
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 文档根目录
    pub documents_dir: PathBuf,

    /// 工资单 API
    pub slip_api: Arc<SlipApi>,

    /// 投递台账仓储
    pub delivery_log_repo: Arc<DeliveryLogRepository>,

    /// 设置提供者
    pub settings: Arc<SettingsProvider>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - documents_dir: 生成文档的根目录
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String, documents_dir: PathBuf) -> Result<Self, String> {
        tracing::info!(db_path = %db_path, documents_dir = %documents_dir.display(), "初始化AppState");

        let conn = crate::db::open_and_init(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let delivery_log_repo = Arc::new(DeliveryLogRepository::new(conn.clone()));
        let settings_repo = Arc::new(SettingsRepository::new(conn));
        let settings = Arc::new(SettingsProvider::new(settings_repo, DEFAULT_CACHE_TTL));
        let store = Arc::new(FsDocumentStore::new(documents_dir.clone()));

        let slip_api = Arc::new(SlipApi::new(
            delivery_log_repo.clone(),
            settings.clone(),
            store,
        ));

        Ok(Self {
            db_path,
            documents_dir,
            slip_api,
            delivery_log_repo,
            settings,
        })
    }
}

fn default_app_dir() -> PathBuf {
    match dirs::data_dir() {
        Some(data_dir) => {
            let dir = data_dir.join(APP_DIR_NAME);
            std::fs::create_dir_all(&dir).ok();
            dir
        }
        None => PathBuf::from("."),
    }
}

fn env_path(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 PAYSLIP_DISPATCH_DB_PATH (若设置)
/// - 否则: 用户数据目录/payslip-dispatch/payslip_dispatch.db
pub fn get_default_db_path() -> String {
    if let Some(path) = env_path(DB_PATH_ENV) {
        return path;
    }
    default_app_dir()
        .join(DB_FILE_NAME)
        .to_string_lossy()
        .to_string()
}

/// 获取默认文档目录 (用户数据目录/payslip-dispatch/public)
pub fn get_default_documents_dir() -> PathBuf {
    if let Some(path) = env_path(DOCUMENTS_DIR_ENV) {
        return PathBuf::from(path);
    }
    default_app_dir().join("public")
}

/// 读取 logo 文件 (不存在或读取失败时返回 None)
pub fn load_logo(path: Option<&Path>) -> Option<Vec<u8>> {
    let path = path?;
    match std::fs::read(path) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "logo 读取失败, 忽略");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_app_state_new() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("slip.db").to_string_lossy().to_string();
        let state = AppState::new(db_path, tmp.path().join("public")).unwrap();
        assert!(state.settings.list().unwrap().is_empty());
    }

    #[test]
    fn test_load_logo_missing_file() {
        let tmp = TempDir::new().unwrap();
        assert!(load_logo(Some(&tmp.path().join("logo.png"))).is_none());
        assert!(load_logo(None).is_none());
    }
}
