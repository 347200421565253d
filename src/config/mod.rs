// ==========================================
// 薪资单分发系统 - 配置层
// ==========================================
// 职责: 应用设置读取 / 写入, SMTP 配置解析
// 存储: app_setting 表
// ==========================================

pub mod error;
pub mod settings_provider;
pub mod smtp_config;

pub use error::{ConfigError, ConfigResult};
pub use settings_provider::{
    setting_keys, SettingsCache, SettingsProvider, SettingsStore, DEFAULT_CACHE_TTL,
};
pub use smtp_config::{SmtpOverrides, SmtpSettings};
