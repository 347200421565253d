// ==========================================
// 薪资单分发系统 - SMTP 配置解析
// ==========================================
// 每个字段的解析顺序: 显式覆写 → 已存储设置 → 同名环境变量 → 内置默认
// 默认: host=smtp.gmail.com, port=465,
//       secure = (port == 465) || SMTP_SECURE == "true",
//       from = "HRD || SLIP GAJI <{user}>"
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::settings_provider::{setting_keys as keys, SettingsProvider};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 465;

/// 显式覆写 (如 SMTP 测试时临时填写的参数)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SmtpOverrides {
    pub service: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub secure: Option<String>,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub from: Option<String>,
}

impl SmtpOverrides {
    fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            keys::SMTP_SERVICE => &self.service,
            keys::SMTP_HOST => &self.host,
            keys::SMTP_PORT => &self.port,
            keys::SMTP_SECURE => &self.secure,
            keys::SMTP_USER => &self.user,
            keys::SMTP_PASS => &self.pass,
            keys::SMTP_FROM => &self.from,
            _ => return None,
        };
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }
}

/// 解析后的 SMTP 配置
#[derive(Clone, PartialEq, Serialize)]
pub struct SmtpSettings {
    /// 小写; "gmail" 时使用 Gmail 预设
    pub service: String,
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub user: Option<String>,
    #[serde(skip_serializing)]
    pub pass: Option<String>,
    pub from: Option<String>,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("service", &self.service)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("user", &self.user)
            .field("pass", &self.pass.as_ref().map(|_| "***"))
            .field("from", &self.from)
            .finish()
    }
}

impl SmtpSettings {
    /// 解析配置
    ///
    /// # 参数
    /// - provider: 已存储设置
    /// - overrides: 显式覆写
    /// - env: 环境变量读取函数 (测试时可注入)
    pub fn resolve(
        provider: &SettingsProvider,
        overrides: &SmtpOverrides,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> ConfigResult<Self> {
        let lookup = |key: &str| -> ConfigResult<Option<String>> {
            if let Some(v) = overrides.get(key) {
                return Ok(Some(v.to_string()));
            }
            if let Some(v) = provider.get(key)? {
                return Ok(Some(v));
            }
            Ok(env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()))
        };

        let service = lookup(keys::SMTP_SERVICE)?.unwrap_or_default().to_lowercase();
        let host = lookup(keys::SMTP_HOST)?.unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string());
        let port_raw = lookup(keys::SMTP_PORT)?;
        let port = match port_raw.as_deref() {
            None => DEFAULT_SMTP_PORT,
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                key: keys::SMTP_PORT.to_string(),
                value: raw.to_string(),
            })?,
        };
        let secure_flag = lookup(keys::SMTP_SECURE)?
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let user = lookup(keys::SMTP_USER)?;
        let pass = lookup(keys::SMTP_PASS)?;
        let from = lookup(keys::SMTP_FROM)?
            .or_else(|| user.as_ref().map(|u| format!("HRD || SLIP GAJI <{}>", u)));

        Ok(Self {
            service,
            host,
            port,
            secure: port == DEFAULT_SMTP_PORT || secure_flag,
            user,
            pass,
            from,
        })
    }

    /// 以进程环境变量作为回退
    pub fn resolve_from_env(
        provider: &SettingsProvider,
        overrides: &SmtpOverrides,
    ) -> ConfigResult<Self> {
        Self::resolve(provider, overrides, &|key| std::env::var(key).ok())
    }

    /// 发送前检查凭据
    pub fn require_credentials(&self) -> ConfigResult<(&str, &str)> {
        let user = self.user.as_deref().filter(|u| !u.is_empty());
        let pass = self.pass.as_deref().filter(|p| !p.is_empty());
        match (user, pass) {
            (Some(u), Some(p)) => Ok((u, p)),
            (None, None) => Err(ConfigError::MissingCredentials {
                missing: format!("{}, {}", keys::SMTP_USER, keys::SMTP_PASS),
            }),
            (None, _) => Err(ConfigError::MissingCredentials {
                missing: keys::SMTP_USER.to_string(),
            }),
            (_, None) => Err(ConfigError::MissingCredentials {
                missing: keys::SMTP_PASS.to_string(),
            }),
        }
    }

    pub fn is_gmail(&self) -> bool {
        self.service == "gmail"
    }
}
