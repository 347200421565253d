// ==========================================
// 薪资单分发系统 - API 层错误类型
// ==========================================
// 职责: 汇总各层错误, 提供本地化的用户提示 (user_message)
// ==========================================

use crate::config::error::ConfigError;
use crate::dispatch::error::{DispatchError, StoreError, TransportError};
use crate::i18n::{t, t_with_args};
use crate::importer::error::ImportError;
use crate::render::error::RenderError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("无效输入: {0}")]
    InvalidInput(String),

    // ===== 各层错误 =====
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ApiError {
    /// 面向最终用户的提示 (当前语言)
    pub fn user_message(&self) -> String {
        match self {
            ApiError::InvalidInput(detail) => {
                t_with_args("common.invalid_input", &[("detail", detail.as_str())])
            }
            ApiError::Import(e) => import_message(e),
            ApiError::Render(RenderError::EmptyRows) => t("render.empty_rows"),
            ApiError::Render(e) => t_with_args("render.failed", &[("detail", e.to_string().as_str())]),
            ApiError::Config(e) | ApiError::Dispatch(DispatchError::Configuration(e)) => {
                config_message(e)
            }
            ApiError::Dispatch(DispatchError::InvalidInput(_)) => t("dispatch.empty_recipients"),
            ApiError::Dispatch(DispatchError::Transport(e)) | ApiError::Transport(e) => {
                t_with_args("dispatch.transport_failed", &[("detail", e.to_string().as_str())])
            }
            other => t_with_args("common.internal_error", &[("detail", other.to_string().as_str())]),
        }
    }

    /// 是否为调用方输入问题 (非系统故障)
    pub fn is_client_error(&self) -> bool {
        match self {
            ApiError::Import(e) => e.is_parse_error(),
            other => matches!(
                other,
                ApiError::InvalidInput(_)
                    | ApiError::Render(RenderError::EmptyRows)
                    | ApiError::Config(_)
                    | ApiError::Dispatch(DispatchError::InvalidInput(_))
                    | ApiError::Dispatch(DispatchError::Configuration(_))
            ),
        }
    }
}

fn import_message(err: &ImportError) -> String {
    match err {
        ImportError::UnsupportedFormat(ext) => {
            t_with_args("import.unsupported_format", &[("ext", ext.as_str())])
        }
        ImportError::EmptyWorkbook => t("import.empty_workbook"),
        ImportError::HeaderNotFound { sheet } => {
            t_with_args("import.header_not_found", &[("sheet", sheet.as_str())])
        }
        ImportError::WorkbookReadError(_) | ImportError::CsvParseError(_) => t("import.unreadable"),
    }
}

fn config_message(err: &ConfigError) -> String {
    match err {
        ConfigError::MissingCredentials { .. } => t("dispatch.missing_credentials"),
        ConfigError::InvalidValue { key, value } => {
            t_with_args("settings.invalid_value", &[("key", key.as_str()), ("value", value.as_str())])
        }
        ConfigError::Repository(e) => {
            t_with_args("common.internal_error", &[("detail", e.to_string().as_str())])
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::tests::LOCALE_TEST_LOCK;
    use crate::i18n::set_locale;

    #[test]
    fn test_header_not_found_message() {
        let _lock = LOCALE_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        set_locale("id");
        let err = ApiError::Import(ImportError::HeaderNotFound {
            sheet: "Sheet1".to_string(),
        });
        assert!(err.user_message().contains("Sheet1"));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_missing_credentials_message() {
        let _lock = LOCALE_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        set_locale("en");
        let err = ApiError::Dispatch(DispatchError::Configuration(
            ConfigError::MissingCredentials {
                missing: "SMTP_PASS".to_string(),
            },
        ));
        assert!(err.user_message().contains("SMTP_USER"));
        set_locale("id");
    }

    #[test]
    fn test_internal_error_is_not_client_error() {
        let err = ApiError::InternalError("boom".to_string());
        assert!(!err.is_client_error());
    }
}
