// ==========================================
// 薪资单分发系统 - 配置层错误类型
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// 缺少 SMTP 凭据 (批量发送前快速失败)
    #[error("缺少 SMTP 凭据: {missing}")]
    MissingCredentials { missing: String },

    #[error("配置值无效 ({key}): {value}")]
    InvalidValue { key: String, value: String },

    #[error("配置存储错误: {0}")]
    Repository(#[from] RepositoryError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
