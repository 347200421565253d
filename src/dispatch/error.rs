// ==========================================
// 薪资单分发系统 - 分发模块错误类型
// ==========================================
// 说明:
// - TransportError / StoreError: 单个收件人级别, 在批次内部被吸收
// - DispatchError: 仅批次前置条件失败 (配置/输入/通道初始化)
// ==========================================

use crate::config::error::ConfigError;
use thiserror::Error;

/// 邮件发送错误
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("邮箱地址无效: {0}")]
    InvalidAddress(String),

    #[error("邮件构建失败: {0}")]
    MessageBuild(String),

    #[error("SMTP 发送失败: {0}")]
    Smtp(String),
}

/// 文档存储错误
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("文档不存在: {0}")]
    NotFound(String),

    #[error("文档读写失败: {0}")]
    Io(#[from] std::io::Error),
}

/// 批次级错误
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("配置错误: {0}")]
    Configuration(#[from] ConfigError),

    #[error("输入无效: {0}")]
    InvalidInput(String),

    #[error("邮件通道初始化失败: {0}")]
    Transport(#[from] TransportError),
}

pub type TransportResult<T> = Result<T, TransportError>;
pub type StoreResult<T> = Result<T, StoreError>;
pub type DispatchResult<T> = Result<T, DispatchError>;
