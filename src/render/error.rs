// ==========================================
// 薪资单分发系统 - 渲染层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("无效的数据行: {0}")]
    InvalidRow(String),

    #[error("PDF 写入失败: {0}")]
    PdfWriteError(String),

    #[error("没有可生成的数据行")]
    EmptyRows,
}

impl From<printpdf::Error> for RenderError {
    fn from(err: printpdf::Error) -> Self {
        RenderError::PdfWriteError(err.to_string())
    }
}

pub type RenderResult<T> = Result<T, RenderError>;
