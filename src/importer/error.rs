// ==========================================
// 薪资单分发系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 本模块所有错误均属于 ParseError 族
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xlsm/.xls/.ods/.csv）")]
    UnsupportedFormat(String),

    #[error("工作簿读取失败: {0}")]
    WorkbookReadError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("工作簿无工作表")]
    EmptyWorkbook,

    // ===== 结构识别错误 =====
    #[error("未找到表头区域 (工作表: {sheet})")]
    HeaderNotFound { sheet: String },
}

impl ImportError {
    /// 是否为解析类错误 (当前全部为解析类)
    pub fn is_parse_error(&self) -> bool {
        true
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::WorkbookReadError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
