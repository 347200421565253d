// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、内存工作簿构造、假邮件通道
// ==========================================

#![allow(dead_code)]

use async_trait::async_trait;
use payslip_dispatch::app::AppState;
use payslip_dispatch::dispatch::{MailTransport, OutgoingMail, TransportError, TransportResult};
use rust_xlsxwriter::Workbook;
use std::error::Error;
use std::sync::Mutex;
use tempfile::{NamedTempFile, TempDir};

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是 UTF-8")?
        .to_string();

    payslip_dispatch::db::open_and_init(&db_path)?;

    Ok((temp_file, db_path))
}

/// 测试环境: 临时数据库 + 临时文档目录 + AppState
pub struct TestEnv {
    pub _db_file: NamedTempFile,
    pub documents: TempDir,
    pub state: AppState,
}

pub fn create_test_env() -> Result<TestEnv, Box<dyn Error>> {
    payslip_dispatch::logging::init_test();
    let (db_file, db_path) = create_test_db()?;
    let documents = TempDir::new()?;
    let state = AppState::new(db_path, documents.path().to_path_buf())?;
    Ok(TestEnv {
        _db_file: db_file,
        documents,
        state,
    })
}

// ==========================================
// 内存工作簿
// ==========================================

/// 工作簿单元格
#[derive(Debug, Clone, Copy)]
pub enum Cell {
    Text(&'static str),
    Num(f64),
    Blank,
}

pub use self::Cell::{Blank, Num, Text};

/// 构造单表 xlsx 文件内容
pub fn build_xlsx(sheet_name: &str, rows: &[Vec<Cell>]) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let (r, c) = (r as u32, c as u16);
            match cell {
                Cell::Text(s) => {
                    worksheet.write_string(r, c, *s)?;
                }
                Cell::Num(n) => {
                    worksheet.write_number(r, c, *n)?;
                }
                Cell::Blank => {}
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

// ==========================================
// 假邮件通道
// ==========================================

/// 记录发送内容的邮件通道; fail_for 中的地址发送失败
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<OutgoingMail>>,
    pub fail_for: Vec<String>,
}

impl RecordingTransport {
    pub fn failing_for(addresses: &[&str]) -> Self {
        Self {
            fail_for: addresses.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn sent_to(&self) -> Vec<String> {
        self.sent
            .lock()
            .map(|sent| sent.iter().map(|m| m.to.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, mail: &OutgoingMail) -> TransportResult<String> {
        if self.fail_for.contains(&mail.to) {
            return Err(TransportError::Smtp("550 mailbox unavailable".to_string()));
        }
        let mut sent = self
            .sent
            .lock()
            .map_err(|e| TransportError::Smtp(e.to_string()))?;
        sent.push(mail.clone());
        Ok(format!("<{}@test.local>", sent.len()))
    }

    fn sender(&self) -> &str {
        "HRD || SLIP GAJI <hrd@contoh.id>"
    }
}
