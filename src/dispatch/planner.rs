// ==========================================
// 薪资单分发系统 - 分发决策 (纯函数)
// ==========================================
// 流程: 解析附件 → 查询台账 → 决定动作
// 执行 (发送/记账) 由 coordinator 负责
// ==========================================

use crate::dispatch::document_store::{sanitize_filename, slip_filename};
use crate::domain::slip::FlatRow;
use crate::domain::types::IdentityRole;
use crate::render::slip_renderer::PayslipRenderer;

/// 附件缺失/生成失败时的统一原因
pub const ATTACHMENT_NOT_FOUND: &str = "attachment not found";

/// 附件解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentResolution {
    /// 存储中已存在
    Present,
    /// 缺失, 已由行数据生成并写入
    Generated,
    /// 缺失且无法生成
    Unavailable { reason: String },
}

impl DocumentResolution {
    pub fn is_available(&self) -> bool {
        !matches!(self, DocumentResolution::Unavailable { .. })
    }
}

/// 单个收件人的动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryAction {
    Skip,
    Send,
    Fail { error: String },
}

/// 决定动作: 附件不可用 → Fail; 已成功发送 → Skip; 否则 Send
pub fn decide(resolution: &DocumentResolution, already_sent: bool) -> DeliveryAction {
    match resolution {
        DocumentResolution::Unavailable { .. } => DeliveryAction::Fail {
            error: ATTACHMENT_NOT_FOUND.to_string(),
        },
        _ if already_sent => DeliveryAction::Skip,
        _ => DeliveryAction::Send,
    }
}

/// 行对应的文件名
pub fn row_filename(renderer: &PayslipRenderer, row: &FlatRow) -> String {
    let content = renderer.content(row);
    slip_filename(
        content.identity.get(&IdentityRole::NationalId).map(String::as_str),
        content.identity.get(&IdentityRole::EmployeeName).map(String::as_str),
    )
}

/// 按文档键查找可用于生成附件的行
pub fn find_row_for_document<'a>(
    renderer: &PayslipRenderer,
    rows: &'a [FlatRow],
    document_key: &str,
) -> Option<&'a FlatRow> {
    let key = sanitize_filename(document_key);
    rows.iter().find(|row| row_filename(renderer, row) == key)
}
