// ==========================================
// 薪资单分发系统 - 投递领域模型
// ==========================================
// 职责: 投递台账条目、收件人、分发目标、分发汇总
// 红线: 台账只追加; (period, email) 成功记录唯一
// ==========================================

use crate::domain::types::DeliveryOutcome;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 台账查询默认/最大条数
pub const MAX_LOG_LIST_LIMIT: usize = 500;

// ==========================================
// DeliveryLogEntry - 投递台账条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryLogEntry {
    pub entry_id: String,
    pub email: String,
    pub employee_name: Option<String>,
    pub organization_name: Option<String>,
    pub period: String,
    pub created_at: NaiveDateTime,
    pub outcome: DeliveryOutcome,
    pub error_message: Option<String>,
}

// ==========================================
// DeliveryLogFilter - 台账查询条件
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryLogFilter {
    pub period: Option<String>,
    pub email: Option<String>,
    pub outcome: Option<DeliveryOutcome>,
}

impl DeliveryLogFilter {
    pub fn for_period(period: impl Into<String>) -> Self {
        Self {
            period: Some(period.into()),
            ..Default::default()
        }
    }

    pub fn with_outcome(mut self, outcome: DeliveryOutcome) -> Self {
        self.outcome = Some(outcome);
        self
    }
}

// ==========================================
// Recipient - 收件人
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// 文档键 (即存储文件名, 如 "123_Budi.pdf")
    pub document_key: String,
}

impl Recipient {
    pub fn new(
        email: impl Into<String>,
        display_name: Option<String>,
        document_key: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            display_name,
            document_key: document_key.into(),
        }
    }

    /// 称呼: 显式姓名 → 文件名第二段 → "Karyawan"
    pub fn salutation_name(&self) -> String {
        if let Some(name) = self
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
        {
            return name.to_string();
        }
        self.document_key
            .split('_')
            .nth(1)
            .map(|s| strip_pdf_suffix(s).to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Karyawan".to_string())
    }
}

fn strip_pdf_suffix(s: &str) -> &str {
    let cut = s.len().saturating_sub(4);
    match s.get(cut..) {
        Some(tail) if tail.eq_ignore_ascii_case(".pdf") => &s[..cut],
        _ => s,
    }
}

// ==========================================
// DispatchTarget - 分发目标
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchTarget {
    pub organization_name: String,
    #[serde(default)]
    pub organization_address: Option<String>,
    pub period: String,
    pub recipients: Vec<Recipient>,
}

// ==========================================
// DispatchSummary - 分发汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchSummary {
    pub sent: usize,
    pub skipped: usize,
    pub failed: Vec<FailedDelivery>,
    /// 文档目录 (相对存储根)
    #[serde(default)]
    pub dir: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedDelivery {
    pub email: String,
    pub error: String,
}

// ==========================================
// RecipientOutcome - 单个收件人的处理结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecipientOutcome {
    Sent { message_id: String },
    Skipped,
    Failed { error: String },
}

impl DispatchSummary {
    /// 按输入顺序累加单个收件人结果
    pub fn record(&mut self, email: &str, outcome: &RecipientOutcome) {
        match outcome {
            RecipientOutcome::Sent { .. } => self.sent += 1,
            RecipientOutcome::Skipped => self.skipped += 1,
            RecipientOutcome::Failed { error } => self.failed.push(FailedDelivery {
                email: email.to_string(),
                error: error.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salutation_prefers_display_name() {
        let r = Recipient::new("a@x.id", Some("Budi".into()), "1_Ani.pdf");
        assert_eq!(r.salutation_name(), "Budi");
    }

    #[test]
    fn test_salutation_from_filename() {
        let r = Recipient::new("a@x.id", None, "123_Ani_Lestari.PDF");
        assert_eq!(r.salutation_name(), "Ani");
        let r = Recipient::new("a@x.id", Some("  ".into()), "slip.pdf");
        assert_eq!(r.salutation_name(), "Karyawan");
    }

    #[test]
    fn test_salutation_from_non_ascii_filename() {
        // 无扩展名且末尾为多字节字符
        let r = Recipient::new("a@x.id", None, "1_名字");
        assert_eq!(r.salutation_name(), "名字");
        let r = Recipient::new("a@x.id", None, "1_Dédé.pdf");
        assert_eq!(r.salutation_name(), "Dédé");
        assert_eq!(strip_pdf_suffix("é"), "é");
    }

    #[test]
    fn test_summary_record() {
        let mut s = DispatchSummary::default();
        s.record("a@x.id", &RecipientOutcome::Sent { message_id: "1".into() });
        s.record("b@x.id", &RecipientOutcome::Skipped);
        s.record("c@x.id", &RecipientOutcome::Failed { error: "boom".into() });
        assert_eq!(s.sent, 1);
        assert_eq!(s.skipped, 1);
        assert_eq!(s.failed, vec![FailedDelivery { email: "c@x.id".into(), error: "boom".into() }]);
    }
}
