// ==========================================
// 薪资单分发系统 - 基础类型定义
// ==========================================
// 职责: 单元格值、薪资类别、身份字段角色、投递结果
// 红线: 纯数据类型,不含 IO
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// CellValue - 单元格原始值
// ==========================================
// 对齐: 工作表 2D 网格中的标量值 (文本/数字/空)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// 空值判断（空白文本也视为空）
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// 转为去首尾空白的文本（空值返回空串）
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => format_number(*n),
        }
    }

    /// 文本形式（空值返回 None）
    pub fn as_non_empty_text(&self) -> Option<String> {
        if self.is_blank() {
            None
        } else {
            Some(self.as_text())
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::from(value.as_str())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

/// 整数值不带小数输出 (5000000.0 → "5000000")
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

// ==========================================
// PayrollCategory - 薪资类别
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayrollCategory {
    Earnings,           // 收入 (pendapatan / penerimaan)
    MandatoryDeduction, // 法定扣款 (potongan wajib)
    DebtDeduction,      // 欠款扣款 (potongan hutang)
    DisbursedAllowance, // 已发放津贴 (tunjangan yg dibayarkan)
}

impl PayrollCategory {
    pub const ALL: [PayrollCategory; 4] = [
        PayrollCategory::Earnings,
        PayrollCategory::MandatoryDeduction,
        PayrollCategory::DebtDeduction,
        PayrollCategory::DisbursedAllowance,
    ];

    /// 表头分组显示名
    pub fn group_label(&self) -> &'static str {
        match self {
            PayrollCategory::Earnings => "PENERIMAAN",
            PayrollCategory::MandatoryDeduction => "POTONGAN WAJIB",
            PayrollCategory::DebtDeduction => "POTONGAN HUTANG",
            PayrollCategory::DisbursedAllowance => "TUNJANGAN YG DIBAYARKAN",
        }
    }

    /// 是否属于扣款类
    pub fn is_deduction(&self) -> bool {
        matches!(
            self,
            PayrollCategory::MandatoryDeduction | PayrollCategory::DebtDeduction
        )
    }
}

// ==========================================
// IdentityRole - 身份字段角色
// ==========================================
// 优先级顺序即声明顺序 (先匹配先得)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityRole {
    EmployeeName, // nama / nama karyawan
    Email,        // email
    NationalId,   // nik
    Position,     // jabatan
    BankAccount,  // no rek / rekening
}

// ==========================================
// DeliveryOutcome - 投递结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryOutcome {
    Sent,
    Failed,
}

impl DeliveryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryOutcome::Sent => "SENT",
            DeliveryOutcome::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SENT" => Some(DeliveryOutcome::Sent),
            "FAILED" => Some(DeliveryOutcome::Failed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_blank() {
        assert!(CellValue::Empty.is_blank());
        assert!(CellValue::Text("   ".to_string()).is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
    }

    #[test]
    fn test_cell_value_integer_text() {
        assert_eq!(CellValue::Number(5000000.0).as_text(), "5000000");
        assert_eq!(CellValue::Number(1.5).as_text(), "1.5");
        assert_eq!(CellValue::from(" Budi ").as_text(), "Budi");
    }

    #[test]
    fn test_delivery_outcome_roundtrip_str() {
        assert_eq!(DeliveryOutcome::parse("SENT"), Some(DeliveryOutcome::Sent));
        assert_eq!(DeliveryOutcome::parse("x"), None);
        assert_eq!(DeliveryOutcome::Failed.as_str(), "FAILED");
    }
}
