// ==========================================
// 薪资单分发系统 - 表头分类器
// ==========================================
// 职责: 原始表头文本 → 身份字段角色 / 薪资类别 / 合计标记
// 红线: 纯函数,无副作用,大小写不敏感
// ==========================================

use crate::domain::types::{IdentityRole, PayrollCategory};
use regex::{Regex, RegexBuilder};
use std::sync::OnceLock;

// ==========================================
// HeaderKeywords - 关键字表
// ==========================================
// 用途: 分类器与表头定位器共用; 可替换关键字而不改动搜索算法
pub struct HeaderKeywords {
    /// 身份关键字 (按优先级排列, 先匹配先得)
    identity: Vec<(IdentityRole, Regex)>,
    earnings: Regex,
    deduction: Regex,
    mandatory: Regex,
    debt: Regex,
    allowance: Regex,
    disbursed: Regex,
    total_prefix: Regex,
    net_pay: Regex,
    /// 强关键字: 表头行首轮扫描使用
    strong: Vec<Regex>,
    /// 明细名称前缀 (类别短语 + 分隔符)
    category_prefixes: Vec<Regex>,
}

fn ci(pattern: &str) -> Regex {
    // 关键字表为编译期常量,构建失败只可能是编码错误
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|e| panic!("invalid header keyword pattern {pattern:?}: {e}"))
}

/// 整词匹配; 下划线与标点视作分隔符 (NAMA_KARYAWAN, NIK_KTP)
fn word(w: &str) -> Regex {
    ci(&format!(r"(?:^|[^a-z0-9]){w}(?:[^a-z0-9]|$)"))
}

impl HeaderKeywords {
    /// 标准关键字表 (印尼语薪资表)
    pub fn standard() -> &'static HeaderKeywords {
        static KEYWORDS: OnceLock<HeaderKeywords> = OnceLock::new();
        KEYWORDS.get_or_init(|| HeaderKeywords {
            identity: vec![
                (IdentityRole::EmployeeName, word(r"nama")),
                (IdentityRole::Email, ci(r"e-?mail")),
                (IdentityRole::NationalId, word(r"nik")),
                (IdentityRole::Position, word(r"jabatan")),
                (IdentityRole::BankAccount, ci(r"no\.?\s*rek|rekening|norek")),
            ],
            earnings: ci(r"pendapatan|penerimaan"),
            deduction: ci(r"potongan"),
            mandatory: ci(r"wajib"),
            debt: ci(r"hutang"),
            allowance: ci(r"tunjangan"),
            disbursed: ci(r"dibayarkan"),
            total_prefix: ci(r"^\s*(jml|jumlah|total)(?:[^a-z0-9]|$)"),
            net_pay: ci(r"gaji\s*bersih|take\s*home\s*pay"),
            strong: vec![
                word(r"nik"),
                word(r"nama"),
                word(r"jabatan"),
                ci(r"pendapatan|penerimaan"),
                ci(r"potongan"),
                ci(r"rekening|no\.?\s*rek|norek"),
                ci(r"e-?mail"),
                ci(r"tunjangan.*dibayarkan"),
            ],
            category_prefixes: vec![
                ci(r"^\s*(penerimaan|pendapatan)\s*[-:]?\s*"),
                ci(r"^\s*potongan\s*wajib\s*[-:]?\s*"),
                ci(r"^\s*potongan\s*hutang\s*[-:]?\s*"),
                ci(r"^\s*tunjangan.*?dibayarkan\s*[-:]?\s*"),
            ],
        })
    }

    /// 身份字段识别 (固定优先级, 先匹配先得)
    pub fn classify_identity(&self, label: &str) -> Option<IdentityRole> {
        let h = collapse_whitespace(label);
        if h.is_empty() {
            return None;
        }
        self.identity
            .iter()
            .find(|(_, re)| re.is_match(&h))
            .map(|(role, _)| *role)
    }

    /// 薪资类别识别
    pub fn classify_category(&self, label: &str) -> Option<PayrollCategory> {
        let h = collapse_whitespace(label);
        if h.is_empty() {
            return None;
        }
        if self.earnings.is_match(&h) {
            return Some(PayrollCategory::Earnings);
        }
        if self.deduction.is_match(&h) && self.mandatory.is_match(&h) {
            return Some(PayrollCategory::MandatoryDeduction);
        }
        if self.deduction.is_match(&h) && self.debt.is_match(&h) {
            return Some(PayrollCategory::DebtDeduction);
        }
        if self.allowance.is_match(&h) && self.disbursed.is_match(&h) {
            return Some(PayrollCategory::DisbursedAllowance);
        }
        None
    }

    /// 合计列标记 (jml / jumlah / total 前缀)
    pub fn is_total_marker(&self, label: &str) -> bool {
        self.total_prefix.is_match(label)
    }

    /// 扣款类表头 (含 potongan 且非津贴)
    pub fn is_deduction_label(&self, label: &str) -> bool {
        self.deduction.is_match(label) && !self.allowance.is_match(label)
    }

    /// 实发工资列
    pub fn is_net_pay_label(&self, label: &str) -> bool {
        self.net_pay.is_match(label)
    }

    /// 单元格是否命中强关键字
    pub fn matches_strong_keyword(&self, cell: &str) -> bool {
        !cell.trim().is_empty() && self.strong.iter().any(|re| re.is_match(cell))
    }

    /// 去掉前导类别短语, 得到明细名称
    pub fn clean_item_label(&self, label: &str) -> String {
        let mut out = label.trim().to_string();
        for re in &self.category_prefixes {
            out = re.replace(&out, "").into_owned();
        }
        out.trim().to_string()
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ==========================================
// 便捷函数 (使用标准关键字表)
// ==========================================

pub fn classify_identity(label: &str) -> Option<IdentityRole> {
    HeaderKeywords::standard().classify_identity(label)
}

pub fn classify_category(label: &str) -> Option<PayrollCategory> {
    HeaderKeywords::standard().classify_category(label)
}

pub fn is_total_marker(label: &str) -> bool {
    HeaderKeywords::standard().is_total_marker(label)
}

pub fn clean_item_label(label: &str) -> String {
    HeaderKeywords::standard().clean_item_label(label)
}
