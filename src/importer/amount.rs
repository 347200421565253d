// ==========================================
// 薪资单分发系统 - 金额解析
// ==========================================
// 规则:
// - 只保留 [0-9.,-]
// - 最后一个分隔符为 ',' 且其后仅 1~2 位数字 → 小数逗号
// - 其余情况 '.' 与 ',' 均视为千分位, 直接去除
// - 无法解析 → 0
// ==========================================

use crate::domain::types::CellValue;

/// 解析单元格金额 (数字原样返回)
pub fn parse_amount(value: &CellValue) -> f64 {
    match value {
        CellValue::Number(n) => *n,
        CellValue::Text(s) => parse_amount_str(s),
        CellValue::Empty => 0.0,
    }
}

/// 解析带分隔符的金额文本
pub fn parse_amount_str(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();
    if cleaned.is_empty() {
        return 0.0;
    }

    let normalized = match cleaned.rfind(['.', ',']) {
        Some(idx) if is_decimal_comma(&cleaned, idx) => {
            let (int_part, frac_part) = cleaned.split_at(idx);
            format!("{}.{}", int_part.replace(['.', ','], ""), &frac_part[1..])
        }
        _ => cleaned.replace(['.', ','], ""),
    };

    normalized.parse::<f64>().unwrap_or(0.0)
}

fn is_decimal_comma(s: &str, idx: usize) -> bool {
    let tail = &s[idx + 1..];
    s[idx..].starts_with(',')
        && (1..=2).contains(&tail.len())
        && tail.chars().all(|c| c.is_ascii_digit())
}

/// 是否为纯数字样式文本 (用于表头探测)
pub fn looks_numeric(value: &CellValue) -> bool {
    match value {
        CellValue::Number(_) => true,
        CellValue::Empty => false,
        CellValue::Text(s) => {
            let t = s.trim();
            !t.is_empty()
                && t.chars().any(|c| c.is_ascii_digit())
                && t.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        }
    }
}
