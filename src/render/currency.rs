// ==========================================
// 薪资单分发系统 - 货币格式化
// ==========================================
// 格式: Rp + 千分位 '.' + 0 位小数, 负数前置 '-'
// 例: 1000000 → "Rp1.000.000", -2500 → "-Rp2.500"
// ==========================================

/// 货币符号
pub const CURRENCY_SYMBOL: &str = "Rp";

/// 格式化为印尼盾金额
pub fn format_rupiah(amount: f64) -> String {
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{}{}{}", sign, CURRENCY_SYMBOL, group_thousands(rounded.abs() as u64))
}

/// 千分位分组 ('.' 分隔)
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}
