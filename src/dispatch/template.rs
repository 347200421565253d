// ==========================================
// 薪资单分发系统 - 邮件模板 (固定印尼语文本)
// ==========================================

/// 邮件主题
pub fn slip_subject(period: &str, name: &str) -> String {
    format!("Slip gaji bulan {} - {}", period, name)
}

/// 邮件正文 (纯文本)
pub fn slip_body(name: &str, period: &str, organization: Option<&str>) -> String {
    let signature = match organization.map(str::trim).filter(|o| !o.is_empty()) {
        Some(org) => format!("HRD {}", org),
        None => "HRD".to_string(),
    };
    format!(
        "Assalamualaikum warahmatullahi wabarakatuh, {}, berikut ini adalah slip gaji untuk bulan {}\n\nterimakasih ( {} )",
        name, period, signature
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject() {
        assert_eq!(slip_subject("Maret 2026", "Budi"), "Slip gaji bulan Maret 2026 - Budi");
    }

    #[test]
    fn test_body() {
        let body = slip_body("Budi", "Maret 2026", Some("RS Ananda"));
        assert!(body.starts_with("Assalamualaikum warahmatullahi wabarakatuh, Budi,"));
        assert!(body.contains("untuk bulan Maret 2026\n\n"));
        assert!(body.ends_with("( HRD RS Ananda )"));
        assert!(slip_body("Budi", "Maret", Some(" ")).ends_with("( HRD )"));
    }
}
