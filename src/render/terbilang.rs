// ==========================================
// 薪资单分发系统 - 金额大写 (印尼语 terbilang)
// ==========================================
// 规则:
// - 11 → "sebelas" (不是 "satu belas")
// - 100~199 → "seratus ...", 1000~1999 → "seribu ..."
// - 分组: ribu / juta / milyar / triliun
// ==========================================

const UNITS: [&str; 12] = [
    "", "satu", "dua", "tiga", "empat", "lima", "enam", "tujuh", "delapan", "sembilan",
    "sepuluh", "sebelas",
];

/// 数字转印尼语文字 (0 → "nol")
pub fn to_words(value: i64) -> String {
    match value {
        0 => "nol".to_string(),
        v if v < 0 => format!("minus {}", spell(v.unsigned_abs())),
        v => spell(v as u64),
    }
}

/// 金额 (四舍五入到整数) 的大写文字, 附 "rupiah"
pub fn amount_in_words(amount: f64) -> String {
    format!("{} rupiah", to_words(amount.round() as i64))
}

fn spell(n: u64) -> String {
    match n {
        0..=11 => UNITS[n as usize].to_string(),
        12..=19 => format!("{} belas", UNITS[(n - 10) as usize]),
        20..=99 => join(format!("{} puluh", UNITS[(n / 10) as usize]), n % 10),
        100..=199 => join("seratus".to_string(), n - 100),
        200..=999 => join(format!("{} ratus", UNITS[(n / 100) as usize]), n % 100),
        1_000..=1_999 => join("seribu".to_string(), n - 1_000),
        2_000..=999_999 => join(format!("{} ribu", spell(n / 1_000)), n % 1_000),
        1_000_000..=999_999_999 => join(format!("{} juta", spell(n / 1_000_000)), n % 1_000_000),
        1_000_000_000..=999_999_999_999 => join(
            format!("{} milyar", spell(n / 1_000_000_000)),
            n % 1_000_000_000,
        ),
        _ => join(
            format!("{} triliun", spell(n / 1_000_000_000_000)),
            n % 1_000_000_000_000,
        ),
    }
}

fn join(head: String, rest: u64) -> String {
    if rest == 0 {
        head
    } else {
        format!("{} {}", head, spell(rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_numbers() {
        assert_eq!(to_words(0), "nol");
        assert_eq!(to_words(1), "satu");
        assert_eq!(to_words(10), "sepuluh");
        assert_eq!(to_words(11), "sebelas");
        assert_eq!(to_words(12), "dua belas");
        assert_eq!(to_words(19), "sembilan belas");
        assert_eq!(to_words(20), "dua puluh");
        assert_eq!(to_words(45), "empat puluh lima");
    }

    #[test]
    fn test_hundreds_and_thousands() {
        assert_eq!(to_words(100), "seratus");
        assert_eq!(to_words(111), "seratus sebelas");
        assert_eq!(to_words(250), "dua ratus lima puluh");
        assert_eq!(to_words(1000), "seribu");
        assert_eq!(to_words(1001), "seribu satu");
        assert_eq!(to_words(1100), "seribu seratus");
        assert_eq!(to_words(2000), "dua ribu");
        assert_eq!(to_words(11000), "sebelas ribu");
        assert_eq!(to_words(101000), "seratus satu ribu");
    }

    #[test]
    fn test_large_groups() {
        assert_eq!(to_words(1_000_000), "satu juta");
        assert_eq!(
            to_words(4_800_000),
            "empat juta delapan ratus ribu"
        );
        assert_eq!(to_words(2_000_000_000), "dua milyar");
        assert_eq!(to_words(3_000_000_000_000), "tiga triliun");
    }

    #[test]
    fn test_negative_and_amount() {
        assert_eq!(to_words(-15), "minus lima belas");
        assert_eq!(amount_in_words(1500000.4), "satu juta lima ratus ribu rupiah");
    }
}
