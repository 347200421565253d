// ==========================================
// 薪资单分发系统 - 工资条渲染器
// ==========================================
// 输入: FlatRow (列标签 → 原始值) + 渲染选项
// 输出: 单页横向 A4 PDF
// 版式 (自上而下):
//   页眉 (Logo / 单位名称地址 | 标题 / 期间)
//   身份信息 (姓名 NIK | 职位 银行账号)
//   收入表 | 扣款表
//   实发工资 + 大写
//   已发放津贴表
//   页脚 (打印日期 | HRD. / 格言)
// 红线: 合计值直接取自表格, 不重新计算; 缺失字段以 "-" 占位
// ==========================================

use crate::domain::slip::{FlatRow, LineItem};
use crate::domain::types::{IdentityRole, PayrollCategory};
use crate::importer::amount::parse_amount;
use crate::importer::header_classifier::HeaderKeywords;
use crate::render::currency::format_rupiah;
use crate::render::error::{RenderError, RenderResult};
use crate::render::layout::{FontStyle, LayoutBuilder, PageLayout, TableSpec};
use crate::render::pdf_writer::write_pdf;
use crate::render::terbilang::amount_in_words;
use chrono::{Datelike, Local, NaiveDate};
use std::collections::HashMap;
use tracing::{debug, instrument};

pub const DOCUMENT_TITLE: &str = "SLIP GAJI KARYAWAN";
pub const CLOSING_ATTRIBUTION: &str = "HRD.";
pub const CLOSING_QUOTE: &str = "\"Sesungguhnya jika kamu bersyukur, pasti Kami akan menambah nikmat kepadamu\" (QS. Ibrahim;7)";
pub const PLACEHOLDER: &str = "-";

const MONTHS_ID: [&str; 12] = [
    "Januari", "Februari", "Maret", "April", "Mei", "Juni", "Juli", "Agustus", "September",
    "Oktober", "November", "Desember",
];

/// 打印日期 (印尼语): "16 Oktober 2026"
pub fn format_print_date(date: NaiveDate) -> String {
    format!(
        "{:02} {} {}",
        date.day(),
        MONTHS_ID[date.month0() as usize],
        date.year()
    )
}

// ==========================================
// RenderOptions
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub organization_name: String,
    pub organization_address: String,
    pub period: String,
    /// 为空时取当天日期
    pub print_date: Option<NaiveDate>,
    /// PNG / JPEG 字节
    pub logo: Option<Vec<u8>>,
}

impl RenderOptions {
    pub fn new(
        organization_name: impl Into<String>,
        organization_address: impl Into<String>,
        period: impl Into<String>,
    ) -> Self {
        Self {
            organization_name: organization_name.into(),
            organization_address: organization_address.into(),
            period: period.into(),
            print_date: None,
            logo: None,
        }
    }

    pub fn with_print_date(mut self, date: NaiveDate) -> Self {
        self.print_date = Some(date);
        self
    }

    pub fn with_logo(mut self, logo: Option<Vec<u8>>) -> Self {
        self.logo = logo;
        self
    }

    fn resolved_print_date(&self) -> NaiveDate {
        self.print_date.unwrap_or_else(|| Local::now().date_naive())
    }
}

// ==========================================
// SlipContent - 从 FlatRow 提取的工资条内容
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlipContent {
    pub identity: HashMap<IdentityRole, String>,
    pub earnings: Vec<LineItem>,
    pub deductions: Vec<LineItem>,
    pub allowances: Vec<LineItem>,
    pub earnings_total: f64,
    pub deductions_total: f64,
    pub allowances_total: f64,
    pub net_pay: f64,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
enum Section {
    Earnings,
    Deductions,
    Allowances,
}

impl SlipContent {
    pub fn from_row(row: &FlatRow, kw: &HeaderKeywords) -> Self {
        let mut content = SlipContent::default();
        let mut totals: HashMap<Section, f64> = HashMap::new();
        let mut net_pay: Option<f64> = None;

        for (key, value) in row.entries() {
            let cleaned = kw.clean_item_label(key);
            let is_total = kw.is_total_marker(key);
            let is_net = kw.is_net_pay_label(key);
            let category = kw.classify_category(key);

            let section = match category {
                Some(PayrollCategory::Earnings) => Some(Section::Earnings),
                Some(PayrollCategory::DisbursedAllowance) => Some(Section::Allowances),
                _ if kw.is_deduction_label(key) && !is_net => Some(Section::Deductions),
                _ => None,
            };

            if let Some(section) = section {
                let amount = parse_amount(value);
                if is_total {
                    // 每个分区取第一个合计列
                    totals.entry(section).or_insert(amount);
                } else {
                    let name = if cleaned.is_empty() { key.to_string() } else { cleaned };
                    content.section_mut(section).push(LineItem::new(name, amount));
                }
                continue;
            }

            if is_net {
                net_pay.get_or_insert(parse_amount(value));
                continue;
            }

            if is_total {
                continue;
            }

            if let Some(role) = kw.classify_identity(key) {
                if let Some(text) = value.as_non_empty_text() {
                    content.identity.entry(role).or_insert(text);
                }
            }
        }

        let total_of = |section: Section| totals.get(&section).copied().unwrap_or(0.0);
        content.earnings_total = total_of(Section::Earnings);
        content.deductions_total = total_of(Section::Deductions);
        content.allowances_total = total_of(Section::Allowances);
        content.net_pay = net_pay.unwrap_or(0.0);
        content
    }

    fn section_mut(&mut self, section: Section) -> &mut Vec<LineItem> {
        match section {
            Section::Earnings => &mut self.earnings,
            Section::Deductions => &mut self.deductions,
            Section::Allowances => &mut self.allowances,
        }
    }

    pub fn identity_or_placeholder(&self, role: IdentityRole) -> &str {
        self.identity
            .get(&role)
            .map(String::as_str)
            .unwrap_or(PLACEHOLDER)
    }
}

fn item_rows(items: &[LineItem]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|item| (item.name.clone(), format_rupiah(item.amount)))
        .collect()
}

// ==========================================
// PayslipRenderer
// ==========================================
pub struct PayslipRenderer {
    keywords: &'static HeaderKeywords,
}

impl Default for PayslipRenderer {
    fn default() -> Self {
        Self {
            keywords: HeaderKeywords::standard(),
        }
    }
}

impl PayslipRenderer {
    pub fn new(keywords: &'static HeaderKeywords) -> Self {
        Self { keywords }
    }

    pub fn content(&self, row: &FlatRow) -> SlipContent {
        SlipContent::from_row(row, self.keywords)
    }

    /// 渲染为 PDF 字节
    #[instrument(skip(self, row, options), fields(period = %options.period))]
    pub fn render(&self, row: &FlatRow, options: &RenderOptions) -> RenderResult<Vec<u8>> {
        let layout = self.layout(row, options)?;
        let content = self.content(row);
        let title = format!(
            "Slip Gaji {}",
            content.identity_or_placeholder(IdentityRole::EmployeeName)
        );
        let bytes = write_pdf(&layout, &title, options.logo.as_deref())?;
        debug!(size = bytes.len(), scale = layout.scale, "工资条已生成");
        Ok(bytes)
    }

    /// 计算布局 (纯函数, 供测试与渲染共用)
    pub fn layout(&self, row: &FlatRow, options: &RenderOptions) -> RenderResult<PageLayout> {
        if row.is_empty() {
            return Err(RenderError::InvalidRow("数据行没有任何列".to_string()));
        }
        let content = self.content(row);
        let mut b = LayoutBuilder::default();
        let right_edge = b.page_width() - 20.0;

        // ===== 页眉 =====
        if options.logo.is_some() {
            b.logo(15.0, 8.0, 20.0, 20.0);
        }
        b.text(40.0, 14.0, 12.0, FontStyle::Bold, options.organization_name.clone());
        b.wrapped_text(
            40.0,
            20.0,
            9.0,
            FontStyle::Regular,
            &options.organization_address,
            95.0,
            4.0,
        );
        b.text_right(right_edge, 14.0, 14.0, FontStyle::Bold, DOCUMENT_TITLE);
        b.text_right(
            right_edge,
            20.0,
            10.0,
            FontStyle::Regular,
            format!("Periode: {}", options.period),
        );

        // ===== 身份信息 =====
        let y_start = 35.0;
        b.text(
            20.0,
            y_start,
            10.0,
            FontStyle::Regular,
            format!("Nama: {}", content.identity_or_placeholder(IdentityRole::EmployeeName)),
        );
        b.text(
            20.0,
            y_start + 6.0,
            10.0,
            FontStyle::Regular,
            format!("NIK   : {}", content.identity_or_placeholder(IdentityRole::NationalId)),
        );
        b.text(
            150.0,
            y_start,
            10.0,
            FontStyle::Regular,
            format!("Jabatan: {}", content.identity_or_placeholder(IdentityRole::Position)),
        );
        b.text(
            150.0,
            y_start + 6.0,
            10.0,
            FontStyle::Regular,
            format!("No. Rek: {}", content.identity_or_placeholder(IdentityRole::BankAccount)),
        );

        // ===== 收入 | 扣款 =====
        let tables_y = y_start + 20.0;
        let left_bottom = b.table(TableSpec {
            x: 20.0,
            y: tables_y,
            width: 122.0,
            head: ("Pendapatan", "Jumlah (Rp)"),
            rows: item_rows(&content.earnings),
            total: ("Total Pendapatan", format_rupiah(content.earnings_total)),
        });
        let right_bottom = b.table(TableSpec {
            x: 155.0,
            y: tables_y,
            width: 122.0,
            head: ("Potongan", "Jumlah (Rp)"),
            rows: item_rows(&content.deductions),
            total: ("Total Potongan", format_rupiah(content.deductions_total)),
        });

        // ===== 实发工资 =====
        let net_y = left_bottom.max(right_bottom) + 10.0;
        b.text(
            20.0,
            net_y,
            11.0,
            FontStyle::Bold,
            format!("Gaji Bersih: {}", format_rupiah(content.net_pay)),
        );
        b.text(
            20.0,
            net_y + 6.0,
            10.0,
            FontStyle::Oblique,
            amount_in_words(content.net_pay),
        );

        // ===== 已发放津贴 =====
        b.table(TableSpec {
            x: 20.0,
            y: net_y + 15.0,
            width: 122.0,
            head: ("Tunjangan yg Dibayarkan", "Jumlah (Rp)"),
            rows: item_rows(&content.allowances),
            total: (
                "JML TUNJANGAN YG DIBAYARKAN",
                format_rupiah(content.allowances_total),
            ),
        });

        // ===== 页脚 =====
        b.text_right(right_edge, 180.0, 10.0, FontStyle::Bold, CLOSING_ATTRIBUTION);
        b.text(
            20.0,
            190.0,
            9.0,
            FontStyle::Regular,
            format!(
                "Dicetak pada: {}",
                format_print_date(options.resolved_print_date())
            ),
        );
        b.text_right(right_edge, 190.0, 9.0, FontStyle::TimesItalic, CLOSING_QUOTE);

        Ok(b.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::layout::DrawOp;

    fn budi_row() -> FlatRow {
        FlatRow::from_pairs(vec![
            ("NIK", "123"),
            ("NAMA", "Budi"),
            ("JABATAN", "Staf"),
            ("NO. REK", "0011"),
            ("PENDAPATAN - GAJI POKOK", "5.000.000"),
            ("PENDAPATAN - LEMBUR", "250000"),
            ("JML PENDAPATAN", "5250000"),
            ("POTONGAN WAJIB - BPJS", "200000"),
            ("POTONGAN HUTANG - KOPERASI", "50000"),
            ("JML POTONGAN", "250000"),
            ("GAJI BERSIH", "5000000"),
            ("TUNJANGAN YG DIBAYARKAN - TRANSPORT", "300000"),
            ("JML TUNJANGAN YG DIBAYARKAN", "300000"),
        ])
    }

    fn options() -> RenderOptions {
        RenderOptions::new("PT Contoh", "Jl. Merdeka No. 1", "Oktober 2025")
            .with_print_date(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap())
    }

    #[test]
    fn test_format_print_date() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        assert_eq!(format_print_date(d), "05 Maret 2026");
    }

    #[test]
    fn test_content_extraction() {
        let content = PayslipRenderer::default().content(&budi_row());
        assert_eq!(
            content.earnings,
            vec![
                LineItem::new("GAJI POKOK", 5000000.0),
                LineItem::new("LEMBUR", 250000.0)
            ]
        );
        assert_eq!(
            content.deductions,
            vec![
                LineItem::new("BPJS", 200000.0),
                LineItem::new("KOPERASI", 50000.0)
            ]
        );
        assert_eq!(content.allowances, vec![LineItem::new("TRANSPORT", 300000.0)]);
        assert_eq!(content.earnings_total, 5250000.0);
        assert_eq!(content.deductions_total, 250000.0);
        assert_eq!(content.allowances_total, 300000.0);
        assert_eq!(content.net_pay, 5000000.0);
        assert_eq!(content.identity_or_placeholder(IdentityRole::EmployeeName), "Budi");
        assert_eq!(content.identity_or_placeholder(IdentityRole::BankAccount), "0011");
    }

    #[test]
    fn test_totals_are_trusted_not_recomputed() {
        let row = FlatRow::from_pairs(vec![
            ("NAMA", "Ani"),
            ("PENDAPATAN - GAJI POKOK", "100"),
            ("JML PENDAPATAN", "999"),
        ]);
        let content = PayslipRenderer::default().content(&row);
        assert_eq!(content.earnings_total, 999.0);
    }

    #[test]
    fn test_total_word_inside_item_label_is_an_item() {
        let row = FlatRow::from_pairs(vec![
            ("PENDAPATAN - GAJI POKOK", "100"),
            ("PENDAPATAN - TOTAL LEMBUR", "50"),
            ("JML PENDAPATAN", "150"),
        ]);
        let content = PayslipRenderer::default().content(&row);
        assert_eq!(
            content.earnings,
            vec![
                LineItem::new("GAJI POKOK", 100.0),
                LineItem::new("TOTAL LEMBUR", 50.0)
            ]
        );
        assert_eq!(content.earnings_total, 150.0);
    }

    #[test]
    fn test_layout_contains_expected_blocks() {
        let layout = PayslipRenderer::default()
            .layout(&budi_row(), &options())
            .unwrap();
        let texts: Vec<&str> = layout.texts().collect();
        for expected in [
            "PT Contoh",
            "SLIP GAJI KARYAWAN",
            "Periode: Oktober 2025",
            "Nama: Budi",
            "NIK   : 123",
            "Jabatan: Staf",
            "No. Rek: 0011",
            "Total Pendapatan",
            "Rp5.250.000",
            "Total Potongan",
            "Gaji Bersih: Rp5.000.000",
            "lima juta rupiah",
            "JML TUNJANGAN YG DIBAYARKAN",
            "HRD.",
            "Dicetak pada: 16 Oktober 2026",
            CLOSING_QUOTE,
        ] {
            assert!(texts.contains(&expected), "missing {expected:?}");
        }
        assert_eq!(layout.scale, 1.0);
    }

    #[test]
    fn test_missing_identity_uses_placeholder() {
        let row = FlatRow::from_pairs(vec![("PENDAPATAN - GAJI POKOK", "100")]);
        let layout = PayslipRenderer::default().layout(&row, &options()).unwrap();
        assert!(layout.find_text("Nama: -").is_some());
        assert!(layout.find_text("No. Rek: -").is_some());
        assert!(layout.find_text("Gaji Bersih: Rp0").is_some());
    }

    #[test]
    fn test_net_pay_below_taller_table() {
        let mut pairs = vec![("NAMA".to_string(), "Ani".to_string())];
        for i in 0..6 {
            pairs.push((format!("POTONGAN WAJIB - P{i}"), "1000".to_string()));
        }
        let row = FlatRow::from_pairs(pairs);
        let layout = PayslipRenderer::default().layout(&row, &options()).unwrap();
        let Some(DrawOp::Text { y, .. }) = layout.find_text("Gaji Bersih: Rp0") else {
            panic!("net pay line missing");
        };
        // 右表 6 行 + 表头 + 合计 = 8 行
        let expected = 55.0 + 8.0 * crate::render::layout::TABLE_ROW_HEIGHT_MM + 10.0;
        assert!((y - expected).abs() < 1e-3);
    }

    #[test]
    fn test_long_slip_is_scaled_onto_one_page() {
        let mut pairs = vec![("NAMA".to_string(), "Ani".to_string())];
        for i in 0..30 {
            pairs.push((format!("PENDAPATAN - ITEM {i}"), "1000".to_string()));
        }
        let row = FlatRow::from_pairs(pairs);
        let layout = PayslipRenderer::default().layout(&row, &options()).unwrap();
        assert!(layout.scale < 1.0);
        assert!(layout.content_bottom() <= 200.0 + 1e-3);
    }

    #[test]
    fn test_empty_row_is_invalid() {
        let row = FlatRow::from_pairs(Vec::<(String, String)>::new());
        assert!(matches!(
            PayslipRenderer::default().layout(&row, &options()),
            Err(RenderError::InvalidRow(_))
        ));
    }

    #[test]
    fn test_render_pdf_with_broken_logo() {
        let opts = options().with_logo(Some(vec![0u8, 1, 2, 3]));
        let bytes = PayslipRenderer::default().render(&budi_row(), &opts).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
