// ==========================================
// 工作簿导入 端到端测试
// ==========================================
// 测试目标: xlsx/csv 字节流 → 表头定位 → 结构化记录 → PDF 生成
// ==========================================

mod test_helpers;

use payslip_dispatch::api::ApiError;
use payslip_dispatch::domain::{LineItem, PayrollCategory};
use payslip_dispatch::importer::ImportError;
use payslip_dispatch::render::PayslipRenderer;
use test_helpers::{build_xlsx, create_test_env, Blank, Num, Text};

#[test]
fn test_single_level_sheet_parses_to_one_record() {
    let env = create_test_env().unwrap();
    let bytes = build_xlsx(
        "Sheet1",
        &[
            vec![
                Text("NIK"),
                Text("NAMA"),
                Text("PENDAPATAN - GAJI POKOK"),
                Text("JML PENDAPATAN"),
                Text("POTONGAN WAJIB - BPJS"),
                Text("GAJI BERSIH"),
            ],
            vec![
                Text("123"),
                Text("Budi"),
                Num(5_000_000.0),
                Num(5_000_000.0),
                Num(200_000.0),
                Num(4_800_000.0),
            ],
        ],
    )
    .unwrap();

    let result = env.state.slip_api.parse(&bytes, Some("gaji.xlsx")).unwrap();

    assert_eq!(result.sheet_name, "Sheet1");
    assert_eq!(result.header_row, Some(0));
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.records.len(), 1);

    let rec = &result.records[0];
    assert_eq!(rec.national_id.as_deref(), Some("123"));
    assert_eq!(rec.employee_name.as_deref(), Some("Budi"));
    assert_eq!(rec.earnings, vec![LineItem::new("GAJI POKOK", 5_000_000.0)]);
    assert_eq!(
        rec.items(PayrollCategory::MandatoryDeduction),
        &[LineItem::new("BPJS", 200_000.0)]
    );

    // 行数据保留全部列, 顺序与表头一致
    assert_eq!(result.rows[0].headers(), result.headers.as_slice());
    assert_eq!(result.rows[0].len(), 6);
}

#[test]
fn test_two_level_header_with_period_cell() {
    let env = create_test_env().unwrap();
    let bytes = build_xlsx(
        "TABEL GAJI",
        &[
            vec![Text("DAFTAR GAJI KARYAWAN"), Blank, Text("Maret 2026")],
            vec![],
            vec![
                Text("NIK"),
                Text("NAMA"),
                Text("PENDAPATAN"),
                Blank,
                Text("POTONGAN WAJIB"),
                Text("GAJI BERSIH"),
            ],
            vec![
                Blank,
                Blank,
                Text("GAJI POKOK"),
                Text("LEMBUR"),
                Text("BPJS"),
                Blank,
            ],
            vec![
                Text("1"),
                Text("Ani"),
                Num(5_000_000.0),
                Num(250_000.0),
                Num(100_000.0),
                Num(5_150_000.0),
            ],
            vec![],
            vec![
                Text("2"),
                Text("Citra"),
                Num(4_000_000.0),
                Blank,
                Num(80_000.0),
                Num(3_920_000.0),
            ],
        ],
    )
    .unwrap();

    let result = env.state.slip_api.parse(&bytes, Some("gaji.xlsx")).unwrap();

    assert_eq!(result.period.as_deref(), Some("Maret 2026"));
    assert_eq!(result.header_row, Some(2));
    assert_eq!(
        result.headers,
        vec![
            "NIK",
            "NAMA",
            "PENDAPATAN - GAJI POKOK",
            "PENDAPATAN - LEMBUR",
            "POTONGAN WAJIB - BPJS",
            "GAJI BERSIH",
        ]
    );
    // 空行被丢弃, 不终止解析
    assert_eq!(result.records.len(), 2);

    let ani = &result.records[0];
    assert_eq!(
        ani.earnings,
        vec![
            LineItem::new("GAJI POKOK", 5_000_000.0),
            LineItem::new("LEMBUR", 250_000.0),
        ]
    );
    let citra = &result.records[1];
    assert_eq!(citra.employee_name.as_deref(), Some("Citra"));
    assert_eq!(citra.earnings, vec![LineItem::new("GAJI POKOK", 4_000_000.0)]);
}

#[test]
fn test_total_word_inside_item_label_agrees_between_record_and_slip() {
    let env = create_test_env().unwrap();
    let bytes = build_xlsx(
        "Sheet1",
        &[
            vec![
                Text("NIK"),
                Text("NAMA"),
                Text("PENDAPATAN - GAJI POKOK"),
                Text("PENDAPATAN - TOTAL LEMBUR"),
                Text("JML PENDAPATAN"),
            ],
            vec![Text("5"), Text("Eka"), Num(100.0), Num(50.0), Num(150.0)],
        ],
    )
    .unwrap();

    let result = env.state.slip_api.parse(&bytes, Some("gaji.xlsx")).unwrap();
    let expected = vec![
        LineItem::new("GAJI POKOK", 100.0),
        LineItem::new("TOTAL LEMBUR", 50.0),
    ];
    assert_eq!(result.records[0].earnings, expected);

    let content = PayslipRenderer::default().content(&result.rows[0]);
    assert_eq!(content.earnings, expected);
    assert_eq!(content.earnings_total, 150.0);
}

#[test]
fn test_csv_upload_is_supported() {
    let env = create_test_env().unwrap();
    let csv = "NIK,NAMA,PENDAPATAN - GAJI POKOK,POTONGAN WAJIB - BPJS\n\
               7,Dewi,\"3.500.000\",\"150.000\"\n";

    let result = env
        .state
        .slip_api
        .parse(csv.as_bytes(), Some("gaji.csv"))
        .unwrap();

    assert_eq!(result.records.len(), 1);
    let rec = &result.records[0];
    assert_eq!(rec.employee_name.as_deref(), Some("Dewi"));
    assert_eq!(rec.earnings, vec![LineItem::new("GAJI POKOK", 3_500_000.0)]);
}

#[test]
fn test_sheet_without_header_is_reported() {
    let env = create_test_env().unwrap();
    let bytes = build_xlsx(
        "Catatan",
        &[vec![Text("hanya"), Text("catatan")], vec![Num(1.0), Num(2.0)]],
    )
    .unwrap();

    let err = env
        .state
        .slip_api
        .parse(&bytes, Some("catatan.xlsx"))
        .unwrap_err();

    match err {
        ApiError::Import(ImportError::HeaderNotFound { sheet }) => assert_eq!(sheet, "Catatan"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_unsupported_extension_is_rejected() {
    let env = create_test_env().unwrap();
    let err = env
        .state
        .slip_api
        .parse(b"not a workbook", Some("gaji.pdf"))
        .unwrap_err();

    assert!(matches!(
        err,
        ApiError::Import(ImportError::UnsupportedFormat(ref ext)) if ext == "pdf"
    ));
    assert!(err.is_client_error());
}

#[tokio::test]
async fn test_parsed_rows_generate_named_documents() {
    let env = create_test_env().unwrap();
    let bytes = build_xlsx(
        "Sheet1",
        &[
            vec![
                Text("NIK"),
                Text("NAMA"),
                Text("JABATAN"),
                Text("PENDAPATAN - GAJI POKOK"),
                Text("POTONGAN WAJIB - BPJS"),
            ],
            vec![
                Text("123"),
                Text("Budi Santoso"),
                Text("Perawat"),
                Num(5_000_000.0),
                Num(200_000.0),
            ],
        ],
    )
    .unwrap();
    let parsed = env.state.slip_api.parse(&bytes, Some("gaji.xlsx")).unwrap();

    let saved = env
        .state
        .slip_api
        .generate_batch(&parsed.rows, "RS Ananda", "Jl. Merdeka 1", "Maret 2026")
        .await
        .unwrap();

    assert_eq!(saved.saved, 1);
    assert_eq!(saved.dir, "rs-ananda/maret-2026");
    assert_eq!(saved.files, vec!["123_Budi_Santoso.pdf"]);

    let path = env
        .documents
        .path()
        .join("rs-ananda")
        .join("maret-2026")
        .join("123_Budi_Santoso.pdf");
    let pdf = std::fs::read(path).unwrap();
    assert!(pdf.starts_with(b"%PDF"));
}
