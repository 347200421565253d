// ==========================================
// 薪资单分发系统 - 工作簿读取器
// ==========================================
// 支持: Excel (.xlsx/.xlsm/.xls/.ods, calamine) / CSV (.csv)
// 输出: RawWorkbook (按工作表绝对坐标展开的网格)
// ==========================================

use crate::domain::types::CellValue;
use crate::domain::worksheet::{RawWorkbook, RawWorksheet};
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::Timelike;
use csv::ReaderBuilder;
use std::io::Cursor;
use tracing::debug;

// ==========================================
// WorkbookReader Trait
// ==========================================
// 用途: 字节流 → 原始工作簿
pub trait WorkbookReader: Send + Sync {
    fn read(&self, bytes: &[u8]) -> ImportResult<RawWorkbook>;
}

// ==========================================
// Excel Reader 实现
// ==========================================
pub struct ExcelReader;

impl WorkbookReader for ExcelReader {
    fn read(&self, bytes: &[u8]) -> ImportResult<RawWorkbook> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| ImportError::WorkbookReadError(format!("{}: {}", name, e)))?;
            let rows = range_to_grid(&range);
            debug!(sheet = %name, rows = rows.len(), "读取工作表");
            sheets.push(RawWorksheet::new(name, rows));
        }

        Ok(RawWorkbook { sheets })
    }
}

/// 按绝对坐标展开 (保证 C1 等固定位置可直接寻址)
fn range_to_grid(range: &Range<Data>) -> Vec<Vec<CellValue>> {
    let Some((end_row, end_col)) = range.end() else {
        return Vec::new();
    };
    (0..=end_row)
        .map(|r| {
            (0..=end_col)
                .map(|c| range.get_value((r, c)).map(cell_from_data).unwrap_or_default())
                .collect()
        })
        .collect()
}

fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::from(s.as_str()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(v) if v.num_seconds_from_midnight() == 0 => {
                CellValue::Text(v.format("%Y-%m-%d").to_string())
            }
            Some(v) => CellValue::Text(v.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::from(s.as_str()),
    }
}

// ==========================================
// CSV Reader 实现
// ==========================================
// 单工作表, 不区分表头 (表头由定位器识别)
pub struct CsvReader;

/// CSV 工作表名
pub const CSV_SHEET_NAME: &str = "CSV";

impl WorkbookReader for CsvReader {
    fn read(&self, bytes: &[u8]) -> ImportResult<RawWorkbook> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .from_reader(bytes);

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(record.iter().map(CellValue::from).collect());
        }

        Ok(RawWorkbook {
            sheets: vec![RawWorksheet::new(CSV_SHEET_NAME, rows)],
        })
    }
}

// ==========================================
// 通用读取器（根据扩展名自动选择）
// ==========================================
pub struct UniversalWorkbookReader;

impl UniversalWorkbookReader {
    pub fn read_named(&self, bytes: &[u8], file_name: Option<&str>) -> ImportResult<RawWorkbook> {
        let ext = file_name
            .and_then(|n| n.rsplit_once('.'))
            .map(|(_, ext)| ext.to_lowercase());

        match ext.as_deref() {
            Some("csv") => CsvReader.read(bytes),
            None | Some("xlsx") | Some("xlsm") | Some("xlsb") | Some("xls") | Some("ods") => {
                ExcelReader.read(bytes)
            }
            Some(other) => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl WorkbookReader for UniversalWorkbookReader {
    fn read(&self, bytes: &[u8]) -> ImportResult<RawWorkbook> {
        self.read_named(bytes, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_reader_keeps_all_rows() {
        let data = "\u{feff}SLIP GAJI,,\nNIK,NAMA,GAJI\n1,Budi,\"5.000.000\"\n";
        let wb = CsvReader.read(data.as_bytes()).unwrap();
        assert_eq!(wb.sheets.len(), 1);
        let ws = &wb.sheets[0];
        assert_eq!(ws.row_count(), 3);
        assert_eq!(ws.cell(0, 0), &CellValue::from("SLIP GAJI"));
        assert_eq!(ws.cell(0, 1), &CellValue::Empty);
        assert_eq!(ws.cell(2, 2), &CellValue::from("5.000.000"));
    }

    #[test]
    fn test_excel_reader_rejects_garbage() {
        let result = ExcelReader.read(b"definitely not a spreadsheet");
        assert!(matches!(result, Err(ImportError::WorkbookReadError(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let result = UniversalWorkbookReader.read_named(b"x", Some("slip.pdf"));
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(ext)) if ext == "pdf"));
    }
}
