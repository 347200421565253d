// ==========================================
// 薪资单分发系统 - 工作簿规范化器
// ==========================================
// 流程: 选表 → 读期间(C1) → 定位表头 → 两级表头 → 列标签去重
//       → 逐行生成 FlatRow + NormalizedRecord
// 红线: 解码失败整体失败; 未找到表头返回空结果 (非异常)
// ==========================================

use crate::domain::slip::{
    FlatRow, HeaderCell, LineItem, NormalizedColumn, NormalizedRecord, SlipImportResult,
};
use crate::domain::types::{CellValue, IdentityRole};
use crate::domain::worksheet::{RawWorkbook, RawWorksheet};
use crate::importer::amount::{looks_numeric, parse_amount};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::header_classifier::HeaderKeywords;
use crate::importer::header_locator::HeaderLocator;
use crate::importer::workbook_reader::UniversalWorkbookReader;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// 期间标记所在单元格 (C1)
pub const PERIOD_CELL: (usize, usize) = (0, 2);

/// 子表头为空时向下探测的数据行数
pub const SUB_LABEL_PROBE_ROWS: usize = 5;

// ==========================================
// SlipNormalizer
// ==========================================
pub struct SlipNormalizer {
    keywords: &'static HeaderKeywords,
    reader: UniversalWorkbookReader,
}

impl Default for SlipNormalizer {
    fn default() -> Self {
        Self::new(HeaderKeywords::standard())
    }
}

/// 表头区域解析结果 (解析期临时结构)
struct HeaderRegion {
    cells: Vec<HeaderCell>,
    columns: Vec<NormalizedColumn>,
    header_groups: Vec<Option<String>>,
    body_start: usize,
}

impl SlipNormalizer {
    pub fn new(keywords: &'static HeaderKeywords) -> Self {
        Self {
            keywords,
            reader: UniversalWorkbookReader,
        }
    }

    /// 解析上传的工作簿字节
    ///
    /// # 参数
    /// - bytes: 文件内容
    /// - file_name: 原始文件名 (用于判断 CSV / Excel, 可为空)
    ///
    /// # 返回
    /// - Ok(SlipImportResult): 未找到表头时 headers 为空
    /// - Err(ImportError): 非电子表格 / 无工作表
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub fn parse(&self, bytes: &[u8], file_name: Option<&str>) -> ImportResult<SlipImportResult> {
        let workbook = self.reader.read_named(bytes, file_name)?;
        self.normalize_workbook(&workbook)
    }

    /// 规范化已读取的工作簿
    pub fn normalize_workbook(&self, workbook: &RawWorkbook) -> ImportResult<SlipImportResult> {
        let names = workbook.sheet_names();
        let idx = select_sheet(&names).ok_or(ImportError::EmptyWorkbook)?;
        let sheet = &workbook.sheets[idx];
        info!(sheet = %sheet.name, "选定工作表");

        let period = sheet.cell(PERIOD_CELL.0, PERIOD_CELL.1).as_non_empty_text();
        Ok(self.normalize_sheet(sheet, period))
    }

    /// 规范化单个工作表
    pub fn normalize_sheet(&self, sheet: &RawWorksheet, period: Option<String>) -> SlipImportResult {
        let Some(location) = HeaderLocator::new(self.keywords).locate(&sheet.rows) else {
            warn!(sheet = %sheet.name, "未找到表头区域");
            return SlipImportResult::empty(sheet.name.clone(), period);
        };
        let header_idx = location.row_index;

        let region = self.build_header_region(sheet, header_idx);
        let headers: Arc<[String]> = region
            .columns
            .iter()
            .map(|c| c.display_label.clone())
            .collect::<Vec<_>>()
            .into();

        let mut rows = Vec::new();
        let mut records = Vec::new();
        for body in sheet.rows.iter().skip(region.body_start) {
            // 全空行丢弃, 不终止解析
            if body.iter().all(CellValue::is_blank) {
                continue;
            }
            let values: Vec<CellValue> = (0..headers.len())
                .map(|i| body.get(i).cloned().unwrap_or_default())
                .collect();
            records.push(self.build_record(&region, &values));
            rows.push(FlatRow::new(headers.clone(), values));
        }

        info!(
            header_row = header_idx,
            columns = headers.len(),
            rows = rows.len(),
            "工作表规范化完成"
        );

        SlipImportResult {
            sheet_name: sheet.name.clone(),
            header_row: Some(header_idx),
            headers: headers.to_vec(),
            header_groups: region.header_groups,
            columns: region.columns,
            rows,
            records,
            period,
        }
    }

    // ==========================================
    // 表头区域
    // ==========================================

    fn build_header_region(&self, sheet: &RawWorksheet, header_idx: usize) -> HeaderRegion {
        let top_row = sheet.row(header_idx);
        let next_row = sheet.row(header_idx + 1);

        // 下一行像数据行时, 视为单级表头
        let two_level = !next_row.is_empty() && !self.looks_like_data_row(top_row, next_row);
        let (sub_row, body_start): (&[CellValue], usize) = if two_level {
            (next_row, header_idx + 2)
        } else {
            (&[], header_idx + 1)
        };
        debug!(two_level, body_start, "表头层级");

        let width = top_row.len().max(sub_row.len());
        let tops = carry_forward(top_row, width);
        let probe: Vec<&[CellValue]> = if two_level {
            (body_start..body_start + SUB_LABEL_PROBE_ROWS)
                .map(|r| sheet.row(r))
                .collect()
        } else {
            Vec::new()
        };

        let mut cells = Vec::with_capacity(width);
        let mut labels = Vec::with_capacity(width);
        let mut header_groups = Vec::with_capacity(width);
        for (i, top) in tops.into_iter().enumerate() {
            let sub = sub_row
                .get(i)
                .and_then(CellValue::as_non_empty_text)
                .or_else(|| probe_label(&probe, i))
                .unwrap_or_default();

            let category = self.keywords.classify_category(&top);
            header_groups.push(category.map(|c| c.group_label().to_string()));

            let label = match category {
                Some(_) if !sub.is_empty() && sub != top => format!("{} - {}", top, sub),
                Some(_) if !top.is_empty() => top.clone(),
                None if !top.is_empty() => top.clone(),
                None if !sub.is_empty() => sub.clone(),
                _ => format!("COL_{}", i),
            };
            labels.push(label);
            cells.push(HeaderCell { top, sub });
        }

        let labels = dedupe_labels(labels);
        let columns = labels
            .into_iter()
            .zip(cells.iter())
            .map(|(label, cell)| self.classify_column(label, cell))
            .collect();

        HeaderRegion {
            cells,
            columns,
            header_groups,
            body_start,
        }
    }

    fn classify_column(&self, display_label: String, cell: &HeaderCell) -> NormalizedColumn {
        let kw = self.keywords;
        let category = kw
            .classify_category(&display_label)
            .or_else(|| kw.classify_category(&cell.top));
        let is_total = kw.is_total_marker(&display_label) || kw.is_total_marker(&cell.top);
        // 金额类列不作身份字段
        let identity_role = if category.is_some() || is_total {
            None
        } else {
            kw.classify_identity(&display_label)
                .or_else(|| kw.classify_identity(&cell.top))
                .or_else(|| kw.classify_identity(&cell.sub))
        };

        NormalizedColumn {
            display_label,
            category,
            identity_role,
            is_total,
        }
    }

    /// 判断表头下一行是否已是数据行:
    /// 姓名列为非数字文本, 且某个类别列为数值
    fn looks_like_data_row(&self, top_row: &[CellValue], next_row: &[CellValue]) -> bool {
        let tops = carry_forward(top_row, top_row.len().max(next_row.len()));
        let mut has_name_text = false;
        let mut has_amount = false;
        for (i, top) in tops.iter().enumerate() {
            let Some(value) = next_row.get(i) else {
                continue;
            };
            if value.is_blank() {
                continue;
            }
            if self.keywords.classify_category(top).is_some() {
                has_amount |= looks_numeric(value);
            } else if self.keywords.classify_identity(top) == Some(IdentityRole::EmployeeName) {
                has_name_text |= !looks_numeric(value);
            }
        }
        has_name_text && has_amount
    }

    // ==========================================
    // 记录构建
    // ==========================================

    fn build_record(&self, region: &HeaderRegion, values: &[CellValue]) -> NormalizedRecord {
        let mut rec = NormalizedRecord::default();

        for ((column, cell), value) in region.columns.iter().zip(&region.cells).zip(values) {
            if value.is_blank() {
                continue;
            }

            if let Some(role) = column.identity_role {
                // 重复身份列: 只取第一列, 后续列仍保留在 FlatRow
                rec.set_identity_if_absent(role, value.as_text());
                continue;
            }

            // 合计列不进入明细, 也不进 meta
            if column.is_total {
                continue;
            }

            if let Some(category) = column.category {
                let raw_name = if !cell.sub.is_empty() && cell.sub != cell.top {
                    cell.sub.as_str()
                } else {
                    column.display_label.as_str()
                };
                let mut name = self.keywords.clean_item_label(raw_name);
                if name.is_empty() {
                    name = column.display_label.clone();
                }
                rec.items_mut(category)
                    .push(LineItem::new(name, parse_amount(value)));
                continue;
            }

            rec.meta.insert(column.display_label.clone(), value.clone());
        }

        rec
    }
}

// ==========================================
// 工具函数
// ==========================================

/// 选表: 同时含 table/tabel 与 gaji → 含 gaji → 第一张
pub fn select_sheet(names: &[&str]) -> Option<usize> {
    let lower: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
    let is_table = |n: &str| n.contains("table") || n.contains("tabel");
    let is_payroll = |n: &str| n.contains("gaji") || n.contains("payroll");

    lower
        .iter()
        .position(|n| is_table(n) && is_payroll(n))
        .or_else(|| lower.iter().position(|n| is_payroll(n)))
        .or(if names.is_empty() { None } else { Some(0) })
}

/// 合并表头向右延续
fn carry_forward(row: &[CellValue], width: usize) -> Vec<String> {
    let mut last = String::new();
    (0..width)
        .map(|i| {
            if let Some(text) = row.get(i).and_then(CellValue::as_non_empty_text) {
                last = text;
            }
            last.clone()
        })
        .collect()
}

/// 子表头为空时, 取后续数据行中第一个非纯数字的单元格
fn probe_label(probe: &[&[CellValue]], col: usize) -> Option<String> {
    probe
        .iter()
        .filter_map(|row| row.get(col))
        .filter(|v| !v.is_blank() && !looks_numeric(v))
        .map(CellValue::as_text)
        .next()
}

/// 标签去重: 重复者追加 " #2", " #3" ...
pub fn dedupe_labels(labels: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut used: HashSet<String> = HashSet::new();
    labels
        .into_iter()
        .map(|base| {
            let count = seen.entry(base.clone()).or_insert(0);
            let mut candidate = if *count == 0 {
                base.clone()
            } else {
                format!("{} #{}", base, *count + 1)
            };
            *count += 1;
            while used.contains(&candidate) {
                *count += 1;
                candidate = format!("{} #{}", base, *count);
            }
            used.insert(candidate.clone());
            candidate
        })
        .collect()
}
