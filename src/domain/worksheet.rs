// ==========================================
// 薪资单分发系统 - 原始工作表模型
// ==========================================
// 职责: 解析期内的只读 2D 单元格网格
// 约定: 行列索引为工作表绝对位置 (A1 = (0, 0))
// ==========================================

use crate::domain::types::CellValue;

// ==========================================
// RawWorksheet - 原始工作表
// ==========================================
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawWorksheet {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawWorksheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// 读取单元格 (越界视为空)
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    pub fn row(&self, row: usize) -> &[CellValue] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// 行内非空单元格数量
pub fn non_empty_count(row: &[CellValue]) -> usize {
    row.iter().filter(|c| !c.is_blank()).count()
}

// ==========================================
// RawWorkbook - 原始工作簿
// ==========================================
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawWorkbook {
    pub sheets: Vec<RawWorksheet>,
}

impl RawWorkbook {
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}
