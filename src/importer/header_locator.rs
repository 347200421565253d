// ==========================================
// 薪资单分发系统 - 表头区域定位器
// ==========================================
// 流程:
// 1. 首轮: 自上而下, 跳过非空 < 4 的行, 取第一个命中强关键字的行
// 2. 回退: 前 200 行打分, 取最高分 (同分取最早)
//    score = 3×身份命中 + 4×类别命中 + 非空数 + (下一行非空 > 2 ? 2 : 0)
// 3. 全部行非空 < 4 → 未找到 (由调用方处理, 不做默认)
// ==========================================

use crate::domain::types::CellValue;
use crate::domain::worksheet::non_empty_count;
use crate::importer::header_classifier::HeaderKeywords;
use serde::Serialize;
use tracing::debug;

/// 表头行最少非空单元格数
pub const MIN_HEADER_CELLS: usize = 4;

/// 回退打分的扫描行数上限
pub const MAX_SCAN_ROWS: usize = 200;

// ==========================================
// HeaderCandidate - 打分候选
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderCandidate {
    pub row_index: usize,
    pub score: i64,
    pub identity_hits: usize,
    pub category_hits: usize,
    pub non_empty: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LocateStrategy {
    StrongKeyword, // 首轮强关键字命中
    Scored,        // 回退打分
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeaderLocation {
    pub row_index: usize,
    pub strategy: LocateStrategy,
}

// ==========================================
// HeaderLocator
// ==========================================
pub struct HeaderLocator<'a> {
    keywords: &'a HeaderKeywords,
    min_cells: usize,
    max_scan_rows: usize,
}

impl Default for HeaderLocator<'static> {
    fn default() -> Self {
        Self::new(HeaderKeywords::standard())
    }
}

impl<'a> HeaderLocator<'a> {
    pub fn new(keywords: &'a HeaderKeywords) -> Self {
        Self {
            keywords,
            min_cells: MIN_HEADER_CELLS,
            max_scan_rows: MAX_SCAN_ROWS,
        }
    }

    /// 定位表头行
    pub fn locate(&self, rows: &[Vec<CellValue>]) -> Option<HeaderLocation> {
        if let Some(row_index) = self.first_strong_row(rows) {
            debug!(row_index, "表头定位: 强关键字命中");
            return Some(HeaderLocation {
                row_index,
                strategy: LocateStrategy::StrongKeyword,
            });
        }

        let best = self.rank_candidates(rows).into_iter().next()?;
        debug!(row_index = best.row_index, score = best.score, "表头定位: 回退打分");
        Some(HeaderLocation {
            row_index: best.row_index,
            strategy: LocateStrategy::Scored,
        })
    }

    /// 首轮扫描: 第一个 (非空 ≥ 4 且命中强关键字) 的行
    pub fn first_strong_row(&self, rows: &[Vec<CellValue>]) -> Option<usize> {
        rows.iter().position(|row| {
            non_empty_count(row) >= self.min_cells
                && row
                    .iter()
                    .any(|c| self.keywords.matches_strong_keyword(&c.as_text()))
        })
    }

    /// 回退打分: 返回按分数降序 (同分按行号升序) 的候选列表
    pub fn rank_candidates(&self, rows: &[Vec<CellValue>]) -> Vec<HeaderCandidate> {
        let scan = rows.len().min(self.max_scan_rows);
        let mut candidates: Vec<HeaderCandidate> = (0..scan)
            .filter_map(|idx| self.score_row(rows, idx))
            .collect();
        // 稳定排序保证同分时行号靠前者在前
        candidates.sort_by(|a, b| b.score.cmp(&a.score));
        candidates
    }

    /// 单行打分 (非空不足返回 None)
    pub fn score_row(&self, rows: &[Vec<CellValue>], idx: usize) -> Option<HeaderCandidate> {
        let row = rows.get(idx)?;
        let non_empty = non_empty_count(row);
        if non_empty < self.min_cells {
            return None;
        }

        let mut identity_hits = 0;
        let mut category_hits = 0;
        for cell in row {
            let text = cell.as_text();
            if self.keywords.classify_identity(&text).is_some() {
                identity_hits += 1;
            }
            if self.keywords.classify_category(&text).is_some() {
                category_hits += 1;
            }
        }

        let next_non_empty = rows.get(idx + 1).map(|r| non_empty_count(r)).unwrap_or(0);
        let bonus = if next_non_empty > 2 { 2 } else { 0 };
        let score = 3 * identity_hits as i64 + 4 * category_hits as i64 + non_empty as i64 + bonus;

        Some(HeaderCandidate {
            row_index: idx,
            score,
            identity_hits,
            category_hits,
            non_empty,
        })
    }
}
