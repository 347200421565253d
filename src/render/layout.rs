// ==========================================
// 薪资单分发系统 - 页面布局模型
// ==========================================
// 职责: 纯布局计算 (坐标单位 mm, 原点左上)
// 流程: 构建绘制指令 → 试排测量 → 超出页面时统一缩放
// 红线: 单页输出, 不分页, 不裁剪
// ==========================================

use serde::Serialize;

/// A4 横向
pub const PAGE_WIDTH_MM: f32 = 297.0;
pub const PAGE_HEIGHT_MM: f32 = 210.0;

/// 底边距
pub const BOTTOM_MARGIN_MM: f32 = 10.0;

/// 表格行高 (8pt 字号)
pub const TABLE_ROW_HEIGHT_MM: f32 = 5.3;
pub const TABLE_FONT_SIZE: f32 = 8.0;

const PT_TO_MM: f32 = 25.4 / 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FontStyle {
    Regular,
    Bold,
    Oblique,
    TimesItalic,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DrawOp {
    /// y 为基线位置
    Text {
        x: f32,
        y: f32,
        size: f32,
        style: FontStyle,
        text: String,
    },
    Rule {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
    Logo {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

impl DrawOp {
    fn bottom(&self) -> f32 {
        match self {
            DrawOp::Text { y, .. } => *y,
            DrawOp::Rule { y1, y2, .. } => y1.max(*y2),
            DrawOp::Logo { y, height, .. } => y + height,
        }
    }

    fn scaled(self, k: f32) -> Self {
        match self {
            DrawOp::Text {
                x,
                y,
                size,
                style,
                text,
            } => DrawOp::Text {
                x: x * k,
                y: y * k,
                size: size * k,
                style,
                text,
            },
            DrawOp::Rule { x1, y1, x2, y2 } => DrawOp::Rule {
                x1: x1 * k,
                y1: y1 * k,
                x2: x2 * k,
                y2: y2 * k,
            },
            DrawOp::Logo {
                x,
                y,
                width,
                height,
            } => DrawOp::Logo {
                x: x * k,
                y: y * k,
                width: width * k,
                height: height * k,
            },
        }
    }
}

// ==========================================
// PageLayout - 单页布局结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLayout {
    pub width: f32,
    pub height: f32,
    /// 全局缩放系数 (1.0 = 未缩放)
    pub scale: f32,
    pub ops: Vec<DrawOp>,
}

impl PageLayout {
    /// 内容最低点 (mm)
    pub fn content_bottom(&self) -> f32 {
        self.ops.iter().map(DrawOp::bottom).fold(0.0, f32::max)
    }

    /// 全部文字 (按绘制顺序)
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn find_text(&self, needle: &str) -> Option<&DrawOp> {
        self.ops
            .iter()
            .find(|op| matches!(op, DrawOp::Text { text, .. } if text == needle))
    }
}

// ==========================================
// 文字宽度估算 (Helvetica 字宽表, 1/1000 em)
// ==========================================
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

fn char_units(ch: char) -> f32 {
    let code = ch as u32;
    if (32..127).contains(&code) {
        HELVETICA_WIDTHS[(code - 32) as usize] as f32
    } else {
        556.0
    }
}

/// 估算文字宽度 (mm)
pub fn text_width_mm(text: &str, size_pt: f32, style: FontStyle) -> f32 {
    let factor = match style {
        FontStyle::Bold => 1.06,
        FontStyle::TimesItalic => 0.9,
        FontStyle::Regular | FontStyle::Oblique => 1.0,
    };
    let units: f32 = text.chars().map(char_units).sum();
    units / 1000.0 * size_pt * PT_TO_MM * factor
}

/// 按宽度折行 (以空格为断点, 超长单词独占一行)
pub fn wrap_text(text: &str, size_pt: f32, style: FontStyle, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if !current.is_empty() && text_width_mm(&candidate, size_pt, style) > max_width {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

// ==========================================
// 表格
// ==========================================
#[derive(Debug, Clone)]
pub struct TableSpec<'a> {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub head: (&'a str, &'a str),
    pub rows: Vec<(String, String)>,
    pub total: (&'a str, String),
}

// ==========================================
// LayoutBuilder
// ==========================================
pub struct LayoutBuilder {
    width: f32,
    height: f32,
    ops: Vec<DrawOp>,
}

impl Default for LayoutBuilder {
    fn default() -> Self {
        Self::new(PAGE_WIDTH_MM, PAGE_HEIGHT_MM)
    }
}

impl LayoutBuilder {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    pub fn page_width(&self) -> f32 {
        self.width
    }

    pub fn text(&mut self, x: f32, y: f32, size: f32, style: FontStyle, text: impl Into<String>) {
        self.ops.push(DrawOp::Text {
            x,
            y,
            size,
            style,
            text: text.into(),
        });
    }

    /// 右对齐文字 (right 为右边界)
    pub fn text_right(
        &mut self,
        right: f32,
        y: f32,
        size: f32,
        style: FontStyle,
        text: impl Into<String>,
    ) {
        let text = text.into();
        let x = right - text_width_mm(&text, size, style);
        self.text(x, y, size, style, text);
    }

    /// 折行文字, 返回最后一行基线
    pub fn wrapped_text(
        &mut self,
        x: f32,
        y: f32,
        size: f32,
        style: FontStyle,
        text: &str,
        max_width: f32,
        line_height: f32,
    ) -> f32 {
        let mut baseline = y;
        for (i, line) in wrap_text(text, size, style, max_width).into_iter().enumerate() {
            baseline = y + i as f32 * line_height;
            self.text(x, baseline, size, style, line);
        }
        baseline
    }

    pub fn rule(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.ops.push(DrawOp::Rule { x1, y1, x2, y2 });
    }

    pub fn logo(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.ops.push(DrawOp::Logo {
            x,
            y,
            width,
            height,
        });
    }

    /// 两列表格 (名称 | 金额), 末行为加粗合计; 返回表格底边
    pub fn table(&mut self, spec: TableSpec<'_>) -> f32 {
        let rh = TABLE_ROW_HEIGHT_MM;
        let size = TABLE_FONT_SIZE;
        let left = spec.x;
        let right = spec.x + spec.width;
        let pad = 2.0;
        let baseline = rh * 0.72;

        let mut top = spec.y;
        self.rule(left, top, right, top);
        self.text(left + pad, top + baseline, size, FontStyle::Bold, spec.head.0);
        self.text_right(right - pad, top + baseline, size, FontStyle::Bold, spec.head.1);
        top += rh;
        self.rule(left, top, right, top);

        for (label, amount) in spec.rows {
            self.text(left + pad, top + baseline, size, FontStyle::Regular, label);
            self.text_right(right - pad, top + baseline, size, FontStyle::Regular, amount);
            top += rh;
        }

        self.rule(left, top, right, top);
        self.text(left + pad, top + baseline, size, FontStyle::Bold, spec.total.0);
        self.text_right(right - pad, top + baseline, size, FontStyle::Bold, spec.total.1);
        top += rh;
        self.rule(left, top, right, top);
        top
    }

    /// 试排测量 + 统一缩放
    pub fn finish(self) -> PageLayout {
        let mut layout = PageLayout {
            width: self.width,
            height: self.height,
            scale: 1.0,
            ops: self.ops,
        };
        let limit = layout.height - BOTTOM_MARGIN_MM;
        let bottom = layout.content_bottom();
        if bottom > limit {
            let k = limit / bottom;
            layout.scale = k;
            layout.ops = layout.ops.into_iter().map(|op| op.scaled(k)).collect();
        }
        layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_width_scales_with_size() {
        let w8 = text_width_mm("Rp1.000.000", 8.0, FontStyle::Regular);
        let w16 = text_width_mm("Rp1.000.000", 16.0, FontStyle::Regular);
        assert!((w16 - 2.0 * w8).abs() < 1e-4);
        assert!(text_width_mm("", 10.0, FontStyle::Bold) == 0.0);
    }

    #[test]
    fn test_wrap_text() {
        let lines = wrap_text("Jl. Merdeka No. 1 Kota Baru", 9.0, FontStyle::Regular, 20.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), "Jl. Merdeka No. 1 Kota Baru");
        assert_eq!(wrap_text("", 9.0, FontStyle::Regular, 20.0), Vec::<String>::new());
    }

    #[test]
    fn test_right_aligned_text_ends_at_edge() {
        let mut b = LayoutBuilder::default();
        b.text_right(277.0, 14.0, 12.0, FontStyle::Bold, "SLIP GAJI");
        let layout = b.finish();
        let DrawOp::Text { x, size, style, text, .. } = &layout.ops[0] else {
            panic!("expected text op");
        };
        let end = x + text_width_mm(text, *size, *style);
        assert!((end - 277.0).abs() < 1e-3);
    }

    #[test]
    fn test_table_height() {
        let mut b = LayoutBuilder::default();
        let bottom = b.table(TableSpec {
            x: 20.0,
            y: 55.0,
            width: 122.0,
            head: ("Pendapatan", "Jumlah (Rp)"),
            rows: vec![("A".into(), "1".into()), ("B".into(), "2".into())],
            total: ("Total", "3".into()),
        });
        assert!((bottom - (55.0 + 4.0 * TABLE_ROW_HEIGHT_MM)).abs() < 1e-4);
    }

    #[test]
    fn test_overflowing_content_is_scaled_to_fit() {
        let mut b = LayoutBuilder::default();
        b.text(20.0, 10.0, 10.0, FontStyle::Regular, "top");
        b.text(20.0, 400.0, 10.0, FontStyle::Regular, "bottom");
        let layout = b.finish();
        assert!((layout.scale - 0.5).abs() < 1e-4);
        assert!((layout.content_bottom() - 200.0).abs() < 1e-3);
        let DrawOp::Text { size, .. } = &layout.ops[0] else {
            panic!("expected text op");
        };
        assert!((size - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_fitting_content_is_not_scaled() {
        let mut b = LayoutBuilder::default();
        b.text(20.0, 190.0, 10.0, FontStyle::Regular, "footer");
        assert_eq!(b.finish().scale, 1.0);
    }
}
