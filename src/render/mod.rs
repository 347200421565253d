// ==========================================
// 薪资单分发系统 - 渲染层
// ==========================================
// 职责: FlatRow → 单页工资条 PDF
// 组成: 货币格式 / 金额大写 / 布局模型 / PDF 输出
// ==========================================

pub mod currency;
pub mod error;
pub mod layout;
pub mod pdf_writer;
pub mod slip_renderer;
pub mod terbilang;

pub use currency::format_rupiah;
pub use error::{RenderError, RenderResult};
pub use layout::{DrawOp, FontStyle, LayoutBuilder, PageLayout};
pub use slip_renderer::{format_print_date, PayslipRenderer, RenderOptions, SlipContent};
pub use terbilang::{amount_in_words, to_words};
