// ==========================================
// 薪资单分发系统 - PDF 输出
// ==========================================
// 职责: PageLayout → PDF 字节 (printpdf)
// 坐标: 布局原点左上, PDF 原点左下 → y' = height - y
// Logo 无法解码时降级为无 Logo (不中断)
// ==========================================

use crate::render::error::RenderResult;
use crate::render::layout::{DrawOp, FontStyle, PageLayout};
use printpdf::image_crate::{self, GenericImageView};
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point,
};
use tracing::warn;

struct FontSet {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    oblique: IndirectFontRef,
    times_italic: IndirectFontRef,
}

impl FontSet {
    fn load(doc: &PdfDocumentReference) -> RenderResult<Self> {
        Ok(Self {
            regular: doc.add_builtin_font(BuiltinFont::Helvetica)?,
            bold: doc.add_builtin_font(BuiltinFont::HelveticaBold)?,
            oblique: doc.add_builtin_font(BuiltinFont::HelveticaOblique)?,
            times_italic: doc.add_builtin_font(BuiltinFont::TimesItalic)?,
        })
    }

    fn get(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Oblique => &self.oblique,
            FontStyle::TimesItalic => &self.times_italic,
        }
    }
}

/// 输出单页 PDF
pub fn write_pdf(layout: &PageLayout, title: &str, logo: Option<&[u8]>) -> RenderResult<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new(
        title,
        Mm(layout.width),
        Mm(layout.height),
        "slip",
    );
    let fonts = FontSet::load(&doc)?;
    let layer = doc.get_page(page).get_layer(layer);
    let h = layout.height;

    layer.set_outline_thickness(0.3);
    for op in &layout.ops {
        match op {
            DrawOp::Text {
                x,
                y,
                size,
                style,
                text,
            } => {
                layer.use_text(text.clone(), *size, Mm(*x), Mm(h - y), fonts.get(*style));
            }
            DrawOp::Rule { x1, y1, x2, y2 } => {
                layer.add_line(Line {
                    points: vec![
                        (Point::new(Mm(*x1), Mm(h - y1)), false),
                        (Point::new(Mm(*x2), Mm(h - y2)), false),
                    ],
                    is_closed: false,
                });
            }
            DrawOp::Logo {
                x,
                y,
                width,
                height,
            } => {
                if let Some(bytes) = logo {
                    place_logo(&layer, bytes, *x, h - (y + height), *width, *height);
                }
            }
        }
    }

    Ok(doc.save_to_bytes()?)
}

/// 按比例缩放至框内 (左下角定位)
fn place_logo(layer: &PdfLayerReference, bytes: &[u8], x: f32, y: f32, width: f32, height: f32) {
    let decoded = match image_crate::load_from_memory(bytes) {
        Ok(img) => img,
        Err(e) => {
            warn!(error = %e, "Logo 无法解码, 已忽略");
            return;
        }
    };
    let (w_px, h_px) = decoded.dimensions();
    let (px_w, px_h) = (w_px as f32, h_px as f32);
    if px_w == 0.0 || px_h == 0.0 {
        warn!("Logo 尺寸为 0, 已忽略");
        return;
    }
    // 选取 dpi 使较长边恰好落在框内
    let dpi = (px_w * 25.4 / width).max(px_h * 25.4 / height);

    Image::from_dynamic_image(&decoded).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(y)),
            dpi: Some(dpi),
            ..Default::default()
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::layout::LayoutBuilder;

    fn sample_layout() -> PageLayout {
        let mut b = LayoutBuilder::default();
        b.logo(15.0, 8.0, 20.0, 20.0);
        b.text(40.0, 14.0, 12.0, FontStyle::Bold, "PT Contoh");
        b.rule(15.0, 28.0, 282.0, 28.0);
        b.finish()
    }

    #[test]
    fn test_write_pdf_produces_pdf_bytes() {
        let bytes = write_pdf(&sample_layout(), "Slip", None).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_invalid_logo_is_ignored() {
        let bytes = write_pdf(&sample_layout(), "Slip", Some(b"not an image")).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
