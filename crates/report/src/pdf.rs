use chrono::{DateTime, Utc};
use equipment_stats::Summary;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument};

use crate::{layout, Align, Font, ReportError, ReportLayout, Result, REPORT_TITLE};

const MM_PER_PT: f32 = 25.4 / 72.0;

// builtin fonts carry no metrics here; average glyph width in em
const AVG_GLYPH_EM: f32 = 0.56;

fn mm(pt: f32) -> Mm {
    Mm(pt * MM_PER_PT)
}

fn pdf_err<E: std::fmt::Debug>(e: E) -> ReportError {
    ReportError::Pdf(format!("{e:?}"))
}

/// Lay out and draw the report for `summary`.
pub fn render(summary: &Summary, generated_at: DateTime<Utc>) -> Result<Vec<u8>> {
    render_layout(&layout(summary, generated_at))
}

pub fn render_layout(report: &ReportLayout) -> Result<Vec<u8>> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(REPORT_TITLE, mm(crate::PAGE_WIDTH), mm(crate::PAGE_HEIGHT), "Layer 1");

    let mut pages = vec![(first_page, first_layer)];
    for _ in 1..report.pages.max(1) {
        pages.push(doc.add_page(mm(crate::PAGE_WIDTH), mm(crate::PAGE_HEIGHT), "Layer 1"));
    }

    let fonts = [
        doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?,
        doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_err)?,
        doc.add_builtin_font(BuiltinFont::HelveticaOblique).map_err(pdf_err)?,
    ];

    for line in &report.lines {
        let Some(&(page, layer)) = pages.get(line.page) else {
            return Err(ReportError::Pdf(format!("line on missing page {}", line.page)));
        };
        let x = match line.align {
            Align::Left => line.x,
            Align::Center => line.x - approx_width(&line.text, line.size) / 2.0,
        };

        doc.get_page(page)
            .get_layer(layer)
            .use_text(line.text.as_str(), line.size, mm(x), mm(line.y), pick(&fonts, line.font));
    }

    doc.save_to_bytes().map_err(pdf_err)
}

fn pick(fonts: &[IndirectFontRef; 3], font: Font) -> &IndirectFontRef {
    match font {
        Font::Regular => &fonts[0],
        Font::Bold => &fonts[1],
        Font::Oblique => &fonts[2],
    }
}

fn approx_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * AVG_GLYPH_EM
}
