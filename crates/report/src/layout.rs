use chrono::{DateTime, Utc};
use equipment_stats::Summary;

use crate::REPORT_TITLE;

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;

const MARGIN_X: f32 = 100.0;
const ENTRY_X: f32 = 120.0;
const LINE_STEP: f32 = 20.0;
const FOOTER_Y: f32 = 50.0;
// lowest baseline a distribution entry may use before continuing on a new page
const MIN_ENTRY_Y: f32 = FOOTER_Y + 2.0 * LINE_STEP;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
    Oblique,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    /// `x` is the horizontal center of the text
    Center,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextLine {
    pub page: usize,
    pub x: f32,
    pub y: f32,
    pub font: Font,
    pub size: f32,
    pub align: Align,
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReportLayout {
    pub pages: usize,
    pub lines: Vec<TextLine>,
}

impl ReportLayout {
    /// Visible text in drawing order.
    pub fn text(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.text.as_str())
    }

    pub fn page(&self, page: usize) -> impl Iterator<Item = &TextLine> {
        self.lines.iter().filter(move |l| l.page == page)
    }

    fn push(&mut self, page: usize, x: f32, y: f32, font: Font, size: f32, text: impl Into<String>) {
        self.lines.push(TextLine { page, x, y, font, size, align: Align::Left, text: text.into() });
    }
}

/// Lay out the fixed report template.
///
/// Title, the four statistics, the type distribution sorted by label and a
/// footer with `generated_at`. Distribution entries that would run into the
/// footer continue on further pages; every page gets the footer.
pub fn layout(summary: &Summary, generated_at: DateTime<Utc>) -> ReportLayout {
    let mut out = ReportLayout { pages: 1, lines: Vec::new() };

    out.lines.push(TextLine {
        page: 0,
        x: PAGE_WIDTH / 2.0,
        y: PAGE_HEIGHT - 50.0,
        font: Font::Bold,
        size: 16.0,
        align: Align::Center,
        text: REPORT_TITLE.to_string(),
    });

    let mut y = PAGE_HEIGHT - 100.0;
    out.push(0, MARGIN_X, y, Font::Regular, 12.0, "Summary Statistics:");
    y -= 30.0;

    let stats = [
        format!("Total Equipment Count: {}", summary.total_count),
        format!("Average Flowrate: {:.2}", summary.avg_flowrate),
        format!("Average Pressure: {:.2}", summary.avg_pressure),
        format!("Average Temperature: {:.2}", summary.avg_temperature),
    ];
    for (i, line) in stats.into_iter().enumerate() {
        if i > 0 {
            y -= LINE_STEP;
        }
        out.push(0, MARGIN_X, y, Font::Regular, 12.0, line);
    }

    y -= 40.0;
    out.push(0, MARGIN_X, y, Font::Regular, 12.0, "Equipment Type Distribution:");
    y -= LINE_STEP;

    let mut page = 0;
    for (label, count) in summary.distribution_sorted() {
        if y < MIN_ENTRY_Y {
            page += 1;
            y = PAGE_HEIGHT - 50.0;
            out.push(page, MARGIN_X, y, Font::Regular, 12.0, "Equipment Type Distribution (continued):");
            y -= LINE_STEP;
        }
        out.push(page, ENTRY_X, y, Font::Regular, 12.0, format!("{label}: {count}"));
        y -= LINE_STEP;
    }
    out.pages = page + 1;

    let footer = format!("Generated on: {}", generated_at.format("%Y-%m-%d %H:%M:%S"));
    for p in 0..out.pages {
        out.push(p, MARGIN_X, FOOTER_Y, Font::Oblique, 10.0, footer.clone());
    }

    out
}
