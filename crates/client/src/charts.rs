//! SVG charts for the latest summary: type distribution pie and averages bar chart.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use equipment_stats::Summary;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::{ClientError, Result};

pub const DISTRIBUTION_FILE: &str = "type_distribution.svg";
pub const AVERAGES_FILE: &str = "average_measurements.svg";

const SIZE: (u32, u32) = (600, 500);

const PALETTE: [RGBColor; 6] = [
    RGBColor(0xFF, 0x63, 0x84),
    RGBColor(0x36, 0xA2, 0xEB),
    RGBColor(0xFF, 0xCE, 0x56),
    RGBColor(0x4B, 0xC0, 0xC0),
    RGBColor(0x99, 0x66, 0xFF),
    RGBColor(0xFF, 0x9F, 0x40),
];

const AVERAGE_LABELS: [&str; 3] = ["Flowrate", "Pressure", "Temp"];

fn chart_err<E: std::fmt::Display>(e: E) -> ClientError {
    ClientError::Chart(e.to_string())
}

/// Write both charts into `out_dir`, creating it if needed.
pub fn write_charts(summary: &Summary, out_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)?;

    let pie = out_dir.join(DISTRIBUTION_FILE);
    draw_distribution_pie(&summary.type_distribution, &pie)?;
    let bars = out_dir.join(AVERAGES_FILE);
    draw_averages_bar(summary, &bars)?;

    Ok(vec![pie, bars])
}

/// Slice sizes, labels and colors in label order; colors cycle through the palette.
pub fn pie_slices(dist: &BTreeMap<String, u64>) -> (Vec<f64>, Vec<String>, Vec<RGBColor>) {
    let sizes = dist.values().map(|&n| n as f64).collect();
    let labels = dist.keys().cloned().collect();
    let colors = (0..dist.len()).map(|i| PALETTE[i % PALETTE.len()]).collect();
    (sizes, labels, colors)
}

/// Top of the value axis: 15% headroom over the largest bar, at least 1.
pub fn bar_upper_limit(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    (max * 1.15).max(1.0)
}

pub fn draw_distribution_pie(dist: &BTreeMap<String, u64>, path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;
    let root = root
        .titled("Equipment Type Distribution", ("sans-serif", 22))
        .map_err(chart_err)?;

    let total: u64 = dist.values().sum();
    if total == 0 {
        let (w, h) = root.dim_in_pixel();
        let style = TextStyle::from(("sans-serif", 16).into_font())
            .color(&RGBColor(0x80, 0x80, 0x80))
            .pos(Pos::new(HPos::Center, VPos::Center));
        root.draw(&Text::new(
            "No equipment types to display (upload data first)",
            (w as i32 / 2, h as i32 / 2),
            style,
        ))
        .map_err(chart_err)?;
        return root.present().map_err(chart_err);
    }

    let (sizes, labels, colors) = pie_slices(dist);
    let (w, h) = root.dim_in_pixel();
    let center = (w as i32 / 2, h as i32 / 2);
    let radius = f64::from(w.min(h)) * 0.35;

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.start_angle(-90.0);
    pie.label_style(("sans-serif", 14).into_font());
    pie.percentages(("sans-serif", 12).into_font().color(&BLACK));
    root.draw(&pie).map_err(chart_err)?;

    root.present().map_err(chart_err)
}

pub fn draw_averages_bar(summary: &Summary, path: &Path) -> Result<()> {
    let values = [summary.avg_flowrate, summary.avg_pressure, summary.avg_temperature];
    let upper = bar_upper_limit(&values);

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Average Measurements", ("sans-serif", 22).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d((0u32..3u32).into_segmented(), 0f64..upper)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .y_desc("Value")
        .x_label_formatter(&|x| match x {
            SegmentValue::CenterOf(i) => AVERAGE_LABELS.get(*i as usize).copied().unwrap_or("").to_string(),
            _ => String::new(),
        })
        .draw()
        .map_err(chart_err)?;

    let bar_color = PALETTE[1];
    chart
        .draw_series(values.iter().enumerate().map(|(i, &v)| {
            let i = i as u32;
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), v.max(0.0))],
                bar_color.filled(),
            );
            bar.set_margin(0, 0, 20, 20);
            bar
        }))
        .map_err(chart_err)?;

    chart
        .draw_series(values.iter().enumerate().map(|(i, &v)| {
            Text::new(
                format!("{v:.2}"),
                (SegmentValue::CenterOf(i as u32), v.max(0.0) + 0.02 * upper),
                ("sans-serif", 14).into_font(),
            )
        }))
        .map_err(chart_err)?;

    root.present().map_err(chart_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pie_slices_follow_label_order() {
        let dist = BTreeMap::from([("Valve".to_string(), 1), ("Pump".to_string(), 3)]);
        let (sizes, labels, colors) = pie_slices(&dist);

        assert_eq!(labels, vec!["Pump", "Valve"]);
        assert_eq!(sizes, vec![3.0, 1.0]);
        assert_eq!(colors, vec![PALETTE[0], PALETTE[1]]);
    }

    #[test]
    fn test_pie_colors_cycle() {
        let dist: BTreeMap<String, u64> = (0..8).map(|i| (format!("T{i}"), 1)).collect();
        let (_, _, colors) = pie_slices(&dist);
        assert_eq!(colors[6], PALETTE[0]);
        assert_eq!(colors[7], PALETTE[1]);
    }

    #[test]
    fn test_bar_upper_limit() {
        assert_eq!(bar_upper_limit(&[10.0, 20.0, 5.0]), 20.0 * 1.15);
        assert_eq!(bar_upper_limit(&[0.1, 0.2, 0.0]), 1.0);
        assert_eq!(bar_upper_limit(&[]), 1.0);
    }
}
