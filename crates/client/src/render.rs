//! Plain-text tables for terminal output.

use std::collections::BTreeMap;

use equipment_stats::Summary;

use crate::HistoryEntry;

pub fn summary_table(s: &Summary) -> String {
    let rows = [
        ("Total Count", s.total_count.to_string()),
        ("Avg Flowrate", format!("{:.2}", s.avg_flowrate)),
        ("Avg Pressure", format!("{:.2}", s.avg_pressure)),
        ("Avg Temperature", format!("{:.2}", s.avg_temperature)),
        ("Type Distribution", distribution_inline(&s.type_distribution)),
    ];
    table(
        &["Statistic", "Value"],
        rows.iter().map(|(k, v)| vec![k.to_string(), v.clone()]).collect(),
    )
}

pub fn history_table(entries: &[HistoryEntry]) -> String {
    let rows = entries
        .iter()
        .map(|e| {
            vec![
                e.id.to_string(),
                e.upload_date.clone(),
                e.total_count.to_string(),
                format!("{:.2}", e.avg_flowrate),
                format!("{:.2}", e.avg_pressure),
                format!("{:.2}", e.avg_temperature),
                distribution_inline(&e.type_distribution),
            ]
        })
        .collect();
    table(
        &["ID", "Upload Date", "Total Count", "Avg Flowrate", "Avg Pressure", "Avg Temperature", "Type Distribution"],
        rows,
    )
}

fn distribution_inline(dist: &BTreeMap<String, u64>) -> String {
    dist.iter().map(|(k, v)| format!("{k}: {v}")).collect::<Vec<_>>().join(", ")
}

fn table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(headers.to_vec()));
    out.push('\n');
    out.push_str(&widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-"));
    out.push('\n');
    for row in &rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> Summary {
        Summary {
            total_count: 4,
            avg_flowrate: 15.0,
            avg_pressure: 6.0,
            avg_temperature: 21.0,
            type_distribution: BTreeMap::from([("Pump".to_string(), 3), ("Valve".to_string(), 1)]),
        }
    }

    #[test]
    fn test_summary_table() {
        let t = summary_table(&summary());
        let lines: Vec<&str> = t.lines().collect();
        assert_eq!(lines[0], "Statistic         | Value");
        assert!(lines[1].starts_with("------------------+-"));
        assert_eq!(lines[2], "Total Count       | 4");
        assert_eq!(lines[3], "Avg Flowrate      | 15.00");
        assert_eq!(lines[6], "Type Distribution | Pump: 3, Valve: 1");
    }

    #[test]
    fn test_history_table_has_row_per_entry() {
        let e = HistoryEntry {
            id: 7,
            upload_date: "2026-10-19T08:00:00+00:00".to_string(),
            total_count: 4,
            avg_flowrate: 1.5,
            avg_pressure: 2.25,
            avg_temperature: 3.0,
            type_distribution: BTreeMap::from([("Pump".to_string(), 4)]),
        };
        let t = history_table(&[e.clone(), HistoryEntry { id: 6, ..e }]);
        assert_eq!(t.lines().count(), 4);
        assert!(t.lines().nth(2).unwrap().starts_with("7  | 2026-10-19T08:00:00+00:00 | 4"));
        assert!(t.contains("| 2.25 "));
    }
}
