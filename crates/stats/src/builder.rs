use std::collections::BTreeMap;

use crate::{EquipmentRow, ParseError, Summary};

/// Round to 2 decimals, half away from zero.
///
/// The rule is applied to `value * 100`, so `2.345` (stored as
/// `2.34500000000000019...`) becomes `2.35` and the exactly representable
/// `0.125` becomes `0.13`. Values too large to scale are returned as is.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / 100.0
}

/// Incremental accumulator over accepted rows.
#[derive(Debug, Default)]
pub struct SummaryBuilder {
    count: u64,
    flowrate_sum: f64,
    pressure_sum: f64,
    temperature_sum: f64,
    types: BTreeMap<String, u64>,
}

impl SummaryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `row` to the totals.
    ///
    /// A row that would push any running sum past the `f64` range is refused
    /// and leaves the builder unchanged.
    pub fn push(&mut self, row: &EquipmentRow) -> Result<(), ParseError> {
        let flowrate_sum = checked_sum(self.flowrate_sum, row.flowrate, "Flowrate")?;
        let pressure_sum = checked_sum(self.pressure_sum, row.pressure, "Pressure")?;
        let temperature_sum = checked_sum(self.temperature_sum, row.temperature, "Temperature")?;

        self.count += 1;
        self.flowrate_sum = flowrate_sum;
        self.pressure_sum = pressure_sum;
        self.temperature_sum = temperature_sum;
        *self.types.entry(row.equipment_type.clone()).or_default() += 1;
        Ok(())
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// `None` when no row was pushed; averages are undefined then.
    pub fn finish(self) -> Option<Summary> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;

        Some(Summary {
            total_count: self.count,
            avg_flowrate: round2(self.flowrate_sum / n),
            avg_pressure: round2(self.pressure_sum / n),
            avg_temperature: round2(self.temperature_sum / n),
            type_distribution: self.types,
        })
    }
}

fn checked_sum(sum: f64, value: f64, column: &'static str) -> Result<f64, ParseError> {
    let total = sum + value;
    if total.is_finite() {
        Ok(total)
    } else {
        Err(ParseError::OutOfRange { column, value: value.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(2.345), 2.35);
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(round2(1.0 / 3.0), 0.33);
        assert_eq!(round2(15.0), 15.0);
    }

    #[test]
    fn test_empty_builder_has_no_summary() {
        assert!(SummaryBuilder::new().finish().is_none());
    }

    #[test]
    fn test_builder_means_and_distribution() {
        let rows = vec![
            EquipmentRow::new("P-1", "Pump", 10.0, 5.0, 20.0),
            EquipmentRow::new("V-1", "Valve", 20.0, 7.0, 22.0),
            EquipmentRow::new("P-2", "Pump", 30.0, 6.0, 21.0),
        ];
        let mut b = SummaryBuilder::new();
        for row in &rows {
            b.push(row).unwrap();
        }
        let s = b.finish().unwrap();

        assert_eq!(s.total_count, 3);
        assert_eq!(s.avg_flowrate, 20.0);
        assert_eq!(s.avg_pressure, 6.0);
        assert_eq!(s.avg_temperature, 21.0);
        assert_eq!(s.type_distribution.get("Pump"), Some(&2));
        assert_eq!(s.type_distribution.get("Valve"), Some(&1));
    }

    #[test]
    fn test_half_cent_mean_rounds_up() {
        // mean flowrate = 0.125, exactly representable
        let rows = vec![
            EquipmentRow::new("a", "Pump", 0.25, 1.0, 1.0),
            EquipmentRow::new("b", "Pump", 0.0, 1.0, 1.0),
        ];
        let mut b = SummaryBuilder::new();
        for row in &rows {
            b.push(row).unwrap();
        }
        assert_eq!(b.finish().unwrap().avg_flowrate, 0.13);
    }

    #[test]
    fn test_round2_keeps_huge_values() {
        assert_eq!(round2(1e307), 1e307);
        assert_eq!(round2(-f64::MAX), -f64::MAX);
    }

    #[test]
    fn test_overflowing_row_is_refused() {
        let mut b = SummaryBuilder::new();
        b.push(&EquipmentRow::new("a", "Pump", f64::MAX, 1.0, 1.0)).unwrap();

        let err = b.push(&EquipmentRow::new("b", "Valve", f64::MAX, 1.0, 1.0)).unwrap_err();
        assert!(matches!(err, ParseError::OutOfRange { column: "Flowrate", .. }));
        assert_eq!(b.count(), 1);

        let s = b.finish().unwrap();
        assert_eq!(s.avg_flowrate, f64::MAX);
        assert!(!s.type_distribution.contains_key("Valve"));
    }
}
