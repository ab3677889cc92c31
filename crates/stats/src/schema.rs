use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Header every upload must carry, in this order.
pub const REQUIRED_COLUMNS: [&str; 5] = ["Equipment Name", "Type", "Flowrate", "Pressure", "Temperature"];

/// One accepted CSV row.
#[derive(Clone, Debug, PartialEq)]
pub struct EquipmentRow {
    pub name: String,
    pub equipment_type: String,
    pub flowrate: f64,
    pub pressure: f64,
    pub temperature: f64,
}

impl EquipmentRow {
    pub fn new(
        name: impl Into<String>,
        equipment_type: impl Into<String>,
        flowrate: f64,
        pressure: f64,
        temperature: f64,
    ) -> Self {
        Self {
            name: name.into(),
            equipment_type: equipment_type.into(),
            flowrate,
            pressure,
            temperature,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_count: u64,
    pub avg_flowrate: f64,            // rounded to 2 decimals
    pub avg_pressure: f64,
    pub avg_temperature: f64,
    pub type_distribution: BTreeMap<String, u64>,
}

impl Summary {
    /// Type labels with counts, sorted by label.
    pub fn distribution_sorted(&self) -> impl Iterator<Item = (&str, u64)> {
        self.type_distribution.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
