use tracing::warn;

use crate::protocol::StatusResponse;
use crate::temperature::wire_to_fahrenheit;
use crate::types::TemperatureUnit;
use crate::{Error, Result};

/// One immutable status read: column names with their values, in the order
/// the device sent them. Lookups are by exact, case-sensitive name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    columns: Vec<String>,
    values: Vec<i32>,
}

impl StatusSnapshot {
    pub fn new(columns: Vec<String>, values: Vec<i32>) -> Result<Self> {
        if columns.len() != values.len() {
            return Err(Error::MalformedPack(format!(
                "{} status columns but {} values",
                columns.len(),
                values.len()
            )));
        }
        Ok(Self { columns, values })
    }

    pub fn from_response(resp: StatusResponse) -> Result<Self> {
        Self::new(resp.cols, resp.dat)
    }

    pub fn get(&self, field: &str) -> Option<i32> {
        self.position(field).map(|i| self.values[i])
    }

    pub fn contains(&self, field: &str) -> bool {
        self.position(field).is_some()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[i32] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> + '_ {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn unit(&self) -> Option<TemperatureUnit> {
        self.get("TemUn").and_then(TemperatureUnit::from_wire)
    }

    /// Copy with `field` set to `value`. Absent fields are left absent.
    pub fn with_value(&self, field: &str, value: i32) -> Self {
        let mut next = self.clone();
        if let Some(i) = next.position(field) {
            next.values[i] = value;
        }
        next
    }

    /// The snapshot as a user sees it: when the unit is Fahrenheit, `SetTem`
    /// is converted back from the Celsius the device reports.
    pub fn displayed(&self) -> Self {
        let (Some(unit), Some(set_tem), Some(tem_rec)) =
            (self.get("TemUn"), self.get("SetTem"), self.get("TemRec"))
        else {
            warn!("SetTem, TemUn or TemRec missing, not converting set point");
            return self.clone();
        };
        if TemperatureUnit::from_wire(unit) == Some(TemperatureUnit::Fahrenheit) {
            self.with_value("SetTem", wire_to_fahrenheit(set_tem, tem_rec))
        } else {
            self.clone()
        }
    }

    fn position(&self, field: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == field)
    }
}

/// The latest snapshot and the one it replaced.
#[derive(Debug, Clone, Default)]
pub struct StatusHistory {
    previous: Option<StatusSnapshot>,
    current: Option<StatusSnapshot>,
}

impl StatusHistory {
    pub fn push(&mut self, snapshot: StatusSnapshot) {
        self.previous = self.current.replace(snapshot);
    }

    pub fn current(&self) -> Option<&StatusSnapshot> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&StatusSnapshot> {
        self.previous.as_ref()
    }
}
