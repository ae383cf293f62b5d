//! Line protocol output for device rows.
//!
//! One row becomes one line in InfluxDB line protocol, so the capture can be
//! piped straight into Telegraf or similar collectors.

use crate::output::RowFormatter;
use crate::proximity;
use crate::window::DeviceRow;
use std::collections::BTreeMap;
use std::fmt;

/// Default measurement name.
pub const DEFAULT_MEASUREMENT: &str = "ble_device";

/// Field values for line protocol
#[derive(Debug, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    String(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldValue::Float(num) => write!(f, "{num}"),
            FieldValue::Integer(num) => write!(f, "{num}i"),
            FieldValue::String(s) => write!(f, "\"{}\"", escape_field(s)),
        }
    }
}

/// Data point in line protocol
#[derive(Debug)]
pub struct DataPoint {
    pub measurement: String,
    pub tag_set: BTreeMap<String, String>,
    pub field_set: BTreeMap<String, FieldValue>,
    /// Nanoseconds, written verbatim
    pub timestamp: Option<i64>,
}

/// Escape commas, spaces and equals signs in measurement names, tag keys and
/// tag values.
fn escape_tag(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, ',' | ' ' | '=') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn escape_field(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn fmt_tags(data_point: &DataPoint, fmt: &mut fmt::Formatter) -> fmt::Result {
    for (key, value) in data_point.tag_set.iter() {
        write!(fmt, ",{}={}", escape_tag(key), escape_tag(value))?;
    }
    Ok(())
}

fn fmt_fields(data_point: &DataPoint, fmt: &mut fmt::Formatter) -> fmt::Result {
    let mut first = true;
    for (key, value) in data_point.field_set.iter() {
        if first {
            first = false;
        } else {
            write!(fmt, ",")?;
        }
        write!(fmt, "{}={}", escape_tag(key), value)?;
    }
    Ok(())
}

impl fmt::Display for DataPoint {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", escape_tag(&self.measurement))?;
        fmt_tags(self, fmt)?;
        write!(fmt, " ")?;
        fmt_fields(self, fmt)?;
        if let Some(nanos) = self.timestamp {
            write!(fmt, " {nanos}")?;
        }
        Ok(())
    }
}

/// Line protocol formatter for [`DeviceRow`]s.
///
/// Empty tag values are left out since line protocol does not allow them.
/// The distance field is omitted when no estimate is available.
#[derive(Debug, Clone)]
pub struct LineFormatter {
    measurement_name: String,
}

impl Default for LineFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_MEASUREMENT.to_string())
    }
}

impl LineFormatter {
    pub fn new(measurement_name: String) -> Self {
        Self { measurement_name }
    }

    fn tag_set(&self, row: &DeviceRow) -> BTreeMap<String, String> {
        let mut tags = BTreeMap::new();
        let mut add = |name: &str, value: &str| {
            if !value.is_empty() {
                tags.insert(name.to_string(), value.to_string());
            }
        };

        add("key", &row.key);
        add("mac", &row.mac);
        if let Some(vendor) = row.vendor.label() {
            add("vendor", vendor);
        }
        if let Some(source) = row.vendor.source() {
            add("vendor_source", source);
        }
        tags
    }

    fn field_set(&self, row: &DeviceRow) -> BTreeMap<String, FieldValue> {
        let mut fields = BTreeMap::new();
        fields.insert("rssi".into(), FieldValue::Integer(i64::from(row.rssi)));
        if proximity::is_available(row.estimated_meters) {
            fields.insert("distance".into(), FieldValue::Float(row.estimated_meters));
        }
        fields.insert(
            "age".into(),
            FieldValue::Integer(i64::try_from(row.age_secs).unwrap_or(i64::MAX)),
        );
        fields.insert("title".into(), FieldValue::String(row.title.clone()));
        if !row.service_names.is_empty() {
            fields.insert(
                "services".into(),
                FieldValue::String(row.service_names.join(",")),
            );
        }
        if let Some(payload) = &row.payload_hex {
            fields.insert("payload".into(), FieldValue::String(payload.clone()));
        }
        fields
    }

    fn to_data_point(&self, row: &DeviceRow, timestamp: Option<i64>) -> DataPoint {
        DataPoint {
            measurement: self.measurement_name.clone(),
            tag_set: self.tag_set(row),
            field_set: self.field_set(row),
            timestamp,
        }
    }
}

impl RowFormatter for LineFormatter {
    fn format(&self, row: &DeviceRow, timestamp_nanos: Option<i64>) -> String {
        self.to_data_point(row, timestamp_nanos).to_string()
    }
}
