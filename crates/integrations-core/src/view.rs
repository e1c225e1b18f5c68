//! Decides how a loaded payload is presented.
//!
//! Non-empty arrays become a table keyed by the first element's fields; every
//! other shape, including nothing at all, is shown as pretty-printed JSON.

use itertools::Itertools;
use serde_json::ser::{Formatter, PrettyFormatter, Serializer};
use serde_json::{Number, Value};
use std::io;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataView {
    Loading,
    Table(TableView),
    Text(String),
}

impl DataView {
    pub fn from_state(loading: bool, data: Option<&Value>) -> Self {
        if loading {
            return Self::Loading;
        }

        match data {
            Some(Value::Array(records)) if !records.is_empty() => {
                Self::Table(TableView::from_records(records))
            }
            _ => Self::Text(pretty_text(data)),
        }
    }
}

impl TableView {
    pub fn from_records(records: &[Value]) -> Self {
        let columns = records.first().map(record_keys).unwrap_or_default();

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|key| match field(record, key) {
                        Some(value) => display_string(value),
                        None => "undefined".to_string(),
                    })
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }
}

/// Two-space indented JSON, or an empty string when nothing is loaded.
pub fn pretty_text(data: Option<&Value>) -> String {
    let Some(value) = data else {
        return String::new();
    };

    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, BrowserFormatter::default());
    if serde::Serialize::serialize(value, &mut serializer).is_err() {
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}

/// Pretty formatter that writes floats in browser number notation.
#[derive(Default)]
struct BrowserFormatter {
    pretty: PrettyFormatter<'static>,
}

impl Formatter for BrowserFormatter {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object_value(writer)
    }

    fn write_f64<W: ?Sized + io::Write>(&mut self, writer: &mut W, value: f64) -> io::Result<()> {
        writer.write_all(browser_float(value).as_bytes())
    }
}

fn number_string(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() => browser_float(f),
        _ => n.to_string(),
    }
}

/// Integral floats drop their fraction; very large and very small
/// magnitudes use exponent form with an explicit sign.
fn browser_float(f: f64) -> String {
    if f == 0.0 {
        return "0".to_string();
    }

    let magnitude = f.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        let exp = format!("{:e}", f);
        return match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
            _ => exp,
        };
    }

    if f.fract() == 0.0 {
        format!("{:.0}", f)
    } else {
        f.to_string()
    }
}

/// Own keys of a record in enumeration order. Arrays enumerate their indices;
/// scalars have no keys.
fn record_keys(record: &Value) -> Vec<String> {
    match record {
        Value::Object(map) => map.keys().cloned().collect(),
        Value::Array(items) => (0..items.len()).map(|i| i.to_string()).collect(),
        _ => Vec::new(),
    }
}

fn field<'a>(record: &'a Value, key: &str) -> Option<&'a Value> {
    match record {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Coerces a cell value the way a browser stringifies it.
pub fn display_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_string(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => display_string(other),
            })
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}
