//! Purpose: Load the dataset from JSON records (array form or JSON Lines).
//! Exports: `read_records`, `RecordsLayout`.
//! Role: Loader backend for `.json` / `.jsonl` exports (e.g. pandas `orient="records"`).
//! Invariants: Column order is the key order of the first record.
//! Invariants: Every record must carry exactly the first record's key set.
//! Notes: Positions in errors are 1-based record indexes, not byte offsets.

use std::fmt;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::Value as JsonValue;

use super::error::{Error, ErrorKind};
use super::table::{Table, TableBuilder, Value, whole_number};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RecordsLayout {
    /// A single top-level array of objects.
    Array,
    /// One object per line (whitespace separated).
    Lines,
}

/// A JSON object with its keys kept in document order.
struct OrderedRecord(Vec<(String, JsonValue)>);

impl<'de> Deserialize<'de> for OrderedRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = OrderedRecord;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<OrderedRecord, A::Error> {
                let mut fields = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, JsonValue>()? {
                    fields.push((key, value));
                }
                Ok(OrderedRecord(fields))
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

pub fn read_records(text: &str, layout: RecordsLayout) -> Result<Table, Error> {
    let records = match layout {
        RecordsLayout::Array => serde_json::from_str::<Vec<OrderedRecord>>(text)
            .map_err(|err| parse_error(err, None))?,
        RecordsLayout::Lines => {
            let mut records = Vec::new();
            let stream = serde_json::Deserializer::from_str(text).into_iter::<OrderedRecord>();
            for (index, record) in stream.enumerate() {
                records.push(record.map_err(|err| parse_error(err, Some(index + 1)))?);
            }
            records
        }
    };

    let mut records = records.into_iter().enumerate();
    let Some((_, first)) = records.next() else {
        return Err(Error::new(ErrorKind::Corrupt).with_message("dataset has no records"));
    };
    let columns: Vec<String> = first.0.iter().map(|(key, _)| key.clone()).collect();
    let mut builder = TableBuilder::new(columns.clone()).map_err(|err| err.with_line(1))?;
    builder.push_row(to_row(&columns, first, 1)?)?;
    for (index, record) in records {
        let position = index + 1;
        builder
            .push_row(to_row(&columns, record, position)?)
            .map_err(|err| err.with_line(position))?;
    }
    Ok(builder.finish())
}

fn parse_error(err: serde_json::Error, position: Option<usize>) -> Error {
    let err = Error::new(ErrorKind::Corrupt)
        .with_message(format!("invalid JSON records: {err}"))
        .with_source(err);
    match position {
        Some(position) => err.with_line(position),
        None => err,
    }
}

fn to_row(columns: &[String], record: OrderedRecord, position: usize) -> Result<Vec<Value>, Error> {
    let mut fields = record.0;
    if fields.len() != columns.len() {
        return Err(Error::new(ErrorKind::Corrupt)
            .with_message(format!(
                "record has {} keys, expected {}",
                fields.len(),
                columns.len()
            ))
            .with_line(position));
    }

    let mut row = Vec::with_capacity(columns.len());
    for column in columns {
        let Some(index) = fields.iter().position(|(key, _)| key == column) else {
            return Err(Error::new(ErrorKind::Corrupt)
                .with_message(format!("record is missing key `{column}`"))
                .with_line(position));
        };
        let (_, value) = fields.swap_remove(index);
        row.push(to_value(column, value).map_err(|err| err.with_line(position))?);
    }
    Ok(row)
}

fn to_value(column: &str, value: JsonValue) -> Result<Value, Error> {
    match value {
        JsonValue::Null => Ok(Value::Null),
        JsonValue::String(text) => Ok(Value::Text(text)),
        JsonValue::Number(number) => {
            if let Some(int) = number.as_i64() {
                return Ok(Value::Int(int));
            }
            match number.as_f64().and_then(whole_number) {
                Some(int) => Ok(Value::Int(int)),
                None => Ok(Value::Text(number.to_string())),
            }
        }
        JsonValue::Bool(flag) => Ok(Value::Text(flag.to_string())),
        JsonValue::Array(_) | JsonValue::Object(_) => Err(Error::new(ErrorKind::Corrupt)
            .with_message(format!("column `{column}` holds a nested value"))),
    }
}
