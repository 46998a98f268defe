//! Purpose: In-memory, immutable dataset table plus row/record views over it.
//! Exports: `Value`, `Table`, `TableBuilder`, `Row`, `Record`, `Projection`, header/number helpers.
//! Role: Table Store; the only owner of dataset values once loading finishes.
//! Invariants: Every row has exactly one value per column (enforced by `TableBuilder`).
//! Invariants: Row order equals source order; no mutation path exists after `finish`.
//! Invariants: Column lookups by name return `Option`, never an unchecked index.

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::error::{Error, ErrorKind};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Text(String),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Int(value) => serializer.serialize_i64(*value),
            Value::Text(value) => serializer.serialize_str(value),
        }
    }
}

#[derive(Debug)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|values| Row {
            columns: &self.columns,
            values,
        })
    }

    /// Resolves column names into positions, keeping the requested order.
    pub fn projection(&self, names: &[&str]) -> Result<Projection, Error> {
        let mut indices = Vec::with_capacity(names.len());
        for name in names {
            let Some(index) = self.column_index(name) else {
                return Err(Error::new(ErrorKind::NotFound)
                    .with_message(format!("column `{name}` is not in the dataset")));
            };
            indices.push(index);
        }
        Ok(Projection { indices })
    }
}

/// Header cell to column name; blank cells become `Unnamed: <index>`.
pub fn header_name(index: usize, raw: &str) -> String {
    let name = raw.trim();
    if name.is_empty() {
        format!("Unnamed: {index}")
    } else {
        name.to_string()
    }
}

/// Integral floats (spreadsheet and pandas exports store integers this way).
pub fn whole_number(value: f64) -> Option<i64> {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

/// Accumulates rows while loading; the finished `Table` is read-only.
#[derive(Debug)]
pub struct TableBuilder {
    table: Table,
}

impl TableBuilder {
    pub fn new(columns: Vec<String>) -> Result<Self, Error> {
        if columns.is_empty() {
            return Err(Error::new(ErrorKind::Corrupt).with_message("dataset has no columns"));
        }
        for (index, column) in columns.iter().enumerate() {
            if columns[..index].contains(column) {
                return Err(Error::new(ErrorKind::Corrupt)
                    .with_message(format!("duplicate column `{column}` in header")));
            }
        }
        Ok(Self {
            table: Table {
                columns,
                rows: Vec::new(),
            },
        })
    }

    pub fn column_count(&self) -> usize {
        self.table.columns.len()
    }

    pub fn push_row(&mut self, values: Vec<Value>) -> Result<(), Error> {
        let expected = self.table.columns.len();
        if values.len() != expected {
            return Err(Error::new(ErrorKind::Corrupt).with_message(format!(
                "row has {} fields, expected {expected}",
                values.len()
            )));
        }
        self.table.rows.push(values);
        Ok(())
    }

    pub fn finish(self) -> Table {
        self.table
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Projection {
    indices: Vec<usize>,
}

#[derive(Clone, Copy, Debug)]
pub struct Row<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> Row<'a> {
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        let index = self.columns.iter().position(|name| name == column)?;
        self.values.get(index)
    }

    pub fn value_at(&self, index: usize) -> Option<&'a Value> {
        self.values.get(index)
    }

    pub fn project(&self, projection: &Projection) -> Record<'a> {
        let fields = projection
            .indices
            .iter()
            .filter_map(|&index| {
                let name = self.columns.get(index)?;
                let value = self.values.get(index)?;
                Some((name.as_str(), value))
            })
            .collect();
        Record { fields }
    }

    pub fn record(&self) -> Record<'a> {
        let fields = self
            .columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
            .collect();
        Record { fields }
    }
}

/// Ordered `(column, value)` pairs borrowed from the table; serializes as a JSON object.
#[derive(Clone, Debug, PartialEq)]
pub struct Record<'a> {
    fields: Vec<(&'a str, &'a Value)>,
}

impl<'a> Record<'a> {
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.fields
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| *value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.fields.iter().map(|(name, _)| *name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, TableBuilder, Value, header_name, whole_number};

    fn sample() -> super::Table {
        let mut builder =
            TableBuilder::new(vec!["SuraID".into(), "AyaNo".into(), "Arabic Text".into()])
                .expect("builder");
        builder
            .push_row(vec![Value::Int(1), Value::Int(1), Value::Text("بسم".into())])
            .expect("row");
        builder
            .push_row(vec![Value::Int(1), Value::Int(2), Value::Null])
            .expect("row");
        builder.finish()
    }

    #[test]
    fn builder_rejects_arity_mismatch() {
        let mut builder = TableBuilder::new(vec!["a".into(), "b".into()]).expect("builder");
        let err = builder
            .push_row(vec![Value::Int(1)])
            .expect_err("short row");
        assert_eq!(err.kind(), ErrorKind::Corrupt);
    }

    #[test]
    fn builder_rejects_duplicate_and_empty_headers() {
        let err = TableBuilder::new(vec!["a".into(), "a".into()]).expect_err("duplicate");
        assert_eq!(err.kind(), ErrorKind::Corrupt);
        let err = TableBuilder::new(Vec::new()).expect_err("empty");
        assert_eq!(err.kind(), ErrorKind::Corrupt);
    }

    #[test]
    fn blank_header_cells_get_positional_names() {
        assert_eq!(header_name(0, " SuraID "), "SuraID");
        assert_eq!(header_name(7, ""), "Unnamed: 7");
        assert_eq!(header_name(8, "  "), "Unnamed: 8");
    }

    #[test]
    fn whole_number_accepts_integral_floats_only() {
        assert_eq!(whole_number(114.0), Some(114));
        assert_eq!(whole_number(-3.0), Some(-3));
        assert_eq!(whole_number(1.5), None);
        assert_eq!(whole_number(f64::NAN), None);
    }

    #[test]
    fn projection_keeps_requested_order() {
        let table = sample();
        let projection = table
            .projection(&["Arabic Text", "SuraID"])
            .expect("projection");
        let row = table.rows().next().expect("row");
        let record = row.project(&projection);
        assert_eq!(
            record.columns().collect::<Vec<_>>(),
            vec!["Arabic Text", "SuraID"]
        );
        let json = serde_json::to_string(&record).expect("json");
        assert_eq!(json, r#"{"Arabic Text":"بسم","SuraID":1}"#);
    }

    #[test]
    fn projection_of_unknown_column_is_not_found() {
        let table = sample();
        let err = table.projection(&["Nope"]).expect_err("unknown column");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn null_values_serialize_as_json_null() {
        let table = sample();
        let row = table.rows().nth(1).expect("row");
        assert!(row.get("Arabic Text").is_some_and(Value::is_null));
        let json = serde_json::to_value(row.record()).expect("json");
        assert!(json["Arabic Text"].is_null());
        assert_eq!(json["AyaNo"], 2);
    }
}
