//! Purpose: Parse a CSV export of the dataset spreadsheet into a `Table`.
//! Exports: `CsvReader`.
//! Role: Loader backend for `.csv` and `.tsv` files; pure text-in, table-out.
//! Invariants: First record is the header; all data records must match its arity.
//! Invariants: Quoted fields may span lines; `""` inside quotes is a literal quote.
//! Invariants: A column is integer-typed only if every non-empty field parses as `i64`.
//! Invariants: Text fields keep their whitespace; only header names are trimmed.
//! Invariants: Blank header cells are named `Unnamed: <index>`.
//! Notes: Errors carry the 1-based line where the offending record starts.

use super::error::{Error, ErrorKind};
use super::table::{Table, TableBuilder, Value, header_name};

#[derive(Clone, Debug)]
pub struct CsvReader {
    delimiter: char,
}

impl Default for CsvReader {
    fn default() -> Self {
        Self { delimiter: ',' }
    }
}

#[derive(Debug)]
struct RawRecord {
    line: usize,
    fields: Vec<RawField>,
}

#[derive(Debug)]
struct RawField {
    text: String,
    quoted: bool,
}

impl RawRecord {
    fn is_blank(&self) -> bool {
        match self.fields.as_slice() {
            [field] => !field.quoted && field.text.trim().is_empty(),
            _ => false,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ColumnType {
    Int,
    Text,
}

impl CsvReader {
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn read_str(&self, text: &str) -> Result<Table, Error> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut records = self
            .split_records(text)?
            .into_iter()
            .filter(|record| !record.is_blank());

        let Some(header) = records.next() else {
            return Err(Error::new(ErrorKind::Corrupt).with_message("CSV file is empty"));
        };
        let columns: Vec<String> = header
            .fields
            .iter()
            .enumerate()
            .map(|(index, field)| header_name(index, &field.text))
            .collect();
        let mut builder = TableBuilder::new(columns).map_err(|err| err.with_line(header.line))?;

        let records: Vec<RawRecord> = records.collect();
        for record in &records {
            if record.fields.len() != builder.column_count() {
                return Err(Error::new(ErrorKind::Corrupt)
                    .with_message(format!(
                        "record has {} fields, header has {}",
                        record.fields.len(),
                        builder.column_count()
                    ))
                    .with_line(record.line));
            }
        }

        let types = infer_types(&records, builder.column_count());
        for record in records {
            let line = record.line;
            let values = record
                .fields
                .into_iter()
                .zip(types.iter())
                .map(|(field, column_type)| to_value(field, *column_type))
                .collect();
            builder
                .push_row(values)
                .map_err(|err| err.with_line(line))?;
        }
        Ok(builder.finish())
    }

    fn split_records(&self, text: &str) -> Result<Vec<RawRecord>, Error> {
        let mut records = Vec::new();
        let mut fields = Vec::new();
        let mut field = String::new();
        let mut quoted = false;
        let mut in_quotes = false;
        let mut line = 1;
        let mut record_line = 1;
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            if in_quotes {
                if c == '"' {
                    if chars.peek() == Some(&'"') {
                        field.push('"');
                        chars.next();
                    } else {
                        in_quotes = false;
                    }
                } else {
                    if c == '\n' {
                        line += 1;
                    }
                    field.push(c);
                }
                continue;
            }

            match c {
                '"' if !quoted && field.trim().is_empty() => {
                    field.clear();
                    quoted = true;
                    in_quotes = true;
                }
                c if c == self.delimiter => fields.push(finish_field(&mut field, &mut quoted)),
                '\r' if chars.peek() == Some(&'\n') => {}
                '\n' => {
                    fields.push(finish_field(&mut field, &mut quoted));
                    records.push(RawRecord {
                        line: record_line,
                        fields: std::mem::take(&mut fields),
                    });
                    line += 1;
                    record_line = line;
                }
                // Whitespace between a closing quote and the delimiter is not content.
                c if quoted && c.is_whitespace() => {}
                c => field.push(c),
            }
        }

        if in_quotes {
            return Err(Error::new(ErrorKind::Corrupt)
                .with_message("unclosed quote in CSV field")
                .with_line(record_line));
        }
        if quoted || !field.is_empty() || !fields.is_empty() {
            fields.push(finish_field(&mut field, &mut quoted));
            records.push(RawRecord {
                line: record_line,
                fields,
            });
        }
        Ok(records)
    }
}

fn finish_field(field: &mut String, quoted: &mut bool) -> RawField {
    let raw = RawField {
        text: std::mem::take(field),
        quoted: *quoted,
    };
    *quoted = false;
    raw
}

fn parse_int(field: &RawField) -> Option<i64> {
    field.text.trim().parse::<i64>().ok()
}

fn is_null(field: &RawField) -> bool {
    !field.quoted && field.text.is_empty()
}

fn infer_types(records: &[RawRecord], column_count: usize) -> Vec<ColumnType> {
    (0..column_count)
        .map(|index| {
            let all_ints = records
                .iter()
                .filter_map(|record| record.fields.get(index))
                .filter(|field| !is_null(field))
                .all(|field| parse_int(field).is_some());
            if all_ints {
                ColumnType::Int
            } else {
                ColumnType::Text
            }
        })
        .collect()
}

fn to_value(field: RawField, column_type: ColumnType) -> Value {
    if is_null(&field) {
        return Value::Null;
    }
    match column_type {
        ColumnType::Int => match parse_int(&field) {
            Some(value) => Value::Int(value),
            None => Value::Text(field.text),
        },
        ColumnType::Text => Value::Text(field.text),
    }
}

#[cfg(test)]
mod tests {
    use super::CsvReader;
    use crate::core::error::ErrorKind;
    use crate::core::table::Value;

    #[test]
    fn reads_header_and_infers_integer_columns() {
        let csv = "SuraID,AyaNo,Arabic Text\n1,1,بسم\n1,2,الحمد\n";
        let table = CsvReader::default().read_str(csv).expect("table");

        assert_eq!(table.columns(), ["SuraID", "AyaNo", "Arabic Text"]);
        assert_eq!(table.row_count(), 2);
        let second = table.rows().nth(1).expect("row");
        assert_eq!(second.get("AyaNo"), Some(&Value::Int(2)));
        assert_eq!(second.get("Arabic Text"), Some(&Value::Text("الحمد".into())));
    }

    #[test]
    fn quoted_fields_keep_delimiters_quotes_and_newlines() {
        let csv = "id,text\r\n1,\"a, b\"\r\n2,\"say \"\"hi\"\"\nthen go\"\r\n";
        let table = CsvReader::default().read_str(csv).expect("table");

        let texts: Vec<_> = table
            .rows()
            .map(|row| row.get("text").and_then(Value::as_text).map(str::to_string))
            .collect();
        assert_eq!(
            texts,
            vec![
                Some("a, b".to_string()),
                Some("say \"hi\"\nthen go".to_string())
            ]
        );
    }

    #[test]
    fn empty_fields_are_null_and_mixed_columns_are_text() {
        let csv = "id,code\n1,\n2,17\n3,x9\n";
        let table = CsvReader::default().read_str(csv).expect("table");

        let codes: Vec<_> = table.rows().map(|row| row.get("code").cloned()).collect();
        assert_eq!(
            codes,
            vec![
                Some(Value::Null),
                Some(Value::Text("17".into())),
                Some(Value::Text("x9".into()))
            ]
        );
    }

    #[test]
    fn blank_lines_and_bom_are_ignored() {
        let csv = "\u{feff}id,name\n\n1,a\n\n2,b";
        let table = CsvReader::default().read_str(csv).expect("table");
        assert_eq!(table.columns()[0], "id");
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn arity_mismatch_reports_line() {
        let csv = "a,b\n1,2\n\"multi\nline\",3,4\n";
        let err = CsvReader::default().read_str(csv).expect_err("bad arity");
        assert_eq!(err.kind(), ErrorKind::Corrupt);
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn unclosed_quote_is_corrupt() {
        let err = CsvReader::default()
            .read_str("a,b\n1,\"open\n")
            .expect_err("unclosed");
        assert_eq!(err.kind(), ErrorKind::Corrupt);
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn empty_input_is_corrupt() {
        let err = CsvReader::default().read_str("\n\n").expect_err("empty");
        assert_eq!(err.kind(), ErrorKind::Corrupt);
    }

    #[test]
    fn text_fields_keep_surrounding_whitespace() {
        let csv = " SuraID , AyaNo ,Arabic Text\n 1 ,2,  بسم الله \n";
        let table = CsvReader::default().read_str(csv).expect("table");

        assert_eq!(table.columns(), ["SuraID", "AyaNo", "Arabic Text"]);
        let row = table.rows().next().expect("row");
        assert_eq!(row.get("SuraID"), Some(&Value::Int(1)));
        assert_eq!(
            row.get("Arabic Text"),
            Some(&Value::Text("  بسم الله ".into()))
        );
    }

    #[test]
    fn trailing_blank_header_cells_get_unnamed_columns() {
        let csv = "SuraID,AyaNo,Mehmood ul Hassan,,\n1,1,شروع,,\n1,2,سب,x,\n";
        let table = CsvReader::default().read_str(csv).expect("table");

        assert_eq!(
            table.columns(),
            ["SuraID", "AyaNo", "Mehmood ul Hassan", "Unnamed: 3", "Unnamed: 4"]
        );
        let second = table.rows().nth(1).expect("row");
        assert_eq!(second.get("Unnamed: 3"), Some(&Value::Text("x".into())));
        assert_eq!(second.get("Unnamed: 4"), Some(&Value::Null));
    }

    #[test]
    fn custom_delimiter() {
        let table = CsvReader::default()
            .with_delimiter(';')
            .read_str("a;b\n1;x,y\n")
            .expect("table");
        let row = table.rows().next().expect("row");
        assert_eq!(row.get("b"), Some(&Value::Text("x,y".into())));
    }
}
