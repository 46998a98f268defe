//! Purpose: Read the first worksheet of an `.xlsx` workbook into a `Table`.
//! Exports: `read_workbook`.
//! Role: Loader backend for the spreadsheet the dataset is published as.
//! Invariants: The first non-empty row of the used range is the header.
//! Invariants: Whole-number cells become `Value::Int`; empty and error cells become `Value::Null`.
//! Notes: Error lines are 1-based worksheet row numbers.

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};

use super::error::{Error, ErrorKind};
use super::table::{Table, TableBuilder, Value, header_name, whole_number};

pub fn read_workbook(bytes: &[u8]) -> Result<Table, Error> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|err| corrupt(format!("failed to open workbook: {err}")))?;
    let Some(range) = workbook.worksheet_range_at(0) else {
        return Err(corrupt("workbook has no worksheets".to_string()));
    };
    let range = range.map_err(|err| corrupt(format!("failed to read first worksheet: {err}")))?;
    let first_row = range.start().map_or(0, |(row, _)| row as usize);

    let mut rows = range
        .rows()
        .enumerate()
        .map(|(offset, cells)| (first_row + offset + 1, cells))
        .filter(|(_, cells)| !cells.iter().all(is_blank));

    let Some((header_line, header)) = rows.next() else {
        return Err(corrupt("first worksheet is empty".to_string()));
    };
    let columns = header
        .iter()
        .enumerate()
        .map(|(index, cell)| header_name(index, &header_text(cell)))
        .collect();
    let mut builder = TableBuilder::new(columns).map_err(|err| err.with_line(header_line))?;

    for (line, cells) in rows {
        let values = cells.iter().map(to_value).collect();
        builder
            .push_row(values)
            .map_err(|err| err.with_line(line))?;
    }
    Ok(builder.finish())
}

fn corrupt(message: String) -> Error {
    Error::new(ErrorKind::Corrupt).with_message(message)
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(text) => text.is_empty(),
        _ => false,
    }
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.clone(),
        Data::Float(value) => match whole_number(*value) {
            Some(int) => int.to_string(),
            None => value.to_string(),
        },
        other => other.to_string(),
    }
}

fn to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::Int(value) => Value::Int(*value),
        Data::Float(value) => match whole_number(*value) {
            Some(int) => Value::Int(int),
            None => Value::Text(value.to_string()),
        },
        Data::String(text) => Value::Text(text.clone()),
        other => Value::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use rust_xlsxwriter::Workbook;

    use super::read_workbook;
    use crate::core::error::ErrorKind;
    use crate::core::table::Value;

    fn sample_workbook() -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, name) in ["SuraID", "AyaNo", "SurahNameE", "Arabic Text"]
            .into_iter()
            .enumerate()
        {
            sheet.write_string(0, col as u16, name).expect("header");
        }
        sheet.write_number(1, 0, 1).expect("cell");
        sheet.write_number(1, 1, 1).expect("cell");
        sheet.write_string(1, 2, "Al-Fatiha").expect("cell");
        sheet.write_string(1, 3, "بسم الله").expect("cell");
        sheet.write_string(1, 4, "note").expect("cell");
        sheet.write_number(2, 0, 1).expect("cell");
        sheet.write_number(2, 1, 2).expect("cell");
        sheet.write_number(2, 2, 1.5).expect("cell");
        workbook.save_to_buffer().expect("workbook bytes")
    }

    #[test]
    fn first_sheet_header_and_cell_types() {
        let table = read_workbook(&sample_workbook()).expect("table");

        assert_eq!(
            table.columns(),
            ["SuraID", "AyaNo", "SurahNameE", "Arabic Text", "Unnamed: 4"]
        );
        assert_eq!(table.row_count(), 2);

        let first = table.rows().next().expect("row");
        assert_eq!(first.get("SuraID"), Some(&Value::Int(1)));
        assert_eq!(
            first.get("Arabic Text"),
            Some(&Value::Text("بسم الله".into()))
        );
        assert_eq!(first.get("Unnamed: 4"), Some(&Value::Text("note".into())));

        let second = table.rows().nth(1).expect("row");
        assert_eq!(second.get("AyaNo"), Some(&Value::Int(2)));
        assert_eq!(second.get("SurahNameE"), Some(&Value::Text("1.5".into())));
        assert_eq!(second.get("Arabic Text"), Some(&Value::Null));
        assert_eq!(second.get("Unnamed: 4"), Some(&Value::Null));
    }

    #[test]
    fn non_workbook_bytes_are_corrupt() {
        let err = read_workbook(b"PK not a zip").expect_err("corrupt");
        assert_eq!(err.kind(), ErrorKind::Corrupt);
    }

    #[test]
    fn empty_sheet_is_corrupt() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet();
        let bytes = workbook.save_to_buffer().expect("workbook bytes");
        let err = read_workbook(&bytes).expect_err("empty");
        assert_eq!(err.kind(), ErrorKind::Corrupt);
    }
}
