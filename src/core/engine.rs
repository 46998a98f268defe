//! Purpose: Read-only query engine over the loaded dataset table.
//! Exports: `QueryEngine`, `Predicate`.
//! Role: Every lookup is one ordered scan: filter with a `Predicate`, then project.
//! Invariants: Results preserve table row order; nothing here mutates the table.
//! Invariants: Duplicate keys resolve to the first row in load order (`first`).
//! Invariants: Null or non-text values never satisfy a substring predicate.
//! Notes: No index is built; the dataset is small and scans are O(rows).

use super::columns::{
    ARABIC_TEXT, AYA_NO, JALANDHRI, MEHMOOD_UL_HASSAN, REQUIRED, SURA_ID, SURAH_NAME_E,
    SURAH_NAME_U,
};
use super::error::{Error, ErrorKind};
use super::table::{Projection, Record, Row, Table, Value};

/// Row filter over resolved column positions.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate<'q> {
    IntEquals { column: usize, value: i64 },
    /// Inclusive on both ends; `start > end` matches nothing.
    IntBetween { column: usize, start: i64, end: i64 },
    /// Case-sensitive substring containment.
    Contains { column: usize, needle: &'q str },
    All(Vec<Predicate<'q>>),
}

impl Predicate<'_> {
    pub fn matches(&self, row: &Row<'_>) -> bool {
        match self {
            Predicate::IntEquals { column, value } => {
                row.value_at(*column).and_then(Value::as_int) == Some(*value)
            }
            Predicate::IntBetween { column, start, end } => row
                .value_at(*column)
                .and_then(Value::as_int)
                .is_some_and(|value| *start <= value && value <= *end),
            Predicate::Contains { column, needle } => row
                .value_at(*column)
                .and_then(Value::as_text)
                .is_some_and(|text| text.contains(*needle)),
            Predicate::All(predicates) => predicates.iter().all(|predicate| predicate.matches(row)),
        }
    }
}

#[derive(Debug)]
struct Projections {
    surah_name: Projection,
    text: Projection,
    text_with_translations: Projection,
    translations: Projection,
}

#[derive(Debug)]
pub struct QueryEngine {
    table: Table,
    sura: usize,
    aya: usize,
    projections: Projections,
}

impl QueryEngine {
    /// Takes ownership of the loaded table after checking the required columns.
    pub fn new(table: Table) -> Result<Self, Error> {
        for column in REQUIRED {
            if table.column_index(column).is_none() {
                return Err(Error::new(ErrorKind::Corrupt)
                    .with_message(format!("dataset is missing required column `{column}`")));
            }
        }
        let projections = Projections {
            surah_name: fixed_projection(&table, &[SURAH_NAME_E, SURAH_NAME_U])?,
            text: fixed_projection(&table, &[AYA_NO, ARABIC_TEXT])?,
            text_with_translations: fixed_projection(
                &table,
                &[AYA_NO, ARABIC_TEXT, JALANDHRI, MEHMOOD_UL_HASSAN],
            )?,
            translations: fixed_projection(&table, &[JALANDHRI, MEHMOOD_UL_HASSAN])?,
        };
        let sura = key_column(&table, SURA_ID)?;
        let aya = key_column(&table, AYA_NO)?;

        Ok(Self {
            table,
            sura,
            aya,
            projections,
        })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn select(&self, predicate: &Predicate<'_>) -> impl Iterator<Item = Row<'_>> {
        self.table.rows().filter(move |row| predicate.matches(row))
    }

    /// First matching row in load order; later duplicates are ignored.
    pub fn first(&self, predicate: &Predicate<'_>) -> Option<Row<'_>> {
        self.select(predicate).next()
    }

    pub fn resolve(&self, column: &str) -> Result<usize, Error> {
        self.table.column_index(column).ok_or_else(|| {
            Error::new(ErrorKind::NotFound)
                .with_message(format!("column `{column}` is not in the dataset"))
        })
    }

    pub fn columns(&self) -> &[String] {
        self.table.columns()
    }

    /// Every value of `column`, in row order.
    pub fn column_values(&self, column: &str) -> Result<Vec<&Value>, Error> {
        let Some(index) = self.table.column_index(column) else {
            return Err(Error::new(ErrorKind::NotFound).with_message("Key not found in the file"));
        };
        Ok(self
            .table
            .rows()
            .filter_map(|row| row.value_at(index))
            .collect())
    }

    pub fn find_verse(&self, sura: i64, aya: i64) -> Option<Record<'_>> {
        self.first(&self.verse_key(sura, aya)).map(|row| row.record())
    }

    pub fn translations(&self, sura: i64, aya: i64) -> Option<Record<'_>> {
        self.first(&self.verse_key(sura, aya))
            .map(|row| row.project(&self.projections.translations))
    }

    pub fn surah_name(&self, sura: i64) -> Option<Record<'_>> {
        self.first(&self.sura_key(sura))
            .map(|row| row.project(&self.projections.surah_name))
    }

    /// Rows whose `column` text contains `needle`, projected to the verse key plus `column`.
    pub fn search(&self, column: &str, needle: &str) -> Result<Vec<Record<'_>>, Error> {
        let index = self.resolve(column)?;
        let mut names = vec![SURA_ID, AYA_NO];
        if !names.contains(&column) {
            names.push(column);
        }
        let projection = self.table.projection(&names)?;
        let predicate = Predicate::Contains {
            column: index,
            needle,
        };
        Ok(self
            .select(&predicate)
            .map(|row| row.project(&projection))
            .collect())
    }

    pub fn verses_in_range(
        &self,
        sura: i64,
        start: i64,
        end: i64,
        with_translation: bool,
    ) -> Vec<Record<'_>> {
        let predicate = Predicate::All(vec![
            self.sura_key(sura),
            Predicate::IntBetween {
                column: self.aya,
                start,
                end,
            },
        ]);
        let projection = self.text_projection(with_translation);
        self.select(&predicate)
            .map(|row| row.project(projection))
            .collect()
    }

    pub fn surah_content(&self, sura: i64, with_translation: bool) -> Vec<Record<'_>> {
        let predicate = self.sura_key(sura);
        let projection = self.text_projection(with_translation);
        self.select(&predicate)
            .map(|row| row.project(projection))
            .collect()
    }

    /// Zero is a valid count, not a miss.
    pub fn ayah_count(&self, sura: i64) -> usize {
        self.select(&self.sura_key(sura)).count()
    }

    fn sura_key(&self, sura: i64) -> Predicate<'static> {
        Predicate::IntEquals {
            column: self.sura,
            value: sura,
        }
    }

    fn verse_key(&self, sura: i64, aya: i64) -> Predicate<'static> {
        Predicate::All(vec![
            self.sura_key(sura),
            Predicate::IntEquals {
                column: self.aya,
                value: aya,
            },
        ])
    }

    fn text_projection(&self, with_translation: bool) -> &Projection {
        if with_translation {
            &self.projections.text_with_translations
        } else {
            &self.projections.text
        }
    }
}

fn fixed_projection(table: &Table, names: &[&str]) -> Result<Projection, Error> {
    table
        .projection(names)
        .map_err(|err| Error::new(ErrorKind::Corrupt).with_message(err.to_string()))
}

fn key_column(table: &Table, column: &str) -> Result<usize, Error> {
    let Some(index) = table.column_index(column) else {
        return Err(Error::new(ErrorKind::Corrupt)
            .with_message(format!("dataset is missing required column `{column}`")));
    };
    for (position, row) in table.rows().enumerate() {
        if row.value_at(index).and_then(Value::as_int).is_none() {
            return Err(Error::new(ErrorKind::Corrupt).with_message(format!(
                "row {} has a non-integer `{column}`",
                position + 1
            )));
        }
    }
    Ok(index)
}
