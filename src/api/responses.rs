//! Purpose: Response payloads for every dataset endpoint, shared by HTTP and CLI.
//! Exports: One builder function plus one payload type per endpoint, and `ErrorPayload`.
//! Role: Turns engine results into the service's JSON envelopes and not-found errors.
//! Invariants: Key names and order are stable; records keep dataset column order.
//! Invariants: Misses become `ErrorKind::NotFound` with the user-facing message; counts never miss.

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::core::columns::ARABIC_TEXT;
use crate::core::engine::QueryEngine;
use crate::core::error::{Error, ErrorKind};
use crate::core::table::{Record, Value};

pub const WELCOME: &str = "Welcome to the Quran Data API!";

pub const ENDPOINTS: [&str; 13] = [
    "/",
    "/get_data/{key}",
    "/get_sura_data/{sura_id}/{aya_no}",
    "/all_columns",
    "/get_surah_name/{sura_id}",
    "/search_ayat/{word}",
    "/get_translations/{sura_id}/{aya_no}",
    "/search_form/{form}",
    "/get_surah_content/{sura_id}",
    "/get_surah_range/{sura_id}/{start_aya}/{end_aya}",
    "/get_ayah_count/{sura_id}",
    "/all_endpoints",
    "/healthz",
];

#[derive(Debug, Serialize)]
pub struct Welcome {
    pub message: &'static str,
}

/// `{ <column>: [values...] }`
#[derive(Debug)]
pub struct ColumnData<'a> {
    pub column: &'a str,
    pub values: Vec<&'a Value>,
}

impl Serialize for ColumnData<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.column, &self.values)?;
        map.end()
    }
}

#[derive(Debug, Serialize)]
pub struct ColumnList<'a> {
    pub columns: &'a [String],
}

#[derive(Debug, Serialize)]
pub struct AyatSearch<'a> {
    pub count: usize,
    pub ayat: Vec<Record<'a>>,
}

#[derive(Debug, Serialize)]
pub struct FormSearch<'a> {
    pub count: usize,
    pub occurrences: Vec<Record<'a>>,
}

#[derive(Debug, Serialize)]
pub struct SurahContent<'a> {
    pub surah_content: Vec<Record<'a>>,
}

#[derive(Debug, Serialize)]
pub struct SurahRange<'a> {
    pub surah_range: Vec<Record<'a>>,
}

#[derive(Debug, Serialize)]
pub struct AyahCount {
    pub sura_id: i64,
    pub ayah_count: usize,
}

#[derive(Debug, Serialize)]
pub struct Endpoints {
    pub endpoints: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub error: String,
}

pub fn welcome() -> Welcome {
    Welcome { message: WELCOME }
}

pub fn column_data<'a>(engine: &'a QueryEngine, key: &'a str) -> Result<ColumnData<'a>, Error> {
    let values = engine.column_values(key)?;
    Ok(ColumnData {
        column: key,
        values,
    })
}

pub fn verse(engine: &QueryEngine, sura: i64, aya: i64) -> Result<Record<'_>, Error> {
    engine.find_verse(sura, aya).ok_or_else(|| {
        tracing::debug!(sura, aya, "verse not found");
        not_found("Data not found for this SuraID and AyaNo")
    })
}

pub fn all_columns(engine: &QueryEngine) -> ColumnList<'_> {
    ColumnList {
        columns: engine.columns(),
    }
}

pub fn surah_name(engine: &QueryEngine, sura: i64) -> Result<Record<'_>, Error> {
    engine
        .surah_name(sura)
        .ok_or_else(|| not_found("Surah not found for this SuraID"))
}

pub fn search_ayat<'a>(engine: &'a QueryEngine, word: &str) -> Result<AyatSearch<'a>, Error> {
    let ayat = engine.search(ARABIC_TEXT, word)?;
    if ayat.is_empty() {
        return Err(not_found("No Ayat found containing the given word/root."));
    }
    Ok(AyatSearch {
        count: ayat.len(),
        ayat,
    })
}

pub fn translations(engine: &QueryEngine, sura: i64, aya: i64) -> Result<Record<'_>, Error> {
    engine
        .translations(sura, aya)
        .ok_or_else(|| not_found("No translations found for this SuraID and AyaNo"))
}

pub fn search_form<'a>(engine: &'a QueryEngine, form: &str) -> Result<FormSearch<'a>, Error> {
    let occurrences = engine.search(ARABIC_TEXT, form)?;
    if occurrences.is_empty() {
        return Err(not_found("No occurrences found for the given form."));
    }
    Ok(FormSearch {
        count: occurrences.len(),
        occurrences,
    })
}

pub fn surah_content(
    engine: &QueryEngine,
    sura: i64,
    with_translation: bool,
) -> Result<SurahContent<'_>, Error> {
    let surah_content = engine.surah_content(sura, with_translation);
    if surah_content.is_empty() {
        return Err(not_found("Surah not found for this SuraID"));
    }
    Ok(SurahContent { surah_content })
}

pub fn surah_range(
    engine: &QueryEngine,
    sura: i64,
    start: i64,
    end: i64,
    with_translation: bool,
) -> Result<SurahRange<'_>, Error> {
    let surah_range = engine.verses_in_range(sura, start, end, with_translation);
    if surah_range.is_empty() {
        return Err(not_found("No Ayat found for the given range in this Surah."));
    }
    Ok(SurahRange { surah_range })
}

pub fn ayah_count(engine: &QueryEngine, sura: i64) -> AyahCount {
    AyahCount {
        sura_id: sura,
        ayah_count: engine.ayah_count(sura),
    }
}

pub fn all_endpoints() -> Endpoints {
    Endpoints {
        endpoints: &ENDPOINTS,
    }
}

pub fn error_payload(err: &Error) -> ErrorPayload {
    ErrorPayload {
        error: err.message().unwrap_or("error").to_string(),
    }
}

fn not_found(message: &str) -> Error {
    Error::new(ErrorKind::NotFound).with_message(message)
}
