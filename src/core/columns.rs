//! Purpose: Names of the dataset columns the query operations depend on.
//! Exports: Column name constants and `REQUIRED`.
//! Invariants: Names match the spreadsheet header exactly (case and spaces included).

pub const SURA_ID: &str = "SuraID";
pub const AYA_NO: &str = "AyaNo";
pub const SURAH_NAME_E: &str = "SurahNameE";
pub const SURAH_NAME_U: &str = "SurahNameU";
pub const ARABIC_TEXT: &str = "Arabic Text";
pub const JALANDHRI: &str = "Fateh Muhammad Jalandhri";
pub const MEHMOOD_UL_HASSAN: &str = "Mehmood ul Hassan";

pub const REQUIRED: [&str; 7] = [
    SURA_ID,
    AYA_NO,
    SURAH_NAME_E,
    SURAH_NAME_U,
    ARABIC_TEXT,
    JALANDHRI,
    MEHMOOD_UL_HASSAN,
];
