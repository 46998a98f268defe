//! Purpose: `ayat` CLI entry point.
//! Role: Binary crate root; parses args, runs the server or one-shot queries, emits JSON on stdout.
//! Invariants: Query commands print exactly the payload the matching HTTP route returns.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde::Serialize;
use serde_json::{Map, Value, json};

mod command_dispatch;
mod data_paths;
mod serve;

use ayat::api::{Error, ErrorKind, to_exit_code};
use data_paths::{DATA_ENV, default_data_path};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse_from(std::env::args_os()) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Try `ayat --help`."));
            }
        },
    };

    let data_path = cli.data.unwrap_or_else(default_data_path);

    command_dispatch::dispatch_command(cli.command, data_path)
        .map_err(add_dataset_hint)
        .map_err(add_internal_hint)
}

#[derive(Parser)]
#[command(
    name = "ayat",
    version,
    about = "Query a Quran verse and translation dataset over HTTP or from the shell",
    long_about = None,
    after_help = r#"EXAMPLES
  $ ayat serve                                   # http://127.0.0.1:8000
  $ ayat --data quran.csv verse 1 1
  $ ayat --data quran.csv search 'الحمد'
  $ ayat --data quran.csv range 2 1 5 --with-translation

NOTES
  - The dataset is the .xlsx workbook, a .csv/.tsv export, or JSON records (.json / .jsonl)
  - Default dataset: $AYAT_DATA, else ./UrduTranslationsFatehMuhammadAndShaikhulHind.xlsx"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "Dataset file (.xlsx, .csv, .tsv, .json, .jsonl)",
        value_hint = ValueHint::FilePath
    )]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Serve the dataset over HTTP (loopback by default)",
        after_help = r#"EXAMPLES
  $ ayat serve
  $ ayat serve --bind 127.0.0.1:9000
  $ ayat serve --bind 0.0.0.0:8000 --allow-non-loopback

NOTES
  - Set RUST_LOG (e.g. RUST_LOG=debug) to adjust log verbosity; logs go to stderr
  - `GET /all_endpoints` lists every route"#
    )]
    Serve {
        #[arg(long, default_value = "127.0.0.1:8000", help = "Address to bind")]
        bind: String,
        #[arg(long, help = "Allow binding to a non-loopback address")]
        allow_non_loopback: bool,
    },
    #[command(about = "List dataset columns in schema order")]
    Columns,
    #[command(
        arg_required_else_help = true,
        about = "Print every value of one column, in row order"
    )]
    Column {
        #[arg(help = "Column name (see `ayat columns`)")]
        key: String,
    },
    #[command(
        arg_required_else_help = true,
        allow_negative_numbers = true,
        about = "Fetch one verse by SuraID and AyaNo",
        after_help = r#"EXAMPLES
  $ ayat verse 1 1
  $ ayat verse 2 255 --translations"#
    )]
    Verse {
        #[arg(help = "SuraID")]
        sura: i64,
        #[arg(help = "AyaNo")]
        aya: i64,
        #[arg(long, help = "Only print the two translation columns")]
        translations: bool,
    },
    #[command(
        arg_required_else_help = true,
        allow_negative_numbers = true,
        about = "Print the English and Urdu name of a surah"
    )]
    Name {
        #[arg(help = "SuraID")]
        sura: i64,
    },
    #[command(
        arg_required_else_help = true,
        about = "Find ayat whose Arabic text contains a word or root (case-sensitive)"
    )]
    Search {
        #[arg(help = "Substring to look for", allow_hyphen_values = true)]
        needle: String,
        #[arg(long, help = "Report matches as grammatical-form occurrences")]
        forms: bool,
    },
    #[command(
        arg_required_else_help = true,
        allow_negative_numbers = true,
        about = "Print every ayah of a surah"
    )]
    Surah {
        #[arg(help = "SuraID")]
        sura: i64,
        #[arg(long, help = "Include both translations")]
        with_translation: bool,
    },
    #[command(
        arg_required_else_help = true,
        allow_negative_numbers = true,
        about = "Print an inclusive range of ayat from one surah"
    )]
    Range {
        #[arg(help = "SuraID")]
        sura: i64,
        #[arg(help = "First AyaNo")]
        start: i64,
        #[arg(help = "Last AyaNo (inclusive)")]
        end: i64,
        #[arg(long, help = "Include both translations")]
        with_translation: bool,
    },
    #[command(
        arg_required_else_help = true,
        allow_negative_numbers = true,
        about = "Count the ayat of a surah (0 when absent)"
    )]
    Count {
        #[arg(help = "SuraID")]
        sura: i64,
    },
    #[command(
        arg_required_else_help = true,
        about = "Generate shell completion scripts",
        after_help = r#"EXAMPLES
  $ ayat completion bash > ~/.local/share/bash-completion/completions/ayat
  $ ayat completion zsh > ~/.zfunc/_ayat"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

fn add_dataset_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::Io if err.path().is_some() => err.with_hint(format!(
            "Check the dataset path. Pass --data <file> or set {DATA_ENV}."
        )),
        ErrorKind::Corrupt => err.with_hint(
            "Dataset does not match the expected layout. Re-export it with the full header row.",
        ),
        _ => err,
    }
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint(
        "Unexpected internal failure. Retry with RUST_BACKTRACE=1 and share command/context if it persists.",
    )
}

fn emit_json<T: Serialize>(payload: &T) -> Result<(), Error> {
    let encoded = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(payload)
    } else {
        serde_json::to_string(payload)
    };
    let json = encoded.map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode JSON output")
            .with_source(err)
    })?;
    println!("{json}");
    Ok(())
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }

    let json = serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(line) = err.line() {
        inner.insert("line".to_string(), json!(line));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", error_message(err))];
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    if let Some(path) = err.path() {
        lines.push(format!("path: {}", path.display()));
    }
    if let Some(line) = err.line() {
        lines.push(format!("line: {line}"));
    }
    lines.join("\n")
}

fn error_message(err: &Error) -> String {
    err.message()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{:?}", err.kind()))
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn completion_script(shell: Shell) -> Vec<u8> {
    let mut cmd = Cli::command();
    let mut out = Vec::new();
    clap_complete::aot::generate(shell, &mut cmd, "ayat", &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, add_dataset_hint, error_json};
    use ayat::api::{Error, ErrorKind};
    use clap::Parser;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn data_flag_is_global() {
        let cli = Cli::try_parse_from(["ayat", "count", "1", "--data", "x.csv"]).expect("parse");
        assert_eq!(cli.data.as_deref(), Some(std::path::Path::new("x.csv")));
        assert!(matches!(cli.command, Command::Count { sura: 1 }));
    }

    #[test]
    fn range_flags_parse() {
        let cli = Cli::try_parse_from(["ayat", "range", "2", "5", "3", "--with-translation"])
            .expect("parse");
        assert!(matches!(
            cli.command,
            Command::Range {
                sura: 2,
                start: 5,
                end: 3,
                with_translation: true
            }
        ));
    }

    #[test]
    fn id_arguments_accept_negative_numbers() {
        let cli = Cli::try_parse_from(["ayat", "range", "1", "-3", "2"]).expect("parse");
        assert!(matches!(
            cli.command,
            Command::Range {
                sura: 1,
                start: -3,
                end: 2,
                with_translation: false
            }
        ));
        let cli = Cli::try_parse_from(["ayat", "verse", "-1", "-1"]).expect("parse");
        assert!(matches!(cli.command, Command::Verse { sura: -1, aya: -1, .. }));
        let cli = Cli::try_parse_from(["ayat", "count", "-7"]).expect("parse");
        assert!(matches!(cli.command, Command::Count { sura: -7 }));
    }

    #[test]
    fn completion_script_names_the_binary() {
        let script = super::completion_script(clap_complete::aot::Shell::Bash);
        let script = String::from_utf8(script).expect("utf8");
        assert!(script.contains("ayat"));
    }

    #[test]
    fn error_json_carries_location() {
        let err = add_dataset_hint(
            Error::new(ErrorKind::Corrupt)
                .with_message("record has 2 fields, header has 7")
                .with_path("quran.csv")
                .with_line(4),
        );
        let value = error_json(&err);
        assert_eq!(value["error"]["kind"], "Corrupt");
        assert_eq!(value["error"]["line"], 4);
        assert_eq!(value["error"]["path"], "quran.csv");
        assert!(value["error"]["hint"].is_string());
    }
}
