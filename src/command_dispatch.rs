//! Purpose: Hold top-level CLI command dispatch for `ayat`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Query commands open the dataset once, run one engine query, print one payload.
//! Invariants: Not-found results surface as errors (exit code 3), matching HTTP 404s.

use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::PathBuf;

use ayat::api::{self, Error, ErrorKind};

use super::{Command, RunOutcome, completion_script, emit_json, serve};

pub(super) fn dispatch_command(command: Command, data_path: PathBuf) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            io::stdout()
                .write_all(&completion_script(shell))
                .map_err(|err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write completion script")
                        .with_source(err)
                })?;
            Ok(RunOutcome::ok())
        }
        Command::Serve {
            bind,
            allow_non_loopback,
        } => {
            let bind: SocketAddr = bind.parse().map_err(|_| {
                Error::new(ErrorKind::Usage)
                    .with_message("invalid bind address")
                    .with_hint("Use a host:port value like 127.0.0.1:8000.")
            })?;
            let config = serve::ServeConfig {
                bind,
                data_path,
                allow_non_loopback,
            };
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to start runtime")
                        .with_source(err)
                })?;
            runtime.block_on(serve::serve(config))?;
            Ok(RunOutcome::ok())
        }
        Command::Columns => {
            let engine = api::open_engine(&data_path)?;
            emit_json(&api::all_columns(&engine))?;
            Ok(RunOutcome::ok())
        }
        Command::Column { key } => {
            let engine = api::open_engine(&data_path)?;
            emit_json(&api::column_data(&engine, &key)?)?;
            Ok(RunOutcome::ok())
        }
        Command::Verse {
            sura,
            aya,
            translations,
        } => {
            let engine = api::open_engine(&data_path)?;
            let record = if translations {
                api::translations(&engine, sura, aya)?
            } else {
                api::verse(&engine, sura, aya)?
            };
            emit_json(&record)?;
            Ok(RunOutcome::ok())
        }
        Command::Name { sura } => {
            let engine = api::open_engine(&data_path)?;
            emit_json(&api::surah_name(&engine, sura)?)?;
            Ok(RunOutcome::ok())
        }
        Command::Search { needle, forms } => {
            let engine = api::open_engine(&data_path)?;
            if forms {
                emit_json(&api::search_form(&engine, &needle)?)?;
            } else {
                emit_json(&api::search_ayat(&engine, &needle)?)?;
            }
            Ok(RunOutcome::ok())
        }
        Command::Surah {
            sura,
            with_translation,
        } => {
            let engine = api::open_engine(&data_path)?;
            emit_json(&api::surah_content(&engine, sura, with_translation)?)?;
            Ok(RunOutcome::ok())
        }
        Command::Range {
            sura,
            start,
            end,
            with_translation,
        } => {
            let engine = api::open_engine(&data_path)?;
            emit_json(&api::surah_range(
                &engine,
                sura,
                start,
                end,
                with_translation,
            )?)?;
            Ok(RunOutcome::ok())
        }
        Command::Count { sura } => {
            let engine = api::open_engine(&data_path)?;
            emit_json(&api::ayah_count(&engine, sura))?;
            Ok(RunOutcome::ok())
        }
    }
}
