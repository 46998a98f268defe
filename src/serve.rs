//! Purpose: Provide the read-only HTTP/JSON server for the verse dataset.
//! Exports: `ServeConfig`, `serve`.
//! Role: Axum router mapping each route onto one engine query via `api` payload builders.
//! Invariants: The dataset is loaded before the listener binds; handlers never mutate it.
//! Invariants: Failures use the `{"error": "<message>"}` body; not-found maps to 404.
//! Invariants: Loopback-only unless explicitly allowed.

use std::future::IntoFuture;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path as AxumPath, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::time::Duration;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use ayat::api::{self, Error, ErrorKind, QueryEngine};

#[derive(Clone, Debug)]
pub struct ServeConfig {
    pub bind: SocketAddr,
    pub data_path: PathBuf,
    pub allow_non_loopback: bool,
}

struct AppState {
    engine: QueryEngine,
}

pub async fn serve(config: ServeConfig) -> Result<(), Error> {
    validate_config(&config)?;

    init_tracing();

    let engine = api::open_engine(&config.data_path)?;
    let app = router(Arc::new(AppState { engine }));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to bind server")
                .with_source(err)
        })?;
    tracing::info!(bind = %config.bind, "serving dataset");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            result.map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("server failed")
                    .with_source(err)
            })?;
        }
        _ = shutdown_signal() => {
            tracing::info!("shutting down");
            let _ = shutdown_tx.send(());
            match tokio::time::timeout(Duration::from_secs(10), &mut server).await {
                Ok(result) => result.map_err(|err| {
                    Error::new(ErrorKind::Io)
                        .with_message("server failed")
                        .with_source(err)
                })?,
                Err(_) => {
                    return Err(Error::new(ErrorKind::Io).with_message("server shutdown timed out"));
                }
            }
        }
    };
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/get_data/:key", get(get_data))
        .route("/get_sura_data/:sura_id/:aya_no", get(get_sura_data))
        .route("/all_columns", get(all_columns))
        .route("/get_surah_name/:sura_id", get(get_surah_name))
        .route("/search_ayat/:word", get(search_ayat))
        .route("/get_translations/:sura_id/:aya_no", get(get_translations))
        .route("/search_form/:form", get(search_form))
        .route("/get_surah_content/:sura_id", get(get_surah_content))
        .route(
            "/get_surah_range/:sura_id/:start_aya/:end_aya",
            get(get_surah_range),
        )
        .route("/get_ayah_count/:sura_id", get(get_ayah_count))
        .route("/all_endpoints", get(all_endpoints))
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn is_loopback(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(addr) => addr.is_loopback(),
        IpAddr::V6(addr) => addr.is_loopback(),
    }
}

fn validate_config(config: &ServeConfig) -> Result<(), Error> {
    if !is_loopback(config.bind.ip()) && !config.allow_non_loopback {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("non-loopback bind requires explicit opt-in")
            .with_hint("Re-run with --allow-non-loopback or use a loopback address."));
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    #[cfg(not(unix))]
    ctrl_c.await;
}

#[derive(Debug, Deserialize)]
struct TranslationQuery {
    with_translation: Option<String>,
}

async fn root() -> Response {
    json_response(&api::welcome())
}

async fn healthz() -> Response {
    json_response(&json!({ "ok": true }))
}

async fn get_data(
    State(state): State<Arc<AppState>>,
    AxumPath(key): AxumPath<String>,
) -> Response {
    match api::column_data(&state.engine, &key) {
        Ok(payload) => json_response(&payload),
        Err(err) => error_response(err),
    }
}

async fn get_sura_data(
    State(state): State<Arc<AppState>>,
    AxumPath((sura, aya)): AxumPath<(String, String)>,
) -> Response {
    let (sura, aya) = match (parse_id("sura_id", &sura), parse_id("aya_no", &aya)) {
        (Ok(sura), Ok(aya)) => (sura, aya),
        (Err(err), _) | (_, Err(err)) => return error_response(err),
    };
    match api::verse(&state.engine, sura, aya) {
        Ok(record) => json_response(&record),
        Err(err) => error_response(err),
    }
}

async fn all_columns(State(state): State<Arc<AppState>>) -> Response {
    json_response(&api::all_columns(&state.engine))
}

async fn get_surah_name(
    State(state): State<Arc<AppState>>,
    AxumPath(sura): AxumPath<String>,
) -> Response {
    let sura = match parse_id("sura_id", &sura) {
        Ok(sura) => sura,
        Err(err) => return error_response(err),
    };
    match api::surah_name(&state.engine, sura) {
        Ok(record) => json_response(&record),
        Err(err) => error_response(err),
    }
}

async fn search_ayat(
    State(state): State<Arc<AppState>>,
    AxumPath(word): AxumPath<String>,
) -> Response {
    match api::search_ayat(&state.engine, &word) {
        Ok(payload) => json_response(&payload),
        Err(err) => error_response(err),
    }
}

async fn get_translations(
    State(state): State<Arc<AppState>>,
    AxumPath((sura, aya)): AxumPath<(String, String)>,
) -> Response {
    let (sura, aya) = match (parse_id("sura_id", &sura), parse_id("aya_no", &aya)) {
        (Ok(sura), Ok(aya)) => (sura, aya),
        (Err(err), _) | (_, Err(err)) => return error_response(err),
    };
    match api::translations(&state.engine, sura, aya) {
        Ok(record) => json_response(&record),
        Err(err) => error_response(err),
    }
}

async fn search_form(
    State(state): State<Arc<AppState>>,
    AxumPath(form): AxumPath<String>,
) -> Response {
    match api::search_form(&state.engine, &form) {
        Ok(payload) => json_response(&payload),
        Err(err) => error_response(err),
    }
}

async fn get_surah_content(
    State(state): State<Arc<AppState>>,
    AxumPath(sura): AxumPath<String>,
    Query(query): Query<TranslationQuery>,
) -> Response {
    let sura = match parse_id("sura_id", &sura) {
        Ok(sura) => sura,
        Err(err) => return error_response(err),
    };
    let with_translation = match parse_flag(query.with_translation.as_deref()) {
        Ok(flag) => flag,
        Err(err) => return error_response(err),
    };
    match api::surah_content(&state.engine, sura, with_translation) {
        Ok(payload) => json_response(&payload),
        Err(err) => error_response(err),
    }
}

async fn get_surah_range(
    State(state): State<Arc<AppState>>,
    AxumPath((sura, start, end)): AxumPath<(String, String, String)>,
    Query(query): Query<TranslationQuery>,
) -> Response {
    let ids = (
        parse_id("sura_id", &sura),
        parse_id("start_aya", &start),
        parse_id("end_aya", &end),
    );
    let (sura, start, end) = match ids {
        (Ok(sura), Ok(start), Ok(end)) => (sura, start, end),
        (Err(err), _, _) | (_, Err(err), _) | (_, _, Err(err)) => {
            return error_response(err);
        }
    };
    let with_translation = match parse_flag(query.with_translation.as_deref()) {
        Ok(flag) => flag,
        Err(err) => return error_response(err),
    };
    match api::surah_range(&state.engine, sura, start, end, with_translation) {
        Ok(payload) => json_response(&payload),
        Err(err) => error_response(err),
    }
}

async fn get_ayah_count(
    State(state): State<Arc<AppState>>,
    AxumPath(sura): AxumPath<String>,
) -> Response {
    match parse_id("sura_id", &sura) {
        Ok(sura) => json_response(&api::ayah_count(&state.engine, sura)),
        Err(err) => error_response(err),
    }
}

async fn all_endpoints() -> Response {
    json_response(&api::all_endpoints())
}

async fn route_not_found() -> Response {
    error_response(Error::new(ErrorKind::NotFound).with_message("Not Found"))
}

fn parse_id(name: &str, raw: &str) -> Result<i64, Error> {
    raw.trim().parse::<i64>().map_err(|_| {
        Error::new(ErrorKind::Usage).with_message(format!("`{name}` must be an integer, got `{raw}`"))
    })
}

fn parse_flag(raw: Option<&str>) -> Result<bool, Error> {
    let Some(raw) = raw else {
        return Ok(false);
    };
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(Error::new(ErrorKind::Usage)
            .with_message(format!("`with_translation` must be a boolean, got `{raw}`"))
            .with_hint("Use with_translation=true or with_translation=false.")),
    }
}

fn json_response<T: Serialize>(payload: &T) -> Response {
    Json(payload).into_response()
}

fn error_response(err: Error) -> Response {
    let status = match err.kind() {
        ErrorKind::Usage => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Corrupt | ErrorKind::Io | ErrorKind::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
    } else {
        tracing::debug!(error = %err, "request rejected");
    }
    (status, Json(api::error_payload(&err))).into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::to_bytes;
    use axum::extract::{Path as AxumPath, Query, State};
    use axum::http::StatusCode;
    use axum::response::Response;
    use serde_json::{Value, json};

    use super::{
        AppState, ServeConfig, TranslationQuery, get_ayah_count, get_data, get_surah_range,
        get_sura_data, parse_flag, serve, validate_config,
    };
    use ayat::api::{DataFormat, ErrorKind, QueryEngine, parse_table};

    const DATASET: &str = "\
SuraID,AyaNo,SurahNameE,SurahNameU,Arabic Text,Fateh Muhammad Jalandhri,Mehmood ul Hassan
1,1,Al-Fatiha,الفاتحہ,بسم,شروع,شروع کرتا ہوں
1,2,Al-Fatiha,الفاتحہ,الحمد,سب تعریف,سب تعریفیں
";

    fn state() -> State<Arc<AppState>> {
        let table = parse_table(DATASET, DataFormat::Csv).expect("table");
        let engine = QueryEngine::new(table).expect("engine");
        State(Arc::new(AppState { engine }))
    }

    async fn body_json(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    fn config(bind: &str, allow_non_loopback: bool) -> ServeConfig {
        ServeConfig {
            bind: bind.parse().expect("bind"),
            data_path: "quran.csv".into(),
            allow_non_loopback,
        }
    }

    #[tokio::test]
    async fn serve_rejects_non_loopback_bind() {
        let err = serve(config("0.0.0.0:0", false))
            .await
            .expect_err("expected usage error");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn non_loopback_requires_allow_flag() {
        let err = validate_config(&config("0.0.0.0:8000", false)).expect_err("usage error");
        assert_eq!(err.kind(), ErrorKind::Usage);
        validate_config(&config("0.0.0.0:8000", true)).expect("allowed");
        validate_config(&config("[::1]:8000", false)).expect("loopback v6");
    }

    #[test]
    fn translation_flag_accepts_common_spellings() {
        assert!(!parse_flag(None).expect("default"));
        assert!(parse_flag(Some("True")).expect("true"));
        assert!(parse_flag(Some("1")).expect("one"));
        assert!(!parse_flag(Some("off")).expect("off"));
        let err = parse_flag(Some("maybe")).expect_err("bad flag");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[tokio::test]
    async fn not_found_maps_to_404_with_error_body() {
        let response = get_data(state(), AxumPath("Tafseer".to_string())).await;
        let (status, body) = body_json(response).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Key not found in the file" }));
    }

    #[tokio::test]
    async fn non_integer_ids_are_bad_requests() {
        let path = AxumPath(("one".to_string(), "1".to_string()));
        let response = get_sura_data(state(), path).await;
        let (status, body) = body_json(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().is_some_and(|msg| msg.contains("sura_id")));
    }

    #[tokio::test]
    async fn range_and_count_handlers_return_payloads() {
        let response = get_surah_range(
            state(),
            AxumPath(("1".to_string(), "1".to_string(), "2".to_string())),
            Query(TranslationQuery {
                with_translation: None,
            }),
        )
        .await;
        let (status, body) = body_json(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "surah_range": [
                { "AyaNo": 1, "Arabic Text": "بسم" },
                { "AyaNo": 2, "Arabic Text": "الحمد" }
            ]})
        );

        let response = get_ayah_count(state(), AxumPath("9".to_string())).await;
        let (status, body) = body_json(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "sura_id": 9, "ayah_count": 0 }));
    }
}
