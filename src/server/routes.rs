use super::query::{parse_query, split_url};
use super::Gateway;
use crate::adapters;
use crate::shared::logging::append_log_line;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::io::Cursor;
use tiny_http::{Header, Method, Request, Response};

/// Closed set of operations the gateway serves. Adding one is a
/// compile-time extension: `resolve` and `respond` both match totally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Run,
    Read,
    FetchApi,
    RunSql,
    ConvertMd,
    TranscribeAudio,
    ResizeImage,
    ResizeImageTo,
    GitCommit,
    History,
}

impl Route {
    pub fn resolve(method: &Method, path: &str) -> Option<Self> {
        match (method, path) {
            (Method::Post, "/run") => Some(Self::Run),
            (Method::Get, "/read") => Some(Self::Read),
            (Method::Post, "/fetch_api") => Some(Self::FetchApi),
            (Method::Post, "/run_sql") => Some(Self::RunSql),
            (Method::Post, "/convert_md") => Some(Self::ConvertMd),
            (Method::Post, "/transcribe_audio") => Some(Self::TranscribeAudio),
            (Method::Post, "/resize_image") => Some(Self::ResizeImage),
            (Method::Post, "/resize_image_to") => Some(Self::ResizeImageTo),
            (Method::Post, "/git_commit") => Some(Self::GitCommit),
            (Method::Get, "/history") => Some(Self::History),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FetchApiParams {
    url: String,
    output_path: String,
}

#[derive(Debug, Deserialize)]
struct RunSqlParams {
    db_path: String,
    query: String,
}

#[derive(Debug, Deserialize)]
struct ConvertMdParams {
    md_path: String,
    output_path: String,
}

#[derive(Debug, Deserialize)]
struct TranscribeAudioParams {
    audio_path: String,
}

#[derive(Debug, Deserialize)]
struct ResizeImageParams {
    image_path: String,
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct ResizeImageToParams {
    image_path: String,
    output_path: String,
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct GitCommitParams {
    repo_url: String,
    commit_message: String,
}

/// Per-request error boundary: every outcome becomes a status-tagged JSON
/// response, and nothing here can take down a worker.
pub fn handle_request(gateway: &Gateway, mut request: Request) {
    let method = request.method().clone();
    let url = request.url().to_string();
    let (status, body) = respond(gateway, &mut request);
    append_log_line(
        &gateway.settings.gateway_log_path(),
        "info",
        "request",
        &format!("{method} {url} -> {status}"),
    );
    let _ = request.respond(json_response(status, &body));
}

fn respond(gateway: &Gateway, request: &mut Request) -> (u16, Value) {
    let url = request.url().to_string();
    let (path, raw_query) = split_url(&url);
    let Some(route) = Route::resolve(request.method(), path) else {
        return error_response(404, "not found");
    };

    match route {
        Route::Run => {
            let params = parse_query(raw_query);
            let Some(task) = params.get("task").filter(|task| !task.is_empty()) else {
                return error_response(400, "missing query parameter `task`");
            };
            let response = gateway.dispatcher().dispatch(task);
            // The dispatch surface always answers 200; callers branch on
            // the embedded status field.
            match serde_json::to_value(&response) {
                Ok(body) => (200, body),
                Err(err) => error_response(500, &err.to_string()),
            }
        }
        Route::Read => {
            let params = parse_query(raw_query);
            let Some(file_path) = params.get("path").filter(|path| !path.is_empty()) else {
                return error_response(400, "missing query parameter `path`");
            };
            match adapters::read_file(&gateway.settings, file_path) {
                Ok(content) => (200, json!({"status": "success", "content": content})),
                Err(err) => adapter_error_response(&err),
            }
        }
        Route::FetchApi => match parse_body::<FetchApiParams>(request) {
            Ok(params) => match adapters::fetch_to_file(
                &gateway.settings,
                gateway.fetch_agent(),
                &params.url,
                &params.output_path,
            ) {
                Ok(()) => (200, json!({"status": "success", "message": "Data fetched"})),
                Err(err) => adapter_error_response(&err),
            },
            Err(message) => error_response(400, &message),
        },
        Route::RunSql => match parse_body::<RunSqlParams>(request) {
            Ok(params) => {
                match adapters::run_select(&gateway.settings, &params.db_path, &params.query) {
                    Ok(rows) => (200, json!({"status": "success", "result": rows})),
                    Err(err) => adapter_error_response(&err),
                }
            }
            Err(message) => error_response(400, &message),
        },
        Route::ConvertMd => match parse_body::<ConvertMdParams>(request) {
            Ok(params) => match adapters::convert_to_html(
                &gateway.settings,
                &params.md_path,
                &params.output_path,
            ) {
                Ok(()) => (
                    200,
                    json!({"status": "success", "message": "Markdown converted to HTML"}),
                ),
                Err(err) => adapter_error_response(&err),
            },
            Err(message) => error_response(400, &message),
        },
        Route::TranscribeAudio => match parse_body::<TranscribeAudioParams>(request) {
            Ok(params) => match adapters::transcribe_file(
                &gateway.settings,
                gateway.transcriber(),
                &params.audio_path,
            ) {
                Ok(transcription) => (
                    200,
                    json!({"status": "success", "transcription": transcription}),
                ),
                Err(err) => adapter_error_response(&err),
            },
            Err(message) => error_response(400, &message),
        },
        Route::ResizeImage => match parse_body::<ResizeImageParams>(request) {
            Ok(params) => match adapters::resize_in_place(
                &gateway.settings,
                &params.image_path,
                params.width,
                params.height,
            ) {
                Ok(()) => (200, json!({"status": "success", "message": "Image resized"})),
                Err(err) => adapter_error_response(&err),
            },
            Err(message) => error_response(400, &message),
        },
        Route::ResizeImageTo => match parse_body::<ResizeImageToParams>(request) {
            Ok(params) => match adapters::resize_to(
                &gateway.settings,
                &params.image_path,
                &params.output_path,
                params.width,
                params.height,
            ) {
                Ok(()) => (200, json!({"status": "success", "message": "Image resized"})),
                Err(err) => adapter_error_response(&err),
            },
            Err(message) => error_response(400, &message),
        },
        Route::GitCommit => match parse_body::<GitCommitParams>(request) {
            Ok(params) => match adapters::commit_and_push(
                &gateway.settings,
                &params.repo_url,
                &params.commit_message,
            ) {
                Ok(()) => (200, json!({"status": "success", "message": "Commit pushed"})),
                Err(err) => adapter_error_response(&err),
            },
            Err(message) => error_response(400, &message),
        },
        Route::History => {
            let params = parse_query(raw_query);
            let limit = params
                .get("limit")
                .and_then(|raw| raw.parse::<usize>().ok())
                .unwrap_or(20);
            match gateway.history.recent(limit) {
                Ok(records) => {
                    let rows: Vec<Value> = records
                        .iter()
                        .map(|record| {
                            json!({
                                "id": record.id,
                                "description": record.description,
                                "status": record.status.as_str(),
                                "output": record.output,
                                "created_at": record.created_at,
                            })
                        })
                        .collect();
                    (200, json!({"status": "success", "tasks": rows}))
                }
                Err(err) => error_response(500, &err.to_string()),
            }
        }
    }
}

fn parse_body<T: DeserializeOwned>(request: &mut Request) -> Result<T, String> {
    serde_json::from_reader(request.as_reader())
        .map_err(|err| format!("invalid request body: {err}"))
}

fn error_response(status: u16, message: &str) -> (u16, Value) {
    (status, json!({"status": "error", "message": message}))
}

fn adapter_error_response(err: &adapters::AdapterError) -> (u16, Value) {
    error_response(err.http_status(), &err.to_string())
}

fn json_response(status: u16, body: &Value) -> Response<Cursor<Vec<u8>>> {
    let mut response =
        Response::from_data(body.to_string().into_bytes()).with_status_code(status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        response.add_header(header);
    }
    response
}
