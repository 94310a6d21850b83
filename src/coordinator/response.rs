//! HTTP response helpers.

use anyhow::Result;
use serde::Serialize;
use tiny_http::{Header, Request, Response, StatusCode};

use super::protocol::ErrorBody;

pub const TEXT: &str = "text/plain; charset=utf-8";
pub const CSS: &str = "text/css";
pub const JSON: &str = "application/json";

/// `200 ok`.
pub fn respond_health(request: Request) -> Result<()> {
    send_body(request, 200, TEXT, b"ok".to_vec())
}

/// Exactly `404 Not Found`.
pub fn respond_not_found(request: Request) -> Result<()> {
    send_body(request, 404, TEXT, b"Not Found".to_vec())
}

pub fn respond_css(request: Request, css: String) -> Result<()> {
    send_body(request, 200, CSS, css.into_bytes())
}

pub fn respond_json<T: Serialize>(request: Request, status: u16, value: &T) -> Result<()> {
    let body = serde_json::to_vec(value)?;
    send_body(request, status, JSON, body)
}

/// `500 {"error": message}`.
pub fn respond_error(request: Request, message: String) -> Result<()> {
    respond_json(request, 500, &ErrorBody { error: message })
}

fn send_body(request: Request, status: u16, content_type: &str, body: Vec<u8>) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type));
    request.respond(response)?;
    Ok(())
}

fn make_header(name: &str, value: &str) -> Header {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).unwrap()
}
