//! Wire types shared by the coordinator and its clients.

use serde::{Deserialize, Serialize};
use tiny_http::Method;

/// `POST /extract` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    pub filename: String,
    pub code: String,
    /// Path of the module being transformed; defaults to `filename`.
    #[serde(default)]
    pub resource_path: String,
}

impl ExtractRequest {
    pub fn resource(&self) -> &str {
        if self.resource_path.is_empty() {
            &self.filename
        } else {
            &self.resource_path
        }
    }
}

/// `500` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// `GET /css` query parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CssQuery {
    pub file_num: Option<u32>,
    pub import_main_css: bool,
    pub wait_for_idle: bool,
}

impl CssQuery {
    /// Parse the query part of a request URL.
    ///
    /// An unparsable `fileNum` selects the base stylesheet. Boolean flags
    /// are on when present with any value other than `false`.
    pub fn from_url(url: &str) -> Self {
        let query = url.split_once('?').map_or("", |(_, q)| q);
        let mut parsed = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "fileNum" => parsed.file_num = value.parse().ok(),
                "importMainCss" => parsed.import_main_css = flag(&value),
                "waitForIdle" => parsed.wait_for_idle = flag(&value),
                _ => {}
            }
        }
        parsed
    }

    /// Render as a query string (without the leading `?`).
    pub fn to_query(self) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        if let Some(n) = self.file_num {
            query.append_pair("fileNum", &n.to_string());
        }
        if self.import_main_css {
            query.append_pair("importMainCss", "true");
        }
        if self.wait_for_idle {
            query.append_pair("waitForIdle", "true");
        }
        query.finish()
    }
}

fn flag(value: &str) -> bool {
    !value.eq_ignore_ascii_case("false") && value != "0"
}

/// Request routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Health,
    Extract,
    Css,
    NotFound,
}

impl Route {
    pub const HEALTH: &'static str = "/health";
    pub const EXTRACT: &'static str = "/extract";
    pub const CSS: &'static str = "/css";

    pub fn classify(method: &Method, url: &str) -> Self {
        let path = url.split_once('?').map_or(url, |(p, _)| p);
        match (method, path) {
            (Method::Get, Self::HEALTH) => Self::Health,
            (Method::Post, Self::EXTRACT) => Self::Extract,
            (Method::Get, Self::CSS) => Self::Css,
            _ => Self::NotFound,
        }
    }
}
