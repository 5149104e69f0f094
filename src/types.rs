use std::fmt;

use serde_derive::{Deserialize, Serialize};
use serde_json::Value;

use crate::error;

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Serialize)]
pub struct Request<'a, P: serde::Serialize> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: P,
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<&'a str>,
}

#[derive(Deserialize)]
pub struct Response {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<ErrorObject>,
}

#[derive(Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<String>,
}

impl ErrorObject {
    pub fn describe(&self) -> String {
        error::describe(&self.message, self.data.as_deref())
    }

    pub fn is_session_error(&self) -> bool {
        let data = self.data.as_deref().unwrap_or_default();
        ["Not authorised", "Not authorized", "re-login", "Session terminated"]
            .iter().any(|marker| data.contains(marker))
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Graph {
    #[serde(rename = "graphid")]
    pub id: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct GraphItem {
    pub itemid: String,
}

#[derive(Deserialize)]
pub struct HistoryRecord {
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
}

impl ApiVersion {
    pub const fn new(major: u32, minor: u32) -> ApiVersion {
        ApiVersion {major, minor}
    }

    pub fn parse(version: &str) -> Option<ApiVersion> {
        let mut parts = version.trim().split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        Some(ApiVersion {major, minor})
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
