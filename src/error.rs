use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("{0}")]
    Lookup(String),

    #[error("Zabbix connection error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Zabbix returned an error ({status}): {message}")]
    Status {
        status: StatusCode,
        message: String,
    },

    #[error("{method} failed ({code}): {}", api_details(.message, .data))]
    Api {
        method: String,
        code: i64,
        message: String,
        data: Option<String>,
    },

    #[error("Got an invalid response from Zabbix: {0}")]
    Protocol(String),

    #[error("VLAN {name}: {source}")]
    Vlan {
        name: String,
        #[source]
        source: Box<Error>,
    },
}

/// Joins a JSON-RPC error message with its optional details.
pub fn describe(message: &str, data: Option<&str>) -> String {
    match data.map(str::trim) {
        Some(data) if !data.is_empty() => format!("{} {}", message.trim(), data),
        _ => message.trim().to_owned(),
    }
}

fn api_details(message: &str, data: &Option<String>) -> String {
    describe(message, data.as_deref())
}
