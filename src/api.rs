use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use log::{debug, info};
use reqwest::{Client as HttpClient, ClientBuilder, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use url::Url;

use crate::core::GenericResult;
use crate::error::{self, Error, Result};
use crate::metrics::Series;
use crate::types::{ApiVersion, Graph, GraphItem, HistoryRecord, JSONRPC_VERSION, Request, Response};

const ENDPOINT: &str = "api_jsonrpc.php";
const CONTENT_TYPE: &str = "application/json-rpc";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

// Numeric (unsigned) history
const HISTORY_UNSIGNED: u8 = 3;

const USERNAME_PARAM_SINCE: ApiVersion = ApiVersion::new(5, 4);
const BEARER_AUTH_SINCE: ApiVersion = ApiVersion::new(6, 4);

/// Zabbix JSON-RPC session.
pub struct Client {
    url: Url,
    client: HttpClient,
    request_id: AtomicU64,
    version: Option<ApiVersion>,
    token: Option<String>,
}

impl Client {
    pub fn new(server_url: &Url, timeout: Option<Duration>) -> GenericResult<Client> {
        let url = if server_url.path().ends_with(ENDPOINT) {
            server_url.clone()
        } else {
            let mut url = server_url.clone();
            if !url.path().ends_with('/') {
                url.set_path(&format!("{}/", url.path()));
            }
            url.join(ENDPOINT).map_err(|e| format!("Invalid URL: {e}"))?
        };

        let mut builder = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::none());

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Client {
            url,
            client: builder.build()?,
            request_id: AtomicU64::new(1),
            version: None,
            token: None,
        })
    }

    pub async fn api_version(&mut self) -> Result<ApiVersion> {
        if let Some(version) = self.version {
            return Ok(version);
        }

        let version: String = self.call("apiinfo.version", json!([]), false).await?;
        let version = ApiVersion::parse(&version).ok_or_else(|| Error::Protocol(format!(
            "invalid API version: {version:?}")))?;

        debug!("Zabbix API version: {version}.");
        self.version = Some(version);

        Ok(version)
    }

    pub async fn login(&mut self, user: &str, password: &str) -> Result<()> {
        let version = self.api_version().await?;
        info!("Logging in to {} (API {version}) as {user}...", self.url);

        let user_param = if version >= USERNAME_PARAM_SINCE { "username" } else { "user" };
        let mut params = Map::new();
        params.insert(user_param.to_owned(), user.into());
        params.insert("password".to_owned(), password.into());

        self.token = None;

        let token: String = self.call("user.login", params, false).await.map_err(|e| match e {
            Error::Api {message, data, ..} => Error::Authentication(error::describe(&message, data.as_deref())),
            err => err,
        })?;

        self.token = Some(token);
        Ok(())
    }

    pub async fn logout(&mut self) -> Result<()> {
        if self.token.is_none() {
            return Ok(());
        }

        let result = self.call::<Value>("user.logout", json!([]), true).await;
        self.token = None;
        result?;

        debug!("Logged out from {}.", self.url);
        Ok(())
    }

    pub async fn list_graphs(&self, host_id: &str) -> Result<Vec<Graph>> {
        self.call("graph.get", json!({
            "output": ["graphid", "name"],
            "hostids": host_id,
            "sortfield": "name",
        }), true).await
    }

    /// Resolves the graph to its only item.
    pub async fn resolve_item_id(&self, graph_id: &str) -> Result<String> {
        let mut items: Vec<GraphItem> = self.call("graphitem.get", json!({
            "output": ["itemid"],
            "graphids": graph_id,
        }), true).await?;

        match items.len() {
            1 => Ok(items.remove(0).itemid),
            0 => Err(Error::Lookup(format!("Graph {graph_id} has no items"))),
            count => Err(Error::Lookup(format!(
                "Graph {graph_id} has {count} items when exactly one is expected"))),
        }
    }

    pub async fn fetch_series(&self, item_id: &str, time_from: i64, time_till: i64) -> Result<Series> {
        let records: Vec<HistoryRecord> = self.call("history.get", json!({
            "output": "extend",
            "history": HISTORY_UNSIGNED,
            "itemids": item_id,
            "time_from": time_from,
            "time_till": time_till,
            "sortfield": "clock",
            "sortorder": "ASC",
        }), true).await?;

        let values = records.into_iter().map(|record| {
            record.value.trim().parse::<u64>().map_err(|_| Error::Protocol(format!(
                "item {item_id} has a non-integer value: {:?}", record.value)))
        }).collect::<Result<Vec<_>>>()?;

        debug!("Got {} samples for item {item_id}.", values.len());
        Ok(Series::new(item_id, time_from, time_till, values))
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: impl Serialize, authenticated: bool) -> Result<T> {
        let mut auth = None;
        let mut bearer = None;

        if authenticated {
            let token = self.token.as_deref().ok_or_else(|| Error::Authentication(format!(
                "{method} requires an active session")))?;

            if self.version.is_some_and(|version| version >= BEARER_AUTH_SINCE) {
                bearer = Some(token);
            } else {
                auth = Some(token);
            }
        }

        let request = Request {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
            id: self.request_id.fetch_add(1, Ordering::Relaxed),
            auth,
        };

        debug!("Calling {method}...");

        let mut builder = self.client.post(self.url.clone())
            .header(header::CONTENT_TYPE, CONTENT_TYPE)
            .json(&request);

        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|e| e.to_string());
            return Err(Error::Status {status, message: message.trim().to_owned()});
        }

        let body = response.bytes().await?;

        let response: Response = serde_json::from_slice(&body).map_err(|e| Error::Protocol(format!(
            "{method}: {e}")))?;

        if let Some(error) = response.error {
            return Err(if error.is_session_error() {
                Error::Authentication(error.describe())
            } else {
                Error::Api {
                    method: method.to_owned(),
                    code: error.code,
                    message: error.message,
                    data: error.data,
                }
            });
        }

        let result = response.result.ok_or_else(|| Error::Protocol(format!(
            "{method}: the response has no result")))?;

        serde_json::from_value(result).map_err(|e| Error::Protocol(format!(
            "{method}: unexpected result: {e}")))
    }
}
