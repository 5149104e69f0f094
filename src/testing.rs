// In-process fake of the Zabbix JSON-RPC API

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::post;
use serde_json::{Value, json};
use url::Url;

use crate::types::ApiVersion;

pub const USER: &str = "reporter";
pub const PASSWORD: &str = "secret";
pub const TOKEN: &str = "0424bd59b807674191e7d77572075f33";

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub params: Value,
    pub auth: Option<String>,
    pub bearer: Option<String>,
}

#[derive(Default)]
struct FakeState {
    version: String,
    graphs: HashMap<String, Vec<(String, String)>>,
    graph_items: HashMap<String, Vec<String>>,
    history: HashMap<String, Vec<String>>,
    requests: Vec<RecordedRequest>,
}

pub struct FakeZabbix {
    url: Url,
    state: Arc<Mutex<FakeState>>,
}

impl FakeZabbix {
    pub async fn start(version: &str) -> FakeZabbix {
        let state = Arc::new(Mutex::new(FakeState {
            version: version.to_owned(),
            ..Default::default()
        }));

        let app = Router::new()
            .route("/zabbix/api_jsonrpc.php", post(handle))
            .route("/moved/api_jsonrpc.php", post(moved))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = Url::parse(&format!("http://{}/zabbix", listener.local_addr().unwrap())).unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        FakeZabbix {url, state}
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn add_graph(&self, host_id: &str, graph_id: &str, name: &str) {
        self.state.lock().unwrap().graphs.entry(host_id.to_owned()).or_default()
            .push((graph_id.to_owned(), name.to_owned()));
    }

    pub fn add_graph_item(&self, graph_id: &str, item_id: &str) {
        self.state.lock().unwrap().graph_items.entry(graph_id.to_owned()).or_default()
            .push(item_id.to_owned());
    }

    pub fn set_history(&self, item_id: &str, values: &[&str]) {
        self.state.lock().unwrap().history.insert(
            item_id.to_owned(), values.iter().map(|&value| value.to_owned()).collect());
    }

    pub fn requests(&self, method: &str) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.iter()
            .filter(|request| request.method == method)
            .cloned().collect()
    }
}

async fn moved() -> (StatusCode, [(header::HeaderName, &'static str); 1], &'static str) {
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, "https://zabbix.example.com/api_jsonrpc.php")], "Moved Permanently")
}

async fn handle(State(state): State<Arc<Mutex<FakeState>>>, headers: HeaderMap, body: Bytes) -> String {
    let request: Value = serde_json::from_slice(&body).unwrap();
    let id = request["id"].clone();

    let response = match dispatch(&mut state.lock().unwrap(), &headers, &request) {
        Ok(result) => json!({"jsonrpc": "2.0", "result": result, "id": id}),
        Err((code, message, data)) => json!({
            "jsonrpc": "2.0",
            "error": {"code": code, "message": message, "data": data},
            "id": id,
        }),
    };

    response.to_string()
}

type Failure = (i64, &'static str, &'static str);

const INVALID_PARAMS: i64 = -32602;

fn dispatch(state: &mut FakeState, headers: &HeaderMap, request: &Value) -> Result<Value, Failure> {
    let method = request["method"].as_str().unwrap_or_default().to_owned();
    let params = request["params"].clone();
    let auth = request["auth"].as_str().map(ToOwned::to_owned);
    let bearer = headers.get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(ToOwned::to_owned);

    state.requests.push(RecordedRequest {
        method: method.clone(),
        params: params.clone(),
        auth: auth.clone(),
        bearer: bearer.clone(),
    });

    let version = ApiVersion::parse(&state.version).unwrap();

    match method.as_str() {
        "apiinfo.version" => return Ok(json!(state.version)),
        "user.login" => {
            let user_param = if version >= ApiVersion::new(5, 4) { "username" } else { "user" };
            if params[user_param] != USER || params["password"] != PASSWORD {
                return Err((INVALID_PARAMS, "Invalid params.", "Login name or password is incorrect."));
            }
            return Ok(json!(TOKEN));
        },
        _ => {},
    }

    let token = if version >= ApiVersion::new(6, 4) { bearer } else { auth };
    if token.as_deref() != Some(TOKEN) {
        return Err((INVALID_PARAMS, "Invalid params.", "Session terminated, re-login, please."));
    }

    Ok(match method.as_str() {
        "user.logout" => json!(true),

        "graph.get" => {
            let host_id = params["hostids"].as_str().unwrap_or_default();
            let mut graphs = state.graphs.get(host_id).cloned().unwrap_or_default();
            graphs.sort_by(|a, b| a.1.cmp(&b.1));
            graphs.into_iter().map(|(id, name)| json!({"graphid": id, "name": name})).collect()
        },

        "graphitem.get" => {
            let graph_id = params["graphids"].as_str().unwrap_or_default();
            state.graph_items.get(graph_id).cloned().unwrap_or_default().into_iter().enumerate()
                .map(|(index, item_id)| json!({"gitemid": (index + 1).to_string(), "itemid": item_id}))
                .collect()
        },

        "history.get" => {
            let item_id = params["itemids"].as_str().unwrap_or_default();
            let time_from = params["time_from"].as_i64().unwrap_or_default();
            state.history.get(item_id).cloned().unwrap_or_default().into_iter().enumerate()
                .map(|(index, value)| json!({
                    "itemid": item_id,
                    "clock": (time_from + index as i64 * 300).to_string(),
                    "value": value,
                    "ns": "0",
                }))
                .collect()
        },

        _ => return Err((-32601, "Method not found.", "Incorrect API \"method\".")),
    })
}
