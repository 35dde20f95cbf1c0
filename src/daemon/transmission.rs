use super::eta::format_eta_seconds;
use super::TorrentDaemon;
use crate::core::config::TransmissionConfig;
use crate::core::error::DispatchError;
use crate::identity::magnet::normalize_info_hash;
use crate::models::torrent_status::DaemonTorrentStatus;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

const SESSION_HEADER: &str = "X-Transmission-Session-Id";
const MAX_ATTEMPTS: usize = 3;
const TORRENT_FIELDS: [&str; 8] = [
    "id",
    "name",
    "status",
    "percentDone",
    "eta",
    "magnetLink",
    "hashString",
    "error",
];

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Default, Deserialize)]
struct TorrentList {
    #[serde(default)]
    torrents: Vec<RpcTorrent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcTorrent {
    id: Option<i64>,
    name: Option<String>,
    status: Option<i64>,
    percent_done: Option<f64>,
    eta: Option<i64>,
    magnet_link: Option<String>,
    hash_string: Option<String>,
    error: Option<i64>,
}

/// Human label for a Transmission status code
pub fn status_label(code: Option<i64>, error: Option<i64>) -> &'static str {
    if error.is_some_and(|e| e != 0) {
        return "error";
    }
    match code {
        Some(0) => "stopped",
        Some(1) => "check pending",
        Some(2) => "checking",
        Some(3) => "download pending",
        Some(4) => "downloading",
        Some(5) => "seed pending",
        Some(6) => "seeding",
        _ => "unknown",
    }
}

impl From<RpcTorrent> for DaemonTorrentStatus {
    fn from(torrent: RpcTorrent) -> Self {
        let name = torrent
            .name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "(untitled)".to_string());

        DaemonTorrentStatus {
            torrent_id: torrent.id,
            name,
            status: status_label(torrent.status, torrent.error).to_string(),
            percent_done: torrent.percent_done.unwrap_or(0.0) * 100.0,
            eta: torrent.eta.and_then(format_eta_seconds),
            magnet: torrent.magnet_link.filter(|m| !m.is_empty()),
            info_hash: torrent.hash_string.as_deref().and_then(normalize_info_hash),
        }
    }
}

/// Transmission JSON-RPC client
pub struct TransmissionClient {
    config: TransmissionConfig,
    endpoint: String,
    client: Client,
    session_id: Mutex<Option<String>>,
}

impl TransmissionClient {
    pub fn new(config: TransmissionConfig) -> Result<Self, DispatchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs_f64(config.request_timeout))
            .build()?;

        let rpc_path = if config.rpc_path.starts_with('/') {
            config.rpc_path.clone()
        } else {
            format!("/{}", config.rpc_path)
        };
        let endpoint = format!("http://{}:{}{}", config.host, config.port, rpc_path);

        Ok(Self {
            config,
            endpoint,
            client,
            session_id: Mutex::new(None),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn cached_session_id(&self) -> Option<String> {
        self.session_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store_session_id(&self, id: Option<String>) {
        *self.session_id.lock().unwrap_or_else(PoisonError::into_inner) = id;
    }

    /// Send one RPC call, renegotiating the session id on HTTP 409
    async fn call(&self, method: &str, arguments: Value) -> Result<Value, DispatchError> {
        let payload = json!({ "method": method, "arguments": arguments });
        let user = self.config.username.as_deref().map(str::trim).unwrap_or_default();

        for _ in 0..MAX_ATTEMPTS {
            let mut request = self.client.post(&self.endpoint).json(&payload);
            if let Some(id) = self.cached_session_id() {
                request = request.header(SESSION_HEADER, id);
            }
            if !user.is_empty() {
                request = request.basic_auth(user, self.config.password.as_deref());
            }

            let response = request.send().await?;

            if response.status() == StatusCode::CONFLICT {
                let id = response
                    .headers()
                    .get(SESSION_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string);
                debug!(method, "Transmission session id refreshed");
                self.store_session_id(id);
                continue;
            }
            if !response.status().is_success() {
                return Err(DispatchError::HttpStatus(response.status().as_u16()));
            }

            let body: RpcResponse = response.json().await?;
            if body.result != "success" {
                return Err(DispatchError::Rejected(body.result));
            }
            return Ok(body.arguments);
        }

        Err(DispatchError::SessionNegotiation)
    }
}

#[async_trait]
impl TorrentDaemon for TransmissionClient {
    async fn submit(
        &self,
        magnet: &str,
        start: bool,
        download_dir: Option<&str>,
    ) -> Result<(), DispatchError> {
        let download_dir = download_dir
            .filter(|dir| !dir.trim().is_empty())
            .unwrap_or(&self.config.download_dir);

        let mut arguments = json!({ "filename": magnet, "paused": !start });
        if !download_dir.is_empty() {
            arguments["download-dir"] = json!(download_dir);
        }

        let result = self.call("torrent-add", arguments).await?;

        if let Some(duplicate) = result.get("torrent-duplicate") {
            info!(name = ?duplicate.get("name"), "Torrent already present in Transmission");
        } else {
            info!(download_dir, start, "Torrent added to Transmission");
        }
        Ok(())
    }

    async fn list_status(&self, active_only: bool) -> Result<Vec<DaemonTorrentStatus>, DispatchError> {
        let arguments = self
            .call("torrent-get", json!({ "fields": TORRENT_FIELDS }))
            .await?;

        let list: TorrentList =
            serde_json::from_value(arguments).map_err(|e| DispatchError::Decode(e.to_string()))?;

        let statuses = list
            .torrents
            .into_iter()
            .map(DaemonTorrentStatus::from)
            .filter(|status| !active_only || !status.is_complete())
            .collect();
        Ok(statuses)
    }

    async fn remove(&self, torrent_id: i64, delete_data: bool) -> Result<(), DispatchError> {
        self.call(
            "torrent-remove",
            json!({ "ids": [torrent_id], "delete-local-data": delete_data }),
        )
        .await?;

        info!(torrent_id, delete_data, "Torrent removed from Transmission");
        Ok(())
    }
}
