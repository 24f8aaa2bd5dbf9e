//! JSON-RPC client for a wallet backend service.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;

use zvote_types::{Election, KeyMaterial, SubmissionKind, VoteRecord, VotingPower};

use crate::backend::Backend;
use crate::progress::ProgressSender;
use crate::GatewayError;

// ── HttpBackend ─────────────────────────────────────────────────────────

/// [`Backend`] over HTTP.
///
/// Every operation is a POST of `{"action": <name>, ...params}` to the
/// backend URL, answered with `{"result": ...}` or `{"error": ...}`. The
/// download is answered with newline-delimited JSON instead: one
/// `{"height": n}` line per progress step, then a `result` or `error` line.
#[derive(Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    backend_url: String,
    request_timeout: Duration,
}

impl HttpBackend {
    /// Create a client for the backend at `backend_url` (e.g. `http://127.0.0.1:7180`).
    ///
    /// `request_timeout` bounds every call except the download, which runs
    /// for as long as the backend keeps streaming.
    pub fn new(
        backend_url: impl Into<String>,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| GatewayError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            backend_url: backend_url.into(),
            request_timeout,
        })
    }

    /// The configured backend URL.
    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    fn request_body(
        action: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, GatewayError> {
        let mut body = params;
        body.as_object_mut()
            .ok_or_else(|| GatewayError::Decode("params must be a JSON object".into()))?
            .insert("action".to_string(), serde_json::json!(action));
        Ok(body)
    }

    async fn post(
        &self,
        action: &str,
        params: serde_json::Value,
        bounded: bool,
    ) -> Result<reqwest::Response, GatewayError> {
        let body = Self::request_body(action, params)?;
        let mut request = self.http.post(&self.backend_url).json(&body);
        if bounded {
            request = request.timeout(self.request_timeout);
        }
        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::Status(response.status().as_u16()));
        }
        Ok(response)
    }

    /// Send a JSON-RPC request and return the `result` field.
    async fn rpc_call(
        &self,
        action: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, GatewayError> {
        tracing::debug!(action, "backend call");
        let response = self.post(action, params, true).await?;
        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(format!("{action}: {e}")))?;
        into_result(json)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        action: &str,
        params: serde_json::Value,
    ) -> Result<T, GatewayError> {
        let result = self.rpc_call(action, params).await?;
        serde_json::from_value(result)
            .map_err(|e| GatewayError::Decode(format!("invalid {action} response: {e}")))
    }
}

/// Split a response envelope into its `result`, or the backend's error verbatim.
fn into_result(json: serde_json::Value) -> Result<serde_json::Value, GatewayError> {
    if let Some(err) = json.get("error") {
        let message = match err.as_str() {
            Some(s) => s.to_string(),
            None => err.to_string(),
        };
        return Err(GatewayError::Backend(message));
    }
    Ok(json.get("result").cloned().unwrap_or(serde_json::Value::Null))
}

#[async_trait]
impl Backend for HttpBackend {
    async fn http_get(&self, url: &str) -> Result<String, GatewayError> {
        let response = self
            .http
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(GatewayError::Status(response.status().as_u16()));
        }
        response
            .text()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }

    async fn set_election(
        &self,
        url: &str,
        election: &Election,
        key: &KeyMaterial,
    ) -> Result<(), GatewayError> {
        self.rpc_call(
            "set_election",
            serde_json::json!({ "url": url, "election": election, "key": key.expose() }),
        )
        .await?;
        Ok(())
    }

    async fn save_db(&self, path: &Path) -> Result<(), GatewayError> {
        self.rpc_call(
            "save_db",
            serde_json::json!({ "path": path.to_string_lossy() }),
        )
        .await?;
        Ok(())
    }

    async fn open_db(&self, path: &Path) -> Result<(), GatewayError> {
        self.rpc_call(
            "open_db",
            serde_json::json!({ "path": path.to_string_lossy() }),
        )
        .await?;
        Ok(())
    }

    async fn get_election(&self) -> Result<Election, GatewayError> {
        let election: Option<Election> =
            self.call("get_election", serde_json::json!({})).await?;
        Ok(election.unwrap_or_default())
    }

    async fn validate_key(&self, key: &KeyMaterial) -> Result<bool, GatewayError> {
        self.call("validate_key", serde_json::json!({ "key": key.expose() }))
            .await
    }

    async fn get_address(&self) -> Result<String, GatewayError> {
        self.call("get_address", serde_json::json!({})).await
    }

    async fn sync(&self) -> Result<(), GatewayError> {
        self.rpc_call("sync", serde_json::json!({})).await?;
        Ok(())
    }

    async fn get_sync_height(&self) -> Result<Option<u32>, GatewayError> {
        self.call("get_sync_height", serde_json::json!({})).await
    }

    async fn get_available_balance(&self) -> Result<VotingPower, GatewayError> {
        let raw: u64 = self
            .call("get_available_balance", serde_json::json!({}))
            .await?;
        Ok(VotingPower::from_subunits(raw))
    }

    async fn download_reference_data(
        &self,
        progress: ProgressSender,
    ) -> Result<(), GatewayError> {
        tracing::debug!(action = "download_reference_data", "backend call");
        let mut response = self
            .post("download_reference_data", serde_json::json!({}), false)
            .await?;

        let mut lines = LineBuffer::default();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?
        {
            for line in lines.push(&chunk) {
                match parse_download_line(&line)? {
                    DownloadLine::Height(h) => progress.report(h).await?,
                    DownloadLine::Done => return Ok(()),
                    DownloadLine::Blank => {}
                }
            }
        }
        if let Some(line) = lines.finish() {
            if parse_download_line(&line)? == DownloadLine::Done {
                return Ok(());
            }
        }
        Err(GatewayError::Decode(
            "download stream ended without a result".into(),
        ))
    }

    async fn compute_roots(&self) -> Result<(), GatewayError> {
        self.rpc_call("compute_roots", serde_json::json!({})).await?;
        Ok(())
    }

    async fn get_prop(&self, name: &str) -> Result<String, GatewayError> {
        let value: Option<String> = self
            .call("get_prop", serde_json::json!({ "name": name }))
            .await?;
        value.ok_or_else(|| GatewayError::UnknownProperty(name.to_string()))
    }

    async fn submit(
        &self,
        kind: SubmissionKind,
        address: &str,
        amount: VotingPower,
    ) -> Result<String, GatewayError> {
        self.call(
            kind.as_str(),
            serde_json::json!({ "address": address, "amount": amount.subunits() }),
        )
        .await
    }

    async fn fetch_votes(&self) -> Result<Vec<VoteRecord>, GatewayError> {
        self.call("fetch_votes", serde_json::json!({})).await
    }
}

// ── Download stream framing ─────────────────────────────────────────────

/// One decoded line of the download stream.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DownloadLine {
    Height(u32),
    Done,
    Blank,
}

fn parse_download_line(line: &str) -> Result<DownloadLine, GatewayError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(DownloadLine::Blank);
    }
    let json: serde_json::Value = serde_json::from_str(line)
        .map_err(|e| GatewayError::Decode(format!("download line {line:?}: {e}")))?;
    if let Some(height) = json.get("height") {
        let height = height
            .as_u64()
            .and_then(|h| u32::try_from(h).ok())
            .ok_or_else(|| GatewayError::Decode(format!("invalid height: {height}")))?;
        return Ok(DownloadLine::Height(height));
    }
    into_result(json)?;
    Ok(DownloadLine::Done)
}

/// Reassembles newline-terminated lines from arbitrarily split chunks.
#[derive(Default)]
struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    fn finish(self) -> Option<String> {
        if self.pending.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&self.pending).into_owned())
        }
    }
}
