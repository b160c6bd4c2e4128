use crate::api::error::{ApiError, ApiResult};
use crate::api::types::*;
use crate::config::ClientConfig;
use crate::coordinator::{KnownPeerList, OutboundSendRequest, PeerAddress};
use reqwest::multipart::{Form, Part};
use reqwest::Response;

/// Request/response half of the backend API.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl RestClient {
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `POST /connect`
    pub async fn connect(&self, address: &PeerAddress) -> ApiResult<MessageResponse> {
        let url = self.config.endpoint("/connect")?;
        tracing::debug!("Connecting to peer {} via {}", address, url);

        let response = self
            .http
            .post(url)
            .json(&ConnectRequest::from(address))
            .send()
            .await?;

        read_message(response).await
    }

    /// `GET /clients`
    pub async fn list_peers(&self) -> ApiResult<KnownPeerList> {
        let url = self.config.endpoint("/clients")?;
        let response = check_status(self.http.get(url).send().await?).await?;

        let body = response.bytes().await?;
        let peers: Vec<String> = serde_json::from_slice(&body)?;

        // Blank identifiers cannot be selected as a target, so they are not listed.
        Ok(peers.iter().filter_map(|p| PeerAddress::parse(p)).collect())
    }

    /// `POST /sendfile` with the file bytes and the target peer as multipart parts.
    pub async fn send_file(&self, request: &OutboundSendRequest) -> ApiResult<MessageResponse> {
        let url = self.config.endpoint("/sendfile")?;

        let data = tokio::fs::read(&request.file).await?;
        let filename = request
            .file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ApiError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("{} has no file name", request.file.display()),
                ))
            })?;

        tracing::debug!(
            "Uploading {} ({} bytes) for {}",
            filename,
            data.len(),
            request.target
        );

        let file_part = Part::bytes(data)
            .file_name(filename)
            .mime_str("application/octet-stream")?;
        let form = Form::new()
            .part("file", file_part)
            .text("target", request.target.to_string());

        let response = self.http.post(url).multipart(form).send().await?;
        read_message(response).await
    }
}

async fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await.unwrap_or_default();
    let message = serde_json::from_slice::<ErrorResponse>(&body)
        .map(|e| e.error)
        .ok()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| format!("HTTP {status}"));

    Err(ApiError::Backend {
        status: status.as_u16(),
        message,
    })
}

async fn read_message(response: Response) -> ApiResult<MessageResponse> {
    let response = check_status(response).await?;
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}
