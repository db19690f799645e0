use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::error;

use crate::domain::value_objects::{
    enums::operation_kinds::OperationKind,
    images::{ImageDimensions, ProcessedImage},
    operations::OperationParams,
};
use crate::usecases::image_processing::ProcessingEngine;

const WIDTH_HEADER: &str = "x-image-width";
const HEIGHT_HEADER: &str = "x-image-height";
const SOURCE_WIDTH_HEADER: &str = "x-source-width";
const SOURCE_HEIGHT_HEADER: &str = "x-source-height";

/// Minimal client for the external pixel engine built on reqwest. The engine
/// speaks raw image bytes in both directions; result dimensions travel in
/// response headers so the body stays a plain byte stream.
pub struct ProcessingEngineClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ProbeResponse {
    width: u32,
    height: u32,
}

impl ProcessingEngineClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        error!(%status, engine_body = %body, "engine: {} failed", context);
        Err(anyhow!("engine {} failed with status {}: {}", context, status, body))
    }

    fn dimension_header(resp: &reqwest::Response, name: &str) -> Result<u32> {
        resp.headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u32>().ok())
            .ok_or_else(|| anyhow!("engine response missing or invalid `{}` header", name))
    }
}

#[async_trait]
impl ProcessingEngine for ProcessingEngineClient {
    async fn probe(&self, image: Vec<u8>) -> Result<ImageDimensions> {
        let url = format!("{}/v1/probe", self.base_url);

        let resp = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(image)
            .send()
            .await
            .context("engine probe request failed")?;
        let resp = Self::ensure_success(resp, "probe").await?;

        let probe = resp
            .json::<ProbeResponse>()
            .await
            .context("engine probe response was not valid JSON")?;

        Ok(ImageDimensions {
            width: probe.width,
            height: probe.height,
        })
    }

    async fn process(
        &self,
        image: Vec<u8>,
        kind: OperationKind,
        params: OperationParams,
    ) -> Result<ProcessedImage> {
        let url = format!("{}/v1/process", self.base_url);

        let mut query: Vec<(&str, String)> = vec![("operation", kind.to_string())];
        query.extend(params.query_pairs());

        let resp = self
            .http
            .post(&url)
            .query(&query)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(image)
            .send()
            .await
            .context("engine process request failed")?;
        let resp = Self::ensure_success(resp, "process").await?;

        let width = Self::dimension_header(&resp, WIDTH_HEADER)?;
        let height = Self::dimension_header(&resp, HEIGHT_HEADER)?;
        let source_width = Self::dimension_header(&resp, SOURCE_WIDTH_HEADER)?;
        let source_height = Self::dimension_header(&resp, SOURCE_HEIGHT_HEADER)?;

        let bytes = resp
            .bytes()
            .await
            .context("engine process response body could not be read")?;

        Ok(ProcessedImage {
            bytes: bytes.to_vec(),
            width,
            height,
            source_width,
            source_height,
        })
    }
}
