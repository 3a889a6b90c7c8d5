//! sw_fetch tool implementation.
//!
//! Dispatches a request through the worker's fetch handler. Requests the
//! worker passes through are sent to the network directly, as a browser
//! would. The tool answers only after every cache write the event started
//! has settled.

use std::collections::BTreeMap;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{Network, resolve};
use swcache_core::{Destination, Error, Method, Request, RequestMode, Response};
use swcache_worker::{FetchOutcome, ResponseSource};

use super::{WorkerContext, json_result};
use crate::error::ToolError;

/// Parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL, or a path resolved against the worker scope.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<Method>,

    /// Request mode: "navigate", "same-origin", "no-cors" or "cors" (default).
    #[serde(default)]
    pub mode: Option<RequestMode>,

    /// Request destination, e.g. "document", "script", "style" (default: "").
    #[serde(default)]
    pub destination: Option<Destination>,

    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// UTF-8 request body.
    #[serde(default)]
    pub body: Option<String>,
}

/// How the response was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    Cache,
    Network,
    IndexFallback,
    Offline,
    /// Not intercepted; fetched directly from the network.
    Passthrough,
}

impl From<ResponseSource> for Delivery {
    fn from(source: ResponseSource) -> Self {
        match source {
            ResponseSource::Cache => Delivery::Cache,
            ResponseSource::Network => Delivery::Network,
            ResponseSource::IndexFallback => Delivery::IndexFallback,
            ResponseSource::Offline => Delivery::Offline,
        }
    }
}

/// Output from the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    pub url: String,
    pub delivery: Delivery,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub content_type: Option<String>,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
    pub body_bytes: usize,
    /// Background writes the event started (all settled before returning).
    pub background_writes: usize,
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(ctx: &WorkerContext, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let request = build_request(ctx, params)?;
    let url = request.url.to_string();

    let event = ctx.manager.handle_fetch(request).await;
    let background_writes = event.keep_alive.registered();
    let (response, delivery) = match event.outcome {
        FetchOutcome::Respond { response, source } => (response, Delivery::from(source)),
        FetchOutcome::Passthrough(request) => (ctx.network.fetch(&request).await?, Delivery::Passthrough),
    };
    event.keep_alive.settle().await;

    json_result(&into_output(url, delivery, response, background_writes))
}

fn build_request(ctx: &WorkerContext, params: SwFetchParams) -> Result<Request, McpError> {
    let url = resolve(&ctx.manager.settings().scope, &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

    let mut request = Request::get(url)
        .with_method(params.method.unwrap_or(Method::Get))
        .with_mode(params.mode.unwrap_or_default())
        .with_destination(params.destination.unwrap_or_default());
    for (name, value) in &params.headers {
        if name.trim().is_empty() {
            return Err(ToolError::InvalidInput("header names cannot be empty".into()).into());
        }
        request = request.with_header(name.trim(), value.as_str());
    }
    if let Some(body) = params.body {
        request = request.with_body(body);
    }
    Ok(request)
}

fn into_output(url: String, delivery: Delivery, response: Response, background_writes: usize) -> SwFetchOutput {
    SwFetchOutput {
        url,
        delivery,
        status: response.status,
        content_type: response.content_type().map(str::to_string),
        body: String::from_utf8_lossy(&response.body).into_owned(),
        body_bytes: response.body.len(),
        status_text: response.status_text,
        headers: response.headers,
        background_writes,
    }
}
