use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::ToolsConfig;
use crate::error::ToolError;
use crate::execution_context::ExecutionContext;
use crate::tools::base::{Tool, ToolResult};

const MIN_TIMEOUT_SECS: u64 = 1;
const MAX_TIMEOUT_SECS: u64 = 60;

#[derive(Deserialize)]
struct HttpGetInput {
    url: String,
    #[serde(default)]
    params: Option<HashMap<String, String>>,
    #[serde(default)]
    headers: Option<HashMap<String, String>>,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

pub struct HttpGetTool {
    client: reqwest::Client,
    default_timeout_secs: u64,
    body_limit: usize,
}

impl HttpGetTool {
    pub fn new(config: &ToolsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            default_timeout_secs: config.http_timeout_secs,
            body_limit: config.http_body_limit,
        }
    }
}

#[async_trait]
impl Tool for HttpGetTool {
    fn name(&self) -> &'static str {
        "http.get"
    }

    fn description(&self) -> &'static str {
        "Performs an HTTP GET request and returns status, headers, and a truncated body"
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "url": {"type": "string", "description": "Full http(s) URL to request"},
                "params": {
                    "type": "object",
                    "additionalProperties": {"type": "string"},
                    "description": "Optional query-string parameters"
                },
                "headers": {
                    "type": "object",
                    "additionalProperties": {"type": "string"},
                    "description": "Optional extra request headers"
                },
                "timeout_secs": {"type": "integer", "minimum": 1, "maximum": 60}
            },
            "required": ["url"]
        })
    }

    async fn execute(
        &self,
        _ctx: ExecutionContext,
        input: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        let input: HttpGetInput =
            serde_json::from_value(input).map_err(|e| ToolError::Validation(e.to_string()))?;

        if !input.url.starts_with("http://") && !input.url.starts_with("https://") {
            return Err(ToolError::Validation(
                "URL must use http or https".into(),
            ));
        }

        let timeout = input
            .timeout_secs
            .unwrap_or(self.default_timeout_secs)
            .clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS);

        let mut header_map = HeaderMap::new();
        for (name, value) in input.headers.unwrap_or_default() {
            let name = HeaderName::try_from(name.as_str())
                .map_err(|_| ToolError::Validation(format!("Invalid header name: {name}")))?;
            let value = HeaderValue::try_from(value.as_str())
                .map_err(|_| ToolError::Validation("Invalid header value".into()))?;
            header_map.insert(name, value);
        }

        let mut request = self
            .client
            .get(&input.url)
            .headers(header_map)
            .timeout(Duration::from_secs(timeout));
        if let Some(params) = &input.params {
            request = request.query(params);
        }

        debug!("http.get {}", input.url);
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ToolError::Timeout
            } else {
                ToolError::Execution(e.to_string())
            }
        })?;

        let status = response.status();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).to_string(),
                )
            })
            .collect();

        let body = response
            .text()
            .await
            .map_err(|e| ToolError::Execution(e.to_string()))?;
        let truncated: String = body.chars().take(self.body_limit).collect();

        Ok(ToolResult {
            success: status.is_success(),
            output: Some(json!({
                "status": status.as_u16(),
                "reason": status.canonical_reason().unwrap_or(""),
                "headers": headers,
                "body": truncated
            })),
            error: if status.is_success() {
                None
            } else {
                Some(format!("HTTP {}", status.as_u16()))
            },
        })
    }
}
