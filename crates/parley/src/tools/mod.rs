//! The tools the chat agent can use.

mod web_search;
mod wikipedia;

use std::time::Duration;

use parley_core::tool::Error as ToolError;
use schemars::JsonSchema;
use serde::Deserialize;
pub use web_search::WebSearchTool;
pub use wikipedia::WikipediaTool;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT: &str = concat!("parley/", env!("CARGO_PKG_VERSION"));

/// Input shared by the lookup tools.
#[derive(Deserialize, JsonSchema)]
pub struct SearchParameters {
    #[schemars(description = "The search query.")]
    query: String,
}

/// Creates the HTTP client shared by the tools.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|err| {
            warn!("failed to configure the HTTP client: {err}");
            reqwest::Client::new()
        })
}

fn request_failed(service: &str, err: reqwest::Error) -> ToolError {
    ToolError::execution_error()
        .with_reason(format!("{service} request failed: {err}"))
}
