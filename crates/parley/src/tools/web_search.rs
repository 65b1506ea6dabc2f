use std::sync::LazyLock;

use parley_core::tool::{Tool, ToolResult};
use regex::Regex;
use schemars::schema_for;
use serde_json::Value;

use super::{SearchParameters, request_failed};

const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";
const MAX_RESULTS: usize = 5;
const NO_RESULT: &str = "No good DuckDuckGo Search Result was found";

static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"<a[^>]*class="[^"]*result__a[^"]*"[^>]*href="([^"]+)"[^>]*>([\s\S]*?)</a>"#,
    )
    .expect("valid regex")
});
static SNIPPET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a[^>]*class="[^"]*result__snippet[^"]*"[^>]*>([\s\S]*?)</a>"#)
        .expect("valid regex")
});
static RESULT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<div[^>]*class="(?:[^"]*\s)?result(?:\s[^"]*)?""#)
        .expect("valid regex")
});
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

/// Searches the web with DuckDuckGo.
pub struct WebSearchTool {
    client: reqwest::Client,
    parameter_schema: Value,
}

impl WebSearchTool {
    /// Creates a new web search tool sending requests with `client`.
    #[inline]
    pub fn new(client: reqwest::Client) -> Self {
        WebSearchTool {
            client,
            parameter_schema: schema_for!(SearchParameters).to_value(),
        }
    }
}

impl Tool for WebSearchTool {
    type Input = SearchParameters;

    fn name(&self) -> &str {
        "duckduckgo_search"
    }

    fn description(&self) -> &str {
        r#"
A wrapper around DuckDuckGo Search.
Useful for when you need to answer questions about current events. Input should be a search query."#
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: SearchParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let client = self.client.clone();
        async move {
            let query = input.query.trim();
            if query.is_empty() {
                debug!("blank query, nothing to search");
                return Ok(NO_RESULT.to_owned());
            }

            let url =
                format!("{SEARCH_URL}?q={}", urlencoding::encode(query));
            let html = client
                .get(url)
                .send()
                .await
                .and_then(|resp| resp.error_for_status())
                .map_err(|err| request_failed("DuckDuckGo", err))?
                .text()
                .await
                .map_err(|err| request_failed("DuckDuckGo", err))?;

            let results = parse_results(&html);
            debug!("{} results for {query:?}", results.len());
            Ok(format_results(&results))
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct SearchResult {
    title: String,
    link: String,
    snippet: String,
}

fn parse_results(html: &str) -> Vec<SearchResult> {
    result_blocks(html)
        .into_iter()
        .filter_map(|block| {
            let link = LINK_RE.captures(block)?;
            let snippet = SNIPPET_RE
                .captures(block)
                .map(|caps| plain_text(&caps[1]))
                .unwrap_or_default();
            Some(SearchResult {
                title: plain_text(&link[2]),
                link: unwrap_redirect(&decode_entities(&link[1])),
                snippet,
            })
        })
        .take(MAX_RESULTS)
        .collect()
}

/// Splits the page into one slice per result, so a link is only paired
/// with the snippet of its own result.
///
/// Results are `<div class="result ...">` blocks. Pages without them are
/// split at every result link instead.
fn result_blocks(html: &str) -> Vec<&str> {
    let mut starts: Vec<_> =
        RESULT_RE.find_iter(html).map(|m| m.start()).collect();
    if starts.is_empty() {
        starts = LINK_RE.find_iter(html).map(|m| m.start()).collect();
    }
    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(html.len());
            &html[start..end]
        })
        .collect()
}

fn format_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return NO_RESULT.to_owned();
    }
    results
        .iter()
        .map(|result| {
            format!(
                "Title: {}\nLink: {}\nSnippet: {}",
                result.title, result.link, result.snippet
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Result links go through a `/l/?uddg=<target>` redirect.
fn unwrap_redirect(link: &str) -> String {
    if let Some(index) = link.find("uddg=") {
        let encoded = &link[index + 5..];
        let encoded = encoded.split('&').next().unwrap_or(encoded);
        if let Ok(decoded) = urlencoding::decode(encoded) {
            return decoded.into_owned();
        }
    }
    if let Some(rest) = link.strip_prefix("//") {
        return format!("https://{rest}");
    }
    link.to_owned()
}

fn plain_text(html: &str) -> String {
    let text = TAG_RE.replace_all(html, "");
    decode_entities(text.trim())
}

fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
