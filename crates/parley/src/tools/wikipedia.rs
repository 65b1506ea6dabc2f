use std::collections::HashMap;

use parley_core::tool::{Error as ToolError, Tool, ToolResult};
use schemars::schema_for;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{SearchParameters, request_failed};

const API_URL: &str = "https://en.wikipedia.org/w/api.php";
const TOP_K_RESULTS: usize = 3;
const MAX_OUTPUT_CHARS: usize = 4000;
const NO_RESULT: &str = "No good Wikipedia Search Result was found";

/// Looks up summaries of Wikipedia pages.
pub struct WikipediaTool {
    client: reqwest::Client,
    parameter_schema: Value,
}

impl WikipediaTool {
    /// Creates a new Wikipedia tool sending requests with `client`.
    #[inline]
    pub fn new(client: reqwest::Client) -> Self {
        WikipediaTool {
            client,
            parameter_schema: schema_for!(SearchParameters).to_value(),
        }
    }
}

impl Tool for WikipediaTool {
    type Input = SearchParameters;

    fn name(&self) -> &str {
        "wikipedia"
    }

    fn description(&self) -> &str {
        r#"
A wrapper around Wikipedia.
Useful for when you need to answer general questions about people, places, companies, facts, historical events, or other subjects. Input should be a search query."#
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

            let url = format!(
                "{API_URL}?action=query&list=search&format=json&srlimit={TOP_K_RESULTS}&srsearch={}",
                urlencoding::encode(query)
            );
            let search: SearchResponse = get_json(&client, url).await?;
            let titles = search.titles();
            debug!("pages for {query:?}: {titles:?}");

            let mut summaries = Vec::with_capacity(titles.len());
            for title in titles {
                let url = format!(
                    "{API_URL}?action=query&prop=extracts&exintro=1&explaintext=1&redirects=1&format=json&titles={}",
                    urlencoding::encode(&title)
                );
                let extracts: ExtractResponse = get_json(&client, url).await?;
                if let Some(summary) = extracts.summary() {
                    summaries.push(summary);
                }
            }
            Ok(format_summaries(&summaries))
        }
    }
}

async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: String,
) -> Result<T, ToolError> {
    client
        .get(url)
        .send()
        .await
        .and_then(|resp| resp.error_for_status())
        .map_err(|err| request_failed("Wikipedia", err))?
        .json()
        .await
        .map_err(|err| request_failed("Wikipedia", err))
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: Option<SearchQuery>,
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
}

impl SearchResponse {
    fn titles(self) -> Vec<String> {
        self.query
            .map(|query| query.search)
            .unwrap_or_default()
            .into_iter()
            .take(TOP_K_RESULTS)
            .map(|hit| hit.title)
            .collect()
    }
}

#[derive(Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    query: Option<ExtractQuery>,
}

#[derive(Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: HashMap<String, Page>,
}

#[derive(Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    extract: Option<String>,
}

impl ExtractResponse {
    /// Missing pages come back with a negative id and no extract.
    fn summary(self) -> Option<String> {
        self.query?.pages.into_values().find_map(|page| {
            let extract = page.extract.filter(|e| !e.trim().is_empty())?;
            Some(format!("Page: {}\nSummary: {}", page.title, extract.trim()))
        })
    }
}

fn format_summaries(summaries: &[String]) -> String {
    if summaries.is_empty() {
        return NO_RESULT.to_owned();
    }
    summaries
        .join("\n\n")
        .chars()
        .take(MAX_OUTPUT_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_search_titles() {
        let resp: SearchResponse = serde_json::from_value(json!({
            "batchcomplete": "",
            "query": {
                "searchinfo": { "totalhits": 5 },
                "search": [
                    { "ns": 0, "title": "Paris", "pageid": 22989 },
                    { "ns": 0, "title": "France", "pageid": 5843419 },
                    { "ns": 0, "title": "Paris Hilton", "pageid": 78343 },
                    { "ns": 0, "title": "Paris Agreement", "pageid": 48909574 }
                ]
            }
        }))
        .unwrap();
        assert_eq!(resp.titles(), vec!["Paris", "France", "Paris Hilton"]);

        let resp: SearchResponse =
            serde_json::from_value(json!({ "batchcomplete": "" })).unwrap();
        assert!(resp.titles().is_empty());
    }

    #[test]
    fn test_summary() {
        let resp: ExtractResponse = serde_json::from_value(json!({
            "query": {
                "pages": {
                    "22989": {
                        "pageid": 22989,
                        "title": "Paris",
                        "extract": "Paris is the capital of France.\n"
                    }
                }
            }
        }))
        .unwrap();
        assert_eq!(
            resp.summary().as_deref(),
            Some("Page: Paris\nSummary: Paris is the capital of France.")
        );

        let resp: ExtractResponse = serde_json::from_value(json!({
            "query": {
                "pages": { "-1": { "title": "Nowhere", "missing": "" } }
            }
        }))
        .unwrap();
        assert_eq!(resp.summary(), None);
    }

    #[tokio::test]
    async fn test_blank_query() {
        let tool = WikipediaTool::new(reqwest::Client::new());
        let output = tool
            .execute(SearchParameters {
                query: "  ".to_owned(),
            })
            .await;
        assert_eq!(output.unwrap(), NO_RESULT);
    }

    #[test]
    fn test_format_summaries() {
        assert_eq!(format_summaries(&[]), NO_RESULT);

        let summaries = vec![
            "Page: A\nSummary: a".to_owned(),
            "Page: B\nSummary: b".to_owned(),
        ];
        assert_eq!(
            format_summaries(&summaries),
            "Page: A\nSummary: a\n\nPage: B\nSummary: b"
        );

        let long = vec![format!("Page: Long\nSummary: {}", "é".repeat(5000))];
        assert_eq!(format_summaries(&long).chars().count(), MAX_OUTPUT_CHARS);
    }
}
