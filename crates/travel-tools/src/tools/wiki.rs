//! Wiki Tool
//!
//! Searches the DBpedia lookup service and maps the first results to their
//! Wikipedia articles.

use std::sync::LazyLock;

use async_trait::async_trait;
use nano_core::{ParamSpec, Tool, ToolDescriptor, ToolError, ToolParams};
use regex::Regex;
use serde_json::json;

use super::{check_status, req_str};
use crate::error::{Result, TravelError};
use crate::model::WikiEntry;

const DEFAULT_BASE_URL: &str = "https://lookup.dbpedia.org";
const MAX_RESULTS: usize = 3;

/// Tool for encyclopedia lookups
pub struct WikiTool {
    client: reqwest::Client,
    base_url: String,
}

impl WikiTool {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.into(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Element patterns of the lookup XML, compiled once
struct XmlPatterns {
    result: Regex,
    categories: Regex,
    label: Regex,
    uri: Regex,
    description: Regex,
}

impl XmlPatterns {
    fn compile() -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            result: Regex::new(r"(?s)<Result>(.*?)</Result>")?,
            categories: Regex::new(r"(?s)<Categories>(.*?)</Categories>")?,
            label: Regex::new(r"(?s)<Label>(.*?)</Label>")?,
            uri: Regex::new(r"(?s)<URI>(.*?)</URI>")?,
            description: Regex::new(r"(?s)<Description>(.*?)</Description>")?,
        })
    }
}

static PATTERNS: LazyLock<std::result::Result<XmlPatterns, regex::Error>> =
    LazyLock::new(XmlPatterns::compile);

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_owned())
}

/// Pull the leading results out of a lookup XML document
fn parse_results(xml: &str) -> Result<Vec<WikiEntry>> {
    let XmlPatterns {
        result,
        categories,
        label,
        uri,
        description,
    } = PATTERNS.as_ref().map_err(|e| TravelError::Pattern(e.clone()))?;

    let entries = result
        .captures_iter(xml)
        .filter_map(|c| c.get(1))
        .take(MAX_RESULTS)
        .map(|block| {
            let block = block.as_str();
            let category_labels: Vec<String> = categories
                .captures(block)
                .and_then(|c| c.get(1))
                .map(|section| {
                    label
                        .captures_iter(section.as_str())
                        .filter_map(|c| c.get(1))
                        .map(|m| m.as_str().trim().to_owned())
                        .collect()
                })
                .unwrap_or_default();

            // Category labels must not be mistaken for the result's own label
            let own = categories.replace_all(block, "");

            WikiEntry {
                label: first_capture(label, &own).unwrap_or_default(),
                wikipedia_url: first_capture(uri, &own)
                    .map(|u| u.replace("dbpedia.org/resource", "wikipedia.org/wiki"))
                    .unwrap_or_default(),
                description: first_capture(description, &own).unwrap_or_default(),
                categories: category_labels,
            }
        })
        .collect();

    Ok(entries)
}

#[async_trait]
impl Tool for WikiTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("wiki", "Search Wikipedia for information about a topic")
            .param(
                "query",
                ParamSpec::required(
                    "Search term to look up. Query must be precise and specific, i.e. 'The Mona Lisa'",
                    "string",
                ),
            )
            .returns(json!({
                "type": "json",
                "columns": ["label", "wikipedia_url", "description", "categories"]
            }))
    }

    async fn execute(&self, params: &ToolParams) -> std::result::Result<String, ToolError> {
        let query = req_str(params, "query")?;
        tracing::debug!(query, "Searching DBpedia");

        let response = self
            .client
            .get(format!("{}/api/search", self.base_url))
            .query(&[("query", query)])
            .header(reqwest::header::ACCEPT, "application/xml")
            .send()
            .await
            .map_err(TravelError::from)?;

        let xml = check_status("DBpedia", response)?
            .text()
            .await
            .map_err(TravelError::from)?;

        let results = parse_results(&xml)?;
        Ok(json!({ "results": results }).to_string())
    }
}
