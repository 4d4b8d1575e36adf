//! Blog posts from the hosted content table (Airtable REST API).

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use reqwest::StatusCode;
use serde_json::Value;

use crate::core::{
    config::AirtableConfig,
    errors::{AppError, AppResult},
    types::BlogPost,
};

const API_BASE: &str = "https://api.airtable.com/v0";
pub const SNIPPET_LEN: usize = 150;

#[derive(Debug, Clone)]
pub struct AirtableClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    base_id: String,
    table: String,
}

impl AirtableClient {
    pub fn new(config: &AirtableConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| AppError::Network(err.to_string()))?;
        Ok(Self {
            http,
            api_base: API_BASE.to_string(),
            api_key: config.api_key.clone(),
            base_id: config.base_id.clone(),
            table: config.table.clone(),
        })
    }

    /// Every post in the table, following pagination offsets.
    pub async fn list_posts(&self) -> AppResult<Vec<BlogPost>> {
        let mut posts = Vec::new();
        let mut offset: Option<String> = None;
        loop {
            let page = self.fetch_page(None, offset.as_deref()).await?;
            posts.extend(parse_records(&page)?);
            offset = page
                .get("offset")
                .and_then(Value::as_str)
                .map(ToString::to_string);
            if offset.is_none() {
                break;
            }
        }
        tracing::debug!(count = posts.len(), "blog posts fetched");
        Ok(posts)
    }

    pub async fn post_by_slug(&self, slug: &str) -> AppResult<Option<BlogPost>> {
        let formula = slug_formula(slug);
        let page = self.fetch_page(Some(&formula), None).await?;
        Ok(parse_records(&page)?.into_iter().next())
    }

    async fn fetch_page(&self, formula: Option<&str>, offset: Option<&str>) -> AppResult<Value> {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(formula) = formula {
            query.push(("filterByFormula", formula));
        }
        if let Some(offset) = offset {
            query.push(("offset", offset));
        }

        let response = self
            .http
            .get(format!("{}/{}/{}", self.api_base, self.base_id, self.table))
            .bearer_auth(&self.api_key)
            .query(&query)
            .send()
            .await
            .map_err(|err| AppError::Network(err.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AppError::Config(
                "AIRTABLE_API_KEY was rejected".to_string(),
            )),
            StatusCode::NOT_FOUND => Err(AppError::NotFound(format!(
                "content table {}/{}",
                self.base_id, self.table
            ))),
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                Err(AppError::Store(format!("status {status} body {body}")))
            }
            _ => response
                .json()
                .await
                .map_err(|err| AppError::Store(format!("unreadable content response: {err}"))),
        }
    }
}

/// `{Slug} = '...'` with the slug's quotes and backslashes escaped.
pub fn slug_formula(slug: &str) -> String {
    let escaped = slug.replace('\\', "\\\\").replace('\'', "\\'");
    format!("{{Slug}} = '{escaped}'")
}

pub fn parse_records(page: &Value) -> AppResult<Vec<BlogPost>> {
    let records = page
        .get("records")
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::Store("content response has no records".to_string()))?;
    Ok(records.iter().filter_map(parse_record).collect())
}

fn parse_record(record: &Value) -> Option<BlogPost> {
    let id = record.get("id").and_then(Value::as_str)?;
    let fields = record.get("fields")?;
    let text = |key: &str| {
        fields
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let tags = match fields.get("Tags") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(ToString::to_string)
            .collect(),
        Some(Value::String(tag)) => vec![tag.clone()],
        _ => Vec::new(),
    };

    Some(BlogPost {
        id: id.to_string(),
        title: text("Title"),
        slug: text("Slug"),
        content: text("Content"),
        author: text("Author"),
        publish_date: text("PublishDate"),
        tags,
    })
}

fn tag_pattern() -> &'static Regex {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    TAGS.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"))
}

/// Plain-text preview of a post body: tags stripped, entities decoded and
/// cut to `len` characters with a trailing `...` when shortened.
pub fn snippet(content: &str, len: usize) -> String {
    let stripped = tag_pattern().replace_all(content, "");
    let plain = html_escape::decode_html_entities(stripped.as_ref());
    let plain = plain.trim();
    if plain.chars().count() > len {
        let cut: String = plain.chars().take(len).collect();
        format!("{cut}...")
    } else {
        plain.to_string()
    }
}
