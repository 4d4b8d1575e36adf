use std::str::FromStr;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::core::errors::AppError;

/// Summary text used when the model output carried no usable summary.
pub const NO_SUMMARY_TEXT: &str = "No summary available.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Groq,
}

impl FromStr for Provider {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(Self::Groq),
            other => Err(AppError::InvalidInput(format!("unknown provider {other}"))),
        }
    }
}

/// `page` is 1-based; 0 means the model gave no page reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct SummaryItem {
    pub text: String,
    pub page: u32,
}

impl Default for SummaryItem {
    fn default() -> Self {
        Self {
            text: NO_SUMMARY_TEXT.to_string(),
            page: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct KeyInsight {
    pub title: String,
    pub explanation: String,
    pub page: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct KeyStatistic {
    pub label: String,
    pub value: String,
    pub page: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct ActionItem {
    pub text: String,
    pub page: u32,
}

/// Normalized analysis of one document. Every field is always populated;
/// list order is the order the model produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct AnalysisResult {
    pub summary: SummaryItem,
    pub key_insights: Vec<KeyInsight>,
    pub key_statistics: Vec<KeyStatistic>,
    #[serde(alias = "takeaways")]
    pub action_items: Vec<ActionItem>,
}

impl AnalysisResult {
    pub fn has_content(&self) -> bool {
        self.summary.text != NO_SUMMARY_TEXT
            || !self.key_insights.is_empty()
            || !self.key_statistics.is_empty()
            || !self.action_items.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisRecord {
    pub id: String,
    pub user_id: String,
    pub pdf_name: String,
    pub analysis_result: AnalysisResult,
    pub pdf_checksum: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    pub fn summary(&self) -> AnalysisSummary {
        AnalysisSummary {
            id: self.id.clone(),
            pdf_name: self.pdf_name.clone(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisSummary {
    pub id: String,
    pub pdf_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub author: String,
    pub publish_date: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: SessionUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetProviderKeyResponse {
    pub stored: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub pdf_name: String,
    pub record_id: Option<String>,
    pub cached: bool,
    pub save_error: Option<String>,
    pub analysis: AnalysisResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAnalysesResponse {
    pub analyses: Vec<AnalysisSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAnalysisResponse {
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareLinkResponse {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBlogPostsResponse {
    pub posts: Vec<BlogPost>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: SessionUser,
    pub next: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutResponse {
    pub signed_out: bool,
    pub next: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoAmIResponse {
    pub user: Option<SessionUser>,
    pub store: String,
}
