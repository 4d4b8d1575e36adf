//! Hosted auth and row store (Supabase: GoTrue auth + PostgREST rows).

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{RequestBuilder, StatusCode, Url};
use serde_json::Value;

use crate::{
    analysis::normalizer::{decode_stored, encode_stored},
    core::{
        config::SupabaseConfig,
        errors::{AppError, AppResult},
        types::{AnalysisRecord, AnalysisResult, Session, SessionUser},
    },
};

const ANALYSES_TABLE: &str = "pdf_analyses";

#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| AppError::Network(err.to_string()))?;
        Ok(Self {
            http,
            url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
        })
    }

    /// Browser URL that starts the OAuth sign-in flow.
    pub fn authorize_url(&self, provider: &str, redirect_to: &str) -> AppResult<String> {
        let url = Url::parse_with_params(
            &format!("{}/auth/v1/authorize", self.url),
            &[("provider", provider), ("redirect_to", redirect_to)],
        )
        .map_err(|err| AppError::Config(format!("invalid SUPABASE_URL: {err}")))?;
        Ok(url.to_string())
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> AppResult<Session> {
        let body = self
            .send(
                self.http
                    .post(format!("{}/auth/v1/token", self.url))
                    .query(&[("grant_type", "refresh_token")])
                    .header("apikey", &self.anon_key)
                    .json(&serde_json::json!({ "refresh_token": refresh_token })),
            )
            .await?;
        parse_session(&body, Utc::now())
    }

    pub async fn get_user(&self, access_token: &str) -> AppResult<SessionUser> {
        let body = self
            .send(
                self.http
                    .get(format!("{}/auth/v1/user", self.url))
                    .header("apikey", &self.anon_key)
                    .bearer_auth(access_token),
            )
            .await?;
        parse_user(&body)
    }

    pub async fn sign_out(&self, access_token: &str) -> AppResult<()> {
        self.send(
            self.http
                .post(format!("{}/auth/v1/logout", self.url))
                .header("apikey", &self.anon_key)
                .bearer_auth(access_token),
        )
        .await?;
        Ok(())
    }

    pub async fn insert_analysis(
        &self,
        access_token: &str,
        user_id: &str,
        pdf_name: &str,
        result: &AnalysisResult,
    ) -> AppResult<AnalysisRecord> {
        let row = serde_json::json!({
            "user_id": user_id,
            "pdf_name": pdf_name,
            "analysis_result": encode_stored(result),
        });
        let body = self
            .send(
                self.rows(access_token, self.http.post(self.table_url()))
                    .header("Prefer", "return=representation")
                    .json(&[row]),
            )
            .await?;
        parse_rows(&body)?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Store("insert returned no row".to_string()))
    }

    pub async fn get_analysis(&self, access_token: &str, id: &str) -> AppResult<AnalysisRecord> {
        let body = self
            .send(
                self.rows(access_token, self.http.get(self.table_url()))
                    .query(&[("select", "*".to_string()), ("id", format!("eq.{id}"))]),
            )
            .await?;
        parse_rows(&body)?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("analysis {id}")))
    }

    /// Newest first.
    pub async fn list_analyses_for_user(
        &self,
        access_token: &str,
        user_id: &str,
    ) -> AppResult<Vec<AnalysisRecord>> {
        let body = self
            .send(
                self.rows(access_token, self.http.get(self.table_url())).query(&[
                    ("select", "*".to_string()),
                    ("user_id", format!("eq.{user_id}")),
                    ("order", "created_at.desc".to_string()),
                ]),
            )
            .await?;
        parse_rows(&body)
    }

    pub async fn delete_analysis(&self, access_token: &str, id: &str) -> AppResult<bool> {
        let body = self
            .send(
                self.rows(access_token, self.http.delete(self.table_url()))
                    .query(&[("id", format!("eq.{id}"))])
                    .header("Prefer", "return=representation"),
            )
            .await?;
        Ok(body.as_array().map_or(false, |rows| !rows.is_empty()))
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{ANALYSES_TABLE}", self.url)
    }

    fn rows(&self, access_token: &str, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
    }

    async fn send(&self, request: RequestBuilder) -> AppResult<Value> {
        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                AppError::Network(format!("store request timed out: {err}"))
            } else {
                AppError::Network(err.to_string())
            }
        })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(AppError::Unauthorized(format!("store rejected credentials: {text}")))
            }
            status if !status.is_success() => {
                Err(AppError::Store(format!("status {status} body {text}")))
            }
            _ if text.trim().is_empty() => Ok(Value::Null),
            _ => serde_json::from_str(&text)
                .map_err(|err| AppError::Store(format!("unreadable store response: {err}"))),
        }
    }
}

pub fn parse_user(body: &Value) -> AppResult<SessionUser> {
    let id = body
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::Store("user payload has no id".to_string()))?;
    Ok(SessionUser {
        id: id.to_string(),
        email: body.get("email").and_then(Value::as_str).map(ToString::to_string),
    })
}

/// Reads a token grant response. `expires_at` is taken as given, or derived
/// from `expires_in` relative to `now`.
pub fn parse_session(body: &Value, now: DateTime<Utc>) -> AppResult<Session> {
    let field = |key: &str| {
        body.get(key)
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| AppError::Store(format!("session payload has no {key}")))
    };
    let expires_at = body.get("expires_at").and_then(Value::as_i64).or_else(|| {
        body.get("expires_in")
            .and_then(Value::as_i64)
            .map(|secs| now.timestamp() + secs)
    });
    let user = body
        .get("user")
        .ok_or_else(|| AppError::Store("session payload has no user".to_string()))?;

    Ok(Session {
        access_token: field("access_token")?,
        refresh_token: field("refresh_token")?,
        expires_at,
        user: parse_user(user)?,
    })
}

pub fn parse_rows(body: &Value) -> AppResult<Vec<AnalysisRecord>> {
    let rows = body
        .as_array()
        .ok_or_else(|| AppError::Store("expected a row array".to_string()))?;
    rows.iter().map(parse_row).collect()
}

pub fn parse_row(row: &Value) -> AppResult<AnalysisRecord> {
    let id = match row.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => return Err(AppError::Store("row has no id".to_string())),
    };
    let text = |key: &str| {
        row.get(key)
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| AppError::Store(format!("row {id} has no {key}")))
    };
    let created_at = text("created_at")?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|v| v.with_timezone(&Utc))
        .map_err(|err| {
            AppError::Store(format!("row {id} has invalid created_at {created_at}: {err}"))
        })?;

    Ok(AnalysisRecord {
        user_id: text("user_id")?,
        pdf_name: text("pdf_name")?,
        analysis_result: decode_stored(row.get("analysis_result").unwrap_or(&Value::Null)),
        pdf_checksum: row
            .get("pdf_checksum")
            .and_then(Value::as_str)
            .map(ToString::to_string),
        created_at,
        id,
    })
}
