use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::{
    analysis::normalizer::{decode_stored, encode_stored},
    core::{
        errors::{AppError, AppResult},
        types::{AnalysisRecord, AnalysisResult},
    },
};

fn parse_timestamp(value: String) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|v| v.with_timezone(&Utc))
        .map_err(|err| AppError::Database(format!("invalid timestamp {value}: {err}")))
}

pub async fn insert_analysis(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
    pdf_name: &str,
    result: &AnalysisResult,
    pdf_checksum: Option<&str>,
) -> AppResult<AnalysisRecord> {
    sqlx::query(
        r#"
        INSERT INTO pdf_analyses (id, user_id, pdf_name, analysis_result, pdf_checksum)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(pdf_name)
    .bind(encode_stored(result).to_string())
    .bind(pdf_checksum)
    .execute(pool)
    .await?;
    get_analysis(pool, id).await
}

pub async fn get_analysis(pool: &SqlitePool, id: &str) -> AppResult<AnalysisRecord> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, pdf_name, analysis_result, pdf_checksum, created_at
        FROM pdf_analyses
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("analysis {id}")))?;

    map_analysis(row)
}

/// Newest first.
pub async fn list_analyses_for_user(
    pool: &SqlitePool,
    user_id: &str,
) -> AppResult<Vec<AnalysisRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, pdf_name, analysis_result, pdf_checksum, created_at
        FROM pdf_analyses
        WHERE user_id = ?1
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(map_analysis).collect()
}

pub async fn find_by_checksum(
    pool: &SqlitePool,
    user_id: &str,
    pdf_checksum: &str,
) -> AppResult<Option<AnalysisRecord>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, pdf_name, analysis_result, pdf_checksum, created_at
        FROM pdf_analyses
        WHERE user_id = ?1 AND pdf_checksum = ?2
        ORDER BY created_at DESC, rowid DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(pdf_checksum)
    .fetch_optional(pool)
    .await?;

    row.map(map_analysis).transpose()
}

pub async fn delete_analysis(pool: &SqlitePool, id: &str) -> AppResult<bool> {
    let affected = sqlx::query("DELETE FROM pdf_analyses WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(affected > 0)
}

fn map_analysis(row: sqlx::sqlite::SqliteRow) -> AppResult<AnalysisRecord> {
    let created_at: String = row.try_get("created_at")?;
    let payload: String = row.try_get("analysis_result")?;
    let payload: serde_json::Value = serde_json::from_str(&payload)
        .map_err(|err| AppError::Database(format!("corrupt analysis payload: {err}")))?;
    Ok(AnalysisRecord {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        pdf_name: row.try_get("pdf_name")?,
        analysis_result: decode_stored(&payload),
        pdf_checksum: row.try_get("pdf_checksum")?,
        created_at: parse_timestamp(created_at)?,
    })
}
