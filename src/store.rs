//! Where analyses are kept: the local SQLite database, or the hosted row
//! store when one is configured. Both take the signed-in [`Session`] so
//! rows are always scoped to their owner.

use crate::{
    core::{
        errors::{AppError, AppResult},
        types::{AnalysisRecord, AnalysisResult, Session},
    },
    db::{repositories::analyses, Database},
    remote::supabase::SupabaseClient,
};

#[derive(Clone)]
pub enum AnalysisStore {
    Local(Database),
    Remote(SupabaseClient),
}

impl AnalysisStore {
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Local(_) => "local",
            Self::Remote(_) => "remote",
        }
    }

    pub async fn insert(
        &self,
        session: &Session,
        pdf_name: &str,
        result: &AnalysisResult,
        pdf_checksum: Option<&str>,
    ) -> AppResult<AnalysisRecord> {
        match self {
            Self::Local(db) => {
                let id = uuid::Uuid::new_v4().to_string();
                analyses::insert_analysis(
                    db.pool(),
                    &id,
                    &session.user.id,
                    pdf_name,
                    result,
                    pdf_checksum,
                )
                .await
            }
            Self::Remote(client) => {
                client
                    .insert_analysis(&session.access_token, &session.user.id, pdf_name, result)
                    .await
            }
        }
    }

    pub async fn get(&self, session: &Session, id: &str) -> AppResult<AnalysisRecord> {
        match self {
            Self::Local(db) => {
                let record = analyses::get_analysis(db.pool(), id).await?;
                if record.user_id != session.user.id {
                    return Err(AppError::NotFound(format!("analysis {id}")));
                }
                Ok(record)
            }
            Self::Remote(client) => client.get_analysis(&session.access_token, id).await,
        }
    }

    /// Newest first.
    pub async fn list_for_user(&self, session: &Session) -> AppResult<Vec<AnalysisRecord>> {
        match self {
            Self::Local(db) => analyses::list_analyses_for_user(db.pool(), &session.user.id).await,
            Self::Remote(client) => {
                client
                    .list_analyses_for_user(&session.access_token, &session.user.id)
                    .await
            }
        }
    }

    pub async fn delete(&self, session: &Session, id: &str) -> AppResult<bool> {
        match self {
            Self::Local(db) => match self.get(session, id).await {
                Ok(_) => analyses::delete_analysis(db.pool(), id).await,
                Err(AppError::NotFound(_)) => Ok(false),
                Err(err) => Err(err),
            },
            Self::Remote(client) => client.delete_analysis(&session.access_token, id).await,
        }
    }

    /// Only the local store records checksums; the hosted table has no such
    /// column, so remote lookups never hit.
    pub async fn find_by_checksum(
        &self,
        session: &Session,
        pdf_checksum: &str,
    ) -> AppResult<Option<AnalysisRecord>> {
        match self {
            Self::Local(db) => {
                analyses::find_by_checksum(db.pool(), &session.user.id, pdf_checksum).await
            }
            Self::Remote(_) => Ok(None),
        }
    }
}
