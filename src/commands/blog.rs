use crate::{
    core::{
        errors::{AppError, AppResult},
        types::{BlogPost, ListBlogPostsResponse},
    },
    remote::airtable::AirtableClient,
    AppState,
};

fn client(state: &AppState) -> AppResult<&AirtableClient> {
    state.airtable.as_ref().ok_or_else(|| {
        AppError::Config("the blog needs AIRTABLE_API_KEY and AIRTABLE_BASE_ID".to_string())
    })
}

pub async fn list_posts(state: &AppState) -> AppResult<ListBlogPostsResponse> {
    let posts = client(state)?.list_posts().await?;
    Ok(ListBlogPostsResponse { posts })
}

pub async fn get_post(state: &AppState, slug: &str) -> AppResult<BlogPost> {
    let slug = slug.trim();
    if slug.is_empty() {
        return Err(AppError::InvalidInput("slug cannot be empty".to_string()));
    }
    client(state)?
        .post_by_slug(slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("blog post {slug}")))
}
