use crate::{
    core::{
        errors::{AppError, AppResult},
        types::{LoginResponse, LogoutResponse, WhoAmIResponse},
    },
    remote::supabase::SupabaseClient,
    routes::after_auth_change,
    security::keyring,
    session::SessionHub,
    AppState,
};

const OAUTH_PROVIDER: &str = "google";

fn client(state: &AppState) -> AppResult<&SupabaseClient> {
    state.supabase.as_ref().ok_or_else(|| {
        AppError::Config("sign-in needs SUPABASE_URL and SUPABASE_ANON_KEY".to_string())
    })
}

pub fn login_url(state: &AppState, redirect_to: Option<&str>) -> AppResult<String> {
    let default_redirect = format!("{}/auth/callback", state.config.origin);
    client(state)?.authorize_url(OAUTH_PROVIDER, redirect_to.unwrap_or(&default_redirect))
}

/// Exchanges a refresh token (from the OAuth callback) for a session.
pub async fn login_with_refresh_token(
    state: &AppState,
    refresh_token: &str,
) -> AppResult<LoginResponse> {
    if refresh_token.trim().is_empty() {
        return Err(AppError::InvalidInput("refresh token cannot be empty".to_string()));
    }
    let session = client(state)?.refresh_session(refresh_token.trim()).await?;
    keyring::store_refresh_token(&session.refresh_token)?;

    let mut subscription = state.sessions.subscribe();
    state.sessions.set(session);
    let current = subscription.changed().await.flatten();
    subscription.unsubscribe();

    let user = current
        .as_ref()
        .map(|session| session.user.clone())
        .ok_or_else(|| AppError::Internal("session was cleared during sign-in".to_string()))?;
    tracing::info!(user = %user.id, "signed in");
    Ok(LoginResponse {
        user,
        next: after_auth_change(current.as_ref()).to_string(),
    })
}

pub async fn logout(state: &AppState) -> AppResult<LogoutResponse> {
    let client = client(state)?;
    let previous = state.sessions.clear();
    if let Some(session) = &previous {
        if let Err(err) = client.sign_out(&session.access_token).await {
            tracing::warn!(error = %err, "remote sign-out failed; clearing the local session");
        }
    }
    keyring::clear_refresh_token()?;
    Ok(LogoutResponse {
        signed_out: previous.is_some(),
        next: after_auth_change(None).to_string(),
    })
}

pub fn whoami(state: &AppState) -> WhoAmIResponse {
    WhoAmIResponse {
        user: state.sessions.current().map(|session| session.user),
        store: state.store.backend_name().to_string(),
    }
}

/// Signs back in with the refresh token saved by the last login. Any failure
/// leaves the hub signed out.
pub async fn restore_session(client: &SupabaseClient, sessions: &SessionHub) {
    let token = match keyring::load_refresh_token() {
        Ok(Some(token)) => token,
        Ok(None) => return,
        Err(err) => {
            tracing::warn!(error = %err, "could not read saved sign-in");
            return;
        }
    };
    match client.refresh_session(&token).await {
        Ok(session) => {
            if let Err(err) = keyring::store_refresh_token(&session.refresh_token) {
                tracing::warn!(error = %err, "could not save rotated refresh token");
            }
            sessions.set(session);
        }
        Err(err) => {
            tracing::warn!(code = err.code(), error = %err, "saved sign-in expired");
        }
    }
}
