use crate::core::{
    errors::{AppError, AppResult},
    types::Provider,
};

const SERVICE: &str = "dataclaro";
const REFRESH_TOKEN_USER: &str = "supabase-refresh-token";

fn username_for_provider(provider: &Provider) -> &'static str {
    match provider {
        Provider::Groq => "groq",
    }
}

fn entry(user: &str) -> AppResult<keyring::Entry> {
    keyring::Entry::new(SERVICE, user).map_err(|err| AppError::Internal(err.to_string()))
}

pub fn set_provider_key(provider: Provider, api_key: &str) -> AppResult<()> {
    entry(username_for_provider(&provider))?
        .set_password(api_key)
        .map_err(|err| AppError::Internal(err.to_string()))
}

pub fn get_provider_key(provider: Provider) -> AppResult<String> {
    entry(username_for_provider(&provider))?
        .get_password()
        .map_err(|_err| AppError::ProviderAuth)
}

pub fn store_refresh_token(token: &str) -> AppResult<()> {
    entry(REFRESH_TOKEN_USER)?
        .set_password(token)
        .map_err(|err| AppError::Internal(err.to_string()))
}

/// `None` when nobody has signed in on this machine.
pub fn load_refresh_token() -> AppResult<Option<String>> {
    match entry(REFRESH_TOKEN_USER)?.get_password() {
        Ok(token) => Ok(Some(token)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(err) => Err(AppError::Internal(err.to_string())),
    }
}

pub fn clear_refresh_token() -> AppResult<()> {
    match entry(REFRESH_TOKEN_USER)?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(err) => Err(AppError::Internal(err.to_string())),
    }
}
