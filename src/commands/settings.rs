use crate::{
    core::{
        errors::{AppError, AppResult},
        types::{Provider, SetProviderKeyResponse},
    },
    security::keyring,
};

pub fn set_provider_key(provider: &str, api_key: &str) -> AppResult<SetProviderKeyResponse> {
    let provider: Provider = provider.parse()?;
    if api_key.trim().is_empty() {
        return Err(AppError::InvalidInput("api key cannot be empty".to_string()));
    }
    keyring::set_provider_key(provider, api_key.trim())?;
    Ok(SetProviderKeyResponse { stored: true })
}
