pub mod analysis;
pub mod cli;
pub mod commands;
pub mod core;
pub mod db;
pub mod extract;
pub mod providers;
pub mod remote;
pub mod routes;
pub mod security;
pub mod session;
pub mod store;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::{
    filter::Directive, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use crate::analysis::{report::render_markdown, schema::analysis_schema};
use crate::cli::{BlogCommand, Cli, Command, LoginCommand, OutputFormat};
use crate::core::{
    config::AppConfig,
    errors::{AppError, AppResult},
};
use crate::db::{default_data_dir, Database};
use crate::remote::{
    airtable::{snippet, AirtableClient, SNIPPET_LEN},
    supabase::SupabaseClient,
};
use crate::session::{local_session, SessionHub};
use crate::store::AnalysisStore;

fn log_level_from_env() -> &'static str {
    match std::env::var("DATACLARO_LOG")
        .unwrap_or_else(|_| "info".to_string())
        .to_ascii_lowercase()
        .as_str()
    {
        "trace" => "trace",
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    }
}

fn sqlx_debug_enabled() -> bool {
    matches!(
        std::env::var("DATACLARO_SQLX_DEBUG")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn init_logging() {
    let mut filter = EnvFilter::new(log_level_from_env());
    if !sqlx_debug_enabled() {
        if let Ok(directive) = "sqlx::query=warn".parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
    }
    // try_init: tests may have installed a subscriber already
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: AnalysisStore,
    pub sessions: SessionHub,
    pub supabase: Option<SupabaseClient>,
    pub airtable: Option<AirtableClient>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Opens the configured store and restores the last session.
    ///
    /// Without hosted auth, analyses go to the local database under an
    /// implicit always-signed-in user.
    pub async fn from_config(config: AppConfig) -> AppResult<Self> {
        let data_dir = default_data_dir(config.data_dir.clone())?;
        let airtable = config.airtable.as_ref().map(AirtableClient::new).transpose()?;

        let (store, sessions, supabase) = match &config.supabase {
            Some(supabase_config) => {
                let client = SupabaseClient::new(supabase_config)?;
                let sessions = SessionHub::new(None);
                commands::auth::restore_session(&client, &sessions).await;
                (AnalysisStore::Remote(client.clone()), sessions, Some(client))
            }
            None => {
                let db = Database::new(&data_dir).await?;
                (
                    AnalysisStore::Local(db),
                    SessionHub::new(Some(local_session())),
                    None,
                )
            }
        };
        tracing::debug!(store = store.backend_name(), dir = %data_dir.display(), "state ready");

        Ok(Self {
            config,
            store,
            sessions,
            supabase,
            airtable,
            data_dir,
        })
    }
}

fn to_json<T: Serialize>(value: &T) -> AppResult<String> {
    serde_json::to_string_pretty(value).map_err(|err| AppError::Internal(err.to_string()))
}

async fn dispatch(state: &AppState, command: Command, format: OutputFormat) -> AppResult<String> {
    let markdown = format == OutputFormat::Markdown;
    match command {
        Command::Analyze {
            file,
            name,
            mime,
            force,
        } => {
            let response = commands::analyses::analyze(state, file, mime, name, force).await?;
            if markdown {
                let mut out = render_markdown(&response.pdf_name, &response.analysis);
                if let Some(err) = &response.save_error {
                    out.push_str(&format!("\n> Not saved: {err}\n"));
                }
                Ok(out)
            } else {
                to_json(&response)
            }
        }
        Command::Dashboard { search } => {
            let response = commands::analyses::list_analyses(state, search.as_deref()).await?;
            if markdown {
                if response.analyses.is_empty() {
                    return Ok("No analyses yet.\n".to_string());
                }
                Ok(response
                    .analyses
                    .iter()
                    .map(|item| {
                        format!(
                            "- {} `{}` ({})\n",
                            item.pdf_name,
                            item.id,
                            item.created_at.format("%Y-%m-%d %H:%M")
                        )
                    })
                    .collect())
            } else {
                to_json(&response)
            }
        }
        Command::Show { id } => {
            let record = commands::analyses::get_analysis(state, &id).await?;
            if markdown {
                Ok(render_markdown(&record.pdf_name, &record.analysis_result))
            } else {
                to_json(&record)
            }
        }
        Command::Delete { id } => to_json(&commands::analyses::delete_analysis(state, &id).await?),
        Command::Share { id } => {
            let response = commands::analyses::share_link(state, &id).await?;
            if markdown {
                Ok(format!("{}\n", response.url))
            } else {
                to_json(&response)
            }
        }
        Command::Export { id, out } => {
            let path = commands::analyses::export_markdown(state, &id, out).await?;
            Ok(format!("{}\n", path.display()))
        }
        Command::Blog { command } => match command {
            BlogCommand::List => {
                let response = commands::blog::list_posts(state).await?;
                if markdown {
                    Ok(response
                        .posts
                        .iter()
                        .map(|post| {
                            format!(
                                "## {}\n`{}` by {} on {}\n\n{}\n\n",
                                post.title,
                                post.slug,
                                post.author,
                                post.publish_date,
                                snippet(&post.content, SNIPPET_LEN)
                            )
                        })
                        .collect())
                } else {
                    to_json(&response)
                }
            }
            BlogCommand::Show { slug } => {
                let post = commands::blog::get_post(state, &slug).await?;
                if markdown {
                    Ok(format!("# {}\n\n{}\n", post.title, post.content))
                } else {
                    to_json(&post)
                }
            }
        },
        Command::Login { command } => match command {
            LoginCommand::Url { redirect_to } => {
                Ok(format!("{}\n", commands::auth::login_url(state, redirect_to.as_deref())?))
            }
            LoginCommand::Token { refresh_token } => {
                to_json(&commands::auth::login_with_refresh_token(state, &refresh_token).await?)
            }
        },
        Command::Logout => to_json(&commands::auth::logout(state).await?),
        Command::Whoami => to_json(&commands::auth::whoami(state)),
        Command::SetKey { provider, api_key } => set_key_json(&provider, &api_key),
        Command::Schema => schema_json(),
    }
}

fn set_key_json(provider: &str, api_key: &str) -> AppResult<String> {
    to_json(&commands::settings::set_provider_key(provider, api_key)?)
}

fn schema_json() -> AppResult<String> {
    to_json(&analysis_schema()?)
}

/// Output of commands that touch neither the analysis store nor the
/// session; `None` for everything else.
pub fn dispatch_without_state(command: &Command) -> Option<AppResult<String>> {
    match command {
        Command::SetKey { provider, api_key } => Some(set_key_json(provider, api_key)),
        Command::Schema => Some(schema_json()),
        _ => None,
    }
}

pub async fn run() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_logging();
    let cli = Cli::parse();

    let result = async {
        if let Some(output) = dispatch_without_state(&cli.command) {
            return output;
        }
        let config = AppConfig::from_env()?;
        let state = AppState::from_config(config).await?;
        dispatch(&state, cli.command, cli.format).await
    }
    .await;

    match result {
        Ok(output) => {
            print!("{output}");
            if !output.ends_with('\n') {
                println!();
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error[{}]: {err}", err.code());
            ExitCode::FAILURE
        }
    }
}
