//! Command-line surface. Each subcommand stands in for one page of the web
//! app; see [`crate::routes`] for the matching paths.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "dataclaro", version, about = "Summarize PDFs with an LLM and keep the results")]
pub struct Cli {
    /// Output format for commands that print an analysis.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Markdown,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a PDF (or CSV / plain-text) file.
    Analyze {
        file: PathBuf,
        /// Name to store the analysis under instead of the file name.
        #[arg(long)]
        name: Option<String>,
        /// MIME type of the upload when the extension is not enough.
        #[arg(long)]
        mime: Option<String>,
        /// Re-run even if this exact file was analyzed before.
        #[arg(long)]
        force: bool,
    },
    /// List saved analyses, newest first.
    Dashboard {
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one saved analysis.
    Show { id: String },
    /// Delete one saved analysis.
    Delete { id: String },
    /// Print the public link for a saved analysis.
    Share { id: String },
    /// Write a saved analysis as a Markdown report.
    Export {
        id: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Read the blog.
    Blog {
        #[command(subcommand)]
        command: BlogCommand,
    },
    /// Sign in with the hosted auth provider.
    Login {
        #[command(subcommand)]
        command: LoginCommand,
    },
    Logout,
    Whoami,
    /// Save an inference API key in the OS keyring.
    SetKey { provider: String, api_key: String },
    /// Print the JSON schema of an analysis result.
    Schema,
}

#[derive(Subcommand, Debug)]
pub enum BlogCommand {
    List,
    Show { slug: String },
}

#[derive(Subcommand, Debug)]
pub enum LoginCommand {
    /// Print the URL that starts the OAuth sign-in.
    Url {
        #[arg(long)]
        redirect_to: Option<String>,
    },
    /// Finish sign-in with the refresh token from the OAuth callback.
    Token { refresh_token: String },
}
