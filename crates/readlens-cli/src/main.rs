//! readlens - command-line front end for the readlens article service.
//!
//! Every command shares one `SessionManager`; commands other than login and
//! register resolve the stored session first.

mod cli;

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use clap::Parser;
use readlens_core::api::articles;
use readlens_core::models::{ArticleEnvelope, ArticleList, ExtractResponse, TranslateResponse};
use readlens_core::{
    ApiClient, Config, RegisterRequest, RequestDescriptor, Session, SessionExpiredEvent,
    SessionManager,
};
use reqwest::Method;
use serde_json::Value;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Args, Commands};

/// Read instead of prompting, for scripts
const PASSWORD_ENV: &str = "READLENS_PASSWORD";

const LOGIN_HINT: &str = "Not logged in. Run `readlens login` first.";

/// Initialize the tracing subscriber for logging.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_tracing(args: &Args) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match args.log_dir {
        Some(ref dir) => {
            let appender = tracing_appender::rolling::daily(dir, "readlens.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let _log_guard = init_tracing(&args);
    info!("readlens starting");

    let mut config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        Config::default()
    });

    let base_url = args
        .api_url
        .clone()
        .unwrap_or_else(|| config.api_base_url());
    let credentials = config
        .credential_store()
        .context("Failed to open credential store")?;
    let api = ApiClient::with_timeout(base_url, credentials, config.request_timeout())
        .context("Failed to build HTTP client")?;

    let mut expired = api.subscribe_session_expired();
    let session = SessionManager::new(api);

    let result = run(args.command, &session, &mut config).await;

    // Events are sent before the failing call returns, so they are all queued by now
    if let Some(hint) = expiry_hint(&mut expired) {
        eprintln!("{}", hint);
    }
    result
}

async fn run(command: Commands, session: &SessionManager, config: &mut Config) -> Result<()> {
    match command {
        Commands::Login { username } => {
            let username = match username.or_else(|| config.last_username.clone()) {
                Some(name) => name,
                None => prompt_username()?,
            };
            let password = read_password()?;

            let user = session
                .login(&username, &password)
                .await
                .context("Login failed")?;

            config.last_username = Some(username);
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
            println!("Logged in as {}", user.display_name());
        }

        Commands::Register { username, email } => {
            let password = read_password()?;
            let request = RegisterRequest {
                username: username.clone(),
                email,
                password,
            };

            let user = session
                .register(&request)
                .await
                .context("Registration failed")?;

            config.last_username = Some(username);
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
            println!("Registered and logged in as {}", user.display_name());
        }

        Commands::Logout => {
            session.logout().await.context("Failed to clear stored tokens")?;
            println!("Logged out");
        }

        Commands::Status => {
            let current = session.init().await;
            print_json(&serde_json::to_value(&current)?)?;
        }

        Commands::Extract { url } => {
            require_session(session).await?;
            let extracted: ExtractResponse = session
                .request_json(articles::extract_wiki(&url))
                .await
                .context("Extraction failed")?;
            info!(article_id = extracted.article_id, "Article extracted");
            print_json(&serde_json::to_value(&extracted)?)?;
        }

        Commands::Articles { id } => {
            require_session(session).await?;
            let value = match id {
                Some(id) => {
                    let envelope: ArticleEnvelope = session
                        .request_json(articles::get_article(id))
                        .await
                        .with_context(|| format!("Failed to fetch article {}", id))?;
                    envelope.article
                }
                None => {
                    let list: ArticleList = session
                        .request_json(articles::list_articles())
                        .await
                        .context("Failed to list articles")?;
                    Value::Array(list.articles)
                }
            };
            print_json(&value)?;
        }

        Commands::Summarize { text } => {
            require_session(session).await?;
            let summary: Value = session
                .request_json(articles::summarize(&text))
                .await
                .context("Summarization failed")?;
            print_json(&summary)?;
        }

        Commands::Translate {
            target_language,
            article,
            text,
        } => {
            require_session(session).await?;
            let text = match (article, text) {
                (Some(id), _) => {
                    let envelope: ArticleEnvelope = session
                        .request_json(articles::get_article(id))
                        .await
                        .with_context(|| format!("Failed to fetch article {}", id))?;
                    envelope
                        .translatable_text()
                        .with_context(|| format!("Article {} has no text to translate", id))?
                }
                (None, Some(text)) => text,
                (None, None) => bail!("Nothing to translate"),
            };

            let translated: TranslateResponse = session
                .request_json(articles::translate(&text, &target_language))
                .await
                .context("Translation failed")?;
            println!("{}", translated.translated_text);
        }

        Commands::Request { method, path, body } => {
            require_session(session).await?;
            let method = Method::from_bytes(method.to_uppercase().as_bytes())
                .with_context(|| format!("Invalid HTTP method: {}", method))?;
            let mut descriptor = RequestDescriptor::new(method, path);
            if let Some(body) = body {
                let body: Value = serde_json::from_str(&body).context("--body is not valid JSON")?;
                descriptor = descriptor.with_body(body);
            }

            let response = session.authenticated_request(descriptor).await?;
            let text = response.text().await.context("Failed to read response body")?;
            match serde_json::from_str::<Value>(&text) {
                Ok(value) => print_json(&value)?,
                Err(_) => println!("{}", text),
            }
        }
    }

    Ok(())
}

/// Message for the last session ended by an exhausted refresh, if any
fn expiry_hint(expired: &mut broadcast::Receiver<SessionExpiredEvent>) -> Option<String> {
    let mut last = None;
    loop {
        match expired.try_recv() {
            Ok(event) => last = Some(event),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
    last.map(|event| {
        format!(
            "Session expired ({}). Run `readlens login` to continue.",
            event.reason
        )
    })
}

/// Resolve the stored session, failing with a hint when signed out
async fn require_session(session: &SessionManager) -> Result<Session> {
    let current = session.init().await;
    if !current.is_authenticated() {
        bail!(LOGIN_HINT);
    }
    Ok(current)
}

fn prompt_username() -> Result<String> {
    print!("Username: ");
    io::stdout().flush()?;

    let mut username = String::new();
    io::stdin().read_line(&mut username)?;
    let username = username.trim().to_string();
    if username.is_empty() {
        bail!("Username required");
    }
    Ok(username)
}

fn read_password() -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }
    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        bail!("Password required");
    }
    Ok(password)
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_hint_reports_queued_event() {
        let (tx, mut rx) = broadcast::channel(4);
        assert_eq!(expiry_hint(&mut rx), None);

        tx.send(SessionExpiredEvent::new("/api/v1/auth/me", "refresh token rejected"))
            .unwrap();
        let hint = expiry_hint(&mut rx).unwrap();
        assert!(hint.contains("refresh token rejected"));
        assert!(hint.contains("readlens login"));

        // Drained
        assert_eq!(expiry_hint(&mut rx), None);
    }
}
