//! rpps-admin - terminal admin client for a municipal pension fund API.
//!
//! Provides login/logout/refresh against the fund's authentication
//! endpoints and quick read access to the public content (news and
//! transparency documents).

use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rpps_admin::api::ApiClient;
use rpps_admin::auth::{evaluate, GuardDecision, LoginOutcome, SessionManager, SessionStore};
use rpps_admin::config::Config;
use rpps_admin::models::LoginCredentials;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Set up logging with environment-based filter
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn usage() {
    eprintln!("Usage: rpps-admin <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  login [username]   authenticate and persist the session");
    eprintln!("  logout             end the session and clear stored tokens");
    eprintln!("  status             show the current session state");
    eprintln!("  profile            fetch the signed-in user profile");
    eprintln!("  refresh            renew the access token");
    eprintln!("  noticias [--all]   list news items (published only by default)");
    eprintln!("  documentos         list transparency documents");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str);

    let mut config = Config::load().context("Failed to load configuration")?;
    let client = ApiClient::new(config.api_base_url())?;
    let store = SessionStore::new(config.session_dir()?);
    let mut manager = SessionManager::new(client.clone(), store);

    match command {
        Some("login") => {
            let username = match args.get(2) {
                Some(name) => name.clone(),
                None => prompt_username(config.last_username.as_deref())?,
            };
            let password = rpassword::prompt_password("Senha: ")?;

            let outcome = manager
                .login(&LoginCredentials {
                    username: username.clone(),
                    password,
                })
                .await;

            match outcome {
                LoginOutcome::Success => {
                    config.last_username = Some(username);
                    config.save()?;
                    let user = manager.session().user.as_ref().map(|u| u.display_name());
                    println!("Login realizado com sucesso ({}).", user.unwrap_or_default());
                }
                LoginOutcome::Failed(message) => {
                    eprintln!("{}", message);
                    std::process::exit(1);
                }
            }
        }
        Some("logout") => {
            manager.initialize().await;
            manager.logout().await;
            println!("Logout realizado com sucesso.");
        }
        Some("status") => {
            manager.initialize().await;
            let session = manager.session();
            match evaluate(session, "/admin") {
                GuardDecision::Allow => {
                    let user = session.user.as_ref().map(|u| u.display_name());
                    println!("Autenticado como {}.", user.unwrap_or_default());
                }
                GuardDecision::RedirectToLogin { .. } => {
                    println!("Não autenticado. Use `rpps-admin login`.");
                }
                GuardDecision::Wait => unreachable!("initialize resolves loading"),
            }
        }
        Some("profile") => {
            manager.initialize().await;
            let profile: rpps_admin::models::UserProfile =
                manager.get_with_refresh("/auth/profile/").await?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        Some("refresh") => {
            manager.initialize().await;
            manager.refresh_access_token().await?;
            println!("Token de acesso renovado.");
        }
        Some("noticias") => {
            let only_published = !args.iter().any(|a| a == "--all");
            let noticias = client.fetch_noticias(only_published).await?;
            info!(count = noticias.len(), "Fetched news items");
            for noticia in &noticias {
                println!(
                    "{:>5}  {}  [{}]  {}",
                    noticia.id,
                    noticia.data_criacao.format("%d/%m/%Y"),
                    noticia.status,
                    noticia.titulo
                );
            }
        }
        Some("documentos") => {
            let documentos = client.fetch_documentos().await?;
            info!(count = documentos.len(), "Fetched documents");
            for doc in &documentos {
                println!(
                    "{:>5}  {:<16}  {}",
                    doc.id, doc.categoria, doc.titulo_documento
                );
            }
        }
        _ => {
            usage();
            std::process::exit(2);
        }
    }

    Ok(())
}

fn prompt_username(last: Option<&str>) -> Result<String> {
    match last {
        Some(last) => print!("Usuário [{}]: ", last),
        None => print!("Usuário: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    if input.is_empty() {
        last.map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("Username is required"))
    } else {
        Ok(input.to_string())
    }
}
