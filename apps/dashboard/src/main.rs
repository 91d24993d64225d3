use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use dashboard::auth::SessionStatus;
use dashboard::config::{parse_paper, Config};
use dashboard::errors::{ApiError, ErrorCategory};
use dashboard::layout::PreviewFrame;
use dashboard::render::{DocumentRenderer, TextLayoutRenderer, Theme};
use dashboard::state::AppState;

#[derive(Parser)]
#[command(name = "dashboard")]
#[command(about = "Resume dashboard client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Login {
        email: String,
        #[arg(short, long)]
        password: String,
    },
    Register {
        name: String,
        email: String,
        #[arg(short, long)]
        password: String,
    },
    Logout,
    /// Finish an OAuth sign-in from the provider redirect URL
    OauthCallback {
        url: String,
    },
    List,
    Show {
        id: Uuid,
    },
    Preview {
        id: Uuid,
        #[arg(long, default_value = "1")]
        page: u32,
        /// Show the whole document without pagination
        #[arg(long)]
        print: bool,
        /// Override PAPER_SIZE (a4 or letter)
        #[arg(long)]
        paper: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting dashboard v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState::new(config)
        .await
        .context("Failed to initialize API client")?;

    let outcome = run(&state, cli.command).await;

    if let Err(e) = &outcome {
        let session_ended = matches!(
            e.downcast_ref::<ApiError>().map(ApiError::category),
            Some(ErrorCategory::AuthInvalid)
        );
        if session_ended {
            if let SessionStatus::SignedOut { reason } = state.api.session().status() {
                let reason = reason.unwrap_or_else(|| "not signed in".to_string());
                eprintln!("Session ended ({reason}). Run `dashboard login` to sign in again.");
            }
        }
    }
    outcome
}

async fn run(state: &AppState, command: Commands) -> Result<()> {
    match command {
        Commands::Login { email, password } => {
            let user = state.auth.login(&email, &password).await?;
            match user {
                Some(user) => println!("Signed in as {}", user.email),
                None => println!("Signed in"),
            }
        }
        Commands::Register {
            name,
            email,
            password,
        } => {
            state.auth.register(&name, &email, &password).await?;
            println!("Account created for {email}");
        }
        Commands::Logout => {
            state.auth.logout().await;
            println!("Signed out");
        }
        Commands::OauthCallback { url } => {
            state.auth.complete_oauth(&url).await?;
            println!("Signed in");
        }
        Commands::List => {
            let resumes = state.resumes.list().await?;
            for resume in &resumes {
                println!(
                    "{}  {:<32}  {:<8}  updated {}",
                    resume.id,
                    resume.title,
                    resume.theme,
                    resume.updated_at.format("%Y-%m-%d %H:%M")
                );
            }
            if resumes.is_empty() {
                println!("No resumes yet");
            }
        }
        Commands::Show { id } => {
            let resume = state.resumes.get(id).await?;
            println!("{}", serde_json::to_string_pretty(&resume)?);
        }
        Commands::Preview {
            id,
            page,
            print,
            paper,
        } => {
            let resume = state.resumes.get(id).await?;
            let preview = state.preview(print);
            if let Some(paper) = paper {
                preview.set_paper(parse_paper(&paper)?);
            }

            let theme = Theme::by_name(&resume.theme);
            let document = Arc::new(TextLayoutRenderer.render(
                &resume.data,
                &theme,
                preview.natural_width_px(),
            ));
            state.monitor.report(Some(document.height_px));
            preview.goto_page(page);

            print_frame(&preview.present(document), &theme);
        }
    }
    Ok(())
}

fn print_frame(frame: &PreviewFrame, theme: &Theme) {
    match frame {
        PreviewFrame::Print(view) => {
            println!(
                "[print] theme {} · {:.0}px tall",
                theme.name, view.document.height_px
            );
            for (kind, line) in view.document.lines_in(0.0, view.document.height_px) {
                println!("{:>7.1}  {:?}  {}", line.top_px, kind, line.text);
            }
        }
        PreviewFrame::Paginated(view) => {
            println!(
                "[page {}/{}] theme {} · scale {:.3} · translate {:.1}px",
                view.page, view.page_count, theme.name, view.transform.scale, view.transform.translate_y
            );
            for (kind, line) in view.page_lines() {
                println!("{:>7.1}  {:?}  {}", line.top_px, kind, line.text);
            }
            for marker in &view.markers {
                println!("-- page break at {:.0}px (screen y {:.1}) --", marker.offset_px, marker.screen_y);
            }
        }
    }
}
