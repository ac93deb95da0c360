//! Script Console
//!
//! Command-line client for remote script sessions.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use console::config::{Config, LoggingConfig};
use console::protocol::{AuthScheme, SessionId, SessionList, SessionSummary};
use console::{ConsoleLoop, HttpTransport, LoopExit, SessionClient, TerminalInput};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Script Console - interactive client for remote script sessions.
///
/// With only a host, lists the sessions on the server. With a session id or
/// --new, opens an interactive console on that session.
#[derive(Parser, Debug)]
#[command(name = "script-console")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Server host name
    pub host: String,

    /// Session to attach to
    pub session: Option<SessionId>,

    /// Server port [default: 8080]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Username [default: admin]
    #[arg(short, long)]
    pub user: Option<String>,

    /// Password [default: geoserver]
    #[arg(short = 'w', long)]
    pub password: Option<String>,

    /// Web application context [default: geoserver]
    #[arg(short, long)]
    pub context: Option<String>,

    /// Create a new session and attach to it
    #[arg(long, conflicts_with = "session")]
    pub new: bool,

    /// Print the session list as JSON
    #[arg(long)]
    pub json: bool,

    /// Send the Authorization header in the legacy encoding
    #[arg(long)]
    pub legacy_auth: bool,

    /// Path to configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Overlay command-line values on the loaded configuration.
    fn apply_overrides(&self, config: &mut Config) {
        config.connection.host = self.host.clone();
        if let Some(port) = self.port {
            config.connection.port = port;
        }
        if let Some(user) = &self.user {
            config.connection.user = user.clone();
        }
        if let Some(password) = &self.password {
            config.connection.password = password.clone();
        }
        if let Some(context) = &self.context {
            config.connection.context = context.clone();
        }
        if self.legacy_auth {
            config.connection.auth_scheme = AuthScheme::Legacy;
        }
        if self.verbose {
            config.logging.level = "debug".to_string();
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => Config::load(config_path)?,
        None => Config::load_default()?,
    };

    // Apply environment variable overrides, then command-line flags
    config.apply_env_overrides();
    cli.apply_overrides(&mut config);

    // Validate configuration
    config.validate()?;

    init_logging(&config.logging)?;
    if let Some(config_path) = &cli.config {
        tracing::info!("Using config file: {:?}", config_path);
    }

    let transport =
        HttpTransport::new(&config.connection).context("Failed to create HTTP transport")?;
    let mut client = SessionClient::new(transport);

    if cli.new || cli.session.is_some() {
        let session = match cli.session {
            Some(id) => client
                .bind(id)
                .await
                .with_context(|| format!("Failed to bind to session {}", id))?,
            None => client
                .create()
                .await
                .context("Failed to create session")?,
        };
        let Some(session) = session else {
            anyhow::bail!("The server refused the session request");
        };
        tracing::info!(
            "Attached to session {} on {}",
            session.id(),
            config.connection.base_url()
        );

        let input = TerminalInput::new().context("Failed to install interrupt handler")?;
        let mut console = ConsoleLoop::new(session, input, io::stdout(), &config.console);
        let exit = console.run().await?;
        drop(console);

        if exit == LoopExit::EndOfInput {
            client.close()?;
        }
    } else {
        let sessions = client.list().await.context("Failed to list sessions")?;
        if let Some(sessions) = sessions {
            if cli.json {
                println!("{}", SessionList { sessions }.to_json()?);
            } else {
                print!("{}", format_sessions_table(&sessions));
            }
        }
        client.close()?;
    }

    Ok(())
}

/// Install the tracing subscriber.
///
/// Log lines go to stderr so they never mix with evaluation output. A
/// configured log file receives the same events without ANSI colors.
fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.level)
        .with_context(|| format!("Invalid log level: {}", config.level))?;
    let stderr_layer = fmt::layer().with_writer(io::stderr).with_target(false);

    let file_layer = match &config.file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let file_name = path.file_name().with_context(|| {
                format!("Log file path has no file name: {}", path.display())
            })?;
            std::fs::create_dir_all(&directory).with_context(|| {
                format!("Failed to create log directory: {}", directory.display())
            })?;

            let appender = RollingFileAppender::new(Rotation::NEVER, &directory, file_name);
            Some(fmt::layer().with_writer(appender).with_ansi(false).boxed())
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install logger")
}

/// Render sessions as an ASCII table.
fn format_sessions_table(sessions: &[SessionSummary]) -> String {
    if sessions.is_empty() {
        return "No active sessions.\n".to_string();
    }

    // Calculate column widths
    let id_width = sessions
        .iter()
        .map(|s| s.id.to_string().len())
        .max()
        .unwrap_or(2)
        .max(2);
    let engine_width = sessions
        .iter()
        .map(|s| s.engine.len())
        .max()
        .unwrap_or(6)
        .max(6);

    let mut out = String::new();
    out.push_str(&format!(
        "{:>id_width$}  {:<engine_width$}\n",
        "ID",
        "ENGINE",
        id_width = id_width,
        engine_width = engine_width
    ));
    out.push_str(&format!("{}\n", "-".repeat(id_width + engine_width + 2)));

    for session in sessions {
        out.push_str(&format!(
            "{:>id_width$}  {:<engine_width$}\n",
            session.id,
            session.engine,
            id_width = id_width,
            engine_width = engine_width
        ));
    }

    out.push('\n');
    out.push_str(&format!("Total: {} session(s)\n", sessions.len()));
    out
}
