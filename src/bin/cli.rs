//! Coderunner CLI
//!
//! Serves the execution API and offers local helpers for running files,
//! listing languages and checking the configuration.

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use coderunner::config::{
    apply_env_overrides, config_path, load_config, load_config_from_path, read_config_snapshot,
    save_config, validate_config,
};
use coderunner::sandbox::{
    ContainerRuntime, DockerRuntime, ExecutionRequest, LanguageRegistry, SandboxController,
};
use coderunner::{Config, Error, VERSION};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "coderunner",
    author = "Coderunner Contributors",
    version = VERSION,
    about = "Coderunner - Sandboxed code execution service",
    long_about = None
)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, short, global = true, env = "CODERUNNER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP and WebSocket server
    Serve {
        /// Bind address
        #[arg(long)]
        bind: Option<String>,

        /// Port
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Execute a local source file in a sandbox
    Run {
        /// Language of the file
        language: String,

        /// Path of the source file
        file: PathBuf,
    },

    /// List the supported languages
    Languages,

    /// Validate the configuration and check the container runtime
    Check,

    /// Write a default configuration file
    InitConfig {
        /// Where to write it (defaults to the user config directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coderunner=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind, port } => serve(cli.config.as_deref(), bind, port).await,
        Commands::Run { language, file } => run_file(cli.config.as_deref(), &language, &file).await,
        Commands::Languages => list_languages(cli.config.as_deref()),
        Commands::Check => check(cli.config.as_deref()).await,
        Commands::InitConfig { path, force } => init_config(path, force),
    }
}

/// Load configuration from `path`, or from the default location
fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => {
            let mut config = load_config_from_path(path)?;
            apply_env_overrides(&mut config);
            config
        }
        None => load_config()?,
    };
    Ok(config)
}

fn controller(config: &Config) -> anyhow::Result<SandboxController> {
    let runtime: Arc<dyn ContainerRuntime> = Arc::new(DockerRuntime::connect()?);
    Ok(SandboxController::from_config(runtime, config))
}

async fn serve(path: Option<&Path>, bind: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let mut config = load(path)?;
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let validation = validate_config(&config);
    for warning in &validation.warnings {
        tracing::warn!("Config: {}", warning);
    }
    if !validation.valid {
        for issue in &validation.errors {
            tracing::error!("Config: {}", issue);
        }
        anyhow::bail!("Invalid configuration");
    }

    info!(
        "Starting {} v{} (timeout {:?}, memory {}, cpu shares {})",
        coderunner::NAME,
        VERSION,
        config.sandbox.timeout,
        config.sandbox.memory_limit,
        config.sandbox.cpu_shares
    );
    coderunner::gateway::serve(&config).await?;
    Ok(())
}

async fn run_file(path: Option<&Path>, language: &str, file: &Path) -> anyhow::Result<()> {
    let config = load(path)?;
    let code = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let controller = controller(&config)?;
    let request = ExecutionRequest::new(language, code);

    println!("{} {} ({})", style("▶").cyan(), file.display(), language);

    match controller.execute(&request).await {
        Ok(output) => {
            print!("{}", output.stdout);
            if !output.stderr.is_empty() {
                eprint!("{}", style(&output.stderr).yellow());
            }
            println!(
                "\n{} Finished in {:?}",
                style("✓").green(),
                output.duration
            );
            Ok(())
        }
        Err(Error::ExecutionFailed {
            message,
            exit_code,
            stdout,
            stderr,
        }) => {
            print!("{}", stdout);
            eprint!("{}", style(&stderr).red());
            println!("\n{} {}", style("✗").red(), message);
            std::process::exit(exit_code.map_or(1, |code| code.clamp(1, 255) as i32));
        }
        Err(Error::ExecutionTimeout { timeout, stdout, .. }) => {
            print!("{}", stdout);
            println!(
                "\n{} Execution timed out after {} seconds",
                style("⏱").yellow(),
                timeout.as_secs_f64()
            );
            std::process::exit(124);
        }
        Err(e) => Err(e.into()),
    }
}

fn list_languages(path: Option<&Path>) -> anyhow::Result<()> {
    let config = load(path)?;
    let registry = LanguageRegistry::with_overrides(&config.languages);

    println!("{}", style("Supported languages").bold());
    for profile in registry.languages() {
        let aliases = if profile.aliases.is_empty() {
            String::new()
        } else {
            format!(" (aka {})", profile.aliases.join(", "))
        };
        println!(
            "  {} {}{} {}",
            style("•").cyan(),
            style(&profile.name).bold(),
            aliases,
            style(format!("[{}, {}]", profile.image, profile.extension)).dim()
        );
    }
    Ok(())
}

async fn check(path: Option<&Path>) -> anyhow::Result<()> {
    let file = path.map(Path::to_path_buf).unwrap_or_else(config_path);
    let snapshot = read_config_snapshot(&file);

    if snapshot.exists {
        println!("   {} Config file: {}", style("○").dim(), file.display());
    } else {
        println!(
            "   {} No config file at {}, using defaults",
            style("○").dim(),
            file.display()
        );
    }
    if snapshot.exists {
        for issue in &snapshot.issues {
            println!("   {} {}", style("✗").red(), issue);
        }
    }

    let mut config = snapshot.config.unwrap_or_default();
    apply_env_overrides(&mut config);

    let validation = validate_config(&config);
    for issue in &validation.errors {
        println!("   {} {}", style("✗").red(), issue);
    }
    for issue in &validation.warnings {
        println!("   {} {}", style("!").yellow(), issue);
    }
    if validation.valid {
        println!("   {} Configuration valid", style("✓").green());
    }

    print!("   {} Docker... ", style("○").dim());
    io::stdout().flush()?;
    let runtime = DockerRuntime::connect();
    match runtime {
        Ok(runtime) => match runtime.ping().await {
            Ok(()) => println!("{}", style("✓ Connected").green()),
            Err(e) => println!("{} {}", style("✗").red(), e),
        },
        Err(e) => println!("{} {}", style("✗").red(), e),
    }

    Ok(())
}

fn init_config(path: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(config_path);
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    save_config(&Config::default(), &path)?;
    println!("{} Wrote {}", style("✓").green(), path.display());
    Ok(())
}
