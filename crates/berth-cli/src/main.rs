mod commands;

use berth_core::{install_signal_handler, interrupted, Engine};
use berth_runtime::SystemRunner;
use berth_schema::{EnvironmentType, Settings};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::install::InstallArgs;
use commands::update::UpdateArgs;
use commands::{TerminalPrompter, EXIT_EXCEPTION, EXIT_INTERRUPTED, EXIT_INVALID};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(
    name = "berth",
    version,
    about = "Lifecycle manager for local container-based development environments"
)]
struct Cli {
    /// Path to the Berth store directory.
    #[arg(long, default_value = "~/.local/share/berth", global = true)]
    store: String,

    /// Path to the settings file (default: ~/.config/berth/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Answer yes to every confirmation.
    #[arg(short, long, default_value_t = false, global = true)]
    yes: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Install a new environment for a project.
    Install {
        /// Project directory (default: current directory).
        #[arg(long)]
        location: Option<PathBuf>,
        /// Environment name (default: directory name).
        #[arg(long)]
        name: Option<String>,
        /// Technology stack; detected from composer.json when omitted.
        #[arg(long = "type", value_parser = parse_type)]
        env_type: Option<EnvironmentType>,
        /// PHP image version.
        #[arg(long)]
        php: Option<String>,
        /// Space-separated domains for a locally-trusted certificate.
        #[arg(long)]
        domains: Option<String>,
    },
    /// Rewrite the configuration of a stopped environment.
    Update {
        /// Environment name (default: the running one, or the current directory's).
        environment: Option<String>,
        /// PHP image version (default: keep the current one).
        #[arg(long)]
        php: Option<String>,
        /// Space-separated domains for a locally-trusted certificate.
        #[arg(long, conflicts_with = "no_domains")]
        domains: Option<String>,
        /// Remove the environment's domains.
        #[arg(long, default_value_t = false)]
        no_domains: bool,
    },
    /// Start the services and file synchronization of an environment.
    Start {
        environment: Option<String>,
    },
    /// Stop a running environment.
    Stop {
        environment: Option<String>,
    },
    /// Restart the services and file synchronization of a running environment.
    Restart {
        environment: Option<String>,
    },
    /// Remove an environment's containers, volumes, and configuration.
    Uninstall {
        environment: Option<String>,
    },
    /// List installed environments.
    List {
        /// Only show the running environment.
        #[arg(long, default_value_t = false)]
        active: bool,
    },
    /// Print shell exports of an environment's variables (eval $(berth root)).
    Root {
        environment: Option<String>,
    },
    /// Watch the file synchronization sessions.
    Monitor {
        environment: Option<String>,
    },
    /// Run diagnostic checks on the system and store.
    Doctor,
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

fn parse_type(s: &str) -> Result<EnvironmentType, String> {
    s.parse().map_err(|e: berth_schema::SchemaError| e.to_string())
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("BERTH_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    install_signal_handler();

    let settings = match Settings::load_or_default(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(EXIT_EXCEPTION);
        }
    };

    let store_path = expand_tilde(&cli.store);
    tracing::debug!("using store {}", store_path.display());
    let hosts_file = settings.hosts_file.clone();
    let engine = Engine::new(
        &store_path,
        settings,
        Arc::new(SystemRunner::new()),
        Arc::new(TerminalPrompter::new(cli.yes)),
    );
    let json = cli.json;
    let yes = cli.yes;

    let needs_tools = matches!(
        cli.command,
        Commands::Start { .. }
            | Commands::Stop { .. }
            | Commands::Restart { .. }
            | Commands::Uninstall { .. }
            | Commands::Monitor { .. }
    );
    if needs_tools && std::env::var("BERTH_SKIP_PREREQS").as_deref() != Ok("1") {
        let missing = berth_runtime::check_lifecycle_prereqs();
        if !missing.is_empty() {
            eprintln!("error: {}", berth_runtime::format_missing(&missing));
            return ExitCode::from(EXIT_EXCEPTION);
        }
    }

    let result = match cli.command {
        Commands::Install {
            location,
            name,
            env_type,
            php,
            domains,
        } => commands::install::run(
            &engine,
            InstallArgs {
                location,
                name,
                env_type,
                php,
                domains,
            },
            yes,
            json,
        ),
        Commands::Update {
            environment,
            php,
            domains,
            no_domains,
        } => commands::update::run(
            &engine,
            UpdateArgs {
                name: environment.as_deref(),
                php,
                domains,
                no_domains,
            },
            yes,
            json,
        ),
        Commands::Start { environment } => {
            commands::lifecycle::start(&engine, environment.as_deref(), json)
        }
        Commands::Stop { environment } => {
            commands::lifecycle::stop(&engine, environment.as_deref(), json)
        }
        Commands::Restart { environment } => {
            commands::lifecycle::restart(&engine, environment.as_deref(), json)
        }
        Commands::Uninstall { environment } => {
            commands::uninstall::run(&engine, environment.as_deref(), yes, json)
        }
        Commands::List { active } => commands::list::run(&engine, active, json),
        Commands::Root { environment } => {
            commands::root::run(&engine, environment.as_deref(), json)
        }
        Commands::Monitor { environment } => {
            commands::monitor::run(&engine, environment.as_deref())
        }
        Commands::Doctor => commands::doctor::run(&store_path, &hosts_file, json),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    if interrupted() {
        if let Err(msg) = &result {
            eprintln!("error: {msg}");
        }
        eprintln!("interrupted");
        return ExitCode::from(EXIT_INTERRUPTED);
    }

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("invalid environment:") {
                EXIT_INVALID
            } else {
                EXIT_EXCEPTION
            };
            ExitCode::from(code)
        }
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}
