use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use api_ingress::{ApiIngress, ApiIngressConfig, RestfulModule};
use auth::{AuthConfig, AuthModule};
use clap::{Parser, Subcommand};
use db::{ConnectOpts, DbEngine, DbHandle, DbModule};
use labels::{LabelsConfig, LabelsModule};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs, DatabaseConfig};
use tokio_util::sync::CancellationToken;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const DEFAULT_DATABASE_URL: &str = "sqlite://database/elabel.db";

/// eLabel Server - clinical trial label API
#[derive(Parser)]
#[command(name = "elabel-server")]
#[command(about = "eLabel Server - clinical trial label API")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
    /// Import label templates from a YAML file, skipping ones already stored
    SeedTemplates {
        /// YAML file with a top-level `templates` list
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // `.env` must be loaded before the config so APP__* entries apply
    let dotenv_path = runtime::config::load_dotenv();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let logging_config = config
        .logging
        .clone()
        .unwrap_or_else(runtime::default_logging_config);
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    install_panic_hook();

    tracing::info!(
        environment = %config.server.environment,
        home_dir = %config.server.home_dir,
        "eLabel Server starting"
    );
    if let Some(path) = dotenv_path {
        tracing::info!(path = %path.display(), "Loaded environment file");
    }

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(&config),
        Commands::SeedTemplates { file } => seed_templates(config, &file).await,
    };
    if let Err(e) = &result {
        tracing::error!(error = ?e, "eLabel Server failed");
    }
    result
}

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!(panic = %info, "Unhandled panic");
        default_hook(info);
    }));
}

/// Module configs, parsed and validated up front so bad settings fail fast.
struct ModuleConfigs {
    api_ingress: ApiIngressConfig,
    labels: LabelsConfig,
    auth: AuthConfig,
}

impl ModuleConfigs {
    fn load(config: &AppConfig) -> Result<Self> {
        let auth: AuthConfig = config.module_config("auth")?;
        auth.validate().context("invalid auth configuration")?;
        Ok(Self {
            api_ingress: config.module_config("api_ingress")?,
            labels: config.module_config("labels")?,
            auth,
        })
    }
}

fn database_config(config: &AppConfig) -> DatabaseConfig {
    config.database.clone().unwrap_or_else(|| {
        tracing::warn!(url = DEFAULT_DATABASE_URL, "No database configured, using default");
        DatabaseConfig {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_conns: None,
            busy_timeout_ms: None,
        }
    })
}

/// Final DSN: relative SQLite paths are anchored at the home directory.
fn resolve_dsn(config: &AppConfig, db_config: &DatabaseConfig) -> Result<(String, DbEngine)> {
    let dsn = db_config.url.trim();
    if dsn.is_empty() {
        anyhow::bail!("Database URL not configured");
    }
    let engine = DbHandle::detect(dsn)?;
    let dsn = match engine {
        DbEngine::Sqlite => db::absolutize_sqlite_dsn(dsn, Path::new(&config.server.home_dir))?,
        DbEngine::Postgres => dsn.to_string(),
    };
    Ok((dsn, engine))
}

async fn connect_db(config: &AppConfig) -> Result<DbHandle> {
    let db_config = database_config(config);
    let (dsn, engine) = resolve_dsn(config, &db_config)?;

    let connect_opts = ConnectOpts {
        max_conns: db_config.max_conns,
        acquire_timeout: Some(Duration::from_secs(5)),
        sqlite_busy_timeout: db_config
            .busy_timeout_ms
            .map(|ms| Duration::from_millis(ms as u64)),
        create_sqlite_dirs: true,
        ..Default::default()
    };

    tracing::info!(?engine, "Connecting to database");
    let db = DbHandle::connect(&dsn, connect_opts)
        .await
        .context("failed to connect to database")?;
    tracing::info!(?engine, "Connected to database");
    Ok(db)
}

async fn run_server(config: AppConfig) -> Result<()> {
    let module_configs = ModuleConfigs::load(&config)?;
    let db = connect_db(&config).await?;

    tracing::info!("Initializing modules...");
    let labels = LabelsModule::new(&db, module_configs.labels);
    let auth = AuthModule::new(&db, module_configs.auth, &config.server.environment)?;
    for module in [&labels as &dyn DbModule, &auth] {
        module.migrate(&db).await?;
    }

    let ingress = ApiIngress::new(module_configs.api_ingress, &config.server);
    let router = ingress.build_router(&[&labels as &dyn RestfulModule, &auth])?;
    let listener = ingress.bind().await?;

    let cancel = CancellationToken::new();
    let serve = ingress.serve(listener, router, cancel.clone());
    tokio::pin!(serve);

    tokio::select! {
        res = &mut serve => {
            res?;
        }
        signal = runtime::wait_for_shutdown() => {
            signal?;
            cancel.cancel();
            let grace = Duration::from_secs(config.server.shutdown_timeout_sec);
            let drained = tokio::time::timeout(grace, async {
                let res = (&mut serve).await;
                db.close().await;
                res
            })
            .await;
            match drained {
                Ok(res) => res?,
                Err(_) => {
                    tracing::error!(
                        timeout_sec = config.server.shutdown_timeout_sec,
                        "Could not close connections in time, forcefully shutting down"
                    );
                    std::process::exit(1);
                }
            }
            tracing::info!("Server stopped");
            return Ok(());
        }
    }

    db.close().await;
    Ok(())
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    ModuleConfigs::load(config)?;
    resolve_dsn(config, &database_config(config))?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    Ok(())
}

async fn seed_templates(config: AppConfig, file: &Path) -> Result<()> {
    let templates = labels::infra::seed::load_templates(file)?;
    let labels_config: LabelsConfig = config.module_config("labels")?;

    let db = connect_db(&config).await?;
    let module = LabelsModule::new(&db, labels_config);
    module.migrate(&db).await?;

    let total = templates.len();
    let inserted = module.service().import_templates(templates).await?;
    db.close().await;

    println!(
        "Imported {} of {} templates from {}",
        inserted.len(),
        total,
        file.display()
    );
    Ok(())
}
