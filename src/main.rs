use anyhow::Context;
use clap::{ArgAction, Parser};
use ddmsync_lib::core::scanner::ScanConfig;
use ddmsync_lib::logging::{LogConfig, SizeRotatingWriter};
use ddmsync_lib::{
    ApiOverrides, AppConfig, HttpApi, ManagementApi, MemoryApi, Reporter, SyncConfig, SyncEngine,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

const ABOUT: &str = "\
Synchronizes declarations and sets from a directory to a KMFDDM server.
Only changed declarations and sets are notified, in a single notification.";

const EPILOG: &str = "\
The directory is walked to find files that can be synced. Any file with a
\".json\" extension is a declaration and is uploaded as such. Files matching
\"set.$SET.txt\" contain one declaration identifier per line to associate
with the \"$SET\" set. Prefix an identifier with a minus (\"-\") to
dissociate it; lines starting with \"#\" are comments.

For example:

  ./a/com.example.test.json
  ./b/com.example.act.json
  ./c/set.default.txt

Both JSON files are uploaded as declarations, then each identifier in the
txt file is applied to the \"default\" set.";

#[derive(Parser, Debug)]
#[command(name = "ddmsync", version, about = ABOUT, after_help = EPILOG)]
struct Cli {
    /// Path to the directory containing declarations and set files
    dir: PathBuf,

    /// Base URL of the KMFDDM API [default: http://[::1]:9002/v1]
    #[arg(long, env = "API_BASE_URL")]
    apibaseurl: Option<String>,

    /// Username for HTTP Basic authentication [default: kmfddm]
    #[arg(long, env = "API_USER")]
    user: Option<String>,

    /// Password for HTTP Basic authentication [default: kmfddm]
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    key: Option<String>,

    /// JSON config file with "api", "log" and "transport" sections
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Number of declarations uploaded in parallel
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Do not verify TLS certificates
    #[arg(long)]
    insecure: bool,

    /// Sync against an empty in-memory server instead of the network
    #[arg(long)]
    dry_run: bool,

    /// Print the final report as JSON instead of streaming lines
    #[arg(long)]
    json: bool,

    /// Increase diagnostic logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// 初始化日志系统：诊断日志写到 stderr，可选写入文件
fn init_logging(config: &LogConfig, verbose: u8) {
    if !config.enabled && verbose == 0 {
        return;
    }

    let level = match verbose {
        0 => config.tracing_level(),
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let mut env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    for directive in ["hyper=warn", "reqwest=warn"] {
        if let Ok(d) = directive.parse::<Directive>() {
            env_filter = env_filter.add_directive(d);
        }
    }

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let file_layer = config.file.as_ref().and_then(|path| {
        match SizeRotatingWriter::new(path, config.max_size_mb) {
            Ok(writer) => Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(false),
            ),
            Err(e) => {
                eprintln!("WARNING: cannot open log file {:?}: {}", path, e);
                None
            }
        }
    });

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer);
    let _ = tracing::subscriber::set_global_default(subscriber);
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut app_config = AppConfig::load_optional(cli.config.as_deref())?;
    init_logging(&app_config.log, cli.verbose);

    let cli_api = ApiOverrides {
        base_url: cli.apibaseurl,
        user: cli.user,
        key: cli.key,
    };
    let api_config = cli_api.or(app_config.api.clone()).resolve();

    if cli.timeout.is_some() {
        app_config.transport.timeout_secs = cli.timeout;
    }
    if cli.insecure {
        app_config.transport.accept_invalid_certs = true;
    }

    let api: Arc<dyn ManagementApi> = if cli.dry_run {
        tracing::warn!("dry run: 使用内存服务，不会发出网络请求");
        Arc::new(MemoryApi::new())
    } else {
        Arc::new(
            HttpApi::new(
                &api_config.base_url,
                &api_config.credentials(),
                &app_config.transport,
            )
            .context("creating API client")?,
        )
    };

    let engine = SyncEngine::with_config(
        api,
        SyncConfig {
            scan_config: ScanConfig::default(),
            max_concurrent_uploads: cli.concurrency,
        },
    );

    let reporter = if cli.json {
        Reporter::quiet()
    } else {
        Reporter::streaming()
    };
    let report = engine.run_sync(&cli.dir, reporter).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR {:#}", e);
            ExitCode::FAILURE
        }
    }
}
