//! # Genesis Bootstrap CLI
//!
//! Prepares a fresh chain home from the command line.
//!
//! ## Startup Sequence
//!
//! 1. Parse flags and load `BootstrapConfig` from the environment
//! 2. Apply flag overrides and validate
//! 3. Install the tracing subscriber
//! 4. Wire the reference adapters into the orchestrator
//! 5. Run the pipeline, cancelling on Ctrl+C or when the deadline passes

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use genesis_bootstrap::adapters::{
    BinaryChainRuntime, ChannelEventSink, CommandChainBuilder, HttpGenesisFetcher,
    PrebuiltBinary, StandardLayout, TokioFilesystem,
};
use genesis_bootstrap::{
    BootstrapApi, BootstrapConfig, BootstrapContext, BootstrapOrchestrator, BuildCache,
    ChainBuilder, ChainHandle, Collaborators, GenesisHash, ProgressEvent,
};

/// Genesis Bootstrap: prepare a fresh node home with a validated genesis
#[derive(Parser, Debug)]
#[command(name = "genesis-bootstrap")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Chain id of the node to bootstrap
    #[arg(long)]
    chain_id: String,

    /// Chain binary (path, or a name resolved through PATH)
    #[arg(long)]
    binary: PathBuf,

    /// Program that builds the chain binary; the binary is used as-is when unset
    #[arg(long)]
    build_command: Option<String>,

    /// Argument passed to the build command (repeatable)
    #[arg(long = "build-arg", allow_hyphen_values = true)]
    build_args: Vec<String>,

    /// Chain source directory the build runs in
    #[arg(long, default_value = ".")]
    app_dir: PathBuf,

    /// Fetch the genesis from this URL instead of generating one
    #[arg(long)]
    genesis_url: Option<String>,

    /// Expected SHA-256 (hex) of the fetched genesis
    #[arg(long)]
    genesis_hash: Option<String>,

    /// Build cache directory [default: <home-base>/.genesis-bootstrap/cache]
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Node home; overrides <home-base>/.<chain-id>
    #[arg(long)]
    home: Option<PathBuf>,

    /// Base directory for default node homes (GB_HOME_BASE)
    #[arg(long)]
    home_base: Option<PathBuf>,

    /// Moniker of the default genesis validator (GB_MONIKER)
    #[arg(long)]
    moniker: Option<String>,

    /// HTTP timeout for genesis downloads, in seconds (GB_FETCH_TIMEOUT_SECS)
    #[arg(long)]
    fetch_timeout_secs: Option<u64>,

    /// Deadline for the whole run, in seconds (GB_DEADLINE_SECS)
    #[arg(long)]
    deadline_secs: Option<u64>,

    /// Log filter (GB_LOG_LEVEL / RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    /// Layer flag overrides on top of the environment configuration.
    fn apply(&self, mut config: BootstrapConfig) -> Result<BootstrapConfig> {
        if let Some(base) = &self.home_base {
            config.home_base = base.clone();
        }
        if let Some(moniker) = &self.moniker {
            config.moniker = moniker.clone();
        }
        if let Some(secs) = self.fetch_timeout_secs {
            config.fetch_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.deadline_secs {
            config.deadline = Some(Duration::from_secs(secs));
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    fn chain(&self) -> ChainHandle {
        let mut chain = ChainHandle::new(&self.chain_id, &self.app_dir);
        if let Some(url) = &self.genesis_url {
            chain = chain.with_genesis_url(url);
        }
        if let Some(hash) = self.genesis_hash.as_deref().and_then(GenesisHash::parse) {
            chain = chain.with_expected_hash(hash);
        }
        if let Some(home) = &self.home {
            chain = chain.with_home(home);
        }
        chain
    }

    fn state_dir(&self, config: &BootstrapConfig) -> PathBuf {
        config.home_base.join(".genesis-bootstrap")
    }

    fn cache(&self, config: &BootstrapConfig) -> BuildCache {
        let dir = self
            .cache_dir
            .clone()
            .unwrap_or_else(|| self.state_dir(config).join("cache"));
        BuildCache::new(dir)
    }

    fn builder(&self) -> Arc<dyn ChainBuilder> {
        match &self.build_command {
            Some(program) => Arc::new(CommandChainBuilder::new(
                program,
                self.build_args.clone(),
                &self.app_dir,
                &self.binary,
            )),
            None => Arc::new(PrebuiltBinary::new(&self.binary)),
        }
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .with_context(|| format!("Invalid log filter {level:?}"))?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Print progress events as they arrive; ends when every sender is gone.
fn spawn_progress_printer(mut rx: mpsc::UnboundedReceiver<ProgressEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            println!("{event}");
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let env_config = BootstrapConfig::from_env().context("Failed to load configuration")?;
    let config = args.apply(env_config)?;
    init_logging(&config.log_level)?;

    let (events, rx) = ChannelEventSink::channel();
    let printer = spawn_progress_printer(rx);

    let state_dir = args.state_dir(&config);
    let orchestrator = BootstrapOrchestrator::with_config(
        Collaborators {
            builder: args.builder(),
            runtime: Arc::new(BinaryChainRuntime::new(
                &args.binary,
                StandardLayout::new(&config.home_base),
            )),
            fetcher: Arc::new(HttpGenesisFetcher::new(
                state_dir.join("downloads"),
                config.fetch_timeout,
            )),
            fs: Arc::new(TokioFilesystem::new()),
            events: Arc::new(events),
        },
        &config,
    );

    let (mut ctx, cancel) = BootstrapContext::new();
    if let Some(deadline) = config.deadline {
        ctx = ctx.with_timeout(deadline);
    }
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling bootstrap");
            cancel.cancel();
        }
    });

    let mut chain = args.chain();
    let cache = args.cache(&config);
    let result = orchestrator.init(&mut chain, &cache, &ctx).await;

    // Closing the last sender lets the printer drain and stop.
    drop(orchestrator);
    printer.await.context("Progress printer failed")?;

    let genesis =
        result.with_context(|| format!("Failed to bootstrap chain {}", args.chain_id))?;

    info!(chain_id = chain.chain_id(), "Bootstrap complete");
    println!("genesis: {}", genesis.path().display());
    if let Some(tarball) = genesis.tarball_path() {
        println!("tarball: {}", tarball.display());
    }
    if let Some(hash) = chain.expected_hash() {
        println!("sha256:  {hash}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["genesis-bootstrap", "--chain-id", "earth", "--binary", "earthd"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_chain_id_and_binary_are_required() {
        assert!(Args::try_parse_from(["genesis-bootstrap", "--chain-id", "earth"]).is_err());
        assert!(Args::try_parse_from(["genesis-bootstrap", "--binary", "earthd"]).is_err());
    }

    #[test]
    fn test_flags_override_environment() {
        let args = parse(&[
            "--home-base",
            "/var/chains",
            "--moniker",
            "validator-1",
            "--deadline-secs",
            "120",
        ]);
        let config = args.apply(BootstrapConfig::default()).unwrap();

        assert_eq!(config.home_base, PathBuf::from("/var/chains"));
        assert_eq!(config.moniker, "validator-1");
        assert_eq!(config.deadline, Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let args = parse(&["--moniker", " "]);
        assert!(args.apply(BootstrapConfig::default()).is_err());
    }

    #[test]
    fn test_chain_carries_url_and_normalized_hash() {
        let args = parse(&[
            "--genesis-url",
            "https://x/genesis.json",
            "--genesis-hash",
            "DEADBEEF",
        ]);
        let chain = args.chain();

        assert_eq!(chain.source().url(), Some("https://x/genesis.json"));
        assert_eq!(chain.expected_hash(), Some(&GenesisHash::new("deadbeef")));
    }

    #[test]
    fn test_blank_hash_means_no_expectation() {
        let chain = parse(&["--genesis-hash", ""]).chain();
        assert!(chain.expected_hash().is_none());
    }

    #[test]
    fn test_build_args_accept_leading_dashes() {
        let args = parse(&["--build-command", "go", "--build-arg", "build", "--build-arg", "-o"]);
        assert_eq!(args.build_args, vec!["build".to_string(), "-o".to_string()]);
    }

    #[test]
    fn test_default_cache_lives_under_home_base() {
        let args = parse(&[]);
        let config = args
            .apply(BootstrapConfig {
                home_base: PathBuf::from("/var/chains"),
                ..BootstrapConfig::default()
            })
            .unwrap();

        assert_eq!(
            args.cache(&config).dir(),
            PathBuf::from("/var/chains/.genesis-bootstrap/cache")
        );
    }
}
