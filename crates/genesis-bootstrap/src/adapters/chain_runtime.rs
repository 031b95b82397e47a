//! Chain runtime backed by a chain binary
//!
//! Home layout follows the usual node convention: `<base>/.<chain_id>` with
//! the genesis at `config/genesis.json`. Commands are run as subprocesses:
//!
//! ```text
//! <binary> init <moniker> --chain-id <chain_id> --home <home> [--overwrite]
//! <binary> validate-genesis --home <home>
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::info;

use crate::adapters::process;
use crate::context::BootstrapContext;
use crate::domain::ChainHandle;
use crate::error::{BootstrapError, CommandError};
use crate::ports::{ChainRuntime, InitMode, NodeCommands};

/// Standard node home layout
#[derive(Clone, Debug)]
pub struct StandardLayout {
    base: PathBuf,
}

impl StandardLayout {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Home for `chain`: its override, or `<base>/.<chain_id>`
    pub fn home(&self, chain: &ChainHandle) -> Result<PathBuf, BootstrapError> {
        if let Some(home) = chain.home_override() {
            return Ok(home.to_path_buf());
        }

        let chain_id = chain.chain_id();
        if chain_id.is_empty() || chain_id.contains(['/', '\\']) || chain_id == ".." {
            return Err(BootstrapError::Layout(format!(
                "chain id {chain_id:?} cannot name a home directory"
            )));
        }
        Ok(self.base.join(format!(".{chain_id}")))
    }

    pub fn genesis_path(&self, chain: &ChainHandle) -> Result<PathBuf, BootstrapError> {
        Ok(genesis_in(&self.home(chain)?))
    }
}

fn genesis_in(home: &Path) -> PathBuf {
    home.join("config").join("genesis.json")
}

/// [`ChainRuntime`] that drives a chain binary
#[derive(Clone, Debug)]
pub struct BinaryChainRuntime {
    binary: PathBuf,
    layout: StandardLayout,
}

impl BinaryChainRuntime {
    pub fn new(binary: impl Into<PathBuf>, layout: StandardLayout) -> Self {
        Self {
            binary: binary.into(),
            layout,
        }
    }

    fn program(&self) -> String {
        self.binary.display().to_string()
    }

    fn node_commands(&self, chain: &ChainHandle) -> Result<BinaryNodeCommands, CommandError> {
        let home = self.layout.home(chain).map_err(|e| CommandError::Spawn {
            program: self.program(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()),
        })?;
        Ok(BinaryNodeCommands {
            binary: self.binary.clone(),
            chain_id: chain.chain_id().to_string(),
            home,
        })
    }
}

#[async_trait]
impl ChainRuntime for BinaryChainRuntime {
    fn home(&self, chain: &ChainHandle) -> Result<PathBuf, BootstrapError> {
        self.layout.home(chain)
    }

    fn genesis_path(&self, chain: &ChainHandle) -> Result<PathBuf, BootstrapError> {
        self.layout.genesis_path(chain)
    }

    async fn init(
        &self,
        ctx: &BootstrapContext,
        chain: &ChainHandle,
        mode: InitMode,
    ) -> Result<(), CommandError> {
        let commands = self.node_commands(chain)?;
        info!(
            chain_id = chain.chain_id(),
            home = %commands.home.display(),
            "Initializing node home"
        );
        commands.run_init(ctx, chain.chain_id(), mode).await
    }

    async fn commands(
        &self,
        _ctx: &BootstrapContext,
        chain: &ChainHandle,
    ) -> Result<Arc<dyn NodeCommands>, CommandError> {
        if let Err(source) = tokio::fs::metadata(&self.binary).await {
            // Bare program names are resolved through PATH at spawn time.
            if self.binary.components().count() > 1 {
                return Err(CommandError::Spawn {
                    program: self.program(),
                    source,
                });
            }
        }
        Ok(Arc::new(self.node_commands(chain)?))
    }
}

/// Commands of one chain binary bound to one home
#[derive(Clone, Debug)]
pub struct BinaryNodeCommands {
    binary: PathBuf,
    chain_id: String,
    home: PathBuf,
}

impl BinaryNodeCommands {
    fn command(&self) -> Command {
        Command::new(&self.binary)
    }

    fn init_command(&self, moniker: &str, mode: InitMode) -> Command {
        let mut command = self.command();
        command
            .arg("init")
            .arg(moniker)
            .arg("--chain-id")
            .arg(&self.chain_id)
            .arg("--home")
            .arg(&self.home);
        if mode == InitMode::Overwrite {
            command.arg("--overwrite");
        }
        command
    }

    async fn run_init(
        &self,
        ctx: &BootstrapContext,
        moniker: &str,
        mode: InitMode,
    ) -> Result<(), CommandError> {
        let program = self.binary.display().to_string();
        process::run(ctx, &program, self.init_command(moniker, mode)).await?;
        Ok(())
    }
}

#[async_trait]
impl NodeCommands for BinaryNodeCommands {
    async fn init(&self, ctx: &BootstrapContext, moniker: &str) -> Result<(), CommandError> {
        self.run_init(ctx, moniker, InitMode::KeepExisting).await
    }

    async fn validate_genesis(&self, ctx: &BootstrapContext) -> Result<(), CommandError> {
        let mut command = self.command();
        command.arg("validate-genesis").arg("--home").arg(&self.home);

        let program = self.binary.display().to_string();
        process::run(ctx, &program, command).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    fn args(command: &Command) -> Vec<String> {
        command
            .as_std()
            .get_args()
            .map(OsStr::to_string_lossy)
            .map(|a| a.into_owned())
            .collect()
    }

    #[test]
    fn test_layout_derives_home_from_chain_id() {
        let layout = StandardLayout::new("/var/chains");
        let chain = ChainHandle::new("earth", "/src/earth");

        assert_eq!(layout.home(&chain).unwrap(), PathBuf::from("/var/chains/.earth"));
        assert_eq!(
            layout.genesis_path(&chain).unwrap(),
            PathBuf::from("/var/chains/.earth/config/genesis.json")
        );
    }

    #[test]
    fn test_layout_honors_home_override() {
        let layout = StandardLayout::new("/var/chains");
        let chain = ChainHandle::new("earth", "/src/earth").with_home("/data/earth");

        assert_eq!(
            layout.genesis_path(&chain).unwrap(),
            PathBuf::from("/data/earth/config/genesis.json")
        );
    }

    #[test]
    fn test_layout_rejects_unusable_chain_id() {
        let layout = StandardLayout::new("/var/chains");
        for bad in ["", "../etc", "a/b", ".."] {
            let chain = ChainHandle::new(bad, "/src");
            assert!(
                matches!(layout.home(&chain), Err(BootstrapError::Layout(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_init_command_never_overwrites_by_default() {
        let commands = BinaryNodeCommands {
            binary: PathBuf::from("earthd"),
            chain_id: "earth".to_string(),
            home: PathBuf::from("/var/chains/.earth"),
        };

        assert_eq!(
            args(&commands.init_command("moniker", InitMode::KeepExisting)),
            vec!["init", "moniker", "--chain-id", "earth", "--home", "/var/chains/.earth"]
        );
        assert!(args(&commands.init_command("moniker", InitMode::Overwrite))
            .contains(&"--overwrite".to_string()));
    }

    #[tokio::test]
    async fn test_missing_binary_path_fails_commands() {
        let runtime = BinaryChainRuntime::new(
            "/nonexistent/bin/earthd",
            StandardLayout::new("/var/chains"),
        );
        let chain = ChainHandle::new("earth", "/src/earth");

        let result = runtime
            .commands(&BootstrapContext::background(), &chain)
            .await;

        assert!(matches!(result, Err(CommandError::Spawn { .. })));
    }
}
