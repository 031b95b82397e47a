//! Chain build adapters
//!
//! `CommandChainBuilder` runs the project's build command in the chain
//! source directory; `PrebuiltBinary` skips building and only checks that
//! the binary is there.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::info;

use crate::adapters::process;
use crate::context::BootstrapContext;
use crate::domain::{BuildArtifact, BuildCache};
use crate::error::CommandError;
use crate::ports::ChainBuilder;

/// Environment variable through which the cache directory reaches the build
pub const BUILD_CACHE_ENV: &str = "BUILD_CACHE_DIR";

/// Builds the chain by running an external command
#[derive(Clone, Debug)]
pub struct CommandChainBuilder {
    program: String,
    args: Vec<String>,
    app_dir: PathBuf,
    binary: PathBuf,
}

impl CommandChainBuilder {
    /// `binary` is where the build leaves the chain binary
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        app_dir: impl Into<PathBuf>,
        binary: impl Into<PathBuf>,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            app_dir: app_dir.into(),
            binary: binary.into(),
        }
    }

    fn command(&self, cache: &BuildCache) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .current_dir(&self.app_dir)
            .env(BUILD_CACHE_ENV, cache.dir());
        command
    }
}

#[async_trait]
impl ChainBuilder for CommandChainBuilder {
    async fn build(
        &self,
        ctx: &BootstrapContext,
        cache: &BuildCache,
    ) -> Result<BuildArtifact, CommandError> {
        info!(
            program = %self.program,
            app_dir = %self.app_dir.display(),
            cache = %cache.dir().display(),
            "Building chain"
        );
        process::run(ctx, &self.program, self.command(cache)).await?;

        Ok(BuildArtifact {
            binary: self.binary.clone(),
        })
    }
}

/// Uses an already built binary
#[derive(Clone, Debug)]
pub struct PrebuiltBinary {
    binary: PathBuf,
}

impl PrebuiltBinary {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl ChainBuilder for PrebuiltBinary {
    async fn build(
        &self,
        _ctx: &BootstrapContext,
        _cache: &BuildCache,
    ) -> Result<BuildArtifact, CommandError> {
        // Bare program names are looked up in PATH when they run.
        if self.binary.components().count() > 1 {
            tokio::fs::metadata(&self.binary)
                .await
                .map_err(|source| CommandError::Spawn {
                    program: self.binary.display().to_string(),
                    source,
                })?;
        }
        Ok(BuildArtifact {
            binary: self.binary.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use std::path::Path;

    #[test]
    fn test_build_command_exports_cache_dir() {
        let builder = CommandChainBuilder::new(
            "make",
            vec!["install".to_string()],
            "/src/earth",
            "/root/go/bin/earthd",
        );
        let command = builder.command(&BuildCache::new("/cache/earth"));
        let inner = command.as_std();

        assert_eq!(inner.get_program(), "make");
        assert_eq!(inner.get_current_dir(), Some(Path::new("/src/earth")));
        assert!(inner
            .get_envs()
            .any(|(k, v)| k == BUILD_CACHE_ENV && v == Some(OsStr::new("/cache/earth"))));
    }

    #[tokio::test]
    async fn test_prebuilt_binary_must_exist() {
        let builder = PrebuiltBinary::new("/nonexistent/earthd");
        let err = builder
            .build(&BootstrapContext::background(), &BuildCache::new("/cache"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_prebuilt_binary_on_path_is_accepted() {
        let builder = PrebuiltBinary::new("earthd");
        let artifact = builder
            .build(&BootstrapContext::background(), &BuildCache::new("/cache"))
            .await
            .unwrap();
        assert_eq!(artifact.binary, PathBuf::from("earthd"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_build_command_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let builder = CommandChainBuilder::new(
            "sh",
            vec!["-c".to_string(), "echo compile error >&2; exit 2".to_string()],
            dir.path(),
            dir.path().join("earthd"),
        );

        let err = builder
            .build(&BootstrapContext::background(), &BuildCache::new(dir.path()))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("compile error"));
    }
}
