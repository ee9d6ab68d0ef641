//! Executor para o binário git.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

use super::base::CommandRunner;
use crate::types::config::Config;
use crate::types::requests::GitCommand;
use crate::types::responses::CommandOutput;
use crate::{GitCacheError, GitCacheResult};

/// Executor que chama `git` como subprocesso.
pub struct GitExecutor {
    binary: String,
    timeout: Duration,
}

impl GitExecutor {
    /// Cria um novo executor com o binário `git` do PATH.
    pub fn new() -> Self {
        Self {
            binary: "git".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Cria um executor a partir da configuração.
    pub fn from_config(config: &Config) -> Self {
        Self {
            binary: config.git.binary.clone(),
            timeout: config.general.timeout(),
        }
    }

    /// Define o binário.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Define o timeout padrão.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Timeout padrão.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for GitExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for GitExecutor {
    fn name(&self) -> &str {
        "git"
    }

    fn program(&self) -> &str {
        &self.binary
    }

    async fn run(&self, command: &GitCommand) -> GitCacheResult<CommandOutput> {
        let timeout = command.timeout.unwrap_or(self.timeout);
        let started = Instant::now();

        tracing::trace!(command = %command, cwd = %command.cwd.display(), "Spawning git");

        let result = tokio::time::timeout(
            timeout,
            Command::new(&self.binary)
                .args(&command.args)
                .current_dir(&command.cwd)
                // Evita prompts de credenciais e pager em hooks não interativos
                .env("GIT_TERMINAL_PROMPT", "0")
                .env("GIT_PAGER", "cat")
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output(),
        )
        .await;

        match result {
            Ok(Ok(output)) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                Ok(CommandOutput::new(
                    String::from_utf8_lossy(&output.stdout),
                    String::from_utf8_lossy(&output.stderr),
                    output.status.code().unwrap_or(-1),
                )
                .with_duration_ms(duration_ms))
            }
            Ok(Err(e)) => {
                if e.kind() == std::io::ErrorKind::NotFound && command.cwd.is_dir() {
                    Err(GitCacheError::GitNotFound(self.binary.clone()))
                } else {
                    Err(GitCacheError::Io(e))
                }
            }
            Err(_) => Err(GitCacheError::Timeout(command.to_string(), timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.git.binary = "/usr/local/bin/git".to_string();
        config.general.timeout_secs = 3;

        let executor = GitExecutor::from_config(&config);
        assert_eq!(executor.program(), "/usr/local/bin/git");
        assert_eq!(executor.timeout(), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        let executor = GitExecutor::new().with_binary("gitcache-no-such-git-binary");

        let result = executor
            .run(&GitCommand::new(dir.path(), ["status"]))
            .await;

        assert!(matches!(result, Err(GitCacheError::GitNotFound(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout() {
        let dir = tempfile::tempdir().unwrap();
        // `sleep` aceita os argumentos como duração e nunca termina a tempo
        let executor = GitExecutor::new()
            .with_binary("sleep")
            .with_timeout(Duration::from_millis(50));

        let result = executor.run(&GitCommand::new(dir.path(), ["5"])).await;

        match result {
            Err(GitCacheError::Timeout(command, timeout)) => {
                assert_eq!(command, "git 5");
                assert_eq!(timeout, Duration::from_millis(50));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_output() {
        let dir = tempfile::tempdir().unwrap();
        let executor = GitExecutor::new().with_binary("false");

        let output = executor
            .run(&GitCommand::new(dir.path(), Vec::<String>::new()))
            .await
            .unwrap();

        assert!(!output.success());
    }
}
