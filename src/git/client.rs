//! Cliente git por repositório.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::log::{parse_log, CommitSummary, LOG_FORMAT};
use super::porcelain::{parse_name_list, parse_status, GitStatus};
use crate::engine::GitCache;
use crate::types::requests::{GitCommand, Priority};
use crate::types::responses::CommandOutput;
use crate::GitCacheResult;

/// Prioridades padrão por operação.
const STATUS_PRIORITY: Priority = Priority(3);
const DIFF_PRIORITY: Priority = Priority(5);
const LOG_PRIORITY: Priority = Priority(7);

/// Operações git comuns para um diretório de trabalho, servidas pelo cache.
pub struct GitClient<'a> {
    cache: &'a GitCache,
    cwd: PathBuf,
    priority: Option<Priority>,
}

impl<'a> GitClient<'a> {
    /// Cria um cliente. O caminho é canonizado para que grafias diferentes
    /// do mesmo diretório compartilhem entradas de cache.
    pub fn new(cache: &'a GitCache, cwd: impl AsRef<Path>) -> Self {
        Self {
            cache,
            cwd: crate::engine::canonical_dir(cwd.as_ref()),
            priority: None,
        }
    }

    /// Usa a mesma prioridade para todas as operações.
    #[must_use]
    pub fn with_priority(mut self, priority: impl Into<Priority>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    fn command(&self, args: &[&str], default_priority: Priority) -> GitCommand {
        GitCommand::new(&self.cwd, args.iter().copied())
            .with_priority(self.priority.unwrap_or(default_priority))
    }

    /// Executa argumentos arbitrários.
    pub async fn raw(&self, args: &[&str]) -> GitCacheResult<Arc<CommandOutput>> {
        self.cache.run(self.command(args, Priority::default())).await
    }

    /// `git status --porcelain=v2 --branch -z`, parseado.
    pub async fn status(&self) -> GitCacheResult<GitStatus> {
        let output = self
            .cache
            .run(self.command(
                &["status", "--porcelain=v2", "--branch", "-z"],
                STATUS_PRIORITY,
            ))
            .await?;
        parse_status(&output.stdout)
    }

    /// Como [`status`](Self::status), mas degrada para um status vazio em
    /// caso de erro (o erro é registrado no log).
    pub async fn status_or_default(&self) -> GitStatus {
        match self.status().await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(
                    cwd = %self.cwd.display(),
                    error = %e,
                    "git status failed, using empty status"
                );
                GitStatus::default()
            }
        }
    }

    /// Branch atual; `None` com HEAD destacado.
    pub async fn current_branch(&self) -> GitCacheResult<Option<String>> {
        Ok(self.status().await?.branch.head)
    }

    /// Sem alterações nem arquivos não rastreados.
    pub async fn is_clean(&self) -> GitCacheResult<bool> {
        Ok(self.status().await?.is_clean())
    }

    /// Arquivos modificados e ainda não adicionados ao índice.
    pub async fn changed_files(&self) -> GitCacheResult<Vec<String>> {
        let output = self
            .cache
            .run(self.command(&["diff", "--name-only", "-z"], DIFF_PRIORITY))
            .await?;
        Ok(parse_name_list(&output.stdout))
    }

    /// Arquivos no índice.
    pub async fn staged_files(&self) -> GitCacheResult<Vec<String>> {
        let output = self
            .cache
            .run(self.command(
                &["diff", "--name-only", "--cached", "-z"],
                DIFF_PRIORITY,
            ))
            .await?;
        Ok(parse_name_list(&output.stdout))
    }

    /// Últimos `limit` commits do HEAD.
    pub async fn recent_commits(&self, limit: usize) -> GitCacheResult<Vec<CommitSummary>> {
        let count = format!("-n{}", limit);
        let output = self
            .cache
            .run(self.command(&["log", count.as_str(), LOG_FORMAT], LOG_PRIORITY))
            .await?;
        parse_log(&output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executors::CommandRunner;
    use crate::hooks::HookSystem;
    use crate::types::config::Config;
    use crate::GitCacheError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    // Executor que responde com saídas fixas por subcomando
    #[derive(Default)]
    struct ScriptedRunner {
        seen: Mutex<Vec<GitCommand>>,
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        fn name(&self) -> &str {
            "scripted"
        }

        fn program(&self) -> &str {
            "git"
        }

        async fn run(&self, command: &GitCommand) -> GitCacheResult<CommandOutput> {
            self.seen.lock().unwrap().push(command.clone());

            let stdout = match command.args[0].as_str() {
                "status" => "# branch.oid 1b2c3d4e5f60718293a4b5c6d7e8f90112233445\0# branch.head feature/x\0? new.txt\0".to_string(),
                "diff" if command.args.contains(&"--cached".to_string()) => "staged.rs\0".to_string(),
                "diff" => "a.rs\0b.rs\0".to_string(),
                "log" => "1b2c3d4e5f60718293a4b5c6d7e8f90112233445\x1fAna\x1f1700000000\x1finit\x1e\n".to_string(),
                _ => return Ok(CommandOutput::new("", "fatal: unknown", 1)),
            };
            Ok(CommandOutput::success_with(stdout))
        }
    }

    fn create_cache(runner: Arc<ScriptedRunner>) -> GitCache {
        let mut config = Config::default();
        config.dispatcher.batch_interval_ms = 5;
        GitCache::with_runner(&config, runner, HookSystem::new())
    }

    #[tokio::test]
    async fn test_status_and_branch() {
        let runner = Arc::new(ScriptedRunner::default());
        let cache = create_cache(runner.clone());
        let client = cache.client("/repo");

        let status = client.status().await.unwrap();
        assert_eq!(status.untracked().count(), 1);
        assert_eq!(client.current_branch().await.unwrap().as_deref(), Some("feature/x"));
        assert!(!client.is_clean().await.unwrap());

        // Três chamadas, um subprocesso
        assert_eq!(runner.seen.lock().unwrap().len(), 1);
        cache.shutdown().await;
    }

    #[tokio::test]
    async fn test_diff_and_log() {
        let runner = Arc::new(ScriptedRunner::default());
        let cache = create_cache(runner.clone());
        let client = cache.client("/repo");

        assert_eq!(client.changed_files().await.unwrap(), vec!["a.rs", "b.rs"]);
        assert_eq!(client.staged_files().await.unwrap(), vec!["staged.rs"]);

        let commits = client.recent_commits(5).await.unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].subject, "init");

        let seen = runner.seen.lock().unwrap();
        assert_eq!(seen[2].args[1], "-n5");
        assert_eq!(seen[2].priority, LOG_PRIORITY);
        drop(seen);
        cache.shutdown().await;
    }

    #[tokio::test]
    async fn test_priority_override() {
        let runner = Arc::new(ScriptedRunner::default());
        let cache = create_cache(runner.clone());

        cache.client("/repo").with_priority(0).changed_files().await.unwrap();

        assert_eq!(runner.seen.lock().unwrap()[0].priority, Priority(0));
        cache.shutdown().await;
    }

    #[tokio::test]
    async fn test_raw_failure_and_status_default() {
        let runner = Arc::new(ScriptedRunner::default());
        let cache = create_cache(runner);
        let client = cache.client("/repo");

        let result = client.raw(&["bisect", "start"]).await;
        assert!(matches!(result, Err(GitCacheError::CommandFailed { exit_code: 1, .. })));

        cache.shutdown().await;

        // Dispatcher parado: status falha e degrada para o padrão
        let status = client.status_or_default().await;
        assert_eq!(status, GitStatus::default());
    }
}
