//! Pool de execução limitado.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::cache::SharedCache;
use crate::executors::CommandRunner;
use crate::hooks::HookSystem;
use crate::types::requests::GitCommand;
use crate::types::responses::CommandOutput;
use crate::{GitCacheError, GitCacheResult};

/// Executa comandos com no máximo `max_workers` subprocessos simultâneos.
///
/// Resultados bem-sucedidos são gravados no cache antes de serem
/// devolvidos; falhas nunca são cacheadas.
pub struct ExecutionPool {
    runner: Arc<dyn CommandRunner>,
    cache: SharedCache,
    hooks: Arc<HookSystem>,
    permits: Arc<Semaphore>,
    max_workers: usize,
}

impl ExecutionPool {
    /// Cria um novo pool.
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        cache: SharedCache,
        hooks: Arc<HookSystem>,
        max_workers: usize,
    ) -> Self {
        let max_workers = max_workers.max(1);
        Self {
            runner,
            cache,
            hooks,
            permits: Arc::new(Semaphore::new(max_workers)),
            max_workers,
        }
    }

    /// Número máximo de subprocessos simultâneos.
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Vagas livres neste momento.
    pub fn available_workers(&self) -> usize {
        self.permits.available_permits()
    }

    /// Executor usado pelo pool.
    pub fn runner(&self) -> &Arc<dyn CommandRunner> {
        &self.runner
    }

    /// Executa o comando e popula o cache em caso de sucesso.
    pub async fn execute(&self, command: GitCommand) -> GitCacheResult<Arc<CommandOutput>> {
        let output = {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|_| GitCacheError::DispatcherStopped)?;

            self.runner.run(&command).await.map_err(|e| {
                tracing::warn!(command = %command, error = %e, "Git command could not run");
                e
            })?
        };

        if let Err(e) = self.hooks.run_post_execute(&command, &output).await {
            tracing::warn!(error = %e, "post_execute hook failed");
        }

        if !output.success() {
            return Err(GitCacheError::CommandFailed {
                command: command.to_string(),
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }

        let output = Arc::new(output);
        let report = self.cache.lock().await.store(&command, Arc::clone(&output));

        if !report.is_empty() {
            if let Err(e) = self.hooks.run_on_evict(&report.evicted).await {
                tracing::warn!(error = %e, "on_evict hook failed");
            }
        }

        Ok(output)
    }
}
