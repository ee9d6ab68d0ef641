//! Implementação do serviço GitCache.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::cache::{CacheStats, ResultCache, SharedCache};
use crate::dispatcher::{BatchDispatcher, ExecutionPool, ReplyReceiver};
use crate::executors::{CommandRunner, GitExecutor};
use crate::git::GitClient;
use crate::hooks::{HookResult, HookSystem};
use crate::types::config::{CacheStrategy, Config};
use crate::types::requests::GitCommand;
use crate::types::responses::CommandOutput;
use crate::{GitCacheError, GitCacheResult};

/// Destino de um comando depois dos hooks e da consulta ao cache.
enum Resolution {
    Hit(Arc<CommandOutput>),
    Miss(GitCommand),
}

/// Resultado ainda em andamento dentro de `run_many`.
enum InFlight {
    Ready(GitCacheResult<Arc<CommandOutput>>),
    Queued(ReplyReceiver),
    Running(JoinHandle<GitCacheResult<Arc<CommandOutput>>>),
}

/// Cache assíncrono de resultados de comandos git.
pub struct GitCache {
    cache: SharedCache,
    pool: Arc<ExecutionPool>,
    dispatcher: BatchDispatcher,
    hooks: Arc<HookSystem>,
    immediate_threshold: u8,
}

impl GitCache {
    /// Cria o serviço com o executor `git` real e os hooks padrão.
    ///
    /// Precisa ser chamado dentro de um runtime tokio (o dispatcher
    /// inicia uma task em background).
    pub fn new(config: &Config) -> Self {
        Self::with_runner(
            config,
            Arc::new(GitExecutor::from_config(config)),
            HookSystem::with_defaults(),
        )
    }

    /// Cria o serviço com um executor e hooks específicos.
    pub fn with_runner(
        config: &Config,
        runner: Arc<dyn CommandRunner>,
        hooks: HookSystem,
    ) -> Self {
        let cache: SharedCache = Arc::new(Mutex::new(ResultCache::new(&config.cache)));
        let hooks = Arc::new(hooks);
        let pool = Arc::new(ExecutionPool::new(
            runner,
            cache.clone(),
            hooks.clone(),
            config.dispatcher.max_workers,
        ));
        let dispatcher = BatchDispatcher::start(&config.dispatcher, pool.clone());

        tracing::debug!(
            capacity = config.cache.capacity,
            strategy = %config.cache.strategy,
            max_workers = config.dispatcher.max_workers,
            "GitCache ready"
        );

        Self {
            cache,
            pool,
            dispatcher,
            hooks,
            immediate_threshold: config.dispatcher.immediate_threshold,
        }
    }

    /// Executa um comando, servindo do cache quando possível.
    ///
    /// Comandos com prioridade `<= immediate_threshold` vão direto para o
    /// pool; os demais esperam o próximo batch.
    pub async fn run(&self, command: GitCommand) -> GitCacheResult<Arc<CommandOutput>> {
        match self.resolve(command).await? {
            Resolution::Hit(output) => Ok(output),
            Resolution::Miss(command) => {
                if command.priority.is_immediate(self.immediate_threshold) {
                    self.pool.execute(command).await
                } else {
                    let rx = self.dispatcher.submit(command).await?;
                    rx.await.map_err(|_| GitCacheError::DispatcherStopped)?
                }
            }
        }
    }

    /// Executa vários comandos de uma vez, mantendo a ordem de entrada.
    ///
    /// Os comandos são todos enfileirados antes de qualquer espera, então
    /// os que não são imediatos caem no mesmo batch.
    pub async fn run_many(
        &self,
        commands: Vec<GitCommand>,
    ) -> Vec<GitCacheResult<Arc<CommandOutput>>> {
        let mut in_flight = Vec::with_capacity(commands.len());

        for command in commands {
            let slot = match self.resolve(command).await {
                Ok(Resolution::Hit(output)) => InFlight::Ready(Ok(output)),
                Ok(Resolution::Miss(command)) => {
                    if command.priority.is_immediate(self.immediate_threshold) {
                        let pool = Arc::clone(&self.pool);
                        InFlight::Running(tokio::spawn(
                            async move { pool.execute(command).await },
                        ))
                    } else {
                        match self.dispatcher.submit(command).await {
                            Ok(rx) => InFlight::Queued(rx),
                            Err(e) => InFlight::Ready(Err(e)),
                        }
                    }
                }
                Err(e) => InFlight::Ready(Err(e)),
            };
            in_flight.push(slot);
        }

        let mut results = Vec::with_capacity(in_flight.len());
        for slot in in_flight {
            let result = match slot {
                InFlight::Ready(result) => result,
                InFlight::Queued(rx) => rx
                    .await
                    .unwrap_or(Err(GitCacheError::DispatcherStopped)),
                InFlight::Running(handle) => handle.await.unwrap_or_else(|e| {
                    Err(GitCacheError::other(format!("execution task failed: {}", e)))
                }),
            };
            results.push(result);
        }
        results
    }

    /// Aplica os hooks de pre_execute e consulta o cache.
    async fn resolve(&self, command: GitCommand) -> GitCacheResult<Resolution> {
        let command = match self.hooks.run_pre_execute(&command).await? {
            HookResult::Continue => command,
            HookResult::Skip => return Err(GitCacheError::Skipped(command.to_string())),
            HookResult::ModifyCommand(modified) => {
                tracing::debug!(from = %command, to = %modified, "Command rewritten by hook");
                modified
            }
        };

        let hit = self.cache.lock().await.lookup(&command.fingerprint());

        match hit {
            Some(output) => {
                tracing::trace!(command = %command, "Cache hit");
                if let Err(e) = self.hooks.run_on_cache_hit(&command, &output).await {
                    tracing::warn!(error = %e, "on_cache_hit hook failed");
                }
                Ok(Resolution::Hit(output))
            }
            None => Ok(Resolution::Miss(command)),
        }
    }

    /// Consulta apenas o cache, sem executar nada.
    pub async fn lookup(&self, command: &GitCommand) -> Option<Arc<CommandOutput>> {
        self.cache.lock().await.lookup(&command.fingerprint())
    }

    /// Invalida o resultado de um comando.
    pub async fn invalidate(&self, command: &GitCommand) -> bool {
        self.cache.lock().await.invalidate(&command.fingerprint())
    }

    /// Invalida todos os resultados de um diretório de trabalho.
    ///
    /// Tanto o caminho informado quanto sua forma canônica são considerados.
    pub async fn invalidate_dir(&self, cwd: impl AsRef<Path>) -> usize {
        let raw = cwd.as_ref();
        let canonical = canonical_dir(raw);

        let mut cache = self.cache.lock().await;
        let mut removed = cache.invalidate_dir(raw);
        if canonical != raw {
            removed += cache.invalidate_dir(&canonical);
        }

        tracing::debug!(cwd = %raw.display(), removed, "Invalidated directory");
        removed
    }

    /// Limpa todo o cache.
    pub async fn clear(&self) {
        self.cache.lock().await.clear();
    }

    /// Remove entradas expiradas.
    pub async fn cleanup_expired(&self) -> usize {
        self.cache.lock().await.cleanup_expired()
    }

    /// Retorna estatísticas do cache.
    pub async fn stats(&self) -> CacheStats {
        self.cache.lock().await.stats()
    }

    /// Troca a estratégia de TTL.
    pub async fn set_strategy(&self, strategy: CacheStrategy) {
        self.cache.lock().await.set_strategy(strategy);
        tracing::info!(strategy = %strategy, "Cache strategy changed");
    }

    /// Número de comandos aguardando o próximo batch.
    pub async fn pending(&self) -> usize {
        self.dispatcher.pending().await
    }

    /// Executor usado para rodar o git.
    pub fn runner(&self) -> &Arc<dyn CommandRunner> {
        self.pool.runner()
    }

    /// Cliente de alto nível para um repositório.
    pub fn client(&self, cwd: impl AsRef<Path>) -> GitClient<'_> {
        GitClient::new(self, cwd)
    }

    /// Para o dispatcher. Comandos na fila recebem `DispatcherStopped`.
    pub async fn shutdown(&self) {
        self.dispatcher.shutdown().await;
    }
}

/// Caminho canônico do diretório, ou o próprio caminho se não existir.
pub(crate) fn canonical_dir(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
