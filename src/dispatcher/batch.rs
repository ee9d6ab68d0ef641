//! Loop de batching em background.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::pool::ExecutionPool;
use super::queue::{coalesce, order_batch, PendingQueue, ReplyReceiver};
use crate::types::config::DispatcherConfig;
use crate::types::requests::GitCommand;
use crate::{GitCacheError, GitCacheResult};

/// Drena a fila de pendentes a cada intervalo e despacha os comandos.
///
/// Não há garantia de ordem entre batches diferentes nem cancelamento:
/// um comando despachado sempre roda até o fim (ou até o timeout).
pub struct BatchDispatcher {
    queue: Arc<PendingQueue>,
    interval: Duration,
    shutdown_tx: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl BatchDispatcher {
    /// Inicia o loop em background. Precisa ser chamado dentro de um runtime tokio.
    pub fn start(config: &DispatcherConfig, pool: Arc<ExecutionPool>) -> Self {
        let queue = Arc::new(PendingQueue::new(config.max_queue_len));
        // tokio::time::interval não aceita período zero
        let interval = config.batch_interval().max(Duration::from_millis(1));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(run_loop(queue.clone(), pool, interval, shutdown_rx));

        tracing::debug!(
            interval_ms = interval.as_millis() as u64,
            max_queue_len = config.max_queue_len,
            "Batch dispatcher started"
        );

        Self {
            queue,
            interval,
            shutdown_tx,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Enfileira um comando para o próximo batch.
    pub async fn submit(&self, command: GitCommand) -> GitCacheResult<ReplyReceiver> {
        self.queue.enqueue(command).await
    }

    /// Número de comandos aguardando o próximo batch.
    pub async fn pending(&self) -> usize {
        self.queue.len().await
    }

    /// Intervalo entre batches.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Para o loop. Comandos ainda na fila recebem `DispatcherStopped`.
    pub async fn shutdown(&self) {
        self.queue.close();
        let _ = self.shutdown_tx.send(true);

        if let Some(handle) = self.handle.lock().await.take() {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Batch dispatcher task panicked");
            }
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.queue.is_closed()
    }
}

async fn run_loop(
    queue: Arc<PendingQueue>,
    pool: Arc<ExecutionPool>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
                continue;
            }
        }

        dispatch_batch(&queue, &pool).await;
    }

    let remaining = queue.drain().await;
    if !remaining.is_empty() {
        tracing::debug!(count = remaining.len(), "Rejecting pending commands on shutdown");
    }
    for pending in remaining {
        pending.respond(Err(GitCacheError::DispatcherStopped));
    }

    tracing::debug!("Batch dispatcher stopped");
}

async fn dispatch_batch(queue: &PendingQueue, pool: &Arc<ExecutionPool>) {
    let mut batch = queue.drain().await;
    if batch.is_empty() {
        return;
    }

    order_batch(&mut batch);
    let size = batch.len();
    // Mesmo fingerprint no mesmo batch: um subprocesso só
    let groups = coalesce(batch);
    tracing::debug!(size, executions = groups.len(), "Dispatching batch");

    for group in groups {
        let pool = Arc::clone(pool);
        tokio::spawn(async move {
            tracing::trace!(
                id = %group.leader.id,
                waited_ms = group.leader.enqueued_at.elapsed().as_millis() as u64,
                coalesced = group.followers.len(),
                "Executing queued command"
            );
            let result = pool.execute(group.leader.command.clone()).await;
            group.respond(result);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ResultCache, SharedCache};
    use crate::executors::CommandRunner;
    use crate::hooks::HookSystem;
    use crate::types::responses::CommandOutput;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    // Executor que registra a ordem de execução
    #[derive(Default)]
    struct RecordingRunner {
        order: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        fn name(&self) -> &str {
            "recording"
        }

        fn program(&self) -> &str {
            "recording"
        }

        async fn run(&self, command: &GitCommand) -> GitCacheResult<CommandOutput> {
            let tag = command.args.last().cloned().unwrap_or_default();
            self.order.lock().unwrap().push(tag.clone());
            Ok(CommandOutput::success_with(tag))
        }
    }

    fn create_dispatcher(
        runner: Arc<RecordingRunner>,
        interval_ms: u64,
    ) -> BatchDispatcher {
        let cache: SharedCache = Arc::new(Mutex::new(ResultCache::with_uniform_ttl(100, 60)));
        // Um worker só: a ordem de execução segue a ordem de despacho
        let pool = Arc::new(ExecutionPool::new(
            runner,
            cache,
            Arc::new(HookSystem::new()),
            1,
        ));
        let config = DispatcherConfig {
            batch_interval_ms: interval_ms,
            ..DispatcherConfig::default()
        };
        BatchDispatcher::start(&config, pool)
    }

    fn command(priority: u8, tag: &str) -> GitCommand {
        GitCommand::new("/repo", ["log", tag]).with_priority(priority)
    }

    #[tokio::test]
    async fn test_submit_and_receive() {
        let dispatcher = create_dispatcher(Arc::new(RecordingRunner::default()), 10);

        let rx = dispatcher.submit(command(5, "a")).await.unwrap();
        let output = rx.await.unwrap().unwrap();

        assert_eq!(output.stdout, "a");
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn test_batch_runs_in_priority_order() {
        let runner = Arc::new(RecordingRunner::default());
        // Intervalo longo: os três comandos caem no mesmo batch
        let dispatcher = create_dispatcher(runner.clone(), 200);

        // Consome o primeiro tick (imediato) antes de enfileirar
        tokio::time::sleep(Duration::from_millis(20)).await;

        let rx_low = dispatcher.submit(command(9, "low")).await.unwrap();
        let rx_high = dispatcher.submit(command(3, "high")).await.unwrap();
        let rx_mid = dispatcher.submit(command(6, "mid")).await.unwrap();

        rx_low.await.unwrap().unwrap();
        rx_high.await.unwrap().unwrap();
        rx_mid.await.unwrap().unwrap();

        let order = runner.order.lock().unwrap().clone();
        assert_eq!(order, vec!["high", "mid", "low"]);
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn test_identical_commands_in_one_batch_run_once() {
        let runner = Arc::new(RecordingRunner::default());
        let dispatcher = create_dispatcher(runner.clone(), 200);

        tokio::time::sleep(Duration::from_millis(20)).await;

        let rx_first = dispatcher.submit(command(5, "same")).await.unwrap();
        let rx_other = dispatcher.submit(command(5, "other")).await.unwrap();
        let rx_second = dispatcher.submit(command(2, "same")).await.unwrap();
        let rx_third = dispatcher.submit(command(8, "same")).await.unwrap();

        let first = rx_first.await.unwrap().unwrap();
        let second = rx_second.await.unwrap().unwrap();
        let third = rx_third.await.unwrap().unwrap();
        assert_eq!(rx_other.await.unwrap().unwrap().stdout, "other");

        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &third));

        let order = runner.order.lock().unwrap().clone();
        assert_eq!(order, vec!["same", "other"]);
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_rejects_pending_and_new_commands() {
        let dispatcher = create_dispatcher(Arc::new(RecordingRunner::default()), 60_000);

        // Consome o primeiro tick; o próximo só viria em 60s
        tokio::time::sleep(Duration::from_millis(20)).await;

        let rx = dispatcher.submit(command(5, "never")).await.unwrap();
        assert_eq!(dispatcher.pending().await, 1);

        dispatcher.shutdown().await;

        assert!(matches!(rx.await.unwrap(), Err(GitCacheError::DispatcherStopped)));
        assert!(dispatcher.is_stopped());
        assert!(matches!(
            dispatcher.submit(command(5, "late")).await,
            Err(GitCacheError::DispatcherStopped)
        ));
    }
}
