//! Fila de comandos pendentes.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{oneshot, Mutex};
use uuid::Uuid;

use crate::cache::Fingerprint;
use crate::types::requests::GitCommand;
use crate::types::responses::CommandOutput;
use crate::{GitCacheError, GitCacheResult};

/// Canal pelo qual quem enfileirou recebe o resultado.
pub type ReplyReceiver = oneshot::Receiver<GitCacheResult<Arc<CommandOutput>>>;

/// Comando aguardando despacho.
pub struct PendingCommand {
    /// ID para correlação nos logs.
    pub id: Uuid,

    /// Comando a executar.
    pub command: GitCommand,

    /// Momento em que entrou na fila.
    pub enqueued_at: Instant,

    reply: oneshot::Sender<GitCacheResult<Arc<CommandOutput>>>,
}

impl PendingCommand {
    /// Cria um comando pendente e o receptor do resultado.
    pub fn new(command: GitCommand) -> (Self, ReplyReceiver) {
        let (reply, rx) = oneshot::channel();
        let pending = Self {
            id: Uuid::new_v4(),
            command,
            enqueued_at: Instant::now(),
            reply,
        };
        (pending, rx)
    }

    /// Entrega o resultado. Se o receptor já foi descartado, o resultado é perdido.
    pub fn respond(self, result: GitCacheResult<Arc<CommandOutput>>) {
        if self.reply.send(result).is_err() {
            tracing::trace!(id = %self.id, "Reply receiver dropped");
        }
    }
}

/// Ordena um batch por prioridade (estável: FIFO dentro da mesma prioridade).
pub fn order_batch(batch: &mut [PendingCommand]) {
    batch.sort_by_key(|pending| pending.command.priority);
}

/// Comandos de um mesmo batch com o mesmo fingerprint.
///
/// Só o primeiro (`leader`) executa; os demais recebem o mesmo resultado.
pub struct CoalescedCommand {
    pub leader: PendingCommand,
    pub followers: Vec<PendingCommand>,
}

impl CoalescedCommand {
    /// Entrega o resultado a todos os comandos do grupo.
    pub fn respond(self, result: GitCacheResult<Arc<CommandOutput>>) {
        for follower in self.followers {
            follower.respond(result.as_ref().map(Arc::clone).map_err(GitCacheError::duplicate));
        }
        self.leader.respond(result);
    }
}

/// Agrupa comandos com o mesmo fingerprint, mantendo a ordem da primeira
/// ocorrência de cada um.
pub fn coalesce(batch: Vec<PendingCommand>) -> Vec<CoalescedCommand> {
    let mut groups: Vec<CoalescedCommand> = Vec::with_capacity(batch.len());
    let mut index: HashMap<Fingerprint, usize> = HashMap::with_capacity(batch.len());

    for pending in batch {
        match index.entry(pending.command.fingerprint()) {
            Entry::Occupied(slot) => groups[*slot.get()].followers.push(pending),
            Entry::Vacant(slot) => {
                slot.insert(groups.len());
                groups.push(CoalescedCommand {
                    leader: pending,
                    followers: Vec::new(),
                });
            }
        }
    }

    groups
}

/// Fila compartilhada de comandos pendentes, limitada em tamanho.
pub struct PendingQueue {
    items: Mutex<Vec<PendingCommand>>,
    max_len: usize,
    closed: AtomicBool,
}

impl PendingQueue {
    /// Cria uma fila vazia.
    pub fn new(max_len: usize) -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            max_len,
            closed: AtomicBool::new(false),
        }
    }

    /// Enfileira um comando.
    ///
    /// Falha com `QueueFull` se a fila estiver no limite e com
    /// `DispatcherStopped` se já foi fechada.
    pub async fn enqueue(&self, command: GitCommand) -> GitCacheResult<ReplyReceiver> {
        let mut items = self.items.lock().await;

        if self.closed.load(Ordering::Acquire) {
            return Err(GitCacheError::DispatcherStopped);
        }
        if items.len() >= self.max_len {
            return Err(GitCacheError::QueueFull(items.len()));
        }

        let (pending, rx) = PendingCommand::new(command);
        tracing::trace!(id = %pending.id, command = %pending.command, "Command enqueued");
        items.push(pending);

        Ok(rx)
    }

    /// Remove e retorna todos os comandos pendentes.
    pub async fn drain(&self) -> Vec<PendingCommand> {
        std::mem::take(&mut *self.items.lock().await)
    }

    /// Impede novos enfileiramentos.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }
}
