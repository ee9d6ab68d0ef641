//! Despacho de comandos git.
//!
//! Comandos que não estão no cache passam por aqui:
//!
//! - [`PendingQueue`]: fila compartilhada de comandos aguardando o próximo batch
//! - [`BatchDispatcher`]: loop em background que drena a fila a cada intervalo,
//!   ordena por prioridade, agrupa comandos com o mesmo fingerprint e despacha
//!   cada grupo em uma task própria
//! - [`ExecutionPool`]: limita o número de subprocessos simultâneos e popula
//!   o cache quando o comando termina com sucesso
//!
//! Comandos de alta prioridade (`<= immediate_threshold`) não entram na fila:
//! vão direto para o pool.

mod batch;
mod pool;
mod queue;

pub use batch::BatchDispatcher;
pub use pool::ExecutionPool;
pub use queue::{
    coalesce, order_batch, CoalescedCommand, PendingCommand, PendingQueue, ReplyReceiver,
};
