//! Cache de resultados de comandos git.
//!
//! Este módulo implementa o armazenamento em memória dos resultados de
//! comandos git, indexados por [`Fingerprint`] (hash do comando + diretório
//! de trabalho), com TTL por categoria de comando e evicção aproximada
//! de LRU.

mod fingerprint;
mod store;

pub use fingerprint::Fingerprint;
pub use store::{CacheEntry, CacheStats, EvictionReport, ResultCache};

/// Cache compartilhado entre o serviço e o pool de execução.
pub type SharedCache = std::sync::Arc<tokio::sync::Mutex<ResultCache>>;
