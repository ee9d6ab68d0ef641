//! Serviço de cache de comandos git.
//!
//! [`GitCache`] junta o cache de resultados, o pool de execução, o
//! dispatcher de batches e os hooks. É construído explicitamente e
//! passado adiante por quem precisa; não existe instância global.
//!
//! ## Exemplo
//!
//! ```rust,ignore
//! use gitcache::engine::GitCache;
//! use gitcache::Config;
//!
//! let cache = GitCache::new(&Config::load_or_default());
//! let status = cache.client(".").status().await?;
//! println!("branch: {:?}", status.branch.head);
//! cache.shutdown().await;
//! ```

mod service;

pub(crate) use service::canonical_dir;
pub use service::GitCache;
