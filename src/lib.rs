//! # gitcache
//!
//! Cache assíncrono de resultados de comandos git para hooks e agentes
//! do Claude Code.
//!
//! Hooks e agentes consultam o estado do repositório (status, diff, log)
//! dezenas de vezes por segundo. O gitcache serve essas consultas de um
//! cache em memória com TTL, agrupa as execuções em batches ordenados por
//! prioridade e limita quantos subprocessos `git` rodam ao mesmo tempo.
//!
//! ## Módulos
//!
//! - [`engine`] - Serviço [`GitCache`](engine::GitCache), ponto de entrada
//! - [`cache`] - Cache de resultados com TTL e evicção
//! - [`dispatcher`] - Fila de pendentes, loop de batching e pool de execução
//! - [`executors`] - Execução do binário git
//! - [`git`] - Cliente de alto nível e parsers de saída do git
//! - [`hooks`] - Sistema de hooks para customização
//! - [`cli`] - Interface de linha de comando
//! - [`types`] - Tipos compartilhados

pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod dispatcher;
pub mod engine;
pub mod executors;
pub mod git;
pub mod hooks;
pub mod types;

pub use engine::GitCache;
pub use types::config::Config;
pub use types::errors::{GitCacheError, GitCacheResult};
