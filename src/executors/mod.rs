//! Executores de comandos do gitcache.
//!
//! Este módulo contém o trait [`CommandRunner`], que abstrai a execução
//! de um comando git, e a implementação padrão [`GitExecutor`], que
//! chama o binário `git` como subprocesso.

mod base;
mod git;

pub use base::CommandRunner;
pub use git::GitExecutor;
