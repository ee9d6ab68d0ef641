//! Operações git de alto nível sobre o cache.
//!
//! Todas as saídas são pedidas em formatos legíveis por máquina
//! (`--porcelain=v2 -z`, listas `-z`, `--format` delimitado) e validadas
//! por parsers com erros tipados.

mod client;
mod log;
mod porcelain;

pub use client::GitClient;
pub use log::{parse_log, CommitSummary, LOG_FORMAT};
pub use porcelain::{
    parse_name_list, parse_status, BranchInfo, EntryKind, FileState, GitStatus, StatusEntry,
};
