//! Tipos de requisição do gitcache.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::Fingerprint;

/// Prioridade de um comando. Valores menores são mais urgentes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub u8);

impl Priority {
    /// Prioridade máxima (sempre executa imediatamente).
    pub const HIGHEST: Priority = Priority(0);

    /// Prioridade padrão.
    pub const NORMAL: Priority = Priority(5);

    /// Prioridade mínima.
    pub const LOWEST: Priority = Priority(u8::MAX);

    /// Verifica se o comando deve pular o batching.
    pub fn is_immediate(self, threshold: u8) -> bool {
        self.0 <= threshold
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl From<u8> for Priority {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

/// Categoria do comando, usada para escolher o TTL base.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Status,
    Diff,
    Log,
    Branch,
    Other,
}

impl CommandKind {
    /// Classifica pelo subcomando git, ignorando opções globais
    /// (`--no-pager`, `-C <dir>`, `-c <chave=valor>`...).
    pub fn classify<S: AsRef<str>>(args: &[S]) -> Self {
        match subcommand(args) {
            Some("status") => CommandKind::Status,
            Some("diff") => CommandKind::Diff,
            Some("log") | Some("show") => CommandKind::Log,
            Some("branch") | Some("rev-parse") | Some("symbolic-ref") => CommandKind::Branch,
            _ => CommandKind::Other,
        }
    }
}

/// Primeiro argumento que não é opção global do git.
fn subcommand<S: AsRef<str>>(args: &[S]) -> Option<&str> {
    let mut iter = args.iter().map(|a| a.as_ref());
    while let Some(arg) = iter.next() {
        match arg {
            // Opções globais cujo valor vem no argumento seguinte
            "-C" | "-c" | "--git-dir" | "--work-tree" | "--namespace" | "--super-prefix" => {
                iter.next();
            }
            _ if arg.starts_with('-') => {}
            _ => return Some(arg),
        }
    }
    None
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandKind::Status => write!(f, "status"),
            CommandKind::Diff => write!(f, "diff"),
            CommandKind::Log => write!(f, "log"),
            CommandKind::Branch => write!(f, "branch"),
            CommandKind::Other => write!(f, "other"),
        }
    }
}

/// Um comando git a ser executado (ou servido do cache).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitCommand {
    /// Argumentos passados ao git (sem o binário).
    pub args: Vec<String>,

    /// Diretório de trabalho.
    pub cwd: PathBuf,

    /// Prioridade no dispatcher.
    #[serde(default)]
    pub priority: Priority,

    /// Timeout específico; `None` usa o padrão do executor.
    #[serde(default)]
    pub timeout: Option<Duration>,
}

impl GitCommand {
    /// Cria um novo comando com prioridade padrão.
    pub fn new<I, S>(cwd: impl AsRef<Path>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            cwd: cwd.as_ref().to_path_buf(),
            priority: Priority::default(),
            timeout: None,
        }
    }

    /// Define a prioridade.
    #[must_use]
    pub fn with_priority(mut self, priority: impl Into<Priority>) -> Self {
        self.priority = priority.into();
        self
    }

    /// Define o timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Categoria do comando.
    pub fn kind(&self) -> CommandKind {
        CommandKind::classify(&self.args)
    }

    /// Chave de cache (argumentos + diretório).
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::from_parts(&self.args, &self.cwd)
    }
}

impl std::fmt::Display for GitCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "git {}", self.args.join(" "))
    }
}
