//! Tipos de erro do gitcache.

use std::time::Duration;

use thiserror::Error;

/// Tipo de resultado padrão do gitcache.
pub type GitCacheResult<T> = Result<T, GitCacheError>;

/// Erros possíveis no gitcache.
#[derive(Error, Debug)]
pub enum GitCacheError {
    #[error("Erro de configuração: {0}")]
    Config(String),

    #[error("Erro de IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("Erro ao parsear TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Erro ao serializar TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Erro de JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Binário git '{0}' não encontrado")]
    GitNotFound(String),

    #[error("Comando '{command}' falhou (código {exit_code}): {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("Timeout de {1:?} ao executar '{0}'")]
    Timeout(String, Duration),

    #[error("Saída do git inválida: {0}")]
    Parse(String),

    #[error("Fila de comandos cheia ({0} pendentes)")]
    QueueFull(usize),

    #[error("Dispatcher encerrado")]
    DispatcherStopped,

    #[error("Comando '{0}' ignorado por hook")]
    Skipped(String),

    #[error("{0}")]
    Other(String),
}

impl GitCacheError {
    /// Cria um erro genérico.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Cria um erro de configuração.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Cria um erro de parsing.
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Self::Parse(msg.into())
    }

    /// Cópia do erro para entregar a mais de um destinatário.
    ///
    /// Erros de bibliotecas externas não são clonáveis e viram `Io`
    /// (mesmo `kind`) ou `Other` com a mesma mensagem.
    pub fn duplicate(&self) -> Self {
        match self {
            Self::Config(msg) => Self::Config(msg.clone()),
            Self::Io(e) => Self::Io(std::io::Error::new(e.kind(), e.to_string())),
            Self::GitNotFound(binary) => Self::GitNotFound(binary.clone()),
            Self::CommandFailed {
                command,
                exit_code,
                stderr,
            } => Self::CommandFailed {
                command: command.clone(),
                exit_code: *exit_code,
                stderr: stderr.clone(),
            },
            Self::Timeout(command, timeout) => Self::Timeout(command.clone(), *timeout),
            Self::Parse(msg) => Self::Parse(msg.clone()),
            Self::QueueFull(len) => Self::QueueFull(*len),
            Self::DispatcherStopped => Self::DispatcherStopped,
            Self::Skipped(command) => Self::Skipped(command.clone()),
            Self::TomlParse(_) | Self::TomlSerialize(_) | Self::Json(_) | Self::Other(_) => {
                Self::Other(self.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_keeps_sub_second_precision() {
        let err = GitCacheError::Timeout("git status".to_string(), Duration::from_millis(250));
        assert_eq!(err.to_string(), "Timeout de 250ms ao executar 'git status'");

        let err = GitCacheError::Timeout("git log".to_string(), Duration::from_secs(10));
        assert_eq!(err.to_string(), "Timeout de 10s ao executar 'git log'");
    }

    #[test]
    fn test_duplicate() {
        let failed = GitCacheError::CommandFailed {
            command: "git log".to_string(),
            exit_code: 128,
            stderr: "fatal: bad revision".to_string(),
        };
        let copy = failed.duplicate();
        assert!(matches!(copy, GitCacheError::CommandFailed { exit_code: 128, .. }));
        assert_eq!(copy.to_string(), failed.to_string());

        let io = GitCacheError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        match io.duplicate() {
            GitCacheError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::PermissionDenied),
            other => panic!("expected io error, got {:?}", other),
        }

        let json = serde_json::from_str::<u8>("x").unwrap_err();
        let json = GitCacheError::Json(json);
        assert_eq!(json.duplicate().to_string(), json.to_string());
    }
}
