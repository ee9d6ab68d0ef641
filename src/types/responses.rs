//! Tipos de resposta do gitcache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Saída capturada de um comando git.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandOutput {
    /// Saída padrão (UTF-8 com substituição de bytes inválidos).
    pub stdout: String,

    /// Saída de erro.
    pub stderr: String,

    /// Código de saída (-1 quando o processo foi terminado por sinal).
    pub exit_code: i32,

    /// Duração da execução em milissegundos.
    pub duration_ms: u64,

    /// Momento da execução.
    pub executed_at: DateTime<Utc>,
}

impl CommandOutput {
    /// Cria uma saída a partir dos campos principais.
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
            duration_ms: 0,
            executed_at: Utc::now(),
        }
    }

    /// Cria uma saída bem-sucedida só com stdout.
    pub fn success_with(stdout: impl Into<String>) -> Self {
        Self::new(stdout, "", 0)
    }

    /// Define a duração.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Indica se o comando terminou com sucesso.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success() {
        assert!(CommandOutput::success_with("ok").success());
        assert!(!CommandOutput::new("", "fatal: not a git repository", 128).success());
    }

    #[test]
    fn test_serialize() {
        let output = CommandOutput::success_with("main").with_duration_ms(12);
        let json = serde_json::to_value(&output).unwrap();

        assert_eq!(json["stdout"], "main");
        assert_eq!(json["exit_code"], 0);
        assert_eq!(json["duration_ms"], 12);
    }
}
