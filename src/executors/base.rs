//! Trait base para executores de comandos.

use async_trait::async_trait;

use crate::types::requests::GitCommand;
use crate::types::responses::CommandOutput;
use crate::GitCacheResult;

/// Trait para executores de comandos git.
///
/// O pool de execução só conhece este trait, o que permite trocar o
/// subprocesso real por implementações em memória nos testes.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Retorna o nome do executor.
    fn name(&self) -> &str;

    /// Retorna o programa executado.
    fn program(&self) -> &str;

    /// Verifica se o programa está disponível no sistema.
    async fn is_available(&self) -> bool {
        tokio::process::Command::new(self.program())
            .arg("--version")
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Retorna a versão do programa.
    async fn version(&self) -> GitCacheResult<String> {
        let output = tokio::process::Command::new(self.program())
            .arg("--version")
            .output()
            .await?;

        let version = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or("unknown")
            .to_string();

        Ok(version)
    }

    /// Executa o comando.
    ///
    /// Um código de saída diferente de zero não é erro aqui: a saída é
    /// devolvida e quem chamou decide o que fazer com ela. Erros são
    /// reservados para falhas de spawn e timeouts.
    async fn run(&self, command: &GitCommand) -> GitCacheResult<CommandOutput>;
}
