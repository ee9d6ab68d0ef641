//! Hooks padrão do gitcache.
//!
//! Este módulo contém hooks que vêm pré-configurados:
//! - `LoggingHook`: Registra execuções do git no log
//! - `MetricsHook`: Coleta métricas de execução

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::GitCacheResult;

use super::{Hook, HookContext, HookEvent, HookResult};

// ═══════════════════════════════════════════════════════════════════════════
// LoggingHook
// ═══════════════════════════════════════════════════════════════════════════

/// Hook que registra execuções do git no log.
///
/// Executado após cada subprocesso (post_execute). Sucessos vão para
/// `debug`, códigos de saída diferentes de zero para `warn`.
#[derive(Debug, Default)]
pub struct LoggingHook;

impl LoggingHook {
    /// Cria um novo LoggingHook.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Hook for LoggingHook {
    fn name(&self) -> &str {
        "logging"
    }

    fn event(&self) -> HookEvent {
        HookEvent::PostExecute
    }

    async fn execute(&self, context: &HookContext<'_>) -> GitCacheResult<HookResult> {
        if let HookContext::PostExecute { command, output } = context {
            if output.success() {
                tracing::debug!(
                    command = %command,
                    cwd = %command.cwd.display(),
                    duration_ms = output.duration_ms,
                    stdout_bytes = output.stdout.len(),
                    "Git command completed"
                );
            } else {
                tracing::warn!(
                    command = %command,
                    cwd = %command.cwd.display(),
                    exit_code = output.exit_code,
                    stderr = %output.stderr.trim(),
                    "Git command failed"
                );
            }
        }

        Ok(HookResult::Continue)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// MetricsHook
// ═══════════════════════════════════════════════════════════════════════════

/// Hook que coleta métricas de execução.
///
/// Mantém contadores de execuções, falhas e a duração acumulada.
#[derive(Debug, Default)]
pub struct MetricsHook {
    /// Total de execuções.
    executions: AtomicU64,

    /// Total de execuções com código de saída != 0.
    failures: AtomicU64,

    /// Soma das durações (para calcular média).
    duration_sum_ms: AtomicU64,
}

impl MetricsHook {
    /// Cria um novo MetricsHook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Retorna o total de execuções.
    pub fn total_executions(&self) -> u64 {
        self.executions.load(Ordering::Relaxed)
    }

    /// Retorna o total de falhas.
    pub fn total_failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Retorna a taxa de sucesso.
    pub fn success_rate(&self) -> f64 {
        let total = self.total_executions();
        if total == 0 {
            0.0
        } else {
            (total - self.total_failures()) as f64 / total as f64
        }
    }

    /// Retorna a duração média em milissegundos.
    pub fn average_duration_ms(&self) -> f64 {
        let total = self.total_executions();
        if total == 0 {
            0.0
        } else {
            self.duration_sum_ms.load(Ordering::Relaxed) as f64 / total as f64
        }
    }

    /// Retorna as métricas em formato estruturado.
    pub fn metrics(&self) -> Metrics {
        Metrics {
            total_executions: self.total_executions(),
            failures: self.total_failures(),
            success_rate: self.success_rate(),
            average_duration_ms: self.average_duration_ms(),
        }
    }
}

/// Métricas coletadas pelo MetricsHook.
#[derive(Debug, Clone)]
pub struct Metrics {
    pub total_executions: u64,
    pub failures: u64,
    pub success_rate: f64,
    pub average_duration_ms: f64,
}

#[async_trait]
impl Hook for MetricsHook {
    fn name(&self) -> &str {
        "metrics"
    }

    fn event(&self) -> HookEvent {
        HookEvent::PostExecute
    }

    async fn execute(&self, context: &HookContext<'_>) -> GitCacheResult<HookResult> {
        if let HookContext::PostExecute { output, .. } = context {
            self.executions.fetch_add(1, Ordering::Relaxed);

            if !output.success() {
                self.failures.fetch_add(1, Ordering::Relaxed);
            }

            self.duration_sum_ms
                .fetch_add(output.duration_ms, Ordering::Relaxed);
        }

        Ok(HookResult::Continue)
    }
}
