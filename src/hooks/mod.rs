//! Sistema de hooks do gitcache.
//!
//! Hooks permitem customizar o comportamento do cache em pontos
//! específicos do fluxo de execução:
//!
//! - `pre_execute`: Antes da consulta ao cache (pode pular ou reescrever o comando)
//! - `post_execute`: Após o git terminar (sucesso ou código de saída != 0)
//! - `on_cache_hit`: Quando o resultado vem do cache
//! - `on_evict`: Quando uma varredura de evicção remove entradas

mod builtin;

pub use builtin::{LoggingHook, Metrics, MetricsHook};

use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::Fingerprint;
use crate::types::requests::GitCommand;
use crate::types::responses::CommandOutput;
use crate::GitCacheResult;

// ═══════════════════════════════════════════════════════════════════════════
// Tipos de eventos
// ═══════════════════════════════════════════════════════════════════════════

/// Evento que dispara um hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    /// Antes de consultar o cache.
    PreExecute,

    /// Após executar o git.
    PostExecute,

    /// Quando o resultado vem do cache.
    OnCacheHit,

    /// Quando entradas são evictadas.
    OnEvict,
}

impl std::fmt::Display for HookEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookEvent::PreExecute => write!(f, "pre_execute"),
            HookEvent::PostExecute => write!(f, "post_execute"),
            HookEvent::OnCacheHit => write!(f, "on_cache_hit"),
            HookEvent::OnEvict => write!(f, "on_evict"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Contexto de hooks
// ═══════════════════════════════════════════════════════════════════════════

/// Contexto passado para hooks.
pub enum HookContext<'a> {
    /// Contexto para pre_execute.
    PreExecute {
        /// Comando solicitado.
        command: &'a GitCommand,
    },

    /// Contexto para post_execute.
    PostExecute {
        /// Comando executado.
        command: &'a GitCommand,
        /// Saída do git.
        output: &'a CommandOutput,
    },

    /// Contexto para on_cache_hit.
    OnCacheHit {
        /// Comando solicitado.
        command: &'a GitCommand,
        /// Resultado cacheado.
        output: &'a CommandOutput,
    },

    /// Contexto para on_evict.
    OnEvict {
        /// Fingerprints removidos.
        evicted: &'a [Fingerprint],
    },
}

impl<'a> HookContext<'a> {
    /// Retorna o evento correspondente ao contexto.
    pub fn event(&self) -> HookEvent {
        match self {
            HookContext::PreExecute { .. } => HookEvent::PreExecute,
            HookContext::PostExecute { .. } => HookEvent::PostExecute,
            HookContext::OnCacheHit { .. } => HookEvent::OnCacheHit,
            HookContext::OnEvict { .. } => HookEvent::OnEvict,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Resultado de hooks
// ═══════════════════════════════════════════════════════════════════════════

/// Resultado da execução de um hook.
#[derive(Debug, Clone, Default)]
pub enum HookResult {
    /// Continua normalmente.
    #[default]
    Continue,

    /// Não executa o comando (apenas válido para pre_execute).
    Skip,

    /// Substitui o comando (apenas válido para pre_execute).
    ModifyCommand(GitCommand),
}

// ═══════════════════════════════════════════════════════════════════════════
// Trait Hook
// ═══════════════════════════════════════════════════════════════════════════

/// Trait para hooks customizáveis.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Nome do hook.
    fn name(&self) -> &str;

    /// Evento que dispara este hook.
    fn event(&self) -> HookEvent;

    /// Executa o hook.
    async fn execute(&self, context: &HookContext<'_>) -> GitCacheResult<HookResult>;
}

/// Permite registrar um hook e continuar lendo seu estado (ex.: métricas).
#[async_trait]
impl<T: Hook + ?Sized> Hook for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn event(&self) -> HookEvent {
        (**self).event()
    }

    async fn execute(&self, context: &HookContext<'_>) -> GitCacheResult<HookResult> {
        (**self).execute(context).await
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Sistema de hooks
// ═══════════════════════════════════════════════════════════════════════════

/// Gerenciador de hooks.
pub struct HookSystem {
    pre_execute: Vec<Box<dyn Hook>>,
    post_execute: Vec<Box<dyn Hook>>,
    on_cache_hit: Vec<Box<dyn Hook>>,
    on_evict: Vec<Box<dyn Hook>>,
}

impl HookSystem {
    /// Cria um novo sistema de hooks vazio.
    pub fn new() -> Self {
        Self {
            pre_execute: Vec::new(),
            post_execute: Vec::new(),
            on_cache_hit: Vec::new(),
            on_evict: Vec::new(),
        }
    }

    /// Cria um sistema com hooks padrão (logging).
    pub fn with_defaults() -> Self {
        let mut system = Self::new();
        system.register(Box::new(LoggingHook));
        system
    }

    /// Registra um hook.
    pub fn register(&mut self, hook: Box<dyn Hook>) {
        let event = hook.event();
        tracing::debug!(
            hook_name = hook.name(),
            event = %event,
            "Registering hook"
        );

        match event {
            HookEvent::PreExecute => self.pre_execute.push(hook),
            HookEvent::PostExecute => self.post_execute.push(hook),
            HookEvent::OnCacheHit => self.on_cache_hit.push(hook),
            HookEvent::OnEvict => self.on_evict.push(hook),
        }
    }

    /// Executa hooks de pre_execute.
    ///
    /// O primeiro hook que retornar `Skip` ou `ModifyCommand` encerra a cadeia.
    pub async fn run_pre_execute(&self, command: &GitCommand) -> GitCacheResult<HookResult> {
        let context = HookContext::PreExecute { command };

        for hook in &self.pre_execute {
            let result = hook.execute(&context).await?;
            match result {
                HookResult::Continue => continue,
                HookResult::Skip => return Ok(HookResult::Skip),
                HookResult::ModifyCommand(new_command) => {
                    return Ok(HookResult::ModifyCommand(new_command))
                }
            }
        }

        Ok(HookResult::Continue)
    }

    /// Executa hooks de post_execute.
    pub async fn run_post_execute(
        &self,
        command: &GitCommand,
        output: &CommandOutput,
    ) -> GitCacheResult<()> {
        let context = HookContext::PostExecute { command, output };

        for hook in &self.post_execute {
            hook.execute(&context).await?;
        }

        Ok(())
    }

    /// Executa hooks de on_cache_hit.
    pub async fn run_on_cache_hit(
        &self,
        command: &GitCommand,
        output: &CommandOutput,
    ) -> GitCacheResult<()> {
        let context = HookContext::OnCacheHit { command, output };

        for hook in &self.on_cache_hit {
            hook.execute(&context).await?;
        }

        Ok(())
    }

    /// Executa hooks de on_evict.
    pub async fn run_on_evict(&self, evicted: &[Fingerprint]) -> GitCacheResult<()> {
        let context = HookContext::OnEvict { evicted };

        for hook in &self.on_evict {
            hook.execute(&context).await?;
        }

        Ok(())
    }

    /// Retorna o número total de hooks registrados.
    pub fn count(&self) -> usize {
        self.pre_execute.len()
            + self.post_execute.len()
            + self.on_cache_hit.len()
            + self.on_evict.len()
    }

    /// Retorna o número de hooks para um evento específico.
    pub fn count_for_event(&self, event: HookEvent) -> usize {
        match event {
            HookEvent::PreExecute => self.pre_execute.len(),
            HookEvent::PostExecute => self.post_execute.len(),
            HookEvent::OnCacheHit => self.on_cache_hit.len(),
            HookEvent::OnEvict => self.on_evict.len(),
        }
    }
}

impl Default for HookSystem {
    fn default() -> Self {
        Self::new()
    }
}
