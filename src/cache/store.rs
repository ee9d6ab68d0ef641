//! Cache de resultados de comandos git.

use std::cmp::Reverse;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use lru::LruCache;

use super::Fingerprint;
use crate::types::config::{CacheConfig, CacheStrategy, TtlConfig};
use crate::types::requests::{CommandKind, GitCommand};
use crate::types::responses::CommandOutput;

/// Entrada do cache.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Resultado compartilhado (o mesmo `Arc` é devolvido em todo hit).
    pub output: Arc<CommandOutput>,

    /// Categoria do comando (define o TTL base).
    pub kind: CommandKind,

    /// Diretório de trabalho do comando.
    pub cwd: PathBuf,

    /// Momento da inserção.
    pub inserted_at: DateTime<Utc>,

    /// Número de hits desde a inserção.
    pub access_count: u64,
}

impl CacheEntry {
    /// Cria uma nova entrada.
    pub fn new(output: Arc<CommandOutput>, kind: CommandKind, cwd: PathBuf) -> Self {
        Self {
            output,
            kind,
            cwd,
            inserted_at: Utc::now(),
            access_count: 0,
        }
    }

    /// Idade da entrada.
    pub fn age(&self) -> Duration {
        Utc::now()
            .signed_duration_since(self.inserted_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Uma entrada só é válida enquanto `age < ttl`.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.age() >= ttl
    }
}

/// Estatísticas do cache.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Número atual de entradas.
    pub size: usize,

    /// Capacidade máxima.
    pub capacity: usize,

    /// Número de acertos (cache hits).
    pub hits: u64,

    /// Número de erros (cache misses), incluindo expirações.
    pub misses: u64,

    /// Entradas descartadas por TTL.
    pub expirations: u64,

    /// Entradas removidas por evicção.
    pub evictions: u64,

    /// Estratégia de TTL em uso.
    pub strategy: CacheStrategy,
}

impl CacheStats {
    /// Calcula a taxa de acerto.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Entradas removidas por uma varredura de evicção.
#[derive(Debug, Clone, Default)]
pub struct EvictionReport {
    pub evicted: Vec<Fingerprint>,
}

impl EvictionReport {
    pub fn is_empty(&self) -> bool {
        self.evicted.is_empty()
    }

    pub fn len(&self) -> usize {
        self.evicted.len()
    }
}

/// Cache de resultados com TTL por categoria e evicção aproximada de LRU.
///
/// Quando o tamanho passa da capacidade, uma varredura remove a fração
/// configurada de entradas (10% por padrão) com menor
/// `(access_count, inserted_at)`. Empates exatos são resolvidos pela
/// ordem de uso mantida pelo `LruCache`.
pub struct ResultCache {
    entries: LruCache<Fingerprint, CacheEntry>,
    capacity: usize,
    eviction_fraction: f64,
    ttl: TtlConfig,
    strategy: CacheStrategy,
    enabled: bool,
    hits: AtomicU64,
    misses: AtomicU64,
    expirations: AtomicU64,
    evictions: AtomicU64,
}

impl ResultCache {
    /// Cria um cache a partir da configuração.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: LruCache::unbounded(),
            capacity: config.capacity.max(1),
            eviction_fraction: config.eviction_fraction,
            ttl: config.ttl.clone(),
            strategy: config.strategy,
            enabled: config.enabled,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Cria um cache com o mesmo TTL para todas as categorias.
    pub fn with_uniform_ttl(capacity: usize, ttl_secs: u64) -> Self {
        let config = CacheConfig {
            capacity,
            ttl: TtlConfig {
                status_secs: ttl_secs,
                diff_secs: ttl_secs,
                log_secs: ttl_secs,
                branch_secs: ttl_secs,
                default_secs: ttl_secs,
            },
            ..CacheConfig::default()
        };
        Self::new(&config)
    }

    /// TTL efetivo de uma categoria com a estratégia atual.
    pub fn ttl_for(&self, kind: CommandKind) -> Duration {
        self.strategy.apply(self.ttl.base_for(kind))
    }

    /// Busca no cache.
    ///
    /// Retorna `None` se não encontrado ou se expirado (a entrada expirada
    /// é removida). Um hit incrementa o `access_count`.
    pub fn lookup(&mut self, fingerprint: &Fingerprint) -> Option<Arc<CommandOutput>> {
        if !self.enabled {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        // peek não altera a ordem de uso
        let is_expired = self
            .entries
            .peek(fingerprint)
            .map(|entry| entry.is_expired(self.ttl_for(entry.kind)));

        match is_expired {
            Some(true) => {
                self.entries.pop(fingerprint);
                self.misses.fetch_add(1, Ordering::Relaxed);
                self.expirations.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(fingerprint = fingerprint.short(), "Cache entry expired");
                None
            }
            Some(false) => {
                let entry = self.entries.get_mut(fingerprint)?;
                entry.access_count += 1;
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(&entry.output))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insere (ou substitui) o resultado de um comando.
    ///
    /// Dispara uma varredura de evicção se a capacidade for excedida.
    pub fn store(&mut self, command: &GitCommand, output: Arc<CommandOutput>) -> EvictionReport {
        if !self.enabled {
            return EvictionReport::default();
        }

        let entry = CacheEntry::new(output, command.kind(), command.cwd.clone());
        self.entries.put(command.fingerprint(), entry);

        if self.entries.len() > self.capacity {
            self.evict()
        } else {
            EvictionReport::default()
        }
    }

    /// Remove as entradas com menor `(access_count, inserted_at)`.
    fn evict(&mut self) -> EvictionReport {
        let len = self.entries.len();
        let by_fraction = (len as f64 * self.eviction_fraction).ceil() as usize;
        let count = by_fraction.max(len.saturating_sub(self.capacity)).min(len);

        // iter() vai do mais recente ao menos recente
        let mut candidates: Vec<_> = self
            .entries
            .iter()
            .enumerate()
            .map(|(rank, (fp, entry))| {
                (
                    (entry.access_count, entry.inserted_at, Reverse(rank)),
                    fp.clone(),
                )
            })
            .collect();
        candidates.sort_by(|a, b| a.0.cmp(&b.0));

        let evicted: Vec<Fingerprint> = candidates
            .into_iter()
            .take(count)
            .map(|(_, fp)| fp)
            .collect();

        for fp in &evicted {
            self.entries.pop(fp);
        }

        self.evictions
            .fetch_add(evicted.len() as u64, Ordering::Relaxed);
        tracing::debug!(
            evicted = evicted.len(),
            remaining = self.entries.len(),
            capacity = self.capacity,
            "Cache eviction sweep"
        );

        EvictionReport { evicted }
    }

    /// Invalida uma entrada específica.
    pub fn invalidate(&mut self, fingerprint: &Fingerprint) -> bool {
        self.entries.pop(fingerprint).is_some()
    }

    /// Invalida todas as entradas de um diretório de trabalho.
    pub fn invalidate_dir(&mut self, cwd: &Path) -> usize {
        let keys: Vec<Fingerprint> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.cwd == cwd)
            .map(|(fp, _)| fp.clone())
            .collect();

        for key in &keys {
            self.entries.pop(key);
        }
        keys.len()
    }

    /// Limpa todo o cache.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Remove entradas expiradas. Retorna quantas foram removidas.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired_keys: Vec<Fingerprint> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(self.ttl_for(entry.kind)))
            .map(|(fp, _)| fp.clone())
            .collect();

        for key in &expired_keys {
            self.entries.pop(key);
        }

        self.expirations
            .fetch_add(expired_keys.len() as u64, Ordering::Relaxed);
        expired_keys.len()
    }

    /// Consulta uma entrada sem contar hit nem alterar a ordem de uso.
    pub fn peek(&self, fingerprint: &Fingerprint) -> Option<&CacheEntry> {
        self.entries.peek(fingerprint)
    }

    /// Verifica se existe entrada (válida ou não) para o fingerprint.
    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.contains(fingerprint)
    }

    /// Altera a estratégia de TTL (vale também para entradas já cacheadas).
    pub fn set_strategy(&mut self, strategy: CacheStrategy) {
        self.strategy = strategy;
    }

    pub fn strategy(&self) -> CacheStrategy {
        self.strategy
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Retorna estatísticas do cache.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            strategy: self.strategy,
        }
    }
}
