//! Implementação dos comandos CLI do gitcache.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

use crate::engine::GitCache;
use crate::executors::{CommandRunner, GitExecutor};
use crate::git::{EntryKind, GitStatus, StatusEntry};
use crate::hooks::{HookSystem, MetricsHook};
use crate::types::config::{Config, CONFIG_FILE_NAME};
use crate::types::requests::Priority;
use crate::{GitCacheError, GitCacheResult};

/// Initializes configuration in the specified directory.
pub async fn init(path: Option<PathBuf>) -> GitCacheResult<()> {
    let target_dir = path.unwrap_or_else(|| PathBuf::from("."));

    if !target_dir.exists() {
        std::fs::create_dir_all(&target_dir)?;
        tracing::info!("Directory created: {}", target_dir.display());
    }

    let config_path = target_dir.join(CONFIG_FILE_NAME);

    if config_path.exists() {
        println!("Configuration already exists at: {}", config_path.display());
        return Ok(());
    }

    let config = Config::default_config();
    config.save(&config_path)?;

    println!("gitcache initialized successfully!");
    println!("Configuration created at: {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Check the environment: gitcache doctor");
    println!("  2. Measure the cache: gitcache bench");

    Ok(())
}

/// Mostra o status do repositório.
pub async fn status(repo: &Path, json: bool, config: &Config) -> GitCacheResult<()> {
    let cache = GitCache::new(config);
    let result = cache.client(repo).status().await;
    cache.shutdown().await;

    let status = result?;
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print_status(&status);
    }
    Ok(())
}

fn print_status(status: &GitStatus) {
    let branch = &status.branch;
    match (&branch.head, &branch.oid) {
        (Some(head), _) => print!("Branch: {}", head),
        (None, Some(oid)) => print!("HEAD destacado em {}", &oid[..oid.len().min(7)]),
        (None, None) => print!("Repositório sem commits"),
    }
    if let Some(upstream) = &branch.upstream {
        print!(" ({}, +{}/-{})", upstream, branch.ahead, branch.behind);
    }
    println!();

    if status.is_clean() {
        println!("\n✓ Árvore de trabalho limpa");
        return;
    }

    print_section("Staged", status.staged().collect());
    print_section("Não staged", status.unstaged().collect());
    print_section("Não rastreados", status.untracked().collect());
    print_section("Conflitos", status.conflicted().collect());
}

fn print_section(title: &str, entries: Vec<&StatusEntry>) {
    if entries.is_empty() {
        return;
    }

    println!("\n{} ({}):", title, entries.len());
    for entry in entries {
        match (&entry.kind, &entry.orig_path) {
            (EntryKind::RenamedOrCopied { .. }, Some(orig)) => {
                println!("  {} -> {}", orig, entry.path)
            }
            _ => println!("  {}", entry.path),
        }
    }
}

/// Lista arquivos alterados.
pub async fn diff(repo: &Path, staged: bool, config: &Config) -> GitCacheResult<()> {
    let cache = GitCache::new(config);
    let client = cache.client(repo);
    let result = if staged {
        client.staged_files().await
    } else {
        client.changed_files().await
    };
    cache.shutdown().await;

    let files = result?;
    if files.is_empty() {
        println!("Nenhum arquivo alterado.");
    }
    for file in files {
        println!("{}", file);
    }

    Ok(())
}

/// Mostra os últimos commits.
pub async fn log(repo: &Path, limit: usize, json: bool, config: &Config) -> GitCacheResult<()> {
    let cache = GitCache::new(config);
    let result = cache.client(repo).recent_commits(limit).await;
    cache.shutdown().await;

    let commits = result?;
    if json {
        println!("{}", serde_json::to_string_pretty(&commits)?);
        return Ok(());
    }

    for commit in commits {
        println!(
            "{} {} {:<20} {}",
            commit.short_hash(),
            commit.timestamp.format("%Y-%m-%d"),
            commit.author,
            commit.subject
        );
    }

    Ok(())
}

/// Executa `iterations` consultas de status e mostra as estatísticas do cache.
pub async fn bench(repo: &Path, iterations: usize, config: &Config) -> GitCacheResult<()> {
    let metrics = Arc::new(MetricsHook::new());
    let mut hooks = HookSystem::with_defaults();
    hooks.register(Box::new(metrics.clone()));

    let runner = Arc::new(GitExecutor::from_config(config));
    let cache = GitCache::with_runner(config, runner, hooks);
    let client = cache.client(repo);

    let style = ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {elapsed}")
        .map_err(|e| GitCacheError::other(e.to_string()))?;
    let progress = ProgressBar::new(iterations as u64).with_style(style);

    let started = Instant::now();
    let mut failure = None;
    for _ in 0..iterations {
        if let Err(e) = client.status().await {
            failure = Some(e);
            break;
        }
        progress.inc(1);
    }
    let elapsed = started.elapsed();
    progress.finish_and_clear();

    let stats = cache.stats().await;
    cache.shutdown().await;

    if let Some(e) = failure {
        return Err(e);
    }

    let executed = metrics.metrics();
    println!("Consultas:           {}", iterations);
    println!("Tempo total:         {:.1?}", elapsed);
    println!("Subprocessos git:    {}", executed.total_executions);
    println!("Duração média (ms):  {:.1}", executed.average_duration_ms);
    println!("Acertos no cache:    {}", stats.hits);
    println!("Faltas no cache:     {}", stats.misses);
    println!("Taxa de acerto:      {:.1}%", stats.hit_rate() * 100.0);
    println!("Estratégia:          {}", stats.strategy);

    Ok(())
}

/// Diagnostica problemas de configuração.
pub async fn doctor(config: &Config) -> GitCacheResult<()> {
    println!("Diagnosticando configuração do gitcache...\n");

    let mut issues: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    match config.validate() {
        Ok(()) => println!("✓ Configuração válida"),
        Err(e) => issues.push(e.to_string()),
    }

    let executor = GitExecutor::from_config(config);
    if executor.is_available().await {
        match executor.version().await {
            Ok(version) => println!("✓ {} ({})", version, executor.program()),
            Err(_) => println!("✓ git está disponível ({})", executor.program()),
        }
    } else {
        issues.push(format!(
            "git não está instalado (comando esperado: {})",
            executor.program()
        ));
    }

    if !config.cache.enabled {
        warnings.push("Cache desabilitado no config - todo comando executa o git".to_string());
    }
    if Priority(config.dispatcher.immediate_threshold) >= Priority::LOWEST {
        warnings.push(
            "immediate_threshold cobre todas as prioridades - batching inativo".to_string(),
        );
    }

    println!(
        "✓ Cache: capacidade {}, estratégia {}, timeout {}s",
        config.cache.capacity, config.cache.strategy, config.general.timeout_secs
    );

    println!();
    if issues.is_empty() && warnings.is_empty() {
        println!("✓ Tudo OK! gitcache está pronto para uso.");
    } else {
        if !warnings.is_empty() {
            println!("Avisos:");
            for warning in warnings {
                println!("  ⚠ {}", warning);
            }
        }
        if !issues.is_empty() {
            println!("Problemas:");
            for issue in issues {
                println!("  ✗ {}", issue);
            }
        }
    }

    Ok(())
}

/// Mostra versão.
pub fn version() {
    println!("gitcache {}", env!("CARGO_PKG_VERSION"));
}
