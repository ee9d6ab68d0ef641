//! Interface de linha de comando do gitcache.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// gitcache - Cache assíncrono de comandos git para Claude Code.
#[derive(Parser, Debug)]
#[command(name = "gitcache")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Arquivo de configuração.
    #[arg(short, long, default_value = "gitcache.toml")]
    pub config: PathBuf,

    /// Modo verbose.
    #[arg(short, long)]
    pub verbose: bool,

    /// Modo silencioso.
    #[arg(short, long)]
    pub quiet: bool,

    /// Comando a executar.
    #[command(subcommand)]
    pub command: Commands,
}

/// Comandos disponíveis.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cria gitcache.toml com a configuração padrão.
    Init {
        /// Diretório de destino (padrão: diretório atual).
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Mostra o status do repositório.
    Status {
        /// Repositório (padrão: diretório atual).
        #[arg(short, long, default_value = ".")]
        repo: PathBuf,

        /// Saída em JSON.
        #[arg(long)]
        json: bool,
    },

    /// Lista arquivos alterados.
    Diff {
        /// Repositório (padrão: diretório atual).
        #[arg(short, long, default_value = ".")]
        repo: PathBuf,

        /// Lista os arquivos no índice em vez da árvore de trabalho.
        #[arg(long)]
        staged: bool,
    },

    /// Mostra os últimos commits.
    Log {
        /// Repositório (padrão: diretório atual).
        #[arg(short, long, default_value = ".")]
        repo: PathBuf,

        /// Número de commits.
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,

        /// Saída em JSON.
        #[arg(long)]
        json: bool,
    },

    /// Mede a taxa de acerto do cache com consultas repetidas de status.
    Bench {
        /// Repositório (padrão: diretório atual).
        #[arg(short, long, default_value = ".")]
        repo: PathBuf,

        /// Número de consultas.
        #[arg(short, long, default_value_t = 100)]
        iterations: usize,
    },

    /// Diagnostica problemas de configuração.
    Doctor,

    /// Mostra versão.
    Version,
}
