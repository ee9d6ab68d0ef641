//! Parser de `git log` com formato delimitado.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{GitCacheError, GitCacheResult};

/// Formato passado ao `git log`: campos separados por US (0x1f),
/// registros terminados por RS (0x1e).
pub const LOG_FORMAT: &str = "--format=%H%x1f%an%x1f%at%x1f%s%x1e";

/// Resumo de um commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub hash: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub subject: String,
}

impl CommitSummary {
    pub fn short_hash(&self) -> &str {
        &self.hash[..self.hash.len().min(7)]
    }
}

/// Parseia a saída de `git log` gerada com [`LOG_FORMAT`].
pub fn parse_log(output: &str) -> GitCacheResult<Vec<CommitSummary>> {
    output
        .split('\x1e')
        .map(|record| record.trim_start_matches('\n'))
        .filter(|record| !record.trim().is_empty())
        .map(parse_record)
        .collect()
}

fn parse_record(record: &str) -> GitCacheResult<CommitSummary> {
    let fields: Vec<&str> = record.splitn(4, '\x1f').collect();
    let &[hash, author, at, subject] = fields.as_slice() else {
        return Err(GitCacheError::parse(format!(
            "expected 4 log fields, got {}",
            fields.len()
        )));
    };

    if hash.len() < 7 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(GitCacheError::parse(format!("bad commit hash '{}'", hash)));
    }

    let seconds: i64 = at
        .parse()
        .map_err(|_| GitCacheError::parse(format!("bad commit timestamp '{}'", at)))?;
    let timestamp = Utc
        .timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| GitCacheError::parse(format!("timestamp out of range '{}'", at)))?;

    Ok(CommitSummary {
        hash: hash.to_string(),
        author: author.to_string(),
        timestamp,
        subject: subject.trim_end_matches('\n').to_string(),
    })
}
