//! Parser de `git status --porcelain=v2 --branch -z`.
//!
//! Gramática aceita (um registro por campo separado por NUL):
//!
//! ```text
//! # branch.oid <commit> | (initial)
//! # branch.head <branch> | (detached)
//! # branch.upstream <upstream>
//! # branch.ab +<ahead> -<behind>
//! # <qualquer outro header>                      (ignorado)
//! 1 <XY> <sub> <mH> <mI> <mW> <hH> <hI> <path>
//! 2 <XY> <sub> <mH> <mI> <mW> <hH> <hI> <X><score> <path> NUL <origPath>
//! u <XY> <sub> <m1> <m2> <m3> <mW> <h1> <h2> <h3> <path>
//! ? <path>
//! ! <path>
//! ```

use serde::{Deserialize, Serialize};

use crate::{GitCacheError, GitCacheResult};

/// Estado de um arquivo no índice ou na árvore de trabalho.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    #[default]
    Unmodified,
    Modified,
    TypeChanged,
    Added,
    Deleted,
    Renamed,
    Copied,
    Unmerged,
}

impl FileState {
    fn from_char(c: char) -> GitCacheResult<Self> {
        Ok(match c {
            '.' => FileState::Unmodified,
            'M' => FileState::Modified,
            'T' => FileState::TypeChanged,
            'A' => FileState::Added,
            'D' => FileState::Deleted,
            'R' => FileState::Renamed,
            'C' => FileState::Copied,
            'U' => FileState::Unmerged,
            other => {
                return Err(GitCacheError::parse(format!(
                    "unknown file state '{}'",
                    other
                )))
            }
        })
    }

    pub fn is_changed(self) -> bool {
        self != FileState::Unmodified
    }
}

/// Tipo de registro no status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Ordinary,
    RenamedOrCopied {
        /// Similaridade (0-100) entre origem e destino.
        score: u8,
    },
    Unmerged,
    Untracked,
    Ignored,
}

/// Um arquivo listado pelo status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub kind: EntryKind,
    pub index: FileState,
    pub worktree: FileState,
    pub path: String,
    /// Caminho original (apenas renomeados/copiados).
    pub orig_path: Option<String>,
    /// Se o caminho é um submódulo.
    pub submodule: bool,
}

impl StatusEntry {
    fn simple(kind: EntryKind, path: &str) -> Self {
        Self {
            kind,
            index: FileState::Unmodified,
            worktree: FileState::Unmodified,
            path: path.to_string(),
            orig_path: None,
            submodule: false,
        }
    }
}

/// Informações do branch (`# branch.*`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    /// Commit atual; `None` em repositório sem commits.
    pub oid: Option<String>,
    /// Branch atual; `None` com HEAD destacado.
    pub head: Option<String>,
    pub upstream: Option<String>,
    pub ahead: u32,
    pub behind: u32,
}

impl BranchInfo {
    pub fn is_detached(&self) -> bool {
        self.head.is_none() && self.oid.is_some()
    }
}

/// Resultado parseado do status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitStatus {
    pub branch: BranchInfo,
    pub entries: Vec<StatusEntry>,
}

impl GitStatus {
    /// Sem alterações rastreadas nem arquivos não rastreados.
    pub fn is_clean(&self) -> bool {
        self.entries.iter().all(|e| e.kind == EntryKind::Ignored)
    }

    /// Entradas com alterações no índice.
    pub fn staged(&self) -> impl Iterator<Item = &StatusEntry> {
        self.entries.iter().filter(|e| {
            matches!(e.kind, EntryKind::Ordinary | EntryKind::RenamedOrCopied { .. })
                && e.index.is_changed()
        })
    }

    /// Entradas com alterações na árvore de trabalho ainda não adicionadas.
    pub fn unstaged(&self) -> impl Iterator<Item = &StatusEntry> {
        self.entries.iter().filter(|e| {
            matches!(e.kind, EntryKind::Ordinary | EntryKind::RenamedOrCopied { .. })
                && e.worktree.is_changed()
        })
    }

    pub fn untracked(&self) -> impl Iterator<Item = &StatusEntry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::Untracked)
    }

    pub fn conflicted(&self) -> impl Iterator<Item = &StatusEntry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::Unmerged)
    }
}

/// Parseia a saída de `git status --porcelain=v2 --branch -z`.
pub fn parse_status(output: &str) -> GitCacheResult<GitStatus> {
    let mut status = GitStatus::default();
    let mut fields = output.split('\0').filter(|f| !f.is_empty());

    while let Some(record) = fields.next() {
        let (tag, rest) = record
            .split_once(' ')
            .ok_or_else(|| GitCacheError::parse(format!("malformed record '{}'", record)))?;

        match tag {
            "#" => parse_header(rest, &mut status.branch)?,
            "1" => status.entries.push(parse_ordinary(rest)?),
            "2" => {
                let orig = fields.next().ok_or_else(|| {
                    GitCacheError::parse("rename record without original path")
                })?;
                let mut entry = parse_renamed(rest)?;
                entry.orig_path = Some(orig.to_string());
                status.entries.push(entry);
            }
            "u" => status.entries.push(parse_unmerged(rest)?),
            "?" => status
                .entries
                .push(StatusEntry::simple(EntryKind::Untracked, rest)),
            "!" => status
                .entries
                .push(StatusEntry::simple(EntryKind::Ignored, rest)),
            other => {
                return Err(GitCacheError::parse(format!(
                    "unknown record type '{}'",
                    other
                )))
            }
        }
    }

    Ok(status)
}

fn parse_header(rest: &str, branch: &mut BranchInfo) -> GitCacheResult<()> {
    let (key, value) = rest.split_once(' ').unwrap_or((rest, ""));

    match key {
        "branch.oid" => {
            branch.oid = (value != "(initial)").then(|| value.to_string());
        }
        "branch.head" => {
            branch.head = (value != "(detached)").then(|| value.to_string());
        }
        "branch.upstream" => branch.upstream = Some(value.to_string()),
        "branch.ab" => {
            let (ahead, behind) = value
                .split_once(' ')
                .ok_or_else(|| GitCacheError::parse(format!("malformed branch.ab '{}'", value)))?;
            branch.ahead = parse_counter(ahead, '+')?;
            branch.behind = parse_counter(behind, '-')?;
        }
        // stash e headers futuros
        _ => {}
    }

    Ok(())
}

fn parse_counter(field: &str, sign: char) -> GitCacheResult<u32> {
    field
        .strip_prefix(sign)
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| GitCacheError::parse(format!("bad ahead/behind counter '{}'", field)))
}

fn parse_xy(field: &str) -> GitCacheResult<(FileState, FileState)> {
    let mut chars = field.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(x), Some(y), None) => Ok((FileState::from_char(x)?, FileState::from_char(y)?)),
        _ => Err(GitCacheError::parse(format!("bad XY field '{}'", field))),
    }
}

fn parse_submodule(field: &str) -> GitCacheResult<bool> {
    match field.chars().next() {
        Some('N') if field.len() == 4 => Ok(false),
        Some('S') if field.len() == 4 => Ok(true),
        _ => Err(GitCacheError::parse(format!("bad submodule field '{}'", field))),
    }
}

/// Divide em exatamente `n` campos; o último (caminho) pode conter espaços.
fn split_fields(rest: &str, n: usize) -> GitCacheResult<Vec<&str>> {
    let parts: Vec<&str> = rest.splitn(n, ' ').collect();
    if parts.len() != n || parts[n - 1].is_empty() {
        return Err(GitCacheError::parse(format!(
            "expected {} fields in '{}'",
            n, rest
        )));
    }
    Ok(parts)
}

fn parse_ordinary(rest: &str) -> GitCacheResult<StatusEntry> {
    // XY sub mH mI mW hH hI path
    let parts = split_fields(rest, 8)?;
    let (index, worktree) = parse_xy(parts[0])?;

    Ok(StatusEntry {
        kind: EntryKind::Ordinary,
        index,
        worktree,
        path: parts[7].to_string(),
        orig_path: None,
        submodule: parse_submodule(parts[1])?,
    })
}

fn parse_renamed(rest: &str) -> GitCacheResult<StatusEntry> {
    // XY sub mH mI mW hH hI Xscore path
    let parts = split_fields(rest, 9)?;
    let (index, worktree) = parse_xy(parts[0])?;

    let score = parts[7]
        .strip_prefix(['R', 'C'])
        .and_then(|n| n.parse::<u8>().ok())
        .filter(|n| *n <= 100)
        .ok_or_else(|| GitCacheError::parse(format!("bad rename score '{}'", parts[7])))?;

    Ok(StatusEntry {
        kind: EntryKind::RenamedOrCopied { score },
        index,
        worktree,
        path: parts[8].to_string(),
        orig_path: None,
        submodule: parse_submodule(parts[1])?,
    })
}

fn parse_unmerged(rest: &str) -> GitCacheResult<StatusEntry> {
    // XY sub m1 m2 m3 mW h1 h2 h3 path
    let parts = split_fields(rest, 10)?;
    let (index, worktree) = parse_xy(parts[0])?;

    Ok(StatusEntry {
        kind: EntryKind::Unmerged,
        index,
        worktree,
        path: parts[9].to_string(),
        orig_path: None,
        submodule: parse_submodule(parts[1])?,
    })
}

/// Parseia listas separadas por NUL (`git diff --name-only -z`).
pub fn parse_name_list(output: &str) -> Vec<String> {
    output
        .split('\0')
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const OID: &str = "1b2c3d4e5f60718293a4b5c6d7e8f90112233445";
    const HASH: &str = "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391";

    fn ordinary(xy: &str, path: &str) -> String {
        format!("1 {} N... 100644 100644 100644 {} {} {}", xy, HASH, HASH, path)
    }

    #[test]
    fn test_parse_branch_headers() {
        let output = format!(
            "# branch.oid {}\0# branch.head main\0# branch.upstream origin/main\0# branch.ab +2 -1\0",
            OID
        );

        let status = parse_status(&output).unwrap();

        assert_eq!(status.branch.oid.as_deref(), Some(OID));
        assert_eq!(status.branch.head.as_deref(), Some("main"));
        assert_eq!(status.branch.upstream.as_deref(), Some("origin/main"));
        assert_eq!(status.branch.ahead, 2);
        assert_eq!(status.branch.behind, 1);
        assert!(status.is_clean());
    }

    #[test]
    fn test_parse_initial_and_detached() {
        let status = parse_status("# branch.oid (initial)\0# branch.head master\0").unwrap();
        assert!(status.branch.oid.is_none());
        assert!(!status.branch.is_detached());

        let output = format!("# branch.oid {}\0# branch.head (detached)\0", OID);
        let status = parse_status(&output).unwrap();
        assert!(status.branch.head.is_none());
        assert!(status.branch.is_detached());
    }

    #[test]
    fn test_parse_ordinary_entries() {
        let output = format!(
            "{}\0{}\0",
            ordinary("M.", "src/lib.rs"),
            ordinary(".M", "docs/read me.md")
        );

        let status = parse_status(&output).unwrap();

        assert_eq!(status.entries.len(), 2);
        assert_eq!(status.entries[0].index, FileState::Modified);
        assert_eq!(status.entries[0].worktree, FileState::Unmodified);
        // Caminho com espaço
        assert_eq!(status.entries[1].path, "docs/read me.md");

        let staged: Vec<_> = status.staged().map(|e| e.path.as_str()).collect();
        let unstaged: Vec<_> = status.unstaged().map(|e| e.path.as_str()).collect();
        assert_eq!(staged, vec!["src/lib.rs"]);
        assert_eq!(unstaged, vec!["docs/read me.md"]);
        assert!(!status.is_clean());
    }

    #[test]
    fn test_parse_rename_consumes_orig_path() {
        let output = format!(
            "2 R. N... 100644 100644 100644 {} {} R87 new name.rs\0old.rs\0? notes.txt\0",
            HASH, HASH
        );

        let status = parse_status(&output).unwrap();

        assert_eq!(status.entries.len(), 2);
        let renamed = &status.entries[0];
        assert_eq!(renamed.kind, EntryKind::RenamedOrCopied { score: 87 });
        assert_eq!(renamed.path, "new name.rs");
        assert_eq!(renamed.orig_path.as_deref(), Some("old.rs"));
        assert_eq!(status.untracked().count(), 1);
    }

    #[test]
    fn test_parse_unmerged_and_ignored() {
        let output = format!(
            "u UU N... 100644 100644 100644 100644 {} {} {} conflict.rs\0! target/\0",
            HASH, HASH, HASH
        );

        let status = parse_status(&output).unwrap();

        let conflicted: Vec<_> = status.conflicted().map(|e| e.path.as_str()).collect();
        assert_eq!(conflicted, vec!["conflict.rs"]);
        assert_eq!(status.entries[1].kind, EntryKind::Ignored);
    }

    #[test]
    fn test_ignored_only_is_clean() {
        let status = parse_status("# branch.head main\0! target/\0").unwrap();
        assert!(status.is_clean());
    }

    #[test]
    fn test_submodule_flag() {
        let output = format!(
            "1 .M SC.. 160000 160000 160000 {} {} vendor/lib\0",
            HASH, HASH
        );

        let status = parse_status(&output).unwrap();
        assert!(status.entries[0].submodule);
    }

    #[test]
    fn test_unknown_headers_ignored() {
        let status = parse_status("# stash 3\0# branch.head main\0").unwrap();
        assert_eq!(status.branch.head.as_deref(), Some("main"));
    }

    #[test]
    fn test_rejects_invalid_input() {
        // Formato v1
        assert!(parse_status(" M src/lib.rs\0").is_err());
        assert!(parse_status("X something\0").is_err());
        assert!(parse_status("1 MZ N... 100644 100644 100644 a b path\0").is_err());
        assert!(parse_status("1 M. N... 100644\0").is_err());
        assert!(parse_status("# branch.ab 2 1\0").is_err());

        // Rename sem o caminho original
        let output = format!("2 R. N... 100644 100644 100644 {} {} R100 new.rs\0", HASH, HASH);
        assert!(parse_status(&output).is_err());
    }

    #[test]
    fn test_empty_output() {
        let status = parse_status("").unwrap();
        assert_eq!(status, GitStatus::default());
    }

    #[test]
    fn test_parse_name_list() {
        assert_eq!(
            parse_name_list("src/a.rs\0dir with space/b.rs\0"),
            vec!["src/a.rs", "dir with space/b.rs"]
        );
        assert!(parse_name_list("").is_empty());
    }
}
