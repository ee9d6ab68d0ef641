//! Chave de cache derivada do comando e do diretório de trabalho.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hash SHA256 (hex) dos argumentos do comando + diretório de trabalho.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Calcula o fingerprint.
    ///
    /// O número de argumentos entra no hash para que `["a b"]` e `["a", "b"]`
    /// nunca colidam. O diretório entra com os bytes crus do caminho, sem
    /// conversão para UTF-8.
    pub fn from_parts<S: AsRef<str>>(args: &[S], cwd: &Path) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((args.len() as u64).to_le_bytes());
        for arg in args {
            hasher.update(arg.as_ref().as_bytes());
            hasher.update([0u8]);
        }
        hasher.update(cwd.as_os_str().as_encoded_bytes());

        Self(hex::encode(hasher.finalize()))
    }

    /// Representação hexadecimal completa.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefixo curto para logs.
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_command_same_key() {
        let a = Fingerprint::from_parts(&["status", "-z"], Path::new("/repo"));
        let b = Fingerprint::from_parts(&["status", "-z"], Path::new("/repo"));

        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_different_cwd_different_key() {
        let a = Fingerprint::from_parts(&["status"], Path::new("/repo-a"));
        let b = Fingerprint::from_parts(&["status"], Path::new("/repo-b"));

        assert_ne!(a, b);
    }

    #[test]
    fn test_argument_boundaries() {
        let joined = Fingerprint::from_parts(&["log -n"], Path::new("/repo"));
        let split = Fingerprint::from_parts(&["log", "-n"], Path::new("/repo"));

        assert_ne!(joined, split);
    }

    #[test]
    fn test_short() {
        let fp = Fingerprint::from_parts(&["status"], Path::new("/repo"));
        assert_eq!(fp.short().len(), 12);
        assert!(fp.as_str().starts_with(fp.short()));
    }

    #[test]
    fn test_short_on_deserialized_value() {
        let fp: Fingerprint = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(fp.short(), "abc");

        let empty: Fingerprint = serde_json::from_str("\"\"").unwrap();
        assert_eq!(empty.short(), "");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_directories_keep_distinct_keys() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let a = Path::new(OsStr::from_bytes(b"/tmp/repo-\xff"));
        let b = Path::new(OsStr::from_bytes(b"/tmp/repo-\xfe"));

        assert_ne!(
            Fingerprint::from_parts(&["status"], a),
            Fingerprint::from_parts(&["status"], b)
        );
    }
}
