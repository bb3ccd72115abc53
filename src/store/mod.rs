//! Key-value persistence for unparsed fetched pages, keyed by course identifier.

pub mod dir;
#[cfg(test)]
pub mod memory;
pub mod sqlite;

use crate::error::StoreError;

pub use dir::DirStore;
#[cfg(test)]
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Raw page storage. Implementations must tolerate concurrent readers and a
/// single writer per key without external locking.
pub trait RawStore: Send + Sync {
    /// Store (or replace) the page for `identifier`. Readers never see a partial body.
    fn put(&self, identifier: &str, body: &str) -> Result<(), StoreError>;

    fn get(&self, identifier: &str) -> Result<Option<String>, StoreError>;

    /// Every stored identifier, sorted.
    fn list(&self) -> Result<Vec<String>, StoreError>;
}

/// Escape an identifier into a single filesystem-safe path component.
/// `%` is escaped too so that `unescape_key` is an exact inverse, and a leading
/// `.` so that no key is a hidden file.
pub fn escape_key(identifier: &str) -> String {
    let mut out = String::with_capacity(identifier.len());
    for (i, c) in identifier.chars().enumerate() {
        match c {
            '.' if i == 0 => out.push_str("%2E"),
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            '\\' => out.push_str("%5C"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverse `escape_key`. Returns `None` for anything `escape_key` would not
/// produce: unknown or lowercase codes, or `%2E` past the first position.
pub fn unescape_key(key: &str) -> Option<String> {
    let mut out = String::with_capacity(key.len());
    let mut rest = key;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let code = rest.get(pos + 1..pos + 3)?;
        match code {
            "2E" if out.is_empty() && pos == 0 => out.push('.'),
            "25" => out.push('%'),
            "2F" => out.push('/'),
            "5C" => out.push('\\'),
            _ => return None,
        }
        rest = &rest[pos + 3..];
    }
    out.push_str(rest);
    Some(out)
}

// ── Tests ──
