//! Directory name parsing and name normalization

use regex_lite::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Version reported when a directory name carries no `[v.X]` tag
pub const UNKNOWN_VERSION: &str = "Unknown";

const VERSION_MARKER: &str = "[v.";
const MOD_MARKER: &str = "[MOD]";
const SPECIAL_CHARS: &[char] = &['/', '\\', '?', '%', '*', ':', '|', '"', '<', '>'];

fn tag_regex() -> &'static Regex {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    TAG_RE.get_or_init(|| Regex::new(r"\[[^\]]*\]").expect("tag pattern is valid"))
}

/// Facts derived from a local game directory name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirInfo {
    pub path: PathBuf,
    pub name: String,
    pub version: String,
    pub is_mod: bool,
}

/// Parse a game directory into name, version and mod flag.
///
/// Uses the last path component; never fails.
pub fn parse_dir_name(path: &Path) -> DirInfo {
    let raw = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());

    DirInfo {
        path: path.to_path_buf(),
        name: clean_name(&raw),
        version: extract_version(&raw),
        is_mod: raw.to_ascii_uppercase().contains(MOD_MARKER),
    }
}

/// Text between a case-insensitive `[v.` and the next `]`.
///
/// An unterminated tag yields the remainder of the name.
pub fn extract_version(raw: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `raw`
    let lowered = raw.to_ascii_lowercase();
    let Some(marker) = lowered.find(VERSION_MARKER) else {
        return UNKNOWN_VERSION.to_string();
    };

    let rest = &raw[marker + VERSION_MARKER.len()..];
    let version = match rest.find(']') {
        Some(end) => &rest[..end],
        None => rest,
    };
    version.trim().to_string()
}

/// Drop `[...]` tags and filesystem-special characters, then trim.
pub fn clean_name(raw: &str) -> String {
    let untagged = tag_regex().replace_all(raw, "");
    untagged
        .chars()
        .filter(|c| !SPECIAL_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Duplicate-detection key: cleaned and case-folded.
pub fn normalize_name(name: &str) -> String {
    clean_name(name).to_uppercase()
}
