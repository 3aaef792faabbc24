//! Filename validation, sanitisation and collision-free naming.
//!
//! Hostile characters are control characters and any of `< > : " | ? *`. They are
//! replaced with `_` rather than rejected, so [`sanitize`] always yields a name that
//! passes [`validate`].
//!
//! When a name is already taken in the destination, [`resolve_unique`] derives
//! `base_<millis><ext>` and, if that is taken too, `base_<millis>_<n><ext>` with `n`
//! counting up from 1. Existing entries are never reused.

use crate::store::DestinationStore;
use crate::{FilesError, FilesResult};
use chrono::Utc;

const HOSTILE_CHARS: [char; 7] = ['<', '>', ':', '"', '|', '?', '*'];

fn is_hostile(c: char) -> bool {
    c.is_control() || HOSTILE_CHARS.contains(&c)
}

/// Returns true if `name` contains no hostile characters.
pub fn validate(name: &str) -> bool {
    !name.chars().any(is_hostile)
}

/// Replaces every hostile character with `_`.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if is_hostile(c) { '_' } else { c })
        .collect()
}

/// Checks that `name` is a single flat path component.
///
/// # Errors
///
/// Returns [`FilesError::NameInvalid`] for empty names, `.`/`..`, or names containing a
/// path separator.
pub fn check_flat(name: &str) -> FilesResult<()> {
    if name.trim().is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(FilesError::NameInvalid(name.to_owned()));
    }
    Ok(())
}

/// Splits `name` into its base and its extension including the dot.
///
/// A leading dot does not start an extension, so `.env` has none.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Appends `.{extension}` when `name` has no extension of its own.
pub fn ensure_extension(name: &str, extension: Option<&str>) -> String {
    let (_, current) = split_extension(name);
    match extension.map(|e| e.trim_start_matches('.')) {
        Some(ext) if current.is_empty() && !ext.is_empty() => format!("{}.{}", name, ext),
        _ => name.to_owned(),
    }
}

/// Turns a requested name into a storable one: extension restored, then sanitised if needed.
///
/// The extension hint comes from client metadata or the original name, so it is checked
/// along with the rest of the name.
pub fn prepare_target_name(requested: &str, extension: Option<&str>) -> String {
    let name = ensure_extension(requested, extension);
    if validate(&name) {
        name
    } else {
        sanitize(&name)
    }
}

/// Returns `proposed` if it is free in `store`, else a derived name that is free.
pub fn resolve_unique<S: DestinationStore + ?Sized>(proposed: &str, store: &S) -> String {
    resolve_unique_at(proposed, store, Utc::now().timestamp_millis())
}

/// [`resolve_unique`] with an explicit timestamp suffix.
pub fn resolve_unique_at<S: DestinationStore + ?Sized>(
    proposed: &str,
    store: &S,
    timestamp_millis: i64,
) -> String {
    if !store.exists(proposed) {
        return proposed.to_owned();
    }

    let (base, ext) = split_extension(proposed);
    let stamped = format!("{}_{}{}", base, timestamp_millis, ext);
    if !store.exists(&stamped) {
        return stamped;
    }

    (1u64..)
        .map(|counter| format!("{}_{}_{}{}", base, timestamp_millis, counter, ext))
        .find(|candidate| !store.exists(candidate))
        .unwrap_or(stamped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_validate_rejects_hostile_characters() {
        assert!(validate("report-2024 (final).pdf"));
        for bad in ["a<b", "a>b", "a:b", "a\"b", "a|b", "a?b", "a*b", "a\nb", "a\u{0}b"] {
            assert!(!validate(bad), "{:?} should be invalid", bad);
        }
    }

    #[test]
    fn test_sanitize_replaces_each_hostile_character() {
        assert_eq!(sanitize("what?*.txt"), "what__.txt");
        assert_eq!(sanitize("tab\there.md"), "tab_here.md");
        assert_eq!(sanitize("plain.txt"), "plain.txt");
    }

    #[test]
    fn test_sanitize_is_idempotent_and_valid() {
        let inputs = ["<<>>", "a:b|c", "\u{7}bell", "ok.txt", "", "名前?.txt"];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once);
            assert!(validate(&once));
        }
    }

    #[test]
    fn test_check_flat() {
        assert!(check_flat("a.txt").is_ok());
        assert!(check_flat(".env").is_ok());
        for bad in ["", "  ", ".", "..", "../a.txt", "dir/a.txt", "dir\\a.txt"] {
            assert!(matches!(check_flat(bad), Err(FilesError::NameInvalid(_))));
        }
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("a.txt"), ("a", ".txt"));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_extension(".env"), (".env", ""));
        assert_eq!(split_extension("README"), ("README", ""));
    }

    #[test]
    fn test_ensure_extension() {
        assert_eq!(ensure_extension("holiday", Some("jpg")), "holiday.jpg");
        assert_eq!(ensure_extension("holiday", Some(".jpg")), "holiday.jpg");
        assert_eq!(ensure_extension("holiday.png", Some("jpg")), "holiday.png");
        assert_eq!(ensure_extension("holiday", None), "holiday");
        assert_eq!(ensure_extension("holiday", Some("")), "holiday");
    }

    #[test]
    fn test_prepare_target_name() {
        assert_eq!(prepare_target_name("q3:summary", Some("xlsx")), "q3_summary.xlsx");
        assert_eq!(prepare_target_name("fine.csv", Some("csv")), "fine.csv");
    }

    #[test]
    fn test_prepare_target_name_sanitises_extension_hint() {
        let prepared = prepare_target_name("report", Some("p?n:g"));
        assert_eq!(prepared, "report.p_n_g");
        assert!(validate(&prepared));

        let prepared = prepare_target_name("b", Some("t\nxt"));
        assert_eq!(prepared, "b.t_xt");
        assert!(validate(&prepared));
    }

    #[test]
    fn test_resolve_unique_returns_free_name_unchanged() {
        let store = MemoryStore::new();
        assert_eq!(resolve_unique("a.txt", &store), "a.txt");
    }

    #[test]
    fn test_resolve_unique_appends_timestamp() {
        let store = MemoryStore::new();
        store.insert("a.txt", b"x".to_vec());
        assert_eq!(resolve_unique_at("a.txt", &store, 1700), "a_1700.txt");
    }

    #[test]
    fn test_resolve_unique_falls_back_to_counter() {
        let store = MemoryStore::new();
        store.insert("a.txt", b"x".to_vec());
        store.insert("a_1700.txt", b"y".to_vec());
        store.insert("a_1700_1.txt", b"z".to_vec());
        assert_eq!(resolve_unique_at("a.txt", &store, 1700), "a_1700_2.txt");
    }

    #[test]
    fn test_resolve_unique_never_repeats_in_growing_directory() {
        let store = MemoryStore::new();
        store.insert("a.txt", b"seed".to_vec());

        let mut seen = std::collections::HashSet::new();
        for i in 0..25 {
            let name = resolve_unique_at("a.txt", &store, 42);
            assert!(!store.exists(&name));
            assert!(seen.insert(name.clone()));
            store.insert(&name, vec![i]);
        }
    }

    #[test]
    fn test_resolve_unique_without_extension() {
        let store = MemoryStore::new();
        store.insert("Makefile", vec![]);
        assert_eq!(resolve_unique_at("Makefile", &store, 9), "Makefile_9");
    }
}
