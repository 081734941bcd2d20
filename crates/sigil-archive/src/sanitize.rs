use crate::error::{Error, Result};

/// Normalizes an entry name to its canonical `/`-separated form.
///
/// Rejects names that are empty, absolute, contain NUL, or walk out of the
/// archive root through `..`. A trailing `/` (directory marker) is kept.
pub fn normalize_entry_name(raw: &str) -> Result<String> {
    let invalid = |reason| Error::InvalidEntryName {
        name: raw.to_string(),
        reason,
    };

    if raw.is_empty() {
        return Err(invalid("empty name"));
    }
    if raw.contains('\0') {
        return Err(invalid("name contains NUL"));
    }

    let name = raw.replace('\\', "/");
    if name.starts_with('/') || has_drive_prefix(&name) {
        return Err(invalid("absolute path"));
    }

    let is_dir = name.ends_with('/');
    let mut parts = Vec::new();
    for part in name.split('/') {
        match part {
            "" | "." => {}
            ".." => return Err(invalid("parent directory component")),
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        return Err(invalid("no path components"));
    }

    let mut normalized = parts.join("/");
    if is_dir {
        normalized.push('/');
    }
    Ok(normalized)
}

/// Lookup key used for case-insensitive matching.
pub fn lookup_key(path: &str) -> String {
    path.replace('\\', "/").to_lowercase()
}

fn has_drive_prefix(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_pass_through() {
        assert_eq!(normalize_entry_name("a.txt").unwrap(), "a.txt");
        assert_eq!(normalize_entry_name("bin/tool").unwrap(), "bin/tool");
    }

    #[test]
    fn backslashes_and_dot_components_are_normalized() {
        assert_eq!(normalize_entry_name("Assets\\logo.png").unwrap(), "Assets/logo.png");
        assert_eq!(normalize_entry_name("./bin//tool").unwrap(), "bin/tool");
    }

    #[test]
    fn directory_marker_is_kept() {
        assert_eq!(normalize_entry_name("assets/").unwrap(), "assets/");
    }

    #[test]
    fn traversal_is_rejected() {
        assert!(matches!(
            normalize_entry_name("../etc/passwd"),
            Err(Error::InvalidEntryName { .. })
        ));
        assert!(matches!(
            normalize_entry_name("a/../../b"),
            Err(Error::InvalidEntryName { .. })
        ));
    }

    #[test]
    fn absolute_paths_are_rejected() {
        assert!(normalize_entry_name("/etc/passwd").is_err());
        assert!(normalize_entry_name("C:\\Windows\\win.ini").is_err());
    }

    #[test]
    fn degenerate_names_are_rejected() {
        assert!(normalize_entry_name("").is_err());
        assert!(normalize_entry_name("./").is_err());
        assert!(normalize_entry_name("a\0b").is_err());
    }

    #[test]
    fn lookup_key_folds_case_and_separators() {
        assert_eq!(lookup_key("Assets\\Logo.PNG"), "assets/logo.png");
        assert_eq!(lookup_key("a.txt"), lookup_key("A.TXT"));
    }
}
