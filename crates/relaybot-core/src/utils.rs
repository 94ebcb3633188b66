//! Small shared helpers.

use std::path::PathBuf;

/// Root data directory: `~/.relaybot`.
pub fn get_data_path() -> PathBuf {
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".relaybot")
}

/// Truncate a string to `max_len` characters, appending `...` if cut.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Expand `~` to the home directory in a path string.
pub fn expand_home(path: &str) -> PathBuf {
    if path.starts_with("~/") || path == "~" {
        let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
        if path == "~" {
            home
        } else {
            home.join(&path[2..])
        }
    } else {
        PathBuf::from(path)
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("USERPROFILE").ok().map(PathBuf::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate_string("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_long_string() {
        let result = truncate_string("hello world, this is a long string", 15);
        assert_eq!(result, "hello world,...");
    }

    #[test]
    fn test_truncate_unicode() {
        assert_eq!(truncate_string("こんにちは世界です", 5), "こん...");
    }

    #[test]
    fn test_expand_home_tilde() {
        let expanded = expand_home("~/test/path");
        assert!(!expanded.starts_with("~"));
        assert!(expanded.to_str().unwrap().ends_with("test/path"));
    }

    #[test]
    fn test_expand_home_absolute() {
        assert_eq!(expand_home("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_data_path_ends_with_relaybot() {
        assert!(get_data_path().ends_with(".relaybot"));
    }
}
