//! File utility functions

use std::path::PathBuf;

/// Expand a user-supplied path to an absolute path.
///
/// - `~` and `~/rest` resolve against the home directory
/// - relative paths resolve against the current directory
/// - absolute paths pass through unchanged
///
/// ```text
/// expand_path("~/.advisor-search/rules.json") // -> /home/user/.advisor-search/rules.json
/// expand_path("rules.json")                   // -> /current/dir/rules.json
/// expand_path("/etc/advisor/rules.json")      // -> /etc/advisor/rules.json
/// ```
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();

    if path.is_empty() {
        return std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    }

    let expanded = match path.strip_prefix('~') {
        Some("") => dirs::home_dir().unwrap_or_else(|| PathBuf::from(path)),
        Some(rest) if rest.starts_with('/') || rest.starts_with('\\') => dirs::home_dir()
            .map(|home| home.join(&rest[1..]))
            .unwrap_or_else(|| PathBuf::from(path)),
        _ => PathBuf::from(path),
    };

    if expanded.is_relative() {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    } else {
        expanded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_path_absolute_unix() {
        assert_eq!(
            expand_path("/etc/advisor/rules.json"),
            PathBuf::from("/etc/advisor/rules.json")
        );
    }

    #[test]
    fn test_expand_path_relative() {
        let result = expand_path("rules.json");
        assert!(result.is_absolute());
        assert_eq!(result, std::env::current_dir().unwrap().join("rules.json"));
    }

    #[test]
    fn test_expand_path_trims_whitespace() {
        assert_eq!(expand_path("  /tmp/x.json "), PathBuf::from("/tmp/x.json"));
    }

    #[test]
    fn test_expand_path_empty_is_cwd() {
        assert_eq!(expand_path(""), std::env::current_dir().unwrap());
    }

    #[test]
    fn test_expand_path_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~"), home);
            assert_eq!(
                expand_path("~/.advisor-search/rules.json"),
                home.join(".advisor-search/rules.json")
            );
        }
    }

    #[test]
    fn test_expand_path_tilde_user_not_expanded() {
        // `~bob` is a relative name, not another user's home
        let result = expand_path("~bob/rules.json");
        assert!(result.ends_with("~bob/rules.json"));
    }
}
