//! Session persistence between CLI invocations.
//!
//! The web product kept the token and last analysis id in browser
//! session storage; the CLI keeps the same two fields in a small JSON
//! file so consecutive commands share one session.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use verae_client::session::SessionState;

/// Resolve the session file location.
///
/// `VERAE_SESSION_FILE` wins; otherwise `~/.verae/session.json`, falling
/// back to the working directory when no home directory is known.
pub fn default_path() -> PathBuf {
    if let Ok(path) = std::env::var("VERAE_SESSION_FILE") {
        return PathBuf::from(path);
    }
    dirs::home_dir()
        .map(|home| home.join(".verae").join("session.json"))
        .unwrap_or_else(|| PathBuf::from(".verae-session.json"))
}

/// Load the persisted session, treating a missing or unreadable file as
/// an empty session rather than an error.
pub fn load(path: &Path) -> Result<SessionState> {
    if !path.exists() {
        return Ok(SessionState::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("read session file {}", path.display()))?;
    match serde_json::from_str(&content) {
        Ok(state) => Ok(state),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Session file unreadable; starting fresh");
            Ok(SessionState::default())
        }
    }
}

/// Write the session back to disk, creating parent directories as
/// needed.
pub fn save(path: &Path, state: &SessionState) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create session directory {}", parent.display()))?;
        }
    }
    let json = serde_json::to_string_pretty(state)?;
    fs::write(path, json).with_context(|| format!("write session file {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("verae-session-test-{name}-{}.json", std::process::id()))
    }

    #[test]
    fn round_trip() {
        let path = temp_path("round-trip");
        let state = SessionState {
            token: Some("tok".into()),
            last_analysis_id: Some("a-1".into()),
        };

        save(&path, &state).unwrap();
        let loaded = load(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.token.as_deref(), Some("tok"));
        assert_eq!(loaded.last_analysis_id.as_deref(), Some("a-1"));
    }

    #[test]
    fn missing_file_is_empty_session() {
        let loaded = load(Path::new("/nonexistent/verae-session.json")).unwrap();
        assert!(loaded.token.is_none());
        assert!(loaded.last_analysis_id.is_none());
    }

    #[test]
    fn corrupt_file_is_empty_session() {
        let path = temp_path("corrupt");
        fs::write(&path, "{not json").unwrap();

        let loaded = load(&path).unwrap();
        fs::remove_file(&path).ok();

        assert!(loaded.token.is_none());
    }
}
