//! Reading [`RelayConfig`] from a TOML file.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::domain::{ConfigError, RelayConfig};

impl RelayConfig {
    /// Loads and validates a configuration file.
    ///
    /// Fields missing from the file take their defaults.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Io`] if the file cannot be read.
    /// - [`ConfigError::Parse`] if it is not valid TOML for this schema.
    /// - [`ConfigError::Invalid`] if a value fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        config.validate()?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("ras-relay-{}-{name}", std::process::id()));
        fs::write(&path, contents).expect("temp dir is writable");
        path
    }

    #[test]
    fn test_load_reads_and_validates_file() {
        // Arrange
        let path = temp_file("ok.toml", "ws_path = \"/ras\"\n[session]\nclose_deadline_ms = 250\n");

        // Act
        let cfg = RelayConfig::load(&path).expect("valid file");

        // Assert
        assert_eq!(cfg.ws_path, "/ras");
        assert_eq!(cfg.session.close_deadline_ms, 250);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("ras-relay-definitely-missing.toml");
        assert!(matches!(RelayConfig::load(&path), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let path = temp_file("bad.toml", "[session]\nqueue_capacity = 0\n");
        assert!(matches!(
            RelayConfig::load(&path),
            Err(ConfigError::Invalid { .. })
        ));
        let _ = fs::remove_file(path);
    }
}
