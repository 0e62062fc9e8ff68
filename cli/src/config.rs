use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Overrides the platform data directory (handy for tests and multiple ledgers).
const DATA_DIR_ENV: &str = "MEALCOACH_DATA_DIR";

pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            return Self::at(Path::new(&dir));
        }
        let proj_dirs =
            ProjectDirs::from("", "", "mealcoach").context("Could not determine home directory")?;
        Self::at(proj_dirs.data_dir())
    }

    pub fn at(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        Ok(Config {
            db_path: data_dir.join("mealcoach.db"),
            data_dir: data_dir.to_path_buf(),
        })
    }

    /// Load the API key from disk, or generate and persist a new one.
    pub fn load_or_create_api_key(&self) -> Result<(String, bool)> {
        use rand::Rng;
        use std::fmt::Write;

        let path = self.data_dir.join("api_key");

        if path.exists() {
            let key = std::fs::read_to_string(&path).context("Failed to read API key file")?;
            let key = key.trim().to_string();
            if !key.is_empty() {
                return Ok((key, false));
            }
        }

        let bytes: [u8; 32] = rand::rng().random();
        let key = bytes
            .iter()
            .fold(String::with_capacity(64), |mut acc: String, b| {
                let _ = write!(acc, "{b:02x}");
                acc
            });
        std::fs::write(&path, &key).context("Failed to write API key file")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to set API key file permissions")?;
        }
        info!(path = %path.display(), "generated new API key");
        eprintln!("Generated new API key: {key}");
        eprintln!("Include in requests: Authorization: Bearer {key}");
        Ok((key, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_creates_data_dir() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("ledger");
        let config = Config::at(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(config.db_path, dir.join("mealcoach.db"));
        assert_eq!(config.data_dir, dir);
    }

    #[test]
    fn test_api_key_generated_once() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = Config::at(tmp.path()).unwrap();

        let (key, created) = config.load_or_create_api_key().unwrap();
        assert!(created);
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));

        let (again, created) = config.load_or_create_api_key().unwrap();
        assert!(!created);
        assert_eq!(again, key);
    }

    #[cfg(unix)]
    #[test]
    fn test_api_key_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::TempDir::new().unwrap();
        let config = Config::at(tmp.path()).unwrap();
        config.load_or_create_api_key().unwrap();
        let mode = std::fs::metadata(tmp.path().join("api_key"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_blank_api_key_file_is_regenerated() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("api_key"), "  \n").unwrap();
        let config = Config::at(tmp.path()).unwrap();
        let (key, created) = config.load_or_create_api_key().unwrap();
        assert!(created);
        assert_eq!(key.len(), 64);
    }
}
