use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// USDA's shared, heavily rate-limited key. Good enough for occasional scans.
pub const USDA_DEMO_KEY: &str = "DEMO_KEY";
const USDA_KEY_ENV: &str = "USDA_API_KEY";
const USDA_KEY_FILE: &str = "usda_api_key";
const SERVER_KEY_FILE: &str = "api_key";

pub struct Config {
    pub data_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "diabeat").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        Ok(Config { data_dir })
    }

    /// USDA FoodData Central key: `USDA_API_KEY`, then the `usda_api_key`
    /// file in the data directory, then the public demo key.
    pub fn usda_api_key(&self) -> Result<String> {
        let from_env = std::env::var(USDA_KEY_ENV).ok();
        resolve_usda_key(from_env, &self.data_dir)
    }

    /// Load the server API key from disk, or generate one on first run.
    pub fn load_or_create_api_key(&self) -> Result<String> {
        load_or_create_key(&self.data_dir.join(SERVER_KEY_FILE))
    }
}

fn resolve_usda_key(from_env: Option<String>, data_dir: &Path) -> Result<String> {
    if let Some(key) = from_env.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()) {
        return Ok(key);
    }

    let path = data_dir.join(USDA_KEY_FILE);
    if path.exists() {
        let key = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let key = key.trim();
        if !key.is_empty() {
            return Ok(key.to_string());
        }
    }

    tracing::debug!("no USDA API key configured; using {USDA_DEMO_KEY}");
    Ok(USDA_DEMO_KEY.to_string())
}

fn load_or_create_key(path: &Path) -> Result<String> {
    use rand::Rng;
    use std::fmt::Write;

    if path.exists() {
        let key = std::fs::read_to_string(path).context("Failed to read API key file")?;
        let key = key.trim().to_string();
        if !key.is_empty() {
            return Ok(key);
        }
    }

    let bytes: [u8; 32] = rand::rng().random();
    let key = bytes
        .iter()
        .fold(String::with_capacity(64), |mut acc: String, b| {
            let _ = write!(acc, "{b:02x}");
            acc
        });
    std::fs::write(path, &key).context("Failed to write API key file")?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .context("Failed to set API key file permissions")?;
    }
    eprintln!("Generated new API key: {key}");
    eprintln!("Include in requests: Authorization: Bearer {key}");
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usda_key_prefers_env() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(USDA_KEY_FILE), "from-file").unwrap();
        let key = resolve_usda_key(Some("from-env".to_string()), dir.path()).unwrap();
        assert_eq!(key, "from-env");
    }

    #[test]
    fn usda_key_falls_back_to_file_then_demo() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_usda_key(None, dir.path()).unwrap(), USDA_DEMO_KEY);
        assert_eq!(
            resolve_usda_key(Some("  ".to_string()), dir.path()).unwrap(),
            USDA_DEMO_KEY
        );

        std::fs::write(dir.path().join(USDA_KEY_FILE), "  from-file\n").unwrap();
        assert_eq!(resolve_usda_key(None, dir.path()).unwrap(), "from-file");
    }

    #[test]
    fn api_key_is_generated_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SERVER_KEY_FILE);

        assert!(!path.exists());
        let key = load_or_create_key(&path).unwrap();
        assert!(path.exists());
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));

        let again = load_or_create_key(&path).unwrap();
        assert_eq!(again, key);
    }

    #[cfg(unix)]
    #[test]
    fn api_key_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SERVER_KEY_FILE);
        load_or_create_key(&path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
