use log::debug;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::Token;
use crate::error::{Error, Result};

/// Persists the last known token between invocations.
pub trait TokenStore: Send {
    /// Returns `Ok(None)` when no token has been stored yet.
    fn load(&self) -> Result<Option<Token>>;

    fn store(&mut self, token: &Token) -> Result<()>;
}

/// Token store backed by a JSON file, `~/.ws/identity` by default.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(default_token_path()?))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Get the path to the token file (~/.ws/identity)
pub fn default_token_path() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| Error::Config("Failed to determine home directory".to_string()))?;
    Ok(home.join(".ws").join("identity"))
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<Token>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No token file at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let token: Token = serde_json::from_str(&content)?;
        debug!("Loaded token from {}", self.path.display());
        Ok(Some(token))
    }

    fn store(&mut self, token: &Token) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            create_private_dir(parent)?;
        }

        let data = serde_json::to_vec(token)?;
        let mut file = open_private_file(&self.path)?;
        file.write_all(&data)?;

        debug!("Saved token to {}", self.path.display());
        Ok(())
    }
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn open_private_file(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private_file(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

/// Keeps at most one token for the lifetime of the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryTokenStore {
    token: Option<Token>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: Token) -> Self {
        Self { token: Some(token) }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<Token>> {
        Ok(self.token.clone())
    }

    fn store(&mut self, token: &Token) -> Result<()> {
        self.token = Some(token.clone());
        Ok(())
    }
}
