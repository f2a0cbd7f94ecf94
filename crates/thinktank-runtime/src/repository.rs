//! Personality repository - where debaters come from

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use thinktank_core::Personality;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Already exists: {0}")]
    AlreadyExists(String),
}

impl RepositoryError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Source of personalities, looked up case-insensitively
#[async_trait]
pub trait PersonalityRepository: Send + Sync + Debug {
    /// Get the repository name
    fn name(&self) -> &str;

    /// Find a personality by name, ignoring case
    async fn get(&self, name: &str) -> Result<Option<Personality>, RepositoryError>;

    /// Lowercase keys, in order
    async fn list(&self) -> Result<Vec<String>, RepositoryError>;

    /// Store a new personality. Names must be unique ignoring case.
    async fn add(&self, personality: Personality) -> Result<(), RepositoryError>;

    /// Every personality, in `list` order
    async fn all(&self) -> Result<Vec<Personality>, RepositoryError> {
        let mut personalities = Vec::new();
        for name in self.list().await? {
            if let Some(personality) = self.get(&name).await? {
                personalities.push(personality);
            }
        }
        Ok(personalities)
    }
}

/// In-memory repository (for testing and embedding)
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    personalities: RwLock<BTreeMap<String, Personality>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with personalities; a later duplicate replaces an earlier one
    pub fn with_personalities(personalities: impl IntoIterator<Item = Personality>) -> Self {
        let map = personalities.into_iter().map(|p| (p.key(), p)).collect();
        Self {
            personalities: RwLock::new(map),
        }
    }

    async fn contains(&self, key: &str) -> bool {
        self.personalities.read().await.contains_key(key)
    }

    async fn insert(&self, personality: Personality) {
        self.personalities
            .write()
            .await
            .insert(personality.key(), personality);
    }
}

#[async_trait]
impl PersonalityRepository for InMemoryRepository {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, name: &str) -> Result<Option<Personality>, RepositoryError> {
        Ok(self
            .personalities
            .read()
            .await
            .get(&name.to_lowercase())
            .cloned())
    }

    async fn list(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(self
            .personalities
            .read()
            .await
            .keys()
            .cloned()
            .collect())
    }

    async fn add(&self, personality: Personality) -> Result<(), RepositoryError> {
        let key = personality.key();
        if self.contains(&key).await {
            return Err(RepositoryError::AlreadyExists(personality.name));
        }
        self.insert(personality).await;
        Ok(())
    }
}

/// Directory of `<name>.json` files, cached in memory after loading
#[derive(Debug)]
pub struct JsonDirectoryRepository {
    dir: PathBuf,
    cache: InMemoryRepository,
}

impl JsonDirectoryRepository {
    /// Load every `*.json` file in `dir`, creating the directory if needed.
    ///
    /// Files that cannot be read or parsed are logged and skipped.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| RepositoryError::io(&dir, e))?;

        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| RepositoryError::io(&dir, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RepositoryError::io(&dir, e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let cache = InMemoryRepository::new();
        for path in paths {
            match Self::load_file(&path).await {
                Ok(personality) => {
                    if cache.contains(&personality.key()).await {
                        tracing::warn!(
                            path = %path.display(),
                            name = %personality.name,
                            "Duplicate personality, skipping"
                        );
                        continue;
                    }
                    tracing::debug!(path = %path.display(), name = %personality.name, "Loaded personality");
                    cache.insert(personality).await;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable personality file");
                }
            }
        }

        tracing::info!(
            dir = %dir.display(),
            count = cache.personalities.read().await.len(),
            "Personality repository opened"
        );
        Ok(Self { dir, cache })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn load_file(path: &Path) -> Result<Personality, RepositoryError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| RepositoryError::io(path, e))?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[async_trait]
impl PersonalityRepository for JsonDirectoryRepository {
    fn name(&self) -> &str {
        "json-directory"
    }

    async fn get(&self, name: &str) -> Result<Option<Personality>, RepositoryError> {
        self.cache.get(name).await
    }

    async fn list(&self) -> Result<Vec<String>, RepositoryError> {
        self.cache.list().await
    }

    async fn add(&self, personality: Personality) -> Result<(), RepositoryError> {
        let key = personality.key();
        if self.cache.contains(&key).await {
            return Err(RepositoryError::AlreadyExists(personality.name));
        }

        let path = self.dir.join(format!("{}.json", key));
        let json = serde_json::to_string_pretty(&personality)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| RepositoryError::io(&path, e))?;

        tracing::info!(path = %path.display(), name = %personality.name, "Personality saved");
        self.cache.insert(personality).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn personality(name: &str) -> Personality {
        Personality::new(name, "A thinker", "Think.")
    }

    #[tokio::test]
    async fn test_memory_repository() {
        let repo = InMemoryRepository::with_personalities([personality("Socrates"), personality("Aristotle")]);

        assert_eq!(repo.get("SOCRATES").await.unwrap().unwrap().name, "Socrates");
        assert!(repo.get("plato").await.unwrap().is_none());
        assert_eq!(repo.list().await.unwrap(), vec!["aristotle", "socrates"]);

        repo.add(personality("Plato")).await.unwrap();
        assert_eq!(repo.all().await.unwrap().len(), 3);

        let duplicate = repo.add(personality("plato")).await;
        assert!(matches!(duplicate, Err(RepositoryError::AlreadyExists(name)) if name == "plato"));
    }

    #[tokio::test]
    async fn test_json_directory_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonDirectoryRepository::open(dir.path()).await.unwrap();
        assert!(repo.list().await.unwrap().is_empty());

        repo.add(personality("Hypatia")).await.unwrap();
        assert!(dir.path().join("hypatia.json").exists());

        let reopened = JsonDirectoryRepository::open(dir.path()).await.unwrap();
        let loaded = reopened.get("hypatia").await.unwrap().unwrap();
        assert_eq!(loaded, personality("Hypatia"));
    }

    #[tokio::test]
    async fn test_json_directory_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::write(
            dir.path().join("kant.json"),
            r#"{"name": "Kant", "description": "Critic", "system_prompt": "Reason.", "core_beliefs": null}"#,
        )
        .unwrap();

        let repo = JsonDirectoryRepository::open(dir.path()).await.unwrap();
        assert_eq!(repo.list().await.unwrap(), vec!["kant"]);
    }

    #[tokio::test]
    async fn test_json_directory_created_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("personalities");

        let repo = JsonDirectoryRepository::open(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert_eq!(repo.dir(), nested.as_path());
    }
}
