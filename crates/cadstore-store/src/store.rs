//! Filesystem model store

use cadstore_core::{
    has_allowed_extension, sanitize_filename, CadstoreError, CadstoreResult, StorageConfig,
};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tracing::{debug, info, warn};

/// A model file held in the storage directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredModel {
    /// Sanitized filename
    pub name: String,
    /// Full path inside the storage directory
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
}

/// A sanitized filename that passed upload validation
///
/// Only [`ModelStore::upload_name`] produces one, so [`ModelStore::save`]
/// never writes an unchecked name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadName(String);

impl UploadName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for UploadName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Model store rooted at a single directory
///
/// Files are stored flat under the storage directory using their sanitized
/// name. Writing an existing name overwrites it.
#[derive(Debug, Clone)]
pub struct ModelStore {
    config: StorageConfig,
}

impl ModelStore {
    /// Create a new model store
    ///
    /// The configuration is validated, so an allow-list given as `["STL"]`
    /// matches `cube.stl`.
    pub fn new(config: StorageConfig) -> CadstoreResult<Self> {
        Ok(Self {
            config: config.validate()?,
        })
    }

    /// Storage configuration in use
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Base path of the storage directory
    pub fn base_path(&self) -> &Path {
        &self.config.path
    }

    /// Initialize the store, creating the storage directory if absent
    pub async fn init(&self) -> CadstoreResult<()> {
        if !self.config.path.exists() {
            tokio::fs::create_dir_all(&self.config.path).await?;
            info!(path = %self.config.path.display(), "Created model storage directory");
        } else {
            debug!(path = %self.config.path.display(), "Using existing model storage directory");
        }
        Ok(())
    }

    /// Validate an uploaded filename and return the name it will be stored under
    pub fn upload_name(&self, raw_name: &str) -> CadstoreResult<UploadName> {
        let result = self.check_upload_name(raw_name);
        if let Err(e) = &result {
            warn!(filename = %raw_name, error = %e, "Rejected upload");
        }
        result
    }

    fn check_upload_name(&self, raw_name: &str) -> CadstoreResult<UploadName> {
        if raw_name.is_empty() {
            return Err(CadstoreError::EmptyFilename);
        }

        if !has_allowed_extension(raw_name, &self.config.allowed_extensions) {
            return Err(CadstoreError::ExtensionNotAllowed);
        }

        let name = sanitize_filename(raw_name).ok_or(CadstoreError::InvalidFilename)?;

        // Sanitizing can eat the dot, e.g. "x/.stl" becomes "stl"
        if !has_allowed_extension(&name, &self.config.allowed_extensions) {
            return Err(CadstoreError::ExtensionNotAllowed);
        }

        Ok(UploadName(name))
    }

    /// Save an uploaded model, overwriting any model with the same name
    pub async fn save(&self, name: &UploadName, content: &[u8]) -> CadstoreResult<StoredModel> {
        let size = content.len() as u64;
        if size > self.config.max_upload_size {
            return Err(CadstoreError::PayloadTooLarge {
                max_bytes: self.config.max_upload_size,
            });
        }

        let path = self.config.path.join(name.as_str());
        tokio::fs::write(&path, content).await?;

        info!(filename = %name.as_str(), size = size, "Stored model");

        Ok(StoredModel {
            name: name.as_str().to_string(),
            path,
            size,
        })
    }

    /// Resolve a requested name to a stored model path
    ///
    /// Names that sanitize to nothing or are not allow-listed are reported as
    /// not found; nothing outside the allow-list is ever served.
    pub fn resolve(&self, raw_name: &str) -> CadstoreResult<(String, PathBuf)> {
        let name = sanitize_filename(raw_name)
            .filter(|name| has_allowed_extension(name, &self.config.allowed_extensions))
            .ok_or_else(|| CadstoreError::ModelNotFound(raw_name.to_string()))?;
        let path = self.config.path.join(&name);
        Ok((name, path))
    }

    /// Open a stored model for reading
    ///
    /// The returned file handle is owned by the caller and closed on drop.
    pub async fn open(&self, raw_name: &str) -> CadstoreResult<(StoredModel, File)> {
        let (name, path) = self.resolve(raw_name)?;
        let not_found = |e: io::Error| {
            if e.kind() == io::ErrorKind::NotFound {
                CadstoreError::ModelNotFound(name.clone())
            } else {
                CadstoreError::Io(e)
            }
        };

        let metadata = tokio::fs::metadata(&path).await.map_err(not_found)?;
        if !metadata.is_file() {
            return Err(CadstoreError::ModelNotFound(name.clone()));
        }

        let file = File::open(&path).await.map_err(not_found)?;

        debug!(filename = %name, size = metadata.len(), "Opened model");

        Ok((
            StoredModel {
                name,
                path,
                size: metadata.len(),
            },
            file,
        ))
    }

    /// List the names of stored models
    ///
    /// Only regular files with an allowed extension directly inside the
    /// storage directory are listed. Names are sorted.
    pub async fn list(&self) -> CadstoreResult<Vec<String>> {
        let mut models = Vec::new();

        if !self.config.path.exists() {
            return Ok(models);
        }

        let mut entries = tokio::fs::read_dir(&self.config.path).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if has_allowed_extension(&name, &self.config.allowed_extensions) {
                models.push(name);
            }
        }

        models.sort();
        Ok(models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    fn test_store(dir: &TempDir) -> ModelStore {
        ModelStore::new(StorageConfig::with_path(dir.path().join("uploads"))).unwrap()
    }

    async fn save(store: &ModelStore, raw_name: &str, content: &[u8]) -> CadstoreResult<StoredModel> {
        let name = store.upload_name(raw_name)?;
        store.save(&name, content).await
    }

    async fn read_all(mut file: File) -> Vec<u8> {
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).await.unwrap();
        buf
    }

    #[tokio::test]
    async fn test_init_creates_directory() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        assert!(!store.base_path().exists());

        store.init().await.unwrap();
        assert!(store.base_path().is_dir());

        // Idempotent
        store.init().await.unwrap();
    }

    #[test]
    fn test_new_validates_config() {
        let dir = TempDir::new().unwrap();
        let mut config = StorageConfig::with_path(dir.path());
        config.allowed_extensions = vec!["STL".to_string()];
        let store = ModelStore::new(config).unwrap();
        assert_eq!(store.config().allowed_extensions, vec!["stl"]);
        assert_eq!(store.upload_name("cube.stl").unwrap().as_str(), "cube.stl");

        let mut config = StorageConfig::with_path(dir.path());
        config.max_upload_size = 0;
        assert!(matches!(ModelStore::new(config), Err(CadstoreError::Config(_))));
    }

    #[tokio::test]
    async fn test_save_and_open() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        store.init().await.unwrap();

        let model = save(&store, "cube.stl", b"solid cube").await.unwrap();
        assert_eq!(model.name, "cube.stl");
        assert_eq!(model.size, 10);
        assert_eq!(model.path, store.base_path().join("cube.stl"));

        let (opened, file) = store.open("cube.stl").await.unwrap();
        assert_eq!(opened, model);
        assert_eq!(read_all(file).await, b"solid cube");
    }

    #[tokio::test]
    async fn test_save_rejects_disallowed_extension() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        store.init().await.unwrap();

        for name in ["virus.exe", "photo.png", "noextension"] {
            let err = save(&store, name, b"data").await.unwrap_err();
            assert!(matches!(err, CadstoreError::ExtensionNotAllowed), "{name}");
        }
        assert!(store.list().await.unwrap().is_empty());
        assert_eq!(std::fs::read_dir(store.base_path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_upload_name_errors() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        assert!(matches!(store.upload_name(""), Err(CadstoreError::EmptyFilename)));
        assert!(matches!(store.upload_name("../.stl"), Err(CadstoreError::ExtensionNotAllowed)));
        assert_eq!(store.upload_name("Model.OBJ").unwrap().as_str(), "Model.OBJ");
    }

    #[tokio::test]
    async fn test_save_sanitizes_path_traversal() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        store.init().await.unwrap();

        let model = save(&store, "../../etc/passwd.stl", b"evil").await.unwrap();
        assert_eq!(model.name, "etc_passwd.stl");
        assert!(model.path.starts_with(store.base_path()));
        assert!(!dir.path().join("etc").exists());
        assert_eq!(store.list().await.unwrap(), vec!["etc_passwd.stl"]);
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        store.init().await.unwrap();

        save(&store, "part.obj", b"first").await.unwrap();
        save(&store, "part.obj", b"second version").await.unwrap();

        let (model, file) = store.open("part.obj").await.unwrap();
        assert_eq!(model.size, 14);
        assert_eq!(read_all(file).await, b"second version");
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_respects_size_limit() {
        let dir = TempDir::new().unwrap();
        let mut config = StorageConfig::with_path(dir.path());
        config.max_upload_size = 4;
        let store = ModelStore::new(config).unwrap();

        let err = save(&store, "big.stl", b"too big").await.unwrap_err();
        assert!(matches!(err, CadstoreError::PayloadTooLarge { max_bytes: 4 }));
        assert!(!dir.path().join("big.stl").exists());
    }

    #[tokio::test]
    async fn test_open_missing() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        store.init().await.unwrap();

        let err = store.open("never.stl").await.unwrap_err();
        assert!(matches!(err, CadstoreError::ModelNotFound(_)));
        assert!(matches!(store.open("..").await, Err(CadstoreError::ModelNotFound(_))));
    }

    #[tokio::test]
    async fn test_open_rejects_non_allowed_and_directories() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        store.init().await.unwrap();

        std::fs::write(store.base_path().join("notes.txt"), b"hello").unwrap();
        std::fs::create_dir(store.base_path().join("folder.stl")).unwrap();

        assert!(matches!(store.open("notes.txt").await, Err(CadstoreError::ModelNotFound(_))));
        assert!(matches!(store.open("folder.stl").await, Err(CadstoreError::ModelNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_filters_entries() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        store.init().await.unwrap();
        assert!(store.list().await.unwrap().is_empty());

        save(&store, "b.obj", b"o").await.unwrap();
        save(&store, "a.STL", b"s").await.unwrap();
        std::fs::write(store.base_path().join("readme.md"), b"x").unwrap();
        std::fs::create_dir(store.base_path().join("nested.stl")).unwrap();
        std::fs::write(store.base_path().join("nested.stl").join("inner.stl"), b"x").unwrap();

        assert_eq!(store.list().await.unwrap(), vec!["a.STL", "b.obj"]);
    }

    #[tokio::test]
    async fn test_list_missing_directory() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        assert!(store.list().await.unwrap().is_empty());
    }
}
