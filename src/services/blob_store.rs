use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;

/// Stockage des images: renvoie une URL stable
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn store(&self, filename: &str, bytes: Vec<u8>) -> Result<String, String>;
}

/// Fichiers écrits sur disque, servis sous `<base_url>/uploads/<fichier>`
pub struct LocalBlobStore {
    dir: PathBuf,
    base_url: String,
}

impl LocalBlobStore {
    pub fn new(dir: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            dir: dir.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Préfixe horodaté + espaces remplacés, sans séparateur de chemin
pub fn safe_file_name(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    let base = if base.is_empty() || base == "." || base == ".." {
        "upload".to_string()
    } else {
        base
    };
    format!("{}-{}", Utc::now().timestamp_millis(), base)
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(&self, filename: &str, bytes: Vec<u8>) -> Result<String, String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| format!("Failed to create upload dir: {}", e))?;

        let name = safe_file_name(filename);
        tokio::fs::write(self.dir.join(&name), bytes)
            .await
            .map_err(|e| format!("Failed to write {}: {}", name, e))?;

        Ok(format!("{}/uploads/{}", self.base_url, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_sanitized() {
        let name = safe_file_name("my summer photo.png");
        assert!(name.ends_with("-my-summer-photo.png"));
        assert!(!safe_file_name("../../etc/passwd").contains('/'));
        assert!(safe_file_name("..").ends_with("-upload"));
    }

    #[tokio::test]
    async fn local_store_writes_file_and_returns_url() {
        let dir = std::env::temp_dir().join(format!("blob-store-{}", uuid::Uuid::new_v4()));
        let store = LocalBlobStore::new(&dir, "http://cdn.test/");

        let url = store.store("a b.jpg", vec![1, 2, 3]).await.unwrap();
        assert!(url.starts_with("http://cdn.test/uploads/"));
        assert!(url.ends_with("-a-b.jpg"));

        let file = url.rsplit('/').next().unwrap();
        assert_eq!(tokio::fs::read(dir.join(file)).await.unwrap(), vec![1, 2, 3]);
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
