use storage::{ObjectStore, StorageError};
use tracing::debug;

use crate::payload::Upload;

/// Splits a client-supplied filename into a raw stem and extension.
///
/// The last `.`-delimited segment is the extension; everything before it is
/// concatenated losslessly into the stem (`"my.photo.png"` -> `"myphoto"`,
/// `"png"`). A dotless name yields an empty stem with the whole name as the
/// extension, matching the historical naming scheme.
pub fn split_client_name(name: &str) -> (String, &str) {
    match name.rfind('.') {
        Some(pos) => (name[..pos].replace('.', ""), &name[pos + 1..]),
        None => (String::new(), name),
    }
}

/// Reduce a raw stem to a URL-safe slug: lowercase ASCII alphanumerics with
/// single `-` separators, no leading or trailing separator.
pub fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    let mut pending_separator = false;

    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// Allocate a collision-free storage path for a client filename within `dir`.
///
/// Probes `"<dir>/<slug>_<index>.<ext>"` from index 1 upward until an unused
/// path is found. Collision-free against objects present at call time only;
/// two allocators racing on the same stem can still collide.
pub async fn allocate(
    store: &dyn ObjectStore,
    original_name: &str,
    dir: &str,
) -> Result<String, StorageError> {
    let (raw_stem, extension) = split_client_name(original_name);
    let stem = slugify(&raw_stem);

    let mut index: u32 = 1;
    loop {
        let candidate = format!("{dir}/{stem}_{index}.{extension}");
        if !store.exists(&candidate).await? {
            return Ok(candidate);
        }
        index += 1;
    }
}

/// Allocate a path for the upload and write its full content there.
pub async fn store_upload(
    store: &dyn ObjectStore,
    upload: &Upload,
    dir: &str,
) -> Result<String, StorageError> {
    let path = allocate(store, &upload.filename, dir).await?;
    store.put(&path, &upload.content).await?;
    debug!(path = %path, filename = %upload.filename, "stored upload");
    Ok(path)
}

/// Delete a stored file. A file that is already gone is a no-op.
pub async fn delete_stored(store: &dyn ObjectStore, path: &str) -> Result<(), StorageError> {
    match store.delete(path).await {
        Ok(_) | Err(StorageError::NotFound(_)) => Ok(()),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::memory::MemoryStore;

    #[test]
    fn split_concatenates_inner_segments() {
        assert_eq!(split_client_name("foo.png"), ("foo".to_string(), "png"));
        assert_eq!(
            split_client_name("my.photo.png"),
            ("myphoto".to_string(), "png")
        );
        assert_eq!(
            split_client_name("archive.tar.gz"),
            ("archivetar".to_string(), "gz")
        );
    }

    #[test]
    fn split_dotless_name_is_all_extension() {
        assert_eq!(split_client_name("noext"), (String::new(), "noext"));
    }

    #[test]
    fn slugify_lowercases_and_separates() {
        assert_eq!(slugify("My Photo"), "my-photo");
        assert_eq!(slugify("Shot (1) final!"), "shot-1-final");
        assert_eq!(slugify("already-fine"), "already-fine");
        assert_eq!(slugify("___"), "");
        assert_eq!(slugify("  edges  "), "edges");
    }

    #[tokio::test]
    async fn allocate_fresh_stem_starts_at_one() {
        let store = MemoryStore::new();
        let path = allocate(&store, "photo.png", "images").await.unwrap();
        assert_eq!(path, "images/photo_1.png");
    }

    #[tokio::test]
    async fn allocate_skips_existing_indices() {
        let store = MemoryStore::new();
        store.put("images/foo_1.png", b"a").await.unwrap();
        store.put("images/foo_2.png", b"b").await.unwrap();

        let path = allocate(&store, "foo.png", "images").await.unwrap();
        assert_eq!(path, "images/foo_3.png");
    }

    #[tokio::test]
    async fn allocate_slugifies_the_stem() {
        let store = MemoryStore::new();
        let path = allocate(&store, "My Photo.PNG", "images").await.unwrap();
        assert_eq!(path, "images/my-photo_1.PNG");
    }

    #[tokio::test]
    async fn store_upload_writes_content_at_allocated_path() {
        let store = MemoryStore::new();
        let upload = Upload::new("pic.jpg", b"JPEG".to_vec());

        let path = store_upload(&store, &upload, "images").await.unwrap();

        assert_eq!(path, "images/pic_1.jpg");
        assert_eq!(store.get(&path).await.unwrap(), b"JPEG");
    }

    #[tokio::test]
    async fn store_upload_does_not_clobber_previous_uploads() {
        let store = MemoryStore::new();
        let first = store_upload(&store, &Upload::new("pic.jpg", b"one".to_vec()), "images")
            .await
            .unwrap();
        let second = store_upload(&store, &Upload::new("pic.jpg", b"two".to_vec()), "images")
            .await
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(store.get(&first).await.unwrap(), b"one");
        assert_eq!(store.get(&second).await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn delete_stored_is_idempotent() {
        let store = MemoryStore::new();
        store.put("images/x_1.png", b"x").await.unwrap();

        delete_stored(&store, "images/x_1.png").await.unwrap();
        // Already gone: still fine.
        delete_stored(&store, "images/x_1.png").await.unwrap();
        assert!(!store.exists("images/x_1.png").await.unwrap());
    }
}
