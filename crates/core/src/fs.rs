//! Local filesystem backend
//!
//! Lists directories with `tokio::fs`. Children are sorted by name so
//! repeated listings of an unchanged tree produce identical output.
//! Symbolic links are reported as `Other` and never followed.

use std::path::{Path, PathBuf};

use futures::{StreamExt, stream};
use jiff::Timestamp;

use crate::error::{Error, Result};
use crate::listing::stop_after_error;
use crate::resolve::Location;
use crate::traits::{Entry, EntryKind, EntryStream, StorageClient};

/// Client for a local directory or file
#[derive(Debug, Clone)]
pub struct FsClient {
    url: String,
    root: PathBuf,
}

impl FsClient {
    /// Bind a client to a canonical local path
    pub fn new(canonical_url: &str) -> Result<Self> {
        match Location::parse(canonical_url) {
            Some(Location::Local(root)) => Ok(Self {
                url: canonical_url.to_string(),
                root,
            }),
            _ => Err(Error::Connection(format!(
                "{canonical_url} is not a local path"
            ))),
        }
    }
}

impl StorageClient for FsClient {
    fn url(&self) -> &str {
        &self.url
    }

    fn list_single(&self) -> EntryStream<'_> {
        let root = self.root.clone();
        let entries = stream::once(async move { root_entries(&root).await }).flat_map(|res| {
            let items: Vec<Result<Entry>> = match res {
                Ok(children) => children.into_iter().map(|(_, e)| Ok(e)).collect(),
                Err(e) => vec![Err(e)],
            };
            stream::iter(items)
        });
        stop_after_error(entries)
    }

    fn list(&self) -> EntryStream<'_> {
        let start = Walk::Start(self.root.clone());
        let walk = stream::unfold(Some(start), |state| async move {
            let mut stack = match state? {
                Walk::Start(root) => match root_entries(&root).await {
                    Ok(mut entries) => {
                        entries.reverse();
                        entries
                    }
                    Err(e) => return Some((Err(e), None)),
                },
                Walk::Pending(stack) => stack,
            };

            let (path, entry) = stack.pop()?;
            if entry.is_dir() {
                match read_children(&path, &entry.name).await {
                    Ok(children) => stack.extend(children.into_iter().rev()),
                    Err(e) => return Some((Err(e), None)),
                }
            }
            Some((Ok(entry), Some(Walk::Pending(stack))))
        });
        stop_after_error(walk)
    }
}

/// Depth-first walk state; `Pending` is a stack with the next item on top
enum Walk {
    Start(PathBuf),
    Pending(Vec<(PathBuf, Entry)>),
}

/// Children of the root directory, or the root itself if it is a file
async fn root_entries(root: &Path) -> Result<Vec<(PathBuf, Entry)>> {
    let meta = tokio::fs::metadata(root)
        .await
        .map_err(|e| io_error(root, e))?;
    if meta.is_dir() {
        return read_children(root, "").await;
    }

    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.to_string_lossy().into_owned());
    Ok(vec![(root.to_path_buf(), entry_for(name, &meta))])
}

/// Sorted children of `dir`, named relative to the listing root
async fn read_children(dir: &Path, prefix: &str) -> Result<Vec<(PathBuf, Entry)>> {
    let mut read_dir = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| io_error(dir, e))?;

    let mut children = Vec::new();
    while let Some(child) = read_dir.next_entry().await.map_err(|e| io_error(dir, e))? {
        let path = child.path();
        let meta = child.metadata().await.map_err(|e| io_error(&path, e))?;
        let name = child.file_name().to_string_lossy().into_owned();
        let name = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };
        children.push((path, entry_for(name, &meta)));
    }

    children.sort_by(|a, b| a.1.name.cmp(&b.1.name));
    Ok(children)
}

fn entry_for(name: String, meta: &std::fs::Metadata) -> Entry {
    let file_type = meta.file_type();
    let kind = if file_type.is_dir() {
        EntryKind::Directory
    } else if file_type.is_file() {
        EntryKind::Regular
    } else {
        EntryKind::Other
    };
    let mod_time = meta
        .modified()
        .ok()
        .and_then(|t| Timestamp::try_from(t).ok())
        .unwrap_or(Timestamp::UNIX_EPOCH);

    Entry {
        name,
        size: if kind == EntryKind::Directory { 0 } else { meta.len() },
        mod_time,
        kind,
    }
}

fn io_error(path: &Path, e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::NotFound {
        Error::NotFound(path.display().to_string())
    } else {
        Error::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;
    use tempfile::TempDir;

    use super::*;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.txt"), vec![0u8; 1024]).unwrap();
        std::fs::create_dir_all(dir.path().join("a/nested")).unwrap();
        std::fs::write(dir.path().join("a/one.bin"), b"1").unwrap();
        std::fs::write(dir.path().join("a/nested/two.bin"), b"22").unwrap();
        dir
    }

    fn client(dir: &TempDir) -> FsClient {
        FsClient::new(dir.path().to_str().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_list_single() {
        let dir = fixture();
        let entries: Vec<Entry> = client(&dir).list_single().try_collect().await.unwrap();

        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b.txt"]);
        assert_eq!(entries[0].kind, EntryKind::Directory);
        assert_eq!(entries[1].kind, EntryKind::Regular);
        assert_eq!(entries[1].size, 1024);
    }

    #[tokio::test]
    async fn test_list_recursive_preorder() {
        let dir = fixture();
        let entries: Vec<Entry> = client(&dir).list().try_collect().await.unwrap();

        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["a", "a/nested", "a/nested/two.bin", "a/one.bin", "b.txt"]
        );
    }

    #[tokio::test]
    async fn test_relisting_is_identical() {
        let dir = fixture();
        let c = client(&dir);
        let first: Vec<Entry> = c.list().try_collect().await.unwrap();
        let second: Vec<Entry> = c.list().try_collect().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_single_file_root() {
        let dir = fixture();
        let path = dir.path().join("b.txt");
        let c = FsClient::new(path.to_str().unwrap()).unwrap();
        let entries: Vec<Entry> = c.list_single().try_collect().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "b.txt");
    }

    #[tokio::test]
    async fn test_missing_root_yields_single_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing");
        let c = FsClient::new(path.to_str().unwrap()).unwrap();

        let results: Vec<Result<Entry>> = c.list().collect().await;
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(Error::NotFound(_))));
    }

    #[test]
    fn test_rejects_remote_url() {
        assert!(matches!(
            FsClient::new("http://localhost:9000/bucket"),
            Err(Error::Connection(_))
        ));
    }
}
