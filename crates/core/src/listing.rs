//! Listing driver
//!
//! Pulls entries from a client one at a time and hands each to a callback
//! in production order.

use futures::{Stream, StreamExt, future};

use crate::error::{Error, Result};
use crate::traits::{Entry, EntryStream, ListResult, StorageClient};

/// Fuse a listing stream at its first error.
///
/// The error itself is yielded; nothing after it is.
pub fn stop_after_error<'a, S>(stream: S) -> EntryStream<'a>
where
    S: Stream<Item = ListResult> + Send + 'a,
{
    stream
        .scan(false, |failed, item| {
            if *failed {
                return future::ready(None);
            }
            *failed = item.is_err();
            future::ready(Some(item))
        })
        .boxed()
}

/// Consume one listing pass, calling `on_entry` for each entry.
///
/// Returns the first error annotated with the client's URL, or `Ok(())`
/// when the stream ends cleanly.
pub async fn drive<F>(client: &dyn StorageClient, recursive: bool, mut on_entry: F) -> Result<()>
where
    F: FnMut(&Entry),
{
    let mut stream = if recursive {
        client.list()
    } else {
        client.list_single()
    };

    let mut count = 0usize;
    while let Some(item) = stream.next().await {
        match item {
            Ok(entry) => {
                on_entry(&entry);
                count += 1;
            }
            Err(e) => {
                tracing::debug!(target_url = client.url(), entries = count, error = %e, "Listing failed");
                return Err(Error::listing(client.url(), e));
            }
        }
    }

    tracing::debug!(target_url = client.url(), entries = count, recursive, "Listing complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::stream;
    use jiff::Timestamp;

    use super::*;

    type Script = Box<dyn Fn() -> Vec<ListResult> + Send + Sync>;

    /// Client replaying fixed results and counting how many were pulled
    struct ScriptedClient {
        single: Script,
        recursive: Script,
        pulled: Arc<AtomicUsize>,
    }

    impl ScriptedClient {
        fn replay(&self, items: Vec<ListResult>) -> EntryStream<'_> {
            let pulled = self.pulled.clone();
            stream::iter(items)
                .inspect(move |_| {
                    pulled.fetch_add(1, Ordering::SeqCst);
                })
                .boxed()
        }
    }

    impl StorageClient for ScriptedClient {
        fn url(&self) -> &str {
            "http://localhost:9000/bucket"
        }

        fn list_single(&self) -> EntryStream<'_> {
            self.replay((self.single)())
        }

        fn list(&self) -> EntryStream<'_> {
            self.replay((self.recursive)())
        }
    }

    fn entries(names: &[&str]) -> Vec<ListResult> {
        names
            .iter()
            .map(|n| Ok(Entry::file(*n, 1, Timestamp::UNIX_EPOCH)))
            .collect()
    }

    fn client(single: Script, recursive: Script) -> ScriptedClient {
        ScriptedClient {
            single,
            recursive,
            pulled: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[tokio::test]
    async fn test_single_level_in_order() {
        let c = client(
            Box::new(|| entries(&["b", "a", "c"])),
            Box::new(|| entries(&["never"])),
        );
        let mut seen = Vec::new();
        drive(&c, false, |e| seen.push(e.name.clone())).await.unwrap();
        assert_eq!(seen, vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn test_recursive_uses_list() {
        let c = client(
            Box::new(|| entries(&["dir"])),
            Box::new(|| entries(&["dir", "dir/x", "dir/y"])),
        );
        let mut seen = Vec::new();
        drive(&c, true, |e| seen.push(e.name.clone())).await.unwrap();
        assert_eq!(seen, vec!["dir", "dir/x", "dir/y"]);
    }

    #[tokio::test]
    async fn test_stops_at_first_error() {
        let c = client(
            Box::new(|| {
                vec![
                    Ok(Entry::file("a", 1, Timestamp::UNIX_EPOCH)),
                    Err(Error::Network("connection reset".into())),
                    Ok(Entry::file("after", 1, Timestamp::UNIX_EPOCH)),
                ]
            }),
            Box::new(Vec::new),
        );
        let mut seen = Vec::new();
        let err = drive(&c, false, |e| seen.push(e.name.clone()))
            .await
            .unwrap_err();

        assert_eq!(seen, vec!["a"]);
        assert_eq!(err.target(), Some("http://localhost:9000/bucket"));
        assert!(matches!(err.root(), Error::Network(_)));
        assert_eq!(c.pulled.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_listing() {
        let c = client(Box::new(Vec::new), Box::new(Vec::new));
        let mut count = 0;
        drive(&c, false, |_| count += 1).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_stop_after_error_fuses() {
        let items = vec![
            Ok(Entry::file("a", 1, Timestamp::UNIX_EPOCH)),
            Err(Error::NotFound("x".into())),
            Ok(Entry::file("b", 1, Timestamp::UNIX_EPOCH)),
            Err(Error::NotFound("y".into())),
        ];
        let out: Vec<ListResult> = stop_after_error(stream::iter(items)).collect().await;
        assert_eq!(out.len(), 2);
        assert!(out[0].is_ok());
        assert!(out[1].is_err());
    }
}
