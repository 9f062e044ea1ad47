//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the StorageClient trait from bls-core.
//! Listings fetch one `ListObjectsV2` page at a time as the stream is
//! polled.

use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::types::{CommonPrefix, Object};
use bls_core::{Entry, EntryStream, Error, HostConfig, Location, Result, StorageClient};
use futures::{Stream, StreamExt, future, stream};
use jiff::Timestamp;

const DEFAULT_REGION: &str = "us-east-1";

/// S3 client wrapper bound to one canonical URL
pub struct S3Client {
    inner: aws_sdk_s3::Client,
    url: String,
    /// Empty when the URL names the endpoint itself
    bucket: String,
    /// Key prefix inside the bucket
    prefix: String,
}

impl S3Client {
    /// Create a client for `canonical_url` using the matched host settings
    pub async fn new(canonical_url: &str, host: &HostConfig) -> Result<Self> {
        let Some(Location::Remote(url)) = Location::parse(canonical_url) else {
            return Err(Error::Connection(format!(
                "{canonical_url} is not an S3 endpoint URL"
            )));
        };

        let endpoint = url.origin().ascii_serialization();
        let path = url.path().trim_start_matches('/');
        let (bucket, prefix) = path.split_once('/').unwrap_or((path, ""));

        let region = if host.region.is_empty() {
            DEFAULT_REGION.to_string()
        } else {
            host.region.clone()
        };

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region))
            .endpoint_url(&endpoint)
            // Retries are owned by the caller's retry controller
            .retry_config(aws_config::retry::RetryConfig::disabled());

        loader = match &host.credentials {
            Some(creds) => loader.credentials_provider(aws_credential_types::Credentials::new(
                creds.access_key.clone(),
                creds.secret_key.clone(),
                None,
                None,
                "bls-static-credentials",
            )),
            None => loader.no_credentials(),
        };

        let config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(true)
            .build();

        tracing::debug!(%endpoint, bucket, prefix, alias = %host.alias_name, "Created S3 client");

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            url: canonical_url.to_string(),
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
        })
    }

    fn buckets(&self) -> impl Stream<Item = Result<Entry>> + Send + 'static {
        let client = self.inner.clone();
        stream::once(async move {
            let response = client
                .list_buckets()
                .send()
                .await
                .map_err(|e| map_sdk_error(&e, "buckets"))?;

            Ok::<_, Error>(response
                .buckets()
                .iter()
                .map(|b| {
                    let mod_time = b
                        .creation_date()
                        .and_then(|d| Timestamp::from_second(d.secs()).ok())
                        .unwrap_or(Timestamp::UNIX_EPOCH);
                    Entry::dir(b.name().unwrap_or_default(), mod_time)
                })
                .collect::<Vec<_>>())
        })
        .flat_map(flatten_page)
    }
}

impl StorageClient for S3Client {
    fn url(&self) -> &str {
        &self.url
    }

    fn list_single(&self) -> EntryStream<'_> {
        if self.bucket.is_empty() {
            return bls_core::stop_after_error(self.buckets());
        }
        let objects = list_objects(
            self.inner.clone(),
            self.bucket.clone(),
            self.prefix.clone(),
            true,
            String::new(),
        );
        bls_core::stop_after_error(objects)
    }

    fn list(&self) -> EntryStream<'_> {
        if self.bucket.is_empty() {
            let client = self.inner.clone();
            let all = self.buckets().flat_map(move |bucket| match bucket {
                Ok(entry) => {
                    let objects = list_objects(
                        client.clone(),
                        entry.name.clone(),
                        String::new(),
                        false,
                        format!("{}/", entry.name),
                    );
                    stream::once(future::ready(Ok(entry)))
                        .chain(objects)
                        .boxed()
                }
                Err(e) => stream::once(future::ready(Err(e))).boxed(),
            });
            return bls_core::stop_after_error(all);
        }
        let objects = list_objects(
            self.inner.clone(),
            self.bucket.clone(),
            self.prefix.clone(),
            false,
            String::new(),
        );
        bls_core::stop_after_error(objects)
    }
}

/// Lazily page through `ListObjectsV2`.
///
/// Names are reported relative to the last `/` of `prefix` and prefixed with
/// `name_prefix`.
fn list_objects(
    client: aws_sdk_s3::Client,
    bucket: String,
    prefix: String,
    delimited: bool,
    name_prefix: String,
) -> impl Stream<Item = Result<Entry>> + Send + 'static {
    let base = key_base(&prefix);

    // `Some(token)` is the next page to fetch; `None` ends the stream
    stream::unfold(Some(None::<String>), move |state| {
        let client = client.clone();
        let bucket = bucket.clone();
        let prefix = prefix.clone();
        let base = base.clone();
        let name_prefix = name_prefix.clone();
        async move {
            let token = state?;
            let mut request = client.list_objects_v2().bucket(&bucket);
            if !prefix.is_empty() {
                request = request.prefix(&prefix);
            }
            if delimited {
                request = request.delimiter("/");
            }
            if let Some(token) = token {
                request = request.continuation_token(token);
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => return Some((Err(map_sdk_error(&e, &bucket)), None)),
            };

            let entries = page_entries(
                &base,
                &name_prefix,
                response.common_prefixes(),
                response.contents(),
                Timestamp::now(),
            );

            let next = if response.is_truncated().unwrap_or(false) {
                response
                    .next_continuation_token()
                    .map(|t| Some(t.to_string()))
            } else {
                None
            };

            tracing::debug!(bucket = %bucket, entries = entries.len(), more = next.is_some(), "Fetched page");
            Some((Ok(entries), next))
        }
    })
    .flat_map(flatten_page)
}

/// Part of `prefix` up to and including its last `/`
fn key_base(prefix: &str) -> String {
    match prefix.rfind('/') {
        Some(idx) => prefix[..=idx].to_string(),
        None => String::new(),
    }
}

/// Turn one `ListObjectsV2` page into entries.
///
/// Names are relative to `base` and prefixed with `name_prefix`. Common
/// prefixes have no timestamp and are stamped with `now`; the key equal to
/// `base` itself (a folder placeholder) is skipped.
fn page_entries(
    base: &str,
    name_prefix: &str,
    common_prefixes: &[CommonPrefix],
    contents: &[Object],
    now: Timestamp,
) -> Vec<Entry> {
    let mut entries = Vec::with_capacity(common_prefixes.len() + contents.len());

    for common in common_prefixes {
        if let Some(p) = common.prefix() {
            let name = p.strip_prefix(base).unwrap_or(p);
            if !name.is_empty() {
                entries.push(Entry::dir(format!("{name_prefix}{name}"), now));
            }
        }
    }

    for object in contents {
        let key = object.key().unwrap_or_default();
        let name = key.strip_prefix(base).unwrap_or(key);
        if name.is_empty() {
            continue;
        }
        let mod_time = object
            .last_modified()
            .and_then(|d| Timestamp::from_second(d.secs()).ok())
            .unwrap_or(Timestamp::UNIX_EPOCH);
        let name = format!("{name_prefix}{name}");
        let entry = if key.ends_with('/') {
            Entry::dir(name, mod_time)
        } else {
            let size = u64::try_from(object.size().unwrap_or(0)).unwrap_or(0);
            Entry::file(name, size, mod_time)
        };
        entries.push(entry);
    }

    entries
}

fn flatten_page(page: Result<Vec<Entry>>) -> stream::Iter<std::vec::IntoIter<Result<Entry>>> {
    let items: Vec<Result<Entry>> = match page {
        Ok(entries) => entries.into_iter().map(Ok).collect(),
        Err(e) => vec![Err(e)],
    };
    stream::iter(items)
}

/// Map an SDK failure onto the listing error taxonomy
fn map_sdk_error<E>(error: &SdkError<E>, resource: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    match error {
        SdkError::TimeoutError(_) => Error::Network(format!("Request timeout on {resource}")),
        SdkError::DispatchFailure(failure) => {
            if failure.is_timeout() {
                Error::Network(format!("Request timeout on {resource}"))
            } else if failure.is_io() {
                Error::Network(format!(
                    "Connection reset or refused on {resource}: {failure:?}"
                ))
            } else {
                Error::Network(format!("Network dispatch error: {failure:?}"))
            }
        }
        SdkError::ServiceError(service_err) => {
            let err = service_err.err();
            let status = service_err.raw().status().as_u16();
            let code = err.code().unwrap_or_default();
            let message = err.message().unwrap_or_default();
            classify_service_error(code, status, resource, message)
        }
        SdkError::ResponseError(err) => Error::Protocol(format!("Response error: {err:?}")),
        SdkError::ConstructionFailure(err) => {
            Error::Protocol(format!("Request construction failed: {err:?}"))
        }
        _ => Error::Protocol(error.to_string()),
    }
}

fn classify_service_error(code: &str, status: u16, resource: &str, message: &str) -> Error {
    match (code, status) {
        ("AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch", _) | (_, 401 | 403) => {
            Error::Auth(format!("{resource}: {code} {message}"))
        }
        ("NoSuchBucket" | "NoSuchKey" | "NotFound", _) | (_, 404) => {
            Error::NotFound(format!("{resource}: {code}"))
        }
        ("SlowDown" | "RequestTimeout", _) | (_, 429 | 503) => {
            Error::Network(format!("{status} {code} service unavailable: {message}"))
        }
        _ => Error::Protocol(format!("{resource}: {status} {code} {message}")),
    }
}

#[cfg(test)]
mod tests {
    use bls_core::{ErrorKind, is_retryable_error};

    use super::*;

    fn host() -> HostConfig {
        HostConfig {
            alias_name: "store".into(),
            endpoint: "http://localhost:9000".into(),
            credentials: None,
            region: String::new(),
        }
    }

    #[tokio::test]
    async fn test_splits_bucket_and_prefix() {
        let client = S3Client::new("http://localhost:9000/bucket/photos/2024", &host())
            .await
            .unwrap();
        assert_eq!(client.url(), "http://localhost:9000/bucket/photos/2024");
        assert_eq!(client.bucket, "bucket");
        assert_eq!(client.prefix, "photos/2024");

        let client = S3Client::new("http://localhost:9000", &host()).await.unwrap();
        assert!(client.bucket.is_empty());
        assert!(client.prefix.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_non_remote_url() {
        let result = S3Client::new("/tmp/data", &host()).await;
        assert!(matches!(result, Err(Error::Connection(_))));
    }

    fn prefix(p: &str) -> CommonPrefix {
        CommonPrefix::builder().prefix(p).build()
    }

    fn object(key: &str, size: i64, secs: i64) -> Object {
        Object::builder()
            .key(key)
            .size(size)
            .last_modified(aws_sdk_s3::primitives::DateTime::from_secs(secs))
            .build()
    }

    fn names(entries: &[Entry]) -> Vec<(&str, bool)> {
        entries.iter().map(|e| (e.name.as_str(), e.is_dir())).collect()
    }

    #[test]
    fn test_key_base() {
        assert_eq!(key_base(""), "");
        assert_eq!(key_base("photos"), "");
        assert_eq!(key_base("photos/2024"), "photos/");
        assert_eq!(key_base("photos/"), "photos/");
    }

    #[test]
    fn test_page_prefix_without_slash() {
        let now = Timestamp::from_second(1_000).unwrap();
        let entries = page_entries(
            &key_base("photos/2024"),
            "",
            &[prefix("photos/2024/")],
            &[object("photos/2024.tar", 10, 60)],
            now,
        );

        assert_eq!(names(&entries), vec![("2024/", true), ("2024.tar", false)]);
        assert_eq!(entries[0].mod_time, now);
        assert_eq!(entries[1].size, 10);
        assert_eq!(entries[1].mod_time, Timestamp::from_second(60).unwrap());
    }

    #[test]
    fn test_page_skips_folder_placeholder() {
        let entries = page_entries(
            &key_base("photos/"),
            "",
            &[prefix("photos/raw/")],
            &[object("photos/", 0, 0), object("photos/cat.jpg", 2048, 0)],
            Timestamp::UNIX_EPOCH,
        );

        assert_eq!(names(&entries), vec![("raw/", true), ("cat.jpg", false)]);
    }

    #[test]
    fn test_page_recursive_keys() {
        let entries = page_entries(
            &key_base("photos/"),
            "",
            &[],
            &[
                object("photos/2024/jan/cat.jpg", 5, 0),
                object("photos/empty/", 0, 0),
                object("photos/bad", -1, 0),
            ],
            Timestamp::UNIX_EPOCH,
        );

        assert_eq!(
            names(&entries),
            vec![("2024/jan/cat.jpg", false), ("empty/", true), ("bad", false)]
        );
        assert_eq!(entries[2].size, 0);
    }

    #[test]
    fn test_page_bucket_root_names() {
        let entries = page_entries(
            "",
            "bucket/",
            &[],
            &[object("a.txt", 1, 0), object("dir/b.txt", 2, 0)],
            Timestamp::UNIX_EPOCH,
        );

        assert_eq!(
            names(&entries),
            vec![("bucket/a.txt", false), ("bucket/dir/b.txt", false)]
        );
    }

    #[test]
    fn test_classify_service_error() {
        let err = classify_service_error("AccessDenied", 403, "bucket", "denied");
        assert!(matches!(err, Error::Auth(_)));
        assert_eq!(err.kind(), ErrorKind::TerminalList);

        let err = classify_service_error("NoSuchBucket", 404, "bucket", "");
        assert!(matches!(err, Error::NotFound(_)));

        let err = classify_service_error("SlowDown", 503, "bucket", "reduce rate");
        assert!(is_retryable_error(&err));

        let err = classify_service_error("MalformedXML", 400, "bucket", "");
        assert!(matches!(err, Error::Protocol(_)));
        assert!(!is_retryable_error(&err));
    }
}
