//! Cloudflare R2 transport for the snapshot file.

use std::env;

use aws_credential_types::Credentials;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::{primitives::ByteStream, Client};
use aws_types::region::Region;

use super::{RemoteTransport, SyncTarget};
use crate::error::{Error, Result, TransportError};
use crate::sync::naming::SYNC_FILE_EXTENSION;
use crate::util::normalize_text_option;

const ENV_ACCOUNT_ID: &str = "LARDER_R2_ACCOUNT_ID";
const ENV_BUCKET: &str = "LARDER_R2_BUCKET";
const ENV_ACCESS_KEY_ID: &str = "LARDER_R2_ACCESS_KEY_ID";
const ENV_SECRET_ACCESS_KEY: &str = "LARDER_R2_SECRET_ACCESS_KEY";
const ENV_PREFIX: &str = "LARDER_R2_PREFIX";

const DEFAULT_PREFIX: &str = "larder";
const SNAPSHOT_CONTENT_TYPE: &str = "application/gzip";

/// Service error codes meaning the credentials must be refreshed.
const AUTH_EXPIRED_CODES: [&str; 3] = ["ExpiredToken", "TokenRefreshRequired", "RequestExpired"];

/// Cloudflare R2 configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct R2Config {
    /// Cloudflare account identifier.
    pub account_id: String,
    /// R2 bucket name.
    pub bucket: String,
    /// Access key id for S3-compatible auth.
    pub access_key_id: String,
    /// Secret access key for S3-compatible auth.
    pub secret_access_key: String,
    /// Key prefix ("folder") holding the sync files.
    pub prefix: String,
}

impl std::fmt::Debug for R2Config {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("R2Config")
            .field("account_id", &self.account_id)
            .field("bucket", &self.bucket)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl R2Config {
    /// Load R2 configuration from environment variables.
    ///
    /// Returns `Ok(None)` when no R2 variables are set.
    /// Returns an error when only a partial configuration is provided.
    pub fn from_env() -> Result<Option<Self>> {
        parse_config(|key| env::var(key).ok())
    }

    /// Cloudflare R2 S3-compatible endpoint URL.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        format!("https://{}.r2.cloudflarestorage.com", self.account_id)
    }
}

/// Stores the snapshot as an object under the configured prefix.
///
/// A target's `id` is its full object key.
#[derive(Clone, Debug)]
pub struct R2Transport {
    config: R2Config,
    client: Client,
}

impl R2Transport {
    #[must_use]
    pub fn new(config: R2Config) -> Self {
        let client = build_s3_client(&config);
        Self { config, client }
    }

    #[must_use]
    pub const fn config(&self) -> &R2Config {
        &self.config
    }

    /// Check that the configured bucket is reachable with current credentials.
    pub async fn bucket_is_reachable(&self) -> std::result::Result<(), TransportError> {
        self.client
            .head_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await
            .map_err(|error| classify_sdk_error("head_bucket", &self.config.bucket, &error))?;
        Ok(())
    }

    fn object_key(&self, target: &SyncTarget) -> String {
        object_key(&self.config.prefix, target)
    }

    fn folder(&self) -> String {
        folder(&self.config.prefix)
    }

    fn describe(&self, key: &str) -> String {
        format!("{}/{key}", self.config.bucket)
    }
}

impl RemoteTransport for R2Transport {
    async fn exists(&self, target: &SyncTarget) -> std::result::Result<bool, TransportError> {
        let SyncTarget::Existing { .. } = target else {
            return Ok(false);
        };
        let object_key = self.object_key(target);

        let response = self
            .client
            .list_objects_v2()
            .bucket(&self.config.bucket)
            .prefix(&object_key)
            .max_keys(1)
            .send()
            .await
            .map_err(|error| {
                classify_sdk_error("list_objects_v2", &self.describe(&object_key), &error)
            })?;

        Ok(response
            .contents()
            .iter()
            .filter_map(|object| object.key())
            .any(|candidate| candidate == object_key))
    }

    async fn download(&self, target: &SyncTarget) -> std::result::Result<Vec<u8>, TransportError> {
        let object_key = self.object_key(target);
        let target_label = self.describe(&object_key);

        let response = self
            .client
            .get_object()
            .bucket(&self.config.bucket)
            .key(&object_key)
            .send()
            .await
            .map_err(|error| classify_sdk_error("get_object", &target_label, &error))?;

        let payload = response.body.collect().await.map_err(|error| {
            TransportError::Request(format!(
                "R2 get_object_body failed for {target_label}: {error}"
            ))
        })?;

        let bytes = payload.into_bytes().to_vec();
        tracing::debug!("Downloaded {} bytes from {target_label}", bytes.len());
        Ok(bytes)
    }

    async fn upload(
        &self,
        target: &SyncTarget,
        bytes: Vec<u8>,
    ) -> std::result::Result<SyncTarget, TransportError> {
        let object_key = self.object_key(target);
        let target_label = self.describe(&object_key);
        let size = bytes.len();

        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&object_key)
            .content_type(SNAPSHOT_CONTENT_TYPE)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|error| classify_sdk_error("put_object", &target_label, &error))?;

        tracing::debug!("Uploaded {size} bytes to {target_label}");
        Ok(SyncTarget::Existing {
            id: object_key,
            name: target.name().to_string(),
        })
    }

    async fn list_names(&self) -> std::result::Result<Vec<String>, TransportError> {
        let folder = self.folder();
        let mut names = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let response = self
                .client
                .list_objects_v2()
                .bucket(&self.config.bucket)
                .prefix(&folder)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|error| classify_sdk_error("list_objects_v2", &self.describe(&folder), &error))?;

            names.extend(
                response
                    .contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .filter_map(|key| key.strip_prefix(folder.as_str()))
                    .filter(|name| !name.contains('/') && name.ends_with(SYNC_FILE_EXTENSION))
                    .map(ToOwned::to_owned),
            );

            match response.next_continuation_token() {
                Some(token) if response.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }

        names.sort();
        Ok(names)
    }
}

fn folder(prefix: &str) -> String {
    if prefix.is_empty() {
        String::new()
    } else {
        format!("{prefix}/")
    }
}

fn object_key(prefix: &str, target: &SyncTarget) -> String {
    match target {
        SyncTarget::Existing { id, .. } => id.trim_matches('/').to_string(),
        SyncTarget::New { name } => format!("{}{}", folder(prefix), name.trim_matches('/')),
    }
}

fn parse_config(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<R2Config>> {
    let value = |key: &str| normalize_text_option(lookup(key));

    let account_id = value(ENV_ACCOUNT_ID);
    let bucket = value(ENV_BUCKET);
    let access_key_id = value(ENV_ACCESS_KEY_ID);
    let secret_access_key = value(ENV_SECRET_ACCESS_KEY);
    let prefix = value(ENV_PREFIX).map(|prefix| prefix.trim_matches('/').to_string());

    let any_present = account_id.is_some()
        || bucket.is_some()
        || access_key_id.is_some()
        || secret_access_key.is_some()
        || prefix.is_some();

    if !any_present {
        return Ok(None);
    }

    let (Some(account_id), Some(bucket), Some(access_key_id), Some(secret_access_key)) =
        (account_id, bucket, access_key_id, secret_access_key)
    else {
        let missing: Vec<&str> = [
            ENV_ACCOUNT_ID,
            ENV_BUCKET,
            ENV_ACCESS_KEY_ID,
            ENV_SECRET_ACCESS_KEY,
        ]
        .into_iter()
        .filter(|key| value(*key).is_none())
        .collect();
        return Err(Error::InvalidInput(format!(
            "R2 configuration is incomplete. Missing: {}",
            missing.join(", ")
        )));
    };

    Ok(Some(R2Config {
        account_id,
        bucket,
        access_key_id,
        secret_access_key,
        prefix: prefix.unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
    }))
}

fn build_s3_client(config: &R2Config) -> Client {
    let credentials = Credentials::new(
        config.access_key_id.clone(),
        config.secret_access_key.clone(),
        None,
        None,
        "larder-core-r2-transport",
    );

    let sdk_config = aws_sdk_s3::config::Builder::new()
        .region(Region::new("auto"))
        .credentials_provider(credentials)
        .endpoint_url(config.endpoint_url())
        .force_path_style(true)
        .build();

    Client::from_conf(sdk_config)
}

fn classify_sdk_error<E>(
    operation: &str,
    target: &str,
    error: &SdkError<E, HttpResponse>,
) -> TransportError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let message = format!(
        "R2 {operation} failed for {target}: {}",
        DisplayErrorContext(error)
    );
    if let TransportError::AuthExpired(_) = TransportError::classify(error) {
        return TransportError::AuthExpired(message);
    }

    let status = error.raw_response().map(|response| response.status().as_u16());
    match classify_response(status, error.code()) {
        ResponseClass::AuthExpired => TransportError::AuthExpired(message),
        ResponseClass::NotFound => TransportError::NotFound(message),
        ResponseClass::Other => TransportError::Request(message),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResponseClass {
    AuthExpired,
    NotFound,
    Other,
}

fn classify_response(status: Option<u16>, code: Option<&str>) -> ResponseClass {
    if status == Some(401) || code.is_some_and(|code| AUTH_EXPIRED_CODES.contains(&code)) {
        ResponseClass::AuthExpired
    } else if status == Some(404) || matches!(code, Some("NoSuchKey" | "NotFound")) {
        ResponseClass::NotFound
    } else {
        ResponseClass::Other
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn parse_from_map(map: &HashMap<&str, &str>) -> Result<Option<R2Config>> {
        parse_config(|key| map.get(key).map(|value| (*value).to_string()))
    }

    fn full_map() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (ENV_ACCOUNT_ID, "account-1"),
            (ENV_BUCKET, "bucket-a"),
            (ENV_ACCESS_KEY_ID, "AKID123"),
            (ENV_SECRET_ACCESS_KEY, "SECRET123"),
        ])
    }

    #[test]
    fn parse_config_none_returns_none() {
        let map = HashMap::new();
        assert!(parse_from_map(&map).unwrap().is_none());
    }

    #[test]
    fn parse_config_requires_all_required_values() {
        let mut map = HashMap::new();
        map.insert(ENV_ACCOUNT_ID, "account");
        map.insert(ENV_BUCKET, "bucket");

        let err = parse_from_map(&map).unwrap_err();
        match err {
            Error::InvalidInput(message) => {
                assert!(message.contains(ENV_ACCESS_KEY_ID));
                assert!(message.contains(ENV_SECRET_ACCESS_KEY));
                assert!(!message.contains(ENV_BUCKET));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_config_treats_blank_values_as_missing() {
        let mut map = full_map();
        map.insert(ENV_BUCKET, "   ");

        let err = parse_from_map(&map).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(message) if message.contains(ENV_BUCKET)));
    }

    #[test]
    fn parse_config_defaults_prefix_and_builds_endpoint() {
        let config = parse_from_map(&full_map()).unwrap().unwrap();
        assert_eq!(config.prefix, "larder");
        assert_eq!(
            config.endpoint_url(),
            "https://account-1.r2.cloudflarestorage.com"
        );
    }

    #[test]
    fn parse_config_trims_prefix_slashes() {
        let mut map = full_map();
        map.insert(ENV_PREFIX, "/meals/sync/");
        let config = parse_from_map(&map).unwrap().unwrap();
        assert_eq!(config.prefix, "meals/sync");
    }

    #[test]
    fn config_debug_redacts_secret() {
        let config = parse_from_map(&full_map()).unwrap().unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("SECRET123"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn object_keys_live_under_prefix() {
        let new = SyncTarget::New {
            name: "home.mealsync".to_string(),
        };
        assert_eq!(object_key("larder", &new), "larder/home.mealsync");
        assert_eq!(object_key("", &new), "home.mealsync");

        let existing = SyncTarget::Existing {
            id: "/other/home.mealsync".to_string(),
            name: "home.mealsync".to_string(),
        };
        assert_eq!(object_key("larder", &existing), "other/home.mealsync");
    }

    #[test]
    fn classify_response_detects_expired_credentials() {
        assert_eq!(classify_response(Some(401), None), ResponseClass::AuthExpired);
        assert_eq!(
            classify_response(Some(400), Some("ExpiredToken")),
            ResponseClass::AuthExpired
        );
        assert_eq!(
            classify_response(Some(403), Some("RequestExpired")),
            ResponseClass::AuthExpired
        );
        assert_eq!(
            classify_response(Some(404), Some("NoSuchKey")),
            ResponseClass::NotFound
        );
        assert_eq!(
            classify_response(Some(403), Some("AccessDenied")),
            ResponseClass::Other
        );
        assert_eq!(classify_response(None, None), ResponseClass::Other);
    }

    #[tokio::test(flavor = "multi_thread")]
    #[ignore = "Requires LARDER_R2_* env vars plus network access"]
    async fn r2_snapshot_roundtrip() {
        let _ = dotenvy::dotenv();

        let config = R2Config::from_env()
            .expect("R2 env parsing should not error")
            .expect("R2 config should be present");
        let transport = R2Transport::new(config.clone());

        transport
            .bucket_is_reachable()
            .await
            .unwrap_or_else(|error| {
                panic!(
                    "R2 bucket health check failed for bucket '{}': {error}",
                    config.bucket
                )
            });

        let target = SyncTarget::New {
            name: format!(
                "integration-{}{SYNC_FILE_EXTENSION}",
                chrono::Utc::now().timestamp_millis()
            ),
        };
        let created = transport
            .upload(&target, b"larder-roundtrip".to_vec())
            .await
            .unwrap_or_else(|error| panic!("R2 upload failed: {error}"));

        assert!(transport.exists(&created).await.unwrap());
        assert_eq!(
            transport.download(&created).await.unwrap(),
            b"larder-roundtrip".to_vec()
        );
        assert!(transport
            .list_names()
            .await
            .unwrap()
            .contains(&target.name().to_string()));
    }
}
