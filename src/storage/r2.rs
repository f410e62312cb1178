//! Object storage using Cloudflare R2
//!
//! Media objects are served publicly via the bucket's custom domain;
//! this client only writes, lists and deletes them.

use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::error::DisplayErrorContext;
use bytes::Bytes;

use super::ObjectStore;
use crate::error::AppError;

fn build_r2_http_client() -> aws_sdk_s3::config::SharedHttpClient {
    use aws_smithy_runtime::client::http::hyper_014::HyperClientBuilder;

    let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_only()
        .enable_http1()
        .enable_http2()
        .build();

    HyperClientBuilder::new().build(https_connector)
}

/// R2 bucket client
pub struct R2Store {
    /// S3-compatible client for R2
    client: S3Client,
    /// Bucket holding media and the manifest
    bucket: String,
}

impl R2Store {
    /// Create new R2 client
    ///
    /// # Arguments
    /// * `bucket` - Bucket name
    /// * `cloudflare` - Cloudflare credentials
    pub fn new(bucket: &str, cloudflare: &crate::config::CloudflareConfig) -> Self {
        use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

        // R2 endpoint: https://{account_id}.r2.cloudflarestorage.com
        let endpoint = format!("https://{}.r2.cloudflarestorage.com", cloudflare.account_id);

        let credentials = Credentials::new(
            &cloudflare.r2_access_key_id,
            &cloudflare.r2_secret_access_key,
            None,
            None,
            "instagallery-r2",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("auto"))
            .endpoint_url(&endpoint)
            .credentials_provider(credentials)
            .http_client(build_r2_http_client())
            .build();

        Self {
            client: S3Client::from_conf(s3_config),
            bucket: bucket.to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for R2Store {
    async fn list_keys(&self) -> Result<Vec<String>, AppError> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|e| {
                    AppError::Storage(format!("R2 list failed: {}", DisplayErrorContext(&e)))
                })?;

            keys.extend(
                output
                    .contents()
                    .iter()
                    .filter_map(|object| object.key().map(ToOwned::to_owned)),
            );

            match output.next_continuation_token() {
                Some(token) if output.is_truncated().unwrap_or(false) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(keys)
    }

    async fn exists(&self, key: &str) -> Result<bool, AppError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(AppError::Storage(format!(
                "R2 head failed for {key}: {}",
                DisplayErrorContext(&e)
            ))),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, AppError> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) if e.as_service_error().is_some_and(|se| se.is_no_such_key()) => {
                return Ok(None);
            }
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "R2 get failed for {key}: {}",
                    DisplayErrorContext(&e)
                )));
            }
        };

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| AppError::Storage(format!("R2 read failed for {key}: {e}")))?;

        Ok(Some(data.into_bytes()))
    }

    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<(), AppError> {
        use aws_sdk_s3::primitives::ByteStream;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .set_content_type(content_type.map(ToOwned::to_owned))
            .send()
            .await
            .map_err(|e| {
                AppError::Storage(format!("R2 upload failed for {key}: {}", DisplayErrorContext(&e)))
            })?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                AppError::Storage(format!("R2 delete failed for {key}: {}", DisplayErrorContext(&e)))
            })?;

        Ok(())
    }
}
