// # domrec-gateway-gandi
//
// Gandi v5 implementation of the `RemoteGateway` trait for the domrec
// reconciliation engine.
//
// ## Scope
//
// This crate is a thin transport adapter:
//
// - Makes one HTTP request per gateway call
// - Reports the remote status code verbatim in `GatewayError` (404 is the
//   sole not-found signal; classification happens in domrec-core)
// - NO retry or backoff logic (owned by the host; a blind retry of a
//   non-idempotent create could duplicate remote resources)
// - NO caching or state between calls
// - The access token never appears in logs or Debug output
//
// ## API Reference
//
// - LiveDNS records: https://api.gandi.net/docs/livedns/
// - Domains and web redirections: https://api.gandi.net/docs/domains/
// - Email forwards: https://api.gandi.net/docs/email/

mod config;
mod wire;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use domrec_core::traits::{
    DomainInfo, ForwardInfo, ForwardWrite, GatewayError, GatewayResult, RecordInfo, RecordWrite,
    RedirectionInfo, RedirectionUpdate, RedirectionWrite, RemoteGateway,
};

use wire::{
    ApiDomain, ApiErrorBody, ApiForward, ApiForwardUpdate, ApiRecord, ApiRecordUpdate,
    ApiRecordWrite, ApiRedirection, ApiRedirectionUpdate, ApiRedirectionWrite,
};

pub use config::{ConfigError, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, GandiConfig};

/// Connect timeout for API requests
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Gandi v5 gateway
///
/// # Security
///
/// The Debug implementation intentionally does not expose the access token.
pub struct GandiGateway {
    config: GandiConfig,
    client: reqwest::Client,
}

impl std::fmt::Debug for GandiGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GandiGateway")
            .field("personal_access_token", &"<REDACTED>")
            .field("base_url", &self.config.base_url)
            .field("timeout_secs", &self.config.timeout_secs)
            .finish()
    }
}

impl GandiGateway {
    /// Create a gateway from a validated configuration
    pub fn new(config: GandiConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to build HTTP client");

        Ok(Self { config, client })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url, path);
        debug!("{} {}", method, url);
        self.client
            .request(method, url)
            .bearer_auth(&self.config.personal_access_token)
    }

    /// Send a request and surface non-2xx responses as status-preserving
    /// gateway errors.
    async fn execute(&self, builder: reqwest::RequestBuilder) -> GatewayResult<reqwest::Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(error_from_response(status.as_u16(), &body))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> GatewayResult<T> {
        let response = self.execute(self.request(Method::GET, path)).await?;
        decode(response).await
    }

    async fn send_json<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> GatewayResult<()> {
        self.execute(self.request(method, path).json(body)).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> GatewayResult<()> {
        self.execute(self.request(Method::DELETE, path)).await?;
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> GatewayResult<T> {
    response
        .json()
        .await
        .map_err(|e| GatewayError::transport(format!("failed to decode response: {}", e)))
}

/// Build a gateway error from a non-2xx response, preserving the status code
/// and extracting the most useful message the body offers.
fn error_from_response(status: u16, body: &str) -> GatewayError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(ApiErrorBody::into_message)
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("HTTP {}", status)
            } else {
                trimmed.to_string()
            }
        });
    GatewayError::status(status, message)
}

/// Pick the forward with an exactly matching source out of a listing.
///
/// The API lists forwards per domain instead of addressing one; a source
/// missing from the listing is synthesized into a 404-status error so the
/// "404 is the sole not-found signal" contract holds for forwards too.
fn find_forward(forwards: Vec<ApiForward>, source: &str) -> GatewayResult<ApiForward> {
    forwards
        .into_iter()
        .find(|f| f.source == source)
        .ok_or_else(|| {
            GatewayError::status(404, format!("no forwarding found with source {}", source))
        })
}

#[async_trait]
impl RemoteGateway for GandiGateway {
    async fn get_domain(&self, fqdn: &str) -> GatewayResult<DomainInfo> {
        let api: ApiDomain = self
            .get_json(&format!("/domain/domains/{}", fqdn))
            .await?;
        Ok(api.into())
    }

    async fn get_record(&self, zone: &str, name: &str, rtype: &str) -> GatewayResult<RecordInfo> {
        let api: ApiRecord = self
            .get_json(&format!(
                "/livedns/domains/{}/records/{}/{}",
                zone, name, rtype
            ))
            .await?;
        Ok(api.into())
    }

    async fn create_record(&self, zone: &str, record: &RecordWrite) -> GatewayResult<()> {
        let body = ApiRecordWrite::from(record);
        self.send_json(
            Method::POST,
            &format!("/livedns/domains/{}/records", zone),
            &body,
        )
        .await
    }

    async fn update_record(
        &self,
        zone: &str,
        name: &str,
        rtype: &str,
        ttl: Option<u32>,
        values: &[String],
    ) -> GatewayResult<()> {
        let body = ApiRecordUpdate {
            ttl,
            values: values.to_vec(),
        };
        self.send_json(
            Method::PUT,
            &format!("/livedns/domains/{}/records/{}/{}", zone, name, rtype),
            &body,
        )
        .await
    }

    async fn delete_record(&self, zone: &str, name: &str, rtype: &str) -> GatewayResult<()> {
        self.delete(&format!(
            "/livedns/domains/{}/records/{}/{}",
            zone, name, rtype
        ))
        .await
    }

    async fn get_redirection(&self, domain: &str, host: &str) -> GatewayResult<RedirectionInfo> {
        let api: ApiRedirection = self
            .get_json(&format!("/domain/domains/{}/webredirs/{}", domain, host))
            .await?;
        Ok(api.into())
    }

    async fn create_redirection(
        &self,
        domain: &str,
        redirection: &RedirectionWrite,
    ) -> GatewayResult<()> {
        let body = ApiRedirectionWrite::from(redirection);
        self.send_json(
            Method::POST,
            &format!("/domain/domains/{}/webredirs", domain),
            &body,
        )
        .await
    }

    async fn update_redirection(
        &self,
        domain: &str,
        host: &str,
        update: &RedirectionUpdate,
    ) -> GatewayResult<()> {
        let body = ApiRedirectionUpdate::from(update);
        self.send_json(
            Method::PUT,
            &format!("/domain/domains/{}/webredirs/{}", domain, host),
            &body,
        )
        .await
    }

    async fn delete_redirection(&self, domain: &str, host: &str) -> GatewayResult<()> {
        self.delete(&format!("/domain/domains/{}/webredirs/{}", domain, host))
            .await
    }

    async fn get_forward(&self, domain: &str, source: &str) -> GatewayResult<ForwardInfo> {
        let builder = self
            .request(Method::GET, &format!("/email/forwards/{}", domain))
            .query(&[("source", source)]);
        let response = self.execute(builder).await?;
        let forwards: Vec<ApiForward> = decode(response).await?;
        Ok(find_forward(forwards, source)?.into())
    }

    async fn create_forward(&self, domain: &str, forward: &ForwardWrite) -> GatewayResult<()> {
        let body = ApiForward {
            source: forward.source.clone(),
            destinations: forward.destinations.clone(),
        };
        self.send_json(Method::POST, &format!("/email/forwards/{}", domain), &body)
            .await
    }

    async fn update_forward(
        &self,
        domain: &str,
        source: &str,
        destinations: &[String],
    ) -> GatewayResult<()> {
        let body = ApiForwardUpdate {
            destinations: destinations.to_vec(),
        };
        self.send_json(
            Method::PUT,
            &format!("/email/forwards/{}/{}", domain, source),
            &body,
        )
        .await
    }

    async fn delete_forward(&self, domain: &str, source: &str) -> GatewayResult<()> {
        self.delete(&format!("/email/forwards/{}/{}", domain, source))
            .await
    }
}
