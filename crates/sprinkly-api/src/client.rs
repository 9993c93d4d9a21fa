// Device HTTP client
//
// Wraps `reqwest::Client` with endpoint URL construction, shared-secret
// injection and envelope checking. Every call is a GET carrying the
// hashed password plus one query parameter per property.

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::debug;
use url::Url;

use crate::auth::DevicePassword;
use crate::endpoint::{Endpoint, ResultCode};
use crate::error::Error;
use crate::transport::TransportConfig;

/// A flat JSON object as returned by every device endpoint.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Query parameters for a single request, in order.
pub type QueryParams = Vec<(String, String)>;

/// The transport seam consumed by the property engine.
///
/// One logical endpoint plus parameters in, one JSON object out. Fails on
/// non-2xx status or a non-success `result` code.
pub trait Transport: Send + Sync {
    fn execute<'a>(
        &'a self,
        endpoint: Endpoint,
        params: &'a [(String, String)],
    ) -> BoxFuture<'a, Result<JsonObject, Error>>;
}

/// Raw HTTP client for a single irrigation controller.
pub struct DeviceClient {
    http: reqwest::Client,
    base_url: Url,
    password: DevicePassword,
}

impl DeviceClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the device root, e.g. `http://192.168.1.20:8080`.
    pub fn new(
        base_url: Url,
        password: DevicePassword,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, password))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, password: DevicePassword) -> Self {
        Self {
            http,
            base_url,
            password,
        }
    }

    /// The device base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the full URL for an endpoint: `{base}/{path}`.
    pub(crate) fn endpoint_url(&self, endpoint: Endpoint) -> Result<Url, Error> {
        Ok(self.base_url.join(endpoint.path())?)
    }

    /// Execute one request and return the checked JSON object.
    pub async fn request(
        &self,
        endpoint: Endpoint,
        params: &[(String, String)],
    ) -> Result<JsonObject, Error> {
        let url = self.endpoint_url(endpoint)?;

        if params.is_empty() {
            debug!(%endpoint, "request");
        } else {
            debug!(%endpoint, ?params, "request");
        }

        let resp = self
            .http
            .get(url)
            .query(&[("pw", self.password.expose())])
            .query(params)
            .send()
            .await
            .map_err(Error::Transport)?;

        parse_response(endpoint, resp).await
    }
}

impl Transport for DeviceClient {
    fn execute<'a>(
        &'a self,
        endpoint: Endpoint,
        params: &'a [(String, String)],
    ) -> BoxFuture<'a, Result<JsonObject, Error>> {
        self.request(endpoint, params).boxed()
    }
}

/// Check status and envelope, returning the object on success.
async fn parse_response(endpoint: Endpoint, resp: reqwest::Response) -> Result<JsonObject, Error> {
    let status = resp.status();
    if !status.is_success() {
        return Err(Error::HttpStatus {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        });
    }

    let body = resp.text().await.map_err(Error::Transport)?;

    let value: serde_json::Value =
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: body.clone(),
        })?;

    let serde_json::Value::Object(object) = value else {
        return Err(Error::Deserialization {
            message: "expected a JSON object".into(),
            body,
        });
    };

    debug!(%endpoint, keys = object.len(), "response");

    if let Some(result) = object.get("result") {
        let code = ResultCode::from_code(result.as_i64().unwrap_or_default());
        if code != ResultCode::Success {
            return Err(Error::InvalidRequest { code });
        }
    }

    Ok(object)
}
