//! Authenticated JSON calls against the design backend.
//!
//! Every call resolves the current identity, fetches a fresh bearer token and
//! maps non-2xx responses to [`DesignError::Server`] using the `{ "error": ... }`
//! body when the backend sends one. Generation and the design store share it.

use std::sync::Arc;

use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    auth::{AuthProvider, Identity},
    config::Config,
    error::{DesignError, Result, GENERIC_FAILURE_MESSAGE},
    models::{FavoriteResponse, GenerateResponse, GenerationRequest, SaveDesignRequest, SavedDesign},
};

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

pub struct Gateway {
    client: Client,
    base_url: String,
    auth: Arc<dyn AuthProvider>,
    force_refresh: bool,
}

impl Gateway {
    pub fn new(config: &Config, auth: Arc<dyn AuthProvider>) -> Self {
        Self::with_client(Client::new(), config.api_base.clone(), auth, config.force_token_refresh)
    }

    /// Reuse an existing [`Client`] so generation and store calls share one connection pool.
    pub fn with_client(client: Client, base_url: String, auth: Arc<dyn AuthProvider>, force_refresh: bool) -> Self {
        Self { client, base_url: base_url.trim_end_matches('/').to_string(), auth, force_refresh }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The signed-in identity, or [`DesignError::AuthenticationRequired`].
    pub async fn identity(&self) -> Result<Identity> {
        self.auth.current_identity().await.ok_or(DesignError::AuthenticationRequired)
    }

    /// Perform one authenticated call. `headers` are merged over the JSON
    /// content type; `Authorization` is always set last and cannot be removed.
    pub async fn request<B, T>(&self, method: Method, path: &str, body: Option<&B>, headers: HeaderMap) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let identity = self.identity().await?;
        let token = self.auth.token(&identity, self.force_refresh).await?;
        let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| DesignError::TokenUnavailable("token is not a valid header value".into()))?;

        let mut request_headers = HeaderMap::new();
        request_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        request_headers.extend(headers);
        request_headers.insert(AUTHORIZATION, bearer);

        let url = format!("{}{}", self.base_url, path);
        info!("🔗 {} {} (user {})", method, path, identity.uid);

        let mut builder = self.client.request(method, &url).headers(request_headers);
        if let Some(body) = body {
            let payload = serde_json::to_vec(body).map_err(|e| DesignError::Encode(e.to_string()))?;
            builder = builder.body(payload);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!("📥 {} -> {} ({} bytes)", path, status, text.len());

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
            error!("❌ {} failed with status {}: {}", path, status, message);
            return Err(DesignError::Server { status: status.as_u16(), message });
        }

        let raw = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(raw).map_err(|e| DesignError::Decode(format!("{path}: {e}")))
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerateResponse> {
        self.request(Method::POST, "/api/generate", Some(request), HeaderMap::new()).await
    }

    pub async fn save_design(&self, request: &SaveDesignRequest) -> Result<serde_json::Value> {
        self.request(Method::POST, "/api/save-design", Some(request), HeaderMap::new()).await
    }

    pub async fn my_designs(&self) -> Result<Vec<SavedDesign>> {
        self.request::<(), _>(Method::GET, "/api/my-designs", None, HeaderMap::new()).await
    }

    pub async fn delete_design(&self, id: &str) -> Result<()> {
        let path = format!("/api/designs/{id}");
        let _: serde_json::Value = self.request::<(), _>(Method::DELETE, &path, None, HeaderMap::new()).await?;
        Ok(())
    }

    pub async fn toggle_favorite(&self, id: &str) -> Result<FavoriteResponse> {
        let path = format!("/api/designs/{id}/favorite");
        let response: Option<FavoriteResponse> =
            self.request::<(), _>(Method::PATCH, &path, None, HeaderMap::new()).await?;
        Ok(response.unwrap_or_default())
    }
}
