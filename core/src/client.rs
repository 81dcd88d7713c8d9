//! Request builder, dispatcher and response parser for the admin API.
//!
//! # Design
//! `ApiClient` keeps the build/parse split: [`ApiClient::build_request`]
//! turns a [`RequestSpec`] plus an optional bearer token into an
//! [`HttpRequest`], and [`ApiClient::parse_response`] turns an
//! [`HttpResponse`] into JSON or a typed [`ApiError`]. Both are pure.
//! [`ApiClient::send`] strings them together around the injected
//! [`Transport`], resolving the token from the injected [`TokenProvider`]
//! and honouring an optional [`CancelToken`] at the single network await.

use std::fmt;
use std::future::{Future, IntoFuture};
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::TokenProvider;
use crate::cancel::CancelToken;
use crate::config::ClientConfig;
use crate::error::{ApiError, ErrorBody};
use crate::http::{HttpRequest, HttpResponse};
use crate::request::RequestSpec;
use crate::services::{LoginService, UsersService};
use crate::transport::{ReqwestTransport, Transport};

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    tokens: Option<Arc<dyn TokenProvider>>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.tokens.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            tokens: None,
        }
    }

    /// Client over `reqwest` using the configured base URL and user agent.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(&config.user_agent)
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self::new(&config.base_url, Arc::new(transport)))
    }

    pub fn with_token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.tokens = Some(provider);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn login(&self) -> LoginService<'_> {
        LoginService::new(self)
    }

    pub fn users(&self) -> UsersService<'_> {
        UsersService::new(self)
    }

    pub fn build_request(
        &self,
        spec: &RequestSpec,
        token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let url = spec.resolve_url(&self.base_url)?;
        let mut headers = vec![("accept".to_string(), "application/json".to_string())];
        if let Some(media_type) = spec.body.media_type() {
            headers.push(("content-type".to_string(), media_type.to_string()));
        }
        if spec.authenticated {
            if let Some(token) = token {
                headers.push(("authorization".to_string(), format!("Bearer {token}")));
            }
        }
        Ok(HttpRequest {
            method: spec.method,
            url,
            headers,
            body: spec.body.encode()?,
        })
    }

    /// JSON body on 2xx (`Null` when empty); a classified [`ApiError`] otherwise.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, ApiError> {
        if !response.is_success() {
            return Err(ApiError::from_status(
                response.status,
                ErrorBody::parse(&response.body),
            ));
        }
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&response.body)
            .map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// Dispatches `spec`. A 401 to a request that carried a token is
    /// reported back to the provider through [`TokenProvider::rejected`].
    pub async fn send(
        &self,
        spec: RequestSpec,
        cancel: Option<&CancelToken>,
    ) -> Result<Value, ApiError> {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            debug!(url = spec.url, "request cancelled before dispatch");
            return Err(ApiError::Cancelled);
        }

        let token = match (&self.tokens, spec.authenticated) {
            (Some(provider), true) => provider.token().await,
            _ => None,
        };
        let request = self.build_request(&spec, token.as_deref())?;
        let method = request.method.as_str();
        debug!(method, url = %request.url, "dispatching request");

        let outcome = match cancel {
            Some(cancel) => {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => {
                        debug!(method, url = spec.url, "request cancelled in flight");
                        return Err(ApiError::Cancelled);
                    }
                    outcome = self.transport.execute(request) => outcome,
                }
            }
            None => self.transport.execute(request).await,
        };
        let response = outcome.map_err(|e| ApiError::Network(e.to_string()))?;

        debug!(method, url = spec.url, status = response.status, "response received");
        if let Some(description) = spec.documented_error(response.status) {
            debug!(status = response.status, description, "documented error response");
        }
        let result = self.parse_response(response);
        if let (Err(ApiError::Unauthorized { .. }), Some(provider), Some(token)) =
            (&result, &self.tokens, token.as_deref())
        {
            warn!(method, url = spec.url, "bearer token rejected");
            provider.rejected(token);
        }
        result
    }

    pub(crate) fn call<T>(&self, spec: Result<RequestSpec, ApiError>) -> Call<'_, T> {
        Call {
            client: self,
            spec,
            cancel: None,
            output: PhantomData,
        }
    }
}

/// A typed, not-yet-sent API call. Await it to dispatch.
#[must_use = "calls do nothing until awaited"]
pub struct Call<'a, T> {
    client: &'a ApiClient,
    spec: Result<RequestSpec, ApiError>,
    cancel: Option<CancelToken>,
    output: PhantomData<fn() -> T>,
}

impl<T> Call<'_, T> {
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The request this call will send, or the encoding error it will fail with.
    pub fn spec(&self) -> Result<&RequestSpec, &ApiError> {
        self.spec.as_ref()
    }
}

impl<'a, T> IntoFuture for Call<'a, T>
where
    T: DeserializeOwned + Send + 'a,
{
    type Output = Result<T, ApiError>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send + 'a>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            let spec = self.spec?;
            let value = self.client.send(spec, self.cancel.as_ref()).await?;
            serde_json::from_value(value)
                .map_err(|e| ApiError::Deserialization(e.to_string()))
        })
    }
}
