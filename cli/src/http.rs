//! Native transport for the authentication API over `reqwest`.
//!
//! Mirrors the browser transport: JSON bodies, the static API key header,
//! and the session carried as cookies. The browser keeps cookies itself;
//! here they live in a [`CookieJar`] that the caller can print and feed back
//! in on the next run. State-changing requests echo the CSRF cookie as
//! `X-CSRF-TOKEN`.

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use critzone::api::{self, AuthApi};
use critzone::config::{API_KEY_HEADER, ApiConfig, paths};
use critzone::types::{Credentials, LoginResponse, MessageResponse, OtpRequest, Role, SessionCheck, SignupRequest};
use critzone::ApiError;
use reqwest::header::{COOKIE, HeaderMap, HeaderName, HeaderValue, SET_COOKIE};
use reqwest::Method;
use serde::Serialize;

use crate::CliError;
use crate::cookies::{CSRF_ACCESS_COOKIE, CSRF_REFRESH_COOKIE, CookieJar};

pub const CSRF_HEADER: &str = "x-csrf-token";

/// CSRF token to echo for a request, if any.
///
/// Reads never need one. `/auth/refresh` is guarded by the refresh token's
/// CSRF cookie; everything else by the access token's.
#[must_use]
pub fn csrf_token<'a>(jar: &'a CookieJar, method: &Method, path: &str) -> Option<&'a str> {
    if *method == Method::GET {
        return None;
    }
    let cookie = if path == paths::REFRESH { CSRF_REFRESH_COOKIE } else { CSRF_ACCESS_COOKIE };
    jar.get(cookie)
}

/// [`AuthApi`] over `reqwest` with an in-memory cookie jar.
#[derive(Debug)]
pub struct HttpAuthApi {
    config: ApiConfig,
    client: reqwest::Client,
    jar: Mutex<CookieJar>,
}

impl HttpAuthApi {
    /// # Errors
    ///
    /// Fails if the API key is not a valid header value or the HTTP client
    /// cannot be built.
    pub fn new(config: ApiConfig, jar: CookieJar) -> Result<Self, CliError> {
        let mut headers = HeaderMap::new();
        if !config.api_key().is_empty() {
            headers.insert(HeaderName::from_static(API_KEY_HEADER), HeaderValue::from_str(config.api_key())?);
        }
        let client = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(Self { config, client, jar: Mutex::new(jar) })
    }

    /// Current cookies as a `Cookie` header value.
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        self.jar.lock().unwrap_or_else(PoisonError::into_inner).header()
    }

    /// `GET /health`.
    pub async fn health(&self) -> Result<MessageResponse, ApiError> {
        let (status, body) = self.call::<()>(Method::GET, paths::HEALTH, None).await?;
        api::decode(status, &body)
    }

    /// `POST /auth/refresh`: mint a new access cookie from the refresh cookie.
    pub async fn refresh(&self) -> Result<MessageResponse, ApiError> {
        let (status, body) = self.call::<()>(Method::POST, paths::REFRESH, None).await?;
        api::decode(status, &body)
    }

    async fn call<B: Serialize>(&self, method: Method, path: &str, body: Option<&B>) -> Result<(u16, String), ApiError> {
        let (cookie, csrf) = {
            let jar = self.jar.lock().unwrap_or_else(PoisonError::into_inner);
            (jar.header(), csrf_token(&jar, &method, path).map(ToOwned::to_owned))
        };

        tracing::debug!(%method, path, "api request");
        let mut request = self.client.request(method, self.config.endpoint(path));
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        if let Some(csrf) = csrf {
            request = request.header(CSRF_HEADER, csrf);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        {
            let mut jar = self.jar.lock().unwrap_or_else(PoisonError::into_inner);
            for value in response.headers().get_all(SET_COOKIE) {
                if let Ok(value) = value.to_str() {
                    jar.absorb(value);
                }
            }
        }
        let text = response.text().await.map_err(|e| ApiError::Network(e.to_string()))?;
        tracing::debug!(status, path, "api response");
        Ok((status, text))
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<(u16, String), ApiError> {
        self.call(Method::POST, path, Some(body)).await
    }
}

#[async_trait(?Send)]
impl AuthApi for HttpAuthApi {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let (status, body) = self.post(paths::LOGIN, credentials).await?;
        api::decode_login(status, &body, None)
    }

    async fn signup(&self, request: &SignupRequest) -> Result<MessageResponse, ApiError> {
        let (status, body) = self.post(paths::SIGNUP, request).await?;
        api::decode(status, &body)
    }

    async fn check_session(&self) -> Result<SessionCheck, ApiError> {
        let (status, body) = self.call::<()>(Method::GET, paths::ME, None).await?;
        api::decode_session_check(status, &body)
    }

    async fn logout(&self) -> Result<MessageResponse, ApiError> {
        let (status, body) = self.call::<()>(Method::POST, paths::LOGOUT, None).await?;
        api::decode(status, &body)
    }

    async fn host_login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let (status, body) = self.post(paths::HOST_LOGIN, credentials).await?;
        api::decode_login(status, &body, Some(Role::Host))
    }

    async fn host_signup(&self, request: &SignupRequest) -> Result<MessageResponse, ApiError> {
        let (status, body) = self.post(paths::HOST_SIGNUP, request).await?;
        api::decode(status, &body)
    }

    async fn resend_verification(&self) -> Result<MessageResponse, ApiError> {
        let (status, body) = self.call::<()>(Method::POST, paths::GENERATE_OTP, None).await?;
        api::decode(status, &body)
    }

    async fn verify_otp(&self, request: &OtpRequest) -> Result<MessageResponse, ApiError> {
        let (status, body) = self.post(paths::VERIFY_OTP, request).await?;
        api::decode(status, &body)
    }
}
