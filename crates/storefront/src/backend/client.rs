//! HTTP client for the fabrication backend.
//!
//! Uses `reqwest` 0.13 against the backend's JSON envelope API. Catalog and
//! content reads are cached with `moka` (5-minute TTL); everything else goes
//! straight through. There are no automatic retries.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{StatusCode, header, multipart};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use agah_core::ServiceId;

use crate::backend::BackendError;
use crate::backend::cache::CacheValue;
use crate::backend::types::{
    AuthPayload, ChangePasswordRequest, CompanyInfo, ContactRequest, DesignUpload, Envelope,
    HomepageData, LoginRequest, Order, OrderDraft, ProfileUpdate, RegisterRequest,
    ResetPasswordRequest, Service, User,
};
use crate::config::BackendConfig;

/// Client for the fabrication backend API.
///
/// Cheap to clone; all state lives behind an `Arc`.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<String, CacheValue>,
}

impl BackendClient {
    /// Create a new backend client.
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(BackendClientInner {
                client: reqwest::Client::new(),
                base_url: config.api_url.clone(),
                cache,
            }),
        }
    }

    fn url(&self, path: &str) -> Result<Url, BackendError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Send a request and unwrap the response envelope.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = request.send().await?;
        let status = response.status();

        // 401 drives the forced-logout path regardless of body shape.
        if status == StatusCode::UNAUTHORIZED {
            return Err(BackendError::Unauthorized);
        }

        let response_text = response.text().await?;

        let envelope: Envelope<T> = match serde_json::from_str(&response_text) {
            Ok(envelope) => envelope,
            Err(e) => {
                if status == StatusCode::NOT_FOUND {
                    return Err(BackendError::NotFound);
                }
                if !status.is_success() {
                    return Err(BackendError::Status(status));
                }
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "failed to parse backend response"
                );
                return Err(BackendError::Parse(e));
            }
        };

        if !envelope.success {
            if status == StatusCode::NOT_FOUND {
                return Err(BackendError::NotFound);
            }
            let text = envelope
                .error
                .or(envelope.message)
                .unwrap_or_else(|| "Unknown backend error".to_owned());
            return Err(BackendError::Rejected(text));
        }

        envelope.data.ok_or(BackendError::Empty)
    }

    /// Send a request whose success carries no payload (logout, contact).
    async fn send_unit(&self, request: reqwest::RequestBuilder) -> Result<(), BackendError> {
        match self.send::<serde_json::Value>(request).await {
            Ok(_) | Err(BackendError::Empty) => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::RequestBuilder, BackendError> {
        Ok(self.inner.client.post(self.url(path)?).json(body))
    }

    fn authorized(request: reqwest::RequestBuilder, token: &str) -> reqwest::RequestBuilder {
        request.header(header::AUTHORIZATION, format!("Token {token}"))
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// `Rejected` carries the backend's own error text for bad credentials.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, BackendError> {
        let body = LoginRequest {
            email: email.to_owned(),
            password: password.to_owned(),
        };
        self.send(self.post_json("/api/auth/login/", &body)?).await
    }

    /// Register a new account. The backend logs the account in and returns
    /// a token alongside the user.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn register(&self, form: &RegisterRequest) -> Result<AuthPayload, BackendError> {
        self.send(self.post_json("/api/auth/register/", form)?)
            .await
    }

    /// Invalidate the token server-side.
    #[instrument(skip(self, token))]
    pub async fn logout(&self, token: &str) -> Result<(), BackendError> {
        let request = Self::authorized(self.inner.client.post(self.url("/api/auth/logout/")?), token);
        self.send_unit(request).await
    }

    /// Fetch the authenticated user's profile.
    #[instrument(skip(self, token))]
    pub async fn profile(&self, token: &str) -> Result<User, BackendError> {
        let request = Self::authorized(self.inner.client.get(self.url("/api/auth/profile/")?), token);
        self.send(request).await
    }

    /// Update the authenticated user's profile, returning the fresh record.
    #[instrument(skip(self, token, update))]
    pub async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<User, BackendError> {
        let request = Self::authorized(
            self.inner
                .client
                .put(self.url("/api/auth/profile/")?)
                .json(update),
            token,
        );
        self.send(request).await
    }

    /// Change the authenticated user's password.
    #[instrument(skip_all)]
    pub async fn change_password(
        &self,
        token: &str,
        request: &ChangePasswordRequest,
    ) -> Result<(), BackendError> {
        let request = Self::authorized(
            self.post_json("/api/auth/change-password/", request)?,
            token,
        );
        self.send_unit(request).await
    }

    /// Request a password-reset email. The backend answers success for
    /// unknown addresses too, so this leaks nothing.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn request_password_reset(&self, email: &str) -> Result<(), BackendError> {
        let body = serde_json::json!({ "email": email });
        self.send_unit(self.post_json("/api/auth/request-password-reset/", &body)?)
            .await
    }

    /// Complete a password reset with the emailed token.
    #[instrument(skip_all)]
    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> Result<(), BackendError> {
        self.send_unit(self.post_json("/api/auth/reset-password/", request)?)
            .await
    }

    // =========================================================================
    // Catalog and content (cached)
    // =========================================================================

    /// Get the home-page aggregate (featured services, company info, stats).
    #[instrument(skip(self))]
    pub async fn homepage(&self) -> Result<HomepageData, BackendError> {
        let cache_key = "homepage".to_owned();
        if let Some(CacheValue::Homepage(data)) = self.inner.cache.get(&cache_key).await {
            debug!("cache hit for homepage");
            return Ok(*data);
        }

        let data: HomepageData = self
            .send(self.inner.client.get(self.url("/api/homepage/")?))
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Homepage(Box::new(data.clone())))
            .await;
        Ok(data)
    }

    /// List the active fabrication services.
    #[instrument(skip(self))]
    pub async fn services(&self) -> Result<Vec<Service>, BackendError> {
        let cache_key = "services".to_owned();
        if let Some(CacheValue::Services(services)) = self.inner.cache.get(&cache_key).await {
            debug!("cache hit for services");
            return Ok(services);
        }

        let services: Vec<Service> = self
            .send(self.inner.client.get(self.url("/api/services/")?))
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Services(services.clone()))
            .await;
        Ok(services)
    }

    /// Get one service by ID.
    ///
    /// # Errors
    ///
    /// `NotFound` when the service does not exist or is inactive.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn service(&self, id: ServiceId) -> Result<Service, BackendError> {
        let cache_key = format!("service:{id}");
        if let Some(CacheValue::Service(service)) = self.inner.cache.get(&cache_key).await {
            debug!("cache hit for service");
            return Ok(*service);
        }

        let service: Service = self
            .send(
                self.inner
                    .client
                    .get(self.url(&format!("/api/services/{id}/"))?),
            )
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Service(Box::new(service.clone())))
            .await;
        Ok(service)
    }

    /// Get the company profile.
    #[instrument(skip(self))]
    pub async fn company(&self) -> Result<CompanyInfo, BackendError> {
        let cache_key = "company".to_owned();
        if let Some(CacheValue::Company(info)) = self.inner.cache.get(&cache_key).await {
            debug!("cache hit for company info");
            return Ok(*info);
        }

        let info: CompanyInfo = self
            .send(self.inner.client.get(self.url("/api/company/")?))
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Company(Box::new(info.clone())))
            .await;
        Ok(info)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Submit an order as a multipart form with per-line design files.
    #[instrument(skip(self, draft, files), fields(lines = draft.items.len()))]
    pub async fn create_order(
        &self,
        draft: OrderDraft,
        files: Vec<DesignUpload>,
    ) -> Result<Order, BackendError> {
        let mut form = multipart::Form::new()
            .text("customer_name", draft.customer_name)
            .text("customer_email", draft.customer_email)
            .text("items", serde_json::to_string(&draft.items)?);
        if let Some(phone) = draft.customer_phone {
            form = form.text("customer_phone", phone);
        }
        if let Some(notes) = draft.additional_notes {
            form = form.text("additional_notes", notes);
        }
        for file in files {
            let part = multipart::Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(&file.content_type)?;
            form = form.part(format!("design_file_{}", file.line_index), part);
        }

        self.send(
            self.inner
                .client
                .post(self.url("/api/orders/create/")?)
                .multipart(form),
        )
        .await
    }

    /// List the authenticated user's orders.
    #[instrument(skip(self, token))]
    pub async fn my_orders(&self, token: &str) -> Result<Vec<Order>, BackendError> {
        let request = Self::authorized(
            self.inner.client.get(self.url("/api/orders/my-orders/")?),
            token,
        );
        self.send(request).await
    }

    /// List orders for a customer email (guest lookup).
    #[instrument(skip(self), fields(email = %email))]
    pub async fn orders_by_customer(&self, email: &str) -> Result<Vec<Order>, BackendError> {
        let mut url = self.url("/api/orders/customer/")?;
        url.query_pairs_mut().append_pair("email", email);
        self.send(self.inner.client.get(url)).await
    }

    /// Look up one order by its public order number.
    #[instrument(skip(self), fields(order_number = %order_number))]
    pub async fn track_order(&self, order_number: &str) -> Result<Order, BackendError> {
        self.send(
            self.inner
                .client
                .get(self.url(&format!("/api/orders/track/{order_number}/"))?),
        )
        .await
    }

    /// Accept a quoted order.
    #[instrument(skip(self), fields(order_number = %order_number))]
    pub async fn confirm_order(&self, order_number: &str) -> Result<Order, BackendError> {
        let body = serde_json::json!({ "order_number": order_number });
        self.send(self.post_json("/api/orders/confirm/", &body)?)
            .await
    }

    /// Cancel an open order.
    #[instrument(skip(self), fields(order_number = %order_number))]
    pub async fn cancel_order(&self, order_number: &str) -> Result<Order, BackendError> {
        let body = serde_json::json!({ "order_number": order_number });
        self.send(self.post_json("/api/orders/cancel/", &body)?)
            .await
    }

    // =========================================================================
    // Contact
    // =========================================================================

    /// Submit the contact form. Callers validate with
    /// [`ContactRequest::validate`] first.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn contact(&self, form: &ContactRequest) -> Result<(), BackendError> {
        self.send_unit(self.post_json("/api/contact/", form)?).await
    }
}
