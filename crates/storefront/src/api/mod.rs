//! Backend REST API client.
//!
//! # Architecture
//!
//! - The backend is the source of truth for the authenticated cart and
//!   for product price/stock - no local caching of either.
//! - All field-name normalization happens in [`types`]; business logic
//!   only ever sees canonical `pulperia-core` shapes.
//! - The facade depends on the [`Backend`] trait, not on [`ApiClient`],
//!   so tests can drive it with a scripted in-memory backend.
//!
//! # Endpoints
//!
//! Cart: `GET /carrito`, `POST /carrito/agregar`, `PUT /carrito/modificar`,
//! `DELETE /carrito/eliminar/:productoId`, `POST /carrito/deshacer`,
//! `POST /carrito/rehacer`. Orders: `POST /pedidos/finalizar`,
//! `POST /pedidos/invitado`. Catalog: `GET /productos/:id`.

pub mod types;

pub use types::RemoteProduct;

use std::sync::Arc;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;

use pulperia_core::{AddressId, Cart, CartItem, GuestInfo, OrderId, ProductId};

use crate::config::StorefrontConfig;
use types::{
    CarritoDto, CarritoItemRequest, ErrorBody, FinalizarPedidoRequest, LineaPedidoRequest,
    PedidoDto, PedidoInvitadoRequest, ProductoDto,
};

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response; `message` is the backend's own text when the
    /// body carried one, else the raw body.
    #[error("API error ({status}): {message}")]
    Status { status: u16, message: String },

    /// Response body did not match the expected shape.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Remote operations the cart facade depends on.
///
/// Implemented by [`ApiClient`] in production and by scripted fakes in
/// tests. Methods on the authenticated cart take the bearer token
/// explicitly; the facade owns session state.
#[allow(async_fn_in_trait)]
pub trait Backend {
    /// Authoritative product data (price, stock, name, image).
    async fn product(&self, id: &ProductId) -> Result<RemoteProduct, ApiError>;

    /// Fetch the authenticated cart.
    async fn cart(&self, token: &SecretString) -> Result<Cart, ApiError>;

    /// Add a quantity of a product to the authenticated cart.
    async fn add_item(
        &self,
        token: &SecretString,
        id: &ProductId,
        quantity: u32,
    ) -> Result<(), ApiError>;

    /// Set the quantity of a line in the authenticated cart.
    async fn update_item(
        &self,
        token: &SecretString,
        id: &ProductId,
        quantity: u32,
    ) -> Result<(), ApiError>;

    /// Remove a line from the authenticated cart.
    async fn remove_item(&self, token: &SecretString, id: &ProductId) -> Result<(), ApiError>;

    /// Step the server-maintained cart history back.
    async fn undo(&self, token: &SecretString) -> Result<(), ApiError>;

    /// Step the server-maintained cart history forward.
    async fn redo(&self, token: &SecretString) -> Result<(), ApiError>;

    /// Finalize the authenticated cart into an order.
    async fn finalize_order(
        &self,
        token: &SecretString,
        address: &AddressId,
    ) -> Result<OrderId, ApiError>;

    /// Place a guest order from local cart lines and contact data.
    async fn finalize_guest_order(
        &self,
        info: &GuestInfo,
        items: &[CartItem],
    ) -> Result<OrderId, ApiError>;
}

// =============================================================================
// ApiClient
// =============================================================================

/// Production [`Backend`] over reqwest.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_base_url.as_str().trim_end_matches('/').to_string(),
            }),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.inner.base_url, path.trim_start_matches('/'))
    }

    /// Check the status and decode the response body, extracting the
    /// backend's own error message from non-2xx bodies when present.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(error_from_body(status, &body));
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Like [`Self::decode`] but for endpoints whose body we discard.
    async fn check(response: reqwest::Response) -> Result<(), ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await?;
        Err(error_from_body(status, &body))
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&SecretString>,
        body: &B,
    ) -> Result<T, ApiError> {
        let mut request = self.inner.client.post(self.endpoint(path)).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }
        Self::decode(request.send().await?).await
    }
}

fn error_from_body(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map_or_else(|_| body.to_string(), |e| e.mensaje);
    if status == StatusCode::NOT_FOUND {
        return ApiError::NotFound(message);
    }
    ApiError::Status {
        status: status.as_u16(),
        message,
    }
}

impl Backend for ApiClient {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn product(&self, id: &ProductId) -> Result<RemoteProduct, ApiError> {
        let response = self
            .inner
            .client
            .get(self.endpoint(&format!("productos/{id}")))
            .send()
            .await?;
        let dto: ProductoDto = Self::decode(response).await?;
        Ok(RemoteProduct::from(dto))
    }

    #[instrument(skip(self, token))]
    async fn cart(&self, token: &SecretString) -> Result<Cart, ApiError> {
        let response = self
            .inner
            .client
            .get(self.endpoint("carrito"))
            .bearer_auth(token.expose_secret())
            .send()
            .await?;
        let dto: CarritoDto = Self::decode(response).await?;
        Ok(Cart::from(dto))
    }

    #[instrument(skip(self, token), fields(product_id = %id, quantity))]
    async fn add_item(
        &self,
        token: &SecretString,
        id: &ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let body = CarritoItemRequest {
            producto_id: id.to_string(),
            cantidad: quantity,
        };
        let request = self
            .inner
            .client
            .post(self.endpoint("carrito/agregar"))
            .bearer_auth(token.expose_secret())
            .json(&body);
        Self::check(request.send().await?).await
    }

    #[instrument(skip(self, token), fields(product_id = %id, quantity))]
    async fn update_item(
        &self,
        token: &SecretString,
        id: &ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let body = CarritoItemRequest {
            producto_id: id.to_string(),
            cantidad: quantity,
        };
        let request = self
            .inner
            .client
            .put(self.endpoint("carrito/modificar"))
            .bearer_auth(token.expose_secret())
            .json(&body);
        Self::check(request.send().await?).await
    }

    #[instrument(skip(self, token), fields(product_id = %id))]
    async fn remove_item(&self, token: &SecretString, id: &ProductId) -> Result<(), ApiError> {
        let request = self
            .inner
            .client
            .delete(self.endpoint(&format!("carrito/eliminar/{id}")))
            .bearer_auth(token.expose_secret());
        Self::check(request.send().await?).await
    }

    #[instrument(skip(self, token))]
    async fn undo(&self, token: &SecretString) -> Result<(), ApiError> {
        let request = self
            .inner
            .client
            .post(self.endpoint("carrito/deshacer"))
            .bearer_auth(token.expose_secret());
        Self::check(request.send().await?).await
    }

    #[instrument(skip(self, token))]
    async fn redo(&self, token: &SecretString) -> Result<(), ApiError> {
        let request = self
            .inner
            .client
            .post(self.endpoint("carrito/rehacer"))
            .bearer_auth(token.expose_secret());
        Self::check(request.send().await?).await
    }

    #[instrument(skip(self, token), fields(address = %address))]
    async fn finalize_order(
        &self,
        token: &SecretString,
        address: &AddressId,
    ) -> Result<OrderId, ApiError> {
        let body = FinalizarPedidoRequest {
            direccion_id: address.to_string(),
        };
        let dto: PedidoDto = self
            .post_json("pedidos/finalizar", Some(token), &body)
            .await?;
        Ok(OrderId::new(dto.pedido_id))
    }

    #[instrument(skip(self, info, items))]
    async fn finalize_guest_order(
        &self,
        info: &GuestInfo,
        items: &[CartItem],
    ) -> Result<OrderId, ApiError> {
        let body = PedidoInvitadoRequest {
            datos_invitado: info.clone(),
            items: items
                .iter()
                .map(|item| LineaPedidoRequest {
                    producto_id: item.product_id.to_string(),
                    cantidad: item.quantity,
                })
                .collect(),
        };
        let dto: PedidoDto = self.post_json("pedidos/invitado", None, &body).await?;
        Ok(OrderId::new(dto.pedido_id))
    }
}
