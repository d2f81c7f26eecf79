//! Wire types for the backend REST contract.
//!
//! The backend is loose about field names (`productoId` vs `id`,
//! `precio` vs `precioUnitario`, `rol` vs `role`, numeric vs string
//! IDs). Every known variant is absorbed here, once, and converted into
//! the canonical `pulperia-core` types; nothing past this module ever
//! sees a wire shape.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use pulperia_core::{Cart, CartItem, CurrencyCode, Price, ProductId, ProductSnapshot};

/// Accept IDs serialized as either JSON strings or numbers.
pub(crate) fn id_string<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(de)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

fn currency_from_code(code: Option<&str>) -> CurrencyCode {
    match code {
        Some("USD") => CurrencyCode::USD,
        _ => CurrencyCode::CRC,
    }
}

// =============================================================================
// Products
// =============================================================================

/// Raw product payload from `GET /productos/:id`.
#[derive(Debug, Deserialize)]
pub struct ProductoDto {
    #[serde(alias = "productoId", deserialize_with = "id_string")]
    pub id: String,
    #[serde(alias = "nombreProducto")]
    pub nombre: String,
    #[serde(alias = "precioUnitario")]
    pub precio: Decimal,
    #[serde(default, alias = "cantidadDisponible")]
    pub stock: u32,
    #[serde(default, alias = "imagenUrl", alias = "urlImagen")]
    pub imagen: Option<String>,
    #[serde(default)]
    pub moneda: Option<String>,
}

/// Authoritative catalog data, normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub stock: u32,
    pub image_url: Option<String>,
}

impl RemoteProduct {
    /// The display snapshot captured into a cart line at add time.
    #[must_use]
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            name: self.name.clone(),
            unit_price: self.price,
            image_url: self.image_url.clone(),
        }
    }
}

impl From<ProductoDto> for RemoteProduct {
    fn from(dto: ProductoDto) -> Self {
        let currency = currency_from_code(dto.moneda.as_deref());
        Self {
            id: ProductId::new(dto.id),
            name: dto.nombre,
            price: Price::new(dto.precio, currency),
            stock: dto.stock,
            image_url: dto.imagen,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// Raw cart line from `GET /carrito`.
#[derive(Debug, Deserialize)]
pub struct CarritoItemDto {
    #[serde(
        alias = "producto_id",
        alias = "id",
        rename = "productoId",
        deserialize_with = "id_string"
    )]
    pub producto_id: String,
    #[serde(alias = "nombreProducto")]
    pub nombre: String,
    pub cantidad: u32,
    #[serde(alias = "precioUnitario")]
    pub precio: Decimal,
    #[serde(default, alias = "imagenUrl", alias = "urlImagen")]
    pub imagen: Option<String>,
    #[serde(default)]
    pub moneda: Option<String>,
}

/// Raw cart payload from `GET /carrito`.
///
/// The backend also sends `total` and `cantidadItems`; both are ignored
/// and recomputed from the items so aggregates can never go stale.
#[derive(Debug, Deserialize)]
pub struct CarritoDto {
    #[serde(default)]
    pub items: Vec<CarritoItemDto>,
}

impl From<CarritoItemDto> for CartItem {
    fn from(dto: CarritoItemDto) -> Self {
        let currency = currency_from_code(dto.moneda.as_deref());
        Self {
            product_id: ProductId::new(dto.producto_id),
            name: dto.nombre,
            quantity: dto.cantidad,
            unit_price: Price::new(dto.precio, currency),
            image_url: dto.imagen,
        }
    }
}

impl From<CarritoDto> for Cart {
    fn from(dto: CarritoDto) -> Self {
        Self {
            items: dto.items.into_iter().map(CartItem::from).collect(),
        }
    }
}

// =============================================================================
// Request bodies
// =============================================================================

/// Body for `POST /carrito/agregar` and `PUT /carrito/modificar`.
#[derive(Debug, Serialize)]
pub struct CarritoItemRequest {
    #[serde(rename = "productoId")]
    pub producto_id: String,
    pub cantidad: u32,
}

/// Body for `POST /pedidos/finalizar`.
#[derive(Debug, Serialize)]
pub struct FinalizarPedidoRequest {
    #[serde(rename = "direccionId")]
    pub direccion_id: String,
}

/// One line of a guest order.
#[derive(Debug, Serialize)]
pub struct LineaPedidoRequest {
    #[serde(rename = "productoId")]
    pub producto_id: String,
    pub cantidad: u32,
}

/// Body for `POST /pedidos/invitado`.
#[derive(Debug, Serialize)]
pub struct PedidoInvitadoRequest {
    #[serde(rename = "datosInvitado")]
    pub datos_invitado: pulperia_core::GuestInfo,
    pub items: Vec<LineaPedidoRequest>,
}

// =============================================================================
// Responses
// =============================================================================

/// Order-finalize response; the backend names the ID inconsistently.
#[derive(Debug, Deserialize)]
pub struct PedidoDto {
    #[serde(
        alias = "id",
        alias = "pedido_id",
        rename = "pedidoId",
        deserialize_with = "id_string"
    )]
    pub pedido_id: String,
}

/// Error body shape; the backend uses `mensaje`, `message`, or `error`.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(alias = "message", alias = "error")]
    pub mensaje: String,
}
