//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart lives in the visitor's session via [`CartStore`]; every fragment
//! response is tagged with the store revision so a stale update (an old
//! response landing after a newer one) is discarded instead of applied.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    response::{AppendHeaders, IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use agah_core::{CartLineId, ServiceId};

use crate::cart::{CartStore, NewCartItem};
use crate::error::add_breadcrumb;
use crate::filters;
use crate::routes::services::format_price;
use crate::storage::SessionStorage;

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: String,
    pub service_id: i32,
    pub description: String,
    pub quantity: u32,
    /// "L x W x H" in the shop's working unit, when any dimension is set.
    pub dimensions: Option<String>,
    pub needs_custom_design: bool,
    pub unit_price: Option<String>,
    pub line_total: String,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
    /// Store revision the fragment was rendered from.
    pub revision: u64,
}

impl CartView {
    pub(crate) fn from_store(store: &CartStore<SessionStorage>) -> Self {
        let cart = store.cart();
        let items = cart
            .items()
            .iter()
            .map(|item| CartItemView {
                id: item.id.to_string(),
                service_id: item.service.as_i32(),
                description: item.description.clone(),
                quantity: item.quantity,
                dimensions: format_dimensions(item.length, item.width, item.height),
                needs_custom_design: item.needs_custom_design,
                unit_price: item.estimated_unit_price.as_ref().map(format_price),
                line_total: format_price(&item.line_total()),
            })
            .collect();

        Self {
            items,
            subtotal: format_price(&cart.total()),
            item_count: cart.count(),
            revision: store.revision(),
        }
    }
}

fn format_dimensions(
    length: Option<Decimal>,
    width: Option<Decimal>,
    height: Option<Decimal>,
) -> Option<String> {
    if length.is_none() && width.is_none() && height.is_none() {
        return None;
    }
    let part = |d: Option<Decimal>| d.map_or_else(|| "-".to_owned(), |v| v.to_string());
    Some(format!(
        "{} x {} x {} cm",
        part(length),
        part(width),
        part(height)
    ))
}

/// Open the visitor's cart store from the request session.
async fn open_store(session: Session) -> CartStore<SessionStorage> {
    CartStore::open(SessionStorage::new(session)).await
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub service_id: i32,
    pub description: String,
    pub quantity: Option<u32>,
    pub length: Option<Decimal>,
    pub width: Option<Decimal>,
    pub height: Option<Decimal>,
    #[serde(default)]
    pub needs_custom_design: bool,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub line_id: CartLineId,
    pub quantity: u32,
    /// Revision the client rendered from; mismatches are stale.
    pub revision: Option<u64>,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub line_id: CartLineId,
    pub revision: Option<u64>,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Display cart page.
#[instrument(skip(session))]
pub async fn show(session: Session) -> impl IntoResponse {
    let store = open_store(session).await;
    CartShowTemplate {
        cart: CartView::from_store(&store),
    }
}

/// Add a configured line to the cart (HTMX).
///
/// Merges into an existing line when the service and dimensions match.
/// Returns the cart count badge with an HTMX trigger for the cart region.
#[instrument(skip(session, form), fields(service_id = form.service_id))]
pub async fn add(session: Session, Form(form): Form<AddToCartForm>) -> Response {
    let mut store = open_store(session).await;

    let service_id = form.service_id.to_string();
    add_breadcrumb("cart", "add line", Some(&[("service_id", service_id.as_str())]));

    store
        .add(NewCartItem {
            service: ServiceId::new(form.service_id),
            description: form.description.trim().to_owned(),
            quantity: form.quantity.unwrap_or(1).max(1),
            length: form.length,
            width: form.width,
            height: form.height,
            needs_custom_design: form.needs_custom_design,
            design_file: None,
            estimated_unit_price: None,
        })
        .await;

    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartCountTemplate {
            count: store.cart().count(),
        },
    )
        .into_response()
}

/// Update a line's quantity (HTMX). Quantity zero removes the line.
#[instrument(skip(session, form))]
pub async fn update(session: Session, Form(form): Form<UpdateCartForm>) -> Response {
    let mut store = open_store(session).await;

    if is_stale(form.revision, store.revision()) {
        tracing::debug!(
            got = ?form.revision,
            current = store.revision(),
            "discarding stale cart update"
        );
    } else {
        store.set_quantity(form.line_id, form.quantity).await;
    }

    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: CartView::from_store(&store),
        },
    )
        .into_response()
}

/// Remove a line from the cart (HTMX).
#[instrument(skip(session, form))]
pub async fn remove(session: Session, Form(form): Form<RemoveFromCartForm>) -> Response {
    let mut store = open_store(session).await;

    if is_stale(form.revision, store.revision()) {
        tracing::debug!(
            got = ?form.revision,
            current = store.revision(),
            "discarding stale cart removal"
        );
    } else {
        store.remove(form.line_id).await;
    }

    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: CartView::from_store(&store),
        },
    )
        .into_response()
}

/// Get cart items fragment (HTMX refresh after `cart-updated`).
#[instrument(skip(session))]
pub async fn items(session: Session) -> impl IntoResponse {
    let store = open_store(session).await;
    CartItemsTemplate {
        cart: CartView::from_store(&store),
    }
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> impl IntoResponse {
    let store = open_store(session).await;
    CartCountTemplate {
        count: store.cart().count(),
    }
}

/// A form revision older than the store's current revision means the client
/// rendered from state that has since been replaced.
const fn is_stale(form_revision: Option<u64>, current: u64) -> bool {
    match form_revision {
        Some(revision) => revision < current,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_detection() {
        assert!(!is_stale(None, 5));
        assert!(!is_stale(Some(5), 5));
        assert!(is_stale(Some(4), 5));
        // A newer revision than the store's is not stale (fresh tab).
        assert!(!is_stale(Some(6), 5));
    }

    #[test]
    fn test_format_dimensions() {
        assert_eq!(format_dimensions(None, None, None), None);
        assert_eq!(
            format_dimensions(
                Some(Decimal::from(10)),
                Some(Decimal::from(5)),
                None
            )
            .as_deref(),
            Some("10 x 5 x - cm")
        );
    }
}
