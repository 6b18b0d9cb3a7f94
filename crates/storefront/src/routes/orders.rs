//! Order route handlers: checkout, history, and public tracking.
//!
//! Checkout turns the session cart into a multipart order submission; the
//! cart is only cleared after the backend accepts the order.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use agah_core::OrderStatus;

use crate::auth::{AuthError, AuthStore};
use crate::backend::{BackendError, DesignUpload, Order, OrderDraft, OrderLine};
use crate::cart::CartStore;
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::notify::WrapMessages;
use crate::routes::cart::CartView;
use crate::routes::services::format_price;
use crate::state::AppState;
use crate::storage::SessionStorage;

// =============================================================================
// Views
// =============================================================================

/// Order display data for templates.
#[derive(Clone)]
pub struct OrderView {
    pub order_number: String,
    pub customer_name: String,
    pub status_label: String,
    pub status_class: String,
    pub estimated_price: Option<String>,
    pub final_price: Option<String>,
    pub additional_notes: Option<String>,
    pub created_at: String,
    pub items: Vec<OrderItemView>,
    /// Quoted orders can be confirmed by the customer.
    pub can_confirm: bool,
    /// Open orders can still be canceled.
    pub can_cancel: bool,
}

/// Order line display data.
#[derive(Clone)]
pub struct OrderItemView {
    pub service_name: String,
    pub description: String,
    pub quantity: u32,
    pub needs_custom_design: bool,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            order_number: order.order_number.clone(),
            customer_name: order.customer_name.clone(),
            status_label: order.status.label().to_owned(),
            status_class: status_class(order.status).to_owned(),
            estimated_price: order.estimated_price.as_ref().map(format_price),
            final_price: order.final_price.as_ref().map(format_price),
            additional_notes: order.additional_notes.clone(),
            created_at: order.created_at.format("%Y-%m-%d").to_string(),
            items: order
                .items
                .iter()
                .map(|item| OrderItemView {
                    service_name: item.service_name.clone(),
                    description: item.description.clone(),
                    quantity: item.quantity,
                    needs_custom_design: item.needs_custom_design,
                })
                .collect(),
            can_confirm: order.status == OrderStatus::Quoted,
            can_cancel: order.status.is_open(),
        }
    }
}

/// CSS class suffix for a status badge.
const fn status_class(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "pending",
        OrderStatus::Quoted => "quoted",
        OrderStatus::Confirmed => "confirmed",
        OrderStatus::InProgress => "in-progress",
        OrderStatus::Completed => "completed",
        OrderStatus::Canceled => "canceled",
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/new.html")]
pub struct NewOrderTemplate {
    pub cart: CartView,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub error: Option<String>,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub orders: Vec<OrderView>,
}

/// Order tracking template: the lookup form, plus a result when found.
#[derive(Template, WebTemplate)]
#[template(path = "orders/track.html")]
pub struct TrackOrderTemplate {
    pub order: Option<OrderView>,
    pub searched: Option<String>,
    pub error: Option<String>,
}

// =============================================================================
// Checkout
// =============================================================================

/// Display the checkout page with the cart and prefilled contact fields.
#[instrument(skip(session, auth))]
pub async fn new(session: Session, OptionalAuth(auth): OptionalAuth) -> Response {
    let store = CartStore::open(SessionStorage::new(session)).await;
    if store.cart().is_empty() {
        return Redirect::to("/cart").into_response();
    }

    let (name, email, phone) = auth.map_or_else(
        || (String::new(), String::new(), String::new()),
        |a| {
            (
                a.user.display_name(),
                a.user.email.clone(),
                a.user.phone.clone().unwrap_or_default(),
            )
        },
    );

    NewOrderTemplate {
        cart: CartView::from_store(&store),
        customer_name: name,
        customer_email: email,
        customer_phone: phone,
        error: None,
    }
    .into_response()
}

/// Handle order submission.
///
/// The multipart form carries the customer fields plus one optional
/// `design_file_{index}` part per cart line. The cart is cleared only after
/// the backend accepts the order.
#[instrument(skip(state, session, multipart))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut store = CartStore::open(SessionStorage::new(session.clone())).await;
    if store.cart().is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let mut customer_name = String::new();
    let mut customer_email = String::new();
    let mut customer_phone = None;
    let mut additional_notes = None;
    let mut files: Vec<DesignUpload> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid form: {e}")))?
    {
        let Some(name) = field.name().map(ToOwned::to_owned) else {
            continue;
        };

        if let Some(index) = name.strip_prefix("design_file_") {
            let Ok(line_index) = index.parse::<usize>() else {
                continue;
            };
            let file_name = field.file_name().unwrap_or("design").to_owned();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_owned();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("invalid upload: {e}")))?;
            if !bytes.is_empty() {
                files.push(DesignUpload {
                    line_index,
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(format!("invalid form: {e}")))?;
        match name.as_str() {
            "customer_name" => customer_name = value.trim().to_owned(),
            "customer_email" => customer_email = value.trim().to_lowercase(),
            "customer_phone" => customer_phone = Some(value.trim().to_owned()).filter(|v| !v.is_empty()),
            "additional_notes" => additional_notes = Some(value.trim().to_owned()).filter(|v| !v.is_empty()),
            _ => {}
        }
    }

    if customer_name.is_empty() || customer_email.parse::<agah_core::Email>().is_err() {
        return Ok(NewOrderTemplate {
            cart: CartView::from_store(&store),
            customer_name,
            customer_email,
            customer_phone: customer_phone.unwrap_or_default(),
            error: Some("Please provide your name and a valid email address.".to_owned()),
        }
        .into_response());
    }

    let items = store
        .cart()
        .items()
        .iter()
        .map(|item| OrderLine {
            service: item.service,
            description: item.description.clone(),
            quantity: item.quantity,
            length_dimensions: item.length,
            width_dimensions: item.width,
            height_dimensions: item.height,
            needs_custom_design: item.needs_custom_design,
        })
        .collect();

    let draft = OrderDraft {
        customer_name,
        customer_email,
        customer_phone,
        additional_notes,
        items,
    };

    let lines = draft.items.len().to_string();
    add_breadcrumb("order", "submit order", Some(&[("lines", lines.as_str())]));

    let backend = state.backend().clone();
    let messages = WrapMessages::new("Submitting your order...", "Order received!");
    let result = state
        .visitor_toasts(&session)
        .await
        .wrap(messages, backend.create_order(draft, files))
        .await;

    match result {
        Ok(order) => {
            store.clear().await;
            Ok(Redirect::to(&format!("/orders/track/{}", order.order_number)).into_response())
        }
        // The wrap already pushed the error toast; send the visitor back to
        // the form with their cart intact.
        Err(BackendError::Rejected(text)) => Ok(NewOrderTemplate {
            cart: CartView::from_store(&store),
            customer_name: String::new(),
            customer_email: String::new(),
            customer_phone: String::new(),
            error: Some(text),
        }
        .into_response()),
        Err(e) => Err(AppError::Backend(e)),
    }
}

// =============================================================================
// History and Tracking
// =============================================================================

/// Display the signed-in user's order history.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(_auth): RequireAuth,
) -> Response {
    let store = AuthStore::new(
        SessionStorage::new(session),
        state.backend().clone(),
        state.auth_events().clone(),
    );
    let backend = state.backend().clone();

    match store
        .authorized(|token| async move { backend.my_orders(&token).await })
        .await
    {
        Ok(orders) => OrdersIndexTemplate {
            orders: orders.iter().map(OrderView::from).collect(),
        }
        .into_response(),
        Err(AuthError::SessionExpired | AuthError::NotAuthenticated) => {
            Redirect::to("/auth/login?error=Your+session+has+expired.+Please+sign+in+again.")
                .into_response()
        }
        Err(e) => AppError::from(e).into_response(),
    }
}

/// Guest order lookup template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/lookup.html")]
pub struct OrderLookupTemplate {
    pub email: Option<String>,
    pub orders: Vec<OrderView>,
}

/// Query parameters for the guest order lookup.
#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub email: Option<String>,
}

/// List a guest's orders by the email they ordered with.
#[instrument(skip(state))]
pub async fn lookup(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> Result<impl IntoResponse, AppError> {
    let Some(email) = query
        .email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
    else {
        return Ok(OrderLookupTemplate {
            email: None,
            orders: Vec::new(),
        });
    };

    let orders = state.backend().orders_by_customer(&email).await?;
    Ok(OrderLookupTemplate {
        email: Some(email),
        orders: orders.iter().map(OrderView::from).collect(),
    })
}

/// Query parameters for the tracking form.
#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    pub order_number: Option<String>,
}

/// Display the tracking form; with a query parameter, redirect to the
/// canonical tracking URL.
pub async fn track_form(Query(query): Query<TrackQuery>) -> Response {
    if let Some(number) = query.order_number.filter(|n| !n.trim().is_empty()) {
        return Redirect::to(&format!("/orders/track/{}", number.trim())).into_response();
    }

    TrackOrderTemplate {
        order: None,
        searched: None,
        error: None,
    }
    .into_response()
}

/// Look up one order by its public order number.
#[instrument(skip(state))]
pub async fn track(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    match state.backend().track_order(&order_number).await {
        Ok(order) => Ok(TrackOrderTemplate {
            order: Some(OrderView::from(&order)),
            searched: Some(order_number),
            error: None,
        }),
        Err(BackendError::NotFound) => Ok(TrackOrderTemplate {
            order: None,
            searched: Some(order_number),
            error: Some("No order found with that number.".to_owned()),
        }),
        Err(e) => Err(AppError::Backend(e)),
    }
}

/// Accept a quoted order.
#[instrument(skip(state, session))]
pub async fn confirm(
    State(state): State<AppState>,
    session: Session,
    Path(order_number): Path<String>,
) -> Redirect {
    let messages = WrapMessages::new("Confirming order...", "Order confirmed!");
    let backend = state.backend().clone();
    let _ = state
        .visitor_toasts(&session)
        .await
        .wrap(messages, backend.confirm_order(&order_number))
        .await;
    Redirect::to(&format!("/orders/track/{order_number}"))
}

/// Cancel an open order.
#[instrument(skip(state, session))]
pub async fn cancel(
    State(state): State<AppState>,
    session: Session,
    Path(order_number): Path<String>,
) -> Redirect {
    let messages = WrapMessages::new("Canceling order...", "Order canceled.");
    let backend = state.backend().clone();
    let _ = state
        .visitor_toasts(&session)
        .await
        .wrap(messages, backend.cancel_order(&order_number))
        .await;
    Redirect::to(&format!("/orders/track/{order_number}"))
}
