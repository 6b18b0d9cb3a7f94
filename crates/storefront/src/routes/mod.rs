//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Health check
//! GET  /about                  - About page
//!
//! # Services
//! GET  /services               - Service catalog
//! GET  /services/{id}          - Service detail
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add line (returns count badge, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove line (returns cart_items fragment)
//! GET  /cart/items             - Cart items fragment
//! GET  /cart/count             - Cart count badge fragment
//!
//! # Orders
//! GET  /orders                 - Order history (requires auth)
//! GET  /orders/new             - Checkout page
//! POST /orders                 - Submit order (multipart)
//! GET  /orders/lookup          - Guest order lookup by email
//! GET  /orders/track           - Tracking form
//! GET  /orders/track/{number}  - Track one order
//! POST /orders/{number}/confirm - Accept a quote
//! POST /orders/{number}/cancel  - Cancel an open order
//!
//! # Auth
//! GET  /auth/nav               - Navbar account fragment
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//! GET  /auth/forgot-password   - Password reset request page
//! POST /auth/forgot-password   - Request a reset email
//! GET  /auth/reset-password    - Reset page (token in query)
//! POST /auth/reset-password    - Apply the reset
//! GET  /auth/profile           - Profile page (requires auth)
//! POST /auth/profile           - Update profile
//! POST /auth/change-password   - Change password
//!
//! # Contact
//! GET  /contact                - Contact page
//! POST /contact                - Submit the contact form
//!
//! # Toasts (HTMX fragments)
//! GET  /toasts                 - Toast stack fragment
//! POST /toasts/dismiss         - Dismiss one toast
//! ```

pub mod auth;
pub mod cart;
pub mod contact;
pub mod home;
pub mod orders;
pub mod pages;
pub mod services;
pub mod toasts;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/nav", get(auth::nav_account))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
        .route(
            "/forgot-password",
            get(auth::forgot_password_page).post(auth::forgot_password),
        )
        .route(
            "/reset-password",
            get(auth::reset_password_page).post(auth::reset_password),
        )
        .route("/profile", get(auth::profile).post(auth::update_profile))
        .route("/change-password", post(auth::change_password))
}

/// Create the service catalog routes router.
pub fn service_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(services::index))
        .route("/{id}", get(services::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/items", get(cart::items))
        .route("/count", get(cart::count))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/new", get(orders::new))
        .route("/lookup", get(orders::lookup))
        .route("/track", get(orders::track_form))
        .route("/track/{order_number}", get(orders::track))
        .route("/{order_number}/confirm", post(orders::confirm))
        .route("/{order_number}/cancel", post(orders::cancel))
}

/// Create the toast fragment routes router.
pub fn toast_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(toasts::fragment))
        .route("/dismiss", post(toasts::dismiss))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Static pages
        .route("/about", get(pages::about))
        // Service catalog
        .nest("/services", service_routes())
        // Cart routes
        .nest("/cart", cart_routes())
        // Order routes
        .nest("/orders", order_routes())
        // Auth routes
        .nest("/auth", auth_routes())
        // Contact page
        .route("/contact", get(contact::show).post(contact::submit))
        // Toast fragments
        .nest("/toasts", toast_routes())
}
