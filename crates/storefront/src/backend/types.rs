//! Wire types for the fabrication backend API.
//!
//! Every endpoint wraps its payload in the same `{ success, data | error }`
//! envelope; field names are the backend's snake_case names and are kept
//! verbatim so these types double as the request format for order
//! submission.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use agah_core::{OrderItemId, OrderStatus, ServiceId, UserId, UserRole};

/// Standard response envelope.
///
/// `data` is present on success, `error` on business failures. `message` and
/// `count` are optional extras some endpoints include.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    pub error: Option<String>,
    pub message: Option<String>,
    pub count: Option<u64>,
}

/// Authenticated user record as the backend returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: UserRole,
}

impl User {
    /// Name for greetings; falls back to the email's local part.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.email
                .split('@')
                .next()
                .unwrap_or(&self.email)
                .to_owned()
        } else {
            full.to_owned()
        }
    }
}

/// Token plus user, returned by login and register.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// One fabrication service from the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    #[serde(rename = "type")]
    pub service_type: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub base_price: Option<Decimal>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub image: Option<String>,
}

const fn default_true() -> bool {
    true
}

/// Company profile shown on the home, about, and contact pages.
#[derive(Debug, Clone, Deserialize)]
pub struct CompanyInfo {
    pub company_name: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub about_us: String,
    #[serde(default)]
    pub mission: String,
    #[serde(default)]
    pub vision: String,
    pub contact_email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub response_time_hours: Option<u32>,
}

/// Aggregate payload for the home page.
#[derive(Debug, Clone, Deserialize)]
pub struct HomepageData {
    #[serde(default)]
    pub featured_services: Vec<Service>,
    pub company_info: CompanyInfo,
    #[serde(default)]
    pub stats: HomepageStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HomepageStats {
    #[serde(default)]
    pub completed_orders: u64,
    #[serde(default)]
    pub years_in_business: u32,
    #[serde(default)]
    pub services_offered: u32,
}

/// Read-only order snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    #[serde(default)]
    pub estimated_price: Option<Decimal>,
    #[serde(default)]
    pub final_price: Option<Decimal>,
    #[serde(default)]
    pub additional_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub service: ServiceId,
    #[serde(default)]
    pub service_name: String,
    pub description: String,
    pub quantity: u32,
    #[serde(default)]
    pub length_dimensions: Option<Decimal>,
    #[serde(default)]
    pub width_dimensions: Option<Decimal>,
    #[serde(default)]
    pub height_dimensions: Option<Decimal>,
    #[serde(default)]
    pub needs_custom_design: bool,
    #[serde(default)]
    pub design_file: Option<String>,
}

/// Order submission assembled from the cart at checkout.
///
/// Serialized as a multipart form: customer fields as text parts, the line
/// list as an `items` JSON part, and design files as `design_file_{index}`
/// file parts keyed by line position.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub additional_notes: Option<String>,
    pub items: Vec<OrderLine>,
}

/// One line of an order submission; mirrors the cart line wire format.
#[derive(Debug, Clone, Serialize)]
pub struct OrderLine {
    pub service: ServiceId,
    pub description: String,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length_dimensions: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width_dimensions: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_dimensions: Option<Decimal>,
    pub needs_custom_design: bool,
}

/// A design file attached to one order line.
#[derive(Debug, Clone)]
pub struct DesignUpload {
    /// Index into [`OrderDraft::items`].
    pub line_index: usize,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Contact-form submission, validated before any network call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
}

/// Minimum length for the contact message body.
const MIN_MESSAGE_LENGTH: usize = 10;

impl ContactRequest {
    /// Validate the form. Errors are `(field, message)` pairs for inline
    /// display; an empty result means the form may be submitted.
    pub fn validate(&self) -> Result<(), Vec<(&'static str, String)>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(("name", "Name is required".to_owned()));
        }
        if self.email.parse::<agah_core::Email>().is_err() {
            errors.push(("email", "Enter a valid email address".to_owned()));
        }
        if self.subject.trim().is_empty() {
            errors.push(("subject", "Subject is required".to_owned()));
        }
        if self.message.trim().len() < MIN_MESSAGE_LENGTH {
            errors.push((
                "message",
                format!("Message must be at least {MIN_MESSAGE_LENGTH} characters"),
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success_parses() {
        let raw = r#"{"success": true, "data": {"id": 3, "email": "a@b.com"}, "message": "ok"}"#;
        let envelope: Envelope<User> = serde_json::from_str(raw).unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.data.unwrap().id, UserId::new(3));
        assert_eq!(envelope.message.as_deref(), Some("ok"));
    }

    #[test]
    fn test_envelope_failure_parses() {
        let raw = r#"{"success": false, "error": "Credenciales incorrectas"}"#;
        let envelope: Envelope<User> = serde_json::from_str(raw).unwrap();
        assert!(!envelope.success);
        assert!(envelope.data.is_none());
        assert_eq!(envelope.error.as_deref(), Some("Credenciales incorrectas"));
    }

    #[test]
    fn test_order_parses_spanish_status() {
        let raw = r#"{
            "order_number": "ORD-2024-0042",
            "customer_name": "Ana",
            "customer_email": "ana@example.com",
            "status": "en_proceso",
            "created_at": "2024-05-01T12:00:00Z"
        }"#;
        let order: Order = serde_json::from_str(raw).unwrap();
        assert_eq!(order.status, OrderStatus::InProgress);
        assert!(order.items.is_empty());
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let user: User =
            serde_json::from_str(r#"{"id": 1, "email": "ana@example.com"}"#).unwrap();
        assert_eq!(user.display_name(), "ana");

        let named: User = serde_json::from_str(
            r#"{"id": 1, "email": "ana@example.com", "first_name": "Ana", "last_name": "Gomez"}"#,
        )
        .unwrap();
        assert_eq!(named.display_name(), "Ana Gomez");
    }

    #[test]
    fn test_contact_validation_rejects_before_network() {
        let form = ContactRequest {
            name: String::new(),
            email: "not-an-email".to_owned(),
            phone: None,
            subject: "Quote".to_owned(),
            message: "short".to_owned(),
        };

        let errors = form.validate().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|(f, _)| *f).collect();
        assert_eq!(fields, vec!["name", "email", "message"]);
    }

    #[test]
    fn test_contact_validation_accepts_complete_form() {
        let form = ContactRequest {
            name: "Ana Gomez".to_owned(),
            email: "ana@example.com".to_owned(),
            phone: None,
            subject: "Quote for brackets".to_owned(),
            message: "I need 40 steel brackets cut to spec.".to_owned(),
        };
        assert!(form.validate().is_ok());
    }
}
