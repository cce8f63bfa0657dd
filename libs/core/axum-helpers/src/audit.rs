//! Audit trail for catalog writes.
//!
//! Events go to the `audit` tracing target so they can be routed apart from
//! application logs.
//!
//! ```ignore
//! AuditEvent::new("product.delete", format!("product:{}", id), AuditOutcome::Success)
//!     .with_user(claims.principal())
//!     .with_request(&headers)
//!     .log();
//! ```

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Success,
    Failure,
}

#[derive(Debug, Serialize)]
pub struct AuditEvent {
    pub user_id: Option<String>,
    /// e.g. `product.create`
    pub action: String,
    /// e.g. `product:42`
    pub resource: String,
    pub outcome: AuditOutcome,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    pub details: Option<serde_json::Value>,
}

impl AuditEvent {
    pub fn new(action: impl Into<String>, resource: impl Into<String>, outcome: AuditOutcome) -> Self {
        Self {
            user_id: None,
            action: action.into(),
            resource: resource.into(),
            outcome,
            ip_address: None,
            user_agent: None,
            timestamp: Utc::now(),
            details: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Records client IP and user agent from the request headers.
    pub fn with_request(mut self, headers: &HeaderMap) -> Self {
        self.ip_address = extract_ip_from_headers(headers);
        self.user_agent = extract_user_agent(headers);
        self
    }

    pub fn with_details(mut self, details: impl Serialize) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }

    pub fn log(self) {
        tracing::info!(
            target: "audit",
            user_id = self.user_id.as_deref(),
            action = %self.action,
            resource = %self.resource,
            outcome = ?self.outcome,
            ip = self.ip_address.as_deref(),
            "{}",
            serde_json::to_string(&self).unwrap_or_else(|_| "unserializable audit event".to_string())
        );
    }
}

/// First hop of `X-Forwarded-For`, else `X-Real-IP`.
pub fn extract_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        })
}

pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwarded_for_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.2".parse().unwrap());
        headers.insert("x-real-ip", "10.0.0.9".parse().unwrap());
        assert_eq!(extract_ip_from_headers(&headers).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_real_ip_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "10.0.0.9".parse().unwrap());
        assert_eq!(extract_ip_from_headers(&headers).as_deref(), Some("10.0.0.9"));
    }

    #[test]
    fn test_event_serializes_outcome_lowercase() {
        let mut headers = HeaderMap::new();
        headers.insert("user-agent", "catalog-admin/1.0".parse().unwrap());

        let event = AuditEvent::new("product.delete", "product:4", AuditOutcome::Failure)
            .with_user("operator@example.com")
            .with_request(&headers)
            .with_details(serde_json::json!({ "reason": "integrity violation" }));

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["outcome"], "failure");
        assert_eq!(json["user_agent"], "catalog-admin/1.0");
        assert_eq!(json["details"]["reason"], "integrity violation");
    }
}
