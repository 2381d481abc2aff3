//! Wire-level request construction for the Woopra tracking endpoints
//!
//! Two endpoint paths exist on the collection host: `/track/ce/` reports an
//! event together with the visitor's identity, `/track/identify/` reports
//! identity alone. Visitor properties are namespaced with the `cv_` prefix,
//! event properties with `ce_`, and every request carries a `ce_app`
//! parameter naming this client implementation.

use md5::{Digest, Md5};
use tracing::warn;

use crate::models::Properties;

/// Client identifier reported to the service as `ce_app`.
pub(crate) const SDK_ID: &str = "rust";

/// Fixed collection host.
pub(crate) const TRACKING_HOST: &str = "www.woopra.com";

/// Event name substituted when a tracking call carries no event name.
pub(crate) const PAGEVIEW_EVENT: &str = "pv";

/// Derived visitor identifiers are truncated to this many hex characters.
const IDENTIFIER_LEN: usize = 12;

/// Event-data keys that would render on the wire as a reserved `ce_`
/// parameter. Reserved parameters always win; colliding keys are dropped.
const RESERVED_EVENT_KEYS: &[&str] = &["name", "app"];

/// What a single request reports.
pub(crate) enum Payload<'a> {
    /// Identity only, no event.
    Identify,

    /// A pageview or custom event. `name` of `None` (or empty) means
    /// pageview.
    Event {
        name: Option<&'a str>,
        data: &'a Properties,
        referer: Option<&'a str>,
    },
}

impl Payload<'_> {
    /// Endpoint path on the collection host.
    pub(crate) fn path(&self) -> &'static str {
        match self {
            Payload::Identify => "/track/identify/",
            Payload::Event { .. } => "/track/ce/",
        }
    }
}

/// Assemble the query parameters for one request.
///
/// Optional fields that are unset are omitted entirely, never sent empty.
pub(crate) fn query_params(
    domain: &str,
    ip_address: Option<&str>,
    idle_timeout: Option<u64>,
    user_properties: &Properties,
    payload: &Payload<'_>,
) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = Vec::new();

    params.push(("host".to_owned(), domain.to_owned()));
    if let Some(ip) = ip_address {
        params.push(("ip".to_owned(), ip.to_owned()));
    }
    if let Some(timeout) = idle_timeout {
        params.push(("timeout".to_owned(), timeout.to_string()));
    }
    if let Payload::Event {
        referer: Some(referer),
        ..
    } = payload
    {
        params.push(("referer".to_owned(), (*referer).to_owned()));
    }

    for (key, value) in user_properties.iter() {
        params.push((format!("cv_{key}"), value.to_string()));
    }

    if let Payload::Event { name, data, .. } = payload {
        let name = match name {
            Some(name) if !name.is_empty() => *name,
            _ => PAGEVIEW_EVENT,
        };
        params.push(("ce_name".to_owned(), name.to_owned()));

        for (key, value) in data.iter() {
            if RESERVED_EVENT_KEYS.contains(&key.as_str()) {
                warn!("Dropping event property '{key}': it would shadow the reserved ce_{key} parameter");
                continue;
            }
            params.push((format!("ce_{key}"), value.to_string()));
        }
    }

    params.push(("ce_app".to_owned(), SDK_ID.to_owned()));
    params
}

/// Derive the pseudonymous visitor identifier for an email address.
///
/// First 12 characters of the uppercase hex MD5 digest of the UTF-8 bytes
/// of the address. The digest is fixed by wire compatibility with the other
/// client implementations; the same email always yields the same
/// identifier.
pub(crate) fn identifier_for_email(email: &str) -> String {
    let digest = Md5::digest(email.as_bytes());
    let mut hex: String = digest.iter().map(|byte| format!("{byte:02X}")).collect();
    hex.truncate(IDENTIFIER_LEN);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropertyValue;

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_identifier_is_md5_prefix() {
        // MD5("user@example.com") = B58996C504C5638798EB6B511E6F49AF
        assert_eq!(identifier_for_email("user@example.com"), "B58996C504C5");
    }

    #[test]
    fn test_identifier_is_deterministic_and_twelve_chars() {
        for email in ["a@b.c", "user@example.com", "Ünïcode@exämple.com", ""] {
            let first = identifier_for_email(email);
            let second = identifier_for_email(email);
            assert_eq!(first, second);
            assert_eq!(first.len(), 12);
            assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
            assert_eq!(first, first.to_uppercase());
        }
    }

    #[test]
    fn test_identify_params_minimal() {
        let params = query_params("example.com", None, None, &Properties::new(), &Payload::Identify);
        assert_eq!(
            params,
            vec![
                ("host".to_owned(), "example.com".to_owned()),
                ("ce_app".to_owned(), "rust".to_owned()),
            ]
        );
    }

    #[test]
    fn test_identify_params_omit_referer() {
        // referer is an event-only parameter and never appears on identify
        // requests, even though the tracker could hold one in scope.
        let params = query_params(
            "example.com",
            Some("203.0.113.1"),
            Some(300_000),
            &Properties::new(),
            &Payload::Identify,
        );
        assert_eq!(param(&params, "ip"), Some("203.0.113.1"));
        assert_eq!(param(&params, "timeout"), Some("300000"));
        assert_eq!(param(&params, "referer"), None);
    }

    #[test]
    fn test_event_params() {
        let visitor: Properties = [("email", "user@example.com")].into_iter().collect();
        let data: Properties = [
            ("plan", PropertyValue::from("Gold")),
            ("seats", PropertyValue::from(5)),
        ]
        .into_iter()
        .collect();
        let payload = Payload::Event {
            name: Some("signup"),
            data: &data,
            referer: Some("https://referrer.example/page"),
        };

        let params = query_params("example.com", None, Some(60_000), &visitor, &payload);

        assert_eq!(param(&params, "host"), Some("example.com"));
        assert_eq!(param(&params, "timeout"), Some("60000"));
        assert_eq!(param(&params, "referer"), Some("https://referrer.example/page"));
        assert_eq!(param(&params, "cv_email"), Some("user@example.com"));
        assert_eq!(param(&params, "ce_name"), Some("signup"));
        assert_eq!(param(&params, "ce_plan"), Some("Gold"));
        assert_eq!(param(&params, "ce_seats"), Some("5"));
        assert_eq!(param(&params, "ce_app"), Some("rust"));
        // ce_app is the trailing parameter on every request
        assert_eq!(params.last().map(|(k, _)| k.as_str()), Some("ce_app"));
    }

    #[test]
    fn test_missing_or_empty_event_name_is_pageview() {
        let data = Properties::new();
        for name in [None, Some("")] {
            let payload = Payload::Event {
                name,
                data: &data,
                referer: None,
            };
            let params = query_params("example.com", None, None, &Properties::new(), &payload);
            assert_eq!(param(&params, "ce_name"), Some(PAGEVIEW_EVENT));
        }
    }

    #[test]
    fn test_reserved_event_keys_are_dropped() {
        let data: Properties = [("name", "shadow"), ("app", "shadow"), ("plan", "Gold")]
            .into_iter()
            .collect();
        let payload = Payload::Event {
            name: Some("signup"),
            data: &data,
            referer: None,
        };

        let params = query_params("example.com", None, None, &Properties::new(), &payload);

        assert_eq!(param(&params, "ce_name"), Some("signup"));
        assert_eq!(param(&params, "ce_app"), Some("rust"));
        assert_eq!(param(&params, "ce_plan"), Some("Gold"));
        assert_eq!(params.iter().filter(|(k, _)| k == "ce_name").count(), 1);
        assert_eq!(params.iter().filter(|(k, _)| k == "ce_app").count(), 1);
    }

    #[test]
    fn test_visitor_property_prefix_cannot_shadow_reserved_params() {
        // A visitor property named "host" renders as cv_host, distinct from
        // the reserved host parameter.
        let visitor: Properties = [("host", "spoofed")].into_iter().collect();
        let params = query_params("example.com", None, None, &visitor, &Payload::Identify);

        assert_eq!(param(&params, "host"), Some("example.com"));
        assert_eq!(param(&params, "cv_host"), Some("spoofed"));
    }
}
