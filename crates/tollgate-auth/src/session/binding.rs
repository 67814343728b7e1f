//! Session binding: request attributes a session must keep presenting.

use tollgate_core::config::BindingMode;
use tollgate_core::types::RequestContext;
use tollgate_entity::session::Session;

use crate::error::BindingAttribute;

/// Attributes required by `mode` that the presented context does not match.
///
/// An attribute is only enforced when the session recorded a value for it at
/// issuance; a missing presented value then counts as a mismatch.
pub fn binding_violations(
    mode: BindingMode,
    session: &Session,
    presented: &RequestContext,
) -> Vec<BindingAttribute> {
    let mut violated = Vec::new();

    if mode.binds_ip() && mismatched(&session.ip_address, &presented.ip_address) {
        violated.push(BindingAttribute::IpAddress);
    }
    if mode.binds_device()
        && mismatched(&session.device_fingerprint, &presented.device_fingerprint)
    {
        violated.push(BindingAttribute::DeviceFingerprint);
    }

    violated
}

fn mismatched(recorded: &Option<String>, presented: &Option<String>) -> bool {
    match recorded {
        Some(expected) => presented.as_deref() != Some(expected.as_str()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn session(ip: Option<&str>, device: Option<&str>) -> Session {
        let now = Utc::now();
        Session {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            token_hash: "h".into(),
            expires_at: now + Duration::days(1),
            created_at: now,
            last_active_at: None,
            ip_address: ip.map(str::to_string),
            device_fingerprint: device.map(str::to_string),
            user_agent: None,
        }
    }

    #[test]
    fn test_mode_none_never_violates() {
        let s = session(Some("1.1.1.1"), Some("dev-a"));
        let ctx = RequestContext::from_ip("2.2.2.2").with_device("dev-b");
        assert!(binding_violations(BindingMode::None, &s, &ctx).is_empty());
    }

    #[test]
    fn test_both_reports_every_mismatch() {
        let s = session(Some("1.1.1.1"), Some("dev-a"));
        let ctx = RequestContext::from_ip("2.2.2.2").with_device("dev-b");
        assert_eq!(
            binding_violations(BindingMode::Both, &s, &ctx),
            vec![BindingAttribute::IpAddress, BindingAttribute::DeviceFingerprint]
        );
        let ctx = RequestContext::from_ip("1.1.1.1").with_device("dev-b");
        assert_eq!(
            binding_violations(BindingMode::Both, &s, &ctx),
            vec![BindingAttribute::DeviceFingerprint]
        );
    }

    #[test]
    fn test_missing_presented_value_is_a_mismatch() {
        let s = session(Some("1.1.1.1"), None);
        let ctx = RequestContext::default();
        assert_eq!(
            binding_violations(BindingMode::Ip, &s, &ctx),
            vec![BindingAttribute::IpAddress]
        );
        assert!(binding_violations(BindingMode::Device, &s, &ctx).is_empty());
    }
}
