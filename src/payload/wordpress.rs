// src/payload/wordpress.rs

//! WordPress user bodies built from Memberful members.

use crate::models::{Member, WpUserPayload};

/// Update body: keeps e-mail and display name in step with the member.
pub fn user_update_payload(member: &Member) -> WpUserPayload {
    WpUserPayload {
        email: member.email.clone(),
        name: member.full_name.clone(),
        username: None,
        password: None,
    }
}

/// Create body: the e-mail doubles as login name, with a throwaway password
/// the member replaces through the normal reset flow.
pub fn user_create_payload(member: &Member, password: String) -> WpUserPayload {
    WpUserPayload {
        username: Some(member.email.clone()),
        password: Some(password),
        ..user_update_payload(member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_payload_skips_credentials() {
        let member = Member {
            id: "1".into(),
            email: "ada@example.com".into(),
            full_name: Some("Ada".into()),
            ..Member::default()
        };
        let payload = serde_json::to_value(user_update_payload(&member)).unwrap();
        assert_eq!(payload["email"], "ada@example.com");
        assert_eq!(payload["name"], "Ada");
        assert!(payload.get("username").is_none());
        assert!(payload.get("password").is_none());
    }

    #[test]
    fn test_create_payload_uses_email_as_username() {
        let member = Member {
            id: "1".into(),
            email: "ada@example.com".into(),
            ..Member::default()
        };
        let payload = user_create_payload(&member, "secret".into());
        assert_eq!(payload.username.as_deref(), Some("ada@example.com"));
        assert_eq!(payload.password.as_deref(), Some("secret"));
        assert_eq!(payload.name, None);
    }
}
