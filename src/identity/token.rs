use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Fraction of the issued lifetime after which a token is treated as expired,
/// so it gets renewed before the server starts rejecting it.
pub const EXPIRY_SAFETY_FACTOR: f64 = 0.9;

/// An access token issued by the identity provider.
///
/// The expiry is always derived from the issuance instant and the lifetime
/// reported by the provider; there is no way to set it directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    #[serde(rename = "idToken")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(rename = "expiresIn", with = "lifetime_seconds")]
    issued_lifetime: u64,
    expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub registered: bool,
}

impl Token {
    /// Create a token issued right now with the given lifetime in seconds.
    ///
    /// Fails with [`Error::InvalidResponse`] if the id is empty or the
    /// lifetime does not yield a representable expiry.
    pub fn issued(id: impl Into<String>, lifetime_secs: u64) -> Result<Self> {
        Self::issued_at(id, lifetime_secs, Utc::now())
    }

    pub fn issued_at(
        id: impl Into<String>,
        lifetime_secs: u64,
        issued_at: DateTime<Utc>,
    ) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::InvalidResponse("empty id token".to_string()));
        }

        Ok(Self {
            id,
            refresh_token: None,
            issued_lifetime: lifetime_secs,
            expires_at: expiry_for(issued_at, lifetime_secs)?,
            email: None,
            local_id: None,
            display_name: None,
            kind: None,
            registered: false,
        })
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_local_id(mut self, local_id: impl Into<String>) -> Self {
        self.local_id = Some(local_id.into());
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Lifetime in seconds as reported by the provider at issuance.
    pub fn issued_lifetime(&self) -> u64 {
        self.issued_lifetime
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// The refresh credential, if the provider issued a non-empty one.
    pub fn refresh_credential(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|rt| !rt.is_empty())
    }
}

fn expiry_for(issued_at: DateTime<Utc>, lifetime_secs: u64) -> Result<DateTime<Utc>> {
    let millis = (lifetime_secs as f64 * EXPIRY_SAFETY_FACTOR * 1000.0).round() as i64;
    Duration::try_milliseconds(millis)
        .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
        .ok_or_else(|| {
            Error::InvalidResponse(format!("token lifetime out of range: {}s", lifetime_secs))
        })
}

/// The provider reports lifetimes as numeric strings ("3600").
/// Plain numbers are accepted too when reading.
pub(crate) mod lifetime_seconds {
    use serde::de::{self, Deserializer, Visitor};
    use serde::Serializer;
    use std::fmt;

    pub fn serialize<S: Serializer>(secs: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&secs.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        deserializer.deserialize_any(LifetimeVisitor)
    }

    struct LifetimeVisitor;

    impl<'de> Visitor<'de> for LifetimeVisitor {
        type Value = u64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a lifetime in seconds, as a number or numeric string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
            u64::try_from(v).map_err(|_| E::custom(format!("negative lifetime: {}", v)))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
            parse(v).map_err(E::custom)
        }
    }

    pub fn parse(value: &str) -> Result<u64, String> {
        value
            .trim()
            .parse::<u64>()
            .map_err(|e| format!("failed to parse expiresIn {:?}: {}", value, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_expiry_is_ninety_percent_of_lifetime() {
        let issued = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let token = Token::issued_at("abc", 3600, issued).unwrap();

        assert_eq!(token.expires_at(), issued + Duration::seconds(3240));
        assert_eq!(token.issued_lifetime(), 3600);
    }

    #[test]
    fn test_validity_window() {
        let issued = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let token = Token::issued_at("abc", 100, issued).unwrap();

        assert!(token.is_valid_at(issued));
        assert!(token.is_valid_at(issued + Duration::seconds(89)));
        assert!(!token.is_valid_at(issued + Duration::seconds(90)));
        assert!(!token.is_valid_at(issued + Duration::seconds(95)));
    }

    #[test]
    fn test_zero_lifetime_is_never_valid() {
        let token = Token::issued("abc", 0).unwrap();
        assert!(!token.is_valid());
    }

    #[test]
    fn test_empty_refresh_token_is_absent() {
        let token = Token::issued("abc", 3600).unwrap().with_refresh_token("");
        assert_eq!(token.refresh_credential(), None);

        let token = Token::issued("abc", 3600).unwrap().with_refresh_token("rt-1");
        assert_eq!(token.refresh_credential(), Some("rt-1"));
    }

    #[test]
    fn test_persisted_field_names() {
        let issued = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let token = Token::issued_at("abc", 3600, issued).unwrap()
            .with_refresh_token("rt-1")
            .with_email("user@example.com")
            .with_local_id("local-1");

        let json: serde_json::Value = serde_json::to_value(&token).unwrap();
        assert_eq!(json["idToken"], "abc");
        assert_eq!(json["refreshToken"], "rt-1");
        assert_eq!(json["expiresIn"], "3600");
        assert_eq!(json["expiresAt"], "2024-05-01T12:54:00Z");
        assert_eq!(json["email"], "user@example.com");
        assert_eq!(json["localId"], "local-1");
        assert!(json.get("displayName").is_none());
    }

    #[test]
    fn test_reads_file_written_with_empty_strings() {
        let json = r#"{
            "idToken": "abc",
            "displayName": "",
            "kind": "identitytoolkit#VerifyPasswordResponse",
            "email": "user@example.com",
            "localId": "local-1",
            "registered": true,
            "refreshToken": "",
            "expiresIn": "3600",
            "expiresAt": "2024-05-01T12:54:00Z"
        }"#;

        let token: Token = serde_json::from_str(json).unwrap();
        assert_eq!(token.id, "abc");
        assert!(token.registered);
        assert_eq!(token.refresh_credential(), None);
        assert_eq!(
            token.expires_at(),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 54, 0).unwrap()
        );
    }

    #[test]
    fn test_lifetime_parse_rejects_garbage() {
        assert_eq!(lifetime_seconds::parse(" 3600 "), Ok(3600));
        assert!(lifetime_seconds::parse("soon").is_err());
        assert!(lifetime_seconds::parse("-5").is_err());
    }

    #[test]
    fn test_out_of_range_lifetime_is_rejected() {
        let err = Token::issued("abc", 10_000_000_000_000).unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));

        let err = Token::issued("abc", u64::MAX).unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
    }

    #[test]
    fn test_empty_id_token_is_rejected() {
        let err = Token::issued("", 3600).unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
    }
}
