//! JSON exchange with the remote authority.
//!
//! Every admitted, non-admin credential produces one request:
//!
//! ```json
//! { "rfid": "3350811", "fingerprint_id": null, "device_id": "lobby-east" }
//! ```
//!
//! Exactly one of `rfid` / `fingerprint_id` carries the credential value as
//! a decimal string; the other is an explicit `null`. The authority answers
//! with the holder's display name and an access flag:
//!
//! ```json
//! { "data": "Maria Silva", "access": 1 }
//! ```
//!
//! A `data` value of `"user not found"` means no record exists.

use gatepost_core::constants::USER_NOT_FOUND;
use gatepost_core::{CredentialEvent, CredentialKind, DeviceIdentity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors decoding the authority's reply.
#[derive(Debug, Error)]
pub enum WireError {
    /// The body is not the expected JSON shape.
    #[error("Malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Body of the reporting call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub rfid: Option<String>,
    pub fingerprint_id: Option<String>,
    pub device_id: String,
}

impl ReportRequest {
    /// Build the request for one credential event.
    ///
    /// # Example
    ///
    /// ```
    /// use gatepost_core::{CredentialEvent, DeviceIdentity};
    /// use gatepost_protocol::ReportRequest;
    /// use std::time::Instant;
    ///
    /// let identity = DeviceIdentity::new("lobby-east").unwrap();
    /// let event = CredentialEvent::tag(3_350_811, Instant::now());
    ///
    /// let request = ReportRequest::for_event(&event, &identity);
    /// assert_eq!(request.rfid.as_deref(), Some("3350811"));
    /// assert_eq!(request.fingerprint_id, None);
    /// ```
    pub fn for_event(event: &CredentialEvent, identity: &DeviceIdentity) -> Self {
        let value = event.value().to_string();
        let (rfid, fingerprint_id) = match event.kind() {
            CredentialKind::Tag => (Some(value), None),
            CredentialKind::Biometric => (None, Some(value)),
        };

        Self {
            rfid,
            fingerprint_id,
            device_id: identity.as_str().to_string(),
        }
    }

    /// Serialize to the JSON body sent on the wire.
    pub fn to_json(&self) -> Result<Vec<u8>, WireError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Access flag returned by the authority (`0` or `1` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AccessFlag {
    #[default]
    Denied,
    Granted,
}

impl TryFrom<u8> for AccessFlag {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AccessFlag::Denied),
            1 => Ok(AccessFlag::Granted),
            other => Err(format!("access flag must be 0 or 1, got {other}")),
        }
    }
}

impl From<AccessFlag> for u8 {
    fn from(flag: AccessFlag) -> Self {
        match flag {
            AccessFlag::Denied => 0,
            AccessFlag::Granted => 1,
        }
    }
}

/// Reply of the reporting call.
///
/// A reply without `access` (as sent for unknown credentials) reads as
/// denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportResponse {
    pub data: String,
    #[serde(default)]
    pub access: AccessFlag,
}

impl ReportResponse {
    pub fn granted(name: impl Into<String>) -> Self {
        Self {
            data: name.into(),
            access: AccessFlag::Granted,
        }
    }

    pub fn denied(name: impl Into<String>) -> Self {
        Self {
            data: name.into(),
            access: AccessFlag::Denied,
        }
    }

    pub fn not_found() -> Self {
        Self::denied(USER_NOT_FOUND)
    }

    /// Parse the JSON body returned by the authority.
    ///
    /// # Errors
    ///
    /// Returns `WireError::Malformed` for anything other than an object with
    /// a string `data` and an optional 0/1 `access`.
    pub fn from_json(body: &[u8]) -> Result<Self, WireError> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Interpret the reply.
    ///
    /// The not-found sentinel wins over the access flag.
    ///
    /// # Example
    ///
    /// ```
    /// use gatepost_protocol::{ReportResponse, Verdict};
    ///
    /// let reply = ReportResponse::from_json(br#"{"data":"Ana","access":1}"#).unwrap();
    /// assert_eq!(reply.verdict(), Verdict::Granted { name: "Ana".to_string() });
    ///
    /// let reply = ReportResponse::from_json(br#"{"data":"user not found"}"#).unwrap();
    /// assert_eq!(reply.verdict(), Verdict::NotFound);
    /// ```
    pub fn verdict(&self) -> Verdict {
        let name = self.data.trim();

        if name.eq_ignore_ascii_case(USER_NOT_FOUND) {
            return Verdict::NotFound;
        }

        match self.access {
            AccessFlag::Granted => Verdict::Granted {
                name: name.to_string(),
            },
            AccessFlag::Denied => Verdict::Denied {
                name: name.to_string(),
            },
        }
    }
}

/// What the authority decided about a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Granted { name: String },
    Denied { name: String },
    NotFound,
}

impl Verdict {
    pub fn is_granted(&self) -> bool {
        matches!(self, Verdict::Granted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatepost_core::TemplateId;
    use rstest::rstest;
    use std::time::Instant;

    fn identity() -> DeviceIdentity {
        DeviceIdentity::new("lobby-east").unwrap()
    }

    #[test]
    fn test_tag_request_has_explicit_null_fingerprint() {
        let event = CredentialEvent::tag(3_350_811, Instant::now());
        let body = ReportRequest::for_event(&event, &identity()).to_json().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["rfid"], "3350811");
        assert!(json["fingerprint_id"].is_null());
        assert!(json.as_object().unwrap().contains_key("fingerprint_id"));
        assert_eq!(json["device_id"], "lobby-east");
    }

    #[test]
    fn test_biometric_request_has_explicit_null_rfid() {
        let id = TemplateId::new(12).unwrap();
        let event = CredentialEvent::biometric(id, Instant::now());
        let body = ReportRequest::for_event(&event, &identity()).to_json().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert!(json["rfid"].is_null());
        assert!(json.as_object().unwrap().contains_key("rfid"));
        assert_eq!(json["fingerprint_id"], "12");
    }

    #[rstest]
    #[case(br#"{"data":"Ana","access":1}"#, Verdict::Granted { name: "Ana".to_string() })]
    #[case(br#"{"data":"Ana","access":0}"#, Verdict::Denied { name: "Ana".to_string() })]
    #[case(br#"{"data":"  Bruno  ","access":1}"#, Verdict::Granted { name: "Bruno".to_string() })]
    #[case(br#"{"data":"user not found","access":0}"#, Verdict::NotFound)]
    #[case(br#"{"data":"user not found","access":1}"#, Verdict::NotFound)]
    #[case(br#"{"data":"User Not Found"}"#, Verdict::NotFound)]
    #[case(br#"{"data":"Carla"}"#, Verdict::Denied { name: "Carla".to_string() })]
    fn test_verdict(#[case] body: &[u8], #[case] expected: Verdict) {
        let reply = ReportResponse::from_json(body).unwrap();
        assert_eq!(reply.verdict(), expected);
    }

    #[rstest]
    #[case(b"")]
    #[case(b"<html>502 Bad Gateway</html>")]
    #[case(br#"{"access":1}"#)]
    #[case(br#"{"data":"Ana","access":2}"#)]
    #[case(br#"{"data":42,"access":1}"#)]
    fn test_malformed_response(#[case] body: &[u8]) {
        assert!(matches!(
            ReportResponse::from_json(body),
            Err(WireError::Malformed(_))
        ));
    }

    #[test]
    fn test_response_serializes_flag_as_integer() {
        let json = serde_json::to_string(&ReportResponse::granted("Ana")).unwrap();
        assert_eq!(json, r#"{"data":"Ana","access":1}"#);
    }
}
