use crate::{
    Result,
    constants::{ADMIN_TAG, MAX_TEMPLATE_ID, MIN_TEMPLATE_ID},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use subtle::ConstantTimeEq;

/// Source of a credential presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    /// Contactless tag read through the serial tag reader.
    Tag,
    /// Fingerprint matched against the sensor's template store.
    Biometric,
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CredentialKind::Tag => write!(f, "tag"),
            CredentialKind::Biometric => write!(f, "biometric"),
        }
    }
}

/// Slot number in the fingerprint sensor's template store (1-127).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TemplateId(u16);

impl TemplateId {
    /// Create a template id with range validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidTemplateId` if the id is outside 1-127.
    pub fn new(id: u16) -> Result<Self> {
        if !(MIN_TEMPLATE_ID..=MAX_TEMPLATE_ID).contains(&id) {
            return Err(Error::InvalidTemplateId {
                id,
                min: MIN_TEMPLATE_ID,
                max: MAX_TEMPLATE_ID,
            });
        }
        Ok(TemplateId(id))
    }

    /// Iterate over every valid slot in ascending order.
    pub fn all() -> impl Iterator<Item = TemplateId> {
        (MIN_TEMPLATE_ID..=MAX_TEMPLATE_ID).map(TemplateId)
    }

    #[must_use]
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TemplateId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let id: u16 = s.trim().parse().map_err(|_| Error::InvalidTemplateId {
            id: 0,
            min: MIN_TEMPLATE_ID,
            max: MAX_TEMPLATE_ID,
        })?;
        TemplateId::new(id)
    }
}

/// Result of a successful template search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiometricMatch {
    pub template_id: TemplateId,
    /// Match score reported by the sensor. Higher is better; the scale is
    /// sensor-specific.
    pub confidence: u16,
}

/// A single normalized credential presentation.
///
/// Created once per decoded tag frame or matched fingerprint and never
/// mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialEvent {
    kind: CredentialKind,
    value: u32,
    observed_at: Instant,
}

impl CredentialEvent {
    /// Event for a decoded tag value.
    pub fn tag(value: u32, observed_at: Instant) -> Self {
        Self {
            kind: CredentialKind::Tag,
            value,
            observed_at,
        }
    }

    /// Event for a matched fingerprint template.
    pub fn biometric(template_id: TemplateId, observed_at: Instant) -> Self {
        Self {
            kind: CredentialKind::Biometric,
            value: u32::from(template_id.as_u16()),
            observed_at,
        }
    }

    #[must_use]
    pub fn kind(&self) -> CredentialKind {
        self.kind
    }

    #[must_use]
    pub fn value(&self) -> u32 {
        self.value
    }

    #[must_use]
    pub fn observed_at(&self) -> Instant {
        self.observed_at
    }

    /// Whether this is the tag that starts fingerprint enrollment.
    ///
    /// # Security
    /// The comparison runs in constant time so the admin value cannot be
    /// probed through response timing.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.kind == CredentialKind::Tag && bool::from(self.value.ct_eq(&ADMIN_TAG))
    }
}

impl fmt::Display for CredentialEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.value)
    }
}

/// Provisioned name of this terminal, sent with every report.
///
/// Opaque to the pipeline: it is read once at start-up and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceIdentity(String);

impl DeviceIdentity {
    /// Create an identity from its stored form.
    ///
    /// Surrounding whitespace (such as a trailing newline from the identity
    /// file) is stripped.
    ///
    /// # Errors
    /// Returns `Error::InvalidIdentity` if the value is empty or contains
    /// control characters.
    pub fn new(value: &str) -> Result<Self> {
        let value = value.trim();

        if value.is_empty() {
            return Err(Error::InvalidIdentity("identity is empty".to_string()));
        }

        if value.chars().any(char::is_control) {
            return Err(Error::InvalidIdentity(
                "identity contains control characters".to_string(),
            ));
        }

        Ok(DeviceIdentity(value.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DeviceIdentity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DeviceIdentity::new(s)
    }
}

impl TryFrom<String> for DeviceIdentity {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        DeviceIdentity::new(&value)
    }
}

impl From<DeviceIdentity> for String {
    fn from(identity: DeviceIdentity) -> Self {
        identity.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1)]
    #[case(64)]
    #[case(127)]
    fn test_template_id_valid(#[case] id: u16) {
        assert_eq!(TemplateId::new(id).unwrap().as_u16(), id);
    }

    #[rstest]
    #[case(0)]
    #[case(128)]
    #[case(u16::MAX)]
    fn test_template_id_out_of_range(#[case] id: u16) {
        assert!(matches!(
            TemplateId::new(id),
            Err(Error::InvalidTemplateId { .. })
        ));
    }

    #[test]
    fn test_template_id_all_is_ascending_and_complete() {
        let ids: Vec<u16> = TemplateId::all().map(|id| id.as_u16()).collect();
        assert_eq!(ids.len(), 127);
        assert_eq!(ids.first(), Some(&1));
        assert_eq!(ids.last(), Some(&127));
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_template_id_from_str() {
        assert_eq!("42".parse::<TemplateId>().unwrap().as_u16(), 42);
        assert!("abc".parse::<TemplateId>().is_err());
        assert!("0".parse::<TemplateId>().is_err());
    }

    #[test]
    fn test_tag_event() {
        let now = Instant::now();
        let event = CredentialEvent::tag(3_350_811, now);
        assert_eq!(event.kind(), CredentialKind::Tag);
        assert_eq!(event.value(), 3_350_811);
        assert_eq!(event.observed_at(), now);
        assert_eq!(event.to_string(), "tag:3350811");
    }

    #[test]
    fn test_biometric_event_carries_template_id() {
        let id = TemplateId::new(17).unwrap();
        let event = CredentialEvent::biometric(id, Instant::now());
        assert_eq!(event.kind(), CredentialKind::Biometric);
        assert_eq!(event.value(), 17);
    }

    #[test]
    fn test_is_admin_only_for_tags() {
        let now = Instant::now();
        assert!(CredentialEvent::tag(ADMIN_TAG, now).is_admin());
        assert!(!CredentialEvent::tag(ADMIN_TAG + 1, now).is_admin());

        // A biometric event never triggers enrollment, whatever its value.
        let id = TemplateId::new(1).unwrap();
        assert!(!CredentialEvent::biometric(id, now).is_admin());
    }

    #[rstest]
    #[case("terminal-01", "terminal-01")]
    #[case("  lobby-east\n", "lobby-east")]
    fn test_device_identity_trims(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(DeviceIdentity::new(raw).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   \n")]
    #[case("door\u{7}bell")]
    fn test_device_identity_rejects(#[case] raw: &str) {
        assert!(matches!(
            DeviceIdentity::new(raw),
            Err(Error::InvalidIdentity(_))
        ));
    }

    #[test]
    fn test_device_identity_serde() {
        let identity = DeviceIdentity::new("gate-7").unwrap();
        let json = serde_json::to_string(&identity).unwrap();
        assert_eq!(json, "\"gate-7\"");

        let back: DeviceIdentity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, identity);

        assert!(serde_json::from_str::<DeviceIdentity>("\"\"").is_err());
    }
}
