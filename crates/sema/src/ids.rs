use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::{SemaError, SemaResult};

/// 16-byte identifier used for both metadata records and owning entities.
/// Renders as a UUID by default; ULID text forms are accepted on input so
/// hosts with ULID keys can pass theirs through unchanged.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Id(pub [u8; 16]);

impl Id {
    pub fn new() -> Self {
        Self(*Uuid::new_v4().as_bytes())
    }

    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub fn from_uuid_str(value: &str) -> SemaResult<Self> {
        let uuid = Uuid::parse_str(value)
            .map_err(|err| SemaError::invalid(format!("invalid uuid '{value}': {err}")))?;
        Ok(Self(*uuid.as_bytes()))
    }

    pub fn from_ulid_str(value: &str) -> SemaResult<Self> {
        let ulid = ulid::Ulid::from_string(value)
            .map_err(|err| SemaError::invalid(format!("invalid ulid '{value}': {err}")))?;
        Ok(Self(ulid.to_bytes()))
    }

    pub fn to_uuid_string(self) -> String {
        Uuid::from_bytes(self.0).to_string()
    }

    pub fn to_ulid_string(self) -> String {
        ulid::Ulid::from_bytes(self.0).to_string()
    }

    pub fn as_bytes(self) -> [u8; 16] {
        self.0
    }

    pub fn as_vec(self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Uuid::from_bytes(self.0))
    }
}

impl Serialize for Id {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_uuid_string())
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        if let Ok(uuid) = Uuid::parse_str(&value) {
            return Ok(Id::from_bytes(*uuid.as_bytes()));
        }
        if let Ok(ulid) = ulid::Ulid::from_string(&value) {
            return Ok(Id::from_bytes(ulid.to_bytes()));
        }
        Err(serde::de::Error::custom("invalid Id string"))
    }
}

#[cfg(test)]
mod tests {
    use super::Id;

    #[test]
    fn id_roundtrips_both_text_forms() {
        let id = Id::new();
        let from_uuid = Id::from_uuid_str(&id.to_uuid_string()).expect("uuid parse");
        let from_ulid = Id::from_ulid_str(&id.to_ulid_string()).expect("ulid parse");
        assert_eq!(from_uuid, id);
        assert_eq!(from_ulid, id);
    }

    #[test]
    fn id_rejects_garbage() {
        assert!(Id::from_uuid_str("not-a-uuid").is_err());
        assert!(Id::from_ulid_str("not-a-ulid").is_err());
    }
}
