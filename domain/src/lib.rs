//! Domain library for Universe Notes.
//!
//! Holds the planet record types, the ports (traits) the store talks to,
//! and the error definitions. Storage engines, media pickers and rendering
//! live in adapter and app crates; keep IO concerns out of this crate.

use std::fmt::{Display, Formatter};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage key under which the whole planet list is persisted.
pub const PLANETS_KEY: &str = "planets";

/// Unique identifier of a planet record.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlanetId(String);

impl PlanetId {
    pub fn new<S: Into<String>>(s: S) -> Result<Self, CoreError> {
        let val = s.into();
        if val.is_empty() {
            return Err(CoreError::InvalidId);
        }
        Ok(Self(val))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Planet title. Always trimmed and never empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Title(String);

impl Title {
    pub fn new<S: AsRef<str>>(s: S) -> Result<Self, CoreError> {
        let trimmed = s.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CoreError::EmptyTitle);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Reference (URI or path) to a locally accessible image.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new<S: Into<String>>(s: S) -> Result<Self, CoreError> {
        let val = s.into();
        if val.is_empty() {
            return Err(CoreError::InvalidImageRef);
        }
        Ok(Self(val))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! string_newtype_conversions {
    ($($ty:ident),*) => {
        $(
            impl TryFrom<String> for $ty {
                type Error = CoreError;

                fn try_from(value: String) -> Result<Self, Self::Error> {
                    Self::new(value)
                }
            }

            impl From<$ty> for String {
                fn from(value: $ty) -> Self {
                    value.0
                }
            }

            impl Display for $ty {
                fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                    f.write_str(&self.0)
                }
            }
        )*
    };
}

string_newtype_conversions!(PlanetId, Title, ImageRef);

/// One user-created entry in the list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanetRecord {
    pub id: PlanetId,
    pub title: Title,
    /// Absent images are written as `null`; a missing field loads as `None`.
    #[serde(default)]
    pub image: Option<ImageRef>,
}

impl PlanetRecord {
    pub fn new(id: PlanetId, title: Title, image: Option<ImageRef>) -> Self {
        Self { id, title, image }
    }
}

/// Time source abstraction to make code testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Source of fresh planet ids.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> PlanetId;
}

/// Key-value storage port. Values are replaced wholesale on `set`.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), CoreError>;
}

/// Answer to a media-library permission request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// Result of presenting the image picker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PickOutcome {
    /// The user confirmed a selection. May be empty on some platforms.
    Selected(Vec<ImageRef>),
    Cancelled,
}

/// Platform image picker and media permission port.
pub trait ImagePicker: Send + Sync {
    fn request_permission(&self) -> Result<Permission, CoreError>;
    fn pick_image(&self) -> Result<PickOutcome, CoreError>;
}

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("planet id must not be empty")]
    InvalidId,
    #[error("image reference must not be empty")]
    InvalidImageRef,
    #[error("failed to generate a unique planet id")]
    IdExhausted,
    #[error("media library access denied")]
    PermissionDenied,
    #[error("storage read failed: {0}")]
    StorageRead(String),
    #[error("stored planet list is unreadable: {0}")]
    StorageParse(String),
    #[error("storage write failed: {0}")]
    StorageWrite(String),
    #[error("image picker failed: {0}")]
    ImagePicker(String),
}

pub mod adapters;
pub mod codec;
pub mod form;
pub mod ids;
pub mod screen;
pub mod store;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_trimmed() {
        let t = Title::new("  Mars \n").expect("valid title");
        assert_eq!(t.as_str(), "Mars");
    }

    #[test]
    fn title_rejects_blank() {
        assert!(matches!(Title::new(""), Err(CoreError::EmptyTitle)));
        assert!(matches!(Title::new(" \t "), Err(CoreError::EmptyTitle)));
    }

    #[test]
    fn ids_and_images_reject_empty() {
        assert!(matches!(PlanetId::new(""), Err(CoreError::InvalidId)));
        assert!(matches!(ImageRef::new(""), Err(CoreError::InvalidImageRef)));
        assert_eq!(PlanetId::new("17").unwrap().as_str(), "17");
    }

    #[test]
    fn record_serializes_absent_image_as_null() {
        let rec = PlanetRecord::new(
            PlanetId::new("1").unwrap(),
            Title::new("Mars").unwrap(),
            None,
        );
        let json = serde_json::to_string(&rec).unwrap();
        assert_eq!(json, r#"{"id":"1","title":"Mars","image":null}"#);
    }

    #[test]
    fn record_deserialize_validates_title() {
        let bad = serde_json::from_str::<PlanetRecord>(r#"{"id":"1","title":"   "}"#);
        assert!(bad.is_err());
        let ok: PlanetRecord = serde_json::from_str(r#"{"id":"1","title":" Io "}"#).unwrap();
        assert_eq!(ok.title.as_str(), "Io");
        assert!(ok.image.is_none());
    }
}
