//! Discriminated remote results.

use serde::Deserialize;

use crate::error::Error;

/// Shared shape of every remote domain error variant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorPayload {
    #[serde(rename = "__typename")]
    pub typename: String,
    #[serde(default)]
    pub message: String,
}

impl ErrorPayload {
    pub fn into_error(self) -> Error {
        Error::api(self.typename, self.message)
    }
}

/// Declares a closed result union keyed on `__typename`.
///
/// Unknown typenames decode into `Unrecognized` instead of failing, so the
/// calling service can report exactly which variant it did not expect.
macro_rules! discriminated {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident($typename:literal) => $payload:ty),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub enum $name {
            $($variant($payload),)+
            Unrecognized(String),
        }

        impl $name {
            #[allow(dead_code)]
            pub fn typename(&self) -> &str {
                match self {
                    $(Self::$variant(_) => $typename,)+
                    Self::Unrecognized(typename) => typename,
                }
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let value = serde_json::Value::deserialize(deserializer)?;
                let typename = value
                    .get("__typename")
                    .and_then(serde_json::Value::as_str)
                    .ok_or_else(|| serde::de::Error::missing_field("__typename"))?
                    .to_string();
                match typename.as_str() {
                    $($typename => serde_json::from_value(value)
                        .map(Self::$variant)
                        .map_err(serde::de::Error::custom),)+
                    _ => Ok(Self::Unrecognized(typename)),
                }
            }
        }
    };
}

pub(crate) use discriminated;
