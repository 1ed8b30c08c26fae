//! Serde helpers for the CData Sync wire format.
//!
//! The Sync API represents several boolean fields as the strings `"true"` /
//! `"false"`, and some integer ID fields are large enough to lose precision
//! when routed through an f64. These modules keep both families intact
//! across a round trip.

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::fmt;

/// Booleans carried as `"true"` / `"false"` strings on the wire.
///
/// Accepts a JSON bool or a string (case-insensitive) when deserializing,
/// always emits a string when serializing. Use together with
/// `#[serde(default, skip_serializing_if = "Option::is_none")]`.
pub mod stringly_bool {
    use super::*;

    pub fn serialize<S>(value: &Option<bool>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(true) => serializer.serialize_str("true"),
            Some(false) => serializer.serialize_str("false"),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct StringlyBoolVisitor;

        impl<'de> Visitor<'de> for StringlyBoolVisitor {
            type Value = Option<bool>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a boolean or a \"true\"/\"false\" string")
            }

            fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Some(v))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                match v.to_ascii_lowercase().as_str() {
                    "true" => Ok(Some(true)),
                    "false" => Ok(Some(false)),
                    other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
                }
            }

            fn visit_none<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(None)
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(None)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                deserializer.deserialize_any(StringlyBoolVisitor)
            }
        }

        deserializer.deserialize_option(StringlyBoolVisitor)
    }
}

/// Integer IDs carried as strings to dodge f64 precision loss.
///
/// The request log and workspace IDs are 64-bit integers that some Sync
/// builds emit as JSON numbers and others as strings. Either form
/// deserializes into a `String`; serialization always emits the string.
pub mod string_id {
    use super::*;

    pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_str(v),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct StringIdVisitor;

        impl<'de> Visitor<'de> for StringIdVisitor {
            type Value = Option<String>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an integer or a string ID")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Some(v.to_string()))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Some(v.to_string()))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Some(v.to_string()))
            }

            fn visit_none<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(None)
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(None)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                deserializer.deserialize_any(StringIdVisitor)
            }
        }

        deserializer.deserialize_option(StringIdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Flags {
        #[serde(
            default,
            with = "super::stringly_bool",
            skip_serializing_if = "Option::is_none"
        )]
        scheduled: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Record {
        #[serde(
            default,
            with = "super::string_id",
            skip_serializing_if = "Option::is_none"
        )]
        id: Option<String>,
    }

    #[test]
    fn stringly_bool_accepts_string_forms() {
        let parsed: Flags = serde_json::from_str(r#"{"scheduled":"true"}"#).unwrap();
        assert_eq!(parsed.scheduled, Some(true));

        let parsed: Flags = serde_json::from_str(r#"{"scheduled":"FALSE"}"#).unwrap();
        assert_eq!(parsed.scheduled, Some(false));
    }

    #[test]
    fn stringly_bool_accepts_native_bool() {
        let parsed: Flags = serde_json::from_str(r#"{"scheduled":true}"#).unwrap();
        assert_eq!(parsed.scheduled, Some(true));
    }

    #[test]
    fn stringly_bool_serializes_as_string() {
        let json = serde_json::to_string(&Flags {
            scheduled: Some(false),
        })
        .unwrap();
        assert_eq!(json, r#"{"scheduled":"false"}"#);
    }

    #[test]
    fn stringly_bool_missing_and_null() {
        let parsed: Flags = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.scheduled, None);

        let parsed: Flags = serde_json::from_str(r#"{"scheduled":null}"#).unwrap();
        assert_eq!(parsed.scheduled, None);
    }

    #[test]
    fn stringly_bool_rejects_garbage() {
        let parsed: Result<Flags, _> = serde_json::from_str(r#"{"scheduled":"yes"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn string_id_accepts_large_number() {
        // Above 2^53, where an f64 round trip would corrupt the value.
        let parsed: Record = serde_json::from_str(r#"{"id":9007199254740993}"#).unwrap();
        assert_eq!(parsed.id, Some("9007199254740993".to_string()));
    }

    #[test]
    fn string_id_accepts_string() {
        let parsed: Record = serde_json::from_str(r#"{"id":"42"}"#).unwrap();
        assert_eq!(parsed.id, Some("42".to_string()));
    }

    #[test]
    fn string_id_serializes_as_string() {
        let json = serde_json::to_string(&Record {
            id: Some("9007199254740993".to_string()),
        })
        .unwrap();
        assert_eq!(json, r#"{"id":"9007199254740993"}"#);
    }
}
