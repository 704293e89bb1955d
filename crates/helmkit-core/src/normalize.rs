//! Conversion of arbitrary `Serialize` values into plain values trees
//!
//! Structs become mappings keyed by their serialized field names, kept
//! verbatim. Chart values are conventionally lowerCamelCase, so value structs
//! should carry `#[serde(rename_all = "camelCase")]`; explicit
//! `#[serde(rename = "...")]` names always win over it.

use serde::ser::{self, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{CoreError, Result};

/// Normalize any serializable value into a JSON value tree
pub fn normalize<T: Serialize + ?Sized>(value: &T) -> Result<JsonValue> {
    value
        .serialize(Normalizer)
        .map_err(|e| CoreError::Values {
            message: e.to_string(),
        })
}

struct Normalizer;

type Error = serde_json::Error;

impl ser::Serializer for Normalizer {
    type Ok = JsonValue;
    type Error = Error;

    type SerializeSeq = SeqBuilder;
    type SerializeTuple = SeqBuilder;
    type SerializeTupleStruct = SeqBuilder;
    type SerializeTupleVariant = VariantSeqBuilder;
    type SerializeMap = MapBuilder;
    type SerializeStruct = StructBuilder;
    type SerializeStructVariant = VariantStructBuilder;

    fn serialize_bool(self, v: bool) -> std::result::Result<JsonValue, Error> {
        Ok(JsonValue::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> std::result::Result<JsonValue, Error> {
        Ok(JsonValue::from(v))
    }

    fn serialize_i16(self, v: i16) -> std::result::Result<JsonValue, Error> {
        Ok(JsonValue::from(v))
    }

    fn serialize_i32(self, v: i32) -> std::result::Result<JsonValue, Error> {
        Ok(JsonValue::from(v))
    }

    fn serialize_i64(self, v: i64) -> std::result::Result<JsonValue, Error> {
        Ok(JsonValue::from(v))
    }

    fn serialize_i128(self, v: i128) -> std::result::Result<JsonValue, Error> {
        ser::Serializer::serialize_i128(serde_json::value::Serializer, v)
    }

    fn serialize_u8(self, v: u8) -> std::result::Result<JsonValue, Error> {
        Ok(JsonValue::from(v))
    }

    fn serialize_u16(self, v: u16) -> std::result::Result<JsonValue, Error> {
        Ok(JsonValue::from(v))
    }

    fn serialize_u32(self, v: u32) -> std::result::Result<JsonValue, Error> {
        Ok(JsonValue::from(v))
    }

    fn serialize_u64(self, v: u64) -> std::result::Result<JsonValue, Error> {
        Ok(JsonValue::from(v))
    }

    fn serialize_u128(self, v: u128) -> std::result::Result<JsonValue, Error> {
        ser::Serializer::serialize_u128(serde_json::value::Serializer, v)
    }

    fn serialize_f32(self, v: f32) -> std::result::Result<JsonValue, Error> {
        Ok(JsonValue::from(v))
    }

    fn serialize_f64(self, v: f64) -> std::result::Result<JsonValue, Error> {
        Ok(JsonValue::from(v))
    }

    fn serialize_char(self, v: char) -> std::result::Result<JsonValue, Error> {
        Ok(JsonValue::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> std::result::Result<JsonValue, Error> {
        Ok(JsonValue::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> std::result::Result<JsonValue, Error> {
        Ok(JsonValue::Array(v.iter().map(|b| JsonValue::from(*b)).collect()))
    }

    fn serialize_none(self) -> std::result::Result<JsonValue, Error> {
        Ok(JsonValue::Null)
    }

    fn serialize_some<T: Serialize + ?Sized>(
        self,
        value: &T,
    ) -> std::result::Result<JsonValue, Error> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> std::result::Result<JsonValue, Error> {
        Ok(JsonValue::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> std::result::Result<JsonValue, Error> {
        Ok(JsonValue::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> std::result::Result<JsonValue, Error> {
        Ok(JsonValue::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> std::result::Result<JsonValue, Error> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> std::result::Result<JsonValue, Error> {
        let mut map = Map::new();
        map.insert(variant.to_string(), value.serialize(Normalizer)?);
        Ok(JsonValue::Object(map))
    }

    fn serialize_seq(self, len: Option<usize>) -> std::result::Result<SeqBuilder, Error> {
        Ok(SeqBuilder {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> std::result::Result<SeqBuilder, Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> std::result::Result<SeqBuilder, Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> std::result::Result<VariantSeqBuilder, Error> {
        Ok(VariantSeqBuilder {
            variant,
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> std::result::Result<MapBuilder, Error> {
        Ok(MapBuilder {
            map: Map::new(),
            next_key: None,
        })
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> std::result::Result<StructBuilder, Error> {
        Ok(StructBuilder { map: Map::new() })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> std::result::Result<VariantStructBuilder, Error> {
        Ok(VariantStructBuilder {
            variant,
            map: Map::new(),
        })
    }
}

struct SeqBuilder {
    items: Vec<JsonValue>,
}

impl ser::SerializeSeq for SeqBuilder {
    type Ok = JsonValue;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> std::result::Result<(), Error> {
        self.items.push(value.serialize(Normalizer)?);
        Ok(())
    }

    fn end(self) -> std::result::Result<JsonValue, Error> {
        Ok(JsonValue::Array(self.items))
    }
}

impl ser::SerializeTuple for SeqBuilder {
    type Ok = JsonValue;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> std::result::Result<(), Error> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> std::result::Result<JsonValue, Error> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SeqBuilder {
    type Ok = JsonValue;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> std::result::Result<(), Error> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> std::result::Result<JsonValue, Error> {
        ser::SerializeSeq::end(self)
    }
}

struct VariantSeqBuilder {
    variant: &'static str,
    items: Vec<JsonValue>,
}

impl ser::SerializeTupleVariant for VariantSeqBuilder {
    type Ok = JsonValue;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> std::result::Result<(), Error> {
        self.items.push(value.serialize(Normalizer)?);
        Ok(())
    }

    fn end(self) -> std::result::Result<JsonValue, Error> {
        let mut map = Map::new();
        map.insert(self.variant.to_string(), JsonValue::Array(self.items));
        Ok(JsonValue::Object(map))
    }
}

struct MapBuilder {
    map: Map<String, JsonValue>,
    next_key: Option<String>,
}

impl ser::SerializeMap for MapBuilder {
    type Ok = JsonValue;
    type Error = Error;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> std::result::Result<(), Error> {
        let key = match key.serialize(Normalizer)? {
            JsonValue::String(s) => s,
            JsonValue::Bool(b) => b.to_string(),
            JsonValue::Number(n) => n.to_string(),
            other => {
                return Err(ser::Error::custom(format!(
                    "map key must be a string, got {}",
                    other
                )));
            }
        };
        self.next_key = Some(key);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> std::result::Result<(), Error> {
        let key = self
            .next_key
            .take()
            .ok_or_else(|| <Error as ser::Error>::custom("map value without a key"))?;
        self.map.insert(key, value.serialize(Normalizer)?);
        Ok(())
    }

    fn end(self) -> std::result::Result<JsonValue, Error> {
        Ok(JsonValue::Object(self.map))
    }
}

struct StructBuilder {
    map: Map<String, JsonValue>,
}

impl ser::SerializeStruct for StructBuilder {
    type Ok = JsonValue;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> std::result::Result<(), Error> {
        self.map.insert(key.to_string(), value.serialize(Normalizer)?);
        Ok(())
    }

    fn end(self) -> std::result::Result<JsonValue, Error> {
        Ok(JsonValue::Object(self.map))
    }
}

struct VariantStructBuilder {
    variant: &'static str,
    map: Map<String, JsonValue>,
}

impl ser::SerializeStructVariant for VariantStructBuilder {
    type Ok = JsonValue;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> std::result::Result<(), Error> {
        self.map.insert(key.to_string(), value.serialize(Normalizer)?);
        Ok(())
    }

    fn end(self) -> std::result::Result<JsonValue, Error> {
        let mut outer = Map::new();
        outer.insert(self.variant.to_string(), JsonValue::Object(self.map));
        Ok(JsonValue::Object(outer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Image {
        repository: String,
        pull_policy: String,
        #[serde(rename = "tag")]
        image_tag: String,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Deployment {
        replica_count: u32,
        image: Image,
        extra_labels: BTreeMap<String, String>,
        node_selector: Option<String>,
    }

    #[test]
    fn test_declared_names_kept() {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Pull {
            #[serde(rename = "pull_policy")]
            policy: String,
            image_pull_secrets: Vec<String>,
        }

        #[derive(Serialize)]
        struct Raw {
            node_selector: String,
        }

        let value = normalize(&Pull {
            policy: "Always".to_string(),
            image_pull_secrets: vec![],
        })
        .unwrap();
        assert_eq!(value, json!({"pull_policy": "Always", "imagePullSecrets": []}));

        let value = normalize(&Raw {
            node_selector: "ssd".to_string(),
        })
        .unwrap();
        assert_eq!(value, json!({"node_selector": "ssd"}));
    }

    #[test]
    fn test_normalize_struct_fields() {
        let mut labels = BTreeMap::new();
        labels.insert("team_name".to_string(), "storage".to_string());

        let value = normalize(&Deployment {
            replica_count: 3,
            image: Image {
                repository: "nginx".to_string(),
                pull_policy: "Always".to_string(),
                image_tag: "1.25".to_string(),
            },
            extra_labels: labels,
            node_selector: None,
        })
        .unwrap();

        assert_eq!(
            value,
            json!({
                "replicaCount": 3,
                "image": {
                    "repository": "nginx",
                    "pullPolicy": "Always",
                    "tag": "1.25"
                },
                "extraLabels": { "team_name": "storage" },
                "nodeSelector": null
            })
        );
    }

    #[test]
    fn test_normalize_enums() {
        #[derive(Serialize)]
        enum Mode {
            Simple,
            #[serde(rename_all = "camelCase")]
            Scaled { min_replicas: u32 },
        }

        assert_eq!(normalize(&Mode::Simple).unwrap(), json!("Simple"));
        assert_eq!(
            normalize(&Mode::Scaled { min_replicas: 2 }).unwrap(),
            json!({ "Scaled": { "minReplicas": 2 } })
        );
    }

    #[test]
    fn test_normalize_plain_values() {
        assert_eq!(normalize(&vec![1, 2, 3]).unwrap(), json!([1, 2, 3]));
        assert_eq!(normalize("text").unwrap(), json!("text"));
        assert_eq!(normalize(&json!({"a_b": 1})).unwrap(), json!({"a_b": 1}));
    }
}
