// ── Attribute bag and field mapping ──
//
// Local state is a flat, ordered bag of attribute name -> JSON value. Each
// remote or desired type declares a field table pairing its attribute names
// with its wire field names; conversion in both directions goes through that
// table and nothing else.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConvergeError;

/// Declarative local state for one resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(IndexMap<String, Value>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// String attribute, `None` when missing or not a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Bidirectional mapping between a typed value and an [`Attributes`] bag.
///
/// `FIELDS` lists `(attribute, wire_field)` pairs. Wire fields absent from
/// the serialized value map to `null`.
pub trait AttributeMapping: Serialize + DeserializeOwned {
    const FIELDS: &'static [(&'static str, &'static str)];

    fn to_attributes(&self) -> Result<Attributes, ConvergeError> {
        let wire = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Err(ConvergeError::Attribute {
                    name: std::any::type_name::<Self>().into(),
                    reason: format!("expected a JSON object, got {other}"),
                });
            }
            Err(e) => {
                return Err(ConvergeError::Attribute {
                    name: std::any::type_name::<Self>().into(),
                    reason: e.to_string(),
                });
            }
        };

        Ok(Self::FIELDS
            .iter()
            .map(|(attr, field)| (*attr, wire.get(*field).cloned().unwrap_or(Value::Null)))
            .collect())
    }

    fn from_attributes(attrs: &Attributes) -> Result<Self, ConvergeError> {
        let mut wire = Map::new();
        for (attr, field) in Self::FIELDS {
            match attrs.get(attr) {
                Some(Value::Null) | None => {}
                Some(value) => {
                    wire.insert((*field).to_owned(), value.clone());
                }
            }
        }

        if let Some((unknown, _)) = attrs
            .iter()
            .find(|(name, _)| !Self::FIELDS.iter().any(|(attr, _)| *attr == name.as_str()))
        {
            return Err(ConvergeError::Attribute {
                name: unknown.clone(),
                reason: "not a known attribute".into(),
            });
        }

        serde_json::from_value(Value::Object(wire)).map_err(|e| ConvergeError::Attribute {
            name: std::any::type_name::<Self>().into(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Probe {
        network_access_id: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    }

    impl AttributeMapping for Probe {
        const FIELDS: &'static [(&'static str, &'static str)] = &[
            ("network_access_id", "networkAccessId"),
            ("description", "description"),
        ];
    }

    #[test]
    fn maps_wire_fields_onto_attribute_names() {
        let attrs = Probe {
            network_access_id: 7,
            description: Some("lab".into()),
        }
        .to_attributes()
        .unwrap();

        assert_eq!(attrs.get("network_access_id"), Some(&json!(7)));
        assert_eq!(attrs.get_str("description"), Some("lab"));
        assert_eq!(attrs.len(), 2);
    }

    #[test]
    fn skipped_fields_become_null() {
        let attrs = Probe {
            network_access_id: 1,
            description: None,
        }
        .to_attributes()
        .unwrap();
        assert_eq!(attrs.get("description"), Some(&Value::Null));
    }

    #[test]
    fn from_attributes_reverses_the_table() {
        let attrs: Attributes = [("network_access_id", json!(3)), ("description", Value::Null)]
            .into_iter()
            .collect();
        let probe = Probe::from_attributes(&attrs).unwrap();
        assert_eq!(
            probe,
            Probe {
                network_access_id: 3,
                description: None
            }
        );
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        let attrs: Attributes = [("network_access_id", json!(3)), ("colour", json!("red"))]
            .into_iter()
            .collect();
        let err = Probe::from_attributes(&attrs).unwrap_err();
        assert!(matches!(err, ConvergeError::Attribute { ref name, .. } if name == "colour"));
    }

    #[test]
    fn attribute_order_follows_field_table() {
        let attrs = Probe {
            network_access_id: 9,
            description: None,
        }
        .to_attributes()
        .unwrap();
        let names: Vec<_> = attrs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ["network_access_id", "description"]);
    }
}
