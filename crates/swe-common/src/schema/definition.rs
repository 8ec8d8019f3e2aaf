//! Serializable schema definition documents.
//!
//! A [`ComponentDef`] is the JSON/YAML form of a component tree:
//!
//! ```json
//! { "name": "obs", "type": "record", "fields": [
//!     { "name": "count", "type": "count" },
//!     { "name": "values", "type": "array", "element_count": { "sibling": "count" },
//!       "element": { "name": "v", "type": "quantity", "uom": "m" } } ] }
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{DataError, DataResult};
use crate::value::DataType;

use super::{DataComponent, ElementCount, ScalarKind};

/// One node of a schema definition document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDef {
    pub name: String,
    #[serde(flatten)]
    pub kind: KindDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default)]
    pub optional: bool,
    /// Storage kind override for scalars.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KindDef {
    Boolean,
    Count,
    Quantity {
        #[serde(default)]
        uom: Option<String>,
    },
    Time {
        #[serde(default)]
        uom: Option<String>,
    },
    Category {
        #[serde(default)]
        code_space: Option<String>,
    },
    Text,
    Record {
        fields: Vec<ComponentDef>,
    },
    Array {
        element: Box<ComponentDef>,
        element_count: ElementCount,
    },
    Choice {
        items: Vec<ComponentDef>,
    },
}

/// A name visible to array size references, and whether it can hold a count.
type Visible = (String, bool);

impl ComponentDef {
    pub fn from_json(json: &str) -> DataResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate the document and build the component tree.
    ///
    /// Names must be unique among siblings and every sibling size reference
    /// must name a preceding integer field of an enclosing record.
    pub fn build(&self) -> DataResult<DataComponent> {
        self.build_with(&mut Vec::new())
    }

    fn build_with(&self, visible: &mut Vec<Visible>) -> DataResult<DataComponent> {
        if self.name.is_empty() {
            return Err(DataError::InvalidDefinition(
                "component names must not be empty".to_string(),
            ));
        }

        let component = match &self.kind {
            KindDef::Boolean => DataComponent::scalar(&self.name, ScalarKind::Boolean),
            KindDef::Count => DataComponent::scalar(&self.name, ScalarKind::Count),
            KindDef::Quantity { uom } => {
                DataComponent::scalar(&self.name, ScalarKind::Quantity { uom: uom.clone() })
            }
            KindDef::Time { uom } => {
                DataComponent::scalar(&self.name, ScalarKind::Time { uom: uom.clone() })
            }
            KindDef::Category { code_space } => DataComponent::scalar(
                &self.name,
                ScalarKind::Category {
                    code_space: code_space.clone(),
                },
            ),
            KindDef::Text => DataComponent::scalar(&self.name, ScalarKind::Text),
            KindDef::Record { fields } => {
                check_unique(&self.name, fields)?;
                let depth = visible.len();
                let mut built = Vec::with_capacity(fields.len());
                for field in fields {
                    built.push(field.build_with(visible)?);
                    visible.push((field.name.clone(), field.is_integer_scalar()));
                }
                visible.truncate(depth);
                DataComponent::record(&self.name, built)
            }
            KindDef::Array {
                element,
                element_count,
            } => {
                match element_count {
                    ElementCount::Sibling(count) => {
                        let found = visible.iter().rev().find(|(name, _)| name == count);
                        match found {
                            Some((_, true)) => {}
                            Some((_, false)) => {
                                return Err(DataError::InvalidDefinition(format!(
                                    "size field '{}' of array '{}' is not an integer",
                                    count, self.name
                                )))
                            }
                            None => {
                                return Err(DataError::InvalidDefinition(format!(
                                    "size field '{}' of array '{}' does not precede it",
                                    count, self.name
                                )))
                            }
                        }
                    }
                    ElementCount::Fixed(_) | ElementCount::Inline => {}
                }
                let element = element.build_with(visible)?;
                DataComponent::array(&self.name, element, element_count.clone())
            }
            KindDef::Choice { items } => {
                if items.is_empty() {
                    return Err(DataError::InvalidDefinition(format!(
                        "choice '{}' has no items",
                        self.name
                    )));
                }
                check_unique(&self.name, items)?;
                let built = items
                    .iter()
                    .map(|item| item.build_with(visible))
                    .collect::<DataResult<Vec<_>>>()?;
                DataComponent::choice(&self.name, built)
            }
        };

        let mut component = component.with_optional(self.optional);
        component.label = self.label.clone();
        component.description = self.description.clone();
        component.definition = self.definition.clone();
        if let Some(data_type) = self.data_type {
            if !component.is_scalar() {
                return Err(DataError::InvalidDefinition(format!(
                    "data_type is only allowed on scalars ('{}')",
                    self.name
                )));
            }
            component = component.with_data_type(data_type);
        }
        Ok(component)
    }

    fn is_integer_scalar(&self) -> bool {
        match &self.kind {
            KindDef::Record { .. } | KindDef::Array { .. } | KindDef::Choice { .. } => false,
            KindDef::Count => self.data_type.map_or(true, |t| t.is_integer()),
            _ => self.data_type.is_some_and(|t| t.is_integer()),
        }
    }
}

fn check_unique(parent: &str, children: &[ComponentDef]) -> DataResult<()> {
    let mut seen = HashSet::new();
    for child in children {
        if !seen.insert(child.name.as_str()) {
            return Err(DataError::InvalidDefinition(format!(
                "duplicate name '{}' in '{}'",
                child.name, parent
            )));
        }
    }
    Ok(())
}

impl DataComponent {
    /// Build a component tree from a JSON definition document.
    pub fn from_json(json: &str) -> DataResult<Self> {
        ComponentDef::from_json(json)?.build()
    }

    /// Definition document describing this component's structure.
    pub fn to_def(&self) -> ComponentDef {
        use super::ComponentKind;

        let mut data_type = None;
        let kind = match &self.kind {
            ComponentKind::Scalar(scalar) => {
                if scalar.data_type != scalar.kind.default_data_type() {
                    data_type = Some(scalar.data_type);
                }
                match &scalar.kind {
                    ScalarKind::Boolean => KindDef::Boolean,
                    ScalarKind::Count => KindDef::Count,
                    ScalarKind::Quantity { uom } => KindDef::Quantity { uom: uom.clone() },
                    ScalarKind::Time { uom } => KindDef::Time { uom: uom.clone() },
                    ScalarKind::Category { code_space } => KindDef::Category {
                        code_space: code_space.clone(),
                    },
                    ScalarKind::Text => KindDef::Text,
                }
            }
            ComponentKind::Record(record) => KindDef::Record {
                fields: record.fields.iter().map(|f| f.to_def()).collect(),
            },
            ComponentKind::Array(array) => KindDef::Array {
                element: Box::new(array.element.to_def()),
                element_count: array.element_count.clone(),
            },
            ComponentKind::Choice(choice) => KindDef::Choice {
                items: choice.items.iter().map(|i| i.to_def()).collect(),
            },
        };
        ComponentDef {
            name: self.name.clone(),
            kind,
            label: self.label.clone(),
            description: self.description.clone(),
            definition: self.definition.clone(),
            optional: self.optional,
            data_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OBSERVATION: &str = r#"{
        "name": "observation",
        "type": "record",
        "fields": [
            { "name": "time", "type": "time", "uom": "http://www.opengis.net/def/uom/ISO-8601/0/Gregorian" },
            { "name": "count", "type": "count" },
            { "name": "values", "type": "array",
              "element_count": { "sibling": "count" },
              "element": { "name": "value", "type": "quantity", "uom": "m", "data_type": "float" } }
        ]
    }"#;

    #[test]
    fn test_build_from_json() {
        let root = DataComponent::from_json(OBSERVATION).unwrap();
        assert!(root.is_record());
        assert_eq!(root.component_count(), 3);
        let element = root.find("values/value").unwrap();
        assert_eq!(element.data_type(), Some(DataType::Float));
        assert_eq!(element.scalar_kind().and_then(|k| k.uom()), Some("m"));
    }

    #[test]
    fn test_sibling_reference_must_precede_array() {
        let json = r#"{
            "name": "r", "type": "record", "fields": [
                { "name": "values", "type": "array", "element_count": { "sibling": "n" },
                  "element": { "name": "v", "type": "count" } },
                { "name": "n", "type": "count" }
            ]
        }"#;
        let err = DataComponent::from_json(json).unwrap_err();
        assert!(matches!(err, DataError::InvalidDefinition(msg) if msg.contains("does not precede")));
    }

    #[test]
    fn test_sibling_reference_must_be_integer() {
        let json = r#"{
            "name": "r", "type": "record", "fields": [
                { "name": "n", "type": "quantity" },
                { "name": "values", "type": "array", "element_count": { "sibling": "n" },
                  "element": { "name": "v", "type": "count" } }
            ]
        }"#;
        assert!(DataComponent::from_json(json).is_err());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let json = r#"{ "name": "r", "type": "record", "fields": [
            { "name": "a", "type": "boolean" }, { "name": "a", "type": "text" } ] }"#;
        assert!(DataComponent::from_json(json).is_err());
    }

    #[test]
    fn test_to_def_round_trips_structure() {
        let def = ComponentDef::from_json(OBSERVATION).unwrap();
        assert_eq!(def.build().unwrap().to_def(), def);
    }
}
