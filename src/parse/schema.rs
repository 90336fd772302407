//! Het markup-schema: per tag de toegestane attributen, hun types, standaard-
//! waarden en verplichting.
//!
//! Het gebundelde schema wordt met `include_str!` meegecompileerd en via
//! `quick_xml::de` ingelezen.

use std::collections::HashMap;

use quick_xml::de::from_str;
use serde::Deserialize;
use thiserror::Error;

use super::{Severity, TextPosition, Violation, ViolationKind, closest_match, suggestion};
use crate::scene::convert::{self, ConvertError};
use crate::scene::value::ValueKind;

/// Tekst van het gebundelde schema.
pub const BUNDLED: &str = include_str!("../../schema/scene-markup.xml");

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema is geen geldige XML: {0}")]
    Xml(#[from] quick_xml::DeError),
    #[error("element `{element}` verwijst naar onbekende attribuutgroep `{group}`")]
    UnknownGroup { element: String, group: String },
    #[error("attribuut `{attribute}` van `{element}`: {source}")]
    Type {
        element: String,
        attribute: String,
        #[source]
        source: ConvertError,
    },
    #[error("element `{0}` is dubbel gedeclareerd")]
    DuplicateElement(String),
    #[error("standaardwaarde `{value}` van `{element}.{attribute}` past niet bij het type")]
    Default {
        element: String,
        attribute: String,
        value: String,
    },
}

/// Type van een schema-attribuut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeType {
    Value(ValueKind),
    /// Enumeratie met de toegestane namen.
    Enum(Vec<String>),
}

impl AttributeType {
    fn from_decl(type_name: &str, values: Option<&str>) -> Result<Self, ConvertError> {
        if type_name == "enum" {
            let values = values.unwrap_or_default();
            return Ok(Self::Enum(values.split_whitespace().map(str::to_owned).collect()));
        }
        ValueKind::from_type_name(type_name).map(Self::Value)
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Value(kind) => kind.type_name(),
            Self::Enum(_) => "enum",
        }
    }

    /// Of een property van soort `kind` dit schematype kan dragen.
    #[must_use]
    pub fn accepts(&self, kind: ValueKind) -> bool {
        match (self, kind) {
            (Self::Enum(values), ValueKind::Enum(names)) => {
                values.len() == names.len()
                    && values
                        .iter()
                        .zip(names)
                        .all(|(value, name)| value.eq_ignore_ascii_case(name))
            }
            (Self::Value(expected), other) => *expected == other,
            _ => false,
        }
    }

    /// Controleer een tekstwaarde tegen dit type.
    pub fn check(&self, input: &str) -> Result<(), ConvertError> {
        match self {
            Self::Value(kind) => convert::parse(*kind, input).map(|_| ()),
            Self::Enum(values) => {
                let trimmed = input.trim();
                if values.iter().any(|value| value.eq_ignore_ascii_case(trimmed)) {
                    Ok(())
                } else {
                    Err(ConvertError::Invalid {
                        kind: "enum",
                        input: input.to_owned(),
                    })
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSchema {
    pub name: String,
    pub ty: AttributeType,
    pub default: Option<String>,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSchema {
    pub tag: String,
    /// Attributen in schemavolgorde: groepen eerst.
    pub attributes: Vec<AttributeSchema>,
    /// Property die als tekstinhoud geschreven wordt.
    pub content: Option<String>,
}

impl ElementSchema {
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    /// Gedeclareerd attribuut dat het meest op `name` lijkt.
    #[must_use]
    pub fn suggest(&self, name: &str) -> Option<&str> {
        closest_match(name, self.attributes.iter().map(|attr| attr.name.as_str()))
    }

    /// De validatiewandeling die lezen en schrijven delen. Geeft de indices
    /// van de attributen die gedeclareerd zijn en een geldige waarde hebben.
    pub fn check(
        &self,
        attributes: &[(String, String)],
        severity: Severity,
        position: Option<TextPosition>,
        violations: &mut Vec<Violation>,
    ) -> Vec<usize> {
        let mut accepted = Vec::with_capacity(attributes.len());

        for (index, (name, value)) in attributes.iter().enumerate() {
            let Some(decl) = self.attribute(name) else {
                violations.push(
                    Violation::new(
                        severity,
                        ViolationKind::UnknownAttribute,
                        &self.tag,
                        format!(
                            "attribuut `{name}` is niet gedeclareerd{}",
                            suggestion(self.suggest(name))
                        ),
                    )
                    .with_attribute(name)
                    .at(position),
                );
                continue;
            };

            if let Err(err) = decl.ty.check(value) {
                violations.push(
                    Violation::new(severity, ViolationKind::InvalidValue, &self.tag, err.to_string())
                        .with_attribute(name)
                        .at(position),
                );
                continue;
            }
            accepted.push(index);
        }

        for decl in self.attributes.iter().filter(|decl| decl.required) {
            if !attributes.iter().any(|(name, _)| *name == decl.name) {
                violations.push(
                    Violation::new(
                        severity,
                        ViolationKind::MissingRequired,
                        &self.tag,
                        format!("verplicht attribuut `{}` ontbreekt", decl.name),
                    )
                    .with_attribute(&decl.name)
                    .at(position),
                );
            }
        }

        accepted
    }
}

/// Ingelezen schema.
#[derive(Debug, Clone)]
pub struct Schema {
    namespace: String,
    elements: Vec<ElementSchema>,
    by_tag: HashMap<String, usize>,
}

impl Schema {
    /// Laad het meegeleverde schema.
    pub fn bundled() -> Result<Self, SchemaError> {
        Self::from_xml(BUNDLED)
    }

    /// Laad een schema uit XML-tekst.
    pub fn from_xml(input: &str) -> Result<Self, SchemaError> {
        let doc: SchemaDoc = from_str(input)?;

        let groups: HashMap<&str, &[AttributeDoc]> = doc
            .groups
            .iter()
            .map(|group| (group.name.as_str(), group.attributes.as_slice()))
            .collect();

        let mut elements = Vec::with_capacity(doc.elements.len());
        let mut by_tag = HashMap::with_capacity(doc.elements.len());

        for element in &doc.elements {
            let mut attributes = Vec::new();
            for group in element.groups.split_whitespace() {
                let decls = groups.get(group).ok_or_else(|| SchemaError::UnknownGroup {
                    element: element.name.clone(),
                    group: group.to_owned(),
                })?;
                for decl in *decls {
                    attributes.push(decl.build(&element.name)?);
                }
            }
            for decl in &element.attributes {
                attributes.push(decl.build(&element.name)?);
            }

            if by_tag.insert(element.name.clone(), elements.len()).is_some() {
                return Err(SchemaError::DuplicateElement(element.name.clone()));
            }
            elements.push(ElementSchema {
                tag: element.name.clone(),
                attributes,
                content: element.content.as_ref().map(|content| content.property.clone()),
            });
        }

        log::debug!(
            "schema `{}` geladen met {} elementen",
            doc.namespace,
            elements.len()
        );

        Ok(Self {
            namespace: doc.namespace,
            elements,
            by_tag,
        })
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn element(&self, tag: &str) -> Option<&ElementSchema> {
        self.by_tag.get(tag).and_then(|idx| self.elements.get(*idx))
    }

    pub fn elements(&self) -> impl Iterator<Item = &ElementSchema> {
        self.elements.iter()
    }
}

#[derive(Debug, Deserialize)]
struct SchemaDoc {
    #[serde(rename = "@namespace")]
    namespace: String,
    #[serde(default, rename = "attributeGroup")]
    groups: Vec<GroupDoc>,
    #[serde(default, rename = "element")]
    elements: Vec<ElementDoc>,
}

#[derive(Debug, Deserialize)]
struct GroupDoc {
    #[serde(rename = "@name")]
    name: String,
    #[serde(default, rename = "attribute")]
    attributes: Vec<AttributeDoc>,
}

#[derive(Debug, Deserialize)]
struct ElementDoc {
    #[serde(rename = "@name")]
    name: String,
    #[serde(default, rename = "@groups")]
    groups: String,
    #[serde(default, rename = "attribute")]
    attributes: Vec<AttributeDoc>,
    #[serde(default)]
    content: Option<ContentDoc>,
}

#[derive(Debug, Deserialize)]
struct AttributeDoc {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@type")]
    type_name: String,
    #[serde(default, rename = "@values")]
    values: Option<String>,
    #[serde(default, rename = "@default")]
    default: Option<String>,
    #[serde(default, rename = "@use")]
    usage: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentDoc {
    #[serde(rename = "@property")]
    property: String,
}

impl AttributeDoc {
    fn build(&self, element: &str) -> Result<AttributeSchema, SchemaError> {
        let ty = AttributeType::from_decl(&self.type_name, self.values.as_deref()).map_err(
            |source| SchemaError::Type {
                element: element.to_owned(),
                attribute: self.name.clone(),
                source,
            },
        )?;

        if let Some(default) = &self.default {
            if ty.check(default).is_err() {
                return Err(SchemaError::Default {
                    element: element.to_owned(),
                    attribute: self.name.clone(),
                    value: default.clone(),
                });
            }
        }

        Ok(AttributeSchema {
            name: self.name.clone(),
            ty,
            default: self.default.clone(),
            required: self.usage.as_deref() == Some("required"),
        })
    }
}
