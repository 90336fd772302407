//! Statische accessortabellen: per attribuutnaam een getypeerde getter en
//! setter. De serializer zoekt hier de property bij een schema-attribuut.

use crate::scene::element::{
    Axis, CameraData, Element, ElementTag, IncludeData, LightData, LightType, MaterialData,
    ModelData, PrimitiveData, ScaleData, SceneData, ScriptData, Shape, StackData, TextData,
    TextureData, WidgetData,
};
use crate::scene::value::{Value, ValueKind};

/// Eén attribuut van een elementsoort.
#[derive(Debug, Clone, Copy)]
pub struct Property {
    pub name: &'static str,
    pub kind: ValueKind,
    pub get: fn(&Element) -> Value,
    /// Geeft `false` als de waarde niet bij de property past.
    pub set: fn(&mut Element, Value) -> bool,
}

impl Property {
    #[must_use]
    pub fn get(&self, element: &Element) -> Value {
        (self.get)(element)
    }

    pub fn set(&self, element: &mut Element, value: Value) -> bool {
        (self.set)(element, value)
    }
}

macro_rules! field {
    (copy $data:ty, $field:ident, $name:literal, $kind:expr, $variant:ident) => {
        Property {
            name: $name,
            kind: $kind,
            get: |e| e.data::<$data>().map_or(Value::Absent, |d| Value::$variant(d.$field)),
            set: |e, v| match (e.data_mut::<$data>(), v) {
                (Some(d), Value::$variant(x)) => {
                    d.$field = x;
                    true
                }
                _ => false,
            },
        }
    };
    (clone $data:ty, $field:ident, $name:literal, $kind:expr, $variant:ident) => {
        Property {
            name: $name,
            kind: $kind,
            get: |e| {
                e.data::<$data>()
                    .map_or(Value::Absent, |d| Value::$variant(d.$field.clone()))
            },
            set: |e, v| match (e.data_mut::<$data>(), v) {
                (Some(d), Value::$variant(x)) => {
                    d.$field = x;
                    true
                }
                _ => false,
            },
        }
    };
    (enum $data:ty, $field:ident, $name:literal, $enum:ident) => {
        Property {
            name: $name,
            kind: ValueKind::Enum($enum::NAMES),
            get: |e| e.data::<$data>().map_or(Value::Absent, |d| Value::Enum(d.$field.name())),
            set: |e, v| match (e.data_mut::<$data>(), v) {
                (Some(d), Value::Enum(name)) => match $enum::from_name(name) {
                    Some(parsed) => {
                        d.$field = parsed;
                        true
                    }
                    None => false,
                },
                _ => false,
            },
        }
    };
    (uri $data:ty, $name:literal) => {
        Property {
            name: $name,
            kind: ValueKind::Uri,
            get: |e| {
                e.data::<$data>()
                    .and_then(|d| d.src.clone())
                    .map_or(Value::Absent, Value::Uri)
            },
            set: |e, v| match (e.data_mut::<$data>(), v) {
                (Some(d), Value::Uri(uri)) => {
                    d.src = Some(uri);
                    true
                }
                (Some(d), Value::Absent) => {
                    d.src = None;
                    true
                }
                _ => false,
            },
        }
    };
}

/// Attributen die elk element heeft.
pub const ELEMENT: &[Property] = &[
    Property {
        name: "name",
        kind: ValueKind::String,
        get: |e| Value::Text(e.name().to_owned()),
        set: |e, v| match v {
            Value::Text(name) => {
                e.set_name_unchecked(name);
                true
            }
            _ => false,
        },
    },
    Property {
        name: "context",
        kind: ValueKind::String,
        get: |e| Value::Text(e.context.clone()),
        set: |e, v| match v {
            Value::Text(context) => {
                e.context = context;
                true
            }
            _ => false,
        },
    },
    Property {
        name: "behaviours",
        kind: ValueKind::StringList,
        get: |e| Value::TextList(e.behaviours.clone()),
        set: |e, v| match v {
            Value::TextList(items) => {
                e.behaviours = items;
                true
            }
            _ => false,
        },
    },
];

pub const POSITIONAL: &[Property] = &[
    Property {
        name: "position",
        kind: ValueKind::Vector3,
        get: |e| e.positional().map_or(Value::Absent, |p| Value::Vector(p.position)),
        set: |e, v| match (e.positional_mut(), v) {
            (Some(p), Value::Vector(position)) => {
                p.position = position;
                true
            }
            _ => false,
        },
    },
    Property {
        name: "rotation",
        kind: ValueKind::Vector3,
        get: |e| e.positional().map_or(Value::Absent, |p| Value::Vector(p.rotation)),
        set: |e, v| match (e.positional_mut(), v) {
            (Some(p), Value::Vector(rotation)) => {
                p.rotation = rotation;
                true
            }
            _ => false,
        },
    },
];

pub const VISIBLE: &[Property] = &[Property {
    name: "visible",
    kind: ValueKind::Boolean,
    get: |e| e.visibility().map_or(Value::Absent, |v| Value::Boolean(v.visible)),
    set: |e, v| match (e.visibility_mut(), v) {
        (Some(visibility), Value::Boolean(visible)) => {
            visibility.visible = visible;
            true
        }
        _ => false,
    },
}];

pub const CUBIC: &[Property] = &[Property {
    name: "size",
    kind: ValueKind::Vector3,
    get: |e| e.extent().map_or(Value::Absent, |x| Value::Vector(x.size())),
    set: |e, v| match (e.extent_mut(), v) {
        (Some(extent), Value::Vector(size)) => {
            extent.set_size(size);
            true
        }
        _ => false,
    },
}];

const SCENE: &[Property] = &[
    field!(copy SceneData, speed, "speed", ValueKind::Float, Float),
    field!(copy SceneData, background, "background", ValueKind::Color, Color),
    Property {
        name: "created",
        kind: ValueKind::Timestamp,
        get: |e| {
            e.data::<SceneData>()
                .and_then(|d| d.created)
                .map_or(Value::Absent, Value::Timestamp)
        },
        set: |e, v| match (e.data_mut::<SceneData>(), v) {
            (Some(d), Value::Timestamp(created)) => {
                d.created = Some(created);
                true
            }
            _ => false,
        },
    },
    field!(clone SceneData, author, "author", ValueKind::String, Text),
];

const SCALE: &[Property] = &[field!(copy ScaleData, scale, "scale", ValueKind::Vector3, Vector)];

const CAMERA: &[Property] = &[
    field!(copy CameraData, field_of_view, "fieldOfView", ValueKind::Float, Float),
    field!(copy CameraData, near, "near", ValueKind::Float, Float),
    field!(copy CameraData, far, "far", ValueKind::Float, Float),
    field!(copy CameraData, active, "active", ValueKind::Boolean, Boolean),
];

const LIGHT: &[Property] = &[
    field!(enum LightData, light_type, "lightType", LightType),
    field!(copy LightData, color, "color", ValueKind::Color, Color),
    field!(copy LightData, intensity, "intensity", ValueKind::Float, Float),
    field!(copy LightData, range, "range", ValueKind::Float, Float),
];

const PRIMITIVE: &[Property] = &[
    field!(enum PrimitiveData, shape, "shape", Shape),
    field!(copy PrimitiveData, color, "color", ValueKind::Color, Color),
];

const MODEL: &[Property] = &[field!(uri ModelData, "src")];

const STACK: &[Property] = &[
    field!(enum StackData, axis, "axis", Axis),
    field!(copy StackData, spacing, "spacing", ValueKind::Float, Float),
    field!(copy StackData, columns, "columns", ValueKind::Integer, Integer),
];

const INCLUDE: &[Property] = &[field!(uri IncludeData, "src")];

const SCRIPT: &[Property] = &[
    field!(clone ScriptData, language, "language", ValueKind::String, Text),
    field!(clone ScriptData, source, "source", ValueKind::String, Text),
];

const TEXT: &[Property] = &[
    field!(clone TextData, text, "text", ValueKind::String, Text),
    field!(copy TextData, font_size, "fontSize", ValueKind::Float, Float),
    field!(copy TextData, color, "color", ValueKind::Color, Color),
];

const WIDGET: &[Property] = &[field!(uri WidgetData, "src")];

const MATERIAL: &[Property] = &[
    field!(copy MaterialData, color, "color", ValueKind::Color, Color),
    field!(copy MaterialData, metallic, "metallic", ValueKind::Float, Float),
    field!(copy MaterialData, roughness, "roughness", ValueKind::Float, Float),
];

const TEXTURE: &[Property] = &[
    field!(uri TextureData, "src"),
    field!(copy TextureData, tiling, "tiling", ValueKind::Vector3, Vector),
];

/// Soortspecifieke attributen, zonder de gedeelde groepen.
#[must_use]
pub fn kind_properties(tag: ElementTag) -> &'static [Property] {
    match tag {
        ElementTag::Scene => SCENE,
        ElementTag::Scale => SCALE,
        ElementTag::Camera => CAMERA,
        ElementTag::Light => LIGHT,
        ElementTag::Primitive => PRIMITIVE,
        ElementTag::Model => MODEL,
        ElementTag::Stack => STACK,
        ElementTag::Include => INCLUDE,
        ElementTag::Script => SCRIPT,
        ElementTag::Text => TEXT,
        ElementTag::Widget => WIDGET,
        ElementTag::Material => MATERIAL,
        ElementTag::Texture => TEXTURE,
        ElementTag::Group | ElementTag::MaterialGroup => &[],
    }
}

/// Alle properties van een soort: gedeelde groepen eerst.
pub fn properties(tag: ElementTag) -> impl Iterator<Item = &'static Property> {
    let caps = tag.capabilities();
    let positional: &'static [Property] = if caps.positional { POSITIONAL } else { &[] };
    let visible: &'static [Property] = if caps.visible { VISIBLE } else { &[] };
    let cubic: &'static [Property] = if caps.cubic { CUBIC } else { &[] };

    ELEMENT
        .iter()
        .chain(positional)
        .chain(visible)
        .chain(cubic)
        .chain(kind_properties(tag))
}

#[must_use]
pub fn find(tag: ElementTag, name: &str) -> Option<&'static Property> {
    properties(tag).find(|property| property.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Vec3;
    use crate::scene::id::IdGenerator;
    use crate::scene::value::{Color, Uri};

    #[test]
    fn properties_follow_capabilities() {
        assert!(find(ElementTag::Primitive, "size").is_some());
        assert!(find(ElementTag::Camera, "size").is_none());
        assert!(find(ElementTag::Material, "position").is_none());
        assert!(find(ElementTag::Material, "name").is_some());
    }

    #[test]
    fn names_are_unique_per_kind() {
        for tag in ElementTag::ALL {
            let mut names: Vec<_> = properties(*tag).map(|p| p.name).collect();
            let total = names.len();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), total, "dubbele property bij {tag:?}");
        }
    }

    #[test]
    fn getters_and_setters_round_trip() {
        let ids = IdGenerator::isolated();
        let mut light = Element::new(ElementTag::Light, &ids);

        let color = find(ElementTag::Light, "color").unwrap();
        assert!(color.set(&mut light, Value::Color(Color::new(1.0, 0.0, 0.0))));
        assert_eq!(color.get(&light), Value::Color(Color::new(1.0, 0.0, 0.0)));

        let light_type = find(ElementTag::Light, "lightType").unwrap();
        assert!(light_type.set(&mut light, Value::Enum("Spot")));
        assert_eq!(light.data::<LightData>().unwrap().light_type, LightType::Spot);
        assert!(!light_type.set(&mut light, Value::Enum("Laser")));

        let position = find(ElementTag::Light, "position").unwrap();
        assert!(position.set(&mut light, Value::Vector(Vec3::ONE)));
        assert!(!position.set(&mut light, Value::Float(1.0)));
    }

    #[test]
    fn uri_property_accepts_absent() {
        let ids = IdGenerator::isolated();
        let mut model = Element::new(ElementTag::Model, &ids);
        let src = find(ElementTag::Model, "src").unwrap();

        assert!(src.set(&mut model, Value::Uri(Uri::parse("a.glb").unwrap())));
        assert!(model.source_uri().is_some());
        assert!(src.set(&mut model, Value::Absent));
        assert_eq!(src.get(&model), Value::Absent);
    }
}
