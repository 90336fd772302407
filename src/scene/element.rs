//! Het elementrecord en de gesloten set elementsoorten.
//!
//! Elk element is één [`Element`] met soortspecifieke data in
//! [`ElementKind`] en optionele capability-componenten. Welke componenten een
//! soort draagt volgt uit [`ElementTag::capabilities`].

use time::PrimitiveDateTime;

use crate::geom::Vec3;

use super::id::{ElementId, IdGenerator};
use super::spatial::{Extent, Positional, Visibility};
use super::value::{Color, Uri};

/// Typenamen die in de markup onder een andere tag verschijnen.
pub const TAG_RENAMES: &[(&str, &str)] = &[("SceneDocument", "Scene"), ("WidgetReference", "Widget")];

macro_rules! markup_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? } default $default:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Canonieke namen in declaratievolgorde.
            pub const NAMES: &'static [&'static str] = &[$(stringify!($variant)),+];

            #[must_use]
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),+
                }
            }

            /// Hoofdletterongevoelige lookup.
            #[must_use]
            pub fn from_name(name: &str) -> Option<Self> {
                $(
                    if name.eq_ignore_ascii_case(stringify!($variant)) {
                        return Some(Self::$variant);
                    }
                )+
                None
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }
    };
}

markup_enum! {
    /// Soort lichtbron.
    LightType { Point, Directional, Spot } default Point
}

markup_enum! {
    /// Vorm van een primitive.
    Shape { Box, Sphere, Cylinder, Plane, Capsule } default Box
}

markup_enum! {
    /// As waarlangs een stack zijn kinderen legt.
    Axis { X, Y, Z } default Y
}

/// Getypeerde toegang tot de data van één elementsoort.
pub trait ElementVariant: Sized {
    const TAG: ElementTag;

    fn from_kind(kind: &ElementKind) -> Option<&Self>;

    fn from_kind_mut(kind: &mut ElementKind) -> Option<&mut Self>;
}

macro_rules! element_kinds {
    ($($variant:ident($data:ident) => $type_name:literal),+ $(,)?) => {
        /// Veldloze tag per elementsoort.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ElementTag {
            $($variant),+
        }

        impl ElementTag {
            pub const ALL: &'static [ElementTag] = &[$(Self::$variant),+];

            /// Naam van het elementtype. Dit is ook de standaardnaam van een
            /// nieuw element.
            #[must_use]
            pub fn type_name(self) -> &'static str {
                match self {
                    $(Self::$variant => $type_name),+
                }
            }
        }

        /// Soortspecifieke data van een element.
        #[derive(Debug, Clone, PartialEq)]
        pub enum ElementKind {
            $($variant($data)),+
        }

        impl ElementKind {
            #[must_use]
            pub fn default_for(tag: ElementTag) -> Self {
                match tag {
                    $(ElementTag::$variant => Self::$variant($data::default())),+
                }
            }

            #[must_use]
            pub fn tag(&self) -> ElementTag {
                match self {
                    $(Self::$variant(_) => ElementTag::$variant),+
                }
            }
        }

        $(
            impl ElementVariant for $data {
                const TAG: ElementTag = ElementTag::$variant;

                fn from_kind(kind: &ElementKind) -> Option<&Self> {
                    match kind {
                        ElementKind::$variant(data) => Some(data),
                        _ => None,
                    }
                }

                fn from_kind_mut(kind: &mut ElementKind) -> Option<&mut Self> {
                    match kind {
                        ElementKind::$variant(data) => Some(data),
                        _ => None,
                    }
                }
            }
        )+
    };
}

element_kinds! {
    Scene(SceneData) => "SceneDocument",
    Group(GroupData) => "Group",
    Scale(ScaleData) => "Scale",
    Camera(CameraData) => "Camera",
    Light(LightData) => "Light",
    Primitive(PrimitiveData) => "Primitive",
    Model(ModelData) => "Model",
    Stack(StackData) => "Stack",
    Include(IncludeData) => "Include",
    Script(ScriptData) => "Script",
    Text(TextData) => "Text",
    Widget(WidgetData) => "WidgetReference",
    MaterialGroup(MaterialGroupData) => "MaterialGroup",
    Material(MaterialData) => "Material",
    Texture(TextureData) => "Texture",
}

/// Welke capability-componenten een soort draagt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub positional: bool,
    pub visible: bool,
    pub cubic: bool,
}

impl Capabilities {
    const NONE: Self = Self {
        positional: false,
        visible: false,
        cubic: false,
    };
    const SPATIAL: Self = Self {
        positional: true,
        visible: true,
        cubic: false,
    };
    const CUBIC: Self = Self {
        positional: true,
        visible: true,
        cubic: true,
    };
}

impl ElementTag {
    /// Tag in de markup. Op twee uitzonderingen na gelijk aan de typenaam.
    #[must_use]
    pub fn tag_name(self) -> &'static str {
        let type_name = self.type_name();
        TAG_RENAMES
            .iter()
            .find(|(from, _)| *from == type_name)
            .map_or(type_name, |(_, to)| to)
    }

    #[must_use]
    pub fn capabilities(self) -> Capabilities {
        match self {
            Self::Group | Self::Camera | Self::Light | Self::Include | Self::Text => {
                Capabilities::SPATIAL
            }
            Self::Scale | Self::Primitive | Self::Model | Self::Stack | Self::Widget => {
                Capabilities::CUBIC
            }
            Self::Scene | Self::Script | Self::MaterialGroup | Self::Material | Self::Texture => {
                Capabilities::NONE
            }
        }
    }

    /// Een context is een zelfstandige scope met een eigen registry.
    #[must_use]
    pub fn is_context(self) -> bool {
        matches!(self, Self::Scene)
    }

    /// Soorten die hun primaire waarde als tekstinhoud dragen.
    #[must_use]
    pub fn has_text_content(self) -> bool {
        matches!(self, Self::Script | Self::Text)
    }

    /// Soorten waarvan de grootte als schaalfactor in de matrix meetelt.
    #[must_use]
    pub fn is_resizable(self) -> bool {
        matches!(self, Self::Primitive | Self::Model | Self::Widget)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneData {
    pub speed: f32,
    pub background: Color,
    pub created: Option<PrimitiveDateTime>,
    pub author: String,
}

impl Default for SceneData {
    fn default() -> Self {
        Self {
            speed: 1.0,
            background: Color::BLACK,
            created: None,
            author: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GroupData;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleData {
    pub scale: Vec3,
}

impl Default for ScaleData {
    fn default() -> Self {
        Self { scale: Vec3::ONE }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraData {
    pub field_of_view: f32,
    pub near: f32,
    pub far: f32,
    pub active: bool,
}

impl Default for CameraData {
    fn default() -> Self {
        Self {
            field_of_view: 60.0,
            near: 0.1,
            far: 1000.0,
            active: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightData {
    pub light_type: LightType,
    pub color: Color,
    pub intensity: f32,
    pub range: f32,
}

impl Default for LightData {
    fn default() -> Self {
        Self {
            light_type: LightType::Point,
            color: Color::WHITE,
            intensity: 1.0,
            range: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimitiveData {
    pub shape: Shape,
    pub color: Color,
}

impl Default for PrimitiveData {
    fn default() -> Self {
        Self {
            shape: Shape::Box,
            color: Color::WHITE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelData {
    pub src: Option<Uri>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StackData {
    pub axis: Axis,
    pub spacing: f32,
    pub columns: i64,
}

impl Default for StackData {
    fn default() -> Self {
        Self {
            axis: Axis::Y,
            spacing: 0.0,
            columns: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct IncludeData {
    pub src: Option<Uri>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScriptData {
    pub language: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextData {
    pub text: String,
    pub font_size: f32,
    pub color: Color,
}

impl Default for TextData {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: 1.0,
            color: Color::WHITE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WidgetData {
    pub src: Option<Uri>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MaterialGroupData;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialData {
    pub color: Color,
    pub metallic: f32,
    pub roughness: f32,
}

impl Default for MaterialData {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            metallic: 0.0,
            roughness: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub src: Option<Uri>,
    pub tiling: Vec3,
}

impl Default for TextureData {
    fn default() -> Self {
        Self {
            src: None,
            tiling: Vec3::ONE,
        }
    }
}

/// Eén knoop in de elementboom.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    id: ElementId,
    name: String,
    /// Opake binding-scope.
    pub context: String,
    /// Opake tags, in volgorde.
    pub behaviours: Vec<String>,
    pub(crate) parent: Option<ElementId>,
    pub(crate) children: Vec<ElementId>,
    kind: ElementKind,
    positional: Option<Positional>,
    visibility: Option<Visibility>,
    extent: Option<Extent>,
}

impl Element {
    /// Nieuw, losstaand element met een vers ID en de typenaam als naam.
    #[must_use]
    pub fn new(tag: ElementTag, ids: &IdGenerator) -> Self {
        Self::from_kind(ElementKind::default_for(tag), ids)
    }

    #[must_use]
    pub fn from_kind(kind: ElementKind, ids: &IdGenerator) -> Self {
        let tag = kind.tag();
        let caps = tag.capabilities();
        Self {
            id: ids.next_id(),
            name: tag.type_name().to_owned(),
            context: String::new(),
            behaviours: Vec::new(),
            parent: None,
            children: Vec::new(),
            kind,
            positional: caps.positional.then(Positional::default),
            visibility: caps.visible.then(Visibility::default),
            extent: caps.cubic.then(Extent::default),
        }
    }

    /// Zet de naam van een nog losstaand element. Voor beheerde elementen
    /// loopt hernoemen via [`crate::scene::ElementTree::set_name`].
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn id(&self) -> ElementId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name_unchecked(&mut self, name: String) {
        self.name = name;
    }

    #[must_use]
    pub fn tag(&self) -> ElementTag {
        self.kind.tag()
    }

    #[must_use]
    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    /// Getypeerde data, `None` bij een andere soort.
    #[must_use]
    pub fn data<T: ElementVariant>(&self) -> Option<&T> {
        T::from_kind(&self.kind)
    }

    pub fn data_mut<T: ElementVariant>(&mut self) -> Option<&mut T> {
        T::from_kind_mut(&mut self.kind)
    }

    #[must_use]
    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    #[must_use]
    pub fn is_context(&self) -> bool {
        self.tag().is_context()
    }

    #[must_use]
    pub fn positional(&self) -> Option<&Positional> {
        self.positional.as_ref()
    }

    pub fn positional_mut(&mut self) -> Option<&mut Positional> {
        self.positional.as_mut()
    }

    #[must_use]
    pub fn visibility(&self) -> Option<&Visibility> {
        self.visibility.as_ref()
    }

    pub fn visibility_mut(&mut self) -> Option<&mut Visibility> {
        self.visibility.as_mut()
    }

    #[must_use]
    pub fn extent(&self) -> Option<&Extent> {
        self.extent.as_ref()
    }

    pub fn extent_mut(&mut self) -> Option<&mut Extent> {
        self.extent.as_mut()
    }

    /// Bron-URI van soorten die externe inhoud laden.
    #[must_use]
    pub fn source_uri(&self) -> Option<&Uri> {
        match &self.kind {
            ElementKind::Model(ModelData { src })
            | ElementKind::Include(IncludeData { src })
            | ElementKind::Widget(WidgetData { src })
            | ElementKind::Texture(TextureData { src, .. }) => src.as_ref(),
            _ => None,
        }
    }

    /// Primaire waarde van de tekstsoorten.
    #[must_use]
    pub fn text_content(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Script(data) => Some(&data.source),
            ElementKind::Text(data) => Some(&data.text),
            _ => None,
        }
    }

    /// Zet de tekstinhoud. Geeft `false` voor soorten zonder tekstinhoud.
    pub fn set_text_content(&mut self, text: impl Into<String>) -> bool {
        match &mut self.kind {
            ElementKind::Script(data) => data.source = text.into(),
            ElementKind::Text(data) => data.text = text.into(),
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_element_uses_type_name_and_capabilities() {
        let ids = IdGenerator::isolated();
        let widget = Element::new(ElementTag::Widget, &ids);
        assert_eq!(widget.name(), "WidgetReference");
        assert_eq!(widget.tag().tag_name(), "Widget");
        assert!(widget.positional().is_some());
        assert!(widget.extent().is_some());

        let material = Element::new(ElementTag::Material, &ids);
        assert!(material.positional().is_none());
        assert!(material.visibility().is_none());
        assert_ne!(widget.id(), material.id());
    }

    #[test]
    fn tag_renames_are_limited_to_two_types() {
        let renamed: Vec<_> = ElementTag::ALL
            .iter()
            .filter(|tag| tag.tag_name() != tag.type_name())
            .map(|tag| tag.tag_name())
            .collect();
        assert_eq!(renamed, ["Scene", "Widget"]);
    }

    #[test]
    fn typed_data_access_checks_kind() {
        let ids = IdGenerator::isolated();
        let mut camera = Element::new(ElementTag::Camera, &ids);
        assert!(camera.data::<LightData>().is_none());

        camera.data_mut::<CameraData>().unwrap().field_of_view = 75.0;
        assert_eq!(camera.data::<CameraData>().unwrap().field_of_view, 75.0);
    }

    #[test]
    fn enum_lookup_is_case_insensitive() {
        assert_eq!(Shape::from_name("sphere"), Some(Shape::Sphere));
        assert_eq!(LightType::from_name("SPOT"), Some(LightType::Spot));
        assert_eq!(Axis::from_name("w"), None);
        assert_eq!(Axis::default().name(), "Y");
    }

    #[test]
    fn source_uri_and_text_content() {
        let ids = IdGenerator::isolated();
        let mut model = Element::new(ElementTag::Model, &ids);
        model.data_mut::<ModelData>().unwrap().src = Uri::parse("chair.glb");
        assert_eq!(model.source_uri().map(Uri::as_str), Some("chair.glb"));
        assert!(!model.set_text_content("nope"));

        let mut script = Element::new(ElementTag::Script, &ids);
        assert!(script.set_text_content("run()"));
        assert_eq!(script.text_content(), Some("run()"));
        assert!(script.source_uri().is_none());
    }
}
