//! Waardetypes die als attribuutwaarde in de scene-markup voorkomen.

use core::fmt;

use time::PrimitiveDateTime;
use url::Url;

use crate::geom::Vec3;

/// Beschikbare waardetypes. De tabel is gesloten: een nieuw attribuuttype
/// betekent een nieuwe variant hier én in [`crate::scene::convert`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Geen waarde, bijvoorbeeld een onleesbare URI of een niet gezette optie.
    Absent,
    /// Vrije tekst.
    Text(String),
    /// Lijst van tekstwaarden.
    TextList(Vec<String>),
    /// Een 3D-vector.
    Vector(Vec3),
    /// Een RGB-kleur.
    Color(Color),
    /// Een booleaanse waarde.
    Boolean(bool),
    /// Een geheel getal.
    Integer(i64),
    /// Een enkele numerieke waarde.
    Float(f32),
    /// Canonieke naam van een enumeratievariant.
    Enum(&'static str),
    /// Een (mogelijk relatieve) URI.
    Uri(Uri),
    /// Tijdstip zonder tijdzone.
    Timestamp(PrimitiveDateTime),
}

impl Value {
    /// Geeft terug of de canonieke tekstvorm leeg is.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Absent => true,
            Self::Text(text) => text.is_empty(),
            Self::TextList(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Naam van de variant, voor meldingen.
    #[must_use]
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::Absent => "Absent",
            Self::Text(_) => "Text",
            Self::TextList(_) => "TextList",
            Self::Vector(_) => "Vector",
            Self::Color(_) => "Color",
            Self::Boolean(_) => "Boolean",
            Self::Integer(_) => "Integer",
            Self::Float(_) => "Float",
            Self::Enum(_) => "Enum",
            Self::Uri(_) => "Uri",
            Self::Timestamp(_) => "Timestamp",
        }
    }
}

/// Beschrijft het soort attribuutwaarde en dus de conversieregels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    StringList,
    Vector3,
    Color,
    Boolean,
    Integer,
    Float,
    /// Enumeratie met de toegestane canonieke namen.
    Enum(&'static [&'static str]),
    Uri,
    Timestamp,
}

impl ValueKind {
    /// Naam van het type zoals het schema het gebruikt.
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::StringList => "stringList",
            Self::Vector3 => "vector3",
            Self::Color => "color",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Enum(_) => "enum",
            Self::Uri => "uri",
            Self::Timestamp => "dateTime",
        }
    }

    /// Zoekt het type op naam. Enumeraties hebben een variantentabel nodig en
    /// zijn daarom alleen via de accessortabellen bereikbaar.
    pub fn from_type_name(name: &str) -> Result<Self, super::convert::ConvertError> {
        let kind = match name {
            "string" => Self::String,
            "stringList" => Self::StringList,
            "vector3" => Self::Vector3,
            "color" => Self::Color,
            "boolean" => Self::Boolean,
            "integer" => Self::Integer,
            "float" => Self::Float,
            "uri" => Self::Uri,
            "dateTime" => Self::Timestamp,
            other => return Err(super::convert::ConvertError::Unsupported(other.to_owned())),
        };
        Ok(kind)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// RGB-kleur met componenten in het bereik 0..=1.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);

    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    #[must_use]
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
        )
    }

    /// Componenten afgerond naar 0..=255.
    #[must_use]
    pub fn to_rgb8(self) -> [u8; 3] {
        [channel_to_u8(self.r), channel_to_u8(self.g), channel_to_u8(self.b)]
    }

    /// Hexadecimale vorm `#RRGGBB`.
    #[must_use]
    pub fn to_hex(self) -> String {
        let [r, g, b] = self.to_rgb8();
        format!("#{r:02X}{g:02X}{b:02X}")
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn channel_to_u8(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Een URI zoals die in de markup stond. Relatieve verwijzingen blijven
/// relatief; ze worden pas door de resource-laag tegen een basis opgelost.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uri(String);

impl Uri {
    /// Best-effort parse; `None` bij een syntactisch ongeldige URI.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }
        match Url::parse(trimmed) {
            Ok(_) => Some(Self(trimmed.to_owned())),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = Url::parse("file:///").ok()?;
                base.join(trimmed).ok().map(|_| Self(trimmed.to_owned()))
            }
            Err(err) => {
                log::debug!("URI `{trimmed}` genegeerd: {err}");
                None
            }
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_absolute(&self) -> bool {
        Url::parse(&self.0).is_ok()
    }

    /// Lost de URI op tegen `base`.
    pub fn resolve(&self, base: &Url) -> Result<Url, url::ParseError> {
        base.join(&self.0)
    }

    /// Extensie van het laatste padsegment, zonder punt.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        let path = self.0.split(['?', '#']).next()?;
        let file = path.rsplit('/').next()?;
        let (stem, ext) = file.rsplit_once('.')?;
        (!stem.is_empty() && !ext.is_empty()).then_some(ext)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
