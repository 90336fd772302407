//! Element factory en de accessortabellen per elementsoort.

use std::collections::HashMap;

use crate::scene::element::{Element, ElementTag};
use crate::scene::id::IdGenerator;

pub mod properties;

pub use properties::Property;

/// Factory die markup-tags naar elementsoorten vertaalt.
///
/// Standaard zijn alle canonieke tags en de typenamen geregistreerd. Extra
/// tags kunnen aan een bestaande soort gekoppeld worden.
#[derive(Debug, Clone)]
pub struct ElementFactory {
    by_tag: HashMap<String, ElementTag>,
}

impl Default for ElementFactory {
    fn default() -> Self {
        let mut factory = Self::new();
        for tag in ElementTag::ALL {
            factory.register(tag.tag_name(), *tag);
            factory.register(tag.type_name(), *tag);
        }
        factory
    }
}

impl ElementFactory {
    /// Lege factory zonder registraties.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_tag: HashMap::new(),
        }
    }

    pub fn register(&mut self, tag: impl Into<String>, kind: ElementTag) {
        self.by_tag.insert(tag.into(), kind);
    }

    #[must_use]
    pub fn resolve(&self, tag: &str) -> Option<ElementTag> {
        self.by_tag.get(tag).copied()
    }

    /// Geregistreerde tag die het meest op `tag` lijkt.
    #[must_use]
    pub fn suggest(&self, tag: &str) -> Option<&str> {
        crate::parse::closest_match(tag, self.by_tag.keys().map(String::as_str))
    }

    /// Nieuw element voor `tag`, of `None` bij een onbekende tag.
    #[must_use]
    pub fn create(&self, tag: &str, ids: &IdGenerator) -> Option<Element> {
        self.resolve(tag).map(|kind| Element::new(kind, ids))
    }
}
