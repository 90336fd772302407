//! Naam/ID-registry per scope.

use std::collections::HashMap;

use wildmatch::WildMatch;

use super::id::ElementId;

/// Bijectie tussen namen en IDs binnen één scope.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    by_name: HashMap<String, ElementId>,
    by_id: HashMap<ElementId, String>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registreer `id` onder `requested` of, bij een conflict, onder de eerste
    /// vrije naam `requested1`, `requested2`, … Geeft de definitieve naam
    /// terug. Een al geregistreerd ID blijft ongewijzigd.
    pub fn add(&mut self, id: ElementId, requested: &str) -> String {
        if let Some(existing) = self.by_id.get(&id) {
            return existing.clone();
        }

        let name = self.unique_name(requested);
        if name != requested {
            log::trace!("naam `{requested}` bezet, {id} wordt `{name}`");
        }
        self.by_name.insert(name.clone(), id);
        self.by_id.insert(id, name.clone());
        name
    }

    /// Verwijder `id`. Gebruikt de geregistreerde naam, niet de naam die het
    /// element op dit moment draagt.
    pub fn remove(&mut self, id: ElementId) -> Option<String> {
        let name = self.by_id.remove(&id)?;
        self.by_name.remove(&name);
        Some(name)
    }

    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    #[must_use]
    pub fn contains_id(&self, id: ElementId) -> bool {
        self.by_id.contains_key(&id)
    }

    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<ElementId> {
        self.by_name.get(name).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ElementId)> {
        self.by_name.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// Geregistreerde namen die op het patroon passen (`*` en `?`), op naam
    /// gesorteerd.
    #[must_use]
    pub fn matching(&self, pattern: &str) -> Vec<(&str, ElementId)> {
        let wm = WildMatch::new(pattern);
        let mut found: Vec<_> = self.iter().filter(|(name, _)| wm.matches(name)).collect();
        found.sort_unstable_by(|a, b| a.0.cmp(b.0));
        found
    }

    fn unique_name(&self, requested: &str) -> String {
        if !self.by_name.contains_key(requested) {
            return requested.to_owned();
        }
        (1_u64..)
            .map(|suffix| format!("{requested}{suffix}"))
            .find(|candidate| !self.by_name.contains_key(candidate))
            .unwrap_or_else(|| requested.to_owned())
    }
}
