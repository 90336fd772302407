//! Elementboom met registry-scopes en ruimtelijke samenstelling.
//!
//! Elementen leven in een arena, geadresseerd met [`ElementId`]. De lijst met
//! kinderen is de enige bezittende relatie; `parent` is een terugverwijzing.

use std::collections::HashMap;
use std::fmt;

pub mod convert;
pub mod element;
pub mod id;
pub mod registry;
pub mod spatial;
pub mod value;

use element::{Element, ElementTag, ElementVariant};
use id::{ElementId, IdGenerator};
use registry::Registry;

/// Arena van elementen plus één registry per scope.
#[derive(Debug, Clone, Default)]
pub struct ElementTree {
    elements: HashMap<ElementId, Element>,
    registries: HashMap<ElementId, Registry>,
    ids: IdGenerator,
}

impl ElementTree {
    #[must_use]
    pub fn new(ids: IdGenerator) -> Self {
        Self {
            elements: HashMap::new(),
            registries: HashMap::new(),
            ids,
        }
    }

    #[must_use]
    pub fn ids(&self) -> &IdGenerator {
        &self.ids
    }

    /// Maak een los element van de gegeven soort aan.
    pub fn create(&mut self, tag: ElementTag) -> ElementId {
        let element = Element::new(tag, &self.ids);
        let id = element.id();
        self.elements.insert(id, element);
        id
    }

    /// Neem een los element op in de arena.
    pub fn insert(&mut self, element: Element) -> Result<ElementId, TreeError> {
        let id = element.id();
        if self.elements.contains_key(&id) {
            return Err(TreeError::DuplicateElement(id));
        }
        if element.parent.is_some() || !element.children.is_empty() {
            return Err(TreeError::AlreadyAttached {
                child: id,
                parent: element.parent,
            });
        }
        self.elements.insert(id, element);
        Ok(id)
    }

    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Voorouders van `id`, van de ouder naar de wortel.
    pub fn ancestors(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        std::iter::successors(self.parent_of(id), move |current| self.parent_of(*current))
    }

    /// Alle nakomelingen in diepte-eerst preorder.
    #[must_use]
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self.children_of(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children_of(current).iter().rev().copied());
        }
        out
    }

    #[must_use]
    pub fn parent_of(&self, id: ElementId) -> Option<ElementId> {
        self.elements.get(&id).and_then(|element| element.parent)
    }

    #[must_use]
    pub fn children_of(&self, id: ElementId) -> &[ElementId] {
        self.elements
            .get(&id)
            .map_or(&[], |element| element.children.as_slice())
    }

    /// Dichtstbijzijnde context, `id` zelf inbegrepen. Zonder context is de
    /// wortel van de deelboom de scope.
    #[must_use]
    pub fn scope_of(&self, id: ElementId) -> ElementId {
        let mut current = id;
        loop {
            let Some(element) = self.elements.get(&current) else {
                return current;
            };
            if element.is_context() {
                return current;
            }
            match element.parent {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }

    /// Scope waarin `id` zelf geregistreerd staat.
    fn registration_scope(&self, id: ElementId) -> Option<ElementId> {
        self.parent_of(id).map(|parent| self.scope_of(parent))
    }

    #[must_use]
    pub fn registry(&self, scope: ElementId) -> Option<&Registry> {
        self.registries.get(&scope)
    }

    /// Registry van de scope waarin lookups vanaf `from` plaatsvinden.
    #[must_use]
    pub fn registry_for(&self, from: ElementId) -> Option<&Registry> {
        self.registries.get(&self.scope_of(from))
    }

    /// Hang `child` onder `parent` en registreer de hele deelboom van `child`
    /// in de scope van `parent`.
    pub fn add(&mut self, parent: ElementId, child: ElementId) -> Result<(), TreeError> {
        self.link(parent, child)?;

        // Een eerder losgemaakte deelboom verliest zijn eigen scope.
        if !self.is_context(child) {
            self.registries.remove(&child);
        }

        let scope = self.scope_of(parent);
        self.register_subtree(scope, child);
        log::debug!(
            "{child} toegevoegd aan {parent}, scope {scope} bevat {} namen",
            self.registries.get(&scope).map_or(0, Registry::len)
        );
        Ok(())
    }

    /// Koppel zonder te registreren. De aanroeper registreert de deelboom
    /// later precies één keer.
    pub(crate) fn link(&mut self, parent: ElementId, child: ElementId) -> Result<(), TreeError> {
        if parent == child {
            return Err(TreeError::Cycle { parent, child });
        }
        if !self.elements.contains_key(&parent) {
            return Err(TreeError::UnknownElement(parent));
        }
        let Some(element) = self.elements.get(&child) else {
            return Err(TreeError::UnknownElement(child));
        };
        if let Some(existing) = element.parent {
            return Err(TreeError::AlreadyAttached {
                child,
                parent: Some(existing),
            });
        }
        if self.ancestors(parent).any(|ancestor| ancestor == child) {
            return Err(TreeError::Cycle { parent, child });
        }

        if let Some(element) = self.elements.get_mut(&child) {
            element.parent = Some(parent);
        }
        if let Some(element) = self.elements.get_mut(&parent) {
            element.children.push(child);
        }
        Ok(())
    }

    /// Registreer alle nakomelingen van een wortel in diens eigen scope.
    pub(crate) fn register_descendants(&mut self, root: ElementId) {
        let children = self.children_of(root).to_vec();
        for child in children {
            self.register_subtree(root, child);
        }
    }

    fn register_subtree(&mut self, scope: ElementId, id: ElementId) {
        self.register(scope, id);
        if self.is_context(id) {
            self.register_descendants(id);
        } else {
            let children = self.children_of(id).to_vec();
            for child in children {
                self.register_subtree(scope, child);
            }
        }
    }

    fn register(&mut self, scope: ElementId, id: ElementId) {
        let Some(element) = self.elements.get_mut(&id) else {
            return;
        };
        let registry = self.registries.entry(scope).or_default();
        let name = registry.add(id, element.name());
        element.set_name_unchecked(name);
    }

    /// Koppel `child` los van `parent` en schrap de hele deelboom uit de scope.
    /// Een deelboom zonder eigen context krijgt een eigen scope met `child`
    /// als wortel.
    pub fn remove(&mut self, parent: ElementId, child: ElementId) -> Result<(), TreeError> {
        if self.parent_of(child) != Some(parent) {
            return Err(TreeError::NotAChild { parent, child });
        }

        let scope = self.scope_of(parent);
        self.unregister_subtree(scope, child);

        if let Some(element) = self.elements.get_mut(&parent) {
            element.children.retain(|id| *id != child);
        }
        if let Some(element) = self.elements.get_mut(&child) {
            element.parent = None;
        }

        if !self.is_context(child) {
            self.register_descendants(child);
        }
        log::debug!("{child} losgemaakt van {parent}");
        Ok(())
    }

    fn unregister_subtree(&mut self, scope: ElementId, id: ElementId) {
        if let Some(registry) = self.registries.get_mut(&scope) {
            registry.remove(id);
        }
        if self.is_context(id) {
            return;
        }
        let children = self.children_of(id).to_vec();
        for child in children {
            self.unregister_subtree(scope, child);
        }
    }

    /// Maak alle directe kinderen los. Hun deelbomen worden net als bij
    /// [`Self::remove`] volledig uit de scope geschrapt.
    pub fn clear(&mut self, parent: ElementId) -> Result<(), TreeError> {
        if !self.elements.contains_key(&parent) {
            return Err(TreeError::UnknownElement(parent));
        }
        let children = self.children_of(parent).to_vec();
        for child in children {
            self.remove(parent, child)?;
        }
        Ok(())
    }

    /// Hernoem een element. Een beheerd element wordt opnieuw geregistreerd en
    /// kan daarbij een achtervoegsel krijgen. Geeft de definitieve naam terug.
    pub fn set_name(&mut self, id: ElementId, name: &str) -> Result<String, TreeError> {
        if !self.elements.contains_key(&id) {
            return Err(TreeError::UnknownElement(id));
        }

        let scope = self
            .registration_scope(id)
            .filter(|scope| self.registries.get(scope).is_some_and(|r| r.contains_id(id)));

        let final_name = match scope.and_then(|scope| self.registries.get_mut(&scope)) {
            Some(registry) => {
                registry.remove(id);
                registry.add(id, name)
            }
            None => name.to_owned(),
        };

        if let Some(element) = self.elements.get_mut(&id) {
            element.set_name_unchecked(final_name.clone());
        }
        Ok(final_name)
    }

    fn is_context(&self, id: ElementId) -> bool {
        self.elements.get(&id).is_some_and(Element::is_context)
    }

    /// Zoek op naam in de scope van `from`.
    #[must_use]
    pub fn try_get_by_name(&self, from: ElementId, name: &str) -> Option<&Element> {
        let id = self.registry_for(from)?.id_of(name)?;
        self.elements.get(&id)
    }

    /// Zoek op ID in de scope van `from`.
    #[must_use]
    pub fn try_get_by_id(&self, from: ElementId, id: ElementId) -> Option<&Element> {
        if !self.registry_for(from)?.contains_id(id) {
            return None;
        }
        self.elements.get(&id)
    }

    pub fn get_by_name(&self, from: ElementId, name: &str) -> Result<&Element, TreeError> {
        self.try_get_by_name(from, name)
            .ok_or_else(|| TreeError::ElementNotFound {
                context: self.scope_of(from),
                key: name.to_owned(),
            })
    }

    pub fn get_by_id(&self, from: ElementId, id: ElementId) -> Result<&Element, TreeError> {
        self.try_get_by_id(from, id)
            .ok_or_else(|| TreeError::ElementNotFound {
                context: self.scope_of(from),
                key: id.to_string(),
            })
    }

    /// Elementen in de scope van `from` waarvan de naam op `pattern` past.
    #[must_use]
    pub fn find_matching(&self, from: ElementId, pattern: &str) -> Vec<&Element> {
        self.registry_for(from).map_or_else(Vec::new, |registry| {
            registry
                .matching(pattern)
                .into_iter()
                .filter_map(|(_, id)| self.elements.get(&id))
                .collect()
        })
    }

    /// Getypeerde lookup. `Ok(None)` als de naam onbekend is, een fout als
    /// het element van een andere soort is.
    pub fn try_get_by_name_as<T: ElementVariant>(
        &self,
        from: ElementId,
        name: &str,
    ) -> Result<Option<&T>, TreeError> {
        self.try_get_by_name(from, name).map(typed::<T>).transpose()
    }

    pub fn try_get_by_id_as<T: ElementVariant>(
        &self,
        from: ElementId,
        id: ElementId,
    ) -> Result<Option<&T>, TreeError> {
        self.try_get_by_id(from, id).map(typed::<T>).transpose()
    }
}

fn typed<T: ElementVariant>(element: &Element) -> Result<&T, TreeError> {
    element.data::<T>().ok_or(TreeError::TypeMismatch {
        expected: T::TAG,
        found: element.tag(),
    })
}

/// Fouten bij het muteren of doorzoeken van de boom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    DuplicateElement(ElementId),
    UnknownElement(ElementId),
    AlreadyAttached {
        child: ElementId,
        parent: Option<ElementId>,
    },
    NotAChild {
        parent: ElementId,
        child: ElementId,
    },
    Cycle {
        parent: ElementId,
        child: ElementId,
    },
    ElementNotFound {
        context: ElementId,
        key: String,
    },
    TypeMismatch {
        expected: ElementTag,
        found: ElementTag,
    },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateElement(id) => write!(f, "element {id} bestaat al in de boom"),
            Self::UnknownElement(id) => write!(f, "element {id} niet gevonden in de boom"),
            Self::AlreadyAttached {
                child,
                parent: Some(parent),
            } => write!(f, "element {child} hangt al onder {parent}"),
            Self::AlreadyAttached { child, parent: None } => {
                write!(f, "element {child} heeft al kinderen")
            }
            Self::NotAChild { parent, child } => {
                write!(f, "element {child} is geen kind van {parent}")
            }
            Self::Cycle { parent, child } => {
                write!(f, "{child} onder {parent} hangen maakt een cyclus")
            }
            Self::ElementNotFound { context, key } => {
                write!(f, "element `{key}` niet gevonden in context {context}")
            }
            Self::TypeMismatch { expected, found } => write!(
                f,
                "element is een {} in plaats van een {}",
                found.type_name(),
                expected.type_name()
            ),
        }
    }
}

impl std::error::Error for TreeError {}
