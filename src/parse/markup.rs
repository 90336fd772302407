//! Schema-gestuurde serializer tussen [`ElementTree`] en scene-markup.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::io;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::ResolveResult;
use quick_xml::{NsReader, Writer};

use super::schema::{ElementSchema, Schema};
use super::{
    MarkupError, MarkupResult, Severity, TextPosition, Violation, ViolationKind, suggestion,
};
use crate::elements::{ElementFactory, properties};
use crate::scene::ElementTree;
use crate::scene::convert;
use crate::scene::element::{Element, ElementTag, ElementVariant};
use crate::scene::id::{ElementId, IdGenerator};
use crate::scene::value::Value;

cfg_if::cfg_if! {
    if #[cfg(windows)] {
        const LINE_ENDING: &str = "\r\n";
    } else {
        const LINE_ENDING: &str = "\n";
    }
}

/// Instellingen voor het schrijven.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializerOptions {
    /// Aantal spaties per niveau; 0 schrijft alles op één regel.
    pub indent: usize,
    pub xml_declaration: bool,
    /// Zet de namespace van het schema op het wortelelement.
    pub namespace: bool,
}

impl Default for SerializerOptions {
    fn default() -> Self {
        Self {
            indent: 2,
            xml_declaration: true,
            namespace: true,
        }
    }
}

/// Resultaat van [`MarkupSerializer::read`].
#[derive(Debug, Clone)]
pub struct Markup {
    pub tree: ElementTree,
    pub root: ElementId,
    pub violations: Vec<Violation>,
}

impl Markup {
    /// Het wortelelement.
    #[must_use]
    pub fn root(&self) -> Option<&Element> {
        self.tree.element(self.root)
    }

    #[must_use]
    pub fn root_data<T: ElementVariant>(&self) -> Option<&T> {
        self.root().and_then(Element::data::<T>)
    }

    /// Zoek een element op naam in de scope van de wortel.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.tree.try_get_by_name(self.root, name)
    }
}

/// Resultaat van [`MarkupSerializer::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Written {
    pub xml: String,
    pub violations: Vec<Violation>,
}

/// Leest en schrijft scene-markup tegen één geladen schema.
///
/// Houdt tijdens een aanroep de verzamelde meldingen bij en is daarom niet
/// bedoeld om tussen threads te delen.
#[derive(Debug, Clone)]
pub struct MarkupSerializer {
    schema: Schema,
    factory: ElementFactory,
    options: SerializerOptions,
    ids: IdGenerator,
    violations: Vec<Violation>,
}

impl MarkupSerializer {
    /// Serializer met het meegeleverde schema.
    pub fn new() -> MarkupResult<Self> {
        Ok(Self::from_schema(Schema::bundled()?))
    }

    /// Serializer met een eigen schemadocument.
    pub fn with_schema(schema_xml: &str) -> MarkupResult<Self> {
        Ok(Self::from_schema(Schema::from_xml(schema_xml)?))
    }

    #[must_use]
    pub fn from_schema(schema: Schema) -> Self {
        Self {
            schema,
            factory: ElementFactory::default(),
            options: SerializerOptions::default(),
            ids: IdGenerator::global(),
            violations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: SerializerOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_ids(mut self, ids: IdGenerator) -> Self {
        self.ids = ids;
        self
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub fn options(&self) -> &SerializerOptions {
        &self.options
    }

    pub fn factory_mut(&mut self) -> &mut ElementFactory {
        &mut self.factory
    }

    /// Lees een document. Alleen niet-welgevormde XML is fataal; alle andere
    /// problemen staan in [`Markup::violations`].
    pub fn read(&mut self, input: &str) -> MarkupResult<Markup> {
        self.violations.clear();
        let mut tree = ElementTree::new(self.ids.clone());

        let root = {
            let mut ctx = ReadContext {
                input,
                schema: &self.schema,
                factory: &self.factory,
                violations: &mut self.violations,
            };
            ctx.read_document(&mut tree)?
        };

        let violations = std::mem::take(&mut self.violations);
        log::debug!(
            "markup gelezen: {} elementen, {} meldingen",
            tree.len(),
            violations.len()
        );
        Ok(Markup {
            tree,
            root,
            violations,
        })
    }

    /// Lees een document waarvan de wortel van soort `T` moet zijn.
    pub fn read_as<T: ElementVariant>(&mut self, input: &str) -> MarkupResult<Markup> {
        let markup = self.read(input)?;
        match markup.root().map(Element::tag) {
            Some(tag) if tag == T::TAG => Ok(markup),
            found => Err(MarkupError::UnexpectedRoot {
                expected: T::TAG.tag_name(),
                found: found.map_or_else(String::new, |tag| tag.tag_name().to_owned()),
            }),
        }
    }

    pub fn read_path(&mut self, path: impl AsRef<Path>) -> MarkupResult<Markup> {
        let input = std::fs::read_to_string(path)?;
        self.read(&input)
    }

    /// Lees een document uit een willekeurige reader, als tegenhanger van
    /// [`Self::write_to`].
    pub fn read_from<R: io::Read>(&mut self, mut input: R) -> MarkupResult<Markup> {
        let mut text = String::new();
        input.read_to_string(&mut text)?;
        self.read(&text)
    }

    /// Schrijf `root` en zijn deelboom met attributen in schemavolgorde.
    pub fn write(&mut self, tree: &ElementTree, root: ElementId) -> MarkupResult<Written> {
        self.write_with(tree, root, None)
    }

    /// Als [`Self::write`], met attributen gesorteerd door `order`.
    pub fn write_ordered<F>(
        &mut self,
        tree: &ElementTree,
        root: ElementId,
        mut order: F,
    ) -> MarkupResult<Written>
    where
        F: FnMut(&str, &str) -> Ordering,
    {
        let order: &mut dyn FnMut(&str, &str) -> Ordering = &mut order;
        self.write_with(tree, root, Some(order))
    }

    /// Schrijf naar een willekeurige writer. Geeft de meldingen terug.
    pub fn write_to<W: io::Write>(
        &mut self,
        tree: &ElementTree,
        root: ElementId,
        mut out: W,
    ) -> MarkupResult<Vec<Violation>> {
        let written = self.write(tree, root)?;
        out.write_all(written.xml.as_bytes())?;
        Ok(written.violations)
    }

    fn write_with(
        &mut self,
        tree: &ElementTree,
        root: ElementId,
        order: Option<&mut dyn FnMut(&str, &str) -> Ordering>,
    ) -> MarkupResult<Written> {
        self.violations.clear();
        if tree.element(root).is_none() {
            return Err(crate::scene::TreeError::UnknownElement(root).into());
        }

        let mut writer = if self.options.indent == 0 {
            Writer::new(Vec::new())
        } else {
            Writer::new_with_indent(Vec::new(), b' ', self.options.indent)
        };
        if self.options.xml_declaration {
            writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        }

        {
            let mut ctx = WriteContext {
                schema: &self.schema,
                options: &self.options,
                violations: &mut self.violations,
                order,
            };
            ctx.write_element(&mut writer, tree, root, true)?;
        }

        let xml = String::from_utf8_lossy(&writer.into_inner()).into_owned();
        let violations = std::mem::take(&mut self.violations);
        log::debug!(
            "markup geschreven: {} bytes, {} meldingen",
            xml.len(),
            violations.len()
        );
        Ok(Written { xml, violations })
    }
}

fn record(violations: &mut Vec<Violation>, violation: Violation) {
    log::warn!("{violation}");
    violations.push(violation);
}

struct Frame {
    id: ElementId,
    tag: ElementTag,
    schema_tag: String,
    text: String,
}

struct ReadContext<'a> {
    input: &'a str,
    schema: &'a Schema,
    factory: &'a ElementFactory,
    violations: &'a mut Vec<Violation>,
}

impl ReadContext<'_> {
    fn malformed(&self, offset: usize, message: impl Into<String>) -> MarkupError {
        let position = TextPosition::locate(self.input, offset);
        MarkupError::Malformed {
            line: position.line,
            column: position.column,
            message: message.into(),
        }
    }

    fn read_document(&mut self, tree: &mut ElementTree) -> MarkupResult<ElementId> {
        let mut reader = NsReader::from_str(self.input);
        reader.trim_text(false);
        reader.check_end_names(true);

        let mut stack: Vec<Frame> = Vec::new();
        let mut root: Option<ElementId> = None;

        loop {
            let offset = reader.buffer_position();
            let (resolved, event) = match reader.read_resolved_event() {
                Ok(pair) => pair,
                Err(err) => return Err(self.malformed(reader.buffer_position(), err.to_string())),
            };
            let foreign = self.foreign_namespace(resolved);

            match event {
                Event::Start(start) | Event::Empty(start)
                    if stack.is_empty() && root.is_some() =>
                {
                    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                    return Err(self.malformed(offset, format!("tweede wortelelement <{name}>")));
                }
                Event::Start(start) => {
                    let position = TextPosition::locate(self.input, offset);
                    match self.open_element(tree, &start, foreign, position, stack.is_empty())? {
                        Some(frame) => stack.push(frame),
                        None => {
                            reader
                                .read_to_end(start.name())
                                .map_err(|err| self.malformed(reader.buffer_position(), err.to_string()))?;
                        }
                    }
                }
                Event::Empty(start) => {
                    let position = TextPosition::locate(self.input, offset);
                    if let Some(frame) =
                        self.open_element(tree, &start, foreign, position, stack.is_empty())?
                    {
                        self.close_element(tree, frame, &stack, &mut root)?;
                    }
                }
                Event::End(_) => {
                    let Some(frame) = stack.pop() else {
                        return Err(self.malformed(offset, "sluittag zonder open element"));
                    };
                    self.close_element(tree, frame, &stack, &mut root)?;
                }
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map_err(|err| self.malformed(offset, err.to_string()))?;
                    match stack.last_mut() {
                        Some(frame) => frame.text.push_str(&text),
                        None if !text.trim().is_empty() => {
                            return Err(self.malformed(offset, "tekst buiten het wortelelement"));
                        }
                        None => {}
                    }
                }
                Event::CData(data) => {
                    if let Some(frame) = stack.last_mut() {
                        frame.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(self.malformed(
                self.input.len(),
                format!("onverwacht einde van document, <{}> is niet gesloten", open.schema_tag),
            ));
        }

        root.ok_or_else(|| self.malformed(self.input.len(), "document bevat geen wortelelement"))
    }

    /// Namespace van een tag als die niet die van het schema is. Ongebonden
    /// tags horen bij het schema; een onbekend prefix telt als vreemd.
    fn foreign_namespace(&self, resolved: ResolveResult<'_>) -> Option<String> {
        match resolved {
            ResolveResult::Bound(ns) if ns.as_ref() != self.schema.namespace().as_bytes() => {
                Some(String::from_utf8_lossy(ns.as_ref()).into_owned())
            }
            ResolveResult::Unknown(prefix) => Some(format!(
                "niet-gedeclareerd prefix `{}`",
                String::from_utf8_lossy(&prefix)
            )),
            _ => None,
        }
    }

    /// Maak het element voor een open-tag aan en vul de attributen. `None`
    /// betekent: onbekende tag, deelboom overslaan.
    ///
    /// Tags worden op hun lokale naam opgelost. Een prefix dat naar een andere
    /// namespace wijst wordt gemeld; de standaardnamespace wordt al bij de
    /// `xmlns`-declaratie gecontroleerd.
    fn open_element(
        &mut self,
        tree: &mut ElementTree,
        start: &BytesStart<'_>,
        foreign: Option<String>,
        position: TextPosition,
        is_root: bool,
    ) -> MarkupResult<Option<Frame>> {
        let tag_name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

        if let Some(namespace) = foreign.filter(|_| start.name().prefix().is_some()) {
            record(
                self.violations,
                Violation::new(
                    Severity::Data,
                    ViolationKind::NamespaceMismatch,
                    &tag_name,
                    format!(
                        "namespace {namespace} wijkt af van `{}`",
                        self.schema.namespace()
                    ),
                )
                .at(Some(position)),
            );
        }

        let Some(tag) = self.factory.resolve(&tag_name) else {
            if is_root {
                return Err(MarkupError::UnexpectedRoot {
                    expected: "een element uit het schema",
                    found: tag_name,
                });
            }
            record(
                self.violations,
                Violation::new(
                    Severity::Data,
                    ViolationKind::UnknownElement,
                    &tag_name,
                    format!(
                        "onbekend element, deelboom overgeslagen{}",
                        suggestion(self.factory.suggest(&tag_name))
                    ),
                )
                .at(Some(position)),
            );
            return Ok(None);
        };

        let schema = self.schema;
        let schema_tag = tag.tag_name();
        let Some(element_schema) = schema.element(schema_tag) else {
            if is_root {
                return Err(MarkupError::UnexpectedRoot {
                    expected: "een element uit het schema",
                    found: tag_name,
                });
            }
            record(
                self.violations,
                Violation::new(
                    Severity::Data,
                    ViolationKind::UnknownElement,
                    &tag_name,
                    "element staat niet in het schema, deelboom overgeslagen",
                )
                .at(Some(position)),
            );
            return Ok(None);
        };

        let attributes = self.collect_attributes(start, &tag_name, position)?;
        let mut element = Element::new(tag, tree.ids());
        self.apply_attributes(&mut element, element_schema, &attributes, position);

        let id = tree.insert(element)?;
        Ok(Some(Frame {
            id,
            tag,
            schema_tag: schema_tag.to_owned(),
            text: String::new(),
        }))
    }

    fn collect_attributes(
        &mut self,
        start: &BytesStart<'_>,
        tag_name: &str,
        position: TextPosition,
    ) -> MarkupResult<Vec<(String, String)>> {
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|err| MarkupError::Malformed {
                line: position.line,
                column: position.column,
                message: err.to_string(),
            })?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|err| MarkupError::Malformed {
                    line: position.line,
                    column: position.column,
                    message: err.to_string(),
                })?
                .into_owned();

            if key == "xmlns" {
                if value != self.schema.namespace() {
                    record(
                        self.violations,
                        Violation::new(
                            Severity::Data,
                            ViolationKind::NamespaceMismatch,
                            tag_name,
                            format!(
                                "namespace `{value}` wijkt af van `{}`",
                                self.schema.namespace()
                            ),
                        )
                        .at(Some(position)),
                    );
                }
                continue;
            }
            if key.starts_with("xmlns:") {
                continue;
            }
            attributes.push((key, value));
        }
        Ok(attributes)
    }

    fn apply_attributes(
        &mut self,
        element: &mut Element,
        schema: &ElementSchema,
        attributes: &[(String, String)],
        position: TextPosition,
    ) {
        let tag = element.tag();
        let mut found = Vec::new();
        let accepted = schema.check(attributes, Severity::Data, Some(position), &mut found);
        for violation in found {
            record(self.violations, violation);
        }

        for index in accepted {
            let (name, text) = &attributes[index];
            let Some(property) = properties::find(tag, name) else {
                record(
                    self.violations,
                    Violation::new(
                        Severity::Developer,
                        ViolationKind::MissingProperty,
                        &schema.tag,
                        format!("{} heeft geen property `{name}`", tag.type_name()),
                    )
                    .with_attribute(name)
                    .at(Some(position)),
                );
                continue;
            };

            if schema.attribute(name).is_some_and(|decl| !decl.ty.accepts(property.kind)) {
                record(
                    self.violations,
                    Violation::new(
                        Severity::Developer,
                        ViolationKind::ModelMismatch,
                        &schema.tag,
                        format!("schematype wijkt af van property-type {}", property.kind),
                    )
                    .with_attribute(name)
                    .at(Some(position)),
                );
                continue;
            }

            let value = match convert::parse(property.kind, text) {
                Ok(value) => value,
                Err(err) => {
                    record(
                        self.violations,
                        Violation::new(
                            Severity::Data,
                            ViolationKind::InvalidValue,
                            &schema.tag,
                            err.to_string(),
                        )
                        .with_attribute(name)
                        .at(Some(position)),
                    );
                    continue;
                }
            };

            let variant = value.variant_name();
            if !property.set(element, value) {
                record(
                    self.violations,
                    Violation::new(
                        Severity::Developer,
                        ViolationKind::ModelMismatch,
                        &schema.tag,
                        format!("property weigerde de geconverteerde {variant}-waarde"),
                    )
                    .with_attribute(name)
                    .at(Some(position)),
                );
            }
        }
    }

    /// Sluit een element: tekstinhoud zetten en aan de ouder hangen. Directe
    /// kinderen van de wortel gaan via `add`, zodat hun complete deelboom in
    /// één keer geregistreerd wordt; dieper gelegen elementen worden alleen
    /// gekoppeld.
    fn close_element(
        &mut self,
        tree: &mut ElementTree,
        frame: Frame,
        stack: &[Frame],
        root: &mut Option<ElementId>,
    ) -> MarkupResult<()> {
        self.apply_text(tree, &frame);

        match stack.last() {
            Some(parent) if stack.len() == 1 => tree.add(parent.id, frame.id)?,
            Some(parent) => tree.link(parent.id, frame.id)?,
            None => *root = Some(frame.id),
        }
        Ok(())
    }

    fn apply_text(&mut self, tree: &mut ElementTree, frame: &Frame) {
        let schema = self.schema;
        let content = schema
            .element(&frame.schema_tag)
            .and_then(|schema| schema.content.as_deref());

        let Some(content) = content else {
            if !frame.text.trim().is_empty() {
                record(
                    self.violations,
                    Violation::new(
                        Severity::Data,
                        ViolationKind::InvalidValue,
                        &frame.schema_tag,
                        "element heeft geen tekstinhoud",
                    ),
                );
            }
            return;
        };

        let text = normalize_text(&frame.text, frame.tag == ElementTag::Script);
        if text.is_empty() {
            return;
        }

        let Some(element) = tree.element_mut(frame.id) else {
            return;
        };
        let accepted = properties::find(frame.tag, content)
            .is_some_and(|property| property.set(element, Value::Text(text.into_owned())));
        if !accepted {
            record(
                self.violations,
                Violation::new(
                    Severity::Developer,
                    ViolationKind::MissingProperty,
                    &frame.schema_tag,
                    format!("geen tekst-property `{content}`"),
                ),
            );
        }
    }
}

/// Regeleinden naar de vorm van het host-platform, zonder regeleinden aan
/// begin en eind. Scripts krijgen daarnaast `&lt;`/`&gt;` terug als `<`/`>`.
fn normalize_text(raw: &str, unescape_angles: bool) -> Cow<'_, str> {
    let trimmed = raw.trim_matches(['\r', '\n']);
    let mut text = Cow::Borrowed(trimmed);

    if text.contains('\r') {
        text = Cow::Owned(text.replace("\r\n", "\n"));
    }
    if LINE_ENDING != "\n" && text.contains('\n') {
        text = Cow::Owned(text.replace('\n', LINE_ENDING));
    }
    if unescape_angles && text.contains('&') {
        text = Cow::Owned(text.replace("&lt;", "<").replace("&gt;", ">"));
    }
    text
}

struct WriteContext<'a, 'o> {
    schema: &'a Schema,
    options: &'a SerializerOptions,
    violations: &'a mut Vec<Violation>,
    order: Option<&'o mut dyn FnMut(&str, &str) -> Ordering>,
}

impl WriteContext<'_, '_> {
    fn write_element<W: io::Write>(
        &mut self,
        writer: &mut Writer<W>,
        tree: &ElementTree,
        id: ElementId,
        is_root: bool,
    ) -> MarkupResult<()> {
        let element = tree
            .element(id)
            .ok_or(crate::scene::TreeError::UnknownElement(id))?;
        let tag = element.tag();
        let tag_name = tag.tag_name();

        let schemas = self.schema;
        let Some(schema) = schemas.element(tag_name) else {
            record(
                self.violations,
                Violation::new(
                    Severity::Developer,
                    ViolationKind::UnknownElement,
                    tag_name,
                    "elementsoort ontbreekt in het schema, niet geschreven",
                ),
            );
            return Ok(());
        };

        let attributes = self.collect_attributes(element, schema);
        let text = self.text_content(element, schema);

        let mut start = BytesStart::new(tag_name);
        if is_root && self.options.namespace {
            start.push_attribute(("xmlns", self.schema.namespace()));
        }
        for (name, value) in &attributes {
            start.push_attribute((name.as_str(), value.as_str()));
        }

        let children = element.children();
        if children.is_empty() && text.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        if !text.is_empty() {
            writer.write_event(Event::Text(BytesText::new(&text)))?;
        }
        for child in children {
            self.write_element(writer, tree, *child, false)?;
        }
        writer.write_event(Event::End(BytesEnd::new(tag_name)))?;
        Ok(())
    }

    /// Attributen in schemavolgorde (of de volgorde van de aanroeper), zonder
    /// lege optionele waarden en zonder standaardwaarden. Het resultaat gaat
    /// door dezelfde controle als bij het lezen.
    fn collect_attributes(&mut self, element: &Element, schema: &ElementSchema) -> Vec<(String, String)> {
        let tag = element.tag();
        let mut decls: Vec<_> = schema.attributes.iter().collect();
        if let Some(order) = self.order.as_deref_mut() {
            decls.sort_by(|a, b| order(a.name.as_str(), b.name.as_str()));
        }

        let mut attributes = Vec::with_capacity(decls.len());
        for decl in decls {
            let Some(property) = properties::find(tag, &decl.name) else {
                record(
                    self.violations,
                    Violation::new(
                        Severity::Developer,
                        ViolationKind::MissingProperty,
                        &schema.tag,
                        format!("{} heeft geen property `{}`", tag.type_name(), decl.name),
                    )
                    .with_attribute(&decl.name),
                );
                continue;
            };
            if !decl.ty.accepts(property.kind) {
                record(
                    self.violations,
                    Violation::new(
                        Severity::Developer,
                        ViolationKind::ModelMismatch,
                        &schema.tag,
                        format!(
                            "schema verwacht {}, property is {}",
                            decl.ty.type_name(),
                            property.kind
                        ),
                    )
                    .with_attribute(&decl.name),
                );
                continue;
            }

            let value = property.get(element);
            let text = convert::format(&value);
            if text.is_empty() && !decl.required {
                continue;
            }
            let is_default = decl
                .default
                .as_deref()
                .is_some_and(|default| convert::parse(property.kind, default).is_ok_and(|d| d == value));
            if is_default {
                continue;
            }
            attributes.push((decl.name.clone(), text));
        }

        let mut found = Vec::new();
        schema.check(&attributes, Severity::Developer, None, &mut found);
        for violation in found {
            record(self.violations, violation);
        }
        attributes
    }

    fn text_content(&mut self, element: &Element, schema: &ElementSchema) -> String {
        let Some(content) = schema.content.as_deref() else {
            return String::new();
        };
        match properties::find(element.tag(), content).map(|property| property.get(element)) {
            Some(Value::Text(text)) => text,
            Some(Value::Absent) => String::new(),
            _ => {
                record(
                    self.violations,
                    Violation::new(
                        Severity::Developer,
                        ViolationKind::MissingProperty,
                        &schema.tag,
                        format!("geen tekst-property `{content}`"),
                    ),
                );
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Vec3;
    use crate::scene::element::{PrimitiveData, SceneData, ScriptData, Shape};

    fn serializer() -> MarkupSerializer {
        MarkupSerializer::new()
            .expect("bundled schema")
            .with_ids(IdGenerator::isolated())
    }

    #[test]
    fn reads_attributes_into_typed_data() {
        let input = r#"<Scene xmlns="urn:scene-markup:1" name="demo" speed="2">
            <Primitive name="box" shape="sphere" position="1,2,3" size="1,1,1"/>
        </Scene>"#;
        let markup = serializer().read_as::<SceneData>(input).unwrap();

        assert!(markup.violations.is_empty(), "{:?}", markup.violations);
        assert_eq!(markup.root().unwrap().name(), "demo");
        assert_eq!(markup.root_data::<SceneData>().unwrap().speed, 2.0);

        let primitive = markup.find("box").unwrap();
        assert_eq!(primitive.data::<PrimitiveData>().unwrap().shape, Shape::Sphere);
        assert_eq!(primitive.positional().unwrap().position, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn unknown_element_is_skipped_with_violation() {
        let input = r#"<Scene><Teapot><Camera name="hidden"/></Teapot><Camera name="cam"/></Scene>"#;
        let markup = serializer().read(input).unwrap();

        assert_eq!(markup.violations.len(), 1);
        assert_eq!(markup.violations[0].kind, ViolationKind::UnknownElement);
        assert!(markup.find("hidden").is_none());
        assert!(markup.find("cam").is_some());
    }

    #[test]
    fn namespace_mismatch_is_recorded() {
        let markup = serializer().read(r#"<Scene xmlns="urn:other"/>"#).unwrap();
        assert_eq!(markup.violations[0].kind, ViolationKind::NamespaceMismatch);
    }

    #[test]
    fn prefixed_tags_in_schema_namespace_resolve() {
        let markup = serializer()
            .read(r#"<s:Scene xmlns:s="urn:scene-markup:1"><s:Camera name="c"/></s:Scene>"#)
            .unwrap();
        assert!(markup.violations.is_empty(), "{:?}", markup.violations);
        assert_eq!(markup.root().unwrap().tag(), ElementTag::Scene);
        assert_eq!(markup.find("c").unwrap().tag(), ElementTag::Camera);
    }

    #[test]
    fn foreign_prefix_is_reported_but_read() {
        let markup = serializer()
            .read(r#"<Scene xmlns:x="urn:other"><x:Light name="l"/><y:Group name="g"/></Scene>"#)
            .unwrap();
        let kinds: Vec<_> = markup.violations.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            [ViolationKind::NamespaceMismatch, ViolationKind::NamespaceMismatch]
        );
        assert!(markup.violations[0].message.contains("urn:other"));
        assert!(markup.violations[1].message.contains("`y`"));
        assert!(markup.find("l").is_some());
        assert!(markup.find("g").is_some());
    }

    #[test]
    fn malformed_input_reports_position() {
        let err = serializer().read("<Scene>\n  <Group>\n</Scene>").unwrap_err();
        assert!(matches!(err, MarkupError::Malformed { line, .. } if line >= 2));

        let err = serializer().read("<Scene><Group").unwrap_err();
        assert!(matches!(err, MarkupError::Malformed { .. }));

        let err = serializer().read("<Scene>").unwrap_err();
        assert!(matches!(err, MarkupError::Malformed { .. }));

        let err = serializer().read("   ").unwrap_err();
        assert!(matches!(err, MarkupError::Malformed { .. }));
    }

    #[test]
    fn reads_from_stream() {
        let input = br#"<Scene name="s"><Light name="lamp" intensity="3"/></Scene>"#;
        let markup = serializer().read_from(&input[..]).unwrap();
        assert!(markup.violations.is_empty(), "{:?}", markup.violations);
        assert_eq!(markup.find("lamp").unwrap().tag(), ElementTag::Light);

        let invalid: &[u8] = &[0x3c, 0xff, 0xfe];
        assert!(matches!(
            serializer().read_from(invalid),
            Err(MarkupError::Io(_))
        ));
    }

    #[test]
    fn read_as_checks_root_kind() {
        let err = serializer()
            .read_as::<SceneData>("<Group/>")
            .unwrap_err();
        assert!(matches!(err, MarkupError::UnexpectedRoot { expected: "Scene", .. }));
    }

    #[test]
    fn script_text_is_normalized() {
        let input = "<Scene><Script name=\"s\">\n  if a &amp;lt; b { run() }\n</Script></Scene>";
        let markup = serializer().read(input).unwrap();
        let script = markup.find("s").unwrap();
        assert_eq!(
            script.data::<ScriptData>().unwrap().source,
            "  if a < b { run() }"
        );
    }

    #[test]
    fn write_skips_defaults_and_empty_optionals() {
        let mut tree = ElementTree::new(IdGenerator::isolated());
        let scene = tree.create(ElementTag::Scene);
        let mut serializer = serializer();

        let written = serializer.write(&tree, scene).unwrap();
        assert!(written.violations.is_empty());
        assert!(!written.xml.contains("speed"));
        assert!(!written.xml.contains("context"));
        assert!(written.xml.contains(r#"<Scene xmlns="urn:scene-markup:1" name="SceneDocument"/>"#));
    }

    #[test]
    fn write_ordered_uses_comparator() {
        let mut tree = ElementTree::new(IdGenerator::isolated());
        let primitive = tree.create(ElementTag::Primitive);
        tree.element_mut(primitive)
            .unwrap()
            .positional_mut()
            .unwrap()
            .position = Vec3::ONE;

        let written = serializer()
            .with_options(SerializerOptions {
                indent: 0,
                xml_declaration: false,
                namespace: false,
            })
            .write_ordered(&tree, primitive, |a, b| b.cmp(a))
            .unwrap();
        assert_eq!(written.xml, r#"<Primitive position="1,1,1" name="Primitive"/>"#);
    }

    #[test]
    fn schema_without_property_is_developer_violation() {
        let schema = r#"<schema namespace="urn:scene-markup:1">
            <element name="Camera">
                <attribute name="name" type="string"/>
                <attribute name="zoom" type="float"/>
                <attribute name="near" type="integer"/>
            </element>
        </schema>"#;
        let mut serializer = MarkupSerializer::with_schema(schema).unwrap();
        let mut tree = ElementTree::new(IdGenerator::isolated());
        let camera = tree.create(ElementTag::Camera);

        let written = serializer.write(&tree, camera).unwrap();
        let kinds: Vec<_> = written.violations.iter().map(|v| (v.kind, v.severity)).collect();
        assert_eq!(
            kinds,
            [
                (ViolationKind::MissingProperty, Severity::Developer),
                (ViolationKind::ModelMismatch, Severity::Developer)
            ]
        );
    }

    #[test]
    fn normalize_trims_only_newlines() {
        assert_eq!(normalize_text("\r\n  x\r\n", false), "  x");
        assert_eq!(normalize_text("a &lt;b&gt;", false), "a &lt;b&gt;");
        assert_eq!(normalize_text("a &lt;b&gt;", true), "a <b>");
    }
}
