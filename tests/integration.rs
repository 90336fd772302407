use scene_markup::geom::Vec3;
use scene_markup::scene::convert;
use scene_markup::scene::element::{
    CameraData, Element, ElementTag, LightData, LightType, PrimitiveData, SceneData, ScriptData,
    Shape, StackData, TextData, TextureData,
};
use scene_markup::scene::value::{Value, ValueKind};
use scene_markup::{
    ElementTree, IdGenerator, MarkupError, MarkupSerializer, SerializerOptions, Severity,
    ViolationKind,
};

const LOBBY: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/samples/lobby.xml"));

fn serializer() -> MarkupSerializer {
    MarkupSerializer::new()
        .expect("bundled schema")
        .with_ids(IdGenerator::isolated())
}

fn scene() -> (ElementTree, scene_markup::ElementId) {
    let mut tree = ElementTree::new(IdGenerator::isolated());
    let root = tree.create(ElementTag::Scene);
    (tree, root)
}

#[test]
fn reads_lobby_sample() {
    let markup = serializer().read_as::<SceneData>(LOBBY).expect("read lobby");
    assert!(markup.violations.is_empty(), "{:#?}", markup.violations);
    assert_eq!(markup.tree.len(), 17);

    let scene = markup.root_data::<SceneData>().unwrap();
    assert_eq!(scene.author, "studio");
    assert!(scene.created.is_some());

    let camera = markup.find("main").unwrap().data::<CameraData>().unwrap();
    assert_eq!(camera.field_of_view, 75.0);
    assert!(camera.active);

    let sun = markup.find("sun").unwrap().data::<LightData>().unwrap();
    assert_eq!(sun.light_type, LightType::Directional);

    let furniture = markup.find("furniture").unwrap();
    assert_eq!(furniture.behaviours, ["grabbable", "snapping"]);

    let grain = markup.find("grain").unwrap();
    assert_eq!(grain.data::<TextureData>().unwrap().tiling, Vec3::new(2.0, 2.0, 1.0));
    assert_eq!(grain.source_uri().unwrap().as_str(), "textures/oak.png");

    let shelf = markup.find("shelf").unwrap().data::<StackData>().unwrap();
    assert_eq!(shelf.columns, 3);

    assert_eq!(
        markup.find("vase").unwrap().data::<PrimitiveData>().unwrap().shape,
        Shape::Cylinder
    );
    assert_eq!(
        markup.find("vase1").unwrap().data::<PrimitiveData>().unwrap().shape,
        Shape::Sphere
    );

    let welcome = markup.find("welcome").unwrap().data::<TextData>().unwrap();
    assert_eq!(welcome.text, "Welcome to the lobby");
    let door = markup.find("door").unwrap().data::<ScriptData>().unwrap();
    assert_eq!(door.source, "if visitors > 0 then open() end");

    let garden = markup.find("garden").unwrap();
    assert!(!markup.tree.is_visible(garden.id()));
}

#[test]
fn every_read_element_is_registered_once() {
    let markup = serializer().read(LOBBY).unwrap();
    let registry = markup.tree.registry(markup.root).unwrap();

    assert_eq!(registry.len(), markup.tree.len() - 1);
    for id in markup.tree.descendants(markup.root) {
        let element = markup.tree.element(id).unwrap();
        assert_eq!(registry.id_of(element.name()), Some(id));
    }
}

#[test]
fn world_position_follows_parent_chain() {
    let markup = serializer().read(LOBBY).unwrap();
    let chair = markup.find("chair").unwrap().id();
    assert_eq!(markup.tree.world_position(chair), Some(Vec3::new(1.5, 0.0, 2.5)));
}

#[test]
fn lobby_round_trips() {
    let mut serializer = serializer();
    let first = serializer.read(LOBBY).unwrap();
    let written = serializer.write(&first.tree, first.root).unwrap();
    assert!(written.violations.is_empty(), "{:#?}", written.violations);

    let second = serializer.read(&written.xml).unwrap();
    assert!(second.violations.is_empty(), "{:#?}", second.violations);
    assert_eq!(second.tree.len(), first.tree.len());
    for id in first.tree.descendants(first.root) {
        let name = first.tree.element(id).unwrap().name();
        let copy = second.find(name).unwrap();
        assert_eq!(copy.kind(), first.tree.element(id).unwrap().kind());
    }

    let rewritten = serializer.write(&second.tree, second.root).unwrap();
    assert_eq!(rewritten.xml, written.xml);
}

#[test]
fn primitive_name_round_trips() {
    let mut tree = ElementTree::new(IdGenerator::isolated());
    let element = Element::new(ElementTag::Primitive, tree.ids()).with_name("X");
    let id = tree.insert(element).unwrap();

    let mut serializer = serializer();
    let written = serializer.write(&tree, id).unwrap();
    let markup = serializer.read(&written.xml).unwrap();
    assert_eq!(markup.root().unwrap().name(), "X");
}

#[test]
fn fresh_scene_omits_default_speed() {
    let (tree, root) = scene();
    let written = serializer().write(&tree, root).unwrap();
    assert!(!written.xml.contains("speed"));
    assert!(!written.xml.contains("background"));
}

#[test]
fn one_invalid_attribute_yields_one_violation() {
    let input = r#"<Scene xmlns="urn:scene-markup:1">
  <Primitive name="p" position="5" shape="Sphere"/>
  <Camera name="c" fieldOfView="90"/>
</Scene>"#;
    let markup = serializer().read(input).unwrap();

    assert_eq!(markup.violations.len(), 1);
    let violation = &markup.violations[0];
    assert_eq!(violation.kind, ViolationKind::InvalidValue);
    assert_eq!(violation.severity, Severity::Data);
    assert_eq!(violation.attribute.as_deref(), Some("position"));
    assert_eq!(violation.position.map(|p| p.line), Some(2));

    let primitive = markup.find("p").unwrap();
    assert_eq!(primitive.positional().unwrap().position, Vec3::ZERO);
    assert_eq!(primitive.data::<PrimitiveData>().unwrap().shape, Shape::Sphere);
    let camera = markup.find("c").unwrap().data::<CameraData>().unwrap();
    assert_eq!(camera.field_of_view, 90.0);
}

#[test]
fn malformed_markup_is_fatal() {
    let err = serializer()
        .read("<Scene>\n  <Primitive name=\"p\">\n</Scene>")
        .unwrap_err();
    assert!(matches!(err, MarkupError::Malformed { .. }), "{err}");

    assert!(matches!(
        serializer().read(""),
        Err(MarkupError::Malformed { .. })
    ));
}

#[test]
fn conflicting_names_stay_resolvable() {
    let (mut tree, root) = scene();
    let first = tree
        .insert(Element::new(ElementTag::Group, tree.ids()).with_name("name1"))
        .unwrap();
    let second = tree
        .insert(Element::new(ElementTag::Group, tree.ids()).with_name("name1"))
        .unwrap();
    tree.add(root, first).unwrap();
    tree.add(root, second).unwrap();

    let first_name = tree.element(first).unwrap().name().to_owned();
    let second_name = tree.element(second).unwrap().name().to_owned();
    assert_eq!(first_name, "name1");
    assert_eq!(second_name, "name11");
    assert_eq!(tree.try_get_by_name(root, &first_name).unwrap().id(), first);
    assert_eq!(tree.try_get_by_name(root, &second_name).unwrap().id(), second);
}

#[test]
fn removed_name_is_free_again() {
    let (mut tree, root) = scene();
    let old = tree
        .insert(Element::new(ElementTag::Light, tree.ids()).with_name("lamp"))
        .unwrap();
    tree.add(root, old).unwrap();
    tree.remove(root, old).unwrap();

    let new = tree
        .insert(Element::new(ElementTag::Light, tree.ids()).with_name("lamp"))
        .unwrap();
    tree.add(root, new).unwrap();
    assert_eq!(tree.element(new).unwrap().name(), "lamp");
    assert_eq!(tree.get_by_name(root, "lamp").unwrap().id(), new);
}

#[test]
fn rename_is_visible_from_root() {
    let (mut tree, root) = scene();
    let group = tree.create(ElementTag::Group);
    let camera = tree
        .insert(Element::new(ElementTag::Camera, tree.ids()).with_name("before"))
        .unwrap();
    tree.add(group, camera).unwrap();
    tree.add(root, group).unwrap();

    tree.set_name(camera, "after").unwrap();
    let registry = tree.registry_for(root).unwrap();
    assert!(!registry.contains_name("before"));
    assert!(registry.contains_name("after"));
}

#[test]
fn nested_positions_compose() {
    let (mut tree, root) = scene();
    let parent = tree.create(ElementTag::Group);
    let child = tree.create(ElementTag::Primitive);
    tree.element_mut(parent).unwrap().positional_mut().unwrap().position =
        Vec3::new(1.0, 2.0, 3.0);
    tree.element_mut(child).unwrap().positional_mut().unwrap().position =
        Vec3::new(10.0, 11.0, 12.0);
    tree.add(root, parent).unwrap();
    tree.add(parent, child).unwrap();

    assert_eq!(tree.world_position(child), Some(Vec3::new(11.0, 13.0, 15.0)));
}

#[test]
fn parent_resize_keeps_child_size() {
    let (mut tree, root) = scene();
    let parent = tree.create(ElementTag::Stack);
    let child = tree.create(ElementTag::Primitive);
    tree.add(root, parent).unwrap();
    tree.add(parent, child).unwrap();
    tree.element_mut(child)
        .unwrap()
        .extent_mut()
        .unwrap()
        .set_size(Vec3::new(1.0, 2.0, 3.0));

    tree.element_mut(parent)
        .unwrap()
        .extent_mut()
        .unwrap()
        .set_size(Vec3::splat(10.0));
    assert_eq!(
        tree.element(child).unwrap().extent().unwrap().size(),
        Vec3::new(1.0, 2.0, 3.0)
    );
}

#[test]
fn conversion_utility_is_usable_standalone() {
    let vector = Value::Vector(Vec3::new(0.1, -2.5, 1e-7));
    let bytes = convert::to_bytes(&vector);
    assert_eq!(bytes.len(), 12);
    assert_eq!(convert::from_bytes(ValueKind::Vector3, &bytes).unwrap(), vector);

    let text = convert::format(&Value::TextList(vec!["a".into(), "b".into()]));
    assert_eq!(text, "a,b");
    assert_eq!(
        convert::parse(ValueKind::StringList, " a, ,b ").unwrap(),
        Value::TextList(vec!["a".into(), "b".into()])
    );
}

#[test]
fn schema_attribute_without_property_is_developer_error() {
    let schema = r#"<schema namespace="urn:scene-markup:1">
        <element name="Light">
            <attribute name="name" type="string"/>
            <attribute name="glow" type="float"/>
        </element>
    </schema>"#;
    let mut serializer = MarkupSerializer::with_schema(schema).unwrap();
    let markup = serializer.read(r#"<Light name="l" glow="2"/>"#).unwrap();

    assert_eq!(markup.violations.len(), 1);
    assert_eq!(markup.violations[0].kind, ViolationKind::MissingProperty);
    assert_eq!(markup.violations[0].severity, Severity::Developer);
    assert_eq!(markup.root().unwrap().name(), "l");
}

#[test]
fn extra_tags_resolve_through_factory() {
    let mut serializer = serializer();
    serializer.factory_mut().register("Box", ElementTag::Primitive);

    let markup = serializer
        .read(r#"<Scene><Box name="crate" size="1,1,1"/></Scene>"#)
        .unwrap();
    assert!(markup.violations.is_empty(), "{:#?}", markup.violations);
    assert_eq!(markup.find("crate").unwrap().tag(), ElementTag::Primitive);

    let written = serializer.write(&markup.tree, markup.root).unwrap();
    assert!(written.xml.contains("<Primitive name=\"crate\""));
}

#[test]
fn reads_from_path_and_writes_to_stream() {
    let path = std::env::temp_dir().join(format!("scene-markup-lobby-{}.xml", std::process::id()));
    std::fs::write(&path, LOBBY).unwrap();

    let mut serializer = serializer().with_options(SerializerOptions {
        indent: 0,
        ..SerializerOptions::default()
    });
    let markup = serializer.read_path(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let mut out = Vec::new();
    let violations = serializer.write_to(&markup.tree, markup.root, &mut out).unwrap();
    assert!(violations.is_empty());
    let xml = String::from_utf8(out).unwrap();
    assert!(xml.starts_with("<?xml"));
    assert!(!xml.contains('\n'));

    assert!(matches!(
        serializer.read_path("/definitely/not/here.xml"),
        Err(MarkupError::Io(_))
    ));
}

#[test]
fn wildcard_lookup_spans_scope() {
    let markup = serializer().read(LOBBY).unwrap();
    let vases: Vec<_> = markup
        .tree
        .find_matching(markup.root, "vase*")
        .into_iter()
        .map(Element::name)
        .collect();
    assert_eq!(vases, ["vase", "vase1"]);
}

#[test]
fn typos_get_a_suggestion() {
    let input = r#"<Scene><Camra name="c"/><Light name="l" intensty="2"/></Scene>"#;
    let markup = serializer().read(input).unwrap();

    assert_eq!(markup.violations.len(), 2);
    assert_eq!(markup.violations[0].kind, ViolationKind::UnknownElement);
    assert!(markup.violations[0].message.contains("`Camera`"));
    assert_eq!(markup.violations[1].kind, ViolationKind::UnknownAttribute);
    assert!(markup.violations[1].message.contains("`intensity`"));
}
