//! Ruimtelijke capabilities en de samenstelling ervan langs de boom.
//!
//! Alle wereldwaarden worden bij elke query opnieuw afgeleid door omhoog te
//! lopen. Er wordt niets gecachet.

use crate::geom::{BBox, Transform, Vec3};

use super::ElementTree;
use super::element::{ElementKind, ElementTag};
use super::id::ElementId;

/// Positie en rotatie (radialen) ten opzichte van de ouder.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Positional {
    pub position: Vec3,
    pub rotation: Vec3,
}

/// Opgeslagen zichtbaarheid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility {
    pub visible: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self { visible: true }
    }
}

/// Afmetingen van een kubisch element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Extent {
    size: Vec3,
    original_size: Vec3,
    revision: u64,
}

impl Extent {
    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.size
    }

    /// Zet de grootte. Geeft `true` als de waarde echt veranderde; alleen dan
    /// wordt de revisie opgehoogd.
    pub fn set_size(&mut self, size: Vec3) -> bool {
        if self.size == size {
            return false;
        }
        self.size = size;
        self.revision += 1;
        true
    }

    /// Oorspronkelijke grootte van de inhoud; (1,1,1) zolang die niet gezet is.
    #[must_use]
    pub fn original_size(&self) -> Vec3 {
        if self.original_size.is_zero() {
            Vec3::ONE
        } else {
            self.original_size
        }
    }

    pub fn set_original_size(&mut self, size: Vec3) {
        self.original_size = size;
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// `size / original_size`. Een ongezette grootte schaalt niet.
    #[must_use]
    pub fn scale_factor(&self) -> Vec3 {
        if self.size.is_zero() {
            return Vec3::ONE;
        }
        self.size.div_elem(self.original_size())
    }
}

impl ElementTree {
    /// Dichtstbijzijnde voorouder met een positie-component.
    fn positional_parent(&self, id: ElementId) -> Option<ElementId> {
        self.ancestors(id)
            .find(|ancestor| self.element(*ancestor).is_some_and(|e| e.positional().is_some()))
    }

    fn cubic_parent(&self, id: ElementId) -> Option<ElementId> {
        self.ancestors(id)
            .find(|ancestor| self.element(*ancestor).is_some_and(|e| e.extent().is_some()))
    }

    /// `T(position) · Ry · Rx · Rz · S`. `S` is de eigen schaal van een
    /// schaalcontainer of de schaalfactor van een resizable soort.
    #[must_use]
    pub fn local_matrix(&self, id: ElementId) -> Option<Transform> {
        let element = self.element(id)?;
        let positional = element.positional()?;

        let scale = match element.kind() {
            ElementKind::Scale(data) => data.scale,
            _ if element.tag().is_resizable() => {
                element.extent().map_or(Vec3::ONE, |extent| extent.scale_factor())
            }
            _ => Vec3::ONE,
        };

        Some(
            Transform::translate(positional.position)
                .compose(Transform::rotate_yxz(positional.rotation))
                .compose(Transform::scale(scale)),
        )
    }

    /// Lokale matrix na de wereldmatrix van de ouder; identiteit boven de wortel.
    #[must_use]
    pub fn world_matrix(&self, id: ElementId) -> Option<Transform> {
        let local = self.local_matrix(id)?;
        let parent = self
            .positional_parent(id)
            .and_then(|parent| self.world_matrix(parent))
            .unwrap_or_default();
        Some(parent.compose(local))
    }

    /// Punt uit de lokale ruimte van `id` in wereldcoördinaten.
    #[must_use]
    pub fn world_point(&self, id: ElementId, local: Vec3) -> Option<Vec3> {
        self.world_matrix(id).map(|matrix| matrix.apply_point(local))
    }

    /// Schaal in wereldruimte. Gewone elementen erven die van hun ouder; een
    /// schaalcontainer combineert zijn eigen schaal met die van de dichtstbijzijnde
    /// kubische voorouder.
    #[must_use]
    pub fn world_scale(&self, id: ElementId) -> Vec3 {
        let Some(element) = self.element(id) else {
            return Vec3::ONE;
        };

        if let ElementKind::Scale(data) = element.kind() {
            let inherited = self
                .cubic_parent(id)
                .map_or(Vec3::ONE, |parent| self.world_scale(parent));
            return data.scale.mul_elem(inherited);
        }

        self.positional_parent(id)
            .map_or(Vec3::ONE, |parent| self.world_scale(parent))
    }

    /// Positie in wereldruimte: eigen positie geschaald met de wereldschaal van
    /// de ouder, verschoven met diens wereldpositie. Zonder ouder geldt de
    /// eigen wereldschaal.
    #[must_use]
    pub fn world_position(&self, id: ElementId) -> Option<Vec3> {
        let position = self.element(id)?.positional()?.position;
        match self.positional_parent(id) {
            Some(parent) => {
                let offset = self.world_position(parent).unwrap_or(Vec3::ZERO);
                Some(position.mul_elem(self.world_scale(parent)) + offset)
            }
            None => Some(position.mul_elem(self.world_scale(id))),
        }
    }

    /// Som van de Euler-rotaties langs de keten.
    #[must_use]
    pub fn world_rotation(&self, id: ElementId) -> Option<Vec3> {
        let rotation = self.element(id)?.positional()?.rotation;
        let inherited = self
            .positional_parent(id)
            .and_then(|parent| self.world_rotation(parent))
            .unwrap_or(Vec3::ZERO);
        Some(inherited + rotation)
    }

    /// Effectieve zichtbaarheid: eigen vlag en die van alle voorouders met een
    /// zichtbaarheidscomponent.
    #[must_use]
    pub fn is_visible(&self, id: ElementId) -> bool {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .filter_map(|current| self.element(current))
            .filter_map(|element| element.visibility())
            .all(|visibility| visibility.visible)
    }

    #[must_use]
    pub fn world_size(&self, id: ElementId) -> Option<Vec3> {
        let size = self.element(id)?.extent()?.size();
        Some(size.mul_elem(self.world_scale(id)))
    }

    /// Box rond de lokale positie, met de hoogte vanaf de positie omhoog.
    #[must_use]
    pub fn local_bounds(&self, id: ElementId) -> Option<BBox> {
        let element = self.element(id)?;
        let size = element.extent()?.size();
        let position = element.positional()?.position;
        Some(BBox::standing_on(position, size))
    }

    #[must_use]
    pub fn world_bounds(&self, id: ElementId) -> Option<BBox> {
        Some(BBox::standing_on(
            self.world_position(id)?,
            self.world_size(id)?,
        ))
    }

    /// Omhullende van de wereldboxen van `id` en al zijn kubische nakomelingen.
    #[must_use]
    pub fn subtree_bounds(&self, id: ElementId) -> Option<BBox> {
        std::iter::once(id)
            .chain(self.descendants(id))
            .filter_map(|current| self.world_bounds(current))
            .reduce(BBox::union)
    }

    /// Tags waarvoor [`Self::local_matrix`] een waarde geeft.
    #[must_use]
    pub fn positional_tags() -> impl Iterator<Item = ElementTag> {
        ElementTag::ALL
            .iter()
            .copied()
            .filter(|tag| tag.capabilities().positional)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::element::ScaleData;
    use crate::scene::id::IdGenerator;

    fn tree() -> ElementTree {
        ElementTree::new(IdGenerator::isolated())
    }

    fn place(tree: &mut ElementTree, tag: ElementTag, position: Vec3) -> ElementId {
        let id = tree.create(tag);
        tree.element_mut(id)
            .and_then(|e| e.positional_mut())
            .expect("positional element")
            .position = position;
        id
    }

    #[test]
    fn nested_world_position_adds_parent_offset() {
        let mut tree = tree();
        let parent = place(&mut tree, ElementTag::Group, Vec3::new(1.0, 2.0, 3.0));
        let child = place(&mut tree, ElementTag::Group, Vec3::new(10.0, 11.0, 12.0));
        tree.add(parent, child).unwrap();

        assert_eq!(tree.world_position(child), Some(Vec3::new(11.0, 13.0, 15.0)));
        let matrix = tree.world_matrix(child).unwrap();
        assert!(matrix.translation().approx_eq(Vec3::new(11.0, 13.0, 15.0), 1e-6));
    }

    #[test]
    fn resizable_local_matrix_scales_by_size_ratio() {
        let mut tree = tree();
        let primitive = place(&mut tree, ElementTag::Primitive, Vec3::new(1.0, 0.0, 0.0));
        let extent = tree
            .element_mut(primitive)
            .and_then(|e| e.extent_mut())
            .unwrap();
        extent.set_original_size(Vec3::new(1.0, 1.0, 2.0));
        extent.set_size(Vec3::new(2.0, 3.0, 4.0));

        let matrix = tree.local_matrix(primitive).unwrap();
        assert!(matrix.apply_point(Vec3::ONE).approx_eq(Vec3::new(3.0, 3.0, 2.0), 1e-6));
        assert!(matrix.translation().approx_eq(Vec3::new(1.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn scale_container_world_matrix_scales_child() {
        let mut tree = tree();
        let scale = place(&mut tree, ElementTag::Scale, Vec3::ZERO);
        tree.element_mut(scale)
            .and_then(|e| e.data_mut::<ScaleData>())
            .unwrap()
            .scale = Vec3::new(2.0, 3.0, 4.0);
        let child = place(&mut tree, ElementTag::Group, Vec3::ONE);
        tree.add(scale, child).unwrap();

        let matrix = tree.world_matrix(child).unwrap();
        assert!(matrix.translation().approx_eq(Vec3::new(2.0, 3.0, 4.0), 1e-6));
        assert!(
            tree.world_point(child, Vec3::ONE)
                .unwrap()
                .approx_eq(Vec3::new(4.0, 6.0, 8.0), 1e-6)
        );
        assert_eq!(tree.world_position(child), Some(Vec3::new(2.0, 3.0, 4.0)));
    }

    #[test]
    fn scale_container_scales_child_positions() {
        let mut tree = tree();
        let scale = place(&mut tree, ElementTag::Scale, Vec3::ZERO);
        tree.element_mut(scale)
            .and_then(|e| e.data_mut::<ScaleData>())
            .unwrap()
            .scale = Vec3::new(2.0, 3.0, 4.0);
        let child = place(&mut tree, ElementTag::Group, Vec3::ONE);
        tree.add(scale, child).unwrap();

        assert_eq!(tree.world_scale(child), Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(tree.world_position(child), Some(Vec3::new(2.0, 3.0, 4.0)));
    }

    #[test]
    fn root_position_uses_own_z_scale() {
        let mut tree = tree();
        let scale = place(&mut tree, ElementTag::Scale, Vec3::ONE);
        tree.element_mut(scale)
            .and_then(|e| e.data_mut::<ScaleData>())
            .unwrap()
            .scale = Vec3::new(1.0, 2.0, 5.0);

        assert_eq!(tree.world_position(scale), Some(Vec3::new(1.0, 2.0, 5.0)));
    }

    #[test]
    fn world_rotation_is_a_sum() {
        let mut tree = tree();
        let parent = tree.create(ElementTag::Group);
        let child = tree.create(ElementTag::Camera);
        tree.element_mut(parent).unwrap().positional_mut().unwrap().rotation =
            Vec3::new(0.1, 0.2, 0.0);
        tree.element_mut(child).unwrap().positional_mut().unwrap().rotation =
            Vec3::new(0.0, 0.3, 0.5);
        tree.add(parent, child).unwrap();

        let rotation = tree.world_rotation(child).unwrap();
        assert!(rotation.approx_eq(Vec3::new(0.1, 0.5, 0.5), 1e-6));
    }

    #[test]
    fn visibility_is_inherited_through_non_visual_parents() {
        let mut tree = tree();
        let scene = tree.create(ElementTag::Scene);
        let group = tree.create(ElementTag::Group);
        let light = tree.create(ElementTag::Light);
        tree.add(scene, group).unwrap();
        tree.add(group, light).unwrap();
        assert!(tree.is_visible(light));

        tree.element_mut(group).unwrap().visibility_mut().unwrap().visible = false;
        assert!(!tree.is_visible(light));
        assert!(tree.element(light).unwrap().visibility().unwrap().visible);
    }

    #[test]
    fn set_size_only_bumps_revision_on_change() {
        let mut extent = Extent::default();
        assert_eq!(extent.original_size(), Vec3::ONE);
        assert!(extent.set_size(Vec3::splat(2.0)));
        assert!(!extent.set_size(Vec3::splat(2.0)));
        assert_eq!(extent.revision(), 1);
        assert_eq!(extent.scale_factor(), Vec3::splat(2.0));
    }

    #[test]
    fn resizing_parent_keeps_child_size() {
        let mut tree = tree();
        let parent = tree.create(ElementTag::Primitive);
        let child = tree.create(ElementTag::Primitive);
        tree.element_mut(child).unwrap().extent_mut().unwrap().set_size(Vec3::ONE);
        tree.add(parent, child).unwrap();

        tree.element_mut(parent)
            .unwrap()
            .extent_mut()
            .unwrap()
            .set_size(Vec3::splat(4.0));
        assert_eq!(tree.element(child).unwrap().extent().unwrap().size(), Vec3::ONE);
    }

    #[test]
    fn bounds_stand_on_position() {
        let mut tree = tree();
        let parent = place(&mut tree, ElementTag::Group, Vec3::new(0.0, 1.0, 0.0));
        let boxed = place(&mut tree, ElementTag::Primitive, Vec3::new(2.0, 0.0, 0.0));
        tree.element_mut(boxed)
            .unwrap()
            .extent_mut()
            .unwrap()
            .set_size(Vec3::new(2.0, 4.0, 2.0));
        tree.add(parent, boxed).unwrap();

        let local = tree.local_bounds(boxed).unwrap();
        assert_eq!(local.min, Vec3::new(1.0, 0.0, -1.0));
        assert_eq!(local.max, Vec3::new(3.0, 4.0, 1.0));

        let world = tree.world_bounds(boxed).unwrap();
        assert_eq!(world.min, Vec3::new(1.0, 1.0, -1.0));
        assert_eq!(world.max, Vec3::new(3.0, 5.0, 1.0));
        assert_eq!(tree.subtree_bounds(parent), Some(world));
    }

    #[test]
    fn non_spatial_elements_have_no_matrix() {
        let mut tree = tree();
        let material = tree.create(ElementTag::Material);
        assert!(tree.local_matrix(material).is_none());
        assert!(tree.world_position(material).is_none());
        assert!(ElementTree::positional_tags().all(|tag| tag != ElementTag::Material));
    }
}
