//! Link hit zones and pointer translation.
//!
//! All zones are in root-local cells. [`HitZoneIndex::live`] derives them from the laid-out widget
//! tree by walking each label's parent chain; the texture path in [`crate::paint`] builds the same
//! map by accumulating offsets during its own traversal.

use crate::layout::Layout;
use crate::markup::RefMap;
use crate::widget::WidgetId;
use crate::widget::WidgetTree;
use marktree_core::geometry::CellRect;
use marktree_core::geometry::Offset;
use marktree_core::geometry::Point;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LinkTarget {
    pub ref_id: String,
    pub url: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ZoneOwner {
    Widget(WidgetId),
    Texture,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HitZone {
    pub rect: CellRect,
    pub target: LinkTarget,
    pub owner: ZoneOwner,
}

/// Zones in document order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HitZoneIndex {
    zones: Vec<HitZone>,
}

impl HitZoneIndex {
    pub fn new(zones: Vec<HitZone>) -> Self {
        Self { zones }
    }

    /// Zones of a live widget tree.
    pub fn live(tree: &WidgetTree, layout: &Layout, refs: &RefMap) -> Self {
        let mut zones = Vec::new();
        for slot in tree.label_slots() {
            let (Some(node), Some(laid)) = (tree.get(slot), layout.node(slot)) else {
                continue;
            };
            let Some(label) = laid.label.as_ref() else {
                continue;
            };
            if label.ref_boxes.is_empty() {
                continue;
            }
            let offset = layout.offset_in_root(tree, slot);
            let clip = layout.clip_in_root(tree, slot);
            for b in &label.ref_boxes {
                push_zone(
                    &mut zones,
                    b.rect.translate(offset),
                    clip,
                    &b.ref_id,
                    refs,
                    ZoneOwner::Widget(node.id),
                );
            }
        }
        Self { zones }
    }

    pub fn zones(&self) -> &[HitZone] {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// First zone containing the root-local `point`.
    pub fn locate(&self, point: Point) -> Option<&LinkTarget> {
        self.zones
            .iter()
            .find(|z| z.rect.contains(point))
            .map(|z| &z.target)
    }

    /// Like [`HitZoneIndex::locate`] for a point local to a nested child; `offsets` are the
    /// child's position within each ancestor, innermost first.
    pub fn locate_from(&self, local: Point, offsets: &[Offset]) -> Option<&LinkTarget> {
        self.locate(to_root_local(local, offsets))
    }
}

/// Translates `local` through an offset chain into root-local coordinates.
pub fn to_root_local(local: Point, offsets: &[Offset]) -> Point {
    offsets.iter().fold(local, |p, &o| p.translate(o))
}

/// Appends the zone for `rect` (root-local) unless clipping leaves nothing of it. Reference ids
/// with no registered URL are skipped.
pub(crate) fn push_zone(
    zones: &mut Vec<HitZone>,
    rect: CellRect,
    clip: Option<CellRect>,
    ref_id: &str,
    refs: &RefMap,
    owner: ZoneOwner,
) {
    let rect = match clip {
        Some(clip) => match rect.intersection(&clip) {
            Some(r) => r,
            None => return,
        },
        None => rect,
    };
    if rect.is_empty() {
        return;
    }
    let Some(url) = refs.get(ref_id) else {
        log::debug!("link reference {ref_id} has no target");
        return;
    };
    zones.push(HitZone {
        rect,
        target: LinkTarget {
            ref_id: ref_id.to_string(),
            url: url.to_string(),
        },
        owner,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(id: &str) -> LinkTarget {
        LinkTarget {
            ref_id: id.into(),
            url: format!("http://{id}.test"),
        }
    }

    fn index(zones: &[(CellRect, &str)]) -> HitZoneIndex {
        HitZoneIndex::new(
            zones
                .iter()
                .map(|(rect, id)| HitZone {
                    rect: *rect,
                    target: target(id),
                    owner: ZoneOwner::Texture,
                })
                .collect(),
        )
    }

    #[test]
    fn nested_offsets_translate_exactly() {
        let idx = index(&[(CellRect::new(10, 10, 50, 20), "a")]);
        assert_eq!(
            idx.locate_from(Point::new(5, 5), &[Offset::new(10, 10)]),
            Some(&target("a"))
        );
        assert_eq!(idx.locate(Point::new(200, 200)), None);
    }

    #[test]
    fn offset_chains_accumulate() {
        let p = to_root_local(
            Point::new(1, 2),
            &[Offset::new(3, 4), Offset::new(-10, 100)],
        );
        assert_eq!(p, Point::new(-6, 106));
    }

    #[test]
    fn edges_are_half_open_and_first_match_wins() {
        let idx = index(&[
            (CellRect::new(0, 0, 4, 1), "a"),
            (CellRect::new(2, 0, 4, 1), "b"),
        ]);
        assert_eq!(idx.locate(Point::new(3, 0)), Some(&target("a")));
        assert_eq!(idx.locate(Point::new(4, 0)), Some(&target("b")));
        assert_eq!(idx.locate(Point::new(6, 0)), None);
        assert_eq!(idx.locate(Point::new(0, 1)), None);
    }

    #[test]
    fn zero_size_zones_never_match() {
        let idx = index(&[
            (CellRect::new(5, 5, 0, 3), "a"),
            (CellRect::new(5, 5, 3, 0), "b"),
        ]);
        assert_eq!(idx.locate(Point::new(5, 5)), None);
    }

    #[test]
    fn clipped_zones_shrink_or_vanish() {
        let mut refs = RefMap::new();
        let id = refs.insert("http://x.test");
        let mut zones = Vec::new();
        let clip = Some(CellRect::new(0, 0, 10, 2));
        push_zone(&mut zones, CellRect::new(8, 1, 5, 1), clip, &id, &refs, ZoneOwner::Texture);
        push_zone(&mut zones, CellRect::new(0, 5, 5, 1), clip, &id, &refs, ZoneOwner::Texture);
        push_zone(&mut zones, CellRect::new(0, 0, 5, 1), None, "missing", &refs, ZoneOwner::Texture);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].rect, CellRect::new(8, 1, 2, 1));
    }
}
