use marktree::LinkAction;
use marktree::MarkdownTree;
use marktree::hit::HitZone;
use marktree::hit::HitZoneIndex;
use marktree::hit::LinkTarget;
use marktree::hit::ZoneOwner;
use marktree::props::LinkStyle;
use marktree::props::RenderMode;
use marktree::props::TextSize;
use marktree_core::clock::ManualClock;
use marktree_core::geometry::CellRect;
use marktree_core::geometry::Offset;
use marktree_core::geometry::Point;
use marktree_core::input::MouseButton;
use marktree_core::input::MouseEvent;
use marktree_core::input::MouseEventKind;
use pretty_assertions::assert_eq;
use ratatui::layout::Rect;

const DOC: &str = "\
# Links [in a heading](http://h.test)

A paragraph that wraps around with a [long link text spanning lines](http://p.test) \
and a second [one](http://q.test).

> quoted [link](http://quote.test)

- item with [x](http://item.test)
  - nested [y](http://nested.test)

| col | link |
|-----|------|
| a   | [cell](http://cell.test) |
";

fn built(mode: RenderMode) -> MarkdownTree {
    let mut view = MarkdownTree::new(Box::new(ManualClock::new()));
    view.set_render_mode(mode);
    view.set_text(DOC).expect("parse");
    view.force_rebuild().expect("rebuild");
    view
}

fn zones(index: &HitZoneIndex) -> Vec<(CellRect, LinkTarget)> {
    index
        .zones()
        .iter()
        .map(|z| (z.rect, z.target.clone()))
        .collect()
}

#[test]
fn exact_translation_through_an_offset() {
    let index = HitZoneIndex::new(vec![HitZone {
        rect: CellRect::new(10, 10, 50, 20),
        target: LinkTarget {
            ref_id: "link-0".into(),
            url: "http://x.test".into(),
        },
        owner: ZoneOwner::Texture,
    }]);
    let hit = index.locate_from(Point::new(5, 5), &[Offset::new(10, 10)]);
    assert_eq!(hit.map(|t| t.url.as_str()), Some("http://x.test"));
    assert_eq!(index.locate(Point::new(200, 200)), None);

    let empty = HitZoneIndex::new(vec![HitZone {
        rect: CellRect::new(10, 10, 0, 0),
        target: LinkTarget {
            ref_id: "link-1".into(),
            url: "http://y.test".into(),
        },
        owner: ZoneOwner::Texture,
    }]);
    assert_eq!(empty.locate(Point::new(10, 10)), None);
}

#[test]
fn live_and_texture_maps_agree() {
    for width in [20u16, 33, 80] {
        let mut live = built(RenderMode::Live);
        let mut texture = built(RenderMode::Texture);
        let a = zones(live.hit_zones(width));
        let b = zones(texture.hit_zones(width));
        assert!(!a.is_empty());
        assert_eq!(a, b, "width {width}");
        assert!(texture
            .hit_zones(width)
            .zones()
            .iter()
            .all(|z| z.owner == ZoneOwner::Texture));
        assert!(live
            .hit_zones(width)
            .zones()
            .iter()
            .all(|z| matches!(z.owner, ZoneOwner::Widget(_))));
    }
}

#[test]
fn every_link_is_reachable() {
    let mut view = built(RenderMode::Live);
    let urls: Vec<_> = view
        .hit_zones(80)
        .zones()
        .iter()
        .map(|z| z.target.url.clone())
        .collect();
    for url in [
        "http://h.test",
        "http://p.test",
        "http://q.test",
        "http://quote.test",
        "http://item.test",
        "http://nested.test",
        "http://cell.test",
    ] {
        assert!(urls.iter().any(|u| u == url), "{url} missing from {urls:?}");
    }
}

#[test]
fn wrapped_links_get_one_zone_per_line() {
    let mut view = built(RenderMode::Live);
    let count = view
        .hit_zones(20)
        .zones()
        .iter()
        .filter(|z| z.target.url == "http://p.test")
        .count();
    assert!(count >= 2, "expected the link to wrap, got {count} zones");
}

#[test]
fn every_zone_center_locates_its_own_target() {
    for mode in [RenderMode::Live, RenderMode::Texture] {
        let mut view = built(mode);
        let all = zones(view.hit_zones(40));
        for (rect, target) in all {
            let center = Point::new(rect.x + rect.width / 2, rect.y + rect.height / 2);
            assert_eq!(view.locate(center), Some(&target), "{mode:?} {rect:?}");
        }
    }
}

#[test]
fn pointer_events_map_through_the_area() {
    for mode in [RenderMode::Live, RenderMode::Texture] {
        let mut view = built(mode);
        let area = Rect::new(3, 7, 60, 40);
        let (rect, target) = zones(view.hit_zones(area.width))
            .into_iter()
            .next()
            .expect("a zone");
        let x = area.x + rect.x as u16;
        let y = area.y + rect.y as u16;

        assert_eq!(
            view.handle_mouse_event(area, MouseEvent::left_down(x, y)),
            LinkAction::Activated(target)
        );
        let right = MouseEvent::new(x, y, MouseEventKind::Down(MouseButton::Right));
        assert_eq!(view.handle_mouse_event(area, right), LinkAction::None);
        assert_eq!(
            view.handle_mouse_event(Rect::new(0, 0, 0, 0), MouseEvent::left_down(x, y)),
            LinkAction::None
        );
    }
}

#[test]
fn clipped_links_have_no_zones() {
    let mut view = built(RenderMode::Live);
    view.set_text_size(TextSize {
        width: None,
        height: Some(1),
    });
    view.set_strict_label_mode(true);
    view.force_rebuild().expect("rebuild");
    let urls: Vec<_> = view
        .hit_zones(80)
        .zones()
        .iter()
        .map(|z| z.target.url.clone())
        .collect();
    assert_eq!(urls, vec!["http://h.test".to_string()]);
}

#[test]
fn plain_links_are_still_hit_targets() {
    let mut view = built(RenderMode::Live);
    view.set_link_style(LinkStyle::Plain);
    view.force_rebuild().expect("rebuild");
    assert!(view.labels().all(|(_, l)| !l.text.contains("[u]")));
    assert!(!view.hit_zones(80).is_empty());
}
