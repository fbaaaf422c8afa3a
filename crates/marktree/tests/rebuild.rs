use marktree::MarkdownTree;
use marktree::parse::parse;
use marktree::props::Padding;
use marktree::props::Prop;
use marktree::props::TextSize;
use marktree::scheduler::SchedulerState;
use marktree::serialize::serialize;
use marktree::widget::LabelRole;
use marktree_core::clock::ManualClock;
use pretty_assertions::assert_eq;
use ratatui::style::Color;
use rstest::rstest;

fn tree_with(md: &str) -> (ManualClock, MarkdownTree) {
    let clock = ManualClock::new();
    let mut view = MarkdownTree::new(Box::new(clock.clone()));
    view.set_text(md).expect("parse");
    assert!(clock.take_frame());
    assert!(view.on_frame());
    (clock, view)
}

fn squash_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[test]
fn title_paragraph_and_link() {
    let src = "# Title\n\nSome **bold** text with a [link](http://x.test).";
    let (_clock, view) = tree_with(src);

    let labels: Vec<_> = view.labels().map(|(_, l)| l.clone()).collect();
    assert_eq!(labels.len(), 2);

    assert_eq!(labels[0].role, LabelRole::Heading(1));
    assert_eq!(labels[0].text, "Title");
    assert_eq!(labels[0].scale, view.options().heading_scale(1));
    assert_eq!(
        labels[0].style.font_size,
        view.props().base_font_size * view.options().heading_scale(1)
    );

    assert_eq!(labels[1].role, LabelRole::Body);
    assert!(labels[1].text.contains("[b]bold[/b]"), "{}", labels[1].text);
    assert!(labels[1].text.contains("[ref=link-0]link[/ref]"), "{}", labels[1].text);
    assert_eq!(view.refs().get("link-0"), Some("http://x.test"));

    let doc = view.ast().expect("document");
    assert_eq!(squash_ws(&serialize(doc)), squash_ws(src));
}

#[test]
fn color_on_five_labels_patches_in_place() {
    let (clock, mut view) = tree_with("# a\n\nb\n\n- c\n\n> d\n\n```\ne\n```\n");
    let label_count = view.labels().count();
    let ids = view.widget_ids();
    let rebuilds = view.rebuild_count();
    let requests = clock.requests();

    view.set_color(Some(Color::Magenta));

    assert_eq!(view.labels().filter(|(_, l)| l.role != LabelRole::Marker).count(), 5);
    assert!(view
        .labels()
        .all(|(_, l)| l.style.color == Some(Color::Magenta)));
    assert_eq!(view.labels().count(), label_count);
    assert_eq!(view.widget_ids(), ids);
    assert_eq!(view.rebuild_count(), rebuilds);
    assert_eq!(clock.requests(), requests);
    assert_eq!(view.scheduler_state(), SchedulerState::Idle);
}

#[test]
fn style_writes_are_idempotent() {
    let (_clock, mut view) = tree_with("para one\n\npara two\n");
    view.set(Prop::LineHeight(1.5)).expect("write");
    let once: Vec<_> = view.labels().map(|(id, l)| (id, l.clone())).collect();
    view.set(Prop::LineHeight(1.5)).expect("write");
    let twice: Vec<_> = view.labels().map(|(id, l)| (id, l.clone())).collect();
    assert_eq!(once, twice);
    assert!(!view.is_rebuild_pending());
}

#[test]
fn padding_is_a_style_write_on_the_root() {
    let (_clock, mut view) = tree_with("x");
    let ids = view.widget_ids();
    view.set_padding(Padding::uniform(2));
    assert_eq!(view.widget_ids(), ids);
    let size = view.content_size(20);
    assert_eq!(size.height, 5);
}

#[rstest]
#[case("one", "one\n\ntwo\n\nthree")]
#[case("a\n\nb\n\nc\n\nd", "# only")]
#[case("- a\n- b", "> q\n\n---\n\n| h |\n|---|\n| c |\n\n![i](i.png)")]
fn block_count_follows_the_document(#[case] before: &str, #[case] after: &str) {
    let (clock, mut view) = tree_with(before);
    assert_eq!(
        view.block_widget_count(),
        parse(before).expect("parse").blocks.len()
    );
    let root = view.root_id();
    let rebuilds = view.rebuild_count();

    view.set_text(after).expect("parse");
    assert!(clock.take_frame());
    assert!(view.on_frame());

    assert_eq!(view.rebuild_count(), rebuilds + 1);
    assert_eq!(view.root_id(), root);
    assert_eq!(
        view.block_widget_count(),
        view.ast().expect("document").blocks.len()
    );
}

#[test]
fn many_structure_writes_cost_one_rebuild() {
    let (clock, mut view) = tree_with("start");
    let requests = clock.requests();
    for i in 0..50 {
        view.append_text(&format!(" word{i}")).expect("parse");
    }
    view.set_text_size(TextSize {
        width: None,
        height: Some(3),
    });
    view.set_strict_label_mode(true);
    assert_eq!(clock.requests(), requests + 1);

    assert!(clock.take_frame());
    assert!(view.on_frame());
    assert!(!clock.take_frame());
    assert!(!view.on_frame());
    assert_eq!(view.rebuild_count(), 2);
    assert_eq!(view.block_widget_count(), 1);
}

#[test]
fn strict_height_clips_the_content() {
    let (clock, mut view) = tree_with("one\n\ntwo\n\nthree\n");
    view.set_text_size(TextSize {
        width: None,
        height: Some(1),
    });
    assert!(view.is_rebuild_pending());
    assert!(clock.take_frame());
    view.on_frame();
    // Height alone clips nothing until strict label mode is on.
    assert_eq!(view.content_size(10).height, 5);

    view.set_strict_label_mode(true);
    view.force_rebuild().expect("rebuild");
    assert_eq!(view.content_size(10).height, 1);
    assert_eq!(view.block_widget_count(), 3);
}

#[test]
fn unsupported_blocks_render_placeholders() {
    let (_clock, view) = tree_with("<div>\nraw\n</div>\n\nafter\n");
    let labels: Vec<_> = view.labels().map(|(_, l)| l.clone()).collect();
    assert_eq!(labels[0].role, LabelRole::Placeholder);
    assert!(labels[0].text.contains("html"));
    assert_eq!(labels[1].text, "after");
}

#[test]
fn deep_nesting_is_truncated() {
    let mut md = String::new();
    for depth in 0..30 {
        md.push_str(&">".repeat(depth + 1));
        md.push_str(" level\n");
    }
    let (_clock, view) = tree_with(&md);
    assert!(view.labels().any(|(_, l)| l.role == LabelRole::Placeholder));
    assert!(view.widget_ids().len() < 200);
}
