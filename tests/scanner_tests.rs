use label_improver::browser::page::PageElement;
use label_improver::scanner::action_model::ActionKind;
use label_improver::scanner::action_model::Action;
use label_improver::scanner::annotate::{annotate_screenshot, badge_size, marker_color, place_badges};
use label_improver::scanner::error::ScanError;
use label_improver::scanner::scanner::{
    MAX_LABEL_CHARS, ScanOptions, build_actions, classify_kind, resolve_label, scan,
};

use crate::common::{FakePage, bounds, button, dialog_page, link, white_png};

mod common;

const PAGE: (u32, u32) = (300, 200);

fn element(tag: &str) -> PageElement {
    PageElement {
        tag: tag.into(),
        selector: tag.into(),
        bounds: bounds(0.0, 0.0, 10.0, 10.0),
        visible: true,
        ..Default::default()
    }
}

// ============================================================================
// Kind classification
// ============================================================================

#[test]
fn classify_by_tag() {
    assert_eq!(classify_kind(&element("a")), ActionKind::Link);
    assert_eq!(classify_kind(&element("button")), ActionKind::Button);
    assert_eq!(classify_kind(&element("select")), ActionKind::Select);
    assert_eq!(classify_kind(&element("textarea")), ActionKind::Textarea);
    assert_eq!(classify_kind(&element("div")), ActionKind::Clickable);
}

#[test]
fn classify_input_by_type() {
    let mut el = element("input");
    assert_eq!(classify_kind(&el), ActionKind::Input);

    el.input_type = Some("checkbox".into());
    assert_eq!(classify_kind(&el), ActionKind::Checkbox);

    el.input_type = Some("Radio".into());
    assert_eq!(classify_kind(&el), ActionKind::Radio);

    el.input_type = Some("submit".into());
    assert_eq!(classify_kind(&el), ActionKind::Button);

    el.input_type = Some("email".into());
    assert_eq!(classify_kind(&el), ActionKind::Input);
}

#[test]
fn aria_role_overrides_tag() {
    let mut el = element("div");
    el.role = Some("button".into());
    assert_eq!(classify_kind(&el), ActionKind::Button);

    let mut anchor = element("a");
    anchor.role = Some("tab".into());
    assert_eq!(classify_kind(&anchor), ActionKind::Button);

    let mut unknown_role = element("a");
    unknown_role.role = Some("presentation".into());
    assert_eq!(classify_kind(&unknown_role), ActionKind::Link);
}

// ============================================================================
// Label resolution
// ============================================================================

#[test]
fn label_prefers_aria_naming_over_content() {
    let mut el = element("button");
    el.text = Some("X".into());
    el.aria_label = Some("Close".into());
    assert_eq!(resolve_label(&el), "Close");

    el.labelled_by_text = Some("Dismiss banner".into());
    assert_eq!(resolve_label(&el), "Dismiss banner");
}

#[test]
fn label_falls_back_to_placeholder() {
    let mut el = element("input");
    el.placeholder = Some("Search docs".into());
    assert_eq!(resolve_label(&el), "Search docs");

    el.label_text = Some("Query".into());
    assert_eq!(resolve_label(&el), "Query");
}

#[test]
fn label_skips_blank_sources_and_collapses_whitespace() {
    let mut el = element("a");
    el.aria_label = Some("   ".into());
    el.text = Some("  Read\n   more  ".into());
    assert_eq!(resolve_label(&el), "Read more");
}

#[test]
fn select_label_ignores_option_text() {
    let mut el = element("select");
    el.text = Some("Option A Option B Option C".into());
    el.value = Some("Option B".into());
    assert_eq!(resolve_label(&el), "Option B");

    el.label_text = Some("Country".into());
    assert_eq!(resolve_label(&el), "Country");

    el.label_text = None;
    el.value = None;
    assert_eq!(resolve_label(&el), "");
}

#[test]
fn label_empty_when_no_source() {
    assert_eq!(resolve_label(&element("button")), "");
}

#[test]
fn long_labels_are_truncated() {
    let mut el = element("a");
    el.text = Some("word ".repeat(100));
    let label = resolve_label(&el);
    assert_eq!(label.chars().count(), MAX_LABEL_CHARS);
    assert!(label.ends_with('…'));
}

// ============================================================================
// Action list
// ============================================================================

#[test]
fn indices_are_contiguous_after_filtering() {
    let mut hidden = button("Hidden", "#hidden", bounds(0.0, 0.0, 10.0, 10.0));
    hidden.visible = false;
    let collapsed = button("Zero", "#zero", bounds(0.0, 0.0, 0.0, 10.0));

    let elements = vec![
        link("Home", "#home", bounds(0.0, 0.0, 40.0, 20.0)),
        hidden,
        button("Go", "#go", bounds(50.0, 0.0, 40.0, 20.0)),
        collapsed,
        link("About", "#about", bounds(100.0, 0.0, 40.0, 20.0)),
    ];

    let actions = build_actions(&elements, PAGE);
    assert_eq!(actions.len(), 3);
    for (i, action) in actions.iter().enumerate() {
        assert_eq!(action.index, i);
    }
    let labels: Vec<_> = actions.iter().map(|a| a.label.as_str()).collect();
    assert_eq!(labels, vec!["Home", "Go", "About"]);
}

#[test]
fn off_page_elements_get_no_index() {
    let elements = vec![
        link("Skip to content", "a.skip", bounds(-9999.0, 0.0, 120.0, 20.0)),
        link("Back to top", "a.top", bounds(0.0, -40.0, 80.0, 20.0)),
        button("Menu", "#menu", bounds(0.0, 0.0, 40.0, 40.0)),
        button("Below", "#below", bounds(10.0, 200.0, 40.0, 20.0)),
        button("Past edge", "#right", bounds(300.0, 10.0, 40.0, 20.0)),
        button("Straddling", "#straddle", bounds(-20.0, 60.0, 40.0, 20.0)),
    ];

    let actions = build_actions(&elements, PAGE);
    let labels: Vec<_> = actions.iter().map(|a| a.label.as_str()).collect();
    assert_eq!(labels, vec!["Menu", "Straddling"]);
    assert_eq!(actions[0].index, 0);
}

#[test]
fn skip_link_does_not_mark_the_control_underneath() {
    let mut page = FakePage::new(
        "Nav",
        vec![
            link("Skip to content", "a.skip", bounds(-9999.0, 0.0, 120.0, 20.0)),
            button("Menu", "#menu", bounds(0.0, 0.0, 40.0, 40.0)),
        ],
    );
    let output = scan(&mut page, "https://example.com", &ScanOptions::default()).unwrap();

    assert_eq!(output.actions.len(), 1);
    assert_eq!(output.actions[0].label, "Menu");
    let img = image::load_from_memory(&output.annotated_screenshot)
        .unwrap()
        .to_rgba8();
    assert_eq!(*img.get_pixel(1, 1), marker_color(0));
}

#[test]
fn stable_id_uses_dom_id_then_test_id() {
    let mut a = button("One", "#one", bounds(0.0, 0.0, 10.0, 10.0));
    a.dom_id = Some("one".into());
    let mut b = button("Two", "button", bounds(0.0, 0.0, 10.0, 10.0));
    b.dom_id = Some("".into());
    b.test_id = Some("two-btn".into());
    let c = button("Three", "button", bounds(0.0, 0.0, 10.0, 10.0));

    let actions = build_actions(&[a, b, c], PAGE);
    assert_eq!(actions[0].id.as_deref(), Some("one"));
    assert_eq!(actions[1].id.as_deref(), Some("two-btn"));
    assert_eq!(actions[2].id, None);
}

// ============================================================================
// Scan
// ============================================================================

#[test]
fn scan_collects_actions_title_and_screenshots() {
    let mut page = dialog_page();
    let output = scan(&mut page, "https://example.com/dialog", &ScanOptions::default()).unwrap();

    assert_eq!(page.navigated_to, vec!["https://example.com/dialog".to_string()]);
    assert_eq!(output.page_title, "Dialog Demo");
    assert_eq!(output.actions.len(), 3);
    assert_eq!(output.actions[0].label, "Submit");
    assert_eq!(output.actions[1].label, "");
    assert_eq!(output.actions[2].label, "X");
    assert_eq!(output.raw_screenshot, page.screenshot);
    assert_ne!(output.annotated_screenshot, output.raw_screenshot);
}

#[test]
fn scan_of_page_without_elements_is_valid_and_empty() {
    let mut page = FakePage::new("Static", vec![]);
    let output = scan(&mut page, "https://example.com", &ScanOptions::default()).unwrap();
    assert!(output.actions.is_empty());
    assert_eq!(output.annotated_screenshot, output.raw_screenshot);
}

#[test]
fn scan_navigation_failure_is_scan_error() {
    let mut page = FakePage::unreachable("net::ERR_NAME_NOT_RESOLVED");
    let err = scan(&mut page, "https://nope.invalid", &ScanOptions::default()).unwrap_err();
    match err {
        ScanError::Navigation { url, .. } => assert_eq!(url, "https://nope.invalid"),
        other => panic!("Expected Navigation error, got {:?}", other),
    }
}

#[test]
fn scan_rejects_relative_and_unsupported_urls() {
    let mut page = dialog_page();
    assert!(matches!(
        scan(&mut page, "example.com", &ScanOptions::default()),
        Err(ScanError::InvalidUrl { .. })
    ));
    assert!(matches!(
        scan(&mut page, "ftp://example.com", &ScanOptions::default()),
        Err(ScanError::InvalidUrl { .. })
    ));
    assert!(page.navigated_to.is_empty());
}

#[test]
fn undecodable_screenshot_is_scan_error() {
    let mut page = dialog_page();
    page.screenshot = b"not a png".to_vec();
    let err = scan(&mut page, "https://example.com", &ScanOptions::default()).unwrap_err();
    assert!(matches!(err, ScanError::Annotate(_)));
}

// ============================================================================
// Annotation
// ============================================================================

#[test]
fn annotation_paints_a_badge_per_action() {
    let mut page = dialog_page();
    let output = scan(&mut page, "https://example.com", &ScanOptions::default()).unwrap();
    let img = image::load_from_memory(&output.annotated_screenshot)
        .unwrap()
        .to_rgba8();

    assert_eq!((img.width(), img.height()), (300, 200));

    // Action 0 has room above its box: badge sits at y = 40 - badge height
    let (_, badge_h) = badge_size("0");
    let top = (40 - badge_h) as u32;
    assert_eq!(*img.get_pixel(11, top + 1), marker_color(0));

    // Action 1 touches the top edge: badge moves inside the box
    assert_eq!(*img.get_pixel(201, 6), marker_color(1));
    assert_eq!(*img.get_pixel(241, 6), marker_color(2));

    // Outline of action 0, bottom-left corner
    assert_eq!(*img.get_pixel(10, 69), marker_color(0));

    // Untouched background
    assert_eq!(*img.get_pixel(150, 150), image::Rgba([255, 255, 255, 255]));
}

#[test]
fn badges_stay_inside_the_image() {
    let png = white_png(100, 100);
    let corner = build_actions(&[button("Corner", "#corner", bounds(90.0, 90.0, 40.0, 40.0))], (100, 100));
    assert_eq!(corner.len(), 1);

    let badges = place_badges(&corner, 100, 100);
    let badge = badges[0];
    assert!(badge.x >= 0 && badge.y >= 0);
    assert!(badge.x + badge.width <= 100 && badge.y + badge.height <= 100);

    let annotated = annotate_screenshot(&png, &corner).unwrap();
    let img = image::load_from_memory(&annotated).unwrap().to_rgba8();
    assert_eq!(*img.get_pixel(badge.x as u32 + 1, badge.y as u32 + 1), marker_color(0));
}

fn shared_box_actions() -> Vec<Action> {
    let at = bounds(50.0, 60.0, 80.0, 30.0);
    build_actions(&[link("Account", "nav > a", at), button("Account", "nav > a > button", at)], PAGE)
}

fn has_glyph_pixel(img: &image::RgbaImage, x: i32, y: i32, w: i32, h: i32) -> bool {
    (y..y + h).any(|py| (x..x + w).any(|px| *img.get_pixel(px as u32, py as u32) == image::Rgba([255, 255, 255, 255])))
}

#[test]
fn nested_elements_sharing_a_box_both_keep_their_badge() {
    let actions = shared_box_actions();
    assert_eq!(actions.len(), 2);

    let badges = place_badges(&actions, PAGE.0, PAGE.1);
    assert_eq!(badges.len(), 2);
    assert!(!badges[0].overlaps(&badges[1]));

    let annotated = annotate_screenshot(&white_png(PAGE.0, PAGE.1), &actions).unwrap();
    let img = image::load_from_memory(&annotated).unwrap().to_rgba8();
    for badge in &badges {
        assert_eq!(
            *img.get_pixel(badge.x as u32 + 1, badge.y as u32 + 1),
            marker_color(badge.index)
        );
        assert!(has_glyph_pixel(&img, badge.x, badge.y, badge.width, badge.height));
    }

    let only_second = annotate_screenshot(&white_png(PAGE.0, PAGE.1), &actions[1..]).unwrap();
    assert_ne!(annotated, only_second);
}

#[test]
fn dense_toolbar_badges_do_not_overlap() {
    let elements: Vec<_> = (0..14)
        .map(|i| button("", &format!("#tool-{}", i), bounds(4.0 + i as f64 * 20.0, 40.0, 18.0, 18.0)))
        .collect();
    let actions = build_actions(&elements, PAGE);
    assert_eq!(actions.len(), 14);

    let badges = place_badges(&actions, PAGE.0, PAGE.1);
    for (i, a) in badges.iter().enumerate() {
        assert_eq!(a.index, i);
        assert!(a.x >= 0 && a.y >= 0 && a.x + a.width <= PAGE.0 as i32 && a.y + a.height <= PAGE.1 as i32);
        for b in &badges[i + 1..] {
            assert!(!a.overlaps(b), "badge {} overlaps badge {}", a.index, b.index);
        }
    }
    // Two-digit badges are wider than one-digit ones
    assert!(badges[10].width > badges[9].width);
}

#[test]
fn marker_colors_cycle() {
    assert_ne!(marker_color(0), marker_color(1));
    assert_eq!(marker_color(0), marker_color(6));
}
