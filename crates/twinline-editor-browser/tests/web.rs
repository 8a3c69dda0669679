//! WASM browser tests for twinline-editor-browser.
//!
//! Run with: `wasm-pack test --headless --firefox` or `--chrome`

#![cfg(all(target_family = "wasm", target_os = "unknown"))]

use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::HtmlElement;

wasm_bindgen_test_configure!(run_in_browser);

use twinline_editor_browser::surface::{EMPTY_CLASS, PLACEHOLDER_ATTR};
use twinline_editor_browser::{
    BrowserClipboard, ClipboardPlatform, Direction, DomSession, DomSurface, EditorConfig,
    EditorSession, Selection, Surface, TwinlineEditor, platform,
};

fn make_root() -> HtmlElement {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .expect("document");
    let root: HtmlElement = document
        .create_element("div")
        .expect("create div")
        .dyn_into()
        .expect("html element");
    root.set_attribute("contenteditable", "true")
        .expect("contenteditable");
    document
        .body()
        .expect("body")
        .append_child(&root)
        .expect("append root");
    root
}

fn make_session(text: &str) -> (HtmlElement, DomSession) {
    let root = make_root();
    let mut session: DomSession =
        EditorSession::new(EditorConfig::new().with_default_direction(Direction::Ltr));
    session.set_content(text);
    session.attach(DomSurface::new(root.clone()));
    (root, session)
}

fn block_span(root: &HtmlElement, index: u32) -> web_sys::Element {
    root.child_nodes()
        .get(index)
        .expect("block node")
        .dyn_into()
        .expect("block element")
}

// === Surface tests ===

#[wasm_bindgen_test]
fn test_blocks_materialize_as_spans() {
    let (root, _session) = make_session("plain\nשלום *עולם*");
    assert_eq!(root.child_nodes().length(), 2);

    let first = block_span(&root, 0);
    assert_eq!(first.tag_name().to_lowercase(), "span");
    assert_eq!(first.get_attribute("dir").as_deref(), Some("ltr"));
    assert_eq!(first.get_attribute("data-original").as_deref(), Some("plain"));

    let second = block_span(&root, 1);
    assert_eq!(second.get_attribute("dir").as_deref(), Some("rtl"));
    assert_eq!(
        second.get_attribute("data-original").as_deref(),
        Some("שלום *עולם*")
    );
}

#[wasm_bindgen_test]
fn test_surface_runs_match_model() {
    let (_root, session) = make_session("a *b* `c`\n");
    let surface = session.surface().expect("attached");
    for (index, block) in session.blocks().iter().enumerate() {
        assert_eq!(surface.runs(index), block.runs());
    }
    // the empty block shows a placeholder glyph but reports no text
    assert_eq!(surface.runs(1), vec![String::new()]);
}

#[wasm_bindgen_test]
fn test_selection_round_trip() {
    let (_root, mut session) = make_session("hello\nworld");
    assert!(session.set_selection_range(8, 8));
    assert_eq!(session.selection(), Some(Selection::collapsed(8)));

    assert!(session.set_selection_range(2, 9));
    assert_eq!(session.selection(), Some(Selection::new(2, 9)));
}

#[wasm_bindgen_test]
fn test_selection_change_shows_raw_source() {
    let (root, mut session) = make_session("**bold** text\nnext");
    assert!(session.set_selection_range(0, 0));
    assert!(session.on_selection_change());
    assert_eq!(
        block_span(&root, 0).text_content().as_deref(),
        Some("**bold** text")
    );
    // restoring the caret does not toggle anything again
    assert!(!session.on_selection_change());
}

#[wasm_bindgen_test]
fn test_enter_splits_in_dom() {
    let (root, mut session) = make_session("hello world");
    assert!(session.set_selection_range(0, 0));
    session.on_selection_change();
    assert!(session.set_selection_range(5, 5));
    assert!(session.enter());
    assert_eq!(root.child_nodes().length(), 2);
    assert_eq!(session.content(), "hello\n world");
    assert_eq!(session.selection(), Some(Selection::collapsed(6)));
}

#[wasm_bindgen_test]
fn test_placeholder_class() {
    let (root, mut session) = make_session("");
    session.set_placeholder("Type here");
    assert_eq!(
        root.get_attribute(PLACEHOLDER_ATTR).as_deref(),
        Some("Type here")
    );
    assert!(root.class_list().contains(EMPTY_CLASS));

    session.set_content("x");
    assert!(!root.class_list().contains(EMPTY_CLASS));
}

// === Clipboard tests ===

#[wasm_bindgen_test]
fn test_empty_clipboard_reads_nothing() {
    let clipboard = BrowserClipboard::empty();
    clipboard.write_text("ignored");
    assert_eq!(clipboard.read_text(), None);
}

// === Bindings ===

#[wasm_bindgen_test]
fn test_editor_value_and_markup() {
    let root = make_root();
    let mut editor = TwinlineEditor::new();
    editor.set_value("early");
    assert_eq!(editor.value().ok().as_deref(), Some("early"));

    editor.mount(&root, None).ok().expect("mount");
    assert!(editor.is_mounted());
    assert_eq!(root.child_nodes().length(), 1);

    assert_eq!(editor.set_attribute("default-direction", Some("ltr".into())).ok(), Some(true));
    assert_eq!(
        editor.to_markup().ok().as_deref(),
        Some("<span dir=\"ltr\" data-original=\"early\"><p>early</p></span>")
    );

    editor.unmount();
    assert!(!editor.is_mounted());
    editor.set_value("later");
    assert_eq!(editor.value().ok().as_deref(), Some("later"));
}

#[wasm_bindgen_test]
fn test_platform_detection() {
    let plat = platform();
    // Actual values depend on the browser running the test.
    let _ = plat.mac;
    let _ = plat.ios;
    let _ = plat.primary_is_meta();
}
