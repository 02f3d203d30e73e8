//! Browser checks for the DOM adapter
#![cfg(target_arch = "wasm32")]

use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{Element, Node};

use clearcost::web::DomTree;
use clearcost::{Badge, ClearCostConfig, DocumentTree, ScanOrchestrator};

wasm_bindgen_test_configure!(run_in_browser);

fn fixture(html: &str) -> (DomTree, Element) {
    let document = web_sys::window().unwrap().document().unwrap();
    let body = document.body().unwrap();
    let host = document.create_element("div").unwrap();
    host.set_inner_html(html);
    body.append_child(&host).unwrap();
    (DomTree::new(document, body, "clearcost"), host)
}

#[wasm_bindgen_test]
fn test_insert_annotation_after_reference() {
    let (mut tree, host) = fixture("<span>$0.25/oz</span><span>next</span>");
    let span: Node = host.first_child().unwrap();
    let badge = Badge { text: " ($4.00/lb)".to_string(), redundant: false };

    let before = tree.count_marked_nodes();
    let marker = tree.insert_annotation(&span, &badge).unwrap();

    assert_eq!(span.next_sibling(), Some(marker.clone()));
    assert!(tree.has_marker(&marker));
    assert_eq!(tree.count_marked_nodes(), before + 1);
    let element = marker.dyn_into::<Element>().unwrap();
    assert_eq!(element.class_name(), "clearcost chip");
    assert_eq!(element.text_content().unwrap(), " ($4.00/lb)");
    host.remove();
}

#[wasm_bindgen_test]
fn test_orchestrator_over_live_dom() {
    let (mut tree, host) = fixture("<li><h3>Ground Coffee 12 oz</h3><span>$4.99</span></li>");
    let mut orchestrator: ScanOrchestrator<Node> = ScanOrchestrator::new(&ClearCostConfig::default()).unwrap();

    orchestrator.scan(&tree);
    orchestrator.run_pending(&mut tree);

    let badges = host.get_elements_by_class_name("clearcost");
    assert_eq!(badges.length(), 1);
    assert_eq!(badges.item(0).unwrap().text_content().unwrap(), " ($6.65/lb)");
    host.remove();
}
