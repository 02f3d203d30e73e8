//! Browser surface: the exported `ClearCost` class
//!
//! Each scan pass enqueues one task per candidate element; every task gets
//! its own `requestAnimationFrame` callback so the page stays responsive.
//! `watch()` adds a `MutationObserver` (childList + subtree) on the body that
//! rescans on every change.
//!
//! # Usage
//! ```javascript,ignore
//! const clearcost = new ClearCost(null);
//! clearcost.watch();
//! console.log(clearcost.annotationCount());
//! ```

pub mod dom;

pub use dom::DomTree;

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{MutationObserver, MutationObserverInit, Node};

use crate::annotate::config::ClearCostConfig;
use crate::annotate::orchestrator::{ScanOrchestrator, ScanReport};
use crate::annotate::tree::DocumentTree;
use crate::logging::init_logging;
use crate::pricing::PriceError;

fn to_js(err: PriceError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

struct Inner {
    tree: DomTree,
    orchestrator: ScanOrchestrator<Node>,
}

type Shared = Rc<RefCell<Inner>>;

/// Queue one animation-frame callback per scheduled task
fn schedule_tasks(inner: &Shared, count: usize) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window available"))?;
    for _ in 0..count {
        let inner = Rc::clone(inner);
        let callback = Closure::once_into_js(move || run_one(&inner));
        window.request_animation_frame(callback.unchecked_ref())?;
    }
    Ok(())
}

fn run_one(inner: &Shared) {
    match inner.try_borrow_mut() {
        Ok(mut guard) => {
            let Inner { tree, orchestrator } = &mut *guard;
            orchestrator.run_next(tree);
        }
        Err(_) => log::debug!("Engine busy, task left in queue"),
    }
}

fn report_to_js(report: &ScanReport) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(report).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen]
pub struct ClearCost {
    inner: Shared,
    observer: Option<MutationObserver>,
    on_mutation: Option<Closure<dyn FnMut(js_sys::Array, MutationObserver)>>,
}

#[wasm_bindgen]
impl ClearCost {
    /// `config` may be `null`/`undefined` for defaults, or a partial
    /// `{ max_annotations, max_depth, marker_class, log_level }` object
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<ClearCost, JsValue> {
        let config: ClearCostConfig = if config.is_null() || config.is_undefined() {
            ClearCostConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?
        };
        init_logging(config.level_filter());

        let tree = DomTree::from_window(&config.marker_class).map_err(to_js)?;
        let orchestrator = ScanOrchestrator::new(&config).map_err(to_js)?;

        Ok(ClearCost {
            inner: Rc::new(RefCell::new(Inner { tree, orchestrator })),
            observer: None,
            on_mutation: None,
        })
    }

    /// One scan pass. Returns the pass report.
    #[wasm_bindgen]
    pub fn scan(&self) -> Result<JsValue, JsValue> {
        let report = {
            let mut guard = self.inner.try_borrow_mut().map_err(|e| JsValue::from_str(&e.to_string()))?;
            let Inner { tree, orchestrator } = &mut *guard;
            orchestrator.scan(&*tree)
        };
        schedule_tasks(&self.inner, report.scheduled)?;
        report_to_js(&report)
    }

    /// Initial scan, then rescan whenever the body's subtree changes
    #[wasm_bindgen]
    pub fn watch(&mut self) -> Result<JsValue, JsValue> {
        if self.observer.is_some() {
            return self.scan();
        }

        let (report, body) = {
            let mut guard = self.inner.try_borrow_mut().map_err(|e| JsValue::from_str(&e.to_string()))?;
            let Inner { tree, orchestrator } = &mut *guard;
            (orchestrator.watch(&*tree), tree.root())
        };
        schedule_tasks(&self.inner, report.scheduled)?;

        let inner = Rc::clone(&self.inner);
        let on_mutation = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
            move |_records: js_sys::Array, _observer: MutationObserver| {
                let report = match inner.try_borrow_mut() {
                    Ok(mut guard) => {
                        let Inner { tree, orchestrator } = &mut *guard;
                        orchestrator.on_change_notification(&*tree)
                    }
                    Err(_) => None,
                };
                if let Some(report) = report {
                    if let Err(e) = schedule_tasks(&inner, report.scheduled) {
                        log::warn!("Failed to schedule tasks: {:?}", e);
                    }
                }
            },
        );

        let observer = MutationObserver::new(on_mutation.as_ref().unchecked_ref())?;
        let options = MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);
        observer.observe_with_options(&body, &options)?;

        self.observer = Some(observer);
        self.on_mutation = Some(on_mutation);
        report_to_js(&report)
    }

    /// Stop rescanning on changes. Already-queued tasks still run.
    #[wasm_bindgen]
    pub fn unwatch(&mut self) {
        if let Some(observer) = self.observer.take() {
            observer.disconnect();
        }
        self.on_mutation = None;
        if let Ok(mut guard) = self.inner.try_borrow_mut() {
            guard.orchestrator.unwatch();
        }
    }

    #[wasm_bindgen(js_name = annotationCount)]
    pub fn annotation_count(&self) -> usize {
        self.inner.borrow().tree.count_marked_nodes()
    }

    /// Tasks not yet run
    #[wasm_bindgen]
    pub fn pending(&self) -> usize {
        self.inner.borrow().orchestrator.pending()
    }

    /// Cumulative scan statistics
    #[wasm_bindgen]
    pub fn stats(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.borrow().orchestrator.stats())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Recognize and convert a single string without touching the page.
    /// `null` when no price expression is found.
    #[wasm_bindgen]
    pub fn analyze(&self, text: &str) -> Result<JsValue, JsValue> {
        let result = self.inner.borrow().orchestrator.engine().analyze(text);
        match result {
            Ok(analysis) => {
                serde_wasm_bindgen::to_value(&analysis).map_err(|e| JsValue::from_str(&e.to_string()))
            }
            Err(err) if err.is_silent() => Ok(JsValue::NULL),
            Err(err) => Err(to_js(err)),
        }
    }
}

impl Drop for ClearCost {
    fn drop(&mut self) {
        if let Some(observer) = self.observer.take() {
            observer.disconnect();
        }
    }
}
