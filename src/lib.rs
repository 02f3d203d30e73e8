//! ClearCost: Unit-Price Detection + Page Annotation Engine
//!
//! A Rust/WASM engine that finds shelf prices on a web page, normalizes them
//! to a per-unit price, and inserts a small badge next to each one.
//!
//! # Architecture
//!
//! ## Pricing Components
//! - `units.rs` - UnitTable: synonyms, canonical units, conversion factors
//! - `parser.rs` - PriceCortex: explicit-rate and composite price recognizers
//! - `calculator.rs` - PriceCalculator: normalized unit price per family
//! - `error.rs` - PriceError taxonomy
//!
//! ## Annotation Components
//! - `config.rs` - ClearCostConfig and defaults
//! - `tree.rs` - DocumentTree: host document collaborator trait
//! - `memory.rs` - MemoryTree: arena-backed tree for native hosts and tests
//! - `placement.rs` - AnnotationEngine: idempotent badge placement
//! - `orchestrator.rs` - ScanOrchestrator: scan passes, ceiling, work queue
//!
//! ## Browser Surface (wasm32 only)
//! - `web/` - DomTree adapter and the exported `ClearCost` class
//! - `logging.rs` - `log` records forwarded to the browser console
//!
//! # Usage (WASM)
//! ```javascript,ignore
//! import init, { ClearCost } from 'clearcost';
//!
//! await init();
//!
//! const clearcost = new ClearCost({ max_annotations: 9000, log_level: 'info' });
//!
//! // Scan now and rescan on every DOM change
//! clearcost.watch();
//!
//! // Tree-free check of a single string
//! const analysis = clearcost.analyze('$4.99 for 12 oz');
//! console.log(analysis.badge.text);  // " ($6.65/lb)"
//! ```

pub mod annotate;
pub mod logging;
pub mod pricing;

#[cfg(target_arch = "wasm32")]
pub mod web;

// Public exports - Pricing
pub use pricing::*;

// Public exports - Annotation
pub use annotate::*;

#[cfg(target_arch = "wasm32")]
pub use web::ClearCost;

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator for smaller WASM bundle size.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    format!("clearcost v{}", env!("CARGO_PKG_VERSION"))
}
