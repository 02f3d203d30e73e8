//! AnnotationEngine - decides where a unit-price badge goes
//!
//! `process(node)`:
//! 1. Skip if the node, a descendant, or an ancestor already has a marker,
//!    or a badge already sits right after the node or one of its ancestors
//! 2. Explicit rate spanning the node's whole text → badge after the node
//! 3. Composite price + quantity in the node's text → badge after the first
//!    text node (document order) containing the price, else after the node
//! 4. Explicit rate on each direct child element, first match wins
//!
//! Recognizer, conversion and insertion failures at one step fall through to
//! the next; only the ceiling ends `process` early.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::config::ClearCostConfig;
use super::orchestrator::ScanSession;
use super::tree::{Badge, DocumentTree};
use crate::pricing::{PriceCalculator, PriceCortex, PriceError, PriceExpression, UnitPrice, UnitTable};

// ==================== TYPE DEFINITIONS ====================

/// Which step of `process` produced the placement
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStrategy {
    /// The node's whole text is an explicit rate
    LeafExact,
    /// Composite match, badge after the text node holding the price
    Composite,
    /// Composite match, no text node held the price literal
    CompositeFallback,
    /// A direct child element's whole text is an explicit rate
    ChildLeafExact,
}

/// A badge that was inserted
#[derive(Clone, Debug, PartialEq)]
pub struct Placement<N> {
    /// Node the badge was inserted after
    pub target: N,
    /// The inserted badge node
    pub marker: N,
    pub strategy: PlacementStrategy,
    pub expression: PriceExpression,
    pub unit_price: UnitPrice,
}

/// Tree-free analysis of a single string
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Analysis {
    pub expression: PriceExpression,
    pub unit_price: UnitPrice,
    pub badge: Badge,
}

// ==================== MAIN IMPLEMENTATION ====================

/// Price recognition plus idempotent placement over a `DocumentTree`
#[derive(Debug, Clone)]
pub struct AnnotationEngine {
    cortex: PriceCortex,
    calculator: PriceCalculator,
    max_depth: usize,
}

impl AnnotationEngine {
    pub fn new(table: UnitTable, max_depth: usize) -> Result<Self, PriceError> {
        let table = Arc::new(table);
        Ok(Self {
            cortex: PriceCortex::new(Arc::clone(&table))?,
            calculator: PriceCalculator::new(table),
            max_depth,
        })
    }

    pub fn from_config(config: &ClearCostConfig) -> Result<Self, PriceError> {
        Self::new(UnitTable::standard(), config.max_depth)
    }

    pub fn cortex(&self) -> &PriceCortex {
        &self.cortex
    }

    pub fn calculator(&self) -> &PriceCalculator {
        &self.calculator
    }

    /// Explicit rate (whole text) first, then composite
    pub fn analyze(&self, text: &str) -> Result<Analysis, PriceError> {
        let (expression, unit_price) = match self.leaf_exact(text) {
            Ok(found) => found,
            Err(_) => self.composite(text)?,
        };
        let badge = Badge::for_price(&unit_price);
        Ok(Analysis {
            expression,
            unit_price,
            badge,
        })
    }

    fn leaf_exact(&self, text: &str) -> Result<(PriceExpression, UnitPrice), PriceError> {
        let expr = self.cortex.parse_explicit_rate(text)?;
        let price = self.calculator.compute_expression(&expr)?;
        Ok((expr, price))
    }

    fn composite(&self, text: &str) -> Result<(PriceExpression, UnitPrice), PriceError> {
        let expr = self.cortex.parse_composite(text)?;
        let price = self.calculator.compute_expression(&expr)?;
        Ok((expr, price))
    }

    // ----- idempotence guard -----

    /// True if `node`, any descendant, or any ancestor carries the marker,
    /// or if `node` or an ancestor is immediately followed by a badge (badges
    /// are inserted as the next sibling of what they annotate).
    /// Walks beyond `max_depth` count as "no marker".
    pub fn has_marker_nearby<T: DocumentTree>(&self, tree: &T, node: &T::Node) -> bool {
        is_marked_or_badged(tree, node)
            || self.has_marked_descendant(tree, node, 0)
            || self.has_marked_ancestor(tree, node)
    }

    fn has_marked_descendant<T: DocumentTree>(&self, tree: &T, node: &T::Node, depth: usize) -> bool {
        if depth >= self.max_depth {
            return false;
        }
        tree.children(node)
            .iter()
            .any(|child| tree.has_marker(child) || self.has_marked_descendant(tree, child, depth + 1))
    }

    fn has_marked_ancestor<T: DocumentTree>(&self, tree: &T, node: &T::Node) -> bool {
        let mut current = tree.parent(node);
        let mut steps = 0;
        while let Some(ancestor) = current {
            if steps >= self.max_depth {
                return false;
            }
            if is_marked_or_badged(tree, &ancestor) {
                return true;
            }
            current = tree.parent(&ancestor);
            steps += 1;
        }
        false
    }

    // ----- placement search -----

    /// First text node at or below `node` (document order) whose content
    /// contains `literal`
    pub fn find_price_node<T: DocumentTree>(&self, tree: &T, node: &T::Node, literal: &str) -> Option<T::Node> {
        self.find_price_node_at(tree, node, literal, 0)
    }

    fn find_price_node_at<T: DocumentTree>(
        &self,
        tree: &T,
        node: &T::Node,
        literal: &str,
        depth: usize,
    ) -> Option<T::Node> {
        if tree.is_text(node) {
            return tree.text_content(node).contains(literal).then(|| node.clone());
        }
        if depth >= self.max_depth {
            return None;
        }
        tree.children(node)
            .iter()
            .find_map(|child| self.find_price_node_at(tree, child, literal, depth + 1))
    }

    // ----- process -----

    /// Annotate the price expression found in or directly under `node`
    pub fn process<T: DocumentTree>(
        &self,
        tree: &mut T,
        node: &T::Node,
        session: &mut ScanSession,
    ) -> Result<Placement<T::Node>, PriceError> {
        if !tree.is_attached(node) {
            return Err(PriceError::Detached);
        }
        if self.has_marker_nearby(&*tree, node) {
            return Err(PriceError::AlreadyAnnotated);
        }

        let text = tree.text_content(node);

        match self.leaf_exact(&text) {
            Ok((expr, price)) => {
                match self.place(tree, node.clone(), PlacementStrategy::LeafExact, expr, price, session) {
                    Ok(placement) => return Ok(placement),
                    Err(err) => fall_through(node, err)?,
                }
            }
            Err(err) => note_failure(node, &err),
        }

        match self.composite(&text) {
            Ok((expr, price)) => {
                let (target, strategy) = match self.find_price_node(&*tree, node, &expr.price_literal) {
                    Some(price_node) => (price_node, PlacementStrategy::Composite),
                    None => (node.clone(), PlacementStrategy::CompositeFallback),
                };
                match self.place(tree, target, strategy, expr, price, session) {
                    Ok(placement) => return Ok(placement),
                    Err(err) => fall_through(node, err)?,
                }
            }
            Err(err) => note_failure(node, &err),
        }

        // One level down, explicit rates only
        for child in tree.children(node) {
            if !tree.is_element(&child) {
                continue;
            }
            let child_text = tree.text_content(&child);
            match self.leaf_exact(&child_text) {
                Ok((expr, price)) => {
                    match self.place(tree, child.clone(), PlacementStrategy::ChildLeafExact, expr, price, session) {
                        Ok(placement) => return Ok(placement),
                        Err(err) => fall_through(&child, err)?,
                    }
                }
                Err(err) => note_failure(&child, &err),
            }
        }

        Err(PriceError::NoMatch)
    }

    /// Insert a badge after `target`. The ceiling, attachment and marker
    /// guard are all re-checked against the tree as it is now.
    pub(crate) fn place<T: DocumentTree>(
        &self,
        tree: &mut T,
        target: T::Node,
        strategy: PlacementStrategy,
        expression: PriceExpression,
        unit_price: UnitPrice,
        session: &mut ScanSession,
    ) -> Result<Placement<T::Node>, PriceError> {
        session.check_ceiling()?;
        if !tree.is_attached(&target) {
            return Err(PriceError::Detached);
        }
        if self.has_marker_nearby(&*tree, &target) {
            return Err(PriceError::AlreadyAnnotated);
        }

        let badge = Badge::for_price(&unit_price);
        let marker = tree.insert_annotation(&target, &badge)?;
        session.record_annotation();
        log::debug!("Added a price tag{} to {:?}", badge.text, target);

        Ok(Placement {
            target,
            marker,
            strategy,
            expression,
            unit_price,
        })
    }
}

fn is_marked_or_badged<T: DocumentTree>(tree: &T, node: &T::Node) -> bool {
    tree.has_marker(node)
        || tree
            .next_sibling(node)
            .map_or(false, |sibling| tree.has_marker(&sibling))
}

/// A failed placement ends `process` only at the ceiling; anything else
/// moves on to the next step or child
fn fall_through<N: std::fmt::Debug>(node: &N, err: PriceError) -> Result<(), PriceError> {
    if let PriceError::CeilingExceeded { .. } = err {
        return Err(err);
    }
    note_failure(node, &err);
    Ok(())
}

fn note_failure<N: std::fmt::Debug>(node: &N, err: &PriceError) {
    if err.is_silent() {
        log::trace!("{:?}: {}", node, err);
    } else {
        log::warn!("Failed to process element {:?}: {}", node, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> AnnotationEngine {
        AnnotationEngine::new(UnitTable::standard(), 16).unwrap()
    }

    #[test]
    fn test_analyze_explicit_rate() {
        let analysis = engine().analyze("$0.25/oz").unwrap();
        assert_eq!(analysis.unit_price.value, 4.0);
        assert_eq!(analysis.badge.text, " ($4.00/lb)");
        assert!(!analysis.badge.redundant);
    }

    #[test]
    fn test_analyze_composite() {
        let analysis = engine().analyze("$4.99 for 12 oz").unwrap();
        assert_eq!(analysis.badge.text, " ($6.65/lb)");
    }

    #[test]
    fn test_analyze_price_without_unit() {
        assert_eq!(engine().analyze("$4.99"), Err(PriceError::NoMatch));
    }

    #[test]
    fn test_analyze_redundant_unit() {
        let analysis = engine().analyze("$3.49/lb").unwrap();
        assert!(analysis.badge.redundant);
        assert_eq!(analysis.badge.text, " ($3.49/lb)");
    }
}
