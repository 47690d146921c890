//! Estimate line items derived from annotations
//!
//! The canvas publishes line items through an [`EstimateSink`]. The hosting
//! application usually forwards them to its project store;
//! [`EstimateLedger`] is the in-memory sink used by the CLI and tests.

use serde::{Deserialize, Serialize};

use crate::annotation::AnnotationId;

/// Category assigned to every manually measured line item
pub const MANUAL_TAKEOFF_CATEGORY: &str = "Manual Takeoff";

/// One estimate row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Same as the source annotation ID
    pub id: AnnotationId,
    pub description: String,
    pub quantity: f64,
    pub unit: String,
    pub category: String,
    pub unit_cost: f64,
    pub total_cost: f64,
    pub notes: String,
    /// Sheet the measurement was taken on
    pub page: u32,
}

impl LineItem {
    /// Change the unit cost and recompute the total
    pub fn set_unit_cost(&mut self, unit_cost: f64) {
        self.unit_cost = unit_cost;
        self.total_cost = round_to(self.quantity * unit_cost, 2);
    }
}

/// Round to a fixed number of decimal places
pub(crate) fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Receiver of line item changes
pub trait EstimateSink {
    /// Insert a new line item or replace the one with the same ID
    ///
    /// The item replaces the stored row whole. When the canvas re-derives a
    /// row it first reads [`EstimateSink::current`] to carry the unit cost
    /// and user notes over; sinks that cannot answer lose those edits.
    fn upsert(&mut self, item: LineItem);

    /// Remove the line item with this ID, if present
    fn remove(&mut self, id: AnnotationId);

    /// The stored row for `id`, if the sink can read it back
    fn current(&self, _id: AnnotationId) -> Option<LineItem> {
        None
    }
}

/// In-memory estimate, ordered by first insertion
#[derive(Debug, Clone, Default)]
pub struct EstimateLedger {
    items: Vec<LineItem>,
}

impl EstimateLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn get(&self, id: AnnotationId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all line item totals
    pub fn total_cost(&self) -> f64 {
        round_to(self.items.iter().map(|item| item.total_cost).sum(), 2)
    }
}

impl EstimateSink for EstimateLedger {
    fn upsert(&mut self, item: LineItem) {
        match self.items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    fn remove(&mut self, id: AnnotationId) {
        self.items.retain(|item| item.id != id);
    }

    fn current(&self, id: AnnotationId) -> Option<LineItem> {
        self.get(id).cloned()
    }
}
