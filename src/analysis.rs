// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Static analyses over computation graphs: maximum integer bit width and
//! sample-based integer ranges, both restricted by filters.

use crate::filter::{EncryptionFilter, OperationFilter, TagFilter};
use crate::graph::{Graph, NodeId};

use core::fmt;
use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// The inclusive `[min, max]` envelope of the values a node was observed
/// to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: i64,
    pub max: i64,
}

impl Bounds {
    pub fn new(min: i64, max: i64) -> Bounds {
        debug_assert!(min <= max, "bounds must be ordered");
        Bounds { min, max }
    }

    /// The degenerate envelope of a single observation.
    pub fn of(value: i64) -> Bounds {
        Bounds {
            min: value,
            max: value,
        }
    }

    /// Widen to cover `value`.
    pub fn include(&mut self, value: i64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Widen to cover everything `other` covers.
    pub fn merge(&mut self, other: Bounds) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Per-node value envelopes measured while evaluating a traced graph over
/// its input set.
///
/// The record is keyed by top-level [`NodeId`]s. Subgraphs are evaluated as
/// a unit during tracing, so their interior nodes never carry samples; the
/// bounds of the owning node summarize them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleRecord {
    bounds: BTreeMap<NodeId, Bounds>,
}

impl SampleRecord {
    pub fn new() -> SampleRecord {
        SampleRecord::default()
    }

    /// Fold one observed value into the envelope of `id`.
    pub fn record(&mut self, id: NodeId, observed: i64) {
        self.bounds
            .entry(id)
            .and_modify(|bounds| bounds.include(observed))
            .or_insert_with(|| Bounds::of(observed));
    }

    /// Fold a whole envelope into the envelope of `id`.
    pub fn record_bounds(&mut self, id: NodeId, observed: Bounds) {
        self.bounds
            .entry(id)
            .and_modify(|bounds| bounds.merge(observed))
            .or_insert(observed);
    }

    pub fn bounds(&self, id: NodeId) -> Option<Bounds> {
        self.bounds.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Bounds)> + '_ {
        self.bounds.iter().map(|(&id, &bounds)| (id, bounds))
    }

    pub fn from_json_str(json: &str) -> Result<SampleRecord> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_str(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Graph {
    /// The widest integer produced by any node selected by the filters, in
    /// this graph or any subgraph, or `None` when no selected node produces
    /// an integer.
    ///
    /// Floats have a width too, but only integer widths drive circuit cost;
    /// float nodes are ignored rather than compared.
    pub fn maximum_integer_bit_width(
        &self,
        tag_filter: &TagFilter,
        operation_filter: &OperationFilter,
    ) -> Option<u32> {
        let mut maximum = None;
        self.fold_integer_bit_width(tag_filter, operation_filter, &mut maximum);
        if maximum.is_none() {
            log::debug!("no integer node matched the filters");
        }
        maximum
    }

    fn fold_integer_bit_width(
        &self,
        tag_filter: &TagFilter,
        operation_filter: &OperationFilter,
        maximum: &mut Option<u32>,
    ) {
        for (_, node) in self.nodes() {
            if tag_filter.matches(&node.tag) && operation_filter.matches(node.operation_kind()) {
                let data_type = node.output.data_type();
                if data_type.is_integer() {
                    let bit_width = data_type.bit_width();
                    *maximum = Some(maximum.map_or(bit_width, |current| current.max(bit_width)));
                }
            }
            if let Some(subgraph) = &node.subgraph {
                subgraph.fold_integer_bit_width(tag_filter, operation_filter, maximum);
            }
        }
    }

    /// The `(min, max)` envelope of the sampled values of the integer nodes
    /// selected by the filters, or `None` when nothing contributes.
    ///
    /// `None` is returned for direct graphs (they were never evaluated over
    /// an input set), when every selected node is a float, and when no
    /// selected integer node appears in `samples`. Selected nodes without
    /// samples contribute nothing; they do not poison the result.
    ///
    /// Only top-level nodes are consulted: sample envelopes exist per
    /// top-level id, and a subgraph contributes through the bounds of the
    /// node owning it.
    pub fn integer_range(
        &self,
        tag_filter: &TagFilter,
        operation_filter: &OperationFilter,
        encryption_filter: EncryptionFilter,
        samples: &SampleRecord,
    ) -> Option<(i64, i64)> {
        if self.is_direct() {
            log::debug!("direct graphs carry no samples to measure a range from");
            return None;
        }
        let mut range: Option<(i64, i64)> = None;
        for (id, node) in self.nodes() {
            if !tag_filter.matches(&node.tag)
                || !operation_filter.matches(node.operation_kind())
                || !encryption_filter.matches(&node.output)
                || !node.output.data_type().is_integer()
            {
                continue;
            }
            if let Some(bounds) = samples.bounds(id) {
                range = Some(match range {
                    None => (bounds.min, bounds.max),
                    Some((min, max)) => (min.min(bounds.min), max.max(bounds.max)),
                });
            }
        }
        range
    }
}
