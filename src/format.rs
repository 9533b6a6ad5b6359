// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Deterministic textual listings of graphs for debugging and golden
//! tests.

use crate::analysis::SampleRecord;
use crate::graph::{Graph, Node, Operation};

use core::fmt;

/// Which annotation columns a listing carries.
///
/// Build variations with struct update syntax:
/// `FormatOptions { show_locations: true, ..FormatOptions::default() }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    pub show_types: bool,
    pub show_bounds: bool,
    pub show_tags: bool,
    pub show_locations: bool,
}

impl Default for FormatOptions {
    fn default() -> FormatOptions {
        FormatOptions {
            show_types: true,
            show_bounds: true,
            show_tags: true,
            show_locations: false,
        }
    }
}

/// Spacing between adjacent columns of a listing.
const COLUMN_GAP: usize = 8;

impl Graph {
    /// Render the graph with default options, one line per node in
    /// insertion order, plus a `return` line and a section for owned
    /// subgraphs.
    ///
    /// Bound annotations come from `samples`; pass `None` to omit them.
    /// The text is deterministic: equal graphs with equal samples render
    /// byte-identically. Lines carry no trailing whitespace and the text
    /// no trailing newline.
    pub fn format(&self, samples: Option<&SampleRecord>) -> String {
        self.format_with(samples, &FormatOptions::default())
    }

    /// Render the graph with explicit options.
    pub fn format_with(&self, samples: Option<&SampleRecord>, options: &FormatOptions) -> String {
        let mut lines = self.listing_lines(samples, options);

        let owners: Vec<_> = self
            .nodes()
            .filter(|(_, node)| node.subgraph.is_some())
            .collect();
        if !owners.is_empty() {
            lines.push(String::new());
            lines.push("Subgraphs:".to_string());
            for (id, node) in owners {
                if let Some(subgraph) = &node.subgraph {
                    lines.push(String::new());
                    lines.push(format!("    {id} = {}:", expression(node)));
                    lines.push(String::new());
                    // Interior nodes never carry samples.
                    for line in subgraph.format_with(None, options).lines() {
                        if line.is_empty() {
                            lines.push(String::new());
                        } else {
                            lines.push(format!("        {line}"));
                        }
                    }
                }
            }
        }

        let mut result = String::new();
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                result.push('\n');
            }
            result.push_str(line.trim_end());
        }
        result
    }

    fn listing_lines(
        &self,
        samples: Option<&SampleRecord>,
        options: &FormatOptions,
    ) -> Vec<String> {
        let indices: Vec<String> = self.nodes().map(|(id, _)| id.to_string()).collect();

        // Annotation columns, in display order. A column whose cells are
        // all empty is dropped; the others are left-justified to their
        // widest cell plus a fixed gap.
        let columns: Vec<Vec<String>> = vec![
            self.nodes().map(|(_, node)| expression(node)).collect(),
            self.nodes()
                .map(|(_, node)| {
                    if options.show_types {
                        format!("# {}", node.output)
                    } else {
                        String::new()
                    }
                })
                .collect(),
            self.nodes()
                .map(|(id, _)| {
                    match samples {
                        Some(samples) if options.show_bounds => samples
                            .bounds(id)
                            .map(|bounds| format!("\u{2208} {bounds}"))
                            .unwrap_or_default(),
                        _ => String::new(),
                    }
                })
                .collect(),
            self.nodes()
                .map(|(_, node)| {
                    if options.show_tags && !node.tag.is_empty() {
                        format!("@ {}", node.tag)
                    } else {
                        String::new()
                    }
                })
                .collect(),
            self.nodes()
                .map(|(_, node)| match &node.location {
                    Some(location) if options.show_locations => location.to_string(),
                    _ => String::new(),
                })
                .collect(),
        ];

        let index_width = indices.iter().map(|index| index.len()).max().unwrap_or(0);
        let widths: Vec<Option<usize>> = columns.iter().map(|cells| column_width(cells)).collect();

        let mut lines = Vec::with_capacity(self.node_count() + 1);
        for row in 0..self.node_count() {
            let mut line = format!("{:>index_width$} = ", indices[row]);
            for (cells, width) in columns.iter().zip(&widths) {
                if let Some(width) = width {
                    pad_to(&mut line, &cells[row], *width);
                }
            }
            lines.push(line);
        }
        lines.push(format!("return {}", self.output_id()));
        lines
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(None))
    }
}

fn expression(node: &Node) -> String {
    match &node.operation {
        Operation::Input { name } => name.clone(),
        Operation::Constant { value } => value.to_string(),
        Operation::Call { name, inputs } => {
            let mut text = format!("{name}(");
            for (i, input) in inputs.iter().enumerate() {
                if i > 0 {
                    text.push_str(", ");
                }
                text.push_str(&input.to_string());
            }
            text.push(')');
            text
        }
    }
}

/// Width of a column, or `None` when every cell is empty. Widths count
/// chars, not bytes: the bounds marker is multibyte.
fn column_width(cells: &[String]) -> Option<usize> {
    let widest = cells
        .iter()
        .map(|cell| cell.chars().count())
        .max()
        .unwrap_or(0);
    (widest > 0).then_some(widest + COLUMN_GAP)
}

fn pad_to(line: &mut String, cell: &str, width: usize) {
    line.push_str(cell);
    for _ in cell.chars().count()..width {
        line.push(' ');
    }
}
