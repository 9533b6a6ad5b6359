// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The computation graph: an arena of operation nodes wired by stable
//! indices, each node annotated with its output value, tag and source
//! location.

use crate::dtypes::DataType;
use crate::value::Value;

use core::fmt;
use core::ops;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Stable identity of a node within its graph: the insertion-order index.
///
/// Ids are per-graph; a subgraph numbers its own nodes from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub const fn new(index: u32) -> NodeId {
        NodeId(index)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// A constant embedded in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    Float(f64),
}

impl Literal {
    /// The inferred data type: the minimal integer type for integers,
    /// `float64` for floats.
    pub fn data_type(&self) -> DataType {
        match self {
            Literal::Int(value) => DataType::to_represent(*value),
            Literal::Float(_) => DataType::float(64),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(value) => write!(f, "{value}"),
            // Whole floats keep a decimal point so they cannot read as
            // integer constants.
            Literal::Float(value) if value.is_finite() && value.fract() == 0.0 => {
                write!(f, "{value:.1}")
            }
            Literal::Float(value) => write!(f, "{value}"),
        }
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Literal {
        Literal::Int(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Literal {
        Literal::Int(value as i64)
    }
}

impl From<u32> for Literal {
    fn from(value: u32) -> Literal {
        Literal::Int(value as i64)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Literal {
        Literal::Float(value)
    }
}

/// A dotted tag path such as `abc.foo`, fixed when the node is created.
///
/// The empty path marks an untagged node. Tags inside a subgraph are
/// independent of the owning graph's tags. The path is `Arc`-shared so
/// graphs stay `Send + Sync`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TagPath {
    dotted: Arc<str>,
}

impl TagPath {
    /// The untagged path.
    pub fn empty() -> TagPath {
        TagPath::default()
    }

    /// Join segments with dots: `["abc", "foo"]` becomes `abc.foo`.
    pub fn new<I, S>(segments: I) -> TagPath
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dotted = String::new();
        for segment in segments {
            let segment = segment.as_ref();
            debug_assert!(
                !segment.is_empty() && !segment.contains('.'),
                "tag segments are non-empty and dot-free"
            );
            if !dotted.is_empty() {
                dotted.push('.');
            }
            dotted.push_str(segment);
        }
        TagPath {
            dotted: dotted.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dotted.is_empty()
    }

    /// The full dotted form; empty for untagged nodes.
    pub fn dotted(&self) -> &str {
        &self.dotted
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.dotted.split('.').filter(|segment| !segment.is_empty())
    }
}

impl From<&str> for TagPath {
    fn from(dotted: &str) -> TagPath {
        TagPath {
            dotted: dotted.into(),
        }
    }
}

impl From<String> for TagPath {
    fn from(dotted: String) -> TagPath {
        TagPath {
            dotted: dotted.into(),
        }
    }
}

impl fmt::Display for TagPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted)
    }
}

/// Where in the traced program a node came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub file: Arc<str>,
    pub line: u32,
}

impl Location {
    pub fn new(file: impl Into<Arc<str>>, line: u32) -> Location {
        Location {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// What a node computes.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// A named program input.
    Input { name: String },
    /// An embedded constant.
    Constant { value: Literal },
    /// A named operation applied to earlier nodes.
    Call { name: String, inputs: Vec<NodeId> },
}

/// Call name given to nodes that evaluate an owned subgraph.
const SUBGRAPH_CALL: &str = "subgraph";

/// One operation of the graph together with its annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub operation: Operation,
    pub output: Value,
    pub tag: TagPath,
    pub location: Option<Location>,
    /// A nested graph this node evaluates, exclusively owned.
    pub subgraph: Option<Graph>,
}

impl Node {
    pub fn input(name: impl Into<String>, output: Value) -> Node {
        Node {
            operation: Operation::Input { name: name.into() },
            output,
            tag: TagPath::empty(),
            location: None,
            subgraph: None,
        }
    }

    /// A constant node, typed by the literal itself as a clear scalar.
    pub fn constant(value: impl Into<Literal>) -> Node {
        let value = value.into();
        Node {
            output: Value::clear_scalar(value.data_type()),
            operation: Operation::Constant { value },
            tag: TagPath::empty(),
            location: None,
            subgraph: None,
        }
    }

    pub fn call(name: impl Into<String>, inputs: Vec<NodeId>, output: Value) -> Node {
        Node {
            operation: Operation::Call {
                name: name.into(),
                inputs,
            },
            output,
            tag: TagPath::empty(),
            location: None,
            subgraph: None,
        }
    }

    /// A node that evaluates `graph` over the given inputs.
    pub fn subgraph(inputs: Vec<NodeId>, graph: Graph, output: Value) -> Node {
        Node {
            operation: Operation::Call {
                name: SUBGRAPH_CALL.to_string(),
                inputs,
            },
            output,
            tag: TagPath::empty(),
            location: None,
            subgraph: Some(graph),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<TagPath>) -> Node {
        self.tag = tag.into();
        self
    }

    pub fn with_location(mut self, location: Location) -> Node {
        self.location = Some(location);
        self
    }

    /// The label operation filters match against: `input`, `constant`,
    /// `subgraph` for nodes owning one, otherwise the call name.
    pub fn operation_kind(&self) -> &str {
        if self.subgraph.is_some() {
            return SUBGRAPH_CALL;
        }
        match &self.operation {
            Operation::Input { .. } => "input",
            Operation::Constant { .. } => "constant",
            Operation::Call { name, .. } => name,
        }
    }
}

/// An immutable directed acyclic computation graph.
///
/// Nodes live in an arena in insertion order and refer to each other by
/// [`NodeId`]. Construction goes through [`GraphBuilder`], which only
/// accepts references to nodes already added; cycles cannot be expressed.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    nodes: Vec<Node>,
    output: NodeId,
    is_direct: bool,
}

impl Graph {
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// All nodes with their ids, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index as u32), node))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The node whose value the graph returns.
    pub fn output_id(&self) -> NodeId {
        self.output
    }

    pub fn output_node(&self) -> &Node {
        &self.nodes[self.output.index()]
    }

    /// Whether the graph was built directly with explicit types rather than
    /// traced; sample-based analyses do not apply to direct graphs.
    pub fn is_direct(&self) -> bool {
        self.is_direct
    }
}

impl ops::Index<NodeId> for Graph {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

/// Error raised when graph construction violates a structural invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// A call referenced a node that has not been added yet.
    #[error("call `{name}` references {input}, which is not in the graph yet")]
    UnknownInput { name: String, input: NodeId },

    /// The output id passed to `build` does not name a node.
    #[error("{output} cannot be returned: the graph has {node_count} nodes")]
    UnknownOutput { output: NodeId, node_count: usize },

    /// `build` was called before any node was added.
    #[error("cannot build an empty graph")]
    Empty,
}

/// Incrementally builds a [`Graph`], validating structure as nodes arrive.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
    is_direct: bool,
}

impl GraphBuilder {
    /// A builder for a traced graph.
    pub fn new() -> GraphBuilder {
        GraphBuilder::default()
    }

    /// A builder for a direct graph, typed explicitly instead of traced.
    pub fn direct() -> GraphBuilder {
        GraphBuilder {
            nodes: Vec::new(),
            is_direct: true,
        }
    }

    /// Add a node, checking that every input it names is already present.
    pub fn add(&mut self, node: Node) -> Result<NodeId, GraphError> {
        if let Operation::Call { name, inputs } = &node.operation {
            for &input in inputs {
                if input.index() >= self.nodes.len() {
                    return Err(GraphError::UnknownInput {
                        name: name.clone(),
                        input,
                    });
                }
            }
        }
        Ok(self.push(node))
    }

    pub fn input(&mut self, name: impl Into<String>, output: Value) -> NodeId {
        self.push(Node::input(name, output))
    }

    pub fn constant(&mut self, value: impl Into<Literal>) -> NodeId {
        self.push(Node::constant(value))
    }

    pub fn call(
        &mut self,
        name: impl Into<String>,
        inputs: Vec<NodeId>,
        output: Value,
    ) -> Result<NodeId, GraphError> {
        self.add(Node::call(name, inputs, output))
    }

    pub fn subgraph(
        &mut self,
        inputs: Vec<NodeId>,
        graph: Graph,
        output: Value,
    ) -> Result<NodeId, GraphError> {
        self.add(Node::subgraph(inputs, graph, output))
    }

    /// Seal the graph, returning the value of `output`.
    pub fn build(self, output: NodeId) -> Result<Graph, GraphError> {
        if self.nodes.is_empty() {
            return Err(GraphError::Empty);
        }
        if output.index() >= self.nodes.len() {
            return Err(GraphError::UnknownOutput {
                output,
                node_count: self.nodes.len(),
            });
        }
        log::debug!("graph sealed with {} nodes, returning {output}", self.nodes.len());
        Ok(Graph {
            nodes: self.nodes,
            output,
            is_direct: self.is_direct,
        })
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }
}
