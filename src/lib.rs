// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

mod analysis;
mod dtypes;
mod filter;
mod format;
mod graph;
mod value;

pub use analysis::{Bounds, SampleRecord};
pub use dtypes::{bit_width_to_represent, find_type_to_hold_both, DataType, ParseDataTypeError};
pub use filter::{EncryptionFilter, OperationFilter, TagFilter};
pub use format::FormatOptions;
pub use graph::{
    Graph, GraphBuilder, GraphError, Literal, Location, Node, NodeId, Operation, TagPath,
};
pub use value::{mix_values, MixError, ScalarValue, TensorValue, Value};
