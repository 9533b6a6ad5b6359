// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Filters that restrict analyses to a subset of a graph's nodes.

use crate::graph::TagPath;
use crate::value::Value;

use regex::Regex;

/// Restricts nodes by their tag path.
///
/// Matching is against the full dotted form of a node's own tag; there is
/// no implicit prefix matching, so `Exact("abc")` does not select a node
/// tagged `abc.foo`. The empty string selects exactly the untagged nodes.
#[derive(Debug, Clone, Default)]
pub enum TagFilter {
    /// Every node.
    #[default]
    Any,
    /// Nodes whose dotted tag equals the given text.
    Exact(String),
    /// Nodes whose dotted tag equals any of the given texts.
    AnyOf(Vec<String>),
    /// Nodes whose dotted tag contains a match of the pattern.
    Pattern(Regex),
}

impl TagFilter {
    pub fn any_of<I, S>(tags: I) -> TagFilter
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TagFilter::AnyOf(tags.into_iter().map(Into::into).collect())
    }

    /// Compile `pattern` into a [`TagFilter::Pattern`].
    pub fn pattern(pattern: &str) -> Result<TagFilter, regex::Error> {
        Ok(TagFilter::Pattern(Regex::new(pattern)?))
    }

    pub fn matches(&self, tag: &TagPath) -> bool {
        match self {
            TagFilter::Any => true,
            TagFilter::Exact(text) => tag.dotted() == text,
            TagFilter::AnyOf(texts) => texts.iter().any(|text| tag.dotted() == text),
            TagFilter::Pattern(pattern) => pattern.is_match(tag.dotted()),
        }
    }
}

impl From<&str> for TagFilter {
    fn from(text: &str) -> TagFilter {
        TagFilter::Exact(text.to_string())
    }
}

impl From<String> for TagFilter {
    fn from(text: String) -> TagFilter {
        TagFilter::Exact(text)
    }
}

impl From<Vec<String>> for TagFilter {
    fn from(texts: Vec<String>) -> TagFilter {
        TagFilter::AnyOf(texts)
    }
}

impl From<&[&str]> for TagFilter {
    fn from(texts: &[&str]) -> TagFilter {
        TagFilter::any_of(texts.iter().copied())
    }
}

impl From<Regex> for TagFilter {
    fn from(pattern: Regex) -> TagFilter {
        TagFilter::Pattern(pattern)
    }
}

/// Restricts nodes by the kind of operation they perform.
///
/// Matching is against [`Node::operation_kind`]: `input`, `constant`,
/// `subgraph`, or the call name.
///
/// [`Node::operation_kind`]: crate::graph::Node::operation_kind
#[derive(Debug, Clone, Default)]
pub enum OperationFilter {
    /// Every node.
    #[default]
    Any,
    /// Nodes of exactly the given kind.
    Exact(String),
    /// Nodes of any of the given kinds.
    AnyOf(Vec<String>),
    /// Nodes whose kind contains a match of the pattern.
    Pattern(Regex),
}

impl OperationFilter {
    pub fn any_of<I, S>(kinds: I) -> OperationFilter
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        OperationFilter::AnyOf(kinds.into_iter().map(Into::into).collect())
    }

    /// Compile `pattern` into an [`OperationFilter::Pattern`].
    pub fn pattern(pattern: &str) -> Result<OperationFilter, regex::Error> {
        Ok(OperationFilter::Pattern(Regex::new(pattern)?))
    }

    pub fn matches(&self, kind: &str) -> bool {
        match self {
            OperationFilter::Any => true,
            OperationFilter::Exact(text) => kind == text,
            OperationFilter::AnyOf(texts) => texts.iter().any(|text| kind == text),
            OperationFilter::Pattern(pattern) => pattern.is_match(kind),
        }
    }
}

impl From<&str> for OperationFilter {
    fn from(text: &str) -> OperationFilter {
        OperationFilter::Exact(text.to_string())
    }
}

impl From<String> for OperationFilter {
    fn from(text: String) -> OperationFilter {
        OperationFilter::Exact(text)
    }
}

impl From<Vec<String>> for OperationFilter {
    fn from(texts: Vec<String>) -> OperationFilter {
        OperationFilter::AnyOf(texts)
    }
}

impl From<&[&str]> for OperationFilter {
    fn from(texts: &[&str]) -> OperationFilter {
        OperationFilter::any_of(texts.iter().copied())
    }
}

impl From<Regex> for OperationFilter {
    fn from(pattern: Regex) -> OperationFilter {
        OperationFilter::Pattern(pattern)
    }
}

/// Restricts nodes by the encryption status of their output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncryptionFilter {
    /// Every node.
    #[default]
    Any,
    /// Nodes producing encrypted values.
    EncryptedOnly,
    /// Nodes producing clear values.
    ClearOnly,
}

impl EncryptionFilter {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            EncryptionFilter::Any => true,
            EncryptionFilter::EncryptedOnly => value.is_encrypted(),
            EncryptionFilter::ClearOnly => value.is_clear(),
        }
    }
}
