//! Typed knowledge-graph model handed to the layout core.

mod category;
mod graph;
mod parse;

pub use category::{Category, CategoryFilter, UnknownCategory};
pub use graph::{Document, Edge, GraphSnapshot, MAX_DOCUMENTS, Node};
pub use parse::{RawDocument, RawEdge, RawGraph, RawNode, parse_graph_payload};
