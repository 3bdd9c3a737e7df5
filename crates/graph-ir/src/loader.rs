// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Graph loading from a TensorFlow `GraphDef` in protobuf text format.
//!
//! The text is parsed into the generated [`GraphDef`] message, then only the
//! fields cost evaluation needs are lifted out of each `NodeDef`: `name`,
//! `op`, `device`, `input`, the output dtype (`DstT`, `dtype` or `T`
//! attribute, first found wins) and the `_output_shapes` attribute.

use crate::graph::{Loaded, Validated};
use crate::tf::attr_value::{attr_value, AttrValue};
use crate::tf::graph::GraphDef;
use crate::tf::node_def::NodeDef;
use crate::tf::tensor_shape::TensorShapeProto;
use crate::{ComputationGraph, DataType, GraphError, InputRef, OpNode};
use std::path::Path;

/// Default graph definition filename inside a dataset folder.
pub const GRAPH_FILE: &str = "graph.pbtxt";

/// Attribute keys consulted for the output dtype, in priority order.
const DTYPE_ATTRS: [&str; 3] = ["DstT", "dtype", "T"];

/// Loads a `graph.pbtxt` file into a validated [`ComputationGraph`].
///
/// # Example
/// ```no_run
/// use graph_ir::GraphLoader;
/// use std::path::Path;
///
/// let graph = GraphLoader::load_dir(Path::new("./data/graph1")).unwrap();
/// println!("Loaded {} nodes", graph.num_nodes());
/// ```
pub struct GraphLoader;

impl GraphLoader {
    /// Reads, parses and validates the graph at `path`.
    ///
    /// The graph is named after the file's parent directory.
    pub fn load(path: &Path) -> Result<ComputationGraph<Validated>, GraphError> {
        let text = std::fs::read_to_string(path).map_err(|source| GraphError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let name = path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "graph".to_string());

        let graph = Self::from_pbtxt(&name, &text)?;
        tracing::info!("{}", graph.summary());
        Ok(graph)
    }

    /// Loads `<folder>/graph.pbtxt`.
    pub fn load_dir(folder: &Path) -> Result<ComputationGraph<Validated>, GraphError> {
        Self::load(&folder.join(GRAPH_FILE))
    }

    /// Parses and validates graph text held in memory.
    pub fn from_pbtxt(name: &str, text: &str) -> Result<ComputationGraph<Validated>, GraphError> {
        Self::parse_unvalidated(name, text)?.validate()
    }

    /// Parses graph text without validating references or ordering.
    pub fn parse_unvalidated(name: &str, text: &str) -> Result<ComputationGraph<Loaded>, GraphError> {
        let def: GraphDef =
            protobuf::text_format::parse_from_str(text).map_err(|e| GraphError::Parse(e.to_string()))?;
        Self::from_graph_def(name, &def)
    }

    /// Lifts an already-decoded `GraphDef` into the IR.
    pub fn from_graph_def(name: &str, def: &GraphDef) -> Result<ComputationGraph<Loaded>, GraphError> {
        let nodes = def
            .node
            .iter()
            .enumerate()
            .map(|(i, node)| build_node(i, node))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ComputationGraph::new(name, nodes))
    }
}

fn build_node(position: usize, def: &NodeDef) -> Result<OpNode, GraphError> {
    if def.name.is_empty() {
        return Err(GraphError::InvalidNode {
            node: format!("#{position}"),
            detail: "missing 'name' field".into(),
        });
    }
    if def.op.is_empty() {
        return Err(GraphError::InvalidNode {
            node: def.name.clone(),
            detail: "missing 'op' field".into(),
        });
    }

    let inputs = def
        .input
        .iter()
        .map(|raw| {
            InputRef::parse(raw).ok_or_else(|| GraphError::InvalidNode {
                node: def.name.clone(),
                detail: format!("malformed input reference '{raw}'"),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut node = OpNode::new(def.name.clone(), def.op.clone());
    node.device = def.device.clone();
    node.inputs = inputs;
    node.dtype = DTYPE_ATTRS
        .iter()
        .find_map(|key| match attr(def, key) {
            Some(attr_value::Value::Type(t)) => t.enum_value().ok(),
            _ => None,
        })
        .and_then(DataType::from_proto);
    node.output_shapes = match attr(def, "_output_shapes") {
        Some(attr_value::Value::List(list)) => list.shape.iter().map(shape_dims).collect(),
        _ => Vec::new(),
    };

    Ok(node)
}

/// Returns the value of the attribute named `key`.
fn attr<'a>(node: &'a NodeDef, key: &str) -> Option<&'a attr_value::Value> {
    node.attr.get(key).and_then(|v: &AttrValue| v.value.as_ref())
}

/// Converts a `TensorShapeProto` into dimensions; unknown rank is `[-1]`.
fn shape_dims(shape: &TensorShapeProto) -> Vec<i64> {
    if shape.unknown_rank {
        return vec![-1];
    }
    shape.dim.iter().map(|d| d.size).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
node {
  name: "x"
  op: "Placeholder"
  attr {
    key: "_output_shapes"
    value { list { shape { dim { size: -1 } dim { size: 784 } } } }
  }
  attr { key: "dtype" value { type: DT_FLOAT } }
}
node {
  name: "loss"
  op: "Mean"
  input: "mm:0"
  input: "^init"
  device: "/job:tge/replica:0/task:0/device:GPU:0"
  attr { key: "T" value { type: DT_DOUBLE } }
  attr {
    key: "_output_shapes"
    value { list { shape { } } }
  }
}
node {
  name: "mm"
  op: "MatMul"
  input: "x"
  attr {
    key: "_output_shapes"
    value { list { shape { dim { size: 32 } dim { size: 10 } } } }
  }
}
node { name: "init" op: "NoOp" }
versions { producer: 27 }
"#;

    #[test]
    fn test_from_pbtxt() {
        let g = GraphLoader::from_pbtxt("sample", SAMPLE).unwrap();
        assert_eq!(g.num_nodes(), 4);
        let names: Vec<_> = g.iter_nodes().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["x", "mm", "init", "loss"]);
    }

    #[test]
    fn test_attributes_extracted() {
        let g = GraphLoader::from_pbtxt("sample", SAMPLE).unwrap();
        let x = g.node_by_name("x").unwrap();
        assert_eq!(x.dtype, Some(DataType::F32));
        assert_eq!(x.output_shapes, vec![vec![-1, 784]]);

        let loss = g.node_by_name("loss").unwrap();
        assert_eq!(loss.dtype, Some(DataType::F64));
        assert_eq!(loss.output_shapes, vec![Vec::<i64>::new()]);
        assert_eq!(loss.output_bytes(0), 8);
        assert!(loss.device.ends_with("GPU:0"));
        assert!(loss.inputs[1].control);

        let mm = g.node_by_name("mm").unwrap();
        assert_eq!(mm.output_bytes(0), 32 * 10 * 4);
    }

    #[test]
    fn test_missing_op_rejected() {
        let err = GraphLoader::from_pbtxt("bad", r#"node { name: "a" }"#).unwrap_err();
        assert!(matches!(err, GraphError::InvalidNode { .. }));
    }

    #[test]
    fn test_unknown_rank() {
        let text = r#"node { name: "a" op: "X"
            attr { key: "_output_shapes" value { list { shape { unknown_rank: true } } } } }"#;
        let g = GraphLoader::from_pbtxt("u", text).unwrap();
        assert_eq!(g.node(0).unwrap().output_shapes, vec![vec![-1]]);
    }

    #[test]
    fn test_const_tensor_and_library_accepted() {
        let text = r#"
node {
  name: "w"
  op: "Const"
  attr { key: "dtype" value { type: DT_HALF } }
  attr {
    key: "value"
    value {
      tensor {
        dtype: DT_HALF
        tensor_shape { dim { size: 2 } dim { size: 3 } }
        tensor_content: "\000\001\002"
      }
    }
  }
  attr {
    key: "_output_shapes"
    value { list { shape { dim { size: 2 } dim { size: 3 } } } }
  }
}
node {
  name: "v"
  op: "VariableV2"
  attr { key: "dtype" value { type: DT_FLOAT } }
  attr { key: "T" value { type: DT_FLOAT_REF } }
  attr { key: "container" value { s: "" } }
}
library { }
versions { producer: 27 min_consumer: 12 }
"#;
        let g = GraphLoader::from_pbtxt("consts", text).unwrap();
        let w = g.node_by_name("w").unwrap();
        assert_eq!(w.dtype, Some(DataType::F16));
        assert_eq!(w.output_bytes(0), 2 * 3 * 2);
        assert_eq!(g.node_by_name("v").unwrap().dtype, Some(DataType::F32));
    }

    #[test]
    fn test_from_graph_def() {
        let mut def = GraphDef::new();
        for (name, op, input) in [("a", "Const", None), ("b", "Neg", Some("a:0"))] {
            let mut node = NodeDef::new();
            node.name = name.to_string();
            node.op = op.to_string();
            node.input.extend(input.map(str::to_string));
            def.node.push(node);
        }
        let g = GraphLoader::from_graph_def("built", &def).unwrap().validate().unwrap();
        assert_eq!(g.num_nodes(), 2);
        assert_eq!(g.node_by_name("b").unwrap().inputs[0].node, "a");
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(GRAPH_FILE), SAMPLE).unwrap();
        let g = GraphLoader::load_dir(dir.path()).unwrap();
        assert_eq!(g.num_nodes(), 4);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = GraphLoader::load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, GraphError::Read { .. }));
    }

    #[test]
    fn test_parse_error_propagates() {
        let err = GraphLoader::from_pbtxt("bad", "node { name: ").unwrap_err();
        assert!(matches!(err, GraphError::Parse(_)));

        let err = GraphLoader::from_pbtxt("bad", r#"node { name: "a" op: "X" colour: 3 }"#).unwrap_err();
        assert!(matches!(err, GraphError::Parse(_)));
    }
}
