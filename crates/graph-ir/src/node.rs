// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Operation nodes of a computation graph.
//!
//! An [`OpNode`] carries only what cost evaluation needs: the op name and
//! type, its input references, and the element type and shapes of its
//! outputs. Attribute values other than dtype and `_output_shapes` are
//! dropped at load time.

use crate::tf::types::DataType as TfDataType;
use std::fmt;

/// Element type of a node's output tensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DataType {
    F16,
    BF16,
    F32,
    F64,
    I8,
    I16,
    I32,
    I64,
    U8,
    Bool,
}

impl DataType {
    /// Converts a TensorFlow dtype.
    ///
    /// Reference dtypes (`DT_FLOAT_REF`) map to their value type. Types with
    /// no fixed element size (strings, resources, variants) yield `None`.
    pub fn from_proto(dtype: TfDataType) -> Option<Self> {
        use TfDataType::*;
        match dtype {
            DT_HALF | DT_HALF_REF => Some(Self::F16),
            DT_BFLOAT16 | DT_BFLOAT16_REF => Some(Self::BF16),
            DT_FLOAT | DT_FLOAT_REF => Some(Self::F32),
            DT_DOUBLE | DT_DOUBLE_REF => Some(Self::F64),
            DT_INT8 | DT_INT8_REF | DT_QINT8 | DT_QINT8_REF => Some(Self::I8),
            DT_INT16 | DT_INT16_REF | DT_QINT16 | DT_QINT16_REF => Some(Self::I16),
            DT_INT32 | DT_INT32_REF | DT_QINT32 | DT_QINT32_REF => Some(Self::I32),
            DT_INT64 | DT_INT64_REF => Some(Self::I64),
            DT_UINT8 | DT_UINT8_REF | DT_QUINT8 | DT_QUINT8_REF => Some(Self::U8),
            DT_BOOL | DT_BOOL_REF => Some(Self::Bool),
            _ => None,
        }
    }

    /// Returns the size of a single element in bytes.
    pub fn size_bytes(self) -> u64 {
        match self {
            Self::I8 | Self::U8 | Self::Bool => 1,
            Self::F16 | Self::BF16 | Self::I16 => 2,
            Self::F32 | Self::I32 => 4,
            Self::F64 | Self::I64 => 8,
        }
    }

    /// Returns a human-readable label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::F16 => "f16",
            Self::BF16 => "bf16",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::Bool => "bool",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Element size used when a node declares no dtype.
pub(crate) const DEFAULT_ELEMENT_BYTES: u64 = 4;

// ── InputRef ───────────────────────────────────────────────────────

/// A reference from a consumer to one of its producers.
///
/// TensorFlow spells these as `name` (output 0), `name:k` (output `k`) or
/// `^name` (control dependency, carries no data).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct InputRef {
    /// Producer node name.
    pub node: String,
    /// Producer output index. Always 0 for control inputs.
    pub output: usize,
    /// `true` for a `^name` control dependency.
    pub control: bool,
}

impl InputRef {
    /// Parses a TensorFlow input string.
    pub fn parse(raw: &str) -> Option<Self> {
        if let Some(name) = raw.strip_prefix('^') {
            if name.is_empty() {
                return None;
            }
            return Some(Self {
                node: name.to_string(),
                output: 0,
                control: true,
            });
        }

        match raw.rsplit_once(':') {
            Some((name, index)) if !name.is_empty() && index.chars().all(|c| c.is_ascii_digit()) => {
                let output = index.parse().ok()?;
                Some(Self {
                    node: name.to_string(),
                    output,
                    control: false,
                })
            }
            _ if !raw.is_empty() => Some(Self {
                node: raw.to_string(),
                output: 0,
                control: false,
            }),
            _ => None,
        }
    }

    /// A data input reading output `output` of `node`.
    pub fn data(node: impl Into<String>, output: usize) -> Self {
        Self {
            node: node.into(),
            output,
            control: false,
        }
    }

    /// A control dependency on `node`.
    pub fn control(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            output: 0,
            control: true,
        }
    }
}

impl fmt::Display for InputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.control {
            write!(f, "^{}", self.node)
        } else if self.output == 0 {
            f.write_str(&self.node)
        } else {
            write!(f, "{}:{}", self.node, self.output)
        }
    }
}

// ── OpNode ─────────────────────────────────────────────────────────

/// One operation in the computation graph.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OpNode {
    /// Unique node name (e.g., `"gradients/dense/MatMul_grad/MatMul"`).
    pub name: String,
    /// Operation type (e.g., `"MatMul"`).
    pub op: String,
    /// Device requested in the graph definition; empty when unplaced.
    #[serde(default)]
    pub device: String,
    /// Producer references in declaration order.
    #[serde(default)]
    pub inputs: Vec<InputRef>,
    /// Output element type, when declared.
    #[serde(default)]
    pub dtype: Option<DataType>,
    /// One shape per output. A `-1` dimension is unknown.
    #[serde(default)]
    pub output_shapes: Vec<Vec<i64>>,
}

impl OpNode {
    /// Creates a node with no inputs and no shape information.
    pub fn new(name: impl Into<String>, op: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            op: op.into(),
            device: String::new(),
            inputs: Vec::new(),
            dtype: None,
            output_shapes: Vec::new(),
        }
    }

    /// Adds a data input on output 0 of `producer`.
    pub fn with_input(mut self, producer: &str) -> Self {
        self.inputs.push(InputRef::data(producer, 0));
        self
    }

    /// Adds a control dependency on `producer`.
    pub fn with_control_input(mut self, producer: &str) -> Self {
        self.inputs.push(InputRef::control(producer));
        self
    }

    /// Appends an output shape.
    pub fn with_output_shape(mut self, dims: Vec<i64>) -> Self {
        self.output_shapes.push(dims);
        self
    }

    /// Sets the output element type.
    pub fn with_dtype(mut self, dtype: DataType) -> Self {
        self.dtype = Some(dtype);
        self
    }

    /// Returns the size in bytes of output `index`.
    ///
    /// A missing shape or any unknown (negative) dimension collapses the
    /// tensor to a single element.
    pub fn output_bytes(&self, index: usize) -> u64 {
        let elem = self.dtype.map_or(DEFAULT_ELEMENT_BYTES, DataType::size_bytes);
        let elements = match self.output_shapes.get(index) {
            Some(dims) if dims.iter().all(|&d| d >= 0) => {
                dims.iter().fold(1u64, |acc, &d| acc.saturating_mul(d as u64))
            }
            _ => 1,
        };
        elements.saturating_mul(elem)
    }

    /// Returns the number of data (non-control) inputs.
    pub fn num_data_inputs(&self) -> usize {
        self.inputs.iter().filter(|i| !i.control).count()
    }

    /// Returns a one-line summary.
    pub fn summary(&self) -> String {
        let dtype = self.dtype.map_or("?", DataType::as_str);
        format!(
            "{:<40} {:<20} in={} out={} dtype={} bytes(0)={}",
            self.name,
            self.op,
            self.inputs.len(),
            self.output_shapes.len(),
            dtype,
            self.output_bytes(0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_ref_parse() {
        assert_eq!(InputRef::parse("a"), Some(InputRef::data("a", 0)));
        assert_eq!(InputRef::parse("a/b:2"), Some(InputRef::data("a/b", 2)));
        assert_eq!(InputRef::parse("^c"), Some(InputRef::control("c")));
        assert_eq!(InputRef::parse(""), None);
        assert_eq!(InputRef::parse("^"), None);
    }

    #[test]
    fn test_input_ref_display_roundtrip() {
        for raw in ["a", "a:3", "^a"] {
            assert_eq!(InputRef::parse(raw).unwrap().to_string(), raw);
        }
    }

    #[test]
    fn test_input_ref_non_numeric_suffix() {
        let r = InputRef::parse("scope:name").unwrap();
        assert_eq!(r.node, "scope:name");
        assert_eq!(r.output, 0);
    }

    #[test]
    fn test_dtype_from_proto() {
        assert_eq!(DataType::from_proto(TfDataType::DT_FLOAT), Some(DataType::F32));
        assert_eq!(DataType::from_proto(TfDataType::DT_FLOAT_REF), Some(DataType::F32));
        assert_eq!(DataType::from_proto(TfDataType::DT_INT64), Some(DataType::I64));
        assert_eq!(DataType::from_proto(TfDataType::DT_RESOURCE), None);
    }

    #[test]
    fn test_output_bytes() {
        let n = OpNode::new("a", "MatMul").with_output_shape(vec![32, 128]);
        assert_eq!(n.output_bytes(0), 32 * 128 * 4);

        let n = n.with_dtype(DataType::F16);
        assert_eq!(n.output_bytes(0), 32 * 128 * 2);
    }

    #[test]
    fn test_output_bytes_unknown_dims() {
        let n = OpNode::new("a", "Placeholder").with_output_shape(vec![-1, 784]);
        assert_eq!(n.output_bytes(0), 4);
        assert_eq!(n.output_bytes(5), 4);
    }

    #[test]
    fn test_output_bytes_scalar_shape() {
        let n = OpNode::new("a", "Const").with_output_shape(vec![]);
        assert_eq!(n.output_bytes(0), 4);
    }

    #[test]
    fn test_num_data_inputs() {
        let n = OpNode::new("c", "Add")
            .with_input("a")
            .with_input("b")
            .with_control_input("init");
        assert_eq!(n.inputs.len(), 3);
        assert_eq!(n.num_data_inputs(), 2);
    }

    #[test]
    fn test_summary() {
        let s = OpNode::new("dense/MatMul", "MatMul").summary();
        assert!(s.contains("dense/MatMul"));
        assert!(s.contains("MatMul"));
    }
}
