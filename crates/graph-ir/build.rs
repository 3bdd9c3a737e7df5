// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Generates the TensorFlow `GraphDef` message types from `proto/`.

const PROTOS: &[&str] = &[
    "proto/tensorflow/core/framework/types.proto",
    "proto/tensorflow/core/framework/tensor_shape.proto",
    "proto/tensorflow/core/framework/resource_handle.proto",
    "proto/tensorflow/core/framework/tensor.proto",
    "proto/tensorflow/core/framework/attr_value.proto",
    "proto/tensorflow/core/framework/node_def.proto",
    "proto/tensorflow/core/framework/op_def.proto",
    "proto/tensorflow/core/framework/function.proto",
    "proto/tensorflow/core/framework/versions.proto",
    "proto/tensorflow/core/framework/graph.proto",
];

fn main() {
    println!("cargo:rerun-if-changed=proto");
    protobuf_codegen::Codegen::new()
        .pure()
        .include("proto")
        .inputs(PROTOS)
        .cargo_out_dir("tf")
        .run_from_script();
}
