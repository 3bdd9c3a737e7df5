// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for cluster description.

/// Errors raised while describing devices, budgets and links.
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    /// A memory budget string or number could not be interpreted.
    #[error("invalid memory budget '{value}': {detail}")]
    InvalidBudget { value: String, detail: String },

    /// A device address is malformed.
    #[error("invalid device address '{device}': {detail}")]
    InvalidDevice { device: String, detail: String },

    /// The same device address appears twice in a device list.
    #[error("device '{0}' is listed more than once")]
    DuplicateDevice(String),

    /// A device list must contain at least one device.
    #[error("device list is empty")]
    EmptyDeviceList,

    /// Budgets must be aligned one-to-one with devices.
    #[error("{budgets} memory budgets given for {devices} devices")]
    BudgetMismatch { devices: usize, budgets: usize },

    /// A bandwidth value is zero, negative or not a number.
    #[error("invalid bandwidth '{0}': expected a positive integer")]
    InvalidBandwidth(String),
}
