// SPDX-FileCopyrightText: © 2024 Sandman contributors
// SPDX-License-Identifier: MIT

/// Errors of the service instance model and of the placement engine.
///
/// An operation returning one of these has left the model unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlacementError {
    #[error("unknown PoP: {0}")]
    UnknownPop(String),
    #[error("unknown function instance: {0}")]
    UnknownInstance(String),
    #[error("unknown VNF: {0}")]
    UnknownVnf(String),
    #[error("link endpoint {0} is neither a network function nor an access point of the service")]
    UnknownEndpoint(String),
    #[error("insufficient capacity for {instance} (cpu {cpu}, memory {memory}, storage {storage})")]
    InsufficientCapacity { instance: String, cpu: f64, memory: f64, storage: f64 },
}

/// Reasons why a lifecycle command has been aborted.
#[derive(Debug, thiserror::Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Parse(#[from] sandman_api::loader::DescriptorError),
    #[error(transparent)]
    Placement(#[from] PlacementError),
    #[error("template translation failed: {0}")]
    Translation(String),
    #[error("command not accepted in state {0}")]
    Busy(crate::active_deployment::DeploymentState),
}
