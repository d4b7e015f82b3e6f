// ABOUTME: Core data models for configuration repositories and their deployment kinds

pub mod repository;

pub use repository::{
    DeploymentKind, EnvironmentDescriptors, RepositoryHandle, RepositoryKind, VirtualProject,
};
