// ABOUTME: Version matrix: descriptor pins per project and environment, with raw file access

pub mod descriptors;
pub mod files;
pub mod rows;

pub use descriptors::{DescriptorError, Pin};
pub use files::{chart_values, read_file_content, save_file_content, FileError, SaveOutcome};
pub use rows::{load_rows, MatrixCell, ProjectEnvironmentRow, VersionMatrix};
