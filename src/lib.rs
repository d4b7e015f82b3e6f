// ABOUTME: Library crate for pinmatrix exposing the sync engine, matrix and CLI for testing

#![allow(missing_docs)]

pub mod audit;
pub mod cli;
pub mod config;
pub mod editors;
pub mod git;
pub mod matrix;
pub mod models;
pub mod sync;
