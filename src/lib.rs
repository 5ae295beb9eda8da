//! bagsync - Move LDP repository resources in and out of bags
//!
//! This crate provides the core functionality for the `bagsync` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`config`] - Flag resolution and validation
//! - [`client`] - Repository access (GET/HEAD/PUT)
//! - [`rdf`] - RDF model with N-Triples and JSON-LD codecs
//! - [`sync`] - Export, import, path mapping and change detection
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod rdf;
pub mod sync;

pub use error::{Error, Result};
