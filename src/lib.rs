//! Fetch-artifact dependency validation for CD pipeline configurations.
//!
//! A configuration [`graph::Snapshot`] is loaded into a
//! [`graph::ConfigGraph`]; [`validation`] checks every fetch task against it
//! and [`secure`] finds plugin settings whose values must be encrypted.

pub mod artifact;
pub mod cli;
pub mod config;
pub mod configuration;
pub mod error;
pub mod graph;
pub mod output;
pub mod report;
pub mod secure;
pub mod task;
pub mod validation;
