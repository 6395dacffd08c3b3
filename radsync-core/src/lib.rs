#![doc = "radsync-core: reconciliation engine for declarative Radarr configuration."]

//! This crate contains the configuration model, the remote resource types, the
//! `RadarrApi` contract and the diff/apply logic used to converge a Radarr
//! instance onto a desired-state document.
//!
//! Transport (the reqwest API client) and the CLI live in the `radsync` crate;
//! everything here is testable against a mock implementation of the contract.
//!
//! # Usage
//! Parse a [`config::Config`], resolve instances, then call
//! [`sync::synchronise`] with a [`contract::RadarrApi`] implementation.

pub mod config;
pub mod contract;
pub mod plan;
pub mod remote;
pub mod sync;
