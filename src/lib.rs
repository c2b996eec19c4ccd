#![doc = "pumproom-sync: validate a content repository and publish it to PumpRoom."]

//! The crate implements one CI step: check the repository root for folder
//! names that collide case-insensitively, have the PumpRoom API validate
//! `inzhenerka.yml`, zip the tree (minus ignored paths) and upload the zip.
//!
//! # Usage
//! The `pumproom-sync` binary wires the real file system and HTTP client into
//! [`synchronise::synchronise`]. Library users and tests can supply their own
//! [`contract::RepoFs`] and [`contract::PumpRoomApi`] implementations.

pub mod archive;
pub mod cli;
pub mod client;
pub mod config;
pub mod config_check;
pub mod contract;
pub mod error;
pub mod folders;
pub mod local_fs;
pub mod synchronise;
pub mod upload;

pub use cli::{run, Cli, Commands};
pub use error::SyncError;
