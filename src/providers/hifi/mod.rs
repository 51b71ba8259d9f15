//! Tidal-mirror ("hifi") audio source integration.
//!
//! A community mirror of the Tidal catalog API, reachable through several
//! interchangeable hosts. Split into:
//! - `client`: HTTP communication with mirror failover
//! - `dto`: API response types plus the base64 manifest blob
//! - `adapter`: DTO -> domain conversion

mod adapter;
mod client;
mod dto;

pub use client::HifiClient;
