//! ListenBrainz radio integration.
//!
//! Turns a blueprint prompt into a candidate track list via the LB-radio
//! endpoint. Split into:
//! - `client`: HTTP communication
//! - `dto`: API response types (exactly matching the JSPF payload)
//! - `adapter`: DTO -> domain conversion

mod adapter;
mod client;
mod dto;

pub use client::ListenBrainzClient;
