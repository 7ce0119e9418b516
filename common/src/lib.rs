//! # camfleet common
//!
//! Shared models and the contracts the fleet core depends on.
//!
//! * **[`discovery`]**: raw discovery records, their normalized [`discovery::ProbeData`]
//!   form, and the [`discovery::Discoverer`] collaborator.
//! * **[`device`]**: the [`device::Device`] collaborator and its capability value types.
//! * **[`credentials`]**, **[`config`]**, **[`error`]**: ambient types used across crates.

pub mod config;
pub mod credentials;
pub mod device;
pub mod discovery;
pub mod error;
