//! Umbrella crate for the plate reader workspace; hosts the cross-crate tests.

pub use plate_core::*;
pub use plate_service as service;
