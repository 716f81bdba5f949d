//! Flutter-facing bindings for the recruiting race core.

pub mod api;
