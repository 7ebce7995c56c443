//! HTTP handlers for registry resources.

pub mod resource;
