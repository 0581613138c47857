//! Georef: Object Model over a Pluggable Geodesy Engine
//!
//! Typed, lifetime-safe wrappers around the opaque handles of an external
//! geodesy engine, plus candidate selection with coverage-gap fallback for
//! coordinate transformation. The engine itself (projection math, EPSG
//! database, grid files) sits behind the [`engine::GeodesyEngine`] trait.

pub mod children;
pub mod config;
pub mod context;
pub mod crs;
pub mod datum;
pub mod engine;
pub mod error;
pub mod factory;
pub mod logging;
pub mod object;
pub mod operation;
pub mod selector;
pub mod types;
