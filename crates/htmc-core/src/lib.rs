//! Core types, DOM, and utilities for the HTMC component engine.
//!
//! This crate provides the foundational types used across all other htmc crates:
//! - An arena DOM with shadow roots and slot assignment
//! - Owned, cloneable markup fragments and HTML serialization
//! - Compiled placeholder templates
//! - Error types

pub mod dom;
pub mod errors;
pub mod fragment;
pub mod html;
pub mod template;

pub use dom::*;
pub use errors::*;
pub use fragment::*;
pub use template::*;
