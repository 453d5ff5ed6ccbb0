//! Key policy model.

pub mod rules;
