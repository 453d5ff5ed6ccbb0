//! Key generation and validation against a [`KeyPolicy`](crate::KeyPolicy).

pub mod fingerprint;
pub mod generator;
pub mod validator;
