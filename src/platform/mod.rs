//! Platform layer
//!
//! The browser build exposes the session to the JS engine through
//! [`web::WebSession`]; the host page supplies seeds there. Native builds
//! drive [`crate::Session`] directly.

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Seed for runs without a configured one, drawn from OS entropy
#[cfg(not(target_arch = "wasm32"))]
pub fn entropy_seed() -> u64 {
    use rand::RngCore;
    rand::rng().next_u64()
}
