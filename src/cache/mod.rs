//! Content-addressed render cache
//!
//! A rendered board is stored once per distinct set of rendering inputs at
//! `{cache_dir}/{digest}.{ext}`, where the digest is a SHA-256 over every
//! parameter that affects the output. See [`key`] for the digest and
//! [`store`] for the on-disk layout.

pub mod key;
pub mod store;

pub use key::{CacheKey, KeyParams};
pub use store::{CacheLocation, CacheStore, CachedImage};
