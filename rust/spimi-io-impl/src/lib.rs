//! Common implementations of the `spimi-io` abstractions.

pub mod block_store;
