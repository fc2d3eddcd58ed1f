//! Host-side profile plumbing: where profiles come from and how long they live.

pub mod cache;
pub mod loader;
