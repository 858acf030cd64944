//! Client-side counterpart of the HTTP API: a thin transport façade, a
//! session store with optimistic message handling, and local persistence.

pub mod api;
pub mod storage;
pub mod store;
