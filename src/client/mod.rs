//! Client side of the product: the matching backend, the dashboard read API
//! and the query cache both of them share.

pub mod backend;
pub mod dashboard;
pub mod query_cache;
