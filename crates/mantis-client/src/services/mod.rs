//! REST services, one module per backend resource
//!
//! Resources behind a trait seam implement it on [`ApiClient`](crate::ApiClient);
//! the rest are inherent methods.

mod auth;
mod chat;
mod documents;
mod projects;
mod runs;
mod teams;
mod threads;
mod users;
