//! Domain types and shared infrastructure.
//!
//! - [`task`]: the task record and its validation rules
//! - [`filters`]: pagination, sorting and page metadata for listings
//! - [`validator`]: field error collection
//! - [`config`], [`data_storage`]: service settings and where they live
//! - [`messages`]: every response and log text

pub mod config;
pub mod data_storage;
pub mod filters;
pub mod messages;
pub mod task;
pub mod validator;
