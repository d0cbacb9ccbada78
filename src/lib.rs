mod database {
    pub mod actions;
    pub mod connection;
    pub mod error;
    pub mod filter;
    pub mod form;
    pub mod pagination;
    pub mod schema;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
mod api {
    pub mod query;
    pub mod recipes;
    pub mod references;
    pub mod routes;
    pub mod serializers;
    pub mod users;
}
mod config;
mod constants;
mod loader;
mod storage;

pub use api::*;
pub use authentication::*;
pub use config::*;
pub use constants::*;
pub use database::*;
pub use loader::*;
pub use storage::*;
