pub mod build;
pub mod routes;
