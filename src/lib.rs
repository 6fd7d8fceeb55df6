// Library for tests to access modules

pub mod annotations;
pub mod client;
pub mod config;
pub mod models;
pub mod presenter;
pub mod routes;
pub mod series;
pub mod version;
