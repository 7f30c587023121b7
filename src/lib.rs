pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod output;
pub mod paginate;
pub mod transport;
pub mod view;
