pub mod audit;
pub mod bots;
pub mod endpoint;
pub mod error;
pub mod forward;
pub mod model;
pub mod normalize;
pub mod ports;
pub mod repo;
pub mod service;
