pub mod error;
pub mod oauth;
pub mod password;
pub mod provider;
pub mod repo;
pub mod service;
pub mod token;
