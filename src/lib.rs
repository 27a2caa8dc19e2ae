pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod exception;
pub mod gateway;
pub mod interaction;
pub mod ir;
pub mod manager;
pub mod options;
pub mod publisher;
pub mod router;
pub mod scope;
pub mod tree;
