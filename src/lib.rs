#![doc = include_str!("../README.md")]

pub mod api;
pub mod cli;
pub mod engine;
pub mod error;
pub mod runtime;
pub mod services;
pub mod site;
pub mod tools;
pub mod types;

pub use engine::*;
pub use services::*;
pub use site::SiteConfig;
pub use tools::assemble::{assemble, assemble_html};
pub use types::*;
