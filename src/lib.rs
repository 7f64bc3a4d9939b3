#![forbid(unsafe_code)]

pub mod aggregate;
pub mod build;
pub mod cli;
pub mod extract;
pub mod fetch;
pub mod formats;
pub mod fragment;
pub mod logging;
pub mod nav;
pub mod resolve;
pub mod scan;
pub mod site;
pub mod sources;
pub mod toc;
pub mod unescape;
