pub mod app;
pub mod config;
pub mod copernicus;
pub mod domain;
pub mod error;
pub mod events;
pub mod fs_util;
pub mod http;
pub mod normalize;
pub mod output;
pub mod record;
pub mod retrieve;
pub mod store;
pub mod writer;
