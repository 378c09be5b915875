pub mod assembler;
pub mod cache;
pub mod config;
pub mod events;
pub mod fetcher;
pub mod humanize;
pub mod job;
pub mod layout;
pub mod observability;
pub mod service;

pub use service::{Downloader, DownloaderError, JobHandle};
