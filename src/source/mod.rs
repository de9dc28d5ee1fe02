pub mod downloader;
pub mod error;
pub mod loader;
pub mod request;
pub mod topology_file;
