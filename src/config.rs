use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Construction-site material inventory, served as a local web page
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Address the page is served on
    #[arg(long, env = "VATTU_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Directory holding the item list and user tag slots
    #[arg(long, env = "VATTU_DATA_DIR", default_value = "database")]
    pub data_dir: PathBuf,

    /// Largest request body accepted, photo uploads included
    #[arg(long, env = "VATTU_MAX_UPLOAD_BYTES", default_value_t = 8 * 1024 * 1024)]
    pub max_upload_bytes: usize,

    /// Default log filter when RUST_LOG is not set
    #[arg(long, env = "VATTU_LOG", default_value = "info")]
    pub log_level: String,
}
