//! Command-line and environment configuration.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Relay server settings. Every flag can also come from the environment.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "inkshare-server",
    about = "WebSocket broadcast relay and document upload endpoint for shared drawing",
    version
)]
pub struct Config {
    #[arg(
        long,
        env = "INKSHARE_ADDR",
        default_value = "0.0.0.0:4000",
        help = "Address to listen on"
    )]
    pub addr: SocketAddr,

    #[arg(
        long = "upload-dir",
        value_name = "PATH",
        env = "INKSHARE_UPLOAD_DIR",
        default_value = "uploads",
        help = "Directory uploaded documents are stored in and served from"
    )]
    pub upload_dir: PathBuf,

    #[arg(
        long = "channel-capacity",
        env = "INKSHARE_CHANNEL_CAPACITY",
        default_value_t = 256,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Frames buffered per connection before a slow reader starts losing them"
    )]
    pub channel_capacity: u32,

    #[arg(
        long = "max-upload-mb",
        env = "INKSHARE_MAX_UPLOAD_MB",
        default_value_t = 50,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Largest accepted upload, in megabytes"
    )]
    pub max_upload_mb: u32,
}

impl Config {
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb as usize * 1024 * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["inkshare-server"]).unwrap();
        assert_eq!(config.addr, "0.0.0.0:4000".parse().unwrap());
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.channel_capacity, 256);
        assert_eq!(config.max_upload_bytes(), 50 * 1024 * 1024);
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = Config::try_parse_from([
            "inkshare-server",
            "--addr",
            "127.0.0.1:9000",
            "--upload-dir",
            "/tmp/docs",
            "--channel-capacity",
            "8",
        ])
        .unwrap();
        assert_eq!(config.addr.port(), 9000);
        assert_eq!(config.upload_dir, PathBuf::from("/tmp/docs"));
        assert_eq!(config.channel_capacity, 8);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(Config::try_parse_from(["inkshare-server", "--channel-capacity", "0"]).is_err());
    }
}
