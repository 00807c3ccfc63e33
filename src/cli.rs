//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
pub fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

#[derive(Parser)]
#[command(name = "camflash")]
#[command(author, version, about = "Read factory config from camera SPI flash", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show device identity and calibration summary
    Info {
        /// Backend to use: uvc[:index=N] or dummy[:image=FILE]
        #[arg(short, long, default_value = "uvc")]
        backend: String,
    },

    /// Read an arbitrary flash byte range to a file
    Read {
        /// Backend to use: uvc[:index=N] or dummy[:image=FILE]
        #[arg(short, long, default_value = "uvc")]
        backend: String,

        /// Start address (hex or decimal)
        #[arg(short, long, value_parser = parse_hex_u32)]
        address: u32,

        /// Number of bytes to read (hex or decimal)
        #[arg(short, long, value_parser = parse_hex_u32)]
        length: u32,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Read a whole admin sector to a file
    ReadSector {
        /// Backend to use: uvc[:index=N] or dummy[:image=FILE]
        #[arg(short, long, default_value = "uvc")]
        backend: String,

        /// Admin entry index
        #[arg(short, long)]
        entry: usize,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show the admin pointer table and per-sector used-copy counts
    Admin {
        /// Backend to use: uvc[:index=N] or dummy[:image=FILE]
        #[arg(short, long, default_value = "uvc")]
        backend: String,
    },

    /// List connected cameras
    ListDevices,
}
