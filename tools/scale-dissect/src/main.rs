//! Offline dissector for captured scale upload/response frames.
//!
//! Takes a hex string (or a file of raw bytes) and prints the decoded
//! fields, the way a protocol analyzer would -- useful for confirming field
//! layout against a real firmware capture without standing up the server.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use scale_gateway::codec::{self, response::decode_response};

#[derive(Parser)]
#[command(name = "scale-dissect", about = "Dissect captured scale wire frames")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode an upload frame (scale -> server).
    Upload(FrameArgs),
    /// Decode a response frame (server -> scale).
    Response(FrameArgs),
}

#[derive(clap::Args)]
struct FrameArgs {
    /// Hex-encoded bytes, e.g. 03002700...
    #[arg(long, conflicts_with = "file")]
    hex: Option<String>,

    /// Path to a file containing the raw captured bytes.
    #[arg(long, conflicts_with = "hex")]
    file: Option<PathBuf>,
}

impl FrameArgs {
    fn bytes(&self) -> Result<Vec<u8>> {
        match (&self.hex, &self.file) {
            (Some(hex_str), None) => {
                hex::decode(hex_str.trim()).context("input is not valid hex")
            }
            (None, Some(path)) => {
                fs::read(path).with_context(|| format!("reading {}", path.display()))
            }
            _ => anyhow::bail!("pass exactly one of --hex or --file"),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Upload(args) => dissect_upload(&args.bytes()?),
        Command::Response(args) => dissect_response(&args.bytes()?),
    }
}

fn dissect_upload(data: &[u8]) -> Result<()> {
    println!("{} {} bytes", "input:".bold(), data.len());

    match codec::decode_upload(data) {
        Ok(decoded) => {
            let frame = &decoded.frame;
            println!("{}", "upload frame".green().bold());
            println!("  protocol_version:      {}", frame.protocol_version);
            println!("  header_firmware_hint:  {}", frame.header_firmware_hint);
            println!("  battery_percent:       {}", frame.battery_percent);
            println!(
                "  mac:                   {}",
                frame
                    .mac
                    .iter()
                    .map(|b| format!("{b:02X}"))
                    .collect::<Vec<_>>()
                    .join(":")
            );
            println!("  auth_code:             {}", hex::encode(frame.auth_code));
            println!("  firmware_version:      {}", frame.firmware_version);
            println!("  scale_timestamp:       {}", frame.scale_timestamp);
            println!(
                "  declared_measurements: {} (present: {}{})",
                frame.declared_measurement_count,
                frame.measurements.len(),
                if frame.truncated() { ", truncated".yellow().to_string() } else { String::new() }
            );

            if let Some(mismatch) = decoded.crc_mismatch {
                println!(
                    "  {} expected {:#06x}, computed {:#06x}",
                    "crc_mismatch:".yellow().bold(),
                    mismatch.expected,
                    mismatch.computed
                );
            } else {
                println!("  crc: {}", "ok".green());
            }

            for (i, m) in frame.measurements.iter().enumerate() {
                println!("  measurement[{i}]:");
                println!("    measurement_id: {}", m.measurement_id);
                println!("    weight_grams:   {}", m.weight_grams);
                println!("    impedance_ohms: {}", m.impedance_ohms);
                println!("    fat_raw_1/2:    {} / {}", m.fat_raw_1, m.fat_raw_2);
                println!("    covariance:     {}", m.covariance);
                println!("    timestamp:      {}", m.timestamp);
                println!("    user_slot:      {}", m.user_slot);
            }
        }
        Err(err) => {
            println!("{} {}", "decode failed:".red().bold(), err);
        }
    }

    Ok(())
}

fn dissect_response(data: &[u8]) -> Result<()> {
    println!("{} {} bytes", "input:".bold(), data.len());

    match decode_response(data) {
        Some(frame) => {
            println!("{}", "response frame".green().bold());
            println!("  server_timestamp: {}", frame.server_timestamp);
            println!("  unit:             {:?}", frame.unit);
            println!("  status:           {}", frame.status);
            for (slot, user) in frame.users.iter().enumerate() {
                match user {
                    Some(block) => println!(
                        "  slot[{slot}]: height_mm={} age={} gender={} min={}g max={}g",
                        block.height_mm, block.age, block.gender, block.min_weight_grams, block.max_weight_grams
                    ),
                    None => println!("  slot[{slot}]: {}", "empty".dimmed()),
                }
            }
        }
        None => println!("{}", "not a well-formed response frame (bad length, trailer, or CRC)".red()),
    }

    Ok(())
}
