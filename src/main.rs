//! camflash - Read factory config from camera SPI flash
//!
//! The camera stores its device identity and optical calibration in a
//! serial flash that is only reachable through a narrow command channel on
//! a UVC extension unit. This tool locates the most recently written copy
//! of each redundant record and dumps identity, calibration and raw flash
//! contents.

mod backends;
mod cli;
mod parser;

use clap::Parser;
use cli::{Cli, Commands};

use camflash_core::admin::{used_copies, AdminTable};
use camflash_core::channel::CommandChannel;
use camflash_core::flash::read_chunk;
use camflash_core::geom::{ADMIN_ENTRY_COUNT, SECTOR_BYTES};
use camflash_core::store::ConfigStore;
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match cli.command {
        Commands::Info { backend } => {
            let mut channel = backends::open_channel(&backend)?;
            run_info(&mut channel)
        }
        Commands::Read {
            backend,
            address,
            length,
            output,
        } => {
            let mut channel = backends::open_channel(&backend)?;
            run_read(&mut channel, address, length, &output)
        }
        Commands::ReadSector {
            backend,
            entry,
            output,
        } => {
            let mut channel = backends::open_channel(&backend)?;
            run_read_sector(&mut channel, entry, &output)
        }
        Commands::Admin { backend } => {
            let mut channel = backends::open_channel(&backend)?;
            run_admin(&mut channel)
        }
        Commands::ListDevices => run_list_devices(),
    }
}

fn run_info<C: CommandChannel>(channel: &mut C) -> Result<(), Box<dyn std::error::Error>> {
    let store = ConfigStore::initialize(channel, &mut parser::VersionedParser)?;
    let identity = store.identity();

    println!("Device Identity");
    println!("===============");
    println!("Serial:          {}", identity.serial_number);
    println!("Model:           {}", identity.model_number);
    println!("Revision:        {}", identity.revision_number);
    println!("Calibrated:      {} (unix)", identity.calibration_date);
    println!();
    println!("Calibration");
    println!("===========");
    println!("Version:         {}", store.calibration().version);
    println!("Block size:      {} bytes", store.calibration().raw.len());
    if store.routine_state().is_loaded() {
        println!(
            "Routine table:   {} descriptor bytes",
            store.routine_state().descriptors().len()
        );
    } else {
        println!("Routine table:   not present");
    }

    Ok(())
}

fn run_read<C: CommandChannel>(
    channel: &mut C,
    address: u32,
    length: u32,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut buf = vec![0u8; length as usize];
    read_chunk(channel, address, &mut buf)?;
    std::fs::write(output, &buf)?;
    log::info!(
        "wrote {} bytes from {:#08x} to {}",
        length,
        address,
        output.display()
    );
    Ok(())
}

fn run_read_sector<C: CommandChannel>(
    channel: &mut C,
    entry: usize,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = AdminTable::load(channel)?;
    let mut sector = [0u8; SECTOR_BYTES];
    table.read_sector(channel, entry, &mut sector)?;
    std::fs::write(output, sector)?;
    log::info!("wrote admin entry {} sector to {}", entry, output.display());
    Ok(())
}

fn run_admin<C: CommandChannel>(channel: &mut C) -> Result<(), Box<dyn std::error::Error>> {
    let table = AdminTable::load(channel)?;

    println!("entry  sector      used copies  unused bits");
    for entry in 0..ADMIN_ENTRY_COUNT {
        let address = table.sector_address(entry)?;
        match used_copies(channel, address) {
            Ok(copies) => println!(
                "{:5}  {:#010x}  {:11}  {:#010x}",
                entry, address, copies.count, copies.unused_bits
            ),
            Err(e) => println!("{:5}  {:#010x}  unreadable: {}", entry, address, e),
        }
    }

    Ok(())
}

fn run_list_devices() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "uvc")]
    {
        let devices = camflash_uvc::UvcChannel::list_devices()?;
        if devices.is_empty() {
            println!("No cameras found");
        } else {
            for dev in devices {
                println!("Camera at bus {} address {}", dev.bus, dev.address);
            }
        }
        Ok(())
    }
    #[cfg(not(feature = "uvc"))]
    {
        println!("Built without the uvc backend");
        Ok(())
    }
}
