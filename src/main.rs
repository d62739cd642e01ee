//! RN-42 HID console
//!
//! Main entry point.

use anyhow::Result;
use clap::Parser;
use std::io;
use std::path::Path;
use tracing::{debug, info};

use rn42_console::cli::{Cli, Commands};
use rn42_console::{Console, ConsoleConfig};
use rn42_transport::{
    list_ports, BoxedTransport, PrinterConfig, PrinterTransport, SerialTransport, SimulatedModule,
    Transport, TransportError,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(ConsoleConfig::default_path);

    match cli.command {
        Some(Commands::Ports) => return cmd_ports(),
        Some(Commands::InitConfig { force }) => return cmd_init_config(&config_path, force),
        _ => {}
    }

    info!("Loading config from {:?}", config_path);
    let mut config = ConsoleConfig::load(&config_path)?;
    config.apply_cli(&cli);
    debug!("Effective config: {:?}", config);

    let link = match open_link(&config, cli.simulate) {
        Ok(link) => link,
        Err(e) => {
            eprintln!("!!! Error opening serial port, failed: {}", e);
            std::process::exit(1);
        }
    };
    let link = match config.printer_config()? {
        Some(printer) => monitored(link, printer),
        None => link,
    };
    info!("Connected: {}", link.port_info());

    let mut console = Console::new(link, config.scan_policy());
    let mut stdout = io::stdout().lock();
    match cli.command {
        Some(Commands::Exec { lines }) => console.run_script(&lines, &mut stdout)?,
        _ => console.run(io::stdin().lock(), &mut stdout)?,
    }
    Ok(())
}

fn open_link(config: &ConsoleConfig, simulate: bool) -> Result<BoxedTransport, TransportError> {
    if simulate {
        info!("Using simulated module");
        return Ok(Box::new(SimulatedModule::new()));
    }
    Ok(Box::new(SerialTransport::open(&config.serial)?))
}

fn monitored(link: BoxedTransport, printer: PrinterConfig) -> BoxedTransport {
    Box::new(PrinterTransport::wrap(link, printer))
}

fn cmd_ports() -> Result<()> {
    let ports = list_ports()?;
    if ports.is_empty() {
        println!("No serial ports found");
        return Ok(());
    }
    for (path, description) in ports {
        println!("{:<24} {}", path, description);
    }
    Ok(())
}

fn cmd_init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let config = ConsoleConfig::default();
    config.save(path)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}
