mod detector;
mod device;
mod dispatch;

use anyhow::{Context, Result};
use detector::{DetectorConfig, DetectorInput, EventSource, LineEventSource, TcpEventSource};
use device::{ExecutableTable, ProcessRunner};
use dispatch::{DeviceDispatcher, DispatchConfig};
use fpga_dispatch_shared::mapping::STANDARD_ENTRIES;
use fpga_dispatch_shared::{DeviceKind, DeviceMapping};

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let detector_config = DetectorConfig {
        input: DetectorInput::from_arg(std::env::args().nth(1).as_deref()),
        ..Default::default()
    };
    let executables = ExecutableTable::default();
    let dispatch_config = DispatchConfig {
        executables: executables.clone(),
        ..Default::default()
    };

    let mapping = DeviceMapping::new(&STANDARD_ENTRIES).context("Invalid device mapping")?;

    info!("FPGA dispatcher starting ({} labels mapped)", mapping.len());
    for kind in DeviceKind::ALL {
        info!("  {:<10} {}", kind.to_string(), executables.path_for(kind).display());
    }

    let mut source: Box<dyn EventSource> = match &detector_config.input {
        DetectorInput::Tcp { address } => {
            info!("  Detector: tcp://{}", address);
            Box::new(TcpEventSource::new(address.clone(), detector_config.clone()))
        }
        DetectorInput::Stdin => {
            info!("  Detector: stdin");
            Box::new(LineEventSource::stdin())
        }
    };

    let runner = ProcessRunner::new(executables);
    let mut dispatcher = DeviceDispatcher::new(dispatch_config, mapping, runner);

    tokio::select! {
        result = dispatcher.run(&mut source) => {
            if let Err(e) = result {
                error!("Detector stream failed: {:#}", e);
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            let summary = dispatcher.summary();
            info!(
                "Shutting down: {} events, {} commands ({} failed)",
                summary.events, summary.commands, summary.command_failures
            );
        }
    }

    Ok(())
}
