mod config;
mod file_source;
mod telemetry;

use std::{
    io::{self, BufWriter, Write},
    sync::Arc,
};

use anyhow::Context;
use clap::Parser;
use config::{CliArgs, CliConfig};
use file_source::FileEpochSource;
use telemetry::init_telemetry;
use wuid::{TracingLogger, Wuid};

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = CliConfig::try_from(args)?;

    init_telemetry()?;
    log_startup_info(&config);

    let wuid = build_wuid(&config)?;
    let source = FileEpochSource::new(&config.epoch_file);
    wuid.load_h24_and_renew(source)
        .map_err(|err| anyhow::anyhow!(err))
        .with_context(|| {
            format!(
                "failed to load an epoch from {}",
                config.epoch_file.display()
            )
        })?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for _ in 0..config.count {
        let id = wuid.next();
        if config.hex {
            writeln!(out, "{id:016x}")?;
        } else {
            writeln!(out, "{id}")?;
        }
    }
    out.flush()?;

    tracing::debug!(last = wuid.current(), epoch = wuid.epoch(), "done");
    Ok(())
}

fn build_wuid(config: &CliConfig) -> anyhow::Result<Wuid> {
    let builder = Wuid::builder(config.tag.clone()).logger(Arc::new(TracingLogger));
    let builder = match config.shard {
        Some(shard) => builder.shard(shard.get()),
        None => builder,
    };
    Ok(builder.build()?)
}

fn log_startup_info(config: &CliConfig) {
    if cfg!(debug_assertions) {
        tracing::debug!("Starting wuid with full config: {:#?}", config);
    } else {
        tracing::debug!(
            "Starting wuid {} for {} ids",
            config.tag,
            config.count
        );
    }
}
