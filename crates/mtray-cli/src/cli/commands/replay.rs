//! Scenario replay command.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use mtray_core::TrayConfig;

use crate::scenario::{Runner, Scenario};
use crate::snapshot;

pub fn run(config: TrayConfig, file: &Path, print_signals: bool) -> Result<()> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("read scenario '{}'", file.display()))?;
    let scenario = Scenario::from_json(&raw)
        .with_context(|| format!("scenario '{}'", file.display()))?;

    let mut runner = Runner::new(config);
    for step in &scenario.steps {
        runner.apply(step);
    }
    runner.settle();

    println!("{}", snapshot::render(&runner.tray));

    if print_signals {
        println!();
        println!("Signals:");
        for signal in runner.tray.take_signals() {
            println!("  {signal:?}");
        }
    }

    runner.shutdown();
    Ok(())
}
