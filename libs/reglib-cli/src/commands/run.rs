// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use parking_lot::Mutex;
use reglib::core::runner::step_delay;
use reglib::prelude::*;

use super::load_machine;

pub async fn execute(
    machine_file: PathBuf,
    register_overrides: Vec<String>,
    realtime: bool,
    speed: u8,
    max_steps: usize,
) -> Result<()> {
    let mut machine = load_machine(&machine_file)?;

    for assignment in &register_overrides {
        let (index, value) = parse_register_override(assignment)?;
        machine.registers_mut().set(index, value);
    }

    let name = if machine.name().is_empty() {
        "Machine"
    } else {
        machine.name()
    };
    println!(
        "{}: {} nodes, {} connectors",
        name,
        machine.node_count(),
        machine.connector_count()
    );

    if realtime {
        machine.set_play_speed(speed);
        run_realtime(machine, speed, max_steps).await?;
    } else {
        run_fast(&mut machine, max_steps)?;
        print_outcome(&machine);
    }

    Ok(())
}

/// Step as fast as possible, no timer.
fn run_fast(machine: &mut Machine, max_steps: usize) -> Result<()> {
    let mut steps = 0usize;
    while machine.step() {
        steps += 1;
        if steps >= max_steps {
            bail!(
                "Machine did not halt within {} steps (use --max-steps to raise the cap)",
                max_steps
            );
        }
    }
    println!("Halted after {} steps", steps);
    Ok(())
}

/// Drive the timer-based run loop and wait for it to stop playing.
async fn run_realtime(machine: Machine, speed: u8, max_steps: usize) -> Result<()> {
    let machine = Arc::new(Mutex::new(machine));
    let mut runner = Runner::new(Arc::clone(&machine));

    tracing::info!(speed, "Starting run loop");
    runner.play_pause();

    // The run loop owns stepping; this task just watches for it to stop,
    // bounding the wait so a start-less machine (which keeps reporting
    // progress) cannot spin forever.
    let poll = Duration::from_millis(50);
    let budget = step_delay(speed) * (max_steps as u32).max(1);
    let mut waited = Duration::ZERO;
    loop {
        tokio::time::sleep(poll).await;
        waited += poll;
        if !machine.lock().is_playing() {
            break;
        }
        if waited > budget {
            runner.stop();
            bail!("Run loop exceeded its step budget, stopping");
        }
    }

    print_outcome(&machine.lock());
    Ok(())
}

fn print_outcome(machine: &Machine) {
    match machine.active_node() {
        Some(id) => println!("Stopped at node {}", id),
        None => println!("Stopped before reaching a node"),
    }
    if machine.registers().is_empty() {
        println!("All registers are 0");
        return;
    }
    println!("Registers:");
    for (index, value) in machine.registers().iter() {
        println!("  r{} = {}", index, value);
    }
}

fn parse_register_override(assignment: &str) -> Result<(u32, i64)> {
    let (index, value) = assignment
        .split_once('=')
        .with_context(|| format!("Expected INDEX=VALUE, got '{}'", assignment))?;
    let index = index
        .trim()
        .parse::<u32>()
        .with_context(|| format!("Invalid register index '{}'", index))?;
    let value = value
        .trim()
        .parse::<i64>()
        .with_context(|| format!("Invalid register value '{}'", value))?;
    Ok((index, value))
}
