// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

pub mod check;
pub mod graph;
pub mod run;

use std::path::Path;

use anyhow::{Context, Result};
use reglib::prelude::*;

/// Load a machine file into a fresh machine.
pub fn load_machine(path: &Path) -> Result<Machine> {
    let definition = MachineFileDefinition::from_json_file(path)
        .with_context(|| format!("Failed to load '{}'", path.display()))?;
    definition
        .validate()
        .with_context(|| format!("Invalid machine in '{}'", path.display()))?;
    let mut machine = Machine::new();
    machine.load_definition(definition);
    Ok(machine)
}
