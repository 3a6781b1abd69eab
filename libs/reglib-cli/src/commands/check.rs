// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::path::PathBuf;

use anyhow::{bail, Result};

use super::load_machine;

pub fn execute(machine_file: PathBuf) -> Result<()> {
    let mut machine = load_machine(&machine_file)?;

    let start_count = machine.nodes().filter(|node| node.is_start()).count();
    let errors: Vec<u32> = {
        let derived = machine.derived();
        let mut ids: Vec<u32> = derived.connector_errors.iter().copied().collect();
        ids.sort_unstable();
        ids
    };

    match start_count {
        0 => println!("warning: no START node, stepping will never enter the machine"),
        1 => {}
        n => println!("warning: {} START nodes, the first found wins", n),
    }

    if errors.is_empty() {
        println!("ok: no connector errors");
    } else {
        for id in &errors {
            println!("error: connector {} is structurally invalid", id);
        }
        bail!("{} connector error(s)", errors.len());
    }

    Ok(())
}
