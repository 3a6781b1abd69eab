// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::path::PathBuf;

use anyhow::{bail, Result};

use super::load_machine;

pub fn execute(machine_file: PathBuf, format: &str) -> Result<()> {
    let mut machine = load_machine(&machine_file)?;

    match format {
        "dot" => println!("{}", machine.to_graphviz()),
        "json" => {
            let definition = machine.save_definition();
            println!("{}", serde_json::to_string_pretty(&definition)?);
        }
        other => bail!("Unknown format '{}', expected 'dot' or 'json'", other),
    }

    Ok(())
}
