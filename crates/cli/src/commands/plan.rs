use std::process::ExitCode;

use anyhow::Result;
use arestor_core::provisioner::{InstallAction, Provisioner};
use colored::*;

pub fn execute(provisioner: &Provisioner, action: InstallAction) -> Result<ExitCode> {
    println!("{} {}", "Execution plan for".bold(), action.name().cyan());

    let tasks = provisioner
        .plan(action)
        .map_err(|e| anyhow::anyhow!("Failed to get execution plan: {}", e))?;

    println!("\n{}:", "Execution order".bold());
    for (i, task) in tasks.iter().enumerate() {
        println!("  {}. {}", i + 1, task);
    }

    Ok(ExitCode::SUCCESS)
}
