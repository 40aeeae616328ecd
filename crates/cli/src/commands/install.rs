use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use arestor_core::configs::ProvisionArgs;
use arestor_core::provisioner::{InstallAction, Provisioner};
use colored::*;
use tracing::{error, info};

use crate::{InstallCommands, RetryArgs};

pub fn execute(provisioner: &Provisioner, command: InstallCommands) -> Result<ExitCode> {
    let (action, args) = resolve(provisioner, command);

    println!("{} {}", "Running install action".bold(), action.name().cyan());
    println!();

    let succeeded = provisioner
        .run(action, args)
        .map_err(|e| anyhow::anyhow!("Failed to run {}: {}", action, e))?;

    println!();
    if succeeded {
        info!("Install action {} succeeded", action);
        println!(
            "{} {}",
            "✓".green().bold(),
            "All tasks completed successfully!".green().bold()
        );
        Ok(ExitCode::SUCCESS)
    } else {
        error!("Install action {} failed", action);
        println!(
            "{} {}",
            "✗".red().bold(),
            format!("Install action '{}' failed", action).red().bold()
        );
        Ok(ExitCode::FAILURE)
    }
}

/// Merge the command line options over the provisioner defaults
fn resolve(provisioner: &Provisioner, command: InstallCommands) -> (InstallAction, ProvisionArgs) {
    match command {
        InstallCommands::Dependences { retry } => {
            let action = InstallAction::Dependences;
            let args = with_retry(provisioner.default_args(action), retry);
            (action, args)
        }
        InstallCommands::Argus {
            user,
            argus_branch,
            tempest_branch,
            build,
            no_venv,
            retry,
        } => {
            let action = InstallAction::Argus;
            let args = ProvisionArgs {
                user,
                argus_branch,
                tempest_branch,
                build: Some(build),
                setup_venv: !no_venv,
                ..provisioner.default_args(action)
            };
            (action, with_retry(args, retry))
        }
    }
}

fn with_retry(mut args: ProvisionArgs, retry: RetryArgs) -> ProvisionArgs {
    if let Some(attempts) = retry.attempts {
        args.attempts = attempts;
    }
    if let Some(seconds) = retry.retry_interval {
        args.retry_interval = Duration::from_secs(seconds);
    }
    args
}
