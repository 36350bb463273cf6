//! Detect command implementation

use std::fmt::Write as _;
use std::sync::Arc;

use crate::cache::TimedCache;
use crate::cli::DetectArgs;
use crate::config::Config;
use crate::environment::{Environment, EnvironmentInfo};
use crate::error::{EnvscopeError, Result};
use crate::probe::Probes;

/// Run the detect command
pub fn run(args: DetectArgs, config: &Config) -> Result<()> {
    let mut options = config.detector_options();
    if args.no_cache {
        options.cache = false;
    }
    let asynchronous = args.asynchronous || options.asynchronous;

    let env = Environment::with_probes(
        Probes::system(config.command_timeout()),
        Arc::new(TimedCache::new()),
        options,
        &config.mode.variable,
    );

    let info = if asynchronous {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .map_err(EnvscopeError::Runtime)?;
        runtime.block_on(env.snapshot_async())
    } else {
        env.snapshot()
    };

    let output = if args.json {
        serde_json::to_string_pretty(&info)?
    } else {
        format_report(&info)
    };
    println!("{}", output);

    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Human-readable multi-line report.
pub fn format_report(info: &EnvironmentInfo) -> String {
    let mut out = String::new();

    let os = &info.os;
    let _ = writeln!(
        out,
        "OS:          {} {} ({}, {})",
        os.os_type, os.release, os.platform, os.arch
    );

    let container = &info.container;
    match container.container_type {
        Some(kind) => {
            let _ = write!(out, "Container:   {}", kind);
            if container.is_wsl {
                if let Some(version) = container.wsl_version {
                    let _ = write!(out, " wsl{}", version);
                }
                if let Some(distro) = &container.wsl_distro {
                    let _ = write!(out, " [{}]", distro);
                }
            }
            out.push('\n');
        }
        None => out.push_str("Container:   none\n"),
    }

    let ci = &info.ci;
    if ci.is_ci {
        let _ = writeln!(
            out,
            "CI:          {}{}",
            ci.name.as_deref().unwrap_or("Unknown CI"),
            if ci.is_pr == Some(true) { " (pull request)" } else { "" }
        );
    } else {
        out.push_str("CI:          none\n");
    }

    let cloud = &info.cloud;
    match cloud.provider {
        Some(provider) => {
            let _ = write!(out, "Cloud:       {}", provider);
            if cloud.is_serverless {
                out.push_str(" serverless");
            }
            if let Some(function) = &cloud.function_name {
                let _ = write!(out, " function={}", function);
            }
            if let Some(region) = &cloud.region {
                let _ = write!(out, " region={}", region);
            }
            out.push('\n');
        }
        None => out.push_str("Cloud:       none\n"),
    }

    let privileges = &info.privileges;
    let _ = writeln!(
        out,
        "User:        {} (uid {}), elevated: {}",
        privileges.username.as_deref().unwrap_or("unknown"),
        privileges
            .uid
            .map_or_else(|| "-".to_string(), |uid| uid.to_string()),
        yes_no(privileges.is_elevated)
    );

    let _ = writeln!(out, "Runtime:     {}", info.runtime.version);
    let _ = write!(out, "Mode:        {}", info.mode.mode);

    out
}
