//! Check command implementation

use crate::cli::{CheckArgs, CheckFlag};
use crate::config::Config;
use crate::environment::Environment;
use crate::error::Result;

/// Run the check command. Returns the flag's value so the caller can map
/// it to an exit status.
pub fn run(args: CheckArgs, config: &Config) -> Result<bool> {
    let env = Environment::new(config);
    let value = evaluate(&env, args.flag);
    tracing::debug!(flag = ?args.flag, value, "check evaluated");
    println!("{}", value);
    Ok(value)
}

/// Read one flag through its facade accessor.
pub fn evaluate(env: &Environment, flag: CheckFlag) -> bool {
    match flag {
        CheckFlag::Windows => env.is_windows(),
        CheckFlag::Macos => env.is_macos(),
        CheckFlag::Linux => env.is_linux(),
        CheckFlag::Container => env.is_container(),
        CheckFlag::Docker => env.is_docker(),
        CheckFlag::Wsl => env.is_wsl(),
        CheckFlag::Kubernetes => env.is_kubernetes(),
        CheckFlag::Ci => env.is_ci(),
        CheckFlag::Cloud => env.is_cloud(),
        CheckFlag::Serverless => env.is_serverless(),
        CheckFlag::Elevated => env.is_elevated(),
        CheckFlag::Development => env.is_development(),
        CheckFlag::Production => env.is_production(),
    }
}
