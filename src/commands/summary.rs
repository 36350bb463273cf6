//! Summary command implementation

use crate::config::Config;
use crate::environment::Environment;
use crate::error::Result;

/// Run the summary command
pub fn run(config: &Config) -> Result<()> {
    let env = Environment::new(config);
    println!("{}", env.summary());
    Ok(())
}
