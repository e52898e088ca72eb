use anyhow::{Context as _, Result};

use crate::Context;
use crate::commands;

/// Run winget with the given arguments, streaming its output.
///
/// Returns winget's own exit code.
pub fn run(ctx: &Context, args: &[String]) -> Result<i32> {
    let client = commands::open_client(ctx)?;
    let code = client
        .run_passthrough(args)
        .with_context(|| format!("Failed to run winget {}", args.join(" ")))?;
    log::debug!("winget exited with {code}");
    Ok(code)
}
