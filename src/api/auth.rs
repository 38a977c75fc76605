use anyhow::{Result, bail};

/// Resolve the campus rewards API credential.
///
/// Priority:
/// 1. `REWARDS_TOKEN` environment variable
/// 2. `CAMPUS_REWARDS_TOKEN` environment variable
pub fn resolve_token() -> Result<String> {
    if let Ok(token) = std::env::var("REWARDS_TOKEN")
        && !token.is_empty()
    {
        return Ok(token);
    }
    if let Ok(token) = std::env::var("CAMPUS_REWARDS_TOKEN")
        && !token.is_empty()
    {
        return Ok(token);
    }

    bail!(
        "no API credential found. \
         Set REWARDS_TOKEN (or CAMPUS_REWARDS_TOKEN) to your bearer token."
    )
}
