use crate::context::AppContext;

/// Print the effective configuration (secrets are a separate type entirely
/// and never touch `AppConfig`, so there is nothing to redact here).
pub fn run(ctx: &AppContext) -> anyhow::Result<()> {
    let toml = toml::to_string_pretty(&ctx.config)?;
    print!("{toml}");
    Ok(())
}
