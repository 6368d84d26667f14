//! `config` command handler.

use anyhow::Result;
use jarvis_core::config::{Config, validate_config};

use crate::bootstrap::CliContext;
use crate::config_commands::ConfigCommand;
use crate::error::CliError;

const REDACTED: &str = "********";

pub async fn execute(ctx: &mut CliContext, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let config = ctx.session.load_config().await?;
            println!("{}", serde_json::to_string_pretty(&redacted(config))?);
        }
        ConfigCommand::Path => println!("{}", ctx.paths.config_path().display()),
        ConfigCommand::Validate => {
            let config = ctx.session.load_config().await?;
            validate_config(&config).map_err(|e| CliError::Config(e.to_string()))?;
            let missing = config.missing_voice_credentials();
            if missing.is_empty() {
                println!("✓ Configuration is valid.");
            } else {
                println!("✓ Configuration is valid; voice needs: {}", missing.join(", "));
            }
        }
        ConfigCommand::SetKey { name, value } => {
            let mut config = ctx.session.load_config().await?;
            *name.slot(&mut config) = value.trim().to_string();
            ctx.session.save_config(config).await?;
            println!("✓ {name:?} key saved.");
        }
    }
    Ok(())
}

/// Replace every non-empty credential with a placeholder.
fn redacted(mut config: Config) -> Config {
    for key in [
        &mut config.porcupine_key,
        &mut config.gemini_key,
        &mut config.elevenlabs_key,
    ] {
        if !key.is_empty() {
            *key = REDACTED.to_string();
        }
    }
    config
}
