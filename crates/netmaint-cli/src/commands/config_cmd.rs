//! Config subcommand handlers.

use clap::ValueEnum;
use owo_colors::OwoColorize;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, SecretName};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::{output, secrets};

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: starter config file ───────────────────────────────
        ConfigCommand::Init => {
            let path = config::config_path();
            if path.exists() {
                eprintln!("Config already exists at {}", path.display());
                return Ok(());
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let toml_str = toml::to_string_pretty(&Config::default()).map_err(|e| {
                CliError::Internal {
                    message: format!("failed to serialize starter config: {e}"),
                }
            })?;
            std::fs::write(&path, toml_str)?;

            eprintln!("✓ Configuration written to {}", path.display());
            eprintln!("  Store the secrets next: netmaint config set-secret primary-user");
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = output::render_report(&global.output, &cfg, |c| format!("{c:#?}"));
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── SetSecret ───────────────────────────────────────────────
        ConfigCommand::SetSecret(args) => {
            let value = match args.value {
                Some(v) => v,
                None => rpassword::prompt_password(format!("{}: ", args.name.account()))?,
            };
            if value.is_empty() {
                return Err(CliError::Credential {
                    message: "secret value cannot be empty".into(),
                });
            }

            secrets::store_secret(args.name, &value)?;
            eprintln!("✓ Stored '{}' in the system keyring", args.name.account());
            Ok(())
        }

        // ── Check ───────────────────────────────────────────────────
        ConfigCommand::Check => {
            let mut missing = 0;
            for name in SecretName::value_variants() {
                let account = name.account();
                match secrets::read_secret(*name) {
                    Ok(_) => println!("{account:<18} {}", "present".green()),
                    Err(CliError::MissingSecret { .. }) => {
                        missing += 1;
                        println!("{account:<18} {}", "missing".red());
                    }
                    Err(e) => return Err(e),
                }
            }
            if missing > 0 {
                return Err(CliError::Credential {
                    message: format!("{missing} secret(s) missing"),
                });
            }
            Ok(())
        }
    }
}
