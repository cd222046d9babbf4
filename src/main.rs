//! Waypoint CLI - manage a link directory stored as one JSON document.

use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;
use waypoint::cli::{CacheCommands, CategoryCommands, Cli, Commands, ConfigCommands, ItemCommands};
use waypoint::commands::{self, Output};
use waypoint::config::{LogLevel, ResolvedSettings, SettingsOverrides, resolve_settings};
use waypoint::storage::Store;

fn main() {
    let cli = Cli::parse();
    let human = cli.human_readable;

    let overrides = SettingsOverrides {
        config_path: cli.config_path.clone(),
        document_path: cli.document_path.clone(),
        images_dir: cli.images_dir.clone(),
        cache_ttl: cli.cache_ttl,
        lock_timeout_ms: cli.lock_timeout_ms,
    };

    let result = resolve_settings(&overrides).and_then(|settings| {
        init_tracing(settings.log_level.value);
        tracing::debug!(
            environment = %settings.environment,
            document = %settings.document_path.value.display(),
            "Resolved settings"
        );
        run_command(cli.command, &settings, human)
    });

    // Handle result
    if let Err(e) = result {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

/// Log to stderr so stdout stays machine-readable. `RUST_LOG` wins over the
/// resolved level.
fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("waypoint={}", level)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run_command(
    command: Option<Commands>,
    settings: &ResolvedSettings,
    human: bool,
) -> Result<(), waypoint::Error> {
    // Config inspection never touches the document.
    if let Some(Commands::Config {
        command: ConfigCommands::Show,
    }) = command
    {
        output(&commands::config_show(settings), human);
        return Ok(());
    }

    settings.ensure_directories()?;
    let store = Store::open(&settings.document_path.value, settings.store_options())?;

    match command {
        None => {
            let result = commands::summary(&store)?;
            output(&result, human);
        }

        Some(Commands::Category { command }) => match command {
            CategoryCommands::List => {
                let result = commands::category_list(&store)?;
                output(&result, human);
            }
            CategoryCommands::Show { name } => {
                let result = commands::category_show(&store, &name)?;
                output(&result, human);
            }
            CategoryCommands::Add { name } => {
                let result = commands::category_add(&store, &name)?;
                output(&result, human);
            }
            CategoryCommands::Remove { name } => {
                let result = commands::category_remove(&store, &name)?;
                output(&result, human);
            }
            CategoryCommands::Rename { old, new } => {
                let result = commands::category_rename(&store, &old, &new)?;
                output(&result, human);
            }
            CategoryCommands::Reorder { names } => {
                let result = commands::category_reorder(&store, &names)?;
                output(&result, human);
            }
        },

        Some(Commands::Item { command }) => match command {
            ItemCommands::Show { category, title } => {
                let result =
                    commands::item_show(&store, &settings.images_dir.value, &category, &title)?;
                output(&result, human);
            }
            ItemCommands::Add {
                category,
                title,
                url,
                icon,
            } => {
                let result = commands::item_add(&store, &category, &title, &url, &icon)?;
                output(&result, human);
            }
            ItemCommands::Update {
                category,
                title,
                new_title,
                url,
                icon,
            } => {
                let result = commands::item_update(
                    &store,
                    &category,
                    &title,
                    new_title.as_deref(),
                    url.as_deref(),
                    icon.as_deref(),
                )?;
                output(&result, human);
            }
            ItemCommands::Remove { category, title } => {
                let result = commands::item_remove(&store, &category, &title)?;
                output(&result, human);
            }
            ItemCommands::Reorder { category, titles } => {
                let result = commands::item_reorder(&store, &category, &titles)?;
                output(&result, human);
            }
            ItemCommands::Move {
                category,
                title,
                direction,
            } => {
                let result = commands::item_move(&store, &category, &title, &direction)?;
                output(&result, human);
            }
            ItemCommands::Transfer { from, to, title } => {
                let result = commands::item_transfer(&store, &from, &to, &title)?;
                output(&result, human);
            }
        },

        Some(Commands::Cache {
            command: CacheCommands::Invalidate,
        }) => {
            let result = commands::cache_invalidate(&store)?;
            output(&result, human);
        }

        Some(Commands::Config { .. }) => {
            output(&commands::config_show(settings), human);
        }
    }

    Ok(())
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
