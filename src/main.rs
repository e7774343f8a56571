use std::process;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crosstalk::{spawn_team, Command, Config, Plugin, PluginSet};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "teams.toml".to_string());
    let config = match Config::load(&config_path).await {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };
    if config.teams.is_empty() {
        error!("no teams configured in {}", config_path);
        process::exit(1);
    }

    let plugins = Arc::new(builtin_plugins());

    let mut tasks = Vec::new();
    for team in config.teams {
        info!("starting {} adapter", team.adapter.as_str());
        tasks.push(spawn_team(Arc::new(team), plugins.clone()));
    }

    tokio::signal::ctrl_c().await.ok();
    info!("shutting down");
    for task in tasks {
        task.abort();
    }
}

/// Plugins that ship with the binary. Library embedders register their own
/// set instead.
fn builtin_plugins() -> PluginSet {
    let mut plugins = PluginSet::new();

    let ping = Command::trigger(r"^ping\b", "!ping", |inv| async move {
        inv.bot.reply(&inv.message, "pong").await;
    });
    match ping {
        Ok(command) => plugins.register(Plugin::new("ping").with_command(command)),
        Err(e) => error!("failed to register ping plugin: {}", e),
    }

    plugins
}
