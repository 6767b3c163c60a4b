//! CLI interface for catalog-engine

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::catalog::{UserContext, ViewType};
use crate::config::{self, Config};
use crate::gateway::Gateway;
use crate::search::{SearchFilters, SortOrder};

#[derive(Parser)]
#[command(name = "catalog-engine")]
#[command(about = "Catalog search, ViewType rules and learning analytics behind a resource/tool gateway", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (default: platform config directory)
    #[arg(short, long, global = true, env = "CATALOG_ENGINE_CONFIG")]
    config: Option<PathBuf>,

    /// Catalog snapshot to load instead of the configured one
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Identity passed to user-scoped resources and tools
#[derive(clap::Args, Debug, Default)]
struct IdentityArgs {
    /// User id
    #[arg(short, long)]
    user: Option<String>,
    /// Site / organisation id
    #[arg(long)]
    site: Option<String>,
    /// Locale, e.g. en-US
    #[arg(long)]
    locale: Option<String>,
    /// Comma-separated role names
    #[arg(long, value_delimiter = ',')]
    roles: Vec<String>,
}

impl IdentityArgs {
    fn context(&self) -> Option<UserContext> {
        let user_id = self.user.as_deref()?;
        let mut user = UserContext::new(user_id).with_roles(self.roles.iter().cloned());
        user.site_id = self.site.clone();
        user.locale = self.locale.clone();
        Some(user)
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Order {
    Asc,
    Desc,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },
    /// Search published catalog items
    Search {
        /// Free-text query
        query: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Content-type id
        #[arg(long)]
        content_type: Option<u32>,
        /// ViewType (1, 2 or 3)
        #[arg(long)]
        view_type: Option<u8>,
        /// Sort field (title, rating, enrollment, createdAt, duration, viewType)
        #[arg(long)]
        sort_by: Option<String>,
        #[arg(long, value_enum)]
        order: Option<Order>,
        #[arg(short, long, default_value = "10")]
        limit: usize,
        #[arg(long, default_value = "0")]
        offset: usize,
    },
    /// Read a catalog:// resource and print it as JSON
    Resource {
        /// Resource URI, e.g. catalog://stats
        uri: String,
        #[command(flatten)]
        identity: IdentityArgs,
    },
    /// Call a tool with JSON arguments
    Tool {
        /// Tool name; `list` prints every tool
        name: String,
        /// JSON arguments
        #[arg(default_value = "{}")]
        arguments: String,
        #[command(flatten)]
        identity: IdentityArgs,
    },
    /// Check ViewType consistency
    Validate {
        /// Repair every fixable issue
        #[arg(short, long)]
        fix: bool,
        /// Write the repaired catalog back to the snapshot file
        #[arg(short, long)]
        write: bool,
    },
    /// Reclassify every item by business rule
    ApplyRules {
        /// Write the result back to the snapshot file
        #[arg(short, long)]
        write: bool,
    },
    /// Override the ViewType of one item
    SetViewType {
        /// Item id
        id: String,
        /// 1 = Direct View, 2 = My Learning, 3 = Cart
        view_type: u8,
        /// Custom direct-view URL (ViewType 1 only)
        #[arg(long)]
        url: Option<String>,
        /// Write the result back to the snapshot file
        #[arg(short, long)]
        write: bool,
    },
    /// Show or initialise the configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
        /// Write a default configuration file
        #[arg(long)]
        init: bool,
    },
}

fn load_config(path: Option<&Path>, catalog: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(catalog) = catalog {
        config.catalog.snapshot_path = Some(catalog.to_path_buf());
    }
    Ok(config)
}

fn parse_view_type(value: u8) -> Result<ViewType> {
    ViewType::try_from(value).map_err(anyhow::Error::msg)
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn snapshot_path(config: &Config) -> Result<&Path> {
    config
        .catalog
        .snapshot_path
        .as_deref()
        .context("No catalog snapshot configured (use --catalog or [catalog].snapshot_path)")
}

fn persist(gateway: &Gateway, config: &Config, write: bool) -> Result<()> {
    if write {
        let path = snapshot_path(config)?;
        let count = gateway.catalog().save_snapshot(path)?;
        println!("✓ Wrote {} items to {}", count, path.display());
    }
    Ok(())
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show, init } => {
            run_config(cli.config.as_deref(), cli.catalog.as_deref(), show, init)
        }
        command => {
            let config = load_config(cli.config.as_deref(), cli.catalog.as_deref())?;
            run_command(command, config).await
        }
    }
}

async fn run_command(command: Commands, config: Config) -> Result<()> {
    let gateway = Gateway::from_config(&config)?;

    match command {
        Commands::Serve { port, host } => {
            let mut server = config.server.clone();
            if let Some(port) = port {
                server.port = port;
            }
            if let Some(host) = host {
                server.host = host;
            }
            crate::server::start(Arc::new(gateway), &server).await?;
        }
        Commands::Search { query, category, content_type, view_type, sort_by, order, limit, offset } => {
            let view_type = view_type.map(parse_view_type).transpose()?;
            let filters = SearchFilters {
                query,
                category,
                content_type_id: content_type,
                view_type,
                sort_by,
                sort_order: order.map(|o| match o {
                    Order::Asc => SortOrder::Asc,
                    Order::Desc => SortOrder::Desc,
                }),
                limit: Some(limit),
                offset: Some(offset),
                ..Default::default()
            };
            let results = gateway.catalog().search(&filters, None)?;
            println!("Found {} items (showing {})", results.total, results.items.len());
            println!();
            for item in &results.items {
                println!(
                    "  {:<12} {:<40} {:<18} ViewType {}",
                    item.id,
                    item.title,
                    item.content_type_label(),
                    item.view_type
                );
            }
            if results.has_more {
                println!();
                println!("More results: --offset {}", offset + limit);
            }
        }
        Commands::Resource { uri, identity } => {
            let user = identity.context();
            let value = gateway.read_resource(&uri, user.as_ref()).await?;
            print_json(&value)?;
        }
        Commands::Tool { name, arguments, identity } => {
            if name == "list" {
                for tool in gateway.list_tools() {
                    println!("  {:<26} {}", tool.name, tool.description);
                }
                return Ok(());
            }
            let args: serde_json::Value =
                serde_json::from_str(&arguments).context("Tool arguments must be valid JSON")?;
            let user = identity.context();
            let result = gateway.call_tool(&name, args, user.as_ref()).await?;
            print_json(&result)?;
            if !result.success {
                std::process::exit(2);
            }
        }
        Commands::Validate { fix, write } => {
            let report = gateway.catalog().validation_report()?;
            println!("Checked {} items: {} issues ({} fixable, {} unfixable)",
                report.checked, report.issues.len(), report.fixable, report.unfixable);
            for issue in &report.issues {
                println!();
                println!("  ✗ {} ({})", issue.item_id, issue.title);
                println!("    {}", issue.issue);
                println!("    → {}", issue.suggestion);
            }
            if fix {
                let fixed = gateway.catalog().auto_fix_view_type_issues()?;
                let remaining = gateway.catalog().validate_view_type_consistency()?.len();
                println!();
                println!("✓ Fixed {} items, {} issues remain", fixed, remaining);
                persist(&gateway, &config, write)?;
            } else if write {
                bail!("--write requires --fix");
            }
        }
        Commands::ApplyRules { write } => {
            let changed = gateway.catalog().apply_business_rules_for_view_types()?;
            println!("✓ Reclassified {} items", changed);
            persist(&gateway, &config, write)?;
        }
        Commands::SetViewType { id, view_type, url, write } => {
            let view_type = parse_view_type(view_type)?;
            let item = gateway
                .catalog()
                .update_item_view_type(&id, view_type, url.as_deref())?;
            println!("✓ {} is now ViewType {} ({})", item.id, view_type, view_type.label());
            if let Some(url) = &item.direct_view_url {
                println!("  URL: {}", url);
            }
            persist(&gateway, &config, write)?;
        }
        Commands::Config { show, init } => run_config(None, None, show, init)?,
    }

    Ok(())
}

fn run_config(path: Option<&Path>, catalog: Option<&Path>, show: bool, init: bool) -> Result<()> {
    let explicit = path;
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => config::config_path()?,
    };
    if init {
        if path.exists() {
            println!("Config already exists at {}", path.display());
        } else {
            Config::default().save_to(&path)?;
            println!("✓ Wrote default configuration to {}", path.display());
        }
    }
    if show {
        let config = load_config(explicit, catalog)?;
        println!("Config file: {}", path.display());
        config::show_config(&config);
    }
    if !show && !init {
        println!("Configuration options:");
        println!("  --show   Display current configuration");
        println!("  --init   Write a default configuration file");
        println!();
        println!("Default configuration:");
        println!();
        print!("{}", config::default_config_toml());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_identity_args() {
        let cli = Cli::parse_from(["catalog-engine", "resource", "catalog://my-learning", "-u", "u1", "--roles", "manager,sales"]);
        let Commands::Resource { identity, .. } = cli.command else {
            panic!("expected resource command");
        };
        let user = identity.context().unwrap();
        assert_eq!(user.user_id, "u1");
        assert_eq!(user.roles, vec!["manager", "sales"]);

        assert!(IdentityArgs::default().context().is_none());
    }
}
