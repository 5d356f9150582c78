mod cli;

use hacksteader::config::{self, Config};
use hacksteader_db::models::Hacksteader;
use hacksteader_db::pool::{get_conn, init_pool, open_pool, DbPool};
use hacksteader_db::queries::hacksteaders;
use hacksteader_db::{migrations, schema};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, SteaderCommand};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "hacksteader=debug,hacksteader_db=debug,hacksteader_common=debug".to_string()
        } else {
            "hacksteader=info,hacksteader_db=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = config::load_config_or_default(cli.config.as_deref())?;
    if let Some(path) = cli.database {
        config.database.path = path;
    }

    match cli.command {
        Commands::Migrate { to } => migrate(&config, to),
        Commands::Status => status(&config),
        Commands::Check => check(&config),
        Commands::Schema { json } => print_schema(json),
        Commands::Steader(SteaderCommand::New { user_id, tiles }) => {
            let tiles = tiles.unwrap_or(config.steaders.starting_tiles);
            new_steader(&config, &user_id, tiles)
        }
        Commands::Steader(SteaderCommand::Show { user_id, json }) => {
            show_steader(&config, &user_id, json)
        }
        Commands::Version => {
            println!("hacksteader {}", env!("CARGO_PKG_VERSION"));
            println!("schema version {}", migrations::latest_version());
            Ok(())
        }
    }
}

/// Open the configured database without applying migrations.
fn open_db(config: &Config) -> Result<DbPool> {
    let path = config.database.path.to_string_lossy();
    tracing::debug!("Opening database at {}", path);
    open_pool(&path, &config.database.pool_options())
        .with_context(|| format!("Failed to open database: {}", path))
}

/// Open the configured database and bring it up to date.
fn migrated_db(config: &Config) -> Result<DbPool> {
    let path = config.database.path.to_string_lossy();
    init_pool(&path, &config.database.pool_options())
        .with_context(|| format!("Failed to initialize database: {}", path))
}

fn migrate(config: &Config, to: Option<usize>) -> Result<()> {
    let pool = open_db(config)?;
    let conn = get_conn(&pool)?;

    let applied = match to {
        Some(target) => migrations::run_migrations_to(&conn, target)?,
        None => migrations::run_migrations(&conn)?,
    };
    println!(
        "Applied {} migration(s); schema is at version {}",
        applied,
        migrations::current_version(&conn)?
    );
    Ok(())
}

fn status(config: &Config) -> Result<()> {
    let pool = open_db(config)?;
    let conn = get_conn(&pool)?;

    println!("Database: {}", config.database.path.display());
    println!("Current version: {}", migrations::current_version(&conn)?);
    println!("Latest version: {}", migrations::latest_version());

    let pending = migrations::pending(&conn)?;
    if pending.is_empty() {
        println!("Up to date");
    } else {
        println!("Pending:");
        for m in pending {
            println!("  {:>3}  {}", m.version, m.name);
        }
    }
    Ok(())
}

fn check(config: &Config) -> Result<()> {
    let pool = open_db(config)?;
    let conn = get_conn(&pool)?;

    let version = migrations::current_version(&conn)?;
    if version == 0 {
        println!("Database is not migrated (version 0)");
        anyhow::bail!("Run `hacksteader migrate` before checking the schema");
    }

    let issues = schema::verify(&conn)?;
    if issues.is_empty() {
        println!("Schema OK (version {})", version);
        return Ok(());
    }

    for issue in &issues {
        println!("  {}", issue);
    }
    anyhow::bail!("Schema check found {} issue(s)", issues.len());
}

fn print_schema(json: bool) -> Result<()> {
    if json {
        let doc = serde_json::json!({
            "version": migrations::latest_version(),
            "tables": schema::expected_tables(),
            "composites": schema::composite_types(),
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    for composite in schema::composite_types() {
        let fields: Vec<String> = composite
            .fields
            .iter()
            .map(|(name, ty)| format!("{} {}", name, ty))
            .collect();
        println!("type {} ({})", composite.name, fields.join(", "));
    }

    for table in schema::expected_tables() {
        println!("\n{} (since v{})", table.name, table.since);
        for column in table.columns {
            let mut flags = Vec::new();
            if column.primary_key {
                flags.push("primary key");
            }
            if !column.nullable {
                flags.push("not null");
            }
            if let Some(fk) = table.foreign_keys.iter().find(|f| f.column == column.name) {
                println!(
                    "  {:<18} {:<8} {} -> {}({})",
                    column.name,
                    column.sql_type,
                    flags.join(", "),
                    fk.table,
                    fk.references
                );
            } else {
                println!("  {:<18} {:<8} {}", column.name, column.sql_type, flags.join(", "));
            }
        }
    }
    Ok(())
}

fn new_steader(config: &Config, user_id: &str, tiles: usize) -> Result<()> {
    let pool = migrated_db(config)?;
    let conn = get_conn(&pool)?;

    let steader = match hacksteaders::new_hacksteader(&conn, user_id, tiles) {
        Ok(steader) => steader,
        Err(hacksteader_common::Error::Conflict(_)) => {
            anyhow::bail!("Hacksteader {} already exists", user_id)
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to create hacksteader {}", user_id))
        }
    };
    tracing::info!("Created hacksteader {}", steader.user_id);
    println!(
        "Created hacksteader {} with {} tile(s)",
        steader.user_id,
        steader.land.len()
    );
    Ok(())
}

fn show_steader(config: &Config, user_id: &str, json: bool) -> Result<()> {
    let pool = migrated_db(config)?;
    let conn = get_conn(&pool)?;

    let Some(steader) = hacksteaders::get_hacksteader(&conn, user_id)? else {
        anyhow::bail!("No hacksteader with user id {}", user_id);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&steader)?);
    } else {
        print_steader(&steader);
    }
    Ok(())
}

fn print_steader(steader: &Hacksteader) {
    let profile = &steader.profile;
    println!("Hacksteader: {}", steader.user_id);
    println!("XP: {}", profile.xp);
    println!("Joined: {}", profile.joined.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Last active: {}", profile.last_active.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Last farmed: {}", profile.last_farm.format("%Y-%m-%d %H:%M:%S UTC"));

    println!(
        "\nLand: {} tile(s), {} open",
        steader.land.len(),
        steader.open_tiles().count()
    );
    for (i, land) in steader.land.iter().enumerate() {
        match &land.crop {
            Some(crop) => {
                print!(
                    "  [{}] {} archetype {} ({} xp, {:.1} until yield)",
                    i, land.tile.id, crop.plant.archetype_handle, crop.plant.xp, crop.plant.until_yield
                );
                if let Some(craft) = &crop.craft {
                    print!(
                        ", crafting archetype {} {:.0}%",
                        craft.makes,
                        craft.progress() * 100.0
                    );
                }
                println!();
            }
            None => println!("  [{}] {} empty", i, land.tile.id),
        }
    }

    println!(
        "\nInventory: {} item(s), {} gotchi(s)",
        steader.inventory.len(),
        steader.gotchis().count()
    );
    for item in &steader.inventory {
        match &item.sale {
            Some(sale) => println!(
                "  {} {} (archetype {}) for sale as {:?} at {}gp",
                item.id,
                item.kind.name(),
                item.archetype_handle,
                sale.market_name,
                sale.price
            ),
            None => println!(
                "  {} {} (archetype {})",
                item.id,
                item.kind.name(),
                item.archetype_handle
            ),
        }
    }
}
