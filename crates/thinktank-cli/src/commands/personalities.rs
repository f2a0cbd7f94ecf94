//! Personalities command - list, inspect and add debaters
//!
//! Usage:
//! ```bash
//! thinktank personalities list
//! thinktank personalities show socrates
//! thinktank personalities add hypatia.json
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use thinktank_core::Personality;
use thinktank_runtime::{JsonDirectoryRepository, PersonalityRepository};

/// Arguments for the personalities command
#[derive(Args)]
pub struct PersonalitiesArgs {
    #[command(subcommand)]
    command: PersonalitiesCommand,
}

#[derive(Subcommand)]
pub enum PersonalitiesCommand {
    /// List all personalities
    #[command(name = "list")]
    List,

    /// Show one personality and its composed system prompt
    #[command(name = "show")]
    Show {
        /// Name of the personality (case-insensitive)
        name: String,

        /// Output raw JSON
        #[arg(long)]
        raw: bool,
    },

    /// Add a personality from a JSON file
    #[command(name = "add")]
    Add {
        /// Path to the personality JSON
        file: PathBuf,
    },
}

/// Run the personalities command
pub async fn run(args: PersonalitiesArgs, dir: &Path) -> Result<()> {
    let repository = JsonDirectoryRepository::open(dir)
        .await
        .with_context(|| format!("Failed to open {}", dir.display()))?;

    match args.command {
        PersonalitiesCommand::List => list(&repository).await,
        PersonalitiesCommand::Show { name, raw } => show(&repository, &name, raw).await,
        PersonalitiesCommand::Add { file } => add(&repository, &file).await,
    }
}

async fn list(repository: &JsonDirectoryRepository) -> Result<()> {
    let personalities = repository.all().await?;
    if personalities.is_empty() {
        crate::print_warning(&format!(
            "No personalities in {}",
            repository.dir().display()
        ));
        return Ok(());
    }

    println!("{}", "🏛 ThinkTank Personalities".bold().cyan());
    println!();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Name").fg(Color::Cyan),
            Cell::new("School").fg(Color::Cyan),
            Cell::new("Description").fg(Color::Cyan),
            Cell::new("Models").fg(Color::Cyan),
        ]);

    for personality in &personalities {
        let models: Vec<String> = personality
            .model_preferences
            .iter()
            .map(|pref| format!("{}/{}", pref.provider, pref.model))
            .collect();

        table.add_row(vec![
            Cell::new(&personality.name).fg(Color::Green),
            Cell::new(personality.philosophical_school.as_deref().unwrap_or("-")),
            Cell::new(&personality.description),
            Cell::new(if models.is_empty() {
                "default".to_string()
            } else {
                models.join(", ")
            })
            .fg(Color::Yellow),
        ]);
    }

    println!("{table}");
    println!();
    println!(
        "Start a debate: {}",
        "thinktank debate \"<topic>\" --debaters a,b".green()
    );

    Ok(())
}

async fn show(repository: &JsonDirectoryRepository, name: &str, raw: bool) -> Result<()> {
    let Some(personality) = repository.get(name).await? else {
        let available = repository.list().await?;
        anyhow::bail!(
            "Unknown personality '{}'. Available: {}",
            name,
            available.join(", ")
        );
    };

    if raw {
        println!("{}", serde_json::to_string_pretty(&personality)?);
        return Ok(());
    }

    println!("{}", personality.name.bold().cyan());
    println!("{}", "═".repeat(50).cyan());
    println!("{}", personality.composed_system_prompt());
    Ok(())
}

async fn add(repository: &JsonDirectoryRepository, file: &Path) -> Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let personality: Personality = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid personality JSON in {}", file.display()))?;
    let name = personality.name.clone();

    repository.add(personality).await?;
    crate::print_success(&format!(
        "Added {} to {}",
        name.green(),
        repository.dir().display()
    ));
    Ok(())
}
