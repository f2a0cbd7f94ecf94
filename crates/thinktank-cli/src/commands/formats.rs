//! Formats command - show the debate format catalog

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use thinktank_debate::FormatCatalog;

/// Arguments for the formats command
#[derive(Args)]
pub struct FormatsArgs {
    /// Also print each round's instructions
    #[arg(long)]
    detailed: bool,
}

/// Run the formats command
pub fn run(args: FormatsArgs) -> Result<()> {
    let catalog = FormatCatalog::builtin();

    println!("{}", "📜 Debate Formats".bold().cyan());
    println!();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Name").fg(Color::Cyan),
            Cell::new("Description").fg(Color::Cyan),
            Cell::new("Rounds").fg(Color::Cyan),
        ]);

    for format in catalog.formats() {
        let rounds = if args.detailed {
            format
                .rounds
                .iter()
                .enumerate()
                .map(|(i, round)| format!("{}. {}: {}", i + 1, round.kind, round.description))
                .collect::<Vec<_>>()
                .join("\n")
        } else {
            format
                .rounds
                .iter()
                .map(|round| round.kind)
                .collect::<Vec<_>>()
                .join(" → ")
        };

        table.add_row(vec![
            Cell::new(format.name).fg(Color::Green),
            Cell::new(format.description),
            Cell::new(rounds).fg(Color::Yellow),
        ]);
    }

    println!("{table}");
    println!();
    println!(
        "Pick one: {}",
        "thinktank debate \"<topic>\" --format <name>".green()
    );

    Ok(())
}
