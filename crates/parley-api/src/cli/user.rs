//! User bootstrap commands: create, list.
//!
//! These only need the database, so they skip the completion gateway that
//! `serve` requires.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use crate::state::ConcreteChatService;

/// Create a user and print its id.
///
/// ```bash
/// parley user create "Minji"
/// ```
pub async fn create_user(service: &ConcreteChatService, name: &str, json: bool) -> Result<()> {
    let user = service.create_user(name).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Created user {}",
        style("✓").green().bold(),
        style(&user.name).cyan()
    );
    println!("  {} {}", style("ID:").bold(), style(user.id.to_string()).dim());
    println!();

    Ok(())
}

/// List all users, oldest first.
pub async fn list_users(service: &ConcreteChatService, json: bool) -> Result<()> {
    let users = service.list_users().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    if users.is_empty() {
        println!();
        println!(
            "  {} No users found. Create one with: {}",
            style("i").blue().bold(),
            style("parley user create <name>").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("ID").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);

    for user in &users {
        table.add_row(vec![
            Cell::new(&user.name).fg(Color::Cyan),
            Cell::new(user.id.to_string()).fg(Color::DarkGrey),
            Cell::new(format_relative_time(&user.created_at)),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} user{}",
        style(users.len()).bold(),
        if users.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

fn format_relative_time(dt: &chrono::DateTime<chrono::Utc>) -> String {
    let diff = chrono::Utc::now() - *dt;

    if diff.num_minutes() < 1 {
        "just now".to_string()
    } else if diff.num_hours() < 1 {
        format!("{}m ago", diff.num_minutes())
    } else if diff.num_days() < 1 {
        format!("{}h ago", diff.num_hours())
    } else {
        dt.format("%Y-%m-%d").to_string()
    }
}
