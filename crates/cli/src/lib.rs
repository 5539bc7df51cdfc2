pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "panier",
    about = "Panier grocery assistant CLI",
    long_about = "Talk to the sales assistant, browse the seeded catalog, and inspect runtime configuration.",
    after_help = "Examples:\n  panier chat \"Do you have apples?\"\n  panier search fruits\n  panier recommend --product-id prod_001\n  panier doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Send one message to the sales assistant and print its reply",
        after_help = "Example prompts:\n  panier chat \"Do you have fresh apples?\"\n  panier chat \"Add 2 kg of apples to my cart\"\n  panier chat \"What goes well with milk?\"\n  panier chat \"Place my order\""
    )]
    Chat {
        #[arg(required = true, help = "The message to send")]
        message: Vec<String>,
        #[arg(long, default_value = "local", help = "User identity for the session")]
        user: String,
    },
    #[command(about = "Search the product catalog")]
    Search {
        #[arg(help = "Search terms matched against name, category, and description")]
        query: String,
    },
    #[command(about = "List the product categories")]
    Categories,
    #[command(about = "Show product recommendations")]
    Recommend {
        #[arg(long, help = "Recommend products from the same category as this product")]
        product_id: Option<String>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, API key readiness, and catalog integrity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Chat { message, user } => commands::chat::run(&message.join(" "), &user),
        Command::Search { query } => {
            commands::CommandResult { exit_code: 0, output: commands::search::run(&query) }
        }
        Command::Categories => {
            commands::CommandResult { exit_code: 0, output: commands::categories::run() }
        }
        Command::Recommend { product_id } => commands::CommandResult {
            exit_code: 0,
            output: commands::recommend::run(product_id.as_deref()),
        },
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
