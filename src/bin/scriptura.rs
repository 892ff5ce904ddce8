//! Command line front-end.
//!
//! ```text
//! scriptura <config.json> init
//! scriptura <config.json> <language> get "Psalm 1:1-6"
//! scriptura <config.json> <language> search "/meroza/gi"
//! ```

use std::env;

use anyhow::{bail, Context};
use scriptura::{bootstrap, Bible, BibleConfig, BibleOptions, CacheConfig};

fn print_help() {
    println!("Usage:");
    println!("  scriptura <config.json> init                        install configured versions");
    println!("  scriptura <config.json> <language> get <reference>  print verses");
    println!("  scriptura <config.json> <language> search <query>   print matching verses");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scriptura=info".into()),
        )
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(config_path) = args.first() else {
        print_help();
        return Ok(());
    };
    if matches!(config_path.as_str(), "help" | "--help" | "-h") {
        print_help();
        return Ok(());
    }

    let config = BibleConfig::from_path(config_path)
        .with_context(|| format!("loading {}", config_path))?;
    let languages = bootstrap::init(&config).await?;

    match args.get(1).map(String::as_str) {
        Some("init") | None => {
            for (language, installed) in languages.iter() {
                println!(
                    "{} | {} @ {} -> {}",
                    language,
                    installed.version.source,
                    installed.version.version,
                    installed.path.display()
                );
            }
            Ok(())
        }
        Some(language) => {
            let (command, argument) = match (args.get(2), args.get(3)) {
                (Some(command), Some(argument)) => (command.as_str(), argument.as_str()),
                _ => {
                    print_help();
                    bail!("expected a command and its argument after the language");
                }
            };
            let options = BibleOptions::new(language);
            let bible = Bible::open(&languages, &options, CacheConfig::default()).await?;

            println!("-------------");
            match command {
                "get" => {
                    for verse in bible.fetch(argument).await?.iter() {
                        println!("{} | {}", verse.verse, verse.text);
                    }
                }
                "search" => {
                    for verse in bible.search(argument).await? {
                        println!("{} {} {} | {}", verse.book, verse.chapter, verse.verse, verse.text);
                    }
                }
                other => {
                    print_help();
                    bail!("unknown command {:?}", other);
                }
            }
            println!("-------------");
            Ok(())
        }
    }
}
