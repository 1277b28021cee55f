//! `aeris check` - validate configuration and storage access.

use crate::commands::{exit_code_for_error, EXIT_OK};
use aeris_pipeline::PipelineConfig;
use aeris_store::{LocalDirStore, ObjectStore};
use colored::Colorize;

pub fn execute() -> i32 {
    println!();
    println!("{}", "Aeris preflight".bold().cyan());

    let config = match PipelineConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            println!("  {} configuration: {e}", "✗".red());
            return exit_code_for_error(&e);
        }
    };
    if let Err(e) = config.validate() {
        println!("  {} configuration: {e}", "✗".red());
        return exit_code_for_error(&e);
    }
    println!("  {} configuration valid", "✓".green());

    let store = match LocalDirStore::open(&config.store) {
        Ok(s) => s,
        Err(e) => {
            println!("  {} store: {e}", "✗".red());
            return exit_code_for_error(&e.into());
        }
    };
    println!("  {} store reachable at {}", "✓".green(), config.store.root.display());

    match store.exists(&config.table_path) {
        Ok(true) => println!("  {} input table present: {}", "✓".green(), config.table_path),
        Ok(false) => {
            println!("  {} input table missing: {}", "!".yellow(), config.table_path);
            println!(
                "    {}",
                "Run the feature-engineering step before triggering training.".dimmed()
            );
        }
        Err(e) => {
            println!("  {} store read failed: {e}", "✗".red());
            return exit_code_for_error(&e.into());
        }
    }

    println!();
    EXIT_OK
}
