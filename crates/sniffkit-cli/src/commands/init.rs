//! Init command implementation.

use anyhow::{bail, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# sniffkit configuration

# Rule preset: "recommended", "strict" or "minimal"
preset = "recommended"

[analyzer]
# Root directory to analyze (default: current directory)
# root = "./src"

# Glob patterns to exclude from analysis
exclude = [
    "**/vendor/**",
    "**/node_modules/**",
    "**/cache/**",
]

# File extensions to analyze
extensions = ["php", "inc"]

# Respect .gitignore files
respect_gitignore = true

# Ceiling on fix passes per file
max_passes = 50

# Unfixed violations at or above this severity fail the run
fail_on = "error"

# Rule configurations
# Each rule can be enabled/disabled and have its severity overridden

[rules.cast-spacing]
enabled = true
# severity = "warning"  # Override default severity
spacing = 1

[rules.require-function-doc]
enabled = false
skip_fully_typed = true

# [rules.psr4-autoload-consistency]
# enabled = true
# base_path = "."

# [rules.license-header]
# enabled = true
# file_names = ["LICENSE_HEADER", ".license-header"]
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    let config_path = Path::new("sniffkit.toml");

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(config_path, DEFAULT_CONFIG)?;

    println!("Created sniffkit.toml");
    println!("\nNext steps:");
    println!("  1. Edit sniffkit.toml to configure rules");
    println!("  2. Run: sniffkit check");
    println!("  3. Apply fixes: sniffkit check --fix");

    Ok(())
}
