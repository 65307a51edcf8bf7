//! List rules command implementation.

use sniffkit_rules::all_rules;

/// Runs the list-rules command.
pub fn run() {
    println!("Available rules:\n");
    println!("{:<8} {:<28} {:<8} Description", "Code", "Name", "Fixable");
    println!("{}", "-".repeat(96));

    for rule in all_rules() {
        println!(
            "{:<8} {:<28} {:<8} {}",
            rule.code(),
            rule.name(),
            if rule.fixable() { "yes" } else { "no" },
            rule.description()
        );
    }

    println!("\nPresets:");
    println!("  recommended  - SK001, SK002, SK003, SK004, SK006, SK009 (default)");
    println!("  strict       - All rules, including those reading project files");
    println!("  minimal      - SK001, SK006 (for gradual adoption)");

    println!("\nUse --rules to filter specific rules, e.g.:");
    println!("  sniffkit check --rules cast-spacing,doc-nullable-type");
    println!("  sniffkit check --fix --rules SK001,SK006");
}
