//! Permission checks - load a rule document and query it.
//!
//! This example demonstrates resolution against a rule set:
//! - Inheritance from shorter rules to deeper namespaces
//! - Wildcard rules overriding an inherited grant
//! - Explicit checks that require a rule at the exact namespace
//! - `?` placeholders expanded against the registered rules
//!
//! ## Run
//! ```sh
//! cargo run -p demos --example check_rules
//!
//! # Custom rule document
//! cargo run -p demos --example check_rules -- rules.json
//!
//! # With resolution traces
//! RUST_LOG=nsguard=trace cargo run -p demos --example check_rules
//! ```

use nsguard::prelude::*;

const DEFAULT_RULES: &str = r#"{
    "org": "r",
    "org.42": "crud",
    "org.42.billing": "r",
    "org.*.audit": 0,
    "team.*.members": "r",
    "team.*.admins": "ru"
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nsguard=warn".parse().unwrap()),
        )
        .with_target(false)
        .init();

    // Use a rule file from the command line, or fall back to the built-in rules.
    let rules = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path)?,
        None => DEFAULT_RULES.to_string(),
    };
    let pset = PermissionSet::from_json_str(&rules)?;

    println!("=== Rules ===\n");
    for rule in pset.iter() {
        let mask = rule.value().unwrap_or(Flags::DENY);
        println!("  {:<20} {}", rule.namespace().to_string(), mask);
    }

    // --- 1. Plain checks ---
    println!("\n=== Checks ===\n");
    let queries = [
        ("org.7.profile", Flags::READ, false),
        ("org.7.profile", Flags::UPDATE, false),
        ("org.42.profile", Flags::UPDATE, false),
        ("org.42.billing", Flags::UPDATE, false),
        ("org.42.audit", Flags::READ, false),
        ("org.42", Flags::READ, true),
        ("org.42.profile", Flags::READ, true),
    ];
    for (namespace, level, explicit) in queries {
        let allowed = pset.check(namespace, level, explicit);
        println!(
            "  {:<16} {:<5} explicit={:<5} -> {}",
            namespace,
            level.to_string(),
            explicit,
            if allowed { "ALLOW" } else { "DENY" }
        );
    }

    // --- 2. Placeholder expansion ---
    println!("\n=== Expansion ===\n");
    for namespace in ["team.?.members", "team.?", "org.?"] {
        let expanded = pset.expand(namespace, false, true);
        let names: Vec<String> = expanded.iter().map(ToString::to_string).collect();
        println!("  {:<16} -> [{}]", namespace, names.join(", "));
        println!(
            "  {:<16}    read: {}",
            "",
            pset.check(namespace, Flags::READ, false)
        );
    }

    Ok(())
}
