//! Document redaction - strip everything a rule set does not permit reading.
//!
//! This example demonstrates the `Applicator`:
//! - Entries are looked up by their path in the document
//! - Sequence rows are keyed by their `id` field, or a custom key handler
//! - Explicit handlers hide subtrees unless a rule names them exactly
//!
//! ## Run
//! ```sh
//! cargo run -p demos --example redact_document
//!
//! # Show the walk
//! RUST_LOG=nsguard=debug cargo run -p demos --example redact_document
//! ```

use nsguard::prelude::*;
use serde_json::{json, Value};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nsguard=warn".parse().unwrap()),
        )
        .with_target(false)
        .init();

    let mut pset = PermissionSet::from_json(&json!({
        "account": "r",
        "account.payment": 0,
        "users.alice": "r",
        "projects.*.public": "r",
    }))?;

    let document = json!({
        "account": {
            "name": "Acme",
            "payment": {"card": "4111 1111 1111 1111"},
            "notes": {"internal": "renewal pending"}
        },
        "users": [
            {"id": "alice", "email": "alice@example.com"},
            {"id": "bob", "email": "bob@example.com"}
        ],
        "projects": {
            "apollo": [
                {"visibility": "public", "summary": "Moon landing"},
                {"visibility": "private", "budget": 25_000_000}
            ]
        }
    });

    println!("=== Input ===\n{}\n", serde_json::to_string_pretty(&document)?);

    // --- 1. Default applicator ---
    let redacted = Value::from(pset.apply(Data::from(document.clone())));
    println!("=== Default ===\n{}\n", serde_json::to_string_pretty(&redacted)?);

    // --- 2. Custom keys and an explicit handler ---
    let mut applicator = Applicator::new();
    applicator
        .handler(Handler::new("projects.*").key(|row: &Data, idx: &str| {
            row.get("visibility")
                .and_then(Data::as_key)
                .unwrap_or_else(|| idx.to_string())
        }))
        .handler(Handler::new("account.notes").explicit(true));

    let redacted = Value::from(applicator.apply(&pset, Data::from(document.clone())));
    println!("=== With handlers ===\n{}\n", serde_json::to_string_pretty(&redacted)?);

    // Registering a rule at exactly the explicit path makes it readable again.
    pset.set("account.notes", Flags::READ);
    let redacted = Value::from(applicator.apply(&pset, Data::from(document)));
    println!(
        "=== After granting account.notes ===\n{}",
        serde_json::to_string_pretty(&redacted)?
    );

    Ok(())
}
