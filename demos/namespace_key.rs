//! Self-describing rows - filter records that carry their own namespace.
//!
//! Rows fetched from different tenants often say where they belong. The
//! `NamespaceKeyApplicator` reads that namespace from a field (`_namespace`
//! by default), drops rows the rule set does not permit reading and strips
//! the field from the rows it keeps.
//!
//! ## Run
//! ```sh
//! cargo run -p demos --example namespace_key
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

    let pset = PermissionSet::from_iter([
        ("tenant.1", Flags::READ),
        ("tenant.1.invoices", Flags::DENY),
        ("tenant.2.invoices", Flags::READ),
    ]);

    let rows = json!([
        {
            "_namespace": "tenant.1",
            "name": "Initech",
            "invoices": {"_namespace": "tenant.1.invoices", "open": 3}
        },
        {"_namespace": "tenant.2", "name": "Globex"},
        {"_namespace": "tenant.2.invoices", "open": 11},
        {"name": "unscoped"}
    ]);

    let mut applicator = NamespaceKeyApplicator::new();
    let filtered = applicator
        .apply(&pset, Data::from(rows.clone()))
        .map(Value::from)
        .unwrap_or(Value::Null);
    println!("=== Filtered ===\n{}\n", serde_json::to_string_pretty(&filtered)?);

    // Only a rule registered at exactly tenant.*.invoices grants access now.
    applicator.handler(Handler::new("tenant.*.invoices").explicit(true));
    let filtered = applicator
        .apply(&pset, Data::from(rows))
        .map(Value::from)
        .unwrap_or(Value::Null);
    println!("=== Explicit invoices ===\n{}", serde_json::to_string_pretty(&filtered)?);

    Ok(())
}
