use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Crates whose spans and events a plain `SCHEMAPORT_LOG` level applies to.
const CRATES: [&str; 2] = ["schemaport", "schemaport_core"];

pub(crate) fn init_tracing() {
    // SCHEMAPORT_LOG controls log level: "trace", "debug", "info", "warn", "error"
    // or a full tracing filter spec like "schemaport_core=debug"
    let filter = match std::env::var("SCHEMAPORT_LOG") {
        Ok(level) if is_plain_level(&level) => directives(&level),
        Ok(spec) => spec,
        Err(_) => directives("warn"),
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn directives(level: &str) -> String {
    CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn is_plain_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}
