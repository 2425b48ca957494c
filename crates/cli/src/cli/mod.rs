pub mod bicep;
pub mod helm;
pub mod opentofu;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use console::style;
use schemaport_core::{CodeResult, Diagnostic, Schema, SchemaResult, Severity};

/// Path argument meaning "read from stdin".
const STDIN: &str = "-";

pub fn run_cli<F>(f: F) -> i32
where
    F: FnOnce() -> Result<(), String>,
{
    match f() {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{} {err}", style("schemaport ERROR:").red().bold());
            1
        }
    }
}

/// Print each diagnostic on stderr. Returns whether any was an error.
pub fn report(diags: &[Diagnostic]) -> bool {
    for diag in diags {
        match diag.level {
            Severity::Warning => {
                eprintln!("{} {}", style("schemaport WARNING:").yellow().bold(), diag.message);
            }
            Severity::Error => {
                eprintln!("{} {}", style("schemaport ERROR:").red().bold(), diag.message);
            }
        }
    }
    diags.iter().any(|d| d.level == Severity::Error)
}

/// Print an imported schema as pretty JSON. Nothing is printed when a fatal
/// error left only the empty schema behind.
pub fn print_schema(result: &SchemaResult) -> Result<(), String> {
    let failed = report(&result.diags);
    if !(failed && result.schema == Schema::default()) {
        let json = result
            .schema
            .to_json_pretty()
            .map_err(|e| format!("Failed to encode schema: {e}"))?;
        println!("{json}");
    }
    if failed {
        Err(format!("{} error(s) while importing", count_errors(&result.diags)))
    } else {
        Ok(())
    }
}

/// Print generated code.
pub fn print_code(result: &CodeResult) -> Result<(), String> {
    let failed = report(&result.diags);
    print!("{}", result.code);
    if failed {
        Err(format!("{} error(s) while exporting", count_errors(&result.diags)))
    } else {
        Ok(())
    }
}

fn count_errors(diags: &[Diagnostic]) -> usize {
    diags.iter().filter(|d| d.level == Severity::Error).count()
}

/// Load a schema document from a file, or from stdin for `-`.
pub fn read_schema(path: &Path) -> Result<Schema, String> {
    if path.as_os_str() == STDIN {
        return Schema::from_reader(std::io::stdin().lock())
            .map_err(|e| format!("Failed to read schema from stdin: {e}"));
    }
    let file = File::open(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    Schema::from_reader(BufReader::new(file)).map_err(|e| e.to_string())
}
