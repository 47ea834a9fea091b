//! Version command implementation.

use crate::content::fields;
use crate::error::Result;
use serde::Serialize;

#[derive(Serialize)]
struct VersionOutput<'a> {
    version: &'a str,
    build: &'a str,
    /// API version the field allow-lists were written against.
    api_version: &'a str,
}

/// Execute the version command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(json: bool) -> Result<()> {
    let output = VersionOutput {
        version: env!("CARGO_PKG_VERSION"),
        build: if cfg!(debug_assertions) { "dev" } else { "release" },
        api_version: fields::registry().version(),
    };

    if json {
        super::print_json(&output)?;
    } else {
        println!(
            "lookport version {} ({}), API {}",
            output.version, output.build, output.api_version
        );
    }
    Ok(())
}
