//! Merge query command implementations.

use std::path::Path;

use super::{Output, print_json, with_session};
use crate::cli::{Cli, MergeQueryCommands};
use crate::content::Reconciler;
use crate::error::Result;
use crate::model::text_field;
use crate::output::read_json_object;

/// Execute merge query commands.
pub fn execute(command: &MergeQueryCommands, cli: &Cli, output: &Output) -> Result<()> {
    match command {
        MergeQueryCommands::Import { file } => import(cli, output, file),
    }
}

fn import(cli: &Cli, output: &Output, file: &Path) -> Result<()> {
    let merge = read_json_object(file)?;
    let created = with_session(cli, |store| {
        Reconciler::new(store, output.messenger()).create_merge_result(&merge)
    })?;
    let id = text_field(&created, "id");

    if output.is_json() {
        print_json(&serde_json::json!({
            "success": true,
            "id": id,
            "messages": output.messages(),
        }))?;
    } else {
        output.messenger().ok(&format!("Created merge query {id}"));
    }
    Ok(())
}
