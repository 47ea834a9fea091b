//! Look command implementations.

use std::io;
use std::path::Path;

use super::{Output, print_json, with_session};
use crate::api::Remote;
use crate::cli::{Cli, LookCommands};
use crate::content::{self, MatchPolicy, Reconciler};
use crate::error::Result;
use crate::model::text_field;
use crate::output::{look_file_name, read_json_object, write_json};

/// Execute look commands.
pub fn execute(command: &LookCommands, cli: &Cli, output: &Output) -> Result<()> {
    match command {
        LookCommands::Cat {
            id,
            dir,
            plans,
            trim,
        } => cat(cli, output, id, dir.as_deref(), *plans, *trim),
        LookCommands::Import {
            file,
            folder_id,
            force,
            match_policy,
        } => import(cli, output, file, folder_id, *force, (*match_policy).into()),
        LookCommands::Rm { id } => rm(cli, output, id),
    }
}

fn cat(
    cli: &Cli,
    output: &Output,
    id: &str,
    dir: Option<&Path>,
    plans: bool,
    trim: bool,
) -> Result<()> {
    let look = with_session(cli, |store| {
        let look = content::cat_look(Remote::new(store, output.messenger()), id, plans)?;
        if trim { content::trim(&look) } else { Ok(look) }
    })?;

    let path = write_json(dir, &look_file_name(&look), &look, &mut io::stdout().lock())?;

    if let Some(path) = path {
        if output.is_json() {
            print_json(&serde_json::json!({
                "success": true,
                "id": text_field(&look, "id"),
                "path": path.display().to_string(),
                "messages": output.messages(),
            }))?;
        } else {
            output.messenger().ok(&format!("Wrote {}", path.display()));
        }
    }
    Ok(())
}

fn import(
    cli: &Cli,
    output: &Output,
    file: &Path,
    folder_id: &str,
    force: bool,
    policy: MatchPolicy,
) -> Result<()> {
    let source = read_json_object(file)?;
    let look = with_session(cli, |store| {
        Reconciler::new(store, output.messenger())
            .with_policy(policy)
            .import_look(folder_id, &source, force)
    })?;

    if output.is_json() {
        print_json(&serde_json::json!({
            "success": true,
            "id": text_field(&look, "id"),
            "title": text_field(&look, "title"),
            "slug": text_field(&look, "slug"),
            "folder_id": text_field(&look, "folder_id"),
            "messages": output.messages(),
        }))?;
    }
    Ok(())
}

fn rm(cli: &Cli, output: &Output, id: &str) -> Result<()> {
    with_session(cli, |store| {
        content::delete_look(Remote::new(store, output.messenger()), id)
    })?;

    if output.is_json() {
        print_json(&serde_json::json!({
            "success": true,
            "id": id,
            "messages": output.messages(),
        }))?;
    }
    Ok(())
}
