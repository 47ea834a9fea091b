//! User command implementations.

use std::io;
use std::path::Path;

use super::{Output, print_json, with_session};
use crate::api::Remote;
use crate::cli::{Cli, UserCommands};
use crate::content;
use crate::error::Result;
use crate::model::text_field;
use crate::output::{user_file_name, write_json};

/// Execute user commands.
pub fn execute(command: &UserCommands, cli: &Cli, output: &Output) -> Result<()> {
    match command {
        UserCommands::Cat {
            id,
            fields,
            trim,
            dir,
        } => cat(cli, output, id, fields.as_deref(), *trim, dir.as_deref()),
    }
}

fn cat(
    cli: &Cli,
    output: &Output,
    id: &str,
    fields: Option<&str>,
    trim: bool,
    dir: Option<&Path>,
) -> Result<()> {
    let user = with_session(cli, |store| {
        let user = content::cat_user(Remote::new(store, output.messenger()), id, fields)?;
        if trim { content::trim_user(&user) } else { Ok(user) }
    })?;

    let path = write_json(dir, &user_file_name(&user), &user, &mut io::stdout().lock())?;

    if let Some(path) = path {
        if output.is_json() {
            print_json(&serde_json::json!({
                "success": true,
                "id": text_field(&user, "id"),
                "path": path.display().to_string(),
                "messages": output.messages(),
            }))?;
        } else {
            output.messenger().ok(&format!("Wrote {}", path.display()));
        }
    }
    Ok(())
}
