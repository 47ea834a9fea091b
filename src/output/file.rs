//! JSON file output.
//!
//! Exports are written atomically (temp file, fsync, rename) so an
//! interrupted export never leaves a truncated file behind.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::{Attrs, text_field};

/// Write content to a file atomically.
///
/// This function:
/// 1. Writes content to a temporary file (same path with `.tmp` extension)
/// 2. Calls `fsync` to ensure data is on disk
/// 3. Atomically renames the temp file to the target path
///
/// If any step fails, the original file (if any) remains untouched.
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let temp_path = path.with_extension("json.tmp");

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    {
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content.as_bytes())?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Pretty-print a JSON object to `dir/file_name`, or to `stdout` when no
/// directory is given.
///
/// Returns the path written, if any.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_json(
    dir: Option<&Path>,
    file_name: &str,
    value: &Attrs,
    stdout: &mut dyn Write,
) -> Result<Option<PathBuf>> {
    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');

    match dir {
        Some(dir) => {
            let path = dir.join(file_name);
            atomic_write(&path, &content)?;
            Ok(Some(path))
        }
        None => {
            stdout.write_all(content.as_bytes())?;
            Ok(None)
        }
    }
}

/// Read a JSON file holding a single object.
///
/// # Errors
///
/// Returns [`Error::InvalidFile`] when the file is unreadable, is not JSON,
/// or holds something other than an object.
pub fn read_json_object(path: &Path) -> Result<Attrs> {
    let invalid = |message: String| Error::InvalidFile {
        path: path.to_path_buf(),
        message,
    };

    let content = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    match serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))? {
        serde_json::Value::Object(attrs) => Ok(attrs),
        _ => Err(invalid("expected a JSON object".to_string())),
    }
}

/// `Look_<id>_<title>.json`
#[must_use]
pub fn look_file_name(look: &Attrs) -> String {
    sanitize_file_name(&format!(
        "Look_{}_{}.json",
        text_field(look, "id"),
        text_field(look, "title")
    ))
}

/// `User_<id>_<first>_<last>.json`
#[must_use]
pub fn user_file_name(user: &Attrs) -> String {
    sanitize_file_name(&format!(
        "User_{}_{}_{}.json",
        text_field(user, "id"),
        text_field(user, "first_name"),
        text_field(user, "last_name")
    ))
}

/// Replace characters that are not portable in file names.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn attrs(value: serde_json::Value) -> Attrs {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_atomic_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("look.json");

        atomic_write(&path, "{}\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{}\n");
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_write_json_to_dir() {
        let temp_dir = TempDir::new().unwrap();
        let look = attrs(json!({"id": "1", "title": "X"}));
        let mut stdout = Vec::new();

        let written = write_json(Some(temp_dir.path()), "Look_1_X.json", &look, &mut stdout)
            .unwrap()
            .unwrap();

        assert!(stdout.is_empty());
        let back = read_json_object(&written).unwrap();
        assert_eq!(back, look);
    }

    #[test]
    fn test_write_json_to_stdout() {
        let look = attrs(json!({"id": "1"}));
        let mut stdout = Vec::new();

        let written = write_json(None, "ignored.json", &look, &mut stdout).unwrap();

        assert!(written.is_none());
        assert_eq!(String::from_utf8(stdout).unwrap(), "{\n  \"id\": \"1\"\n}\n");
    }

    #[test]
    fn test_read_json_object_rejects_arrays() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("list.json");
        fs::write(&path, "[1, 2]").unwrap();

        assert!(matches!(read_json_object(&path), Err(Error::InvalidFile { .. })));
    }

    #[test]
    fn test_file_names_are_sanitized() {
        let look = attrs(json!({"id": 12, "title": "Revenue / Cost: Q1"}));
        assert_eq!(look_file_name(&look), "Look_12_Revenue _ Cost_ Q1.json");

        let user = attrs(json!({"id": "5", "first_name": "Ada", "last_name": "L"}));
        assert_eq!(user_file_name(&user), "User_5_Ada_L.json");
    }
}
