//! Resolves `\i <path>` include directives before handing text to the core
//! parser; include-file resolution is an external collaborator, not part
//! of `core::parser`. Recursive, relative to the including file's
//! directory, with cycle detection.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::CliError;

/// Reads `path` and inlines every `\i <relative-path>` directive it
/// contains, recursively. Lines are matched verbatim against `\i` the same
/// way `core::parser::parse` recognizes (and rejects) them, so any
/// directive surviving to `parse` is one this resolver already inlined
/// away or the path genuinely doesn't exist.
pub fn resolve(path: &Path) -> Result<String, CliError> {
    let mut seen = HashSet::new();
    resolve_inner(path, &mut seen)
}

fn resolve_inner(path: &Path, seen: &mut HashSet<PathBuf>) -> Result<String, CliError> {
    let canonical = path.canonicalize().map_err(|e| {
        CliError::UserError(format!("could not read {}: {e}", path.display()))
    })?;
    if !seen.insert(canonical.clone()) {
        return Err(CliError::UserError(format!(
            "include cycle detected at {}",
            path.display()
        )));
    }

    let text = std::fs::read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("\\i ") {
            let include_path = base_dir.join(rest.trim());
            let inlined = resolve_inner(&include_path, seen)?;
            out.push_str(&inlined);
            out.push('\n');
        } else {
            out.push_str(line);
            out.push('\n');
        }
    }

    seen.remove(&canonical);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn inlines_a_single_level_include() {
        let dir = tempfile::tempdir().unwrap();
        let child = dir.path().join("child.sql");
        std::fs::write(&child, "CREATE TABLE t(id int);\n").unwrap();

        let main = dir.path().join("main.sql");
        let mut f = std::fs::File::create(&main).unwrap();
        writeln!(f, "\\i child.sql").unwrap();

        let resolved = resolve(&main).unwrap();
        assert!(resolved.contains("CREATE TABLE t(id int);"));
    }

    #[test]
    fn detects_include_cycles() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.sql");
        let b = dir.path().join("b.sql");
        std::fs::write(&a, "\\i b.sql\n").unwrap();
        std::fs::write(&b, "\\i a.sql\n").unwrap();

        let err = resolve(&a).unwrap_err();
        assert!(matches!(err, CliError::UserError(_)));
    }
}
