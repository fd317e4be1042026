//! Rewrite engine — strip pinned registry versions from import specifiers.
//!
//! Given an `ImportRule`, this engine:
//! 1. Walks a directory tree collecting files with qualifying extensions
//! 2. Applies the rule to each file's full text content
//! 3. Generates per-file edits (a dry-run preview if left unapplied)
//! 4. Writes edits back to disk atomically, isolating per-file failures

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::utils::io;

// ============================================================================
// Types
// ============================================================================

/// Extensions treated as source files when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["ts", "tsx"];

/// An edit for a single file whose content the rule changes.
#[derive(Debug, Clone, Serialize)]
pub struct FileEdit {
    /// File path relative to root.
    pub file: String,
    /// Number of import specifiers rewritten in this file.
    pub replacements: usize,
    /// New content after all replacements.
    #[serde(skip)]
    pub new_content: String,
    /// Whether the edit has been written to disk.
    pub applied: bool,
}

/// A per-file failure that did not abort the run.
#[derive(Debug, Clone, Serialize)]
pub struct FileError {
    /// File or directory path relative to root.
    pub file: String,
    /// Error detail.
    pub message: String,
}

/// The full result of a rewrite pass.
#[derive(Debug, Clone, Serialize)]
pub struct RewriteResult {
    /// Qualifying files inspected.
    pub files_scanned: usize,
    /// Edits for files whose content changed.
    pub edits: Vec<FileEdit>,
    /// Per-file errors encountered while reading or writing.
    pub errors: Vec<FileError>,
    /// Total rewritten specifiers across all edits.
    pub total_replacements: usize,
    /// Whether edits were written to disk.
    pub applied: bool,
}

// ============================================================================
// Substitution rule
// ============================================================================

/// The versioned-import substitution rule.
///
/// Matches `from "<specifier>@MAJOR.MINOR.PATCH<suffix>"` and rewrites it
/// to `from "<specifier>"`. The specifier capture is greedy, so the
/// version-introducing `@` is the last `@` followed by a dotted digit run
/// before the closing quote — scoped names (`@scope/name`) and names
/// containing digits or dots are captured whole. Any pre-release or build
/// suffix after the version is stripped along with it.
///
/// Built once and never mutated; every file is processed against the
/// identical rule.
pub struct ImportRule {
    pattern: Regex,
}

impl ImportRule {
    pub fn new() -> Self {
        // [^"] also matches a newline, so matching is not line-anchored.
        let pattern = Regex::new(r#"from "([^"]+)@\d+\.\d+\.\d+[^"]*""#)
            .expect("Invalid regex pattern");
        ImportRule { pattern }
    }

    /// Apply the rule to one file's content.
    ///
    /// Returns the substituted content and the number of specifiers
    /// rewritten. All matches are replaced in a single non-overlapping
    /// pass; zero matches returns the input borrowed, untouched. This
    /// never fails — content without the pattern is a normal outcome.
    pub fn apply<'a>(&self, content: &'a str) -> (Cow<'a, str>, usize) {
        let count = self.pattern.find_iter(content).count();
        if count == 0 {
            return (Cow::Borrowed(content), 0);
        }
        (self.pattern.replace_all(content, r#"from "${1}""#), count)
    }
}

impl Default for ImportRule {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// File walking
// ============================================================================

fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string()
}

fn walk_files(
    root: &Path,
    extensions: &[String],
    errors: &mut Vec<FileError>,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    walk_recursive(root, root, extensions, &mut files, errors)?;
    Ok(files)
}

fn walk_recursive(
    dir: &Path,
    root: &Path,
    extensions: &[String],
    files: &mut Vec<PathBuf>,
    errors: &mut Vec<FileError>,
) -> Result<()> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            // An unreadable root means no work is possible; an unreadable
            // subdirectory is reported and the walk continues around it.
            if dir == root {
                return Err(Error::Io(e));
            }
            errors.push(FileError {
                file: relative(dir, root),
                message: e.to_string(),
            });
            return Ok(());
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk_recursive(&path, root, extensions, files, errors)?;
        } else if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            if extensions.iter().any(|e| e.as_str() == ext) {
                files.push(path);
            }
        }
    }

    Ok(())
}

// ============================================================================
// Edit generation
// ============================================================================

/// Walk `root` and generate an edit for every qualifying file the rule
/// changes. Nothing is written to disk.
///
/// Fails only when `root` is missing, not a directory, or unreadable.
/// Errors on individual files (permissions, invalid UTF-8, transient I/O)
/// are recorded in the result and the walk continues; no retries.
pub fn generate_edits(
    rule: &ImportRule,
    root: &Path,
    extensions: &[String],
) -> Result<RewriteResult> {
    if !root.exists() {
        return Err(Error::RootNotFound(root.display().to_string()));
    }
    if !root.is_dir() {
        return Err(Error::NotADirectory(root.display().to_string()));
    }

    let mut errors = Vec::new();
    let files = walk_files(root, extensions, &mut errors)?;

    let mut edits = Vec::new();
    let mut total_replacements = 0;

    for file_path in &files {
        let content = match io::read_file(file_path) {
            Ok(c) => c,
            Err(e) => {
                log_status!("rewrite", "Failed to read {}: {}", relative(file_path, root), e);
                errors.push(FileError {
                    file: relative(file_path, root),
                    message: e.to_string(),
                });
                continue;
            }
        };

        let (new_content, replacements) = rule.apply(&content);
        if replacements > 0 {
            total_replacements += replacements;
            edits.push(FileEdit {
                file: relative(file_path, root),
                replacements,
                new_content: new_content.into_owned(),
                applied: false,
            });
        }
    }

    Ok(RewriteResult {
        files_scanned: files.len(),
        edits,
        errors,
        total_replacements,
        applied: false,
    })
}

// ============================================================================
// Apply edits
// ============================================================================

/// Write generated edits back to their files.
///
/// Each file is written atomically (temp sibling, then rename), so a
/// crash never leaves a partially written file — though files already
/// rewritten before an interruption stay rewritten. A write failure is
/// recorded and the remaining edits still apply.
pub fn apply_edits(result: &mut RewriteResult, root: &Path) {
    let mut write_errors = Vec::new();

    for edit in result.edits.iter_mut() {
        let path = root.join(&edit.file);
        match io::write_file_atomic(&path, &edit.new_content) {
            Ok(()) => {
                edit.applied = true;
                log_status!("rewrite", "Rewrote {} ({} imports)", edit.file, edit.replacements);
            }
            Err(e) => {
                log_status!("rewrite", "Failed to write {}: {}", edit.file, e);
                write_errors.push(FileError {
                    file: edit.file.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    result.errors.extend(write_errors);
    result.applied = true;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn exts() -> Vec<String> {
        DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn rule_strips_plain_version() {
        let rule = ImportRule::new();
        let (out, count) = rule.apply(r#"import { Phone } from "lucide-react@0.487.0";"#);
        assert_eq!(out, r#"import { Phone } from "lucide-react";"#);
        assert_eq!(count, 1);
    }

    #[test]
    fn rule_strips_scoped_package() {
        let rule = ImportRule::new();
        let (out, count) = rule.apply(r#"import { Slot } from "@radix-ui/react-slot@1.1.2";"#);
        assert_eq!(out, r#"import { Slot } from "@radix-ui/react-slot";"#);
        assert_eq!(count, 1);
    }

    #[test]
    fn rule_strips_trailing_prerelease_suffix() {
        let rule = ImportRule::new();
        let (out, _) = rule.apply(r#"from "next-themes@0.4.6-beta.1""#);
        assert_eq!(out, r#"from "next-themes""#);
    }

    #[test]
    fn rule_keeps_unversioned_import() {
        let rule = ImportRule::new();
        let input = r#"import App from "left-as-is";"#;
        let (out, count) = rule.apply(input);
        assert_eq!(count, 0);
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out, input);
    }

    #[test]
    fn rule_requires_full_major_minor_patch() {
        let rule = ImportRule::new();
        assert_eq!(rule.apply(r#"from "pkg@1""#).1, 0);
        assert_eq!(rule.apply(r#"from "pkg@1.2""#).1, 0);
        assert_eq!(rule.apply(r#"from "pkg@latest""#).1, 0);
    }

    #[test]
    fn rule_keeps_dots_and_digits_in_package_name() {
        let rule = ImportRule::new();
        let (out, _) = rule.apply(r#"from "socket.io-client@4.7.5""#);
        assert_eq!(out, r#"from "socket.io-client""#);

        let (out, _) = rule.apply(r#"from "base64-js@1.5.1""#);
        assert_eq!(out, r#"from "base64-js""#);
    }

    #[test]
    fn rule_rewrites_all_occurrences_in_one_pass() {
        let rule = ImportRule::new();
        let input = concat!(
            "import { X } from \"lucide-react@0.487.0\";\n",
            "import { Y } from \"@radix-ui/react-slot@1.1.2\";\n",
            "import { Z } from \"plain\";\n",
        );
        let (out, count) = rule.apply(input);
        assert_eq!(count, 2);
        assert!(out.contains("from \"lucide-react\";"));
        assert!(out.contains("from \"@radix-ui/react-slot\";"));
        assert!(out.contains("from \"plain\";"));
    }

    #[test]
    fn rule_is_idempotent() {
        let rule = ImportRule::new();
        let input = r#"import { X } from "lucide-react@0.487.0";"#;
        let (once, _) = rule.apply(input);
        let (twice, count) = rule.apply(&once);
        assert_eq!(once, twice);
        assert_eq!(count, 0);
    }

    #[test]
    fn rule_match_spans_line_boundary() {
        let rule = ImportRule::new();
        let (out, count) = rule.apply("from \"pkg@1.2.3\n-nightly\"");
        assert_eq!(out, "from \"pkg\"");
        assert_eq!(count, 1);
    }

    #[test]
    fn generate_edits_only_for_matching_files() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("app.ts"),
            "import { X } from \"lucide-react@0.487.0\";\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("plain.ts"), "import X from \"plain\";\n").unwrap();
        std::fs::write(
            dir.path().join("notes.md"),
            "from \"lucide-react@0.487.0\"\n",
        )
        .unwrap();

        let rule = ImportRule::new();
        let result = generate_edits(&rule, dir.path(), &exts()).unwrap();

        assert_eq!(result.files_scanned, 2);
        assert_eq!(result.edits.len(), 1);
        assert_eq!(result.edits[0].file, "app.ts");
        assert_eq!(result.edits[0].replacements, 1);
        assert!(result.errors.is_empty());
        assert!(!result.applied);
    }

    #[test]
    fn generate_edits_recurses_into_nested_directories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("components").join("ui");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            nested.join("button.tsx"),
            "import { Slot } from \"@radix-ui/react-slot@1.1.2\";\n",
        )
        .unwrap();

        let rule = ImportRule::new();
        let result = generate_edits(&rule, dir.path(), &exts()).unwrap();

        assert_eq!(result.edits.len(), 1);
        assert_eq!(result.edits[0].file, "components/ui/button.tsx");
    }

    #[test]
    fn generate_edits_missing_root_is_fatal() {
        let rule = ImportRule::new();
        let err = generate_edits(&rule, Path::new("/nonexistent/depin-root"), &exts())
            .unwrap_err();
        assert_eq!(err.code(), "root.not_found");
    }

    #[test]
    fn generate_edits_root_must_be_a_directory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file.ts");
        std::fs::write(&file, "content").unwrap();

        let rule = ImportRule::new();
        let err = generate_edits(&rule, &file, &exts()).unwrap_err();
        assert_eq!(err.code(), "validation.not_a_directory");
    }

    #[test]
    fn generate_edits_reports_invalid_utf8_and_continues() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("binary.ts"), [0xC3, 0x28, 0xA0]).unwrap();
        std::fs::write(
            dir.path().join("good.ts"),
            "import { X } from \"lucide-react@0.487.0\";\n",
        )
        .unwrap();

        let rule = ImportRule::new();
        let result = generate_edits(&rule, dir.path(), &exts()).unwrap();

        assert_eq!(result.files_scanned, 2);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].file, "binary.ts");
        assert_eq!(result.edits.len(), 1);
        assert_eq!(result.edits[0].file, "good.ts");
    }

    #[test]
    fn apply_edits_writes_to_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.ts");
        std::fs::write(&path, "import { X } from \"lucide-react@0.487.0\";\n").unwrap();

        let rule = ImportRule::new();
        let mut result = generate_edits(&rule, dir.path(), &exts()).unwrap();
        apply_edits(&mut result, dir.path());

        assert!(result.applied);
        assert!(result.edits[0].applied);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "import { X } from \"lucide-react\";\n"
        );
    }

    #[test]
    fn dry_run_leaves_files_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.ts");
        let original = "import { X } from \"lucide-react@0.487.0\";\n";
        std::fs::write(&path, original).unwrap();

        let rule = ImportRule::new();
        let result = generate_edits(&rule, dir.path(), &exts()).unwrap();

        assert_eq!(result.edits.len(), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn unchanged_files_are_never_written() {
        let dir = tempdir().unwrap();
        let matching = dir.path().join("app.ts");
        let plain = dir.path().join("plain.ts");
        std::fs::write(&matching, "import { X } from \"pkg@1.2.3\";\n").unwrap();
        std::fs::write(&plain, "import X from \"plain\";\n").unwrap();

        let rule = ImportRule::new();
        let mut result = generate_edits(&rule, dir.path(), &exts()).unwrap();

        // Only the matching file produces an edit, so apply has nothing
        // to write for the other one.
        assert!(result.edits.iter().all(|e| e.file != "plain.ts"));

        apply_edits(&mut result, dir.path());
        assert_eq!(
            std::fs::read_to_string(&plain).unwrap(),
            "import X from \"plain\";\n"
        );
    }

    #[test]
    fn custom_extension_set_is_respected() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("app.js"), "from \"pkg@1.2.3\"\n").unwrap();
        std::fs::write(dir.path().join("app.ts"), "from \"pkg@1.2.3\"\n").unwrap();

        let rule = ImportRule::new();
        let result =
            generate_edits(&rule, dir.path(), &["js".to_string()]).unwrap();

        assert_eq!(result.files_scanned, 1);
        assert_eq!(result.edits.len(), 1);
        assert_eq!(result.edits[0].file, "app.js");
    }
}
