//! Path handling for conversions: input/output checks made before anything
//! is written, mailbox discovery and relative paths for `RelPath`.
//!
//! All comparisons are lexical on absolute, normalized paths. Nothing here
//! touches the filesystem except the existence checks and directory
//! listings.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{ConvertError, Result};

/// Absolute form of `path` with `.` and `..` resolved lexically.
pub fn normalize(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path).map_err(|e| ConvertError::io(path, e))?;
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    Ok(out)
}

/// Symlink-free form of an existing path, for paths that are later joined
/// with `..` components. Falls back to `path` itself.
pub fn resolved(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn without_extension(path: &Path) -> PathBuf {
    path.with_extension("")
}

/// Reject an output folder that could overwrite or alias a file input.
///
/// The output is refused when it, or any of its ancestors, names the input
/// once their last extensions are dropped: for `mail/inbox.mbox` both
/// `mail/inbox.out` and `mail/inbox/xml` are refused, `mail/other` is not.
/// It is also refused when one of the files the conversion writes would be
/// the input itself (see [`check_derived_outputs`]).
pub fn validate_file_paths(input: &Path, output: &Path, external_folder: &str) -> Result<()> {
    if !input.exists() {
        return Err(ConvertError::FileNotFound(input.to_path_buf()));
    }
    if !input.is_file() {
        return Err(ConvertError::InvalidPath(format!(
            "'{}' is not a file",
            input.display()
        )));
    }
    let input_abs = normalize(input)?;
    let output_abs = normalize(output)?;
    let input_stem = without_extension(&input_abs);

    if output_abs == input_abs
        || output_abs
            .ancestors()
            .filter(|a| a.parent().is_some())
            .any(|a| without_extension(a) == input_stem)
    {
        return Err(ConvertError::OutputAliasesInput {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
        });
    }
    check_derived_outputs(input, output, external_folder)?;
    debug!(input = %input_abs.display(), output = %output_abs.display(), "Paths accepted");
    Ok(())
}

/// Reject `output_dir` when converting `mbox` into it would write over
/// `mbox`: as `<stem>.xml`, as `<stem>.csv`, or anywhere below the external
/// content folder.
pub fn check_derived_outputs(
    mbox: &Path,
    output_dir: &Path,
    external_folder: &str,
) -> Result<()> {
    let input_abs = normalize(mbox)?;
    let output_abs = normalize(output_dir)?;
    let stem = input_abs
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let overwritten = ["xml", "csv"]
        .iter()
        .any(|ext| output_abs.join(format!("{stem}.{ext}")) == input_abs)
        || input_abs.starts_with(output_abs.join(external_folder));
    if overwritten {
        return Err(ConvertError::OutputAliasesInput {
            input: mbox.to_path_buf(),
            output: output_dir.to_path_buf(),
        });
    }
    Ok(())
}

/// Reject an output folder that is the input folder or lies inside it.
pub fn validate_folder_paths(input: &Path, output: &Path) -> Result<()> {
    if !input.exists() {
        return Err(ConvertError::FileNotFound(input.to_path_buf()));
    }
    if !input.is_dir() {
        return Err(ConvertError::InvalidPath(format!(
            "'{}' is not a directory",
            input.display()
        )));
    }
    let input_abs = normalize(input)?;
    let output_abs = normalize(output)?;
    if output_abs.starts_with(&input_abs) {
        return Err(ConvertError::OutputAliasesInput {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
        });
    }
    Ok(())
}

/// The external content folder must stay below the output folder.
pub fn validate_external_folder(name: &str) -> Result<()> {
    let path = Path::new(name);
    let simple = !name.trim().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if simple {
        Ok(())
    } else {
        Err(ConvertError::InvalidPath(format!(
            "ExternalContentFolder '{name}' must be a relative path without '..'"
        )))
    }
}

/// `target` relative to the directory `base`, `/`-separated.
pub fn relative_path(target: &Path, base: &Path) -> String {
    let target: Vec<_> = target.components().collect();
    let base: Vec<_> = base.components().collect();
    let common = target
        .iter()
        .zip(&base)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    parts.extend(std::iter::repeat_n("..".to_string(), base.len() - common));
    parts.extend(
        target[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

/// Regular, non-hidden files directly inside `dir`, sorted by name.
pub fn list_mbox_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| ConvertError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConvertError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() && !is_hidden(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Thunderbird-style sub-folder directory of `mbox`: a sibling directory
/// named `<stem>.*` or `<file name>.*` (usually `<name>.sbd`).
///
/// More than one candidate is an error, because child folders could not be
/// attributed unambiguously.
pub fn sub_folder_dir(mbox: &Path) -> Result<Option<PathBuf>> {
    let Some(parent) = mbox.parent() else {
        return Ok(None);
    };
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    let file_name = mbox
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = mbox
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let prefixes = [format!("{stem}."), format!("{file_name}.")];

    let entries = std::fs::read_dir(parent).map_err(|e| ConvertError::io(parent, e))?;
    let mut matches = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConvertError::io(parent, e))?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if path.is_dir() && prefixes.iter().any(|p| name.starts_with(p.as_str())) {
            matches.push(path);
        }
    }
    matches.sort();
    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.pop()),
        _ => Err(ConvertError::InvalidPath(format!(
            "more than one sub-folder directory matches '{}': {}",
            mbox.display(),
            matches
                .iter()
                .map(|m| m.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_file_output_aliasing() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("inbox.mbox");
        input.write_str("From x\n").unwrap();

        for bad in ["inbox.out", "inbox", "inbox/xml", "inbox.d/deeper/still", "inbox.mbox"] {
            let err = validate_file_paths(input.path(), &temp.path().join(bad), "ExtBodyContent")
                .unwrap_err();
            assert!(err.is_argument_error(), "{bad}");
        }
        for good in ["other", "out/inbox2", "."] {
            validate_file_paths(input.path(), &temp.path().join(good), "ExtBodyContent").unwrap();
        }
        assert!(!temp.child("inbox.out").exists());
    }

    #[test]
    fn test_outputs_that_would_overwrite_the_input() {
        let temp = assert_fs::TempDir::new().unwrap();
        let xml = temp.child("inbox.xml");
        xml.write_str("From x\n").unwrap();
        let csv = temp.child("inbox.csv");
        csv.write_str("From x\n").unwrap();
        let side = temp.child("out/ExtBodyContent/inbox");
        side.write_str("From x\n").unwrap();

        for input in [xml.path(), csv.path()] {
            let err = validate_file_paths(input, temp.path(), "ExtBodyContent").unwrap_err();
            assert!(err.is_argument_error(), "{}", input.display());
        }
        let err = validate_file_paths(side.path(), &temp.path().join("out"), "ExtBodyContent")
            .unwrap_err();
        assert!(err.is_argument_error());

        validate_file_paths(xml.path(), &temp.path().join("eaxs"), "ExtBodyContent").unwrap();
        validate_file_paths(side.path(), &temp.path().join("out"), "Side").unwrap();
    }

    #[test]
    fn test_folder_output_inside_input() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("mail");
        input.create_dir_all().unwrap();
        assert!(validate_folder_paths(input.path(), input.path()).is_err());
        assert!(validate_folder_paths(input.path(), &input.path().join("out/../x")).is_err());
        validate_folder_paths(input.path(), &temp.path().join("eaxs")).unwrap();
        assert!(matches!(
            validate_folder_paths(&temp.path().join("nope"), &temp.path().join("eaxs")),
            Err(ConvertError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("/a/mail/inbox"), Path::new("/a/out")),
            "../mail/inbox"
        );
        assert_eq!(relative_path(Path::new("/a/out/x"), Path::new("/a/out")), "x");
    }

    #[test]
    fn test_external_folder_name() {
        validate_external_folder("ExtBodyContent").unwrap();
        validate_external_folder("ext/content").unwrap();
        assert!(validate_external_folder("../elsewhere").is_err());
        assert!(validate_external_folder("/abs").is_err());
        assert!(validate_external_folder("").is_err());
    }

    #[test]
    fn test_listing_and_sub_folders() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("b").write_str("").unwrap();
        temp.child("a.mbox").write_str("").unwrap();
        temp.child(".hidden").write_str("").unwrap();
        temp.child("a.sbd/child").write_str("").unwrap();
        let files = list_mbox_files(temp.path()).unwrap();
        assert_eq!(files, vec![temp.path().join("a.mbox"), temp.path().join("b")]);

        assert_eq!(
            sub_folder_dir(&temp.path().join("a.mbox")).unwrap(),
            Some(temp.path().join("a.sbd"))
        );
        assert_eq!(sub_folder_dir(&temp.path().join("b")).unwrap(), None);

        temp.child("a.mbox.sbd").create_dir_all().unwrap();
        assert!(sub_folder_dir(&temp.path().join("a.mbox")).is_err());
    }
}
