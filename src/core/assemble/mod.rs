//! Build the versioned distribution tree from build output.

pub mod rules;

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::layout::ReleaseLayout;
use crate::utils::io;

use rules::{ExclusionRule, SubtreeSource, SUBTREES};

#[derive(Debug, Clone, Serialize)]
pub struct AssemblyReport {
    pub target: PathBuf,
    pub files_copied: usize,
    pub files_skipped: usize,
}

/// Delete the package directory if present and recreate it empty.
pub fn prepare_target(target: &Path) -> Result<()> {
    io::remove_dir_if_exists(target, "clear package directory")?;
    io::ensure_dir(target, "create package directory")
}

/// Assemble `layout.target` from scratch.
///
/// Copies every subtree under its exclusion rule, then the standalone files,
/// then writes the version marker. Entries are visited in name order.
pub fn assemble(layout: &ReleaseLayout) -> Result<AssemblyReport> {
    prepare_target(&layout.target)?;

    let mut report = AssemblyReport {
        target: layout.target.clone(),
        files_copied: 0,
        files_skipped: 0,
    };

    for subtree in SUBTREES {
        let (from, to) = subtree_paths(layout, subtree.source);
        if !from.is_dir() {
            return Err(Error::internal_io(
                "source directory does not exist",
                Some(format!("assemble subtree: {}", from.display())),
            ));
        }
        log_status!("assemble", "{} -> {}", from.display(), to.display());
        copy_tree(&from, &to, &subtree.exclude, Path::new(""), &mut report)?;
    }

    io::copy_file(
        &layout.license,
        &layout.target.join("LICENSE"),
        "copy license",
    )?;
    io::copy_file(
        &layout.start_script,
        &layout.target.join("start.sh"),
        "copy start script",
    )?;
    report.files_copied += 2;

    io::write_file(
        &layout.version_marker,
        &layout.archive_name,
        "write version marker",
    )?;

    Ok(report)
}

fn subtree_paths(layout: &ReleaseLayout, source: SubtreeSource) -> (PathBuf, PathBuf) {
    match source {
        SubtreeSource::Named(name) => (layout.output.join(name), layout.target.join(name)),
        SubtreeSource::Binaries => (layout.source_bin.clone(), layout.target_bin.clone()),
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let read = fs::read_dir(dir).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("read dir: {}", dir.display())))
    })?;

    let mut entries = Vec::new();
    for entry in read {
        let entry = entry.map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("read dir: {}", dir.display())))
        })?;
        let name = entry.file_name().to_string_lossy().into_owned();
        entries.push((name, entry.path()));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

fn copy_tree(
    from: &Path,
    to: &Path,
    rule: &ExclusionRule,
    rel_dir: &Path,
    report: &mut AssemblyReport,
) -> Result<()> {
    io::ensure_dir(to, "create directory")?;

    let entries = sorted_entries(from)?;
    let skipped = rule.skipped(rel_dir, entries.iter().map(|(name, _)| name.as_str()));

    for (name, path) in entries {
        if skipped.contains(&name) {
            report.files_skipped += 1;
            continue;
        }

        let dest = to.join(&name);
        if path.is_dir() {
            copy_tree(&path, &dest, rule, &rel_dir.join(&name), report)?;
        } else {
            io::copy_file(&path, &dest, "copy file")?;
            report.files_copied += 1;
        }
    }
    Ok(())
}
