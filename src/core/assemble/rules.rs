//! Which build-output entries make it into the distribution tree.

use std::collections::BTreeSet;
use std::path::Path;

/// Entries skipped while copying one subtree.
///
/// `root_names` apply only at the subtree root, `names` and `extensions` at
/// every level, and each `nested` entry names a directory (relative to the
/// subtree root) together with the entry names skipped directly inside it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExclusionRule {
    pub root_names: &'static [&'static str],
    pub names: &'static [&'static str],
    pub extensions: &'static [&'static str],
    pub nested: &'static [(&'static str, &'static [&'static str])],
}

impl ExclusionRule {
    pub const NONE: ExclusionRule = ExclusionRule {
        root_names: &[],
        names: &[],
        extensions: &[],
        nested: &[],
    };

    /// Whether `name`, found in `rel_dir` (empty for the subtree root), is skipped.
    pub fn excludes(&self, rel_dir: &Path, name: &str) -> bool {
        if self.names.contains(&name) {
            return true;
        }
        if rel_dir.as_os_str().is_empty() && self.root_names.contains(&name) {
            return true;
        }
        if self
            .nested
            .iter()
            .any(|(dir, names)| rel_dir == Path::new(dir) && names.contains(&name))
        {
            return true;
        }
        has_extension(name, self.extensions)
    }

    /// The subset of `entries` in `rel_dir` that must not be copied.
    pub fn skipped<'a, I>(&self, rel_dir: &Path, entries: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        entries
            .into_iter()
            .filter(|name| self.excludes(rel_dir, name))
            .map(str::to_string)
            .collect()
    }
}

fn has_extension(name: &str, extensions: &[&str]) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// Where a subtree lives in the build output and in the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtreeSource {
    /// Same directory name on both sides.
    Named(&'static str),
    /// `bin/<configuration>` copied to `bin/v<version>`.
    Binaries,
}

#[derive(Debug, Clone, Copy)]
pub struct SubtreeRule {
    pub source: SubtreeSource,
    pub exclude: ExclusionRule,
}

/// Subtrees of the distribution tree, in copy order.
pub const SUBTREES: &[SubtreeRule] = &[
    SubtreeRule {
        source: SubtreeSource::Named("data"),
        exclude: ExclusionRule {
            root_names: &["allSets-x.json", "AllSets.v42.json"],
            names: &[],
            extensions: &[],
            nested: &[(
                "index",
                &["deck", "keywords-test", "search-test", "suggest-test"],
            )],
        },
    },
    SubtreeRule {
        source: SubtreeSource::Binaries,
        exclude: ExclusionRule {
            root_names: &[],
            names: &[],
            extensions: &["xml", "pdb"],
            nested: &[],
        },
    },
    SubtreeRule {
        source: SubtreeSource::Named("etc"),
        exclude: ExclusionRule::NONE,
    },
    SubtreeRule {
        source: SubtreeSource::Named("images"),
        exclude: ExclusionRule {
            root_names: &[],
            names: &[],
            extensions: &["jpg", "png", "txt"],
            nested: &[],
        },
    },
    SubtreeRule {
        source: SubtreeSource::Named("update"),
        exclude: ExclusionRule {
            root_names: &[
                "filelist.txt",
                "version.txt",
                "app",
                "notifications",
                "megatools-1.9.98-win32",
            ],
            names: &[],
            extensions: &["bak", "zip", "7z"],
            nested: &[("img/art", &["filelist.txt"])],
        },
    },
    SubtreeRule {
        source: SubtreeSource::Named("color-schemes"),
        exclude: ExclusionRule {
            root_names: &[],
            names: &["current.colors"],
            extensions: &[],
            nested: &[],
        },
    },
    SubtreeRule {
        source: SubtreeSource::Named("charts"),
        exclude: ExclusionRule::NONE,
    },
];
