//! Shared helpers for integration tests.

pub mod socket_guard;

use std::path::Path;

/// A small independent CSL style rendering "Author. Title."
#[allow(dead_code)]
pub const AUTHOR_TITLE_CSL: &str = include_str!("../fixtures/author-title.csl");

/// A dependent CSL style: metadata and a parent link, no layout of its own.
#[allow(dead_code)]
pub const DEPENDENT_CSL: &str = include_str!("../fixtures/dependent-journal.csl");

/// Writes the fixture style as `<name>.csl` into `dir`.
#[allow(dead_code)]
pub fn install_style(dir: &Path, name: &str) {
    std::fs::write(dir.join(format!("{name}.csl")), AUTHOR_TITLE_CSL).expect("write style fixture");
}

/// A BibTeX page of `count` books keyed `<prefix>_<n>`, starting at `start`.
#[allow(dead_code)]
#[must_use]
pub fn bibtex_page(prefix: &str, start: u32, count: u32) -> String {
    (start..start + count)
        .map(|n| {
            format!(
                "@book{{{prefix}_{n},\n\ttitle = {{Volume {n}}},\n\tauthor = {{Writer, Anne}},\n\tyear = {{2001}}\n}}\n\n"
            )
        })
        .collect()
}
