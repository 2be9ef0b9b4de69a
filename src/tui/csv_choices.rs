//! CSV files offered by the upload form.
//!
//! Collected once at startup by walking the working directory a few levels
//! deep, skipping hidden and build directories. For each upload role the files
//! whose name mentions the role come first, so `prices.csv` is the first
//! suggestion for the prices slot.

use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::picker::has_csv_extension;
use crate::domain::UploadRole;

const MAX_DEPTH: usize = 4;

#[derive(Debug, Default)]
pub struct CsvChoices {
    files: Vec<PathBuf>,
    /// Per role, the position last offered in that role's ranking.
    cursor: [Option<usize>; 3],
}

impl CsvChoices {
    pub fn scan(root: &Path) -> Self {
        let mut files = Vec::new();
        let mut pending = vec![(root.to_path_buf(), 0usize)];
        while let Some((dir, depth)) = pending.pop() {
            let Ok(entries) = fs::read_dir(&dir) else {
                continue;
            };
            for path in entries.flatten().map(|e| e.path()) {
                if path.is_dir() {
                    if depth < MAX_DEPTH && !ignored_dir(&path) {
                        pending.push((path, depth + 1));
                    }
                } else if has_csv_extension(&path) {
                    files.push(path);
                }
            }
        }
        files.sort_by_key(|p| display_path(p));
        tracing::debug!(count = files.len(), "csv files discovered");
        Self {
            files,
            cursor: [None; 3],
        }
    }

    fn ranked(&self, role: UploadRole) -> Vec<&PathBuf> {
        let mut ranked: Vec<&PathBuf> = self.files.iter().collect();
        ranked.sort_by_key(|p| !mentions_role(p, role));
        ranked
    }

    /// Move `delta` through the candidates for `role`, wrapping at either end.
    pub fn step(&mut self, role: UploadRole, delta: isize) -> Option<PathBuf> {
        let ranked = self.ranked(role);
        if ranked.is_empty() {
            return None;
        }
        let n = ranked.len() as isize;
        let next = match self.cursor[role.index()] {
            None if delta >= 0 => 0,
            None => n - 1,
            Some(i) => (i as isize + delta).rem_euclid(n),
        } as usize;
        let picked = ranked[next].clone();
        self.cursor[role.index()] = Some(next);
        Some(picked)
    }

    /// Forget the position for `role` (after a manual edit or clear).
    pub fn reset(&mut self, role: UploadRole) {
        self.cursor[role.index()] = None;
    }
}

fn mentions_role(path: &Path, role: UploadRole) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.to_ascii_lowercase().contains(role.field_name()))
}

fn ignored_dir(path: &Path) -> bool {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    name.starts_with('.') || matches!(name, "target" | "node_modules")
}

/// Path as shown in the form, without a leading `./`.
pub fn display_path(path: &Path) -> String {
    path.strip_prefix(".").unwrap_or(path).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(tag: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!("procure_csv_choices_{tag}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        for dir in ["sub", ".git", "target"] {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
        for file in [
            "materials.csv",
            "prices.csv",
            "vendors.csv",
            "notes.txt",
            "sub/extra.csv",
            ".git/ignored.csv",
            "target/ignored.csv",
        ] {
            fs::write(root.join(file), "a,b\n").unwrap();
        }
        root
    }

    #[test]
    fn role_named_file_is_offered_first() {
        let root = fixture("rank");
        let mut choices = CsvChoices::scan(&root);

        assert!(choices.step(UploadRole::Prices, 1).unwrap().ends_with("prices.csv"));
        assert!(choices.step(UploadRole::Vendors, 1).unwrap().ends_with("vendors.csv"));
        assert!(choices.step(UploadRole::Materials, 1).unwrap().ends_with("materials.csv"));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn hidden_and_build_dirs_are_skipped_and_stepping_wraps() {
        let root = fixture("wrap");
        let mut choices = CsvChoices::scan(&root);

        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(choices.step(UploadRole::Prices, 1).unwrap());
        }
        assert!(seen.iter().all(|p| !display_path(p).contains("ignored")));
        assert_eq!(choices.step(UploadRole::Prices, 1).unwrap(), seen[0]);

        choices.reset(UploadRole::Prices);
        assert_eq!(choices.step(UploadRole::Prices, -1).unwrap(), seen[3]);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn empty_directory_offers_nothing() {
        let root = std::env::temp_dir().join(format!("procure_csv_choices_empty_{}", std::process::id()));
        fs::create_dir_all(&root).unwrap();
        let mut choices = CsvChoices::scan(&root);
        assert_eq!(choices.step(UploadRole::Materials, 1), None);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn display_path_strips_leading_dot() {
        assert_eq!(display_path(Path::new("./data/prices.csv")), "data/prices.csv");
    }
}
