//! Search-term bookkeeping
//!
//! The search pipeline reads its work list from a plain text file and appends
//! each finished term to a second file, so an interrupted run resumes with the
//! first unfinished term.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Reads non-empty trimmed lines; a missing file yields no lines
pub fn read_lines(path: &Path) -> io::Result<Vec<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

/// Search terms not yet recorded as completed, in file order
pub fn pending_terms(terms_path: &Path, completed_path: &Path) -> io::Result<Vec<String>> {
    let completed: HashSet<String> = read_lines(completed_path)?.into_iter().collect();
    Ok(read_lines(terms_path)?
        .into_iter()
        .filter(|term| !completed.contains(term))
        .collect())
}

/// Appends a term to the completed-terms file
pub fn mark_term_completed(completed_path: &Path, term: &str) -> io::Result<()> {
    if let Some(parent) = completed_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(completed_path)?;
    writeln!(file, "{}", term)
}

/// Results file for a search term: spaces become underscores
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use leadline::storage::csv_path_for_term;
///
/// let path = csv_path_for_term(Path::new("results"), "hotels in florence");
/// assert_eq!(path, Path::new("results/hotels_in_florence.csv"));
/// ```
pub fn csv_path_for_term(results_dir: &Path, term: &str) -> PathBuf {
    let file_stem: String = term
        .trim()
        .chars()
        .map(|c| match c {
            ' ' => '_',
            '/' | '\\' => '-',
            c => c,
        })
        .collect();
    results_dir.join(format!("{}.csv", file_stem))
}

/// All `*.csv` files directly inside a directory, sorted by name
pub fn list_csv_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if path.is_file() && is_csv {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
