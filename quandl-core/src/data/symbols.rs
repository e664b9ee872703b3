//! Symbol list: the static ticker reference file.
//!
//! The list is a JSON array of `{Name, Sector, Symbol}` objects stored under
//! `{path}/input/`. It is loaded once and filtered by sector.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::config::ALL_SECTORS;
use crate::error::PullError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SymbolEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sector: String,
    pub symbol: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolList {
    entries: Vec<SymbolEntry>,
}

impl SymbolList {
    pub fn new(entries: Vec<SymbolEntry>) -> Self {
        Self { entries }
    }

    /// Load `{base}/input/{input_file}`.
    pub fn load(base: &Path, input_file: &str) -> Result<Self, PullError> {
        Self::from_file(&base.join("input").join(input_file))
    }

    pub fn from_file(path: &Path) -> Result<Self, PullError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PullError::FileSystem(format!("read {}: {e}", path.display())))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, PullError> {
        serde_json::from_str(content)
            .map(Self::new)
            .map_err(|e| PullError::Parse(format!("symbol list: {e}")))
    }

    pub fn entries(&self) -> &[SymbolEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Symbols in file order. An empty sector or `all` selects everything,
    /// otherwise the sector must match exactly (case-sensitive).
    pub fn symbols_in_sector(&self, sector: &str) -> Vec<&str> {
        let all = sector.is_empty() || sector == ALL_SECTORS;
        self.entries
            .iter()
            .filter(|e| all || e.sector == sector)
            .map(|e| e.symbol.as_str())
            .collect()
    }

    /// Distinct sector names, sorted.
    pub fn sector_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|e| e.sector.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Read the input list and return the symbols for `sector`.
pub fn read_input_list(
    base: &Path,
    input_file: &str,
    sector: &str,
) -> Result<Vec<String>, PullError> {
    let list = SymbolList::load(base, input_file)?;
    Ok(list
        .symbols_in_sector(sector)
        .into_iter()
        .map(String::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"Name": "3M Company", "Sector": "Industrials", "Symbol": "MMM"},
        {"Name": "Abbott Laboratories", "Sector": "Health Care", "Symbol": "ABT"},
        {"Name": "Facebook, Inc.", "Sector": "Information Technology", "Symbol": "FB"},
        {"Name": "Boeing Company", "Sector": "Industrials", "Symbol": "BA"}
    ]"#;

    #[test]
    fn all_and_empty_select_everything() {
        let list = SymbolList::from_json(SAMPLE).unwrap();
        assert_eq!(list.symbols_in_sector("all"), vec!["MMM", "ABT", "FB", "BA"]);
        assert_eq!(list.symbols_in_sector(""), vec!["MMM", "ABT", "FB", "BA"]);
    }

    #[test]
    fn sector_match_is_exact() {
        let list = SymbolList::from_json(SAMPLE).unwrap();
        assert_eq!(list.symbols_in_sector("Industrials"), vec!["MMM", "BA"]);
        assert!(list.symbols_in_sector("industrials").is_empty());
        assert!(list.symbols_in_sector("All").is_empty());
        assert!(list.symbols_in_sector("Health").is_empty());
    }

    #[test]
    fn sector_names_are_distinct() {
        let list = SymbolList::from_json(SAMPLE).unwrap();
        assert_eq!(
            list.sector_names(),
            vec!["Health Care", "Industrials", "Information Technology"]
        );
    }

    #[test]
    fn malformed_list_is_a_parse_error() {
        let err = SymbolList::from_json(r#"{"Symbol": "FB"}"#).unwrap_err();
        assert!(matches!(err, PullError::Parse(_)));
    }

    #[test]
    fn reads_from_input_dir() {
        let dir = std::env::temp_dir().join(format!("quandl_symbols_test_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("input")).unwrap();
        std::fs::write(dir.join("input").join("list.json"), SAMPLE).unwrap();

        let symbols = read_input_list(&dir, "list.json", "Health Care").unwrap();
        assert_eq!(symbols, vec!["ABT".to_string()]);

        let missing = read_input_list(&dir, "nope.json", "all").unwrap_err();
        assert!(matches!(missing, PullError::FileSystem(_)));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
