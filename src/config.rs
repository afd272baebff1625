use std::collections::HashMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, error};

use crate::error::{ConfigError, Result};

/// Entries in insertion order with unique keys.
#[derive(Debug, Default, Clone)]
pub struct Entries {
    items: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl Entries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert: an existing key keeps its position and takes the new value,
    /// a new key is appended.
    pub fn join(&mut self, key: String, value: String) {
        match self.index.get(&key) {
            Some(&pos) => self.items[pos].1 = value,
            None => {
                self.index.insert(key.clone(), self.items.len());
                self.items.push((key, value));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&pos| self.items[pos].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_vec(&self) -> Vec<(String, String)> {
        self.items.clone()
    }
}

/// Strips leading and trailing ASCII spaces only. Tabs are kept.
pub fn trim_spaces(s: &str) -> &str {
    s.trim_matches(' ')
}

/// Splits a line on the first `=`, falling back to the first `:`.
/// Lines with neither delimiter yield `None`.
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
    let pos = line.find('=').or_else(|| line.find(':'))?;
    let key = trim_spaces(&line[..pos]);
    let value = trim_spaces(&line[pos + 1..]);
    Some((key, value))
}

pub fn format_entry(key: &str, value: &str) -> String {
    format!("{} = {}", key, value)
}

/// Reads the whole file into `Entries`. Duplicate keys keep the position of
/// their first occurrence and the value of their last.
pub fn load_config(path: &Path) -> Result<Entries> {
    // Non-UTF-8 content fails the load; nothing is decoded lossily.
    let content = fs::read_to_string(path).map_err(|source| {
        error!("Cannot read config file {}: {}", path.display(), source);
        ConfigError::FileNotFound {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let mut entries = Entries::new();
    for (lineno, line) in content.lines().enumerate() {
        match parse_line(line) {
            Some((key, value)) => entries.join(key.to_string(), value.to_string()),
            None => debug!("Skipping line {} of {}: no delimiter", lineno + 1, path.display()),
        }
    }
    Ok(entries)
}

/// Truncates the file and writes one `key = value` line per entry.
pub fn save_config(path: &Path, entries: &Entries) -> Result<()> {
    let write_err = |source: std::io::Error| {
        error!("Cannot write config file {}: {}", path.display(), source);
        ConfigError::FileWrite {
            path: path.to_path_buf(),
            source,
        }
    };

    let file = fs::File::create(path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    for (key, value) in entries.iter() {
        writeln!(writer, "{}", format_entry(key, value)).map_err(write_err)?;
    }
    writer.flush().map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equals_takes_precedence_over_colon() {
        assert_eq!(parse_line("url = http://host:80"), Some(("url", "http://host:80")));
        assert_eq!(parse_line("a:b=c"), Some(("a:b", "c")));
    }

    #[test]
    fn colon_is_used_when_no_equals() {
        assert_eq!(parse_line("b : 2"), Some(("b", "2")));
        assert_eq!(parse_line("host:localhost:8080"), Some(("host", "localhost:8080")));
    }

    #[test]
    fn lines_without_delimiter_are_skipped() {
        assert_eq!(parse_line("# note"), None);
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("   "), None);
    }

    #[test]
    fn only_ascii_spaces_are_trimmed() {
        assert_eq!(parse_line("  key  =  value  "), Some(("key", "value")));
        assert_eq!(parse_line("\tkey = value\t"), Some(("\tkey", "value\t")));
    }

    #[test]
    fn empty_key_and_value_are_kept() {
        assert_eq!(parse_line("= x"), Some(("", "x")));
        assert_eq!(parse_line("k ="), Some(("k", "")));
    }

    #[test]
    fn join_updates_in_place_and_appends_new_keys() {
        let mut entries = Entries::new();
        entries.join("a".into(), "1".into());
        entries.join("b".into(), "2".into());
        entries.join("a".into(), "3".into());

        assert_eq!(entries.len(), 2);
        assert_eq!(entries.get("a"), Some("3"));
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn keys_are_case_sensitive() {
        let mut entries = Entries::new();
        entries.join("Key".into(), "1".into());
        entries.join("key".into(), "2".into());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries.get("KEY"), None);
    }

    #[test]
    fn format_uses_equals_with_spaces() {
        assert_eq!(format_entry("k", "v"), "k = v");
    }
}
