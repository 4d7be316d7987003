//! # Credential Bases
//!
//! Parser for `credential-bases.txt`. Each non-indented line names a
//! basis; the indented lines below it name store targets that share the
//! basis's user name and password:
//!
//! ```text
//! # comment
//! Artifactory
//!     https://artifacts.example.com
//!     git:https://git.example.com
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Errors reading or using the bases file.
#[derive(Debug, Error)]
pub enum BasesError {
  #[error("Failed to read credential bases from {}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("There are no credentials for basis '{basis}' listed in {source_name}")]
  NoEntries { basis: String, source_name: String },
}

/// A problem in the bases file that does not stop it from loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BasesWarning {
  /// An indented entry appeared before any basis line.
  OrphanEntry { line: usize, entry: String },
  /// A basis had nothing listed under it.
  EmptyBasis { basis: String },
}

impl fmt::Display for BasesWarning {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::OrphanEntry { line, entry } => write!(
        f,
        "Ignoring entry '{entry}' on line {line} because no basis line has been encountered yet"
      ),
      Self::EmptyBasis { basis } => write!(f, "Basis credential {basis} has no credentials listed under it"),
    }
  }
}

/// Parsed contents of a bases file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialBases {
  source_name: String,
  bases: BTreeMap<String, Vec<String>>,
  warnings: Vec<BasesWarning>,
}

impl CredentialBases {
  /// Parse bases file text. `source_name` is used in messages.
  pub fn parse(text: &str, source_name: impl Into<String>) -> Self {
    let source_name = source_name.into();
    let mut bases: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut warnings = Vec::new();
    let mut current: Option<String> = None;

    for (index, line) in text.lines().enumerate() {
      let trimmed = line.trim();
      if trimmed.is_empty() || line.starts_with('#') {
        continue;
      }

      if line.starts_with(char::is_whitespace) {
        match &current {
          Some(basis) => bases.entry(basis.clone()).or_default().push(trimmed.to_string()),
          None => warnings.push(BasesWarning::OrphanEntry {
            line: index + 1,
            entry: trimmed.to_string(),
          }),
        }
        continue;
      }

      if let Some(previous) = current.replace(line.trim_end().to_string()) {
        warn_if_empty(&bases, previous, &mut warnings);
      }
      if let Some(basis) = &current {
        bases.entry(basis.clone()).or_default();
      }
    }

    if let Some(last) = current {
      warn_if_empty(&bases, last, &mut warnings);
    }

    for warning in &warnings {
      debug!(source = %source_name, "{warning}");
    }

    Self {
      source_name,
      bases,
      warnings,
    }
  }

  /// Load a bases file. A missing file yields no bases.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, BasesError> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
      Ok(text) => Ok(Self::parse(&text, path.display().to_string())),
      Err(err) if err.kind() == io::ErrorKind::NotFound => {
        debug!(path = %path.display(), "no credential bases file");
        Ok(Self {
          source_name: path.display().to_string(),
          ..Self::default()
        })
      }
      Err(source) => Err(BasesError::Read {
        path: path.to_path_buf(),
        source,
      }),
    }
  }

  /// Where the bases came from
  pub fn source_name(&self) -> &str {
    &self.source_name
  }

  /// Basis names in sorted order
  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.bases.keys().map(String::as_str)
  }

  pub fn contains(&self, basis: &str) -> bool {
    self.bases.contains_key(basis)
  }

  /// Targets listed under `basis`, empty if it is unknown
  pub fn targets(&self, basis: &str) -> &[String] {
    self.bases.get(basis).map(Vec::as_slice).unwrap_or_default()
  }

  /// Targets under `basis`, or an error when there are none.
  pub fn require_targets(&self, basis: &str) -> Result<&[String], BasesError> {
    let targets = self.targets(basis);
    if targets.is_empty() {
      return Err(BasesError::NoEntries {
        basis: basis.to_string(),
        source_name: self.source_name.clone(),
      });
    }
    Ok(targets)
  }

  /// Whether any basis lists `target`
  pub fn lists_target(&self, target: &str) -> bool {
    self.bases.values().any(|targets| targets.iter().any(|t| t == target))
  }

  pub fn warnings(&self) -> &[BasesWarning] {
    &self.warnings
  }

  pub fn is_empty(&self) -> bool {
    self.bases.is_empty()
  }
}

fn warn_if_empty(bases: &BTreeMap<String, Vec<String>>, basis: String, warnings: &mut Vec<BasesWarning>) {
  if bases.get(&basis).is_none_or(Vec::is_empty) {
    warnings.push(BasesWarning::EmptyBasis { basis });
  }
}
