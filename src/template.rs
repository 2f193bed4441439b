//! Named-slot HTML templates for the TOC and homepage.
//!
//! A template is plain text with `{{slot}}` markers (whitespace inside the
//! braces is allowed). Everything else, including any other use of `{` and
//! `}` in CSS or JavaScript, is copied through verbatim.
//!
//! | Slot | Value |
//! |------|-------|
//! | `{{homepage}}` | Path of the homepage relative to the TOC file |
//! | `{{navigation}}` | Navigation tree markup |
//! | `{{timestamp}}` | Generation time, `DD.MM.YYYY HH:MM:SS` |
//!
//! Each template kind accepts a fixed subset of slots. A marker whose content
//! is an identifier but not a slot name, or a slot the template kind does not
//! accept, is rejected when the template is parsed rather than rendered as
//! garbage.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("cannot read template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unknown template slot '{{{{{name}}}}}'")]
    UnknownSlot { name: String },
    #[error("slot '{{{{{}}}}}' is not available in this template", .0.name())]
    SlotNotAllowed(Slot),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Homepage,
    Navigation,
    Timestamp,
}

impl Slot {
    pub fn name(self) -> &'static str {
        match self {
            Slot::Homepage => "homepage",
            Slot::Navigation => "navigation",
            Slot::Timestamp => "timestamp",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "homepage" => Some(Slot::Homepage),
            "navigation" => Some(Slot::Navigation),
            "timestamp" => Some(Slot::Timestamp),
            _ => None,
        }
    }
}

/// Values substituted into a template. Slots a template does not use are
/// simply ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlotValues<'a> {
    pub homepage: &'a str,
    pub navigation: &'a str,
    pub timestamp: &'a str,
}

impl SlotValues<'_> {
    fn get(&self, slot: Slot) -> &str {
        match slot {
            Slot::Homepage => self.homepage,
            Slot::Navigation => self.navigation,
            Slot::Timestamp => self.timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Slot(Slot),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parse template text, accepting only the `allowed` slots.
    pub fn parse(text: &str, allowed: &[Slot]) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = text;

        while let Some(open) = rest.find("{{") {
            let after_open = &rest[open + 2..];
            let Some(close) = after_open.find("}}") else {
                break;
            };
            let inner = after_open[..close].trim();
            if !is_identifier(inner) {
                literal.push_str(&rest[..open + 2]);
                rest = after_open;
                continue;
            }

            let slot = Slot::from_name(inner).ok_or_else(|| TemplateError::UnknownSlot {
                name: inner.to_string(),
            })?;
            if !allowed.contains(&slot) {
                return Err(TemplateError::SlotNotAllowed(slot));
            }

            literal.push_str(&rest[..open]);
            if !literal.is_empty() {
                segments.push(Segment::Text(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Slot(slot));
            rest = &after_open[close + 2..];
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Text(literal));
        }
        Ok(Self { segments })
    }

    /// Parse the file at `path`, or `default` when no path is given.
    pub fn load(
        path: Option<&Path>,
        default: &str,
        allowed: &[Slot],
    ) -> Result<Self, TemplateError> {
        match path {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|source| TemplateError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::parse(&text, allowed)
            }
            None => Self::parse(default, allowed),
        }
    }

    /// Slots in order of appearance.
    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Slot(slot) => Some(*slot),
            Segment::Text(_) => None,
        })
    }

    /// Slots from `required` that never appear in the template.
    pub fn missing_slots(&self, required: &[Slot]) -> Vec<Slot> {
        required
            .iter()
            .copied()
            .filter(|slot| !self.slots().any(|s| s == *slot))
            .collect()
    }

    pub fn render(&self, values: &SlotValues<'_>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Slot(slot) => out.push_str(values.get(*slot)),
            }
        }
        out
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
