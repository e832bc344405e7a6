//! Dotted field paths (`dependents.0.name`) used to address form values and
//! to key validation errors.
//!
//! Keys containing `.` or `\` have those characters escaped with `\`, and an
//! all-digit key gets a leading `\` so it is not read back as a position:
//! the key `user.name` displays as `user\.name`, the key `2` as `\2`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    Key(String),
    /// Position inside an array field at the time the path is used.
    Index(usize),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(Vec<Segment>);

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn key(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Key(key.to_string()));
        Self(segments)
    }

    pub fn truncated(&self, len: usize) -> Self {
        Self(self.0.iter().take(len).cloned().collect())
    }

    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    pub fn index(&self, position: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Index(position));
        Self(segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match segment {
                Segment::Key(key) => write_key(f, key)?,
                Segment::Index(position) => write!(f, "{}", position)?,
            }
        }
        Ok(())
    }
}

fn write_key(f: &mut fmt::Formatter<'_>, key: &str) -> fmt::Result {
    if is_position(key) {
        f.write_str("\\")?;
    }
    for c in key.chars() {
        if c == '.' || c == '\\' {
            f.write_str("\\")?;
        }
        write!(f, "{}", c)?;
    }
    Ok(())
}

fn is_position(part: &str) -> bool {
    !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid field path '{0}'")]
pub struct ParsePathError(pub String);

impl FromStr for FieldPath {
    type Err = ParsePathError;

    /// Unescaped all-digit segments are positions, everything else is a key.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.is_empty() {
            return Ok(Self::root());
        }
        let invalid = || ParsePathError(value.to_string());

        let mut segments = Vec::new();
        let mut part = String::new();
        let mut escaped = false;
        let mut chars = value.chars();
        loop {
            match chars.next() {
                Some('\\') => {
                    part.push(chars.next().ok_or_else(invalid)?);
                    escaped = true;
                }
                Some('.') => {
                    segments.push(segment(std::mem::take(&mut part), escaped).ok_or_else(invalid)?);
                    escaped = false;
                }
                Some(c) => part.push(c),
                None => {
                    segments.push(segment(part, escaped).ok_or_else(invalid)?);
                    break;
                }
            }
        }
        Ok(Self(segments))
    }
}

fn segment(part: String, escaped: bool) -> Option<Segment> {
    if part.is_empty() {
        return None;
    }
    if !escaped && is_position(&part) {
        return part.parse().ok().map(Segment::Index);
    }
    Some(Segment::Key(part))
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
