// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Class-index to label lookup shipped inside the model artifact
//!
//! Ultralytics ONNX exports embed the class names as a `names` entry in the
//! model's custom metadata, formatted as a Python-style dict:
//! `{0: 'With Helmet', 1: 'Without Helmet'}`. Some exporters write JSON
//! (`{"0": "With Helmet"}`) instead; both forms are accepted here.

use std::collections::HashMap;

use anyhow::{bail, Result};

/// Class-index → label lookup parsed from model metadata.
#[derive(Debug, Clone, Default)]
pub struct ClassLabels {
    names: HashMap<u32, String>,
}

impl ClassLabels {
    /// Parse a `names` metadata value.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let inner = trimmed
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .unwrap_or(trimmed);

        let mut names = HashMap::new();
        let mut chars = inner.chars().peekable();

        loop {
            // Skip separators and whitespace between entries
            while matches!(chars.peek(), Some(c) if c.is_whitespace() || *c == ',') {
                chars.next();
            }
            if chars.peek().is_none() {
                break;
            }

            // Key: digits, optionally quoted (JSON form)
            let key_quote = match chars.peek() {
                Some(q @ ('\'' | '"')) => {
                    let q = *q;
                    chars.next();
                    Some(q)
                }
                _ => None,
            };
            let mut key = String::new();
            while matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
                key.push(chars.next().unwrap());
            }
            if key.is_empty() {
                bail!("Malformed `names` metadata: expected numeric class id in {raw:?}");
            }
            if let Some(q) = key_quote {
                if chars.next() != Some(q) {
                    bail!("Malformed `names` metadata: unterminated key quote in {raw:?}");
                }
            }

            // Separator
            while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
                chars.next();
            }
            if chars.next() != Some(':') {
                bail!("Malformed `names` metadata: expected `:` after class id in {raw:?}");
            }
            while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
                chars.next();
            }

            // Value: quoted label string
            let quote = match chars.next() {
                Some(q @ ('\'' | '"')) => q,
                _ => bail!("Malformed `names` metadata: expected quoted label in {raw:?}"),
            };
            let mut label = String::new();
            loop {
                match chars.next() {
                    Some(c) if c == quote => break,
                    Some(c) => label.push(c),
                    None => bail!("Malformed `names` metadata: unterminated label in {raw:?}"),
                }
            }

            let class_id: u32 = key.parse()?;
            names.insert(class_id, label);
        }

        Ok(Self { names })
    }

    /// Human-readable label for a class index. Unknown indices render as
    /// `class_<id>` so a model/metadata mismatch stays visible instead of
    /// failing the request.
    pub fn name(&self, class_id: u32) -> String {
        self.names
            .get(&class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{}", class_id))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
