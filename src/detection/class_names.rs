// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Class name discovery for exported detectors
//!
//! Ultralytics ONNX exports carry a `names` metadata entry holding a Python
//! dict literal such as `{0: 'bumper', 1: 'door'}`. Models without it can
//! ship a plain labels file next to the artifact.

use anyhow::{Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::types::{ClassId, ClassNames};

/// `index: 'name'` entries of a Python dict literal, compiled on first use
static NAME_ENTRY_RE: OnceLock<Option<Regex>> = OnceLock::new();
/// First integer in a metadata value
static DIGITS_RE: OnceLock<Option<Regex>> = OnceLock::new();

/// Parse the Ultralytics `names` metadata value.
///
/// Returns `None` when no `index: 'name'` pairs are present.
pub fn parse_ultralytics_names(raw: &str) -> Option<ClassNames> {
    let pattern = NAME_ENTRY_RE
        .get_or_init(|| Regex::new(r#"(\d+)\s*:\s*(?:'([^']*)'|"([^"]*)")"#).ok())
        .as_ref()?;

    let names: ClassNames = pattern
        .captures_iter(raw)
        .filter_map(|caps| {
            let id = caps.get(1)?.as_str().parse::<ClassId>().ok()?;
            let name = caps.get(2).or_else(|| caps.get(3))?.as_str().to_string();
            Some((id, name))
        })
        .collect();

    if names.is_empty() {
        None
    } else {
        Some(names)
    }
}

/// Parse the Ultralytics `imgsz` metadata value (`[640, 640]`).
///
/// Only square inputs are supported; the first dimension is returned.
pub fn parse_input_size(raw: &str) -> Option<u32> {
    let pattern = DIGITS_RE.get_or_init(|| Regex::new(r"\d+").ok()).as_ref()?;
    pattern
        .find(raw)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|size| *size > 0)
}

/// Load a labels file with one class name per line; line N is class N.
pub fn load_labels_file(path: &Path) -> Result<ClassNames> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read labels file {}", path.display()))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(idx, name)| (idx as ClassId, name.to_string()))
        .collect())
}

/// Labels files looked up next to a model, in priority order.
pub fn labels_file_candidates(model_path: &Path) -> Vec<PathBuf> {
    let mut candidates = vec![model_path.with_extension("names")];
    if let Some(dir) = model_path.parent() {
        candidates.push(dir.join("classes.txt"));
    }
    candidates
}

/// Find class names in the first existing labels file next to the model.
pub fn find_labels_file(model_path: &Path) -> Option<(PathBuf, ClassNames)> {
    labels_file_candidates(model_path)
        .into_iter()
        .filter(|candidate| candidate.is_file())
        .find_map(|candidate| match load_labels_file(&candidate) {
            Ok(names) if !names.is_empty() => Some((candidate, names)),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("⚠️ Ignoring labels file {}: {:#}", candidate.display(), e);
                None
            }
        })
}

/// Name for a class id, falling back to `class_<id>` for unmapped ids.
pub fn class_name(names: &ClassNames, class_id: ClassId) -> String {
    names
        .get(&class_id)
        .cloned()
        .unwrap_or_else(|| format!("class_{}", class_id))
}
