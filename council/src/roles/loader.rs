//! Role file loading: markdown with YAML frontmatter.
//!
//! ```text
//! ---
//! role_id: devils_advocate
//! role_name: "Devil's Advocate"
//! model: "llama3.2:3b"
//! order: 1
//! participates_in_debate: true
//! ---
//! # Debate Instructions
//! Challenge every assumption...
//! ```
//!
//! Older files using `participates_in_stage1` / `participates_in_stage3` and
//! `# Stage 1 Instructions` / `# Stage 3 Instructions` load unchanged.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Deserialize;
use tracing::debug;

use super::Role;
use crate::error::ConfigurationError;

static MODEL_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^(model:[ \t]*["']?)([^"'#\r\n]*?)(["']?[ \t]*(?:#[^\r\n]*)?\r?)$"#)
        .expect("MODEL_LINE_RE regex should compile")
});

const DEBATE_SECTIONS: &[&str] = &["Debate Instructions", "Stage 1 Instructions"];
const SYNTHESIS_SECTIONS: &[&str] = &["Synthesis Instructions", "Stage 3 Instructions"];

#[derive(Debug, Deserialize)]
struct Frontmatter {
    role_id: Option<String>,
    role_name: Option<String>,
    model: Option<String>,
    #[serde(default)]
    order: Option<u32>,
    #[serde(default, alias = "participates_in_stage1")]
    participates_in_debate: bool,
    #[serde(default, alias = "participates_in_stage3")]
    is_synthesizer: bool,
}

/// Byte offsets of the frontmatter block inside a role document.
struct DocumentSplit {
    yaml_start: usize,
    yaml_end: usize,
    body_start: usize,
}

fn split_frontmatter(content: &str) -> Option<DocumentSplit> {
    let rest = content.strip_prefix("---")?;
    let rest = rest.trim_start_matches([' ', '\t']);
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))?;
    let yaml_start = content.len() - rest.len();

    let mut offset = yaml_start;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some(DocumentSplit {
                yaml_start,
                yaml_end: offset,
                body_start: offset + line.len(),
            });
        }
        offset += line.len();
    }
    None
}

/// Level-1 sections (`# Heading`) of a markdown body, trimmed.
fn sections(body: &str) -> Vec<(&str, String)> {
    let mut out: Vec<(&str, String)> = Vec::new();
    for line in body.lines() {
        if let Some(heading) = line.strip_prefix("# ") {
            out.push((heading.trim(), String::new()));
        } else if let Some((_, text)) = out.last_mut() {
            text.push_str(line);
            text.push('\n');
        }
    }
    for (_, text) in &mut out {
        *text = text.trim().to_string();
    }
    out
}

fn section_text(sections: &[(&str, String)], names: &[&str]) -> String {
    sections
        .iter()
        .find(|(heading, _)| names.iter().any(|n| heading.eq_ignore_ascii_case(n)))
        .map(|(_, text)| text.clone())
        .unwrap_or_default()
}

fn required(
    value: Option<String>,
    source_name: &str,
    field: &'static str,
) -> Result<String, ConfigurationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigurationError::MissingField {
            source_name: source_name.to_string(),
            field,
        }),
    }
}

/// Parse one role document.
///
/// `discovery_index` becomes the role's order when the frontmatter does not
/// declare one.
pub fn parse_role(
    source_name: &str,
    content: &str,
    discovery_index: u32,
) -> Result<Role, ConfigurationError> {
    let split = split_frontmatter(content).ok_or_else(|| ConfigurationError::MissingFrontmatter {
        source_name: source_name.to_string(),
    })?;

    let meta: Frontmatter = serde_yaml::from_str(&content[split.yaml_start..split.yaml_end])
        .map_err(|e| ConfigurationError::InvalidFrontmatter {
            source_name: source_name.to_string(),
            detail: e.to_string(),
        })?;

    let body_sections = sections(&content[split.body_start..]);

    Ok(Role {
        role_id: required(meta.role_id, source_name, "role_id")?,
        role_name: required(meta.role_name, source_name, "role_name")?,
        model_id: required(meta.model, source_name, "model")?,
        debate_instructions: section_text(&body_sections, DEBATE_SECTIONS),
        synthesis_instructions: section_text(&body_sections, SYNTHESIS_SECTIONS),
        participates_in_debate: meta.participates_in_debate,
        is_synthesizer: meta.is_synthesizer,
        order: meta.order.unwrap_or(discovery_index),
    })
}

/// Load a single role file.
pub fn load_role_file(path: &Path, discovery_index: u32) -> Result<Role, ConfigurationError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_role(&path.display().to_string(), &content, discovery_index)
}

/// Markdown files of a roles directory, sorted by file name.
fn role_files(dir: &Path) -> Result<Vec<PathBuf>, ConfigurationError> {
    if !dir.is_dir() {
        return Err(ConfigurationError::RolesDirNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|source| ConfigurationError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ConfigurationError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("md") {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Load every `*.md` role in `dir`.
///
/// Files are visited in file-name order, so the discovery index (and hence
/// the default turn order) does not depend on directory iteration order.
pub fn load_roles_dir(dir: &Path) -> Result<Vec<Role>, ConfigurationError> {
    let files = role_files(dir)?;
    let mut roles = Vec::with_capacity(files.len());
    for (index, path) in files.iter().enumerate() {
        let role = load_role_file(path, index as u32)?;
        debug!(role_id = %role.role_id, path = %path.display(), "loaded role");
        roles.push(role);
    }
    Ok(roles)
}

/// Reassign the model of `role_id` by rewriting its file's `model:` line.
///
/// Only the frontmatter is touched. Returns the path of the rewritten file.
/// Model ids that cannot sit on a single YAML scalar line are rejected.
pub fn update_role_model(
    dir: &Path,
    role_id: &str,
    new_model: &str,
) -> Result<PathBuf, ConfigurationError> {
    if new_model.trim().is_empty()
        || new_model.trim() != new_model
        || new_model.contains(['"', '\'', '#', '\r', '\n'])
    {
        return Err(ConfigurationError::InvalidModel {
            model: new_model.to_string(),
        });
    }

    for path in role_files(dir)? {
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigurationError::Io {
            path: path.clone(),
            source,
        })?;
        let Some(split) = split_frontmatter(&content) else {
            continue;
        };
        let yaml = &content[split.yaml_start..split.yaml_end];
        let Ok(meta) = serde_yaml::from_str::<Frontmatter>(yaml) else {
            continue;
        };
        if meta.role_id.as_deref().map(str::trim) != Some(role_id) {
            continue;
        }

        if !MODEL_LINE_RE.is_match(yaml) {
            return Err(ConfigurationError::MissingField {
                source_name: path.display().to_string(),
                field: "model",
            });
        }
        let rewritten = MODEL_LINE_RE.replacen(yaml, 1, |caps: &Captures| {
            format!("{}{}{}", &caps[1], new_model, &caps[3])
        });

        let updated = format!(
            "{}{}{}",
            &content[..split.yaml_start],
            rewritten,
            &content[split.yaml_end..]
        );
        std::fs::write(&path, updated).map_err(|source| ConfigurationError::Io {
            path: path.clone(),
            source,
        })?;
        return Ok(path);
    }

    Err(ConfigurationError::UnknownRole {
        role_id: role_id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPTIMIST: &str = r#"---
role_id: optimist
role_name: "Optimist"
model: "mistral:7b"
participates_in_debate: true
---
# Debate Instructions

Argue for the upside.
Stay grounded.

# Notes
Not part of any prompt.
"#;

    const LEGACY_JUGE: &str = r#"---
role_id: juge
role_name: Juge
model: llama3.1:8b
participates_in_stage1: false
participates_in_stage2: false
participates_in_stage3: true
---
# Stage 1 Instructions

# Stage 3 Instructions
Weigh both sides and decide.
"#;

    #[test]
    fn test_parse_role() {
        let role = parse_role("optimist.md", OPTIMIST, 4).unwrap();
        assert_eq!(role.role_id, "optimist");
        assert_eq!(role.role_name, "Optimist");
        assert_eq!(role.model_id, "mistral:7b");
        assert_eq!(
            role.debate_instructions,
            "Argue for the upside.\nStay grounded."
        );
        assert!(role.synthesis_instructions.is_empty());
        assert!(role.participates_in_debate);
        assert!(!role.is_synthesizer);
        assert_eq!(role.order, 4);
    }

    #[test]
    fn test_parse_legacy_aliases() {
        let role = parse_role("juge.md", LEGACY_JUGE, 0).unwrap();
        assert!(role.is_synthesizer);
        assert!(!role.participates_in_debate);
        assert_eq!(role.synthesis_instructions, "Weigh both sides and decide.");
        assert!(role.debate_instructions.is_empty());
    }

    #[test]
    fn test_explicit_order_wins() {
        let content = OPTIMIST.replace("participates_in_debate: true", "participates_in_debate: true\norder: 9");
        let role = parse_role("optimist.md", &content, 1).unwrap();
        assert_eq!(role.order, 9);
    }

    #[test]
    fn test_missing_frontmatter() {
        let err = parse_role("bad.md", "# Debate Instructions\nhi", 0).unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingFrontmatter { .. }));
    }

    #[test]
    fn test_missing_model_field() {
        let content = "---\nrole_id: cfo\nrole_name: CFO\n---\n# Debate Instructions\nCount.";
        let err = parse_role("cfo.md", content, 0).unwrap_err();
        match err {
            ConfigurationError::MissingField { field, .. } => assert_eq!(field, "model"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_nested_heading_is_not_a_section() {
        let content = "---\nrole_id: a\nrole_name: A\nmodel: m\n---\n# Debate Instructions\nTop\n## Detail\nMore\n";
        let role = parse_role("a.md", content, 0).unwrap();
        assert_eq!(role.debate_instructions, "Top\n## Detail\nMore");
    }

    #[test]
    fn test_load_dir_sorted_by_file_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b_optimist.md"), OPTIMIST).unwrap();
        std::fs::write(
            dir.path().join("a_regulator.md"),
            OPTIMIST
                .replace("role_id: optimist", "role_id: regulator")
                .replace("\"Optimist\"", "Regulator"),
        )
        .unwrap();
        std::fs::write(dir.path().join("README.txt"), "ignored").unwrap();

        let roles = load_roles_dir(dir.path()).unwrap();
        assert_eq!(roles.len(), 2);
        assert_eq!(roles[0].role_id, "regulator");
        assert_eq!(roles[0].order, 0);
        assert_eq!(roles[1].role_id, "optimist");
        assert_eq!(roles[1].order, 1);
    }

    #[test]
    fn test_load_missing_dir() {
        let err = load_roles_dir(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, ConfigurationError::RolesDirNotFound { .. }));
    }

    #[test]
    fn test_update_role_model_rewrites_frontmatter_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("optimist.md");
        std::fs::write(&path, OPTIMIST).unwrap();

        let updated = update_role_model(dir.path(), "optimist", "qwen2.5:7b").unwrap();
        assert_eq!(updated, path);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("model: \"qwen2.5:7b\""));
        assert!(content.contains("Argue for the upside."));

        let role = parse_role("optimist.md", &content, 0).unwrap();
        assert_eq!(role.model_id, "qwen2.5:7b");
    }

    #[test]
    fn test_update_keeps_trailing_comment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfo.md");
        std::fs::write(
            &path,
            "---\nrole_id: cfo\nrole_name: CFO\nmodel: gemma2:9b  # local\n---\n# Debate Instructions\nCount.\n",
        )
        .unwrap();

        update_role_model(dir.path(), "cfo", "mistral:7b").unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("model: mistral:7b  # local\n"));
        let role = parse_role("cfo.md", &content, 0).unwrap();
        assert_eq!(role.model_id, "mistral:7b");
    }

    #[test]
    fn test_update_rejects_unsafe_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("optimist.md");
        std::fs::write(&path, OPTIMIST).unwrap();

        for bad in ["", "a\"b", "it's", "m # x", "m\nrole_id: evil", " padded"] {
            let err = update_role_model(dir.path(), "optimist", bad).unwrap_err();
            assert!(matches!(err, ConfigurationError::InvalidModel { .. }), "{:?}", bad);
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), OPTIMIST);
    }

    #[test]
    fn test_update_unknown_role() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("optimist.md"), OPTIMIST).unwrap();
        let err = update_role_model(dir.path(), "cfo", "x").unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownRole { .. }));
    }
}
