//! Dependency declarations extracted from manifest files.
//!
//! A declaration counts as pinned only when it names one exact version.
//! Lower bounds, ranges, compatible-release operators and wildcards do
//! not count.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub pinned: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    /// `requirements.txt` style, one requirement per line.
    Requirements,
    /// Conda `environment.yml`.
    CondaEnvironment,
    /// `pyproject.toml` (PEP 621 or Poetry).
    Pyproject,
}

impl ManifestFormat {
    pub fn detect(path: &str) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path);
        if name.ends_with(".yml") || name.ends_with(".yaml") {
            ManifestFormat::CondaEnvironment
        } else if name == "pyproject.toml" {
            ManifestFormat::Pyproject
        } else {
            ManifestFormat::Requirements
        }
    }
}

/// Extracts declarations from one manifest.
///
/// Documents that fail to parse yield no declarations.
pub fn extract(path: &str, content: &str) -> Vec<Declaration> {
    match ManifestFormat::detect(path) {
        ManifestFormat::Requirements => content.lines().filter_map(parse_requirement).collect(),
        ManifestFormat::CondaEnvironment => extract_conda(path, content),
        ManifestFormat::Pyproject => extract_pyproject(path, content),
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

fn split_name(spec: &str) -> (&str, &str) {
    let end = spec.find(|c: char| !is_name_char(c)).unwrap_or(spec.len());
    (&spec[..end], spec[end..].trim())
}

/// One PEP 508 requirement line; `None` for blanks, comments and options.
pub fn parse_requirement(line: &str) -> Option<Declaration> {
    let line = line.split(" #").next().unwrap_or(line).trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
        return None;
    }

    // Environment markers do not affect pinning.
    let spec = line.split(';').next().unwrap_or(line).trim();
    let (name, mut rest) = split_name(spec);
    if name.is_empty() {
        return None;
    }

    if rest.starts_with('[') {
        rest = rest.find(']').map(|i| rest[i + 1..].trim()).unwrap_or("");
    }
    let rest = rest
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .unwrap_or(rest);

    Some(Declaration {
        name: name.to_string(),
        pinned: is_exact_specifier(rest),
    })
}

/// `==1.2.3` or `===1.2.3`, with no other clause and no wildcard.
fn is_exact_specifier(spec: &str) -> bool {
    let spec = spec.trim();
    if spec.is_empty() || spec.contains(',') {
        return false;
    }
    let version = spec
        .strip_prefix("===")
        .or_else(|| spec.strip_prefix("=="));
    matches!(version, Some(v) if is_exact_version(v))
}

fn is_exact_version(v: &str) -> bool {
    let v = v.trim();
    !v.is_empty() && !v.contains(['*', '<', '>', '!', '~', '^', ',', '|', ' '])
}

#[derive(Debug, Deserialize)]
struct CondaEnvironment {
    #[serde(default)]
    dependencies: Vec<serde_yaml::Value>,
}

fn extract_conda(path: &str, content: &str) -> Vec<Declaration> {
    let env: CondaEnvironment = match serde_yaml::from_str(content) {
        Ok(env) => env,
        Err(err) => {
            tracing::debug!(path, error = %err, "unparseable environment file");
            return Vec::new();
        }
    };

    let mut out = Vec::new();
    for dep in &env.dependencies {
        match dep {
            serde_yaml::Value::String(spec) => out.extend(parse_conda_spec(spec)),
            serde_yaml::Value::Mapping(map) => {
                // `- pip: [...]` nests requirement lines.
                let pip = map
                    .get("pip")
                    .and_then(serde_yaml::Value::as_sequence)
                    .into_iter()
                    .flatten();
                for item in pip {
                    if let Some(line) = item.as_str() {
                        out.extend(parse_requirement(line));
                    }
                }
            }
            _ => {}
        }
    }
    out
}

/// Conda match spec such as `numpy=1.24.3`, `conda-forge::scipy==1.10`
/// or `python 3.10.4`.
fn parse_conda_spec(spec: &str) -> Option<Declaration> {
    let spec = spec.trim();
    let spec = spec.rsplit("::").next().unwrap_or(spec);
    let (name, rest) = split_name(spec);
    if name.is_empty() {
        return None;
    }

    let pinned = if let Some(v) = rest.strip_prefix("==") {
        is_exact_version(v)
    } else if let Some(v) = rest.strip_prefix('=') {
        // A second `=` separates the build string.
        is_exact_version(v.split('=').next().unwrap_or(v))
    } else {
        rest.starts_with(|c: char| c.is_ascii_digit()) && is_exact_version(rest)
    };

    Some(Declaration {
        name: name.to_string(),
        pinned,
    })
}

fn extract_pyproject(path: &str, content: &str) -> Vec<Declaration> {
    let doc: toml::Table = match content.parse() {
        Ok(doc) => doc,
        Err(err) => {
            tracing::debug!(path, error = %err, "unparseable pyproject.toml");
            return Vec::new();
        }
    };

    let mut out = Vec::new();

    let pep621 = doc
        .get("project")
        .and_then(|p| p.get("dependencies"))
        .and_then(toml::Value::as_array)
        .into_iter()
        .flatten();
    for item in pep621 {
        if let Some(line) = item.as_str() {
            out.extend(parse_requirement(line));
        }
    }

    let poetry = doc
        .get("tool")
        .and_then(|t| t.get("poetry"))
        .and_then(|p| p.get("dependencies"))
        .and_then(toml::Value::as_table);
    if let Some(table) = poetry {
        for (name, constraint) in table {
            if name == "python" {
                continue;
            }
            out.push(Declaration {
                name: name.clone(),
                pinned: is_poetry_exact(constraint),
            });
        }
    }

    out
}

/// Poetry treats a bare version as exact; `^`, `~` and ranges are not.
fn is_poetry_exact(constraint: &toml::Value) -> bool {
    let version = match constraint {
        toml::Value::String(s) => s.as_str(),
        toml::Value::Table(t) => match t.get("version").and_then(toml::Value::as_str) {
            Some(v) => v,
            None => return false,
        },
        _ => return false,
    };

    let version = version.trim();
    let version = version
        .strip_prefix("==")
        .or_else(|| version.strip_prefix('='))
        .unwrap_or(version)
        .trim();
    version.starts_with(|c: char| c.is_ascii_digit()) && is_exact_version(version)
}
