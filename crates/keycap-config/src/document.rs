//! Style and layout documents on disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::builder::{ConfigBuilder, Layer};
use crate::errors::ConfigError;
use crate::model::KeyConfig;
use crate::overrides::KeyOverrides;

/// Which of the two document kinds to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocKind {
    Style,
    Layout,
}

impl DocKind {
    fn dir(self) -> &'static str {
        match self {
            DocKind::Style => "styles",
            DocKind::Layout => "layouts",
        }
    }
}

/// Find a document. `name` is used as-is when it names an existing file,
/// otherwise it is looked up as `<root>/styles/<name>.yaml` or
/// `<root>/layouts/<name>.yaml`.
pub fn locate(root: &Path, kind: DocKind, name: &str) -> Result<PathBuf, ConfigError> {
    let direct = Path::new(name);
    if direct.is_file() {
        return Ok(direct.to_path_buf());
    }
    let path = root.join(kind.dir()).join(format!("{name}.yaml"));
    if path.is_file() {
        Ok(path)
    } else {
        Err(ConfigError::NotFound { path })
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

/// A style: one global overlay plus named bases and modifiers.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StyleDoc {
    #[serde(default)]
    pub global: KeyOverrides,
    #[serde(default)]
    pub bases: BTreeMap<String, KeyOverrides>,
    #[serde(default)]
    pub modifiers: BTreeMap<String, KeyOverrides>,
}

impl StyleDoc {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = read(path)?;
        let doc = Self::parse(&text, &path.display().to_string())?;
        debug!(
            path = %path.display(),
            bases = doc.bases.len(),
            modifiers = doc.modifiers.len(),
            "loaded style"
        );
        Ok(doc)
    }

    /// Parse a style from YAML text. `what` names the source in errors.
    pub fn parse(text: &str, what: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            what: format!("style {what}"),
            source,
        })
    }

    /// Fold global, base, key and modifier layers for one key.
    pub fn resolve(&self, key_id: &str, entry: &KeyEntry) -> Result<KeyConfig, ConfigError> {
        let mut builder = ConfigBuilder::new().layer(Layer::Global, &self.global)?;
        if let Some(base) = entry.base.as_deref().filter(|b| !b.is_empty()) {
            let layer = self.bases.get(base).ok_or_else(|| ConfigError::UnknownBase {
                key: key_id.to_string(),
                base: base.to_string(),
            })?;
            builder = builder.layer(Layer::Base, layer)?;
        }
        builder = builder.layer(Layer::Key, &entry.overrides)?;
        for name in &entry.modifiers {
            let layer = self
                .modifiers
                .get(name)
                .ok_or_else(|| ConfigError::UnknownModifier {
                    key: key_id.to_string(),
                    modifier: name.clone(),
                })?;
            builder = builder.layer(Layer::Modifier, layer)?;
        }
        debug!(key = key_id, modifiers = entry.modifiers.len(), "merged layers");
        builder.build()
    }
}

/// One key of a layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyEntry {
    pub base: Option<String>,
    pub modifiers: Vec<String>,
    pub overrides: KeyOverrides,
}

/// A layout: keys in the order they appear in the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutDoc {
    pub keys: Vec<(String, KeyEntry)>,
}

impl LayoutDoc {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = read(path)?;
        let doc = Self::parse(&text, &path.display().to_string())?;
        debug!(path = %path.display(), keys = doc.keys.len(), "loaded layout");
        Ok(doc)
    }

    /// Parse a layout from YAML text. `what` names the source in errors.
    pub fn parse(text: &str, what: &str) -> Result<Self, ConfigError> {
        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct Raw {
            #[serde(default)]
            keys: Mapping,
        }

        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: Raw = serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            what: format!("layout {what}"),
            source,
        })?;

        let mut keys = Vec::with_capacity(raw.keys.len());
        for (id, body) in raw.keys {
            let id = key_name(&id);
            let entry = parse_entry(body).map_err(|source| ConfigError::Parse {
                what: format!("key `{id}` in layout {what}"),
                source,
            })?;
            keys.push((id, entry));
        }
        Ok(Self { keys })
    }
}

fn key_name(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

fn parse_entry(body: Value) -> Result<KeyEntry, serde_yaml::Error> {
    let mut map = serde_yaml::from_value::<Option<Mapping>>(body)?.unwrap_or_default();
    let base = map
        .remove("base")
        .map(serde_yaml::from_value::<Option<String>>)
        .transpose()?
        .flatten();
    let modifiers = map
        .remove("modifiers")
        .map(serde_yaml::from_value::<Option<Vec<String>>>)
        .transpose()?
        .flatten()
        .unwrap_or_default();
    let overrides = serde_yaml::from_value(Value::Mapping(map))?;
    Ok(KeyEntry {
        base,
        modifiers,
        overrides,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StemSpec;
    use std::fs;

    const STYLE: &str = "\
global:
  tolerance: 0.05
  tight_tolerance: 0.01
  wall: 1.5
  inner_radius: 0.0
  corner_radius: 1.0
  back_slope: 0
  front_slope: 0
  side_slope: 0
  back_curve: 0
  front_curve: 0
  front_rise: 8
  back_rise: 8
  height: 18
  width: 1
bases:
  row1:
    back_rise: 10
    wall: 2.0
modifiers:
  wide:
    width: 1.5
  wider:
    width: 2.0
  formal:
    stem:
      type: formal
";

    #[test]
    fn test_layout_preserves_key_order() {
        let layout = LayoutDoc::parse(
            "keys:\n  esc: {base: row1}\n  1: {}\n  tab:\n    modifiers: [wide]\n",
            "test",
        )
        .unwrap();
        let ids: Vec<_> = layout.keys.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["esc", "1", "tab"]);
        assert_eq!(layout.keys[0].1.base.as_deref(), Some("row1"));
        assert_eq!(layout.keys[2].1.modifiers, ["wide"]);
    }

    #[test]
    fn test_key_overrides_are_split_from_references() {
        let layout =
            LayoutDoc::parse("keys:\n  space:\n    base: row1\n    width: 6.25\n", "test").unwrap();
        let entry = &layout.keys[0].1;
        assert_eq!(entry.base.as_deref(), Some("row1"));
        assert_eq!(entry.overrides.width, Some(6.25));
    }

    #[test]
    fn test_unknown_key_field_names_the_key() {
        let err = LayoutDoc::parse("keys:\n  esc:\n    hieght: 18\n", "test").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("esc"), "{message}");
    }

    #[test]
    fn test_resolve_applies_all_layers() {
        let style = StyleDoc::parse(STYLE, "test").unwrap();
        let entry = KeyEntry {
            base: Some("row1".into()),
            modifiers: vec!["wide".into(), "wider".into(), "formal".into()],
            overrides: KeyOverrides {
                wall: Some(1.2),
                ..Default::default()
            },
        };
        let config = style.resolve("k", &entry).unwrap();
        assert_eq!(config.back_rise, 10.0);
        assert_eq!(config.wall, 1.2);
        assert_eq!(config.width, 2.0);
        assert!(matches!(config.stem, StemSpec::Formal(_)));
    }

    #[test]
    fn test_unknown_base_and_modifier() {
        let style = StyleDoc::parse(STYLE, "test").unwrap();
        let entry = KeyEntry {
            base: Some("row9".into()),
            ..Default::default()
        };
        assert!(matches!(
            style.resolve("k", &entry),
            Err(ConfigError::UnknownBase { base, .. }) if base == "row9"
        ));
        let entry = KeyEntry {
            modifiers: vec!["huge".into()],
            ..Default::default()
        };
        assert!(matches!(
            style.resolve("k", &entry),
            Err(ConfigError::UnknownModifier { modifier, .. }) if modifier == "huge"
        ));
    }

    #[test]
    fn test_locate_by_name_and_by_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("styles")).unwrap();
        let style = dir.path().join("styles").join("default.yaml");
        fs::write(&style, STYLE).unwrap();

        let found = locate(dir.path(), DocKind::Style, "default").unwrap();
        assert_eq!(found, style);
        let direct = locate(dir.path(), DocKind::Layout, style.to_str().unwrap()).unwrap();
        assert_eq!(direct, style);

        let err = locate(dir.path(), DocKind::Layout, "missing").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { path } if path.ends_with("layouts/missing.yaml")));
    }

    #[test]
    fn test_load_style_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("style.yaml");
        fs::write(&path, STYLE).unwrap();
        let style = StyleDoc::load(&path).unwrap();
        assert_eq!(style.bases.len(), 1);
        assert_eq!(style.modifiers.len(), 3);
        assert_eq!(style.global.height, Some(18.0));
    }
}
