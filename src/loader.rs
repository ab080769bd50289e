//! This module provides the `DefinitionLoader` struct, responsible for loading machine
//! definitions and test inputs from files and strings.

use crate::definition::MachineDefinition;
use crate::parser::parse;
use crate::types::MachineError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// On-disk format of a machine definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Text,
}

impl Format {
    /// Picks the format from a file extension. Anything other than `.tm` is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("tm") => Format::Text,
            _ => Format::Yaml,
        }
    }
}

/// `DefinitionLoader` is a utility struct for loading machine definitions and inputs.
pub struct DefinitionLoader;

impl DefinitionLoader {
    /// Loads a machine definition from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(MachineDefinition)` if the file is read and parsed.
    /// * `Err(MachineError::FileError)` if the file cannot be read.
    /// * `Err(MachineError::DefinitionError)` or `Err(MachineError::ParseError)` if the content
    ///   is not a valid definition.
    pub fn load_definition(path: &Path) -> Result<MachineDefinition, MachineError> {
        let content = read(path)?;
        let format = Format::from_path(path);

        debug!(path = %path.display(), ?format, "loading definition");

        Self::load_definition_from_string(&content, format)
    }

    /// Loads a machine definition from string content in the given format.
    pub fn load_definition_from_string(
        content: &str,
        format: Format,
    ) -> Result<MachineDefinition, MachineError> {
        match format {
            Format::Yaml => MachineDefinition::from_yaml(content),
            Format::Text => parse(content),
        }
    }

    /// Reads test inputs, one per line.
    ///
    /// Line endings may be `\n` or `\r\n`. Empty lines are kept as empty inputs; a final line
    /// without a newline is included.
    pub fn load_inputs(path: &Path) -> Result<Vec<String>, MachineError> {
        Ok(read(path)?.lines().map(String::from).collect())
    }

    /// Loads every `.yaml`, `.yml` and `.tm` definition in a directory.
    ///
    /// Each entry is reported separately; one bad file does not hide the others.
    pub fn load_definitions(
        directory: &Path,
    ) -> Vec<Result<(PathBuf, MachineDefinition), MachineError>> {
        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(MachineError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut unreadable = Vec::new();
        let mut loaded: Vec<_> = entries
            .filter_map(|entry| {
                let path = match entry {
                    Ok(entry) => entry.path(),
                    Err(e) => {
                        unreadable.push(MachineError::FileError(format!(
                            "Failed to read directory entry: {}",
                            e
                        )));
                        return None;
                    }
                };

                let known = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| matches!(ext, "yaml" | "yml" | "tm"));
                if path.is_dir() || !known {
                    return None;
                }

                let definition = Self::load_definition(&path);
                Some((path, definition))
            })
            .collect();

        loaded.sort_by(|(a, _), (b, _)| a.cmp(b));

        loaded
            .into_iter()
            .map(|(path, definition)| match definition {
                Ok(definition) => Ok((path, definition)),
                Err(e) => Err(MachineError::FileError(format!(
                    "Failed to load definition from {}: {}",
                    path.display(),
                    e
                ))),
            })
            .chain(unreadable.into_iter().map(Err))
            .collect()
    }
}

fn read(path: &Path) -> Result<String, MachineError> {
    fs::read_to_string(path).map_err(|e| {
        MachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MachineKind, Outcome};
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write(path: &Path, content: &str) {
        let mut file = File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_load_yaml_definition() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mod2.yaml");
        write(
            &path,
            "start: zero\naccept-states: [zero]\ntransitions:\n  - [zero, a, one]\n  - [one, a, zero]\n",
        );

        let definition = DefinitionLoader::load_definition(&path).unwrap();
        assert_eq!(definition.kind(), MachineKind::Dfa);

        let machine = definition.build().unwrap();
        assert_eq!(machine.run("a a", None).outcome, Outcome::Accepted);
    }

    #[test]
    fn test_load_text_definition() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flip.tm");
        write(
            &path,
            "kind: one-way-tm\nstart: q0\naccept: y\nreject: n\nq0, a -> q0, b, R\nq0, _ -> y, _, R\n",
        );

        let machine = DefinitionLoader::load_definition(&path)
            .unwrap()
            .build()
            .unwrap();
        let run = machine.run("a a", None);

        assert_eq!(run.outcome, Outcome::Accepted);
        assert_eq!(run.last().unwrap().as_tape().unwrap().tape(), &["b", "b"]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = DefinitionLoader::load_definition(&dir.path().join("absent.yaml")).unwrap_err();

        assert!(matches!(err, MachineError::FileError(_)));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path(Path::new("m.tm")), Format::Text);
        assert_eq!(Format::from_path(Path::new("m.yml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("machine")), Format::Yaml);
    }

    #[test]
    fn test_load_inputs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tests.txt");
        write(&path, "a a\r\n\nb a b");

        let inputs = DefinitionLoader::load_inputs(&path).unwrap();
        assert_eq!(inputs, vec!["a a", "", "b a b"]);
    }

    #[test]
    fn test_load_definitions_from_directory() {
        let dir = tempdir().unwrap();
        write(
            &dir.path().join("c-valid.tm"),
            "start: q0\naccept: q0\nq0, a -> q0\n",
        );
        write(&dir.path().join("b-invalid.yaml"), "start: [");
        write(&dir.path().join("a-invalid.tm"), "start q0");
        write(&dir.path().join("ignored.txt"), "not a machine");

        let results = DefinitionLoader::load_definitions(dir.path());
        assert_eq!(results.len(), 3);

        let first = results[0].as_ref().unwrap_err().to_string();
        let second = results[1].as_ref().unwrap_err().to_string();
        assert!(first.contains("a-invalid.tm"), "{first}");
        assert!(second.contains("b-invalid.yaml"), "{second}");

        let (path, definition) = results[2].as_ref().unwrap();
        assert!(path.ends_with("c-valid.tm"));
        assert_eq!(definition.start, "q0");
    }
}
