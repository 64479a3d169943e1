use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::objects::script::{parse, Statement};

pub const MAX_OBJECTS: usize = 10240;
pub const MAX_CATEGORIES: usize = 10240;
pub const ROOT_CATEGORY: &str = "*";

/// A named object program straight out of the parser, ready for the
/// compiler.
#[derive(Clone, Debug)]
pub struct ObjectProgram {
    pub name: String,
    pub hidden: bool,
    pub body: Vec<Statement>,
    pub file: Arc<str>,
    pub line: u32,
}

/// Every object program found under the objects/ search path, plus the
/// sorted name and category tables the editor lists.
#[derive(Clone, Default, Debug)]
pub struct ObjectCatalog {
    names: Vec<String>,
    categories: Vec<String>,
    lookup: HashMap<String, Arc<ObjectProgram>>,
}

fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.')
}

impl ObjectCatalog {
    /// Builds the catalog from already-parsed top-level statements.
    pub fn from_statements(statements: Vec<Statement>) -> Result<Self, String> {
        let mut catalog = ObjectCatalog {
            categories: vec![ROOT_CATEGORY.to_string()],
            ..Default::default()
        };

        for stmt in statements {
            if !stmt.id.eq_ignore_ascii_case("object") {
                return Err(format!(
                    "{}: unknown keyword '{}'",
                    stmt.location(),
                    stmt.id
                ));
            }
            let name = stmt
                .params
                .first()
                .and_then(|p| p.as_value())
                .ok_or_else(|| format!("{}: object name is expected", stmt.location()))?
                .to_string();
            let body = stmt
                .params
                .get(1)
                .and_then(|p| p.as_block())
                .ok_or_else(|| format!("{}: object '{}' has no body", stmt.location(), name))?
                .to_vec();

            let key = name.to_lowercase();
            if catalog.lookup.contains_key(&key) {
                return Err(format!(
                    "{}: can't redefine object '{}'",
                    stmt.location(),
                    name
                ));
            }
            if catalog.lookup.len() >= MAX_OBJECTS {
                return Err(format!(
                    "{}: can't have more than {} objects",
                    stmt.location(),
                    MAX_OBJECTS
                ));
            }

            let hidden = is_hidden_name(&name);
            if !hidden {
                catalog.names.push(name.clone());
                catalog.gather_categories(&body)?;
            }
            catalog.lookup.insert(
                key,
                Arc::new(ObjectProgram {
                    name,
                    hidden,
                    body,
                    file: stmt.file.clone(),
                    line: stmt.line,
                }),
            );
        }

        catalog
            .names
            .sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()));
        catalog
            .categories
            .sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()));
        Ok(catalog)
    }

    fn gather_categories(&mut self, body: &[Statement]) -> Result<(), String> {
        for stmt in body {
            if !stmt.id.eq_ignore_ascii_case("category") {
                continue;
            }
            let tags: Vec<&str> = stmt.params.iter().filter_map(|p| p.as_value()).collect();
            if tags.is_empty() {
                return Err(format!(
                    "{}: category expects at least one tag",
                    stmt.location()
                ));
            }
            for tag in tags {
                let known = self
                    .categories
                    .iter()
                    .any(|c| c.eq_ignore_ascii_case(tag));
                if !known {
                    if self.categories.len() >= MAX_CATEGORIES {
                        return Err(format!(
                            "{}: can't have more than {} categories",
                            stmt.location(),
                            MAX_CATEGORIES
                        ));
                    }
                    self.categories.push(tag.to_string());
                }
            }
        }
        Ok(())
    }

    /// Parses a set of in-memory sources; the test entry point.
    pub fn from_sources(sources: &[(&str, &str)]) -> Result<Self, String> {
        let mut statements = Vec::new();
        for (file, source) in sources {
            statements.extend(parse(source, file)?);
        }
        Self::from_statements(statements)
    }

    /// Recursively reads every `*.obj` file under `root`. Files are visited
    /// in sorted order so catalog construction is reproducible.
    pub fn load_dir(root: &Path) -> Result<Self, String> {
        let mut files = Vec::new();
        collect_obj_files(root, &mut files)?;
        files.sort();

        let mut statements = Vec::new();
        for file in files {
            let source = std::fs::read_to_string(&file)
                .map_err(|e| format!("can't read {}: {e}", file.display()))?;
            statements.extend(parse(&source, &file.display().to_string())?);
        }
        Self::from_statements(statements)
    }

    pub fn find(&self, name: &str) -> Option<&Arc<ObjectProgram>> {
        self.lookup.get(&name.to_lowercase())
    }

    /// Visible object names, sorted case-insensitively.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Category tags of visible objects plus the implicit root, sorted.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}

fn collect_obj_files(dir: &Path, out: &mut Vec<std::path::PathBuf>) -> Result<(), String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(()), // a missing objects/ directory is an empty catalog
    };
    for entry in entries {
        let entry = entry.map_err(|e| format!("can't scan {}: {e}", dir.display()))?;
        let path = entry.path();
        if path.is_dir() {
            collect_obj_files(&path, out)?;
        } else if path.extension().map(|e| e == "obj").unwrap_or(false) {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_sorted_names_and_categories() {
        let catalog = ObjectCatalog::from_sources(&[(
            "a.obj",
            r#"
object "Zebra" { category wildlife }
object "ant" { category Wildlife insect }
object ".hidden helper" { category secret }
"#,
        )])
        .unwrap();
        assert_eq!(catalog.names(), &["ant".to_string(), "Zebra".to_string()]);
        assert_eq!(
            catalog.categories(),
            &["*".to_string(), "insect".to_string(), "wildlife".to_string()]
        );
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn hidden_objects_resolve_but_are_not_listed() {
        let catalog =
            ObjectCatalog::from_sources(&[("a.obj", "object \".helper\" { }")]).unwrap();
        assert!(catalog.names().is_empty());
        assert!(catalog.find(".HELPER").is_some());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let catalog =
            ObjectCatalog::from_sources(&[("a.obj", "object \"Spark\" { }")]).unwrap();
        assert!(catalog.find("spark").is_some());
        assert!(catalog.find("SPARK").is_some());
        assert!(catalog.find("other").is_none());
    }

    #[test]
    fn duplicate_objects_are_fatal_with_location() {
        let err = ObjectCatalog::from_sources(&[(
            "dup.obj",
            "object \"X\" { }\nobject \"x\" { }",
        )])
        .unwrap_err();
        assert!(err.contains("dup.obj:2"), "{err}");
        assert!(err.contains("redefine"), "{err}");
    }

    #[test]
    fn unknown_top_level_keyword_is_fatal() {
        let err = ObjectCatalog::from_sources(&[("a.obj", "wibble \"X\"")]).unwrap_err();
        assert!(err.contains("unknown keyword"), "{err}");
        assert!(err.contains("a.obj:1"), "{err}");
    }

    #[test]
    fn empty_category_clause_is_fatal() {
        let err =
            ObjectCatalog::from_sources(&[("a.obj", "object \"X\" { category }")]).unwrap_err();
        assert!(err.contains("category"), "{err}");
    }

    #[test]
    fn hidden_objects_do_not_contribute_categories() {
        let catalog = ObjectCatalog::from_sources(&[(
            "a.obj",
            "object \".h\" { category secret }\nobject \"V\" { }",
        )])
        .unwrap();
        assert_eq!(catalog.categories(), &["*".to_string()]);
    }
}
