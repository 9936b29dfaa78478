//! Import resolution for `LinkML` schemas

use cas_linkml_core::{
    error::{LinkMLError, Result},
    types::SchemaDefinition,
};
use dashmap::DashMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{AsyncSchemaParser, Parser};
use crate::file_system_adapter::FileSystemOperations;

/// Imports provided by the LinkML runtime itself
const BUILTIN_IMPORT_PREFIX: &str = "linkml:";

/// Import resolver for handling schema imports
pub struct ImportResolver<F: FileSystemOperations> {
    /// Cache of resolved schemas
    cache: DashMap<String, SchemaDefinition>,
    /// Search paths for imports
    search_paths: Vec<PathBuf>,
    /// Maximum import depth to prevent infinite recursion
    max_depth: usize,
    fs: Arc<F>,
    parser: Parser<F>,
}

impl<F: FileSystemOperations> ImportResolver<F> {
    /// Create with specific search paths
    #[must_use]
    pub fn with_search_paths(search_paths: Vec<PathBuf>, fs: Arc<F>) -> Self {
        Self {
            cache: DashMap::new(),
            search_paths,
            max_depth: 10,
            parser: Parser::new(Arc::clone(&fs)),
            fs,
        }
    }

    /// Resolve all imports in a schema, returning a merged schema
    ///
    /// `linkml:` imports are provided by the runtime and left in place.
    ///
    /// # Errors
    ///
    /// Returns a `LinkMLError` if:
    /// - An import cannot be found or parsed
    /// - Two schemas define the same element
    /// - Maximum import depth is exceeded
    pub async fn resolve_imports(&self, schema: &SchemaDefinition) -> Result<SchemaDefinition> {
        let mut merged = schema.clone();
        let mut visited = HashSet::new();
        let imports: Vec<String> = schema.imports.clone();
        self.resolve_recursive(&mut merged, imports, &mut visited, 0)
            .await?;
        Ok(merged)
    }

    async fn resolve_recursive(
        &self,
        target: &mut SchemaDefinition,
        imports: Vec<String>,
        visited: &mut HashSet<String>,
        depth: usize,
    ) -> Result<()> {
        if depth > self.max_depth {
            return Err(LinkMLError::import(
                "imports",
                format!("Maximum import depth ({}) exceeded", self.max_depth),
            ));
        }

        for import in imports {
            if import.starts_with(BUILTIN_IMPORT_PREFIX) || !visited.insert(import.clone()) {
                continue;
            }

            let imported = self.load_import(&import).await?;
            tracing::debug!(import = %import, classes = imported.classes.len(), "merging import");
            Self::merge_schema(target, &imported)?;

            let nested = imported.imports.clone();
            Box::pin(self.resolve_recursive(target, nested, visited, depth + 1)).await?;
        }

        Ok(())
    }

    async fn load_import(&self, import: &str) -> Result<SchemaDefinition> {
        if let Some(schema) = self.cache.get(import) {
            return Ok(schema.clone());
        }

        let path = self.find_import_file(import).await?;
        let schema = self.parser.parse_file(&path).await?;
        self.cache.insert(import.to_string(), schema.clone());
        Ok(schema)
    }

    async fn find_import_file(&self, import: &str) -> Result<PathBuf> {
        let extensions = ["yaml", "yml", "json"];

        for search_path in &self.search_paths {
            let bare = search_path.join(import);
            if Path::new(import).extension().is_some() && self.fs.exists(&bare).await? {
                return Ok(bare);
            }
            for ext in &extensions {
                let path = search_path.join(format!("{import}.{ext}"));
                if self.fs.exists(&path).await? {
                    return Ok(path);
                }
            }
        }

        Err(LinkMLError::import(
            import,
            format!("Import file not found in search paths: {:?}", self.search_paths),
        ))
    }

    /// Merge an imported schema into the current schema
    fn merge_schema(target: &mut SchemaDefinition, source: &SchemaDefinition) -> Result<()> {
        for (prefix, def) in &source.prefixes {
            if !target.prefixes.contains_key(prefix) {
                target.prefixes.insert(prefix.clone(), def.clone());
            }
        }

        for (name, class) in &source.classes {
            if target.classes.contains_key(name) {
                return Err(LinkMLError::import(
                    &target.name,
                    format!("Class '{name}' already defined"),
                ));
            }
            target.classes.insert(name.clone(), class.clone());
        }

        for (name, slot) in &source.slots {
            if target.slots.contains_key(name) {
                return Err(LinkMLError::import(
                    &target.name,
                    format!("Slot '{name}' already defined"),
                ));
            }
            target.slots.insert(name.clone(), slot.clone());
        }

        for (name, type_def) in &source.types {
            if target.types.contains_key(name) {
                return Err(LinkMLError::import(
                    &target.name,
                    format!("Type '{name}' already defined"),
                ));
            }
            target.types.insert(name.clone(), type_def.clone());
        }

        for (name, enum_def) in &source.enums {
            if target.enums.contains_key(name) {
                return Err(LinkMLError::import(
                    &target.name,
                    format!("Enum '{name}' already defined"),
                ));
            }
            target.enums.insert(name.clone(), enum_def.clone());
        }

        Ok(())
    }
}
