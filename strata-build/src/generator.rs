//! Code generator for embedded migration sets.

use crate::scanner::{MigrationFile, scan_directory};
use anyhow::{Context, Result, bail};
use proc_macro2::{Literal, TokenStream};
use quote::quote;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

/// Builder for configuring and running the migration embedder.
pub struct MigrationEmbedder {
    scan_paths: Vec<PathBuf>,
    output_file: PathBuf,
    crate_path: String,
    fn_name: String,
}

impl MigrationEmbedder {
    /// Create a new embedder with default settings.
    pub fn new() -> Self {
        Self {
            scan_paths: Vec::new(),
            output_file: PathBuf::from("src/generated/migrations.rs"),
            crate_path: "::strata".to_string(),
            fn_name: "migrations".to_string(),
        }
    }

    /// Add a directory holding migration files.
    ///
    /// Can be called multiple times; ids must stay unique across all of them.
    pub fn scan_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.scan_paths.push(path.into());
        self
    }

    /// Set the output file path for the generated code.
    ///
    /// Default: `src/generated/migrations.rs`
    pub fn output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = path.into();
        self
    }

    /// Path the generated code uses to reach the strata crate.
    ///
    /// Default: `::strata`
    pub fn crate_path(mut self, path: impl Into<String>) -> Self {
        self.crate_path = path.into();
        self
    }

    /// Set the name of the generated function.
    ///
    /// Default: `migrations`
    pub fn fn_name(mut self, name: impl Into<String>) -> Self {
        self.fn_name = name.into();
        self
    }

    /// Run the embedder.
    ///
    /// Scans every configured path, writes the generated function to the
    /// output file and tells cargo to rerun when a migration changes.
    pub fn run(self) -> Result<()> {
        let scan_paths = if self.scan_paths.is_empty() {
            vec![PathBuf::from("migrations/")]
        } else {
            self.scan_paths
        };

        let mut files = Vec::new();
        for path in &scan_paths {
            let found = scan_directory(path).with_context(|| format!("Failed to scan {}", path.display()))?;
            println!("cargo:rerun-if-changed={}", path.display());
            files.extend(found);
        }

        let mut seen = HashSet::new();
        for file in &files {
            if !seen.insert(file.id.as_str()) {
                bail!("Duplicate migration id '{}' ({})", file.id, file.path.display());
            }
            println!("cargo:rerun-if-changed={}", file.path.display());
        }

        let code = generate_code(&self.crate_path, &self.fn_name, &files)?;

        if let Some(parent) = self.output_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        // Unchanged output keeps the dependent crate from recompiling.
        let should_write = match fs::read_to_string(&self.output_file) {
            Ok(existing) => existing != code,
            Err(_) => true,
        };

        if should_write {
            fs::write(&self.output_file, &code)
                .with_context(|| format!("Failed to write {}", self.output_file.display()))?;
            eprintln!(
                "strata-build: Generated {} with {} migrations",
                self.output_file.display(),
                files.len()
            );
        }

        Ok(())
    }
}

impl Default for MigrationEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate the embedding function.
fn generate_code(crate_path: &str, fn_name: &str, files: &[MigrationFile]) -> Result<String> {
    let krate: syn::Path =
        syn::parse_str(crate_path).with_context(|| format!("Invalid crate path '{crate_path}'"))?;
    let fn_ident: syn::Ident =
        syn::parse_str(fn_name).with_context(|| format!("Invalid function name '{fn_name}'"))?;

    let sources: Vec<TokenStream> = files
        .iter()
        .map(|file| {
            let id = &file.id;
            let path = file.path.to_string_lossy().into_owned();
            quote! { (#id, include_str!(#path)) }
        })
        .collect();
    let count = Literal::usize_unsuffixed(files.len());

    let output = quote! {
        //! Auto-generated migration set. Do not edit manually.
        //!
        //! Regenerate with: `cargo build`
        //!
        //! Generated by strata-build.

        /// Number of embedded migration units.
        pub const MIGRATION_COUNT: usize = #count;

        /// Every embedded migration, parsed and checksummed.
        pub fn #fn_ident() -> Result<#krate::MigrationSet, #krate::errors::MigrationError> {
            #krate::MigrationSet::from_sources([#(#sources),*])
        }
    };

    let syntax_tree = syn::parse2(output).context("Failed to parse generated code")?;
    Ok(prettyplease::unparse(&syntax_tree))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file(id: &str) -> MigrationFile {
        MigrationFile {
            id: id.to_string(),
            path: PathBuf::from(format!("/project/migrations/{id}.json")),
        }
    }

    #[test]
    fn test_generate_code() {
        let code = generate_code(
            "::strata",
            "migrations",
            &[file("1747732722_updated_playlists"), file("1749660000_updated_listenings")],
        )
        .unwrap();

        assert!(code.contains("pub fn migrations()"));
        assert!(code.contains("pub const MIGRATION_COUNT: usize = 2"));
        assert!(code.contains("::strata::MigrationSet::from_sources"));
        assert!(code.contains("include_str!(\"/project/migrations/1747732722_updated_playlists.json\")"));
        let first = code.find("1747732722_updated_playlists").unwrap();
        let second = code.find("1749660000_updated_listenings").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_generate_code_custom_paths() {
        let code = generate_code("crate::vendor::strata", "schema_migrations", &[]).unwrap();
        assert!(code.contains("pub fn schema_migrations()"));
        assert!(code.contains("crate::vendor::strata::errors::MigrationError"));
    }

    #[test]
    fn test_generate_code_rejects_bad_names() {
        assert!(generate_code("::strata", "not a name", &[]).is_err());
        assert!(generate_code("::strata::", "migrations", &[]).is_err());
    }

    #[test]
    fn test_run_writes_only_on_change() {
        let dir = TempDir::new().unwrap();
        let migrations = dir.path().join("migrations");
        fs::create_dir(&migrations).unwrap();
        fs::write(migrations.join("1747732722_updated_playlists.json"), r#"{"up":[],"down":[]}"#).unwrap();
        let output = dir.path().join("generated/migrations.rs");

        MigrationEmbedder::new()
            .scan_path(&migrations)
            .output_file(&output)
            .run()
            .unwrap();
        let first = fs::metadata(&output).unwrap().modified().unwrap();
        let code = fs::read_to_string(&output).unwrap();
        assert!(code.contains("1747732722_updated_playlists"));

        MigrationEmbedder::new()
            .scan_path(&migrations)
            .output_file(&output)
            .run()
            .unwrap();
        assert_eq!(fs::metadata(&output).unwrap().modified().unwrap(), first);
    }

    #[test]
    fn test_run_rejects_duplicate_ids() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("1_init.json"), "{}").unwrap();
        fs::write(dir.path().join("_1_init.json"), "{}").unwrap();

        let result = MigrationEmbedder::new()
            .scan_path(dir.path())
            .output_file(dir.path().join("out.rs"))
            .run();
        assert!(result.is_err());
    }
}
