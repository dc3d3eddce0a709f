#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tessera_codegen::CodegenConfig;

pub const WIDGETS: &str = r#"
name: Widgets
kind: table
version: 1
description: Things on the shelf
model:
  keys:
    primary:
      partition: widgetId
    secondary:
      - name: status-index
        partition: status
        sort: createdAt
  attributes:
    - name: widgetId
      type: string
      required: true
    - name: status
      type: string
    - name: createdAt
      type: timestamp
    - name: label
      type: string
"#;

pub const CUSTOMERS: &str = r#"
name: Customers
kind: table
version: 1
model:
  keys:
    primary:
      partition: customerId
  attributes:
    - name: customerId
      type: string
      required: true
    - name: billing
      type: Address
    - name: status
      enumType: UserStatus
"#;

pub const WAREHOUSES: &str = r#"
name: Warehouses
kind: table
version: 1
model:
  keys:
    primary:
      partition: warehouseId
  attributes:
    - name: warehouseId
      type: string
      required: true
    - name: location
      type: Address
"#;

pub const ADDRESS: &str = r#"
name: Address
kind: static
attributes:
  - name: street
    type: string
  - name: city
    type: string
"#;

pub const ENUMS: &str = "UserStatus:\n  - ACTIVE\n  - INACTIVE\n";

/// Scratch project: a schema directory plus the default output layout
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        fs::create_dir_all(dir.path().join("schemas")).expect("failed to create schema dir");
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> CodegenConfig {
        CodegenConfig {
            source_date_epoch: Some(1_700_000_000),
            ..CodegenConfig::rooted_at(self.root())
        }
    }

    pub fn write_schema(&self, file_name: &str, source: &str) -> PathBuf {
        let path = self.root().join("schemas").join(file_name);
        fs::write(&path, source).expect("failed to write schema");
        path
    }

    pub fn remove_schema(&self, file_name: &str) {
        fs::remove_file(self.root().join("schemas").join(file_name))
            .expect("failed to remove schema");
    }

    pub fn write_enums(&self, source: &str) {
        fs::write(self.root().join("enums.yml"), source).expect("failed to write enums");
    }

    /// Every generated file, keyed by path relative to the output root
    pub fn generated(&self) -> BTreeMap<String, String> {
        let mut files = BTreeMap::new();
        let generated = self.root().join("generated");
        if !generated.is_dir() {
            return files;
        }
        for target in fs::read_dir(&generated).expect("read generated dir") {
            let target = target.expect("dir entry").path();
            for entry in fs::read_dir(&target).expect("read target dir") {
                let path = entry.expect("dir entry").path();
                let key = path
                    .strip_prefix(&generated)
                    .expect("under generated")
                    .to_string_lossy()
                    .replace('\\', "/");
                let contents = fs::read_to_string(&path).expect("read generated file");
                files.insert(key, contents);
            }
        }
        files
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.root().join("generated").join(relative))
            .unwrap_or_else(|e| panic!("failed to read {}: {}", relative, e))
    }
}
