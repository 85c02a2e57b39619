use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ProgramStoreError;
use crate::schema::Program;

/// CRUD store for saved programs, backed by one JSON document.
///
/// Records are held in memory in insertion order alongside an id index;
/// every successful mutation rewrites the backing file atomically. When
/// persistence fails the in-memory change is rolled back, so memory and
/// disk never drift apart.
#[derive(Debug)]
pub struct ProgramStore {
    path: PathBuf,
    programs: Vec<Program>,
    index_by_id: HashMap<String, usize>,
}

impl ProgramStore {
    /// Opens a store at `path`, treating a missing file as an empty store.
    pub fn open(path: &Path) -> Result<Self, ProgramStoreError> {
        let path = path.to_path_buf();

        let programs: Vec<Program> = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|source| ProgramStoreError::json_parse(&path, source))?,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => {
                return Err(ProgramStoreError::io("reading program records", &path, source))
            }
        };

        let mut index_by_id = HashMap::new();
        for (index, program) in programs.iter().enumerate() {
            if index_by_id.insert(program.id.clone(), index).is_some() {
                return Err(ProgramStoreError::DuplicateIdInFile {
                    path,
                    id: program.id.clone(),
                });
            }
        }

        Ok(Self {
            path,
            programs,
            index_by_id,
        })
    }

    /// Adds a new record. An already-present id is rejected with
    /// [`ProgramStoreError::DuplicateId`] rather than upserted, so id
    /// collisions surface as bugs instead of silent overwrites.
    pub fn add(&mut self, program: Program) -> Result<(), ProgramStoreError> {
        if self.index_by_id.contains_key(&program.id) {
            return Err(ProgramStoreError::DuplicateId { id: program.id });
        }

        let id = program.id.clone();
        self.index_by_id.insert(id.clone(), self.programs.len());
        self.programs.push(program);

        if let Err(error) = self.persist() {
            self.programs.pop();
            self.index_by_id.remove(&id);
            return Err(error);
        }

        Ok(())
    }

    /// Replaces an existing record in place, keeping its list position.
    pub fn update(&mut self, program: Program) -> Result<(), ProgramStoreError> {
        let Some(&index) = self.index_by_id.get(&program.id) else {
            return Err(ProgramStoreError::NotFound { id: program.id });
        };

        let previous = std::mem::replace(&mut self.programs[index], program);

        if let Err(error) = self.persist() {
            self.programs[index] = previous;
            return Err(error);
        }

        Ok(())
    }

    /// Removes a record by id. Removing a missing id is not an error;
    /// the return value reports whether a record was actually removed.
    pub fn remove(&mut self, id: &str) -> Result<bool, ProgramStoreError> {
        let Some(&index) = self.index_by_id.get(id) else {
            return Ok(false);
        };

        let removed = self.programs.remove(index);
        self.reindex();

        if let Err(error) = self.persist() {
            self.programs.insert(index, removed);
            self.reindex();
            return Err(error);
        }

        Ok(true)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Program> {
        self.index_by_id
            .get(id)
            .and_then(|&index| self.programs.get(index))
    }

    /// Returns all records in insertion order.
    #[must_use]
    pub fn list(&self) -> &[Program] {
        &self.programs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn reindex(&mut self) {
        self.index_by_id.clear();
        for (index, program) in self.programs.iter().enumerate() {
            self.index_by_id.insert(program.id.clone(), index);
        }
    }

    fn persist(&self) -> Result<(), ProgramStoreError> {
        let raw = serde_json::to_string_pretty(&self.programs)
            .map_err(|source| ProgramStoreError::json_serialize(&self.path, source))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| {
                    ProgramStoreError::io("creating program store directory", &self.path, source)
                })?;
            }
        }

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, raw).map_err(|source| {
            ProgramStoreError::io("writing program records", &temp_path, source)
        })?;
        fs::rename(&temp_path, &self.path).map_err(|source| {
            ProgramStoreError::io("replacing program records", &self.path, source)
        })?;

        Ok(())
    }
}
