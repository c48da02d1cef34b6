use serde::Serialize;

use crate::models::RawFile;

/// Files believed to belong to one logical book.
///
/// Always holds at least one file; the first one is the representative every
/// other member was compared against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookCluster {
    pub name: String,
    files: Vec<RawFile>,
}

impl BookCluster {
    /// Start a cluster from its seed file, named after the seed's title.
    pub fn new(seed: RawFile) -> Self {
        let name = seed.display_title();
        Self::named(name, seed)
    }

    pub fn named(name: impl Into<String>, seed: RawFile) -> Self {
        Self {
            name: name.into(),
            files: vec![seed],
        }
    }

    pub fn representative(&self) -> &RawFile {
        &self.files[0]
    }

    pub fn push(&mut self, file: RawFile) {
        self.files.push(file);
    }

    pub fn files(&self) -> &[RawFile] {
        &self.files
    }

    pub fn into_files(self) -> Vec<RawFile> {
        self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_singleton(&self) -> bool {
        self.files.len() == 1
    }
}
