//! Partition scanned files into candidate books.
//!
//! Files are compared by signature against the representative of the cluster
//! being built. Only an exact score of 100 joins a file to the cluster;
//! everything else is deferred to a later pass that seeds its own cluster.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::models::{BookCluster, RawFile};
use crate::normalize::parent_folder;
use crate::similarity;

/// Signature similarity of two files. Files without a signature never match.
pub fn signature_score(left: &RawFile, right: &RawFile) -> u8 {
    match (left.signature(), right.signature()) {
        (Some(a), Some(b)) => similarity::score(a, b),
        _ => 0,
    }
}

/// Whether `file` sits more than one folder below `source_root`, as in
/// `<root>/<book>/<disc>/<file>`. Paths outside the root never are.
pub fn is_collection(file: &Path, source_root: &Path) -> bool {
    file.strip_prefix(source_root)
        .map(|rel| rel.components().count() > 2)
        .unwrap_or(false)
}

#[derive(Debug, Clone, Default)]
pub struct FileGrouper;

impl FileGrouper {
    pub fn new() -> Self {
        Self
    }

    /// Split `files` into clusters, in order of first appearance.
    ///
    /// Each pass seeds a cluster with the first pending file and compares it
    /// against every other pending file, the last one included. Each pass
    /// removes at least its seed, so the loop always terminates.
    pub fn group(&self, files: Vec<RawFile>) -> Vec<BookCluster> {
        let mut clusters = Vec::new();
        let mut pending = files;
        let mut pass = 0usize;

        while !pending.is_empty() {
            pass += 1;

            let mut rest = pending.into_iter();
            let Some(seed) = rest.next() else {
                break;
            };
            let mut cluster = BookCluster::new(seed);
            let mut deferred = Vec::new();

            for file in rest {
                if signature_score(cluster.representative(), &file) == 100 {
                    cluster.push(file);
                } else {
                    deferred.push(file);
                }
            }

            debug!(
                pass,
                cluster = %cluster.name,
                matched = cluster.len(),
                deferred = deferred.len(),
                "grouping pass"
            );
            clusters.push(cluster);
            pending = deferred;
        }

        clusters
    }

    /// Regroup a folder's files. Returns the clusters and whether the folder
    /// held more than one book.
    pub fn split_collection(&self, cluster: BookCluster) -> (Vec<BookCluster>, bool) {
        if cluster.is_singleton() {
            return (vec![cluster], false);
        }

        let clusters = self.group(cluster.into_files());
        let multiple = clusters.len() > 1;
        (clusters, multiple)
    }

    /// Cluster a whole scan.
    ///
    /// Files are first bucketed by their top-level book folder. Folders with
    /// nested (collection-shaped) paths are split with [`Self::group`]; every
    /// other folder is taken as one book.
    pub fn group_folders(&self, files: Vec<RawFile>, source_root: &Path) -> Vec<BookCluster> {
        let mut order: Vec<PathBuf> = Vec::new();
        let mut folders: HashMap<PathBuf, Vec<RawFile>> = HashMap::new();

        for file in files {
            let key = book_folder(file.path(), source_root);
            if !folders.contains_key(&key) {
                order.push(key.clone());
            }
            folders.entry(key).or_default().push(file);
        }

        let mut clusters = Vec::new();
        for key in order {
            let Some(folder_files) = folders.remove(&key) else {
                continue;
            };

            let collection = folder_files
                .iter()
                .any(|f| is_collection(f.path(), source_root));

            if collection {
                clusters.extend(self.group(folder_files));
                continue;
            }

            let mut iter = folder_files.into_iter();
            let Some(seed) = iter.next() else {
                continue;
            };
            let name = parent_folder(seed.path(), source_root);
            let mut cluster = BookCluster::named(name, seed);
            for file in iter {
                cluster.push(file);
            }
            clusters.push(cluster);
        }

        clusters
    }
}

/// First path component below `source_root`, or the file itself when it is
/// not under the root.
fn book_folder(file: &Path, source_root: &Path) -> PathBuf {
    file.strip_prefix(source_root)
        .ok()
        .and_then(|rel| rel.components().next())
        .map(|first| source_root.join(first))
        .unwrap_or_else(|| file.to_path_buf())
}
