//! Document enumeration for the `build` command.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use spimi_index::DocId;

/// A document file and the id it is indexed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub doc_id: DocId,
    pub name: String,
    pub path: PathBuf,
}

/// Lists the regular files of `dir` in ascending `DocId` order.
///
/// When every file name is a distinct `u32` (e.g. `123`), that number becomes the document id.
/// Otherwise ids are assigned from 1 in ascending file name order. `limit` keeps only the
/// first documents of that order.
pub fn enumerate_documents(dir: &Path, limit: Option<usize>) -> Result<Vec<Document>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
    {
        let entry = entry.with_context(|| format!("Failed to read directory {}", dir.display()))?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry
            .file_name()
            .into_string()
            .map_err(|name| anyhow::anyhow!("Non UTF-8 file name: {}", name.to_string_lossy()))?;
        files.push((name, entry.path()));
    }
    files.sort();

    let numeric = files
        .iter()
        .map(|(name, _)| name.parse::<u32>().ok())
        .collect::<Option<Vec<_>>>()
        .filter(|ids| ids.iter().collect::<HashSet<_>>().len() == ids.len());

    let mut documents = match numeric {
        Some(ids) => files
            .into_iter()
            .zip(ids)
            .map(|((name, path), id)| Document {
                doc_id: DocId::new(id),
                name,
                path,
            })
            .collect::<Vec<_>>(),
        None => {
            let mut documents = Vec::with_capacity(files.len());
            for (i, (name, path)) in files.into_iter().enumerate() {
                let id = u32::try_from(i + 1).context("Too many documents")?;
                documents.push(Document {
                    doc_id: DocId::new(id),
                    name,
                    path,
                });
            }
            documents
        }
    };
    documents.sort_by_key(|d| d.doc_id);
    if let Some(limit) = limit {
        documents.truncate(limit);
    }
    Ok(documents)
}
