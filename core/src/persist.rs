use crate::error::{Error, Result};
use crate::index::{DocMeta, Field, FieldIndex, InvertedIndex};
use crate::tokenizer::Analyzer;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, create_dir_all, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const INDEX_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub analyzer: Analyzer,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
    fn postings_dir(&self) -> PathBuf { self.root.join("postings") }
    fn postings(&self, field: Field) -> PathBuf {
        self.postings_dir().join(format!("{}.postings.bin", field.name()))
    }

    /// Remove any previous index at `root` and create an empty directory.
    /// A non-empty directory without `meta.json` is left untouched.
    pub fn recreate(&self) -> Result<()> {
        if self.root.exists() {
            let is_index = self.meta().is_file();
            let is_empty = fs::read_dir(&self.root)?.next().is_none();
            if !is_index && !is_empty {
                return Err(Error::Config(format!(
                    "refusing to replace {}: not an index directory",
                    self.root.display()
                )));
            }
            fs::remove_dir_all(&self.root)?;
        }
        create_dir_all(self.postings_dir())?;
        Ok(())
    }
}

fn write_bin<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut f = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut f, value)?;
    f.flush()?;
    Ok(())
}

fn read_bin<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let f = File::open(path).map_err(|e| Error::malformed(format!("{}: {e}", path.display())))?;
    bincode::deserialize_from(BufReader::new(f))
        .map_err(|e| Error::malformed(format!("{}: {e}", path.display())))
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())
        .map_err(|e| Error::malformed(format!("{}: {e}", paths.meta().display())))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)
        .map_err(|e| Error::malformed(format!("meta.json: {e}")))?;
    if meta.version != INDEX_VERSION {
        return Err(Error::malformed(format!(
            "unsupported index version {} (expected {INDEX_VERSION})",
            meta.version
        )));
    }
    Ok(meta)
}

/// Write a complete index into a freshly recreated directory.
pub fn save_index(paths: &IndexPaths, index: &InvertedIndex) -> Result<()> {
    paths.recreate()?;
    write_bin(&paths.docs(), &index.docs)?;
    for field in Field::ALL {
        write_bin(&paths.postings(field), index.field(field))?;
    }
    // meta goes last so a half-written directory never looks complete
    let meta = MetaFile {
        num_docs: index.num_docs,
        analyzer: index.analyzer,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        version: INDEX_VERSION,
    };
    save_meta(paths, &meta)?;
    tracing::info!(root = %paths.root.display(), num_docs = index.num_docs, "index written");
    Ok(())
}

/// Reopen an index for reading and check that its parts agree.
pub fn load_index(paths: &IndexPaths) -> Result<InvertedIndex> {
    let meta = load_meta(paths)?;
    let docs: Vec<DocMeta> = read_bin(&paths.docs())?;
    if docs.len() != meta.num_docs as usize {
        return Err(Error::malformed(format!(
            "docs table has {} entries, meta says {}",
            docs.len(),
            meta.num_docs
        )));
    }

    let mut index = InvertedIndex::new(meta.analyzer);
    index.docs = docs;
    index.num_docs = meta.num_docs;
    for field in Field::ALL {
        let field_index: FieldIndex = read_bin(&paths.postings(field))?;
        check_field(field, &field_index, meta.num_docs)?;
        *index.field_mut(field) = field_index;
    }
    tracing::debug!(root = %paths.root.display(), num_docs = index.num_docs, "index opened");
    Ok(index)
}

/// Statistics and postings of one field must agree with the document table.
fn check_field(field: Field, index: &FieldIndex, num_docs: u32) -> Result<()> {
    if index.doc_lengths.len() != num_docs as usize {
        return Err(Error::malformed(format!("{field} lengths do not match document count")));
    }
    let total: u64 = index.doc_lengths.iter().map(|&l| l as u64).sum();
    if total != index.total_tokens {
        return Err(Error::malformed(format!("{field} token total {} does not match lengths {total}", index.total_tokens)));
    }
    for (term, postings) in &index.postings {
        let mut prev = None;
        for p in postings {
            if p.doc_id >= num_docs || prev.is_some_and(|d| p.doc_id <= d) {
                return Err(Error::malformed(format!("{field}:{term} has bad doc id {}", p.doc_id)));
            }
            if p.term_freq as usize != p.positions.len() || p.positions.windows(2).any(|w| w[0] >= w[1]) {
                return Err(Error::malformed(format!("{field}:{term} has bad positions in doc {}", p.doc_id)));
            }
            prev = Some(p.doc_id);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::index::{Document, Posting};
    use tempfile::tempdir;

    fn sample() -> InvertedIndex {
        let docs = vec![
            Document { id: "1".into(), title: "airplane wing design".into(), ..Document::default() },
            Document { id: "2".into(), title: "ocean currents".into(), body: "tidal ocean flow".into(), ..Document::default() },
        ];
        build(&docs, Analyzer::English).unwrap()
    }

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path().join("idx"));
        let index = sample();
        save_index(&paths, &index).unwrap();
        let loaded = load_index(&paths).unwrap();
        assert_eq!(loaded, index);
    }

    #[test]
    fn recreate_replaces_previous_index() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path().join("idx"));
        save_index(&paths, &sample()).unwrap();
        fs::write(paths.root.join("stale.txt"), "old").unwrap();
        save_index(&paths, &sample()).unwrap();
        assert!(!paths.root.join("stale.txt").exists());
    }

    #[test]
    fn refuses_foreign_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "keep me").unwrap();
        let paths = IndexPaths::new(dir.path());
        assert!(matches!(paths.recreate(), Err(Error::Config(_))));
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn missing_parts_are_malformed() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path().join("idx"));
        save_index(&paths, &sample()).unwrap();
        fs::remove_file(paths.postings(Field::Body)).unwrap();
        assert!(matches!(load_index(&paths), Err(Error::MalformedIndex(_))));

        let empty = tempdir().unwrap();
        assert!(matches!(load_index(&IndexPaths::new(empty.path())), Err(Error::MalformedIndex(_))));
    }

    #[test]
    fn inconsistent_postings_are_malformed() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path().join("idx"));
        let index = sample();
        save_index(&paths, &index).unwrap();

        let corrupt = |edit: &dyn Fn(&mut FieldIndex)| {
            let mut title = index.field(Field::Title).clone();
            edit(&mut title);
            write_bin(&paths.postings(Field::Title), &title).unwrap();
            matches!(load_index(&paths), Err(Error::MalformedIndex(_)))
        };
        let first_list = |f: &mut FieldIndex| -> Vec<Posting> { f.postings.values().next().unwrap().clone() };

        assert!(corrupt(&|f: &mut FieldIndex| {
            f.postings.insert("ghost".into(), vec![Posting { doc_id: 7, term_freq: 1, positions: vec![0] }]);
        }));
        assert!(corrupt(&|f: &mut FieldIndex| {
            let mut list = first_list(f);
            list.push(list[0].clone());
            f.postings.insert("dup".into(), list);
        }));
        assert!(corrupt(&|f: &mut FieldIndex| {
            let mut list = first_list(f);
            list[0].term_freq += 1;
            f.postings.insert("freq".into(), list);
        }));
        assert!(corrupt(&|f: &mut FieldIndex| f.total_tokens += 1));
        assert!(!corrupt(&|_: &mut FieldIndex| {}));
    }

    #[test]
    fn version_mismatch_is_malformed() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        save_index(&paths, &sample()).unwrap();
        let meta = MetaFile { num_docs: 2, analyzer: Analyzer::English, created_at: String::new(), version: 99 };
        save_meta(&paths, &meta).unwrap();
        assert!(matches!(load_index(&paths), Err(Error::MalformedIndex(_))));
    }
}
