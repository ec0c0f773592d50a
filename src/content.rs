//! Pattern content on disk, and the catalog-only fallback.
//!
//! Directory layout, one subdirectory per pattern id:
//!
//! ```text
//! <root>/<id>/explanation.md   full write-up (Markdown)
//! <root>/<id>/code.txt         full code listing
//! <root>/<id>/preview.toml     hover preview (see `generate_previews`)
//! ```

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use log::{debug, info, warn};
use pulldown_cmark::{Event, Parser, Tag, TagEnd};

use crate::catalog::{self, CATALOG, PatternEntry, PatternId};
use crate::loader::{ResourceLoadError, ResourceLoader};
use crate::preview::PreviewData;

pub const DEFAULT_EXCERPT_LINES: usize = 15;

const EXPLANATION_FILE: &str = "explanation.md";
const CODE_FILE: &str = "code.txt";
const PREVIEW_FILE: &str = "preview.toml";

/// The full resource behind a sidebar entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternDocument {
    pub id: PatternId,
    pub explanation: String,
    pub code: String,
}

/// A loader that can also hand out full documents for navigation.
pub trait DocumentSource: ResourceLoader {
    fn document(&self, id: &PatternId) -> Result<Arc<PatternDocument>, ResourceLoadError>;

    /// Whether `document(id)` will be answered without touching storage.
    fn is_warm(&self, id: &PatternId) -> bool;
}

// ---------------------------------------------------------------------------
// FsLoader
// ---------------------------------------------------------------------------

pub struct FsLoader {
    root: PathBuf,
    /// Append-only: documents are never evicted.
    documents: Mutex<HashMap<PatternId, Arc<PatternDocument>>>,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            documents: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read(&self, id: &PatternId, file: &str) -> Result<String, ResourceLoadError> {
        let path = self.root.join(id.as_str()).join(file);
        debug!("fs loader: reading {}", path.display());
        fs::read_to_string(&path).map_err(|e| read_error(id, &path, e))
    }

    fn cached(&self, id: &PatternId) -> Option<Arc<PatternDocument>> {
        self.documents
            .lock()
            .ok()
            .and_then(|map| map.get(id).cloned())
    }
}

fn read_error(id: &PatternId, path: &Path, e: io::Error) -> ResourceLoadError {
    if e.kind() == io::ErrorKind::NotFound {
        ResourceLoadError::NotFound { id: id.clone() }
    } else {
        ResourceLoadError::Io {
            id: id.clone(),
            message: format!("{}: {e}", path.display()),
        }
    }
}

impl ResourceLoader for FsLoader {
    fn load_full(&self, id: &PatternId) -> Result<(), ResourceLoadError> {
        self.document(id).map(|_| ())
    }

    fn load_preview(&self, id: &PatternId) -> Result<PreviewData, ResourceLoadError> {
        let text = self.read(id, PREVIEW_FILE)?;
        let data: PreviewData = toml::from_str(&text).map_err(|e| ResourceLoadError::Decode {
            id: id.clone(),
            message: e.to_string(),
        })?;
        if &data.id != id {
            return Err(ResourceLoadError::Decode {
                id: id.clone(),
                message: format!("{PREVIEW_FILE} describes '{}'", data.id),
            });
        }
        Ok(data)
    }
}

impl DocumentSource for FsLoader {
    fn document(&self, id: &PatternId) -> Result<Arc<PatternDocument>, ResourceLoadError> {
        if let Some(doc) = self.cached(id) {
            return Ok(doc);
        }
        let doc = Arc::new(PatternDocument {
            id: id.clone(),
            explanation: self.read(id, EXPLANATION_FILE)?,
            code: self.read(id, CODE_FILE)?,
        });
        let mut map = self
            .documents
            .lock()
            .map_err(|_| ResourceLoadError::Io {
                id: id.clone(),
                message: "document cache poisoned".into(),
            })?;
        // Another thread may have won the race; keep the first copy.
        let doc = map.entry(id.clone()).or_insert(doc).clone();
        Ok(doc)
    }

    fn is_warm(&self, id: &PatternId) -> bool {
        self.cached(id).is_some()
    }
}

// ---------------------------------------------------------------------------
// CatalogLoader: no content directory
// ---------------------------------------------------------------------------

/// Serves previews and documents built from the static catalog alone.
#[derive(Debug, Default)]
pub struct CatalogLoader;

impl CatalogLoader {
    fn entry(id: &PatternId) -> Result<&'static PatternEntry, ResourceLoadError> {
        catalog::by_id(id.as_str()).ok_or_else(|| ResourceLoadError::UnknownPattern { id: id.clone() })
    }
}

impl ResourceLoader for CatalogLoader {
    fn load_full(&self, id: &PatternId) -> Result<(), ResourceLoadError> {
        Self::entry(id).map(|_| ())
    }

    fn load_preview(&self, id: &PatternId) -> Result<PreviewData, ResourceLoadError> {
        let e = Self::entry(id)?;
        Ok(PreviewData {
            id: id.clone(),
            name: e.name.to_string(),
            category: e.category,
            description: e.intent.to_string(),
            code_preview: String::new(),
        })
    }
}

impl DocumentSource for CatalogLoader {
    fn document(&self, id: &PatternId) -> Result<Arc<PatternDocument>, ResourceLoadError> {
        let e = Self::entry(id)?;
        Ok(Arc::new(PatternDocument {
            id: id.clone(),
            explanation: format!("# {}\n\n{}\n", e.name, e.intent),
            code: String::new(),
        }))
    }

    fn is_warm(&self, _id: &PatternId) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Preview generation
// ---------------------------------------------------------------------------

/// First `max_lines` lines of `code`.
pub fn excerpt(code: &str, max_lines: usize) -> String {
    code.lines().take(max_lines).collect::<Vec<_>>().join("\n")
}

/// Plain text of the first paragraph of a Markdown document.
pub fn first_paragraph(markdown: &str) -> Option<String> {
    let mut text = String::new();
    let mut inside = false;
    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Paragraph) => inside = true,
            Event::End(TagEnd::Paragraph) if inside => break,
            Event::Text(t) | Event::Code(t) if inside => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak if inside => text.push(' '),
            _ => {}
        }
    }
    let text = text.trim();
    if text.is_empty() { None } else { Some(text.to_string()) }
}

pub fn build_preview(
    entry: &PatternEntry,
    explanation: &str,
    code: &str,
    max_lines: usize,
) -> PreviewData {
    PreviewData {
        id: entry.pattern_id(),
        name: entry.name.to_string(),
        category: entry.category,
        description: first_paragraph(explanation).unwrap_or_else(|| entry.intent.to_string()),
        code_preview: excerpt(code, max_lines),
    }
}

#[derive(Debug, Default)]
pub struct GenerateReport {
    pub written: Vec<PatternId>,
    pub skipped: Vec<(PatternId, String)>,
}

/// Write `preview.toml` for every catalog pattern that has content under
/// `root`. Patterns without `code.txt` are skipped and reported.
pub fn generate_previews(root: &Path, max_lines: usize) -> anyhow::Result<GenerateReport> {
    let mut report = GenerateReport::default();
    for entry in &CATALOG {
        let id = entry.pattern_id();
        let dir = root.join(entry.id);
        let code = match fs::read_to_string(dir.join(CODE_FILE)) {
            Ok(c) => c,
            Err(e) => {
                warn!("previews: skipping {id}: {e}");
                report.skipped.push((id, format!("{CODE_FILE}: {e}")));
                continue;
            }
        };
        let explanation = match fs::read_to_string(dir.join(EXPLANATION_FILE)) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", dir.join(EXPLANATION_FILE).display()));
            }
        };
        let preview = build_preview(entry, &explanation, &code, max_lines);
        let text = toml::to_string(&preview)
            .with_context(|| format!("failed to encode preview for {id}"))?;
        let path = dir.join(PREVIEW_FILE);
        fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;
        info!("previews: wrote {}", path.display());
        report.written.push(id);
    }
    Ok(report)
}
