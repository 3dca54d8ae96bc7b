//! Tantivy-based search index over unit names.
//!
//! Backs the scoreboard search box: a unit matches when the query occurs anywhere in its name,
//! ignoring case. Names are indexed as character n-grams to find candidates, and candidates are
//! confirmed against the stored lowercase name.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tantivy::collector::DocSetCollector;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{
    Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, Value, STORED, STRING,
};
use tantivy::tokenizer::{LowerCaser, NgramTokenizer, TextAnalyzer};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::Unit;

/// Tokenizer registered for the `name` field.
const NAME_TOKENIZER: &str = "name_ngram";
/// Longest indexed gram. Queries are matched on grams of this length (or shorter, if the
/// query itself is shorter).
const MAX_GRAM: usize = 3;

/// Search index schema fields.
struct SearchFields {
    unit_id: Field,
    name: Field,
    name_lower: Field,
}

/// Tantivy search index for units.
pub struct SearchIndex {
    reader: IndexReader,
    writer: Arc<RwLock<IndexWriter>>,
    fields: SearchFields,
}

impl SearchIndex {
    /// Create or open a search index at the specified path.
    ///
    /// An index written with a different schema is discarded; it is rebuilt from the store at
    /// start-up anyway.
    pub fn open(index_path: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(index_path)
            .map_err(|e| AppError::Search(format!("Failed to create index directory: {}", e)))?;

        let index = match Index::open_in_dir(index_path) {
            Ok(index) if index.schema().get_field("name_lower").is_ok() => index,
            _ => {
                std::fs::remove_dir_all(index_path)
                    .and_then(|_| std::fs::create_dir_all(index_path))
                    .map_err(|e| AppError::Search(format!("Failed to reset index directory: {}", e)))?;
                Index::create_in_dir(index_path, Self::schema())
                    .map_err(|e| AppError::Search(format!("Failed to create index: {}", e)))?
            }
        };

        Self::from_index(index)
    }

    /// Index held in RAM; nothing survives a restart.
    pub fn in_memory() -> Result<Self, AppError> {
        Self::from_index(Index::create_in_ram(Self::schema()))
    }

    fn schema() -> Schema {
        let name_options = TextOptions::default().set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(NAME_TOKENIZER)
                .set_index_option(IndexRecordOption::Basic),
        );

        let mut schema_builder = Schema::builder();
        schema_builder.add_text_field("unit_id", STRING | STORED);
        schema_builder.add_text_field("name", name_options);
        schema_builder.add_text_field("name_lower", STORED);
        schema_builder.build()
    }

    fn from_index(index: Index) -> Result<Self, AppError> {
        let analyzer = TextAnalyzer::builder(NgramTokenizer::new(1, MAX_GRAM, false)?)
            .filter(LowerCaser)
            .build();
        index.tokenizers().register(NAME_TOKENIZER, analyzer);

        let schema = index.schema();
        let fields = SearchFields {
            unit_id: schema.get_field("unit_id")?,
            name: schema.get_field("name")?,
            name_lower: schema.get_field("name_lower")?,
        };

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e| AppError::Search(format!("Failed to create reader: {}", e)))?;

        let writer = index
            .writer(50_000_000) // 50MB buffer
            .map_err(|e| AppError::Search(format!("Failed to create writer: {}", e)))?;

        Ok(Self {
            reader,
            writer: Arc::new(RwLock::new(writer)),
            fields,
        })
    }

    /// Rebuild the entire index from units.
    pub async fn rebuild(&self, units: &[Unit]) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_all_documents()?;
        for unit in units {
            writer.add_document(self.create_document(unit))?;
        }
        writer.commit()?;

        self.reader.reload()?;

        tracing::info!("Search index rebuilt with {} units", units.len());
        Ok(())
    }

    /// Index a single unit, replacing any earlier entry for it.
    pub async fn index_unit(&self, unit: &Unit) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_term(Term::from_field_text(self.fields.unit_id, &unit.id));
        writer.add_document(self.create_document(unit))?;
        writer.commit()?;

        self.reader.reload()?;
        Ok(())
    }

    /// Remove a unit from the index.
    pub async fn remove_unit(&self, unit_id: &str) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_term(Term::from_field_text(self.fields.unit_id, unit_id));
        writer.commit()?;

        self.reader.reload()?;
        Ok(())
    }

    /// Ids of units whose name contains the query, ignoring case.
    pub fn search(&self, query_str: &str, limit: usize) -> Result<Vec<String>, AppError> {
        let needle = query_str.trim().to_lowercase();
        let chars: Vec<char> = needle.chars().collect();
        if chars.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        // Every gram of the query must occur in a matching name.
        let gram_len = chars.len().min(MAX_GRAM);
        let grams: BTreeSet<String> = chars
            .windows(gram_len)
            .map(|w| w.iter().collect())
            .collect();
        let subqueries: Vec<(Occur, Box<dyn Query>)> = grams
            .iter()
            .map(|gram| {
                let term = Term::from_field_text(self.fields.name, gram);
                let query: Box<dyn Query> = Box::new(TermQuery::new(term, IndexRecordOption::Basic));
                (Occur::Must, query)
            })
            .collect();
        let query = BooleanQuery::new(subqueries);

        let searcher = self.reader.searcher();
        let candidates = searcher
            .search(&query, &DocSetCollector)
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        let mut ids = Vec::new();
        for doc_address in candidates {
            let doc: TantivyDocument = searcher.doc(doc_address)?;
            let name = doc
                .get_first(self.fields.name_lower)
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            if !name.contains(&needle) {
                continue;
            }
            if let Some(id) = doc.get_first(self.fields.unit_id).and_then(|v| v.as_str()) {
                ids.push(id.to_string());
            }
        }

        ids.sort();
        ids.truncate(limit);
        Ok(ids)
    }

    fn create_document(&self, unit: &Unit) -> TantivyDocument {
        doc!(
            self.fields.unit_id => unit.id.clone(),
            self.fields.name => unit.name.clone(),
            self.fields.name_lower => unit.name.to_lowercase()
        )
    }
}
