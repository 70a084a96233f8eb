use std::fmt;
use std::ops::Bound;
use std::path::{Path, PathBuf};

use rand::seq::IteratorRandom;
use serde_json::Value;
use tantivy::collector::{DocSetCollector, TopDocs};
use tantivy::query::{AllQuery, EmptyQuery, Query, RangeQuery, RegexQuery, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, OwnedValue, Schema, TantivyDocument};
use tantivy::{Index, IndexReader, ReloadPolicy, Term};
use thiserror::Error;
use tracing::debug;

/// A stored record, returned to clients exactly as it was ingested.
pub type Document = Value;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store is not initialized")]
    NotInitialized,
    #[error("opening {collection} collection at {path}")]
    Open {
        collection: CollectionKind,
        path: PathBuf,
        #[source]
        source: tantivy::TantivyError,
    },
    #[error("searching the {collection} collection")]
    Search {
        collection: CollectionKind,
        #[source]
        source: tantivy::TantivyError,
    },
    #[error("invalid query on the {collection} collection: {reason}")]
    Query {
        collection: CollectionKind,
        reason: String,
    },
    #[error("store task did not complete")]
    Task(#[from] tokio::task::JoinError),
    #[error("stored {collection} document is malformed: {reason}")]
    Malformed {
        collection: CollectionKind,
        reason: String,
    },
}

/// The three read-only record collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Movies,
    Credits,
    Actors,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 3] = [
        CollectionKind::Movies,
        CollectionKind::Credits,
        CollectionKind::Actors,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CollectionKind::Movies => "movies",
            CollectionKind::Credits => "credits",
            CollectionKind::Actors => "actors",
        }
    }

    /// Document attribute holding the numeric id the collection is keyed by.
    pub fn numeric_key(self) -> &'static str {
        match self {
            CollectionKind::Movies => "id",
            CollectionKind::Credits => "movie_id",
            CollectionKind::Actors => "actor_id",
        }
    }

    /// Document attribute holding the title or name the collection is keyed by.
    pub fn text_key(self) -> &'static str {
        match self {
            CollectionKind::Movies | CollectionKind::Credits => "title",
            CollectionKind::Actors => "name",
        }
    }

    pub fn has_release_fields(self) -> bool {
        matches!(self, CollectionKind::Movies)
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub const RELEASE_DATE_FIELD: &str = "release_date";
pub const VOTE_AVERAGE_FIELD: &str = "vote_average";
pub const DOCUMENT_FIELD: &str = "document";

#[derive(Debug, Clone)]
pub struct CollectionFields {
    pub numeric_key: Field,
    pub text_key: Field,
    pub release_date: Option<Field>,
    pub vote_average: Option<Field>,
    pub document: Field,
}

impl CollectionFields {
    pub fn new(kind: CollectionKind, schema: &Schema) -> tantivy::Result<Self> {
        let release = if kind.has_release_fields() {
            Some((
                schema.get_field(RELEASE_DATE_FIELD)?,
                schema.get_field(VOTE_AVERAGE_FIELD)?,
            ))
        } else {
            None
        };
        Ok(Self {
            numeric_key: schema.get_field(kind.numeric_key())?,
            text_key: schema.get_field(kind.text_key())?,
            release_date: release.map(|(date, _)| date),
            vote_average: release.map(|(_, rating)| rating),
            document: schema.get_field(DOCUMENT_FIELD)?,
        })
    }
}

/// Which documents of a collection are eligible.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    NumericKey(i64),
    TextKey(String),
    RatingAtLeast(f64),
    RatingBetween { low: f64, high: f64 },
    ReleaseDatePrefix(String),
}

/// How a single document is picked from the eligible set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Whatever the index returns first.
    First,
    /// A uniformly random sample of size one.
    Sample,
}

/// A complete single-document query against one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct FindOne {
    pub collection: CollectionKind,
    pub filter: Filter,
    pub selection: Selection,
}

#[derive(Clone)]
pub struct Collection {
    kind: CollectionKind,
    fields: CollectionFields,
    reader: IndexReader,
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("kind", &self.kind)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl Collection {
    pub fn new(kind: CollectionKind, index: &Index) -> tantivy::Result<Self> {
        let fields = CollectionFields::new(kind, &index.schema())?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        Ok(Self {
            kind,
            fields,
            reader,
        })
    }

    pub fn open(kind: CollectionKind, index_dir: &Path) -> Result<Self, StoreError> {
        let open_error = |source| StoreError::Open {
            collection: kind,
            path: index_dir.to_path_buf(),
            source,
        };
        let index = Index::open_in_dir(index_dir).map_err(open_error)?;
        Self::new(kind, &index).map_err(open_error)
    }

    pub fn len(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn build_query(&self, filter: &Filter) -> Result<Box<dyn Query>, StoreError> {
        let query: Box<dyn Query> = match filter {
            Filter::All => Box::new(AllQuery),
            Filter::NumericKey(id) => {
                let term = Term::from_field_i64(self.fields.numeric_key, *id);
                Box::new(TermQuery::new(term, IndexRecordOption::Basic))
            }
            Filter::TextKey(value) => {
                let term = Term::from_field_text(self.fields.text_key, value);
                Box::new(TermQuery::new(term, IndexRecordOption::Basic))
            }
            Filter::RatingAtLeast(low) => {
                let field = self.movie_field(self.fields.vote_average, VOTE_AVERAGE_FIELD)?;
                Box::new(RangeQuery::new(
                    Bound::Included(Term::from_field_f64(field, *low)),
                    Bound::Unbounded,
                ))
            }
            Filter::RatingBetween { low, high } => {
                let field = self.movie_field(self.fields.vote_average, VOTE_AVERAGE_FIELD)?;
                if low > high {
                    // Reversed bounds match nothing.
                    return Ok(Box::new(EmptyQuery));
                }
                Box::new(RangeQuery::new(
                    Bound::Included(Term::from_field_f64(field, *low)),
                    Bound::Included(Term::from_field_f64(field, *high)),
                ))
            }
            Filter::ReleaseDatePrefix(prefix) => {
                let field = self.movie_field(self.fields.release_date, RELEASE_DATE_FIELD)?;
                let pattern = format!("{}.*", escape_regex(prefix));
                let query =
                    RegexQuery::from_pattern(&pattern, field).map_err(|err| StoreError::Query {
                        collection: self.kind,
                        reason: err.to_string(),
                    })?;
                Box::new(query)
            }
        };
        Ok(query)
    }

    fn movie_field(&self, field: Option<Field>, name: &str) -> Result<Field, StoreError> {
        field.ok_or_else(|| StoreError::Query {
            collection: self.kind,
            reason: format!("collection has no `{name}` field"),
        })
    }

    /// Runs `filter` and returns one matching document, or `None` when
    /// nothing matches.
    pub fn find_one(
        &self,
        filter: &Filter,
        selection: Selection,
    ) -> Result<Option<Document>, StoreError> {
        let query = self.build_query(filter)?;
        let searcher = self.reader.searcher();
        let search_error = |source| StoreError::Search {
            collection: self.kind,
            source,
        };

        let address = match selection {
            Selection::First => searcher
                .search(&query, &TopDocs::with_limit(1))
                .map_err(search_error)?
                .into_iter()
                .next()
                .map(|(_score, addr)| addr),
            Selection::Sample => {
                let matches = searcher
                    .search(&query, &DocSetCollector)
                    .map_err(search_error)?;
                debug!(collection = %self.kind, eligible = matches.len(), "sampling one document");
                matches.into_iter().choose(&mut rand::rng())
            }
        };

        let Some(address) = address else {
            return Ok(None);
        };

        let doc = searcher
            .doc::<TantivyDocument>(address)
            .map_err(search_error)?;
        self.decode(&doc).map(Some)
    }

    fn decode(&self, doc: &TantivyDocument) -> Result<Document, StoreError> {
        let raw = doc
            .get_first(self.fields.document)
            .and_then(|value| match OwnedValue::from(value) {
                OwnedValue::Str(text) => Some(text),
                _ => None,
            })
            .ok_or_else(|| StoreError::Malformed {
                collection: self.kind,
                reason: "missing stored document".to_string(),
            })?;
        serde_json::from_str(&raw).map_err(|err| StoreError::Malformed {
            collection: self.kind,
            reason: err.to_string(),
        })
    }
}

fn escape_regex(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if "\\.+*?()|[]{}^$".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Open handles on all three collections.
#[derive(Debug, Clone)]
pub struct Catalog {
    movies: Collection,
    credits: Collection,
    actors: Collection,
}

impl Catalog {
    pub fn new(movies: Collection, credits: Collection, actors: Collection) -> Self {
        Self {
            movies,
            credits,
            actors,
        }
    }

    /// Opens the per-collection indexes below `index_dir`.
    pub fn open(index_dir: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            movies: Collection::open(
                CollectionKind::Movies,
                &index_dir.join(CollectionKind::Movies.name()),
            )?,
            credits: Collection::open(
                CollectionKind::Credits,
                &index_dir.join(CollectionKind::Credits.name()),
            )?,
            actors: Collection::open(
                CollectionKind::Actors,
                &index_dir.join(CollectionKind::Actors.name()),
            )?,
        })
    }

    pub fn collection(&self, kind: CollectionKind) -> &Collection {
        match kind {
            CollectionKind::Movies => &self.movies,
            CollectionKind::Credits => &self.credits,
            CollectionKind::Actors => &self.actors,
        }
    }

    pub fn find_one(&self, query: &FindOne) -> Result<Option<Document>, StoreError> {
        self.collection(query.collection)
            .find_one(&query.filter, query.selection)
    }
}
