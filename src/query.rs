//! Maps each validated request onto a single-document store query.

use crate::store::{Catalog, CollectionKind, Document, Filter, FindOne, Selection, StoreError};
use crate::validation::{Decade, Rating, RatingRange, RecordId, ReleaseYear, TitleLike};

/// Every resource/filter combination the API serves.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    RandomMovie,
    MovieByTitle(TitleLike),
    MovieById(RecordId),
    MovieByMinRating(Rating),
    MovieByRatingRange(RatingRange),
    MovieByYear(ReleaseYear),
    MovieByDecade(Decade),
    CreditsByTitle(TitleLike),
    CreditsById(RecordId),
    ActorByName(TitleLike),
    ActorById(RecordId),
}

impl Lookup {
    pub fn plan(&self) -> FindOne {
        let (collection, filter, selection) = match self {
            Lookup::RandomMovie => (CollectionKind::Movies, Filter::All, Selection::Sample),
            Lookup::MovieByTitle(title) => (
                CollectionKind::Movies,
                Filter::TextKey(title.as_ref().to_string()),
                Selection::First,
            ),
            Lookup::MovieById(id) => (
                CollectionKind::Movies,
                Filter::NumericKey(id.get()),
                Selection::First,
            ),
            Lookup::MovieByMinRating(rating) => (
                CollectionKind::Movies,
                Filter::RatingAtLeast(rating.get()),
                Selection::Sample,
            ),
            Lookup::MovieByRatingRange(range) => (
                CollectionKind::Movies,
                Filter::RatingBetween {
                    low: range.low,
                    high: range.high,
                },
                Selection::Sample,
            ),
            Lookup::MovieByYear(year) => (
                CollectionKind::Movies,
                Filter::ReleaseDatePrefix(year.prefix()),
                Selection::Sample,
            ),
            Lookup::MovieByDecade(decade) => (
                CollectionKind::Movies,
                Filter::ReleaseDatePrefix(decade.prefix()),
                Selection::Sample,
            ),
            Lookup::CreditsByTitle(title) => (
                CollectionKind::Credits,
                Filter::TextKey(title.as_ref().to_string()),
                Selection::First,
            ),
            Lookup::CreditsById(id) => (
                CollectionKind::Credits,
                Filter::NumericKey(id.get()),
                Selection::First,
            ),
            Lookup::ActorByName(name) => (
                CollectionKind::Actors,
                Filter::TextKey(name.as_ref().to_string()),
                Selection::First,
            ),
            Lookup::ActorById(id) => (
                CollectionKind::Actors,
                Filter::NumericKey(id.get()),
                Selection::First,
            ),
        };
        FindOne {
            collection,
            filter,
            selection,
        }
    }

    /// Message returned when nothing matches or the store fails.
    pub fn not_found_message(&self) -> &'static str {
        match self {
            Lookup::RandomMovie => "No movies found in Database.",
            Lookup::MovieByTitle(_) => "No movie with this title found in database.",
            Lookup::MovieById(_) => "No movie with this ID found in database.",
            Lookup::MovieByMinRating(_) => "No movies above this rating found in Database.",
            Lookup::MovieByRatingRange(_) => "No movies found in the range specified.",
            Lookup::MovieByYear(_) => "No movies found in the specified year.",
            Lookup::MovieByDecade(_) => "No movies found in the specified decade.",
            Lookup::CreditsByTitle(_) => "No credits with this title found in database.",
            Lookup::CreditsById(_) => "No credits with this ID found in database.",
            Lookup::ActorByName(_) => "No actor with this name found in database.",
            Lookup::ActorById(_) => "No actor with this ID found in database.",
        }
    }
}

/// Runs a lookup; `Ok(None)` means no document matched.
pub fn run(catalog: &Catalog, lookup: &Lookup) -> Result<Option<Document>, StoreError> {
    catalog.find_one(&lookup.plan())
}
