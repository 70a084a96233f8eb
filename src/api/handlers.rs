use axum::Json;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::{Method, Uri};
use tracing::{debug, info, instrument};

use crate::database::InitOutcome;
use crate::query::{self, Lookup};
use crate::store::Document;
use crate::validation::{Rating, RatingRange, RecordId, ReleaseYear, TitleLike};

use super::state::AppState;
use super::types::{ApiError, Welcome};

const INVALID_MOVIE_TITLE: &str = "Movie title length invalid or contains invalid characters.";
const INVALID_ACTOR_NAME: &str = "Actor name length invalid or contains invalid characters.";
const INVALID_MOVIE_ID: &str =
    "Movie ID has to be a number. Ensure it is greater than 0 and smaller than 10000000000";
const INVALID_ACTOR_ID: &str =
    "Actor ID has to be a number. Ensure it is greater than 0 and smaller than 10000000000";
const INVALID_RATING: &str = "Movie rating has to be a integer/decimal number between 0 and 10.";
const INVALID_RATING_RANGE: &str = "Movie range has to be in the following format: 0.0-10";
const INVALID_YEAR: &str = "Movie release year has to be a number between 1800-3000";
const INVALID_DECADE: &str =
    "Please enter in any year part of a specific decade. 2010s = 2010-2019";

type LookupResult = Result<Json<Document>, ApiError>;
type PathParam = Result<Path<String>, PathRejection>;

pub async fn home() -> Json<Welcome> {
    Json(Welcome::new())
}

#[instrument(skip_all)]
pub async fn initialize_database(State(state): State<AppState>) -> Result<&'static str, ApiError> {
    match state.database.initialize().await {
        Ok(InitOutcome::Opened) => info!("document store initialized on request"),
        Ok(InitOutcome::AlreadyReady) => debug!("document store already initialized"),
        Err(err) => return Err(anyhow::Error::from(err).into()),
    }
    Ok("Initialized.")
}

/// Unmatched paths and methods are faults, like any other unhandled error.
pub async fn fallback(method: Method, uri: Uri) -> ApiError {
    anyhow::anyhow!("no route for {method} {uri}").into()
}

/// A path segment that does not percent-decode to UTF-8 is a fault.
fn segment(param: PathParam) -> Result<String, ApiError> {
    match param {
        Ok(Path(value)) => Ok(value),
        Err(rejection) => Err(anyhow::anyhow!("{}", rejection.body_text()).into()),
    }
}

async fn run_lookup(state: &AppState, lookup: Lookup) -> LookupResult {
    let message = lookup.not_found_message();
    let catalog = state
        .database
        .catalog()
        .await
        .map_err(|err| ApiError::store_fault(message, err))?;

    debug!(plan = ?lookup.plan(), "running lookup");
    match query::run(&catalog, &lookup) {
        Ok(Some(document)) => Ok(Json(document)),
        Ok(None) => Err(ApiError::not_found(message)),
        Err(err) => Err(ApiError::store_fault(message, err)),
    }
}

#[instrument(skip_all)]
pub async fn random_movie(State(state): State<AppState>) -> LookupResult {
    run_lookup(&state, Lookup::RandomMovie).await
}

#[instrument(skip(state))]
pub async fn movie_by_title(
    State(state): State<AppState>,
    title: PathParam,
) -> LookupResult {
    let title = segment(title)?;
    let title = TitleLike::parse(&title).map_err(|_| ApiError::validation(INVALID_MOVIE_TITLE))?;
    run_lookup(&state, Lookup::MovieByTitle(title)).await
}

#[instrument(skip(state))]
pub async fn movie_by_id(State(state): State<AppState>, id: PathParam) -> LookupResult {
    let id = segment(id)?;
    let id = RecordId::parse(&id).map_err(|_| ApiError::validation(INVALID_MOVIE_ID))?;
    run_lookup(&state, Lookup::MovieById(id)).await
}

#[instrument(skip(state))]
pub async fn movie_by_rating(
    State(state): State<AppState>,
    rating: PathParam,
) -> LookupResult {
    let rating = segment(rating)?;
    let rating = Rating::parse(&rating).map_err(|_| ApiError::validation(INVALID_RATING))?;
    run_lookup(&state, Lookup::MovieByMinRating(rating)).await
}

#[instrument(skip(state))]
pub async fn movie_by_rating_range(
    State(state): State<AppState>,
    range: PathParam,
) -> LookupResult {
    let range = segment(range)?;
    let range =
        RatingRange::parse(&range).map_err(|_| ApiError::validation(INVALID_RATING_RANGE))?;
    if range.is_reversed() {
        debug!(low = range.low, high = range.high, "rating range is reversed");
    }
    run_lookup(&state, Lookup::MovieByRatingRange(range)).await
}

#[instrument(skip(state))]
pub async fn movie_by_year(
    State(state): State<AppState>,
    year: PathParam,
) -> LookupResult {
    let year = segment(year)?;
    let year = ReleaseYear::parse(&year).map_err(|_| ApiError::validation(INVALID_YEAR))?;
    run_lookup(&state, Lookup::MovieByYear(year)).await
}

#[instrument(skip(state))]
pub async fn movie_by_decade(
    State(state): State<AppState>,
    year: PathParam,
) -> LookupResult {
    let year = segment(year)?;
    let decade = ReleaseYear::parse(&year)
        .map_err(|_| ApiError::validation(INVALID_DECADE))?
        .decade();
    debug!(%decade, "resolved decade");
    run_lookup(&state, Lookup::MovieByDecade(decade)).await
}

#[instrument(skip(state))]
pub async fn credits_by_title(
    State(state): State<AppState>,
    title: PathParam,
) -> LookupResult {
    let title = segment(title)?;
    let title = TitleLike::parse(&title).map_err(|_| ApiError::validation(INVALID_MOVIE_TITLE))?;
    run_lookup(&state, Lookup::CreditsByTitle(title)).await
}

#[instrument(skip(state))]
pub async fn credits_by_id(State(state): State<AppState>, id: PathParam) -> LookupResult {
    let id = segment(id)?;
    let id = RecordId::parse(&id).map_err(|_| ApiError::validation(INVALID_MOVIE_ID))?;
    run_lookup(&state, Lookup::CreditsById(id)).await
}

#[instrument(skip(state))]
pub async fn actor_by_name(
    State(state): State<AppState>,
    name: PathParam,
) -> LookupResult {
    let name = segment(name)?;
    let name = TitleLike::parse(&name).map_err(|_| ApiError::validation(INVALID_ACTOR_NAME))?;
    run_lookup(&state, Lookup::ActorByName(name)).await
}

#[instrument(skip(state))]
pub async fn actor_by_id(State(state): State<AppState>, id: PathParam) -> LookupResult {
    let id = segment(id)?;
    let id = RecordId::parse(&id).map_err(|_| ApiError::validation(INVALID_ACTOR_ID))?;
    run_lookup(&state, Lookup::ActorById(id)).await
}
