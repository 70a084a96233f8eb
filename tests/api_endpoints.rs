use axum::Router;
use axum::body::{self, Body};
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, from_slice, json};
use tower::ServiceExt;

use movie_api::api::types::{ENDPOINTS, ErrorBody, SERVER_ERROR_BODY, Welcome};
use movie_api::api::{AppState, router};
use movie_api::database::Database;
use movie_api::indexer::build_catalog_in_ram;

type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

fn movies() -> Vec<Value> {
    vec![
        json!({
            "_id": {"$oid": "5b2f5c1a9d1e4b0a1c000001"},
            "id": 19995,
            "title": "Avatar",
            "release_date": "2009-12-10",
            "vote_average": 7.2
        }),
        json!({
            "id": 285,
            "title": "Pirates of the Caribbean: At World's End",
            "release_date": "2007-05-19",
            "vote_average": 6.9
        }),
        json!({
            "id": 206647,
            "title": "Spectre",
            "release_date": "2015-10-26",
            "vote_average": 6.3
        }),
        json!({
            "id": 49026,
            "title": "The Dark Knight Rises",
            "release_date": "2012-07-16",
            "vote_average": 7.6
        }),
        json!({
            "id": 11,
            "title": "Star Wars",
            "release_date": "1977-05-25",
            "vote_average": 8.1
        }),
    ]
}

fn credits() -> Vec<Value> {
    vec![json!({
        "movie_id": 19995,
        "title": "Avatar",
        "cast": [{"name": "Sam Worthington", "character": "Jake Sully"}],
        "crew": [{"name": "James Cameron", "job": "Director"}]
    })]
}

fn actors() -> Vec<Value> {
    vec![
        json!({"actor_id": 65731, "name": "Sam Worthington"}),
        json!({"actor_id": 8691, "name": "Zoe Saldana"}),
    ]
}

fn test_app() -> Router {
    let catalog = build_catalog_in_ram(movies(), credits(), actors()).expect("catalog builds");
    router(AppState::new(Database::from_catalog(catalog)))
}

fn empty_app() -> Router {
    let catalog = build_catalog_in_ram(vec![], vec![], vec![]).expect("catalog builds");
    router(AppState::new(Database::from_catalog(catalog)))
}

async fn get(app: &Router, uri: &str) -> TestResult<(StatusCode, Vec<u8>)> {
    send(app, Method::GET, uri).await
}

async fn send(app: &Router, method: Method, uri: &str) -> TestResult<(StatusCode, Vec<u8>)> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())?;
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, bytes.to_vec()))
}

async fn get_json(app: &Router, uri: &str) -> TestResult<Value> {
    let (status, bytes) = get(app, uri).await?;
    assert_eq!(status, StatusCode::OK, "unexpected status for {uri}");
    Ok(from_slice(&bytes)?)
}

async fn get_error(app: &Router, uri: &str) -> TestResult<String> {
    let (status, bytes) = get(app, uri).await?;
    assert_eq!(status, StatusCode::OK, "errors must not change the status");
    let body: ErrorBody = from_slice(&bytes)?;
    Ok(body.error)
}

#[tokio::test]
async fn home_lists_every_endpoint() -> TestResult<()> {
    let (status, bytes) = get(&test_app(), "/").await?;
    assert_eq!(status, StatusCode::OK);
    let welcome: Welcome = from_slice(&bytes)?;
    assert_eq!(welcome.0, "Welcome to my simple RESTful movie API.");
    assert_eq!(welcome.1.endpoints.len(), 11);
    assert!(welcome.1.endpoints.contains_key("/actors/id/id"));
    let listed: Vec<&str> = welcome.1.endpoints.keys().map(String::as_str).collect();
    let declared: Vec<&str> = ENDPOINTS.iter().map(|(path, _)| *path).collect();
    assert_eq!(listed, declared);
    Ok(())
}

#[tokio::test]
async fn random_movie_returns_one_stored_document() -> TestResult<()> {
    let app = test_app();
    let ids: Vec<i64> = movies().iter().map(|m| m["id"].as_i64().unwrap()).collect();
    for _ in 0..10 {
        let movie = get_json(&app, "/movies").await?;
        assert!(ids.contains(&movie["id"].as_i64().unwrap()));
    }
    Ok(())
}

#[tokio::test]
async fn random_movie_on_empty_store_reports_error() -> TestResult<()> {
    let error = get_error(&empty_app(), "/movies").await?;
    assert_eq!(error, "No movies found in Database.");
    Ok(())
}

#[tokio::test]
async fn movie_by_title_matches_exactly() -> TestResult<()> {
    let app = test_app();
    let movie = get_json(&app, "/movies/title/Avatar").await?;
    assert_eq!(movie["id"], 19995);
    // Extended-JSON ids are served as plain strings.
    assert_eq!(movie["_id"], "5b2f5c1a9d1e4b0a1c000001");

    let movie = get_json(&app, "/movies/title/The%20Dark%20Knight%20Rises").await?;
    assert_eq!(movie["id"], 49026);

    let error = get_error(&app, "/movies/title/avatar").await?;
    assert_eq!(error, "No movie with this title found in database.");
    Ok(())
}

#[tokio::test]
async fn movie_title_with_forbidden_characters_is_rejected() -> TestResult<()> {
    let error = get_error(&test_app(), "/movies/title/Avatar%3B").await?;
    assert_eq!(
        error,
        "Movie title length invalid or contains invalid characters."
    );
    Ok(())
}

#[tokio::test]
async fn undecodable_path_segments_are_server_errors() -> TestResult<()> {
    let app = test_app();
    for uri in ["/movies/title/%FF", "/movies/id/%C3%28", "/actors/name/%FE"] {
        let (status, bytes) = get(&app, uri).await?;
        assert_eq!(status, StatusCode::OK, "unexpected status for {uri}");
        assert_eq!(bytes, SERVER_ERROR_BODY.as_bytes());
    }
    Ok(())
}

#[tokio::test]
async fn movie_by_id_parses_leading_zeros() -> TestResult<()> {
    let app = test_app();
    let movie = get_json(&app, "/movies/id/0011").await?;
    assert_eq!(movie["title"], "Star Wars");

    let error = get_error(&app, "/movies/id/007").await?;
    assert_eq!(error, "No movie with this ID found in database.");
    Ok(())
}

#[tokio::test]
async fn invalid_movie_ids_are_rejected() -> TestResult<()> {
    let app = test_app();
    for uri in [
        "/movies/id/0",
        "/movies/id/-5",
        "/movies/id/abc",
        "/movies/id/12345678901",
    ] {
        let error = get_error(&app, uri).await?;
        assert_eq!(
            error,
            "Movie ID has to be a number. Ensure it is greater than 0 and smaller than 10000000000"
        );
    }
    Ok(())
}

#[tokio::test]
async fn movie_by_rating_respects_the_lower_bound() -> TestResult<()> {
    let app = test_app();
    for _ in 0..10 {
        let movie = get_json(&app, "/movies/rating/7.5").await?;
        assert!(movie["vote_average"].as_f64().unwrap() >= 7.5);
    }

    let error = get_error(&app, "/movies/rating/9").await?;
    assert_eq!(error, "No movies above this rating found in Database.");

    let error = get_error(&app, "/movies/rating/11").await?;
    assert_eq!(
        error,
        "Movie rating has to be a integer/decimal number between 0 and 10."
    );
    Ok(())
}

#[tokio::test]
async fn full_rating_range_always_returns_a_movie() -> TestResult<()> {
    let app = test_app();
    for _ in 0..10 {
        let movie = get_json(&app, "/movies/rating/range/0-10").await?;
        let rating = movie["vote_average"].as_f64().unwrap();
        assert!((0.0..=10.0).contains(&rating));
    }
    Ok(())
}

#[tokio::test]
async fn rating_range_bounds_are_inclusive() -> TestResult<()> {
    let movie = get_json(&test_app(), "/movies/rating/range/6.3-6.3").await?;
    assert_eq!(movie["title"], "Spectre");
    Ok(())
}

#[tokio::test]
async fn reversed_rating_range_matches_nothing() -> TestResult<()> {
    // The pair is used as given, so 8-6 describes an empty window.
    let error = get_error(&test_app(), "/movies/rating/range/8-6").await?;
    assert_eq!(error, "No movies found in the range specified.");
    Ok(())
}

#[tokio::test]
async fn malformed_rating_range_is_rejected() -> TestResult<()> {
    let app = test_app();
    for uri in ["/movies/rating/range/abc", "/movies/rating/range/5"] {
        let error = get_error(&app, uri).await?;
        assert_eq!(error, "Movie range has to be in the following format: 0.0-10");
    }
    Ok(())
}

#[tokio::test]
async fn movie_by_year_matches_release_date_prefix() -> TestResult<()> {
    let app = test_app();
    let movie = get_json(&app, "/movies/year/2015").await?;
    assert_eq!(movie["title"], "Spectre");

    let error = get_error(&app, "/movies/year/2016").await?;
    assert_eq!(error, "No movies found in the specified year.");

    let error = get_error(&app, "/movies/year/1800").await?;
    assert_eq!(
        error,
        "Movie release year has to be a number between 1800-3000"
    );
    Ok(())
}

#[tokio::test]
async fn movie_by_decade_matches_any_year_in_the_decade() -> TestResult<()> {
    let app = test_app();
    for _ in 0..10 {
        let movie = get_json(&app, "/movies/decade/2013").await?;
        let date = movie["release_date"].as_str().unwrap();
        assert!(date.starts_with("201"), "{date} is outside the 2010s");
    }

    let error = get_error(&app, "/movies/decade/1995").await?;
    assert_eq!(error, "No movies found in the specified decade.");

    let error = get_error(&app, "/movies/decade/999").await?;
    assert_eq!(
        error,
        "Please enter in any year part of a specific decade. 2010s = 2010-2019"
    );
    Ok(())
}

#[tokio::test]
async fn credits_are_found_by_title_and_movie_id() -> TestResult<()> {
    let app = test_app();
    let by_title = get_json(&app, "/credits/title/Avatar").await?;
    assert_eq!(by_title["movie_id"], 19995);
    assert_eq!(by_title["crew"][0]["job"], "Director");

    let by_id = get_json(&app, "/credits/id/19995").await?;
    assert_eq!(by_id, by_title);

    let error = get_error(&app, "/credits/id/285").await?;
    assert_eq!(error, "No credits with this ID found in database.");

    let error = get_error(&app, "/credits/title/Spectre").await?;
    assert_eq!(error, "No credits with this title found in database.");
    Ok(())
}

#[tokio::test]
async fn actors_are_found_by_name_and_id() -> TestResult<()> {
    let app = test_app();
    let actor = get_json(&app, "/actors/name/Zoe%20Saldana").await?;
    assert_eq!(actor["actor_id"], 8691);

    let actor = get_json(&app, "/actors/id/65731").await?;
    assert_eq!(actor["name"], "Sam Worthington");

    let error = get_error(&app, "/actors/name/Zoe%20Saldana%21").await?;
    assert_eq!(
        error,
        "Actor name length invalid or contains invalid characters."
    );

    let error = get_error(&app, "/actors/id/x").await?;
    assert_eq!(
        error,
        "Actor ID has to be a number. Ensure it is greater than 0 and smaller than 10000000000"
    );

    let error = get_error(&app, "/actors/id/1").await?;
    assert_eq!(error, "No actor with this ID found in database.");
    Ok(())
}

#[tokio::test]
async fn initialize_confirms_an_open_store() -> TestResult<()> {
    let (status, bytes) = get(&test_app(), "/database/initialize").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"Initialized.");
    Ok(())
}

#[tokio::test]
async fn closed_store_collapses_into_not_found() -> TestResult<()> {
    let catalog = build_catalog_in_ram(movies(), credits(), actors())?;
    let state = AppState::new(Database::from_catalog(catalog));
    let app = router(state.clone());
    state.database().close().await;

    let error = get_error(&app, "/movies/id/19995").await?;
    assert_eq!(error, "No movie with this ID found in database.");
    Ok(())
}

#[tokio::test]
async fn unknown_routes_are_server_errors() -> TestResult<()> {
    let (status, bytes) = get(&test_app(), "/series").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, SERVER_ERROR_BODY.as_bytes());
    Ok(())
}

#[tokio::test]
async fn unsupported_methods_are_server_errors() -> TestResult<()> {
    let app = test_app();
    for (method, uri) in [
        (Method::POST, "/movies"),
        (Method::POST, "/movies/id/1"),
        (Method::DELETE, "/actors/id/8691"),
    ] {
        let (status, bytes) = send(&app, method, uri).await?;
        assert_eq!(status, StatusCode::OK, "unexpected status for {uri}");
        assert_eq!(bytes, SERVER_ERROR_BODY.as_bytes());
    }
    Ok(())
}

#[tokio::test]
async fn lazily_opened_store_serves_requests_after_initialize() -> TestResult<()> {
    let index_dir =
        std::env::temp_dir().join(format!("movie-api-store-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&index_dir);
    std::fs::create_dir_all(&index_dir)?;

    let data_dir = index_dir.join("data");
    std::fs::create_dir_all(&data_dir)?;
    let dump: String = movies()
        .iter()
        .map(|movie| format!("{movie}\n"))
        .collect();
    std::fs::write(data_dir.join("movies.jsonl"), dump)?;

    let config = movie_api::config::AppConfig {
        data_dir: data_dir.clone(),
        index_dir: index_dir.join("store"),
        bind_addr: "127.0.0.1:0".parse()?,
        error_log: index_dir.join("errorlog"),
        dataset_url: None,
        eager_init: false,
    };
    let datasets = movie_api::datasets::prepare_datasets(&config).await?;
    movie_api::indexer::prepare_store(&config, &datasets).await?;

    let state = AppState::new(Database::open_lazy(&config.index_dir));
    let app = router(state.clone());
    assert!(!state.database().is_ready().await);

    let (_, bytes) = get(&app, "/database/initialize").await?;
    assert_eq!(bytes, b"Initialized.");
    assert!(state.database().is_ready().await);

    let movie = get_json(&app, "/movies/id/206647").await?;
    assert_eq!(movie["title"], "Spectre");

    let error = get_error(&app, "/actors/id/8691").await?;
    assert_eq!(error, "No actor with this ID found in database.");

    std::fs::remove_dir_all(&index_dir)?;
    Ok(())
}
