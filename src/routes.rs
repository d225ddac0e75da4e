use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, Uri, header},
    routing::get,
};
use tracing::{debug, info};

use crate::{
    AppState,
    entities::movie,
    error::AppResult,
    extract::{JsonBody, PathParam, QueryParams},
    models::{CreateMovieRequest, ListQuery, Message, MovieFields, MovieList, SessionList},
    pagination::PageLinks,
    sessions,
    store::ListFilter,
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/movies", get(list_movies).post(create_movie))
        .route("/movies/{id}", get(get_movie).put(update_movie).delete(delete_movie))
        .route("/movies/{id}/sessions", get(movie_sessions))
        .with_state(state)
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreateMovieRequest>,
) -> AppResult<(StatusCode, Json<movie::Model>)> {
    let input = req.fields.validate()?;
    let sessions = sessions::generate(
        req.id,
        input.schedules.as_slice(),
        input.start_date,
        input.end_date,
    )?;

    let movie = state.store.create(req.id, &input, &sessions).await?;
    info!(movie_id = movie.id, sessions = sessions.len(), "created movie");

    Ok((StatusCode::CREATED, Json(movie)))
}

pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: Uri,
    QueryParams(q): QueryParams<ListQuery>,
) -> AppResult<Json<MovieList>> {
    let title = q.title.filter(|s| !s.is_empty());
    let start_date = q.start_date.filter(|s| !s.is_empty());
    let page = q.page.unwrap_or(0);
    let limit = state.config.page_limit(q.limit);

    debug!(title = ?title, start_date = ?start_date, page, limit, "listing movies");

    let filter = ListFilter {
        title_prefix: title.clone(),
        start_date_prefix: start_date.clone(),
        offset: page,
        limit,
    };
    let result = state.store.list(&filter).await?;

    let base_url = base_url(&state, &headers);
    let links = PageLinks {
        base_url: &base_url,
        path: uri.path(),
        title: title.as_deref(),
        start_date: start_date.as_deref(),
        limit,
    };

    Ok(Json(MovieList {
        count: result.movies.len(),
        previous: links.previous(page),
        next: links.next(page, result.has_more),
        movies: result.movies,
    }))
}

pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i32>,
) -> AppResult<Json<movie::Model>> {
    Ok(Json(state.store.find(id).await?))
}

pub async fn update_movie(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i32>,
    JsonBody(fields): JsonBody<MovieFields>,
) -> AppResult<Json<movie::Model>> {
    let input = fields.validate()?;

    let regenerated = if state.config.regenerate_sessions_on_update {
        Some(sessions::generate(id, input.schedules.as_slice(), input.start_date, input.end_date)?)
    } else {
        None
    };

    let movie = state.store.update(id, &input, regenerated.as_deref()).await?;
    info!(movie_id = id, regenerated = regenerated.is_some(), "updated movie");

    Ok(Json(movie))
}

pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i32>,
) -> AppResult<Json<Message>> {
    let removed = state.store.delete(id).await?;
    info!(movie_id = id, sessions = removed, "deleted movie");

    Ok(Json(Message { message: "Movie deleted successfully.".to_string() }))
}

pub async fn movie_sessions(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i32>,
) -> AppResult<Json<SessionList>> {
    let sessions = state.store.sessions(id).await?;
    Ok(Json(SessionList { count: sessions.len(), sessions }))
}

fn base_url(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(url) = &state.config.public_base_url {
        return url.clone();
    }
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(|host| format!("http://{host}"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::Request,
        response::Response,
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::{config::Config, db, store::MovieStore};

    async fn app_with(config: Config) -> Router {
        let state = Arc::new(AppState {
            config: Arc::new(config),
            store: MovieStore::new(db::memory().await),
        });
        router(state)
    }

    async fn app() -> Router {
        app_with(Config::for_tests()).await
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::HOST, "localhost:3000")
            .header(header::CONTENT_TYPE, "application/json");
        let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);
        app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
    }

    async fn json_body(resp: Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn movie_json(id: i32, title: &str, schedules: &[&str]) -> Value {
        json!({
            "id": id,
            "title": title,
            "description": "a film",
            "schedules": schedules,
            "start_date": "2024-01-01",
            "end_date": "2024-01-15",
        })
    }

    #[tokio::test]
    async fn health_check() {
        let app = app().await;
        let resp = send(&app, "GET", "/health", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn create_returns_created_movie_and_generates_sessions() {
        let app = app().await;

        let resp = send(&app, "POST", "/movies", Some(movie_json(1, "Alien", &["Mon 18:00"]))).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = json_body(resp).await;
        assert_eq!(body["id"], 1);
        assert_eq!(body["title"], "Alien");
        assert_eq!(body["schedules"], json!(["Mon 18:00"]));
        assert_eq!(body["start_date"], "2024-01-01");
        assert!(body["created_at"].is_string());

        let resp = send(&app, "GET", "/movies/1/sessions", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["count"], 3);
        let dates: Vec<_> =
            body["sessions"].as_array().unwrap().iter().map(|s| s["date"].clone()).collect();
        assert_eq!(dates, vec![json!("2024-01-01"), json!("2024-01-08"), json!("2024-01-15")]);
        assert_eq!(body["sessions"][0]["time"], "18:00");
    }

    #[tokio::test]
    async fn duplicate_create_conflicts() {
        let app = app().await;
        send(&app, "POST", "/movies", Some(movie_json(1, "Alien", &[]))).await;

        let resp = send(&app, "POST", "/movies", Some(movie_json(1, "Aliens", &["Mon 18:00"]))).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(resp).await["message"], "Movie 1 already exists.");

        let body = json_body(send(&app, "GET", "/movies/1", None).await).await;
        assert_eq!(body["title"], "Alien");
        let sessions = json_body(send(&app, "GET", "/movies/1/sessions", None).await).await;
        assert_eq!(sessions["count"], 0);
    }

    #[tokio::test]
    async fn invalid_schedule_is_rejected_before_any_write() {
        let app = app().await;

        let resp =
            send(&app, "POST", "/movies", Some(movie_json(1, "Alien", &["Mon 18:00", "soon"])))
                .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = send(&app, "GET", "/movies/1", None).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn invalid_dates_are_rejected() {
        let app = app().await;
        let mut body = movie_json(1, "Alien", &[]);
        body["end_date"] = json!("2023-12-31");

        let resp = send(&app, "POST", "/movies", Some(body)).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let mut body = movie_json(1, "Alien", &[]);
        body["start_date"] = json!("01/01/2024");
        let resp = send(&app, "POST", "/movies", Some(body)).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn missing_movie_is_reported_without_body() {
        let app = app().await;

        let resp = send(&app, "GET", "/movies/404", None).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body = json_body(resp).await;
        assert_eq!(body, json!({ "message": "Movie 404 does not exist." }));

        let resp = send(&app, "PUT", "/movies/404", Some(movie_json(404, "x", &[]))).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = send(&app, "DELETE", "/movies/404", None).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn list_filters_and_links() {
        let app = app().await;
        for (id, title) in [(1, "Abyss"), (2, "Zodiac"), (3, "about time"), (4, "Abc"), (5, "Cab")] {
            send(&app, "POST", "/movies", Some(movie_json(id, title, &[]))).await;
        }

        let resp = send(&app, "GET", "/movies?title=Ab&limit=2", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["count"], 2);
        assert_eq!(body["movies"][0]["title"], "Abyss");
        assert_eq!(body["movies"][1]["title"], "about time");
        assert_eq!(body["previous"], Value::Null);
        assert_eq!(body["next"], "http://localhost:3000/movies?title=Ab&limit=2&page=2");

        let body = json_body(send(&app, "GET", "/movies?title=Ab&limit=2&page=2", None).await).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["movies"][0]["title"], "Abc");
        assert_eq!(body["previous"], "http://localhost:3000/movies?title=Ab&limit=2&page=0");
        assert_eq!(body["next"], Value::Null);
    }

    #[tokio::test]
    async fn list_uses_public_base_url_when_configured() {
        let mut config = Config::for_tests();
        config.public_base_url = Some("https://api.example.com".to_string());
        config.default_page_limit = 1;
        let app = app_with(config).await;
        for id in 1..=2 {
            send(&app, "POST", "/movies", Some(movie_json(id, "Heat", &[]))).await;
        }

        let body = json_body(send(&app, "GET", "/movies", None).await).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["next"], "https://api.example.com/movies?limit=1&page=1");
    }

    #[tokio::test]
    async fn out_of_range_page_is_a_json_bad_request() {
        let app = app().await;
        send(&app, "POST", "/movies", Some(movie_json(1, "Alien", &[]))).await;

        let resp = send(&app, "GET", "/movies?page=18446744073709551615", None).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(resp).await["message"].as_str().unwrap().contains("page"));

        let resp = send(&app, "GET", "/movies?page=9223372036854775807", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["count"], 0);
        assert_eq!(body["next"], Value::Null);
    }

    #[tokio::test]
    async fn list_finds_titles_with_non_ascii_capitals() {
        let app = app().await;
        send(&app, "POST", "/movies", Some(movie_json(1, "Émile", &[]))).await;
        send(&app, "POST", "/movies", Some(movie_json(2, "Emma", &[]))).await;

        for query in ["title=%C3%89mile", "title=%C3%A9", "title=%C3%A9MI"] {
            let body = json_body(send(&app, "GET", &format!("/movies?{query}"), None).await).await;
            assert_eq!(body["count"], 1, "{query}");
            assert_eq!(body["movies"][0]["title"], "Émile");
            assert!(body["movies"][0].get("title_search").is_none());
        }
    }

    #[tokio::test]
    async fn extractor_rejections_are_json() {
        let app = app().await;

        let mut body = movie_json(1, "Alien", &[]);
        body.as_object_mut().unwrap().remove("description");
        let resp = send(&app, "POST", "/movies", Some(body)).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let message = json_body(resp).await["message"].as_str().unwrap().to_string();
        assert!(message.contains("description"), "{message}");

        let resp = send(&app, "GET", "/movies/abc", None).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(resp).await["message"].is_string());

        let resp = send(&app, "GET", "/movies?page=-1", None).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(resp).await["message"].is_string());

        let resp = send(&app, "PUT", "/movies/1", Some(json!("not an object"))).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json_body(resp).await["message"].is_string());
    }

    #[tokio::test]
    async fn update_overwrites_without_regenerating_by_default() {
        let app = app().await;
        send(&app, "POST", "/movies", Some(movie_json(1, "Alien", &["Mon 18:00"]))).await;

        let mut changed = movie_json(1, "Alien 2", &["Fri 20:00"]);
        changed.as_object_mut().unwrap().remove("id");
        let resp = send(&app, "PUT", "/movies/1", Some(changed)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["title"], "Alien 2");
        assert_eq!(body["schedules"], json!(["Fri 20:00"]));

        let sessions = json_body(send(&app, "GET", "/movies/1/sessions", None).await).await;
        assert_eq!(sessions["count"], 3);
        assert_eq!(sessions["sessions"][0]["time"], "18:00");
    }

    #[tokio::test]
    async fn update_regenerates_when_enabled() {
        let mut config = Config::for_tests();
        config.regenerate_sessions_on_update = true;
        let app = app_with(config).await;
        send(&app, "POST", "/movies", Some(movie_json(1, "Alien", &["Mon 18:00"]))).await;

        let resp = send(&app, "PUT", "/movies/1", Some(movie_json(1, "Alien", &["Fri 20:00"]))).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let sessions = json_body(send(&app, "GET", "/movies/1/sessions", None).await).await;
        assert_eq!(sessions["count"], 2);
        assert_eq!(sessions["sessions"][0]["date"], "2024-01-05");
        assert_eq!(sessions["sessions"][0]["time"], "20:00");
    }

    #[tokio::test]
    async fn delete_removes_movie_and_sessions() {
        let app = app().await;
        send(&app, "POST", "/movies", Some(movie_json(1, "Alien", &["Mon 18:00"]))).await;

        let resp = send(&app, "DELETE", "/movies/1", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["message"], "Movie deleted successfully.");

        let resp = send(&app, "GET", "/movies/1/sessions", None).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
