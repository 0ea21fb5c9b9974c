use crate::data::configuration::Configuration;
use crate::data::dbconnector::SQLConnector;
pub(crate) mod types;
use axum::extract::{Path, Request, State};
use axum::routing::get;
use axum::{Json, Router, ServiceExt};
use log::debug;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::Layer;
use tower_http::normalize_path::NormalizePathLayer;
use types::{
    ApiError, CharacterResponse, FavoritesResponse, MessageResponse, PlanetResponse, UserResponse,
};

#[derive(Clone)]
pub struct ServerConfig {
    pub database_connection: Arc<SQLConnector>,
    /// Whose favorites every request operates on. No session layer exists;
    /// this comes straight from configuration.
    pub current_user_id: i32,
}

pub fn router(state: ServerConfig) -> Router {
    Router::new()
        .route("/", get(sitemap))
        .route("/user", get(hello_user))
        .route("/people", get(get_all_characters))
        .route("/people/{id}", get(get_character_by_id))
        .route("/planets", get(get_all_planets))
        .route("/planets/{id}", get(get_planet_by_id))
        .route("/users", get(get_all_users))
        .route("/users/favorites", get(get_user_favorites))
        .route(
            "/favorite/planet/{id}",
            axum::routing::post(add_favorite_planet).delete(delete_favorite_planet),
        )
        .route(
            "/favorite/people/{id}",
            axum::routing::post(add_favorite_character).delete(delete_favorite_character),
        )
        .with_state(state)
}

pub async fn run(
    config: Configuration,
    database_connection: SQLConnector,
    port: u16,
) -> anyhow::Result<()> {
    debug!("Starting server on port {port}");

    let state = ServerConfig {
        database_connection: Arc::new(database_connection),
        current_user_id: config.server.current_user_id,
    };

    // Serve /planets and /planets/ alike
    let app = NormalizePathLayer::trim_trailing_slash().layer(router(state));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await?;

    Ok(())
}

async fn sitemap() -> Json<Value> {
    Json(json!({
        "endpoints": [
            "GET /user",
            "GET /people",
            "GET /people/{id}",
            "GET /planets",
            "GET /planets/{id}",
            "GET /users",
            "GET /users/favorites",
            "POST /favorite/planet/{id}",
            "POST /favorite/people/{id}",
            "DELETE /favorite/planet/{id}",
            "DELETE /favorite/people/{id}",
        ]
    }))
}

async fn hello_user() -> Json<MessageResponse> {
    Json(MessageResponse {
        msg: "Hello, this is your GET /user response".to_string(),
    })
}

async fn get_all_characters(
    State(state): State<ServerConfig>,
) -> Result<Json<Vec<CharacterResponse>>, ApiError> {
    let characters = state
        .database_connection
        .list_characters()
        .await
        .map_err(ApiError::internal)?;

    if characters.is_empty() {
        return Err(ApiError::not_found("No se encontraron personajes"));
    }
    Ok(Json(characters.into_iter().map(Into::into).collect()))
}

async fn get_character_by_id(
    State(state): State<ServerConfig>,
    Path(people_id): Path<i32>,
) -> Result<Json<CharacterResponse>, ApiError> {
    let character = state
        .database_connection
        .get_character(people_id)
        .await
        .map_err(ApiError::internal)?;

    match character {
        Some(c) => Ok(Json(c.into())),
        None => Err(ApiError::not_found(format!(
            "Personaje con ID {people_id} no encontrado"
        ))),
    }
}

async fn get_all_planets(
    State(state): State<ServerConfig>,
) -> Result<Json<Vec<PlanetResponse>>, ApiError> {
    let planets = state
        .database_connection
        .list_planets()
        .await
        .map_err(ApiError::internal)?;

    if planets.is_empty() {
        return Err(ApiError::not_found("No se encontraron planetas"));
    }
    Ok(Json(planets.into_iter().map(Into::into).collect()))
}

async fn get_planet_by_id(
    State(state): State<ServerConfig>,
    Path(planet_id): Path<i32>,
) -> Result<Json<PlanetResponse>, ApiError> {
    let planet = state
        .database_connection
        .get_planet(planet_id)
        .await
        .map_err(ApiError::internal)?;

    match planet {
        Some(p) => Ok(Json(p.into())),
        None => Err(ApiError::not_found(format!(
            "Planeta con ID {planet_id} no encontrado"
        ))),
    }
}

async fn get_all_users(
    State(state): State<ServerConfig>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state
        .database_connection
        .list_users()
        .await
        .map_err(ApiError::internal)?;

    if users.is_empty() {
        return Err(ApiError::not_found("No se encontraron usuarios"));
    }
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

async fn get_user_favorites(
    State(state): State<ServerConfig>,
) -> Result<Json<FavoritesResponse>, ApiError> {
    let db = &state.database_connection;
    let user_id = state.current_user_id;

    if db.get_user(user_id).await.map_err(ApiError::internal)?.is_none() {
        return Err(ApiError::not_found("Usuario no encontrado"));
    }

    let favorite_planets = db
        .favorite_planets_of(user_id)
        .await
        .map_err(ApiError::internal)?;
    let favorite_characters = db
        .favorite_characters_of(user_id)
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(FavoritesResponse {
        favorite_planets: favorite_planets.into_iter().map(Into::into).collect(),
        favorite_characters: favorite_characters.into_iter().map(Into::into).collect(),
    }))
}

async fn add_favorite_planet(
    State(state): State<ServerConfig>,
    Path(planet_id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    let db = &state.database_connection;
    let user_id = state.current_user_id;

    let user = db.get_user(user_id).await.map_err(ApiError::internal)?;
    let planet = db.get_planet(planet_id).await.map_err(ApiError::internal)?;
    let (Some(_), Some(planet)) = (user, planet) else {
        return Err(ApiError::not_found("Usuario o planeta no encontrado"));
    };

    let inserted = db
        .add_favorite_planet(user_id, planet_id)
        .await
        .map_err(ApiError::internal)?;

    let msg = if inserted {
        format!("Planeta {} añadido a favoritos", planet.name)
    } else {
        format!("Planeta {} ya estaba en favoritos", planet.name)
    };
    Ok(Json(MessageResponse { msg }))
}

async fn add_favorite_character(
    State(state): State<ServerConfig>,
    Path(people_id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    let db = &state.database_connection;
    let user_id = state.current_user_id;

    let user = db.get_user(user_id).await.map_err(ApiError::internal)?;
    let character = db.get_character(people_id).await.map_err(ApiError::internal)?;
    let (Some(_), Some(character)) = (user, character) else {
        return Err(ApiError::not_found("Usuario o personaje no encontrado"));
    };

    let inserted = db
        .add_favorite_character(user_id, people_id)
        .await
        .map_err(ApiError::internal)?;

    let msg = if inserted {
        format!("Personaje {} añadido a favoritos", character.name)
    } else {
        format!("Personaje {} ya estaba en favoritos", character.name)
    };
    Ok(Json(MessageResponse { msg }))
}

async fn delete_favorite_planet(
    State(state): State<ServerConfig>,
    Path(planet_id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    let db = &state.database_connection;
    let user_id = state.current_user_id;

    let user = db.get_user(user_id).await.map_err(ApiError::internal)?;
    let planet = db.get_planet(planet_id).await.map_err(ApiError::internal)?;
    let (Some(_), Some(planet)) = (user, planet) else {
        return Err(ApiError::not_found("Usuario o planeta no encontrado"));
    };

    let removed = db
        .remove_favorite_planet(user_id, planet_id)
        .await
        .map_err(ApiError::internal)?;

    if !removed {
        return Err(ApiError::not_found(
            "El planeta no estaba en los favoritos del usuario",
        ));
    }
    Ok(Json(MessageResponse {
        msg: format!("Planeta {} eliminado de favoritos", planet.name),
    }))
}

async fn delete_favorite_character(
    State(state): State<ServerConfig>,
    Path(people_id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    let db = &state.database_connection;
    let user_id = state.current_user_id;

    let user = db.get_user(user_id).await.map_err(ApiError::internal)?;
    let character = db.get_character(people_id).await.map_err(ApiError::internal)?;
    let (Some(_), Some(character)) = (user, character) else {
        return Err(ApiError::not_found("Usuario o personaje no encontrado"));
    };

    let removed = db
        .remove_favorite_character(user_id, people_id)
        .await
        .map_err(ApiError::internal)?;

    if !removed {
        return Err(ApiError::not_found(
            "El personaje no estaba en los favoritos del usuario",
        ));
    }
    Ok(Json(MessageResponse {
        msg: format!("Personaje {} eliminado de favoritos", character.name),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::configuration::{SeedCharacter, SeedPlanet, SeedUser};
    use crate::data::dbconnector::CatalogConnection;
    use axum::body::{to_bytes, Body};
    use axum::http::StatusCode;
    use tower::ServiceExt as _;

    async fn seeded_state() -> ServerConfig {
        let mut connector = SQLConnector::new("sqlite::memory:");
        connector.connect().await.unwrap();

        let mut config = Configuration::default();
        config.seed.users.push(SeedUser {
            id: 1,
            email: "a@b.com".to_string(),
            password: "secret".to_string(),
            is_active: true,
        });
        config.seed.planets.push(SeedPlanet {
            id: 1,
            name: "Tatooine".to_string(),
            climate: Some("arid".to_string()),
            terrain: Some("desert".to_string()),
        });
        config.seed.characters.push(SeedCharacter {
            id: 1,
            name: "Luke Skywalker".to_string(),
            height: Some("172".to_string()),
            mass: Some("77".to_string()),
        });
        connector.initialize(&config).await.unwrap();

        ServerConfig {
            database_connection: Arc::new(connector),
            current_user_id: 1,
        }
    }

    async fn empty_state() -> ServerConfig {
        let mut connector = SQLConnector::new("sqlite::memory:");
        connector.connect().await.unwrap();
        connector.initialize(&Configuration::default()).await.unwrap();

        ServerConfig {
            database_connection: Arc::new(connector),
            current_user_id: 1,
        }
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn req(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn sitemap_lists_endpoints() {
        let app = router(seeded_state().await);
        let response = app.oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert!(body["endpoints"]
            .as_array()
            .unwrap()
            .iter()
            .any(|e| e == "GET /users/favorites"));
    }

    #[tokio::test]
    async fn user_greeting() {
        let app = router(seeded_state().await);
        let response = app.oneshot(get("/user")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert!(body["msg"].as_str().unwrap().starts_with("Hello"));
    }

    #[tokio::test]
    async fn get_planet_returns_row_fields() {
        let app = router(seeded_state().await);
        let response = app.oneshot(get("/planets/1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["id"], 1);
        assert_eq!(body["name"], "Tatooine");
        assert_eq!(body["climate"], "arid");
        assert_eq!(body["terrain"], "desert");
    }

    #[tokio::test]
    async fn missing_planet_is_404_with_error_envelope() {
        let app = router(seeded_state().await);
        let response = app.oneshot(get("/planets/99")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Planeta con ID 99 no encontrado");
    }

    #[tokio::test]
    async fn empty_collections_are_404() {
        let state = empty_state().await;
        for uri in ["/people", "/planets", "/users"] {
            let response = router(state.clone()).oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[tokio::test]
    async fn users_never_expose_password() {
        let app = router(seeded_state().await);
        let response = app.oneshot(get("/users")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        for user in body.as_array().unwrap() {
            assert!(user.get("password").is_none());
            assert_eq!(user["email"], "a@b.com");
            assert_eq!(user["is_active"], true);
        }
    }

    #[tokio::test]
    async fn character_lookup_by_id() {
        let app = router(seeded_state().await);
        let response = app.oneshot(get("/people/1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["name"], "Luke Skywalker");
        assert_eq!(body["height"], "172");
    }

    #[tokio::test]
    async fn favorite_planet_full_lifecycle() {
        let state = seeded_state().await;

        let response = router(state.clone())
            .oneshot(req("POST", "/favorite/planet/1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["msg"], "Planeta Tatooine añadido a favoritos");

        let response = router(state.clone()).oneshot(get("/users/favorites")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let planets = body["favorite_planets"].as_array().unwrap();
        assert_eq!(planets.len(), 1);
        assert_eq!(planets[0]["name"], "Tatooine");
        assert_eq!(body["favorite_characters"].as_array().unwrap().len(), 0);

        let response = router(state.clone())
            .oneshot(req("DELETE", "/favorite/planet/1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["msg"], "Planeta Tatooine eliminado de favoritos");

        // Removal is not idempotent
        let response = router(state.clone())
            .oneshot(req("DELETE", "/favorite/planet/1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "El planeta no estaba en los favoritos del usuario");

        let response = router(state).oneshot(get("/users/favorites")).await.unwrap();
        let body = body_json(response).await;
        assert!(body["favorite_planets"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_favorite_add_is_a_noop() {
        let state = seeded_state().await;

        let response = router(state.clone())
            .oneshot(req("POST", "/favorite/people/1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["msg"], "Personaje Luke Skywalker añadido a favoritos");

        let response = router(state.clone())
            .oneshot(req("POST", "/favorite/people/1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["msg"], "Personaje Luke Skywalker ya estaba en favoritos");

        let response = router(state).oneshot(get("/users/favorites")).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["favorite_characters"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn favoriting_missing_target_is_404() {
        let state = seeded_state().await;

        let response = router(state.clone())
            .oneshot(req("POST", "/favorite/planet/99"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Usuario o planeta no encontrado");

        let response = router(state)
            .oneshot(req("DELETE", "/favorite/people/99"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn favorites_of_missing_user_is_404() {
        let mut state = seeded_state().await;
        state.current_user_id = 42;

        let response = router(state).oneshot(get("/users/favorites")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Usuario no encontrado");
    }

    #[tokio::test]
    async fn trailing_slashes_are_normalized() {
        let app = NormalizePathLayer::trim_trailing_slash().layer(router(seeded_state().await));
        let response = app.oneshot(get("/planets/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn non_integer_id_is_client_error() {
        let app = router(seeded_state().await);
        let response = app.oneshot(get("/planets/tatooine")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
