use anyhow::Context;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema, Set,
};

use crate::data::configuration::Configuration;
use crate::entity::{characters, favorite_characters, favorite_planets, helpers, planets, users};

pub(crate) trait CatalogConnection {
    async fn connect(&mut self) -> Result<(), anyhow::Error>;
    async fn check(&self) -> Result<(), anyhow::Error>;
    async fn is_initialized(&self) -> Result<bool, anyhow::Error>;
    async fn initialize(&self, config: &Configuration) -> Result<(), anyhow::Error>;
    async fn close(&self) -> Result<(), anyhow::Error>;
}

pub struct SQLConnector {
    url: String,
    database_connection: Option<DatabaseConnection>,
}

impl SQLConnector {
    pub fn new(url: &str) -> Self {
        SQLConnector {
            url: url.to_string(),
            database_connection: None,
        }
    }

    fn db(&self) -> anyhow::Result<&DatabaseConnection> {
        self.database_connection
            .as_ref()
            .context("database connection has not been established")
    }

    pub async fn list_users(&self) -> anyhow::Result<Vec<users::Model>> {
        Ok(users::Entity::find().all(self.db()?).await?)
    }

    pub async fn list_planets(&self) -> anyhow::Result<Vec<planets::Model>> {
        Ok(planets::Entity::find().all(self.db()?).await?)
    }

    pub async fn list_characters(&self) -> anyhow::Result<Vec<characters::Model>> {
        Ok(characters::Entity::find().all(self.db()?).await?)
    }

    pub async fn get_user(&self, id: i32) -> anyhow::Result<Option<users::Model>> {
        Ok(users::Entity::find_by_id(id).one(self.db()?).await?)
    }

    pub async fn get_planet(&self, id: i32) -> anyhow::Result<Option<planets::Model>> {
        Ok(planets::Entity::find_by_id(id).one(self.db()?).await?)
    }

    pub async fn get_character(&self, id: i32) -> anyhow::Result<Option<characters::Model>> {
        Ok(characters::Entity::find_by_id(id).one(self.db()?).await?)
    }

    pub async fn favorite_planets_of(&self, user_id: i32) -> anyhow::Result<Vec<planets::Model>> {
        helpers::favorite_planets_of(self.db()?, user_id).await
    }

    pub async fn favorite_characters_of(
        &self,
        user_id: i32,
    ) -> anyhow::Result<Vec<characters::Model>> {
        helpers::favorite_characters_of(self.db()?, user_id).await
    }

    pub async fn add_favorite_planet(&self, user_id: i32, planet_id: i32) -> anyhow::Result<bool> {
        helpers::add_favorite_planet(self.db()?, user_id, planet_id).await
    }

    pub async fn add_favorite_character(
        &self,
        user_id: i32,
        character_id: i32,
    ) -> anyhow::Result<bool> {
        helpers::add_favorite_character(self.db()?, user_id, character_id).await
    }

    pub async fn remove_favorite_planet(
        &self,
        user_id: i32,
        planet_id: i32,
    ) -> anyhow::Result<bool> {
        helpers::remove_favorite_planet(self.db()?, user_id, planet_id).await
    }

    pub async fn remove_favorite_character(
        &self,
        user_id: i32,
        character_id: i32,
    ) -> anyhow::Result<bool> {
        helpers::remove_favorite_character(self.db()?, user_id, character_id).await
    }
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> anyhow::Result<()> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut stmt = schema.create_table_from_entity(entity);
    db.execute(backend.build(stmt.if_not_exists()))
        .await
        .context("failed to create table")?;
    Ok(())
}

impl CatalogConnection for SQLConnector {
    async fn connect(&mut self) -> Result<(), anyhow::Error> {
        let db = Database::connect(self.url.clone()).await?;

        self.database_connection = Some(db);
        Ok(())
    }

    async fn check(&self) -> Result<(), anyhow::Error> {
        if let Some(ref db) = self.database_connection {
            db.ping().await?;
        }
        Ok(())
    }

    async fn is_initialized(&self) -> Result<bool, anyhow::Error> {
        let db = self.db()?;
        // If the users table is missing the whole schema is missing; the five
        // tables are only ever created together.
        Ok(db.execute_unprepared("SELECT 1 FROM users LIMIT 1").await.is_ok())
    }

    async fn initialize(&self, config: &Configuration) -> Result<(), anyhow::Error> {
        let db = self.db()?;

        create_table(db, users::Entity).await?;
        create_table(db, planets::Entity).await?;
        create_table(db, characters::Entity).await?;
        create_table(db, favorite_planets::Entity).await?;
        create_table(db, favorite_characters::Entity).await?;

        for u in &config.seed.users {
            let row = users::ActiveModel {
                id: Set(u.id),
                email: Set(u.email.clone()),
                password: Set(u.password.clone()),
                is_active: Set(u.is_active),
            };
            row.insert(db).await.context("failed to seed user")?;
        }

        for p in &config.seed.planets {
            let row = planets::ActiveModel {
                id: Set(p.id),
                name: Set(p.name.clone()),
                climate: Set(p.climate.clone()),
                terrain: Set(p.terrain.clone()),
            };
            row.insert(db).await.context("failed to seed planet")?;
        }

        for c in &config.seed.characters {
            let row = characters::ActiveModel {
                id: Set(c.id),
                name: Set(c.name.clone()),
                height: Set(c.height.clone()),
                mass: Set(c.mass.clone()),
            };
            row.insert(db).await.context("failed to seed character")?;
        }

        Ok(())
    }

    async fn close(&self) -> Result<(), anyhow::Error> {
        if let Some(ref db) = self.database_connection {
            let db = db.clone();
            db.close().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::configuration::{SeedPlanet, SeedUser};

    async fn connected() -> SQLConnector {
        let mut connector = SQLConnector::new("sqlite::memory:");
        connector.connect().await.unwrap();
        connector
    }

    #[tokio::test]
    async fn initialize_creates_schema_and_seeds() {
        let connector = connected().await;
        assert!(!connector.is_initialized().await.unwrap());

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
        connector.initialize(&config).await.unwrap();

        assert!(connector.is_initialized().await.unwrap());
        let planet = connector.get_planet(1).await.unwrap().unwrap();
        assert_eq!(planet.name, "Tatooine");
        assert_eq!(connector.list_users().await.unwrap().len(), 1);
        assert!(connector.get_character(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn favorites_add_remove_roundtrip() {
        let connector = connected().await;
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
            climate: None,
            terrain: None,
        });
        connector.initialize(&config).await.unwrap();

        assert!(connector.add_favorite_planet(1, 1).await.unwrap());
        // Second add is a checked no-op, not a constraint violation
        assert!(!connector.add_favorite_planet(1, 1).await.unwrap());

        let favorites = connector.favorite_planets_of(1).await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].name, "Tatooine");

        assert!(connector.remove_favorite_planet(1, 1).await.unwrap());
        assert!(!connector.remove_favorite_planet(1, 1).await.unwrap());
        assert!(connector.favorite_planets_of(1).await.unwrap().is_empty());
    }
}
