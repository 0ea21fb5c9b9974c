use anyhow::Context;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
};

pub async fn favorite_planets_of(
    db: &DatabaseConnection,
    user_id: i32,
) -> anyhow::Result<Vec<crate::entity::planets::Model>> {
    use crate::entity::{favorite_planets, planets};
    // First get the link rows, then fetch planets by id to avoid ambiguous SQL when joining
    let links = favorite_planets::Entity::find()
        .filter(favorite_planets::Column::UserId.eq(user_id))
        .all(db)
        .await?;

    let mut favorites = Vec::new();
    for l in links {
        if let Some(m) = planets::Entity::find_by_id(l.planet_id).one(db).await? {
            favorites.push(m);
        }
    }

    Ok(favorites)
}

pub async fn favorite_characters_of(
    db: &DatabaseConnection,
    user_id: i32,
) -> anyhow::Result<Vec<crate::entity::characters::Model>> {
    use crate::entity::{characters, favorite_characters};
    let links = favorite_characters::Entity::find()
        .filter(favorite_characters::Column::UserId.eq(user_id))
        .all(db)
        .await?;

    let mut favorites = Vec::new();
    for l in links {
        if let Some(m) = characters::Entity::find_by_id(l.character_id).one(db).await? {
            favorites.push(m);
        }
    }

    Ok(favorites)
}

/// Returns false when the pair already exists; the link table's composite
/// primary key is never violated because presence is checked first.
pub async fn add_favorite_planet(
    db: &DatabaseConnection,
    user_id: i32,
    planet_id: i32,
) -> anyhow::Result<bool> {
    use crate::entity::favorite_planets;

    if favorite_planets::Entity::find_by_id((user_id, planet_id))
        .one(db)
        .await?
        .is_some()
    {
        return Ok(false);
    }

    let link = favorite_planets::ActiveModel {
        user_id: Set(user_id),
        planet_id: Set(planet_id),
    };

    link.insert(db)
        .await
        .context("failed to insert favorite planet link")?;
    Ok(true)
}

pub async fn add_favorite_character(
    db: &DatabaseConnection,
    user_id: i32,
    character_id: i32,
) -> anyhow::Result<bool> {
    use crate::entity::favorite_characters;

    if favorite_characters::Entity::find_by_id((user_id, character_id))
        .one(db)
        .await?
        .is_some()
    {
        return Ok(false);
    }

    let link = favorite_characters::ActiveModel {
        user_id: Set(user_id),
        character_id: Set(character_id),
    };

    link.insert(db)
        .await
        .context("failed to insert favorite character link")?;
    Ok(true)
}

/// Returns false when the pair was not favorited to begin with.
pub async fn remove_favorite_planet(
    db: &DatabaseConnection,
    user_id: i32,
    planet_id: i32,
) -> anyhow::Result<bool> {
    use crate::entity::favorite_planets;

    let Some(link) = favorite_planets::Entity::find_by_id((user_id, planet_id))
        .one(db)
        .await?
    else {
        return Ok(false);
    };

    link.delete(db)
        .await
        .context("failed to delete favorite planet link")?;
    Ok(true)
}

pub async fn remove_favorite_character(
    db: &DatabaseConnection,
    user_id: i32,
    character_id: i32,
) -> anyhow::Result<bool> {
    use crate::entity::favorite_characters;

    let Some(link) = favorite_characters::Entity::find_by_id((user_id, character_id))
        .one(db)
        .await?
    else {
        return Ok(false);
    };

    link.delete(db)
        .await
        .context("failed to delete favorite character link")?;
    Ok(true)
}
