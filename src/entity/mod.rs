pub(crate) mod characters;
pub(crate) mod favorite_characters;
pub(crate) mod favorite_planets;
pub(crate) mod helpers;
pub(crate) mod planets;
pub(crate) mod users;
