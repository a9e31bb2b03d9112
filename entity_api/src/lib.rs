use chrono::Utc;
use password_auth::generate_hash;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

pub use entity::{esp_keys, provider, users, Id};

pub mod error;
pub mod esp_key;
pub mod user;

/// Seeds a development database with a pair of login-able users. ESP keys are
/// not seeded: a stored key is only meaningful once it has been validated
/// against a live provider, so those are added through the API.
pub async fn seed_database(db: &DatabaseConnection) {
    let now = Utc::now();

    users::ActiveModel {
        username: Set("admin".to_owned()),
        email: Set("admin@audiencehub.dev".to_owned()),
        password: Set(generate_hash("adminpassword")),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .save(db)
    .await
    .unwrap();

    users::ActiveModel {
        username: Set("demo".to_owned()),
        email: Set("demo@audiencehub.dev".to_owned()),
        password: Set(generate_hash("password")),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .save(db)
    .await
    .unwrap();
}
