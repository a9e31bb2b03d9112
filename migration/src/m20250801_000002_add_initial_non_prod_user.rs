use password_auth::generate_hash;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Convenience login for local development; skipped entirely in production
        let runtime_env = std::env::var("RUST_ENV").unwrap_or_default();
        if runtime_env.eq_ignore_ascii_case("production") {
            return Ok(());
        }

        let password_hash = generate_hash("password");
        let insert_user_sql = format!(
            r#"
            INSERT INTO audience_platform.users (username, email, password)
            VALUES ('demo', 'demo@audiencehub.dev', '{password_hash}')
            ON CONFLICT (email) DO NOTHING
        "#
        );

        manager
            .get_connection()
            .execute_unprepared(&insert_user_sql)
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                "DELETE FROM audience_platform.users WHERE email = 'demo@audiencehub.dev'",
            )
            .await?;

        Ok(())
    }
}
