use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("CREATE SCHEMA IF NOT EXISTS audience_platform")
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DO $$ BEGIN
                    CREATE TYPE audience_platform.esp_provider
                        AS ENUM ('mailchimp', 'getresponse');
                EXCEPTION
                    WHEN duplicate_object THEN null;
                END $$
            "#,
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE IF NOT EXISTS audience_platform.users (
                    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                    username VARCHAR(255) NOT NULL DEFAULT 'new user',
                    email VARCHAR(255) NOT NULL UNIQUE,
                    password VARCHAR(255) NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )
            "#,
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE IF NOT EXISTS audience_platform.esp_keys (
                    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                    user_id UUID NOT NULL REFERENCES audience_platform.users(id) ON DELETE CASCADE,
                    provider audience_platform.esp_provider NOT NULL,
                    name VARCHAR(255) NOT NULL,
                    secret_key TEXT NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )
            "#,
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                "CREATE INDEX IF NOT EXISTS idx_esp_keys_user_id
                 ON audience_platform.esp_keys(user_id)",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS audience_platform.esp_keys")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS audience_platform.users")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("DROP TYPE IF EXISTS audience_platform.esp_provider")
            .await?;

        Ok(())
    }
}
