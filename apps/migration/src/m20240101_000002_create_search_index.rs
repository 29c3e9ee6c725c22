use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Text search configurations the server accepts in `SEARCH_LANGUAGE`.
const SEARCH_CONFIGS: [&str; 3] = ["english", "russian", "simple"];

/// Resolve `SEARCH_LANGUAGE` the same way the server does, defaulting to english.
fn search_config(raw: Option<&str>) -> Result<&'static str, DbErr> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok("english");
    };

    match raw.to_lowercase().as_str() {
        "english" | "en" => Ok("english"),
        "russian" | "ru" => Ok("russian"),
        "simple" => Ok("simple"),
        other => Err(DbErr::Custom(format!(
            "unsupported search language: {other}"
        ))),
    }
}

// Must match the expression the post repository searches on.
fn create_index_sql(config: &str) -> String {
    format!(
        r#"
        CREATE INDEX IF NOT EXISTS idx_posts_search_{config}
        ON posts
        USING GIN (to_tsvector('{config}', title || ' ' || content))
        "#
    )
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let language = std::env::var("SEARCH_LANGUAGE").ok();
        let config = search_config(language.as_deref())?;

        manager
            .get_connection()
            .execute_unprepared(&create_index_sql(config))
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // The language may have changed since `up`, so drop every variant.
        for config in SEARCH_CONFIGS {
            manager
                .get_connection()
                .execute_unprepared(&format!("DROP INDEX IF EXISTS idx_posts_search_{config}"))
                .await?;
        }
        Ok(())
    }
}
