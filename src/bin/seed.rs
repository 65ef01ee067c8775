//! Resets the database and loads demo users and saved searches.

use anyhow::Context;
use restroom_finder::{
    auth::{dto::SignupForm, repo_types::User, services::signup},
    config::AppConfig,
    db::{self, PgStore},
    searches::{dto::NewSearchRequest, repo_types::AmenityFilters, services::create},
};

struct DemoSearch {
    owner: usize,
    name: &'static str,
    query_string: &'static str,
    lon: f64,
    lat: f64,
    filters: AmenityFilters,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "restroom_finder=info,seed=info".into()),
        )
        .init();

    let config = AppConfig::from_env()?;
    let pool = db::connect(&config).await?;
    db::migrate(&pool).await?;

    sqlx::query("TRUNCATE TABLE saved_searches, users RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .context("truncate tables")?;

    let store = PgStore::new(pool);

    let mut users: Vec<User> = Vec::new();
    for (username, email, password) in [
        ("DemoUser", "demoemail@email.com", "password"),
        ("BobsonDugnutt99", "bobson@email.com", "dumdumdum"),
        ("SmeveMcBichael05", "smeve@email.com", "banana"),
    ] {
        let user = signup(
            &store,
            SignupForm {
                username: username.into(),
                email: email.into(),
                password: password.into(),
            },
        )
        .await
        .with_context(|| format!("seed user {username}"))?;
        tracing::info!(user_id = %user.id, %username, "seeded user");
        users.push(user);
    }

    let demo = [
        DemoSearch {
            owner: 1,
            name: "Downtown lunch spot",
            query_string: "",
            lon: -75.944,
            lat: 37.954,
            filters: AmenityFilters {
                accessible: false,
                unisex: true,
                changing_table: false,
            },
        },
        DemoSearch {
            owner: 1,
            name: "Park with the playground",
            query_string: "Central Park",
            lon: -73.965,
            lat: 40.782,
            filters: AmenityFilters {
                accessible: true,
                unisex: false,
                changing_table: true,
            },
        },
        DemoSearch {
            owner: 2,
            name: "Library",
            query_string: "public library",
            lon: -122.416,
            lat: 37.779,
            filters: AmenityFilters {
                accessible: true,
                unisex: true,
                changing_table: true,
            },
        },
    ];

    for s in demo {
        let owner = &users[s.owner];
        let search = create(
            &store,
            owner,
            NewSearchRequest {
                name: s.name.into(),
                query_string: Some(s.query_string.into()),
                lon: Some(s.lon),
                lat: Some(s.lat),
                use_current_location: false,
                filters: s.filters,
            },
        )
        .await
        .with_context(|| format!("seed saved search {}", s.name))?;
        tracing::info!(search_id = %search.id, owner = %owner.username, "seeded saved search");
    }

    tracing::info!("seed complete");
    Ok(())
}
