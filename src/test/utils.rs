#[cfg(test)]
pub mod test_db {
    use crate::db::{connect, insert_user, insert_visited_country};
    use crate::error::AppError;
    use sqlx::{Pool, Sqlite};
    use std::collections::HashMap;
    use std::sync::Once;

    static INIT: Once = Once::new();

    #[derive(Default)]
    pub struct TestDbBuilder {
        users: Vec<TestUser>,
        visits: Vec<TestVisit>,
    }

    pub struct TestUser {
        pub name: String,
        pub color: String,
    }

    pub struct TestVisit {
        pub user_name: String,
        pub country_code: String,
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn user(mut self, name: &str, color: &str) -> Self {
            self.users.push(TestUser {
                name: name.to_string(),
                color: color.to_string(),
            });
            self
        }

        pub fn visited(mut self, user_name: &str, country_code: &str) -> Self {
            self.visits.push(TestVisit {
                user_name: user_name.to_string(),
                country_code: country_code.to_string(),
            });
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            INIT.call_once(|| {
                let _ = env_logger::builder()
                    .parse_filters("debug")
                    .is_test(true)
                    .try_init();
            });

            let pool = connect("sqlite::memory:").await?;

            let mut user_id_map: HashMap<String, i64> = HashMap::new();

            for user in &self.users {
                let user_id = insert_user(&pool, &user.name, &user.color).await?;
                user_id_map.insert(user.name.clone(), user_id);
            }

            for visit in &self.visits {
                let user_id = user_id_map.get(&visit.user_name).copied().ok_or_else(|| {
                    AppError::Internal(format!("Unknown test user {}", visit.user_name))
                })?;

                insert_visited_country(&pool, &visit.country_code, user_id).await?;
            }

            Ok(TestDb { pool, user_id_map })
        }
    }

    pub struct TestDb {
        pub pool: Pool<Sqlite>,
        pub user_id_map: HashMap<String, i64>,
    }

    impl TestDb {
        pub fn user_id(&self, name: &str) -> Option<i64> {
            self.user_id_map.get(name).copied()
        }

        pub async fn user_count(&self) -> i64 {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
                .fetch_one(&self.pool)
                .await
                .expect("Failed to count users")
        }

        pub async fn visit_count(&self, user_id: i64) -> i64 {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM visited_countries WHERE user_id = ?",
            )
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count visited countries")
        }
    }
}

#[cfg(test)]
pub mod test_utils {
    pub use super::test_db::{TestDb, TestDbBuilder};

    use crate::config::AppConfig;
    use crate::init_rocket;
    use rocket::http::{ContentType, Status};
    use rocket::local::asynchronous::Client;

    /// Two users, with Jack active by default and one country already visited.
    pub async fn create_standard_test_db() -> TestDb {
        TestDbBuilder::new()
            .user("Jack", "teal")
            .user("Angela", "powderblue")
            .visited("Jack", "FR")
            .build()
            .await
            .expect("Failed to build test database")
    }

    pub async fn setup_test_client(test_db: TestDb) -> (Client, TestDb) {
        let config = AppConfig {
            database_url: "sqlite::memory:".to_string(),
            ..AppConfig::default()
        };

        let rocket = init_rocket(test_db.pool.clone(), config);

        let client = Client::tracked(rocket)
            .await
            .expect("Failed to create Rocket client");

        (client, test_db)
    }

    pub async fn post_form(client: &Client, uri: &'static str, body: &str) -> (Status, String) {
        let response = client
            .post(uri)
            .header(ContentType::Form)
            .body(body.to_string())
            .dispatch()
            .await;

        let status = response.status();
        let body = response.into_string().await.unwrap_or_default();

        (status, body)
    }

    pub async fn get_home(client: &Client) -> (Status, String) {
        let response = client.get("/").dispatch().await;

        let status = response.status();
        let body = response.into_string().await.unwrap_or_default();

        (status, body)
    }
}
