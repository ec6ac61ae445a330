use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub mysql: MysqlConfig,
    pub database: DatabaseConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base used for absolute short links. Derived from the request when unset.
    pub public_base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MysqlConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL; overrides the MySQL parts when set.
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    pub root: String,
    pub url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenv::dotenv().ok();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .unwrap_or(8080),
                public_base_url: env::var("PUBLIC_BASE_URL")
                    .ok()
                    .filter(|url| !url.trim().is_empty()),
            },
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET")
                    .unwrap_or_else(|_| "your-secret-key-change-this".to_string()),
                expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                    .unwrap_or_else(|_| "24".to_string())
                    .parse()
                    .unwrap_or(24),
            },
            mysql: MysqlConfig {
                host: env::var("MYSQL_HOST").unwrap_or_else(|_| "localhost".to_string()),
                port: env::var("MYSQL_PORT")
                    .unwrap_or_else(|_| "3306".to_string())
                    .parse()
                    .unwrap_or(3306),
                user: env::var("MYSQL_USER").unwrap_or_else(|_| "root".to_string()),
                password: env::var("MYSQL_PASSWORD").unwrap_or_else(|_| "password".to_string()),
                database: env::var("MYSQL_DATABASE").unwrap_or_else(|_| "foodgram".to_string()),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .ok()
                    .filter(|url| !url.trim().is_empty()),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            },
            media: MediaConfig {
                root: env::var("MEDIA_ROOT").unwrap_or_else(|_| "./media".to_string()),
                url: env::var("MEDIA_URL").unwrap_or_else(|_| "/media/".to_string()),
            },
        })
    }

    pub fn mysql_url(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            self.mysql.user,
            self.mysql.password,
            self.mysql.host,
            self.mysql.port,
            self.mysql.database
        )
    }

    /// The URL the pool connects to: `DATABASE_URL` if given, MySQL otherwise.
    pub fn database_url(&self) -> String {
        self.database
            .url
            .clone()
            .unwrap_or_else(|| self.mysql_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                public_base_url: None,
            },
            jwt: JwtConfig {
                secret: "secret".to_string(),
                expiration_hours: 1,
            },
            mysql: MysqlConfig {
                host: "db".to_string(),
                port: 3307,
                user: "chef".to_string(),
                password: "pw".to_string(),
                database: "recipes".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
            },
            media: MediaConfig {
                root: "./media".to_string(),
                url: "/media/".to_string(),
            },
        }
    }

    #[test]
    fn database_url_falls_back_to_mysql_parts() {
        let config = sample();
        assert_eq!(config.database_url(), "mysql://chef:pw@db:3307/recipes");
    }

    #[test]
    fn explicit_database_url_wins() {
        let mut config = sample();
        config.database.url = Some("sqlite::memory:".to_string());
        assert_eq!(config.database_url(), "sqlite::memory:");
    }
}
