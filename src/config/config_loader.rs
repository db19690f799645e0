use anyhow::{Ok, Result};

use super::config_model::{Auth, Database, Defaults, DotEnvyConfig, Engine, Server};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let server = Server {
        port: std::env::var("SERVER_PORT")
            .expect("SERVER_PORT is invalid")
            .parse()?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .expect("SERVER_BODY_LIMIT is invalid")
            .parse()?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .expect("SERVER_TIMEOUT is invalid")
            .parse()?,
    };

    let database = Database {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid"),
    };

    let auth = Auth {
        jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET is invalid"),
    };

    let engine = Engine {
        base_url: std::env::var("ENGINE_BASE_URL").expect("ENGINE_BASE_URL is invalid"),
    };

    let defaults = Defaults {
        plan_id: std::env::var("DEFAULT_PLAN_ID")
            .unwrap_or_else(|_| "1".to_string())
            .parse()?,
    };

    Ok(DotEnvyConfig {
        server,
        database,
        auth,
        engine,
        defaults,
    })
}
