#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub server: Server,
    pub database: Database,
    pub auth: Auth,
    pub engine: Engine,
    pub defaults: Defaults,
}

#[derive(Debug, Clone)]
pub struct Server {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Auth {
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct Engine {
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct Defaults {
    /// Plan assigned by the provisioning endpoint to users without one.
    pub plan_id: i64,
}
