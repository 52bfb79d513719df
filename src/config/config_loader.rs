use anyhow::Result;

use super::config_model::{AuthSecret, AuthorizeNet, Database, DotEnvyConfig, Server};

const DEFAULT_GATEWAY_ENDPOINT: &str = "https://api.authorize.net/xml/v1/request.api";

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

    let authorize_net = AuthorizeNet {
        api_login_id: std::env::var("AUTHNET_API_LOGIN_ID")
            .expect("AUTHNET_API_LOGIN_ID is invalid"),
        transaction_key: std::env::var("AUTHNET_TRANSACTION_KEY")
            .expect("AUTHNET_TRANSACTION_KEY is invalid"),
        endpoint: std::env::var("AUTHNET_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_GATEWAY_ENDPOINT.to_string()),
    };

    Ok(DotEnvyConfig {
        server,
        database,
        authorize_net,
    })
}

pub fn get_auth_secret() -> Result<AuthSecret> {
    dotenvy::dotenv().ok();

    Ok(AuthSecret {
        jwt_secret: std::env::var("JWT_USER_SECRET").expect("JWT_USER_SECRET is invalid"),
    })
}
