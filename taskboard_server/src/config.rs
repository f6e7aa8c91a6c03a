use std::net::SocketAddr;

use clap::Parser;

/// Command-line and environment configuration for the gateway.
#[derive(Parser, Debug, Clone)]
#[command(name = "taskboard-server", about = "Task board API gateway")]
pub struct ServerConfig {
    /// SeaORM database URL.
    #[arg(
        long,
        env = "TASKBOARD_DATABASE_URL",
        default_value = "sqlite:./tasks.db?mode=rwc"
    )]
    pub database_url: String,

    /// Address to listen on.
    #[arg(long, env = "TASKBOARD_LISTEN", default_value = "127.0.0.1:5000")]
    pub listen: SocketAddr,

    /// Page size for list queries that do not ask for one.
    #[arg(long, env = "TASKBOARD_DEFAULT_PAGE_SIZE", default_value_t = 10)]
    pub default_page_size: u64,

    /// Largest page a list query may ask for.
    #[arg(long, env = "TASKBOARD_MAX_PAGE_SIZE", default_value_t = 50)]
    pub max_page_size: u64,

    /// Report constraint and database error details to clients instead of a
    /// generic message.
    #[arg(long, env = "TASKBOARD_INCLUDE_ERROR_DETAILS")]
    pub include_error_details: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::parse_from(["taskboard-server"]);
        assert_eq!(config.listen, "127.0.0.1:5000".parse().unwrap());
        assert_eq!(config.default_page_size, 10);
        assert_eq!(config.max_page_size, 50);
        assert!(!config.include_error_details);
    }

    #[test]
    fn flags_override_defaults() {
        let config = ServerConfig::parse_from([
            "taskboard-server",
            "--database-url",
            "sqlite::memory:",
            "--listen",
            "0.0.0.0:8080",
            "--include-error-details",
        ]);
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.listen.port(), 8080);
        assert!(config.include_error_details);
    }
}
