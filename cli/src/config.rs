//! Connection flags shared by every subcommand, with an env var fallback
//! chain (`PGHOST`/`PGPORT`/`PGDATABASE`/`PGUSER`/`PGPASSWORD`/`PGAPPNAME`).
//! `clap`'s `env` feature resolves the fallback;
//! `.env` loading happens once in `main` before argument parsing, via
//! `dotenvy::dotenv()`, which never overrides a variable already set in the
//! process environment.

use clap::Args;
use schemaplan_core::ConnectOptions;
use tokio::task::JoinHandle;
use tokio_postgres::Client;

use crate::error::CliError;

#[derive(Args, Debug, Clone)]
pub struct DbArgs {
    /// Database host
    #[arg(long, env = "PGHOST", default_value = "localhost")]
    pub host: String,

    /// Database port
    #[arg(long, env = "PGPORT", default_value_t = 5432)]
    pub port: u16,

    /// Database name
    #[arg(long = "db", env = "PGDATABASE")]
    pub database: String,

    /// Database user
    #[arg(long, env = "PGUSER")]
    pub user: String,

    /// Database password
    #[arg(long, env = "PGPASSWORD")]
    pub password: Option<String>,

    /// Application name reported to the server
    #[arg(long = "app-name", env = "PGAPPNAME")]
    pub app_name: Option<String>,

    /// Schema to operate on
    #[arg(long, default_value = "public")]
    pub schema: String,
}

impl DbArgs {
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            host: self.host.clone(),
            port: self.port,
            database: self.database.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            app_name: self.app_name.clone(),
            schema: self.schema.clone(),
        }
    }

    /// Connect and spawn the connection future: one connection per job,
    /// errors from the background connection future logged rather than
    /// silently dropped.
    pub async fn connect(&self) -> Result<(Client, JoinHandle<()>), CliError> {
        let mut pg_config = tokio_postgres::Config::new();
        pg_config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.database)
            .user(&self.user);
        if let Some(password) = &self.password {
            pg_config.password(password);
        }
        if let Some(app_name) = &self.app_name {
            pg_config.application_name(app_name);
        }

        let (client, connection) = pg_config.connect(tokio_postgres::NoTls).await?;
        let handle = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "database connection closed with error");
            }
        });
        Ok((client, handle))
    }
}
