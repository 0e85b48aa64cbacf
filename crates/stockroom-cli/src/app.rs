//! Command handlers.
//!
//! Each invocation loads the cookie jar, runs one command against the
//! backend and saves the jar again, so the backend session outlives the
//! process the same way browser cookies outlive a page load.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use stockroom_core::{
    ApiClient, ApiResponse, AuthStatus, Config, CookieJar, Method, Navigation, RequestOptions,
    ResponseData, Router, SessionGuard,
};
use tracing::{info, warn};

use crate::cli::Command;
use crate::keychain;

pub struct App {
    config: Config,
    cookies: Arc<CookieJar>,
    cookie_path: PathBuf,
    session: SessionGuard,
    router: Router,
}

impl App {
    pub fn new() -> Result<Self> {
        let mut config = Config::load()?;
        config.apply_env_overrides();

        let cookie_path = config.cookie_path()?;
        Self::with_config(config, cookie_path)
    }

    /// Build against an explicit config and cookie file
    pub fn with_config(config: Config, cookie_path: PathBuf) -> Result<Self> {
        let cookies = Arc::new(CookieJar::load(&cookie_path)?);
        let api = ApiClient::new(&config, cookies.clone()).context("Failed to create API client")?;

        Ok(Self {
            config,
            cookies,
            cookie_path,
            session: SessionGuard::new(api),
            router: Router::default(),
        })
    }

    /// Run one command, then save the cookie jar whatever the outcome
    pub async fn run(&mut self, command: Command) -> Result<()> {
        let result = self.dispatch(command).await;

        if let Err(e) = self.cookies.save(&self.cookie_path) {
            warn!(error = %e, "Failed to save cookies");
        }
        result
    }

    async fn dispatch(&mut self, command: Command) -> Result<()> {
        let response = match command {
            Command::Login { username, remember } => return self.login(username, remember).await,
            Command::Logout { forget } => return self.logout(forget).await,
            Command::Whoami => return self.whoami().await,
            Command::Open { path } => return self.open(&path).await,
            Command::Routes => {
                self.print_routes();
                return Ok(());
            }
            Command::Get { url } => self.api().get(&url, RequestOptions::new()).await?,
            Command::Post { url, body: Some(body) } => {
                self.api().post(&url, &body, RequestOptions::new()).await?
            }
            Command::Post { url, body: None } => {
                self.api()
                    .request(&url, RequestOptions::new().method(Method::POST))
                    .await?
            }
            Command::Put { url, body } => {
                let body = body.unwrap_or_default();
                self.api().put(&url, &body, RequestOptions::new()).await?
            }
            Command::Patch { url, body } => {
                let body = body.unwrap_or_default();
                self.api().patch(&url, &body, RequestOptions::new()).await?
            }
            Command::Delete { url } => self.api().delete(&url, RequestOptions::new()).await?,
        };
        print_response(&response)
    }

    fn api(&self) -> &ApiClient {
        self.session.api()
    }

    async fn login(&mut self, username: Option<String>, remember: bool) -> Result<()> {
        let username = match username {
            Some(username) => username,
            None => prompt_username(self.config.last_username.as_deref())?,
        };
        if username.is_empty() {
            anyhow::bail!("Username required");
        }

        let password = match keychain::remembered_password(&username) {
            Some(password) if confirm("Use stored password? [Y/n]: ")? => password,
            _ => rpassword::prompt_password("Password: ")?,
        };

        eprintln!("Authenticating...");
        match self.session.login(&username, &password).await {
            Ok(user) => {
                if remember {
                    if let Err(e) = keychain::remember(&username, &password) {
                        warn!(error = %e, "Failed to store credentials");
                    }
                }

                self.config.last_username = Some(username.clone());
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }

                let name = user.map(|u| u.display_name()).unwrap_or(username);
                println!("Logged in as {}", name);
                Ok(())
            }
            Err(e) => {
                info!(error = %e, "Login failed");
                anyhow::bail!("Login failed: {}", e.user_message())
            }
        }
    }

    async fn logout(&mut self, forget: bool) -> Result<()> {
        if forget {
            if let Some(ref username) = self.config.last_username {
                if let Err(e) = keychain::forget(username) {
                    warn!(error = %e, "Failed to delete stored credentials");
                }
            }
        }

        match self.session.logout().await {
            Ok(()) => {
                println!("Logged out");
                Ok(())
            }
            Err(e) => anyhow::bail!("Logout failed: {}", e.user_message()),
        }
    }

    async fn whoami(&self) -> Result<()> {
        match self.session.check_auth().await {
            AuthStatus::Authenticated => {
                let state = self.session.state();
                match state.current_user {
                    Some(user) => {
                        println!("{}", user.display_name());
                        println!("{}", serde_json::to_string_pretty(&user)?);
                    }
                    None => println!("Authenticated"),
                }
                Ok(())
            }
            _ => anyhow::bail!("Not logged in"),
        }
    }

    async fn open(&self, path: &str) -> Result<()> {
        match self.router.navigate(&self.session, path).await? {
            Navigation::Allowed(route) => {
                println!("{} ({})", route.name, route.path);
            }
            Navigation::Redirected { from, to } => {
                println!(
                    "{} requires login; redirected to {} ({})",
                    from.path, to.name, to.path
                );
            }
        }
        Ok(())
    }

    fn print_routes(&self) {
        for route in self.router.routes() {
            let access = if route.requires_auth { "login required" } else { "public" };
            println!("{:<28} {:<26} {}", route.path, route.name, access);
        }
    }
}

fn print_response(response: &ApiResponse) -> Result<()> {
    println!("{}", response.status);
    match &response.data {
        ResponseData::Json(value) => println!("{}", serde_json::to_string_pretty(value)?),
        ResponseData::Text(text) => println!("{}", text),
    }
    if !response.ok {
        anyhow::bail!("Request failed with status {}", response.status);
    }
    Ok(())
}

fn prompt_username(last: Option<&str>) -> Result<String> {
    match last {
        Some(last) => print!("Username [{}]: ", last),
        None => print!("Username: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    Ok(match (input.is_empty(), last) {
        (true, Some(last)) => last.to_string(),
        _ => input.to_string(),
    })
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_lowercase() != "n")
}
