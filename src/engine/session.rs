//! Everything a command needs to talk to the API

use crate::Context;
use crate::config::{ApiConfig, Config, Credentials};
use crate::progress;
use crate::resource::HttpItemCodec;
use crate::state::ItemState;
use anyhow::{Context as AnyhowContext, Result, bail};
use declarative::Reconciler;
use std::path::PathBuf;
use zabbix::{Client, ClientConfig, RetryConfig};

/// Loaded configuration, state and an authenticated client
pub struct Session {
    pub config: Config,
    pub state: ItemState,
    pub state_path: PathBuf,
    pub codec: HttpItemCodec,
    pub client: Client,
}

impl Session {
    /// Load config and state, then connect
    pub fn open(ctx: &Context) -> Result<Self> {
        let config_path = Config::path(ctx.config_path.as_deref())?;
        let config = Config::load(&config_path)?;
        let state_path = ItemState::path(ctx.state_path.as_deref())?;
        let state = ItemState::load(&state_path)?;
        let client = connect(&config.api, ctx.quiet)?;
        Ok(Self {
            config,
            state,
            state_path,
            codec: HttpItemCodec::new(),
            client,
        })
    }

    pub fn reconciler(&self) -> Reconciler<'_, HttpItemCodec, Client> {
        Reconciler::new(&self.codec, &self.client)
    }

    pub fn save_state(&mut self) -> Result<()> {
        self.state.save(&self.state_path)
    }
}

/// Build a client from `[api]` and authenticate it
pub fn connect(api: &ApiConfig, quiet: bool) -> Result<Client> {
    if api.url.trim().is_empty() {
        bail!("[api] url is not set in the config file");
    }
    let client_config = ClientConfig::new(api.url.trim())
        .timeout(api.timeout())
        .retry(RetryConfig::with_attempts(api.max_attempts))
        .token_placement(api.token_placement());
    let client = Client::new(client_config);

    match api.credentials()? {
        Credentials::Token(token) => Ok(client.with_token(token)),
        Credentials::Login { username, password } => {
            let mut client = client;
            let pb = (!quiet).then(|| progress::spinner(&format!("Logging in as {username}...")));
            let result = client.login(&username, &password);
            if let Some(pb) = pb {
                match &result {
                    Ok(()) => progress::finish_success(&pb, &format!("Logged in as {username}")),
                    Err(_) => progress::finish_error(&pb, "Login failed"),
                }
            }
            result
                .map_err(explain)
                .with_context(|| format!("Login to {} failed", api.url))?;
            Ok(client)
        }
    }
}

/// Attach the category's advice to an API client error
pub fn explain(err: zabbix::Error) -> anyhow::Error {
    let category = err.category();
    anyhow::Error::new(err).context(format!(
        "{}. {}",
        category.description(),
        category.advice()
    ))
}
