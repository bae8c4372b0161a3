use std::sync::Arc;

use chrono::{Duration, Utc};
use reqwest::Url;

use crate::{
    Res,
    error::Error,
    management::{
        CacheGateway, FlowStore,
        store::{PROVIDER_KEY, started_at_key, verifier_key},
    },
    provider::ProviderAdapter,
    types::{NormalizedAlbum, Provider, TokenResult},
    utils, warning,
};

/// Authorization codes are short-lived, older attempts are considered stale.
pub const DEFAULT_ATTEMPT_TTL_MINUTES: i64 = 10;

/// Where the login flow currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowStage {
    Idle,
    AwaitingRedirect(Provider),
    Exchanging(Provider),
    Fetching(Provider),
    Ready(Provider),
    Failed(String),
}

/// Which controls a front end should show for the current stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility {
    pub login: bool,
    pub loading: bool,
    pub pick_more: bool,
}

impl FlowStage {
    pub fn visibility(&self) -> Visibility {
        Visibility {
            login: matches!(self, FlowStage::Idle | FlowStage::Failed(_)),
            loading: matches!(self, FlowStage::Exchanging(_) | FlowStage::Fetching(_)),
            pick_more: matches!(self, FlowStage::Ready(_)),
        }
    }
}

/// Flow controller for one login attempt and the album library it yields.
///
/// Token, library and selection live here for the lifetime of the session
/// only; nothing but the in-flight verifier and the chosen provider touch the
/// [`FlowStore`].
///
/// ```text
/// Idle ──start_login──▶ AwaitingRedirect ──on_page_load(code)──▶ Exchanging
///                                                                   │
///          Failed ◀──────────── error ──────────── Fetching ◀───────┘
///                                                     │
///                              pick_more ⟲ Ready ◀────┘
/// ```
///
/// # Example
///
/// ```
/// let store = Arc::new(FileFlowStore::default_location());
/// let mut session = Session::new(store, 3)
///     .with_adapter(provider::adapter_from_env(Provider::Spotify)?);
///
/// let url = session.start_login(Provider::Spotify).await?;
/// // ... browser round trip, redirect carries ?code= ...
/// session.on_page_load(Some(&code)).await?;
/// print_albums(session.selection());
/// print_albums(session.pick_more()?);
/// ```
pub struct Session {
    store: Arc<dyn FlowStore>,
    adapters: Vec<Box<dyn ProviderAdapter>>,
    cache: Option<CacheGateway>,
    pick_count: usize,
    attempt_ttl: Duration,
    stage: FlowStage,
    token: Option<TokenResult>,
    library: Vec<NormalizedAlbum>,
    selection: Vec<NormalizedAlbum>,
}

impl Session {
    /// Creates an idle session without adapters or cache.
    ///
    /// # Arguments
    ///
    /// * `store` - Where the in-flight attempt survives the redirect
    /// * `pick_count` - Albums per selection
    pub fn new(store: Arc<dyn FlowStore>, pick_count: usize) -> Self {
        Self {
            store,
            adapters: Vec::new(),
            cache: None,
            pick_count,
            attempt_ttl: Duration::minutes(DEFAULT_ATTEMPT_TTL_MINUTES),
            stage: FlowStage::Idle,
            token: None,
            library: Vec::new(),
            selection: Vec::new(),
        }
    }

    /// Registers an adapter, replacing one already set for the same provider.
    pub fn with_adapter(mut self, adapter: Box<dyn ProviderAdapter>) -> Self {
        self.adapters.retain(|a| a.provider() != adapter.provider());
        self.adapters.push(adapter);
        self
    }

    /// Reads libraries through the album cache before asking the provider.
    pub fn with_cache(mut self, cache: CacheGateway) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Age after which a pending attempt is ignored. Defaults to
    /// [`DEFAULT_ATTEMPT_TTL_MINUTES`].
    pub fn with_attempt_ttl(mut self, ttl: Duration) -> Self {
        self.attempt_ttl = ttl;
        self
    }

    pub fn stage(&self) -> &FlowStage {
        &self.stage
    }

    pub fn visibility(&self) -> Visibility {
        self.stage.visibility()
    }

    pub fn token(&self) -> Option<&TokenResult> {
        self.token.as_ref()
    }

    pub fn library(&self) -> &[NormalizedAlbum] {
        &self.library
    }

    pub fn selection(&self) -> &[NormalizedAlbum] {
        &self.selection
    }

    pub fn pick_count(&self) -> usize {
        self.pick_count
    }

    fn adapter(&self, provider: Provider) -> Option<&dyn ProviderAdapter> {
        self.adapters
            .iter()
            .find(|a| a.provider() == provider)
            .map(|a| &**a)
    }

    /// Idle → AwaitingRedirect.
    ///
    /// Persists the provider choice and a fresh verifier scoped to that
    /// provider, then returns the URL to send the browser to. Adapters
    /// without PKCE get no verifier persisted.
    ///
    /// # Arguments
    ///
    /// * `provider` - Catalog to log in with, must have a registered adapter
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] - No adapter for `provider` or an invalid
    ///   authorization endpoint
    /// - [`Error::Store`] / [`Error::Io`] - The attempt could not be persisted
    pub async fn start_login(&mut self, provider: Provider) -> Res<Url> {
        let adapter = self.adapter(provider).ok_or_else(|| {
            Error::Config(format!("Provider {} is not configured", provider))
        })?;

        let verifier = utils::generate_code_verifier(utils::DEFAULT_VERIFIER_LENGTH)?;
        let challenge = utils::generate_code_challenge(&verifier);
        let url = adapter.authorization_url(&challenge)?;
        let uses_pkce = adapter.uses_pkce();

        if uses_pkce {
            self.store.set(&verifier_key(provider), &verifier).await?;
        } else {
            self.store.remove(&verifier_key(provider)).await?;
        }
        self.store
            .set(&started_at_key(provider), &Utc::now().timestamp().to_string())
            .await?;
        self.store.set(PROVIDER_KEY, provider.as_str()).await?;

        self.token = None;
        self.library.clear();
        self.selection.clear();
        self.stage = FlowStage::AwaitingRedirect(provider);
        Ok(url)
    }

    /// Entry point of every return navigation.
    ///
    /// Without a code any leftover attempt is cleared and the session is
    /// idle. With a code the persisted attempt is resumed; a missing, stale or
    /// unknown attempt is silently treated as no code at all.
    ///
    /// The attempt is read once: provider, verifier and start time are
    /// removed before the exchange, whatever its outcome.
    ///
    /// # Arguments
    ///
    /// * `code` - The `code` query parameter of the redirect, if any
    ///
    /// # Returns
    ///
    /// - `Ok(FlowStage::Ready(_))` - Library loaded and a first selection
    ///   picked
    /// - `Ok(FlowStage::Idle)` - Nothing to resume
    /// - `Err(Error::AuthExchange)` / `Err(Error::LibraryFetch)` - The stage
    ///   is now [`FlowStage::Failed`]
    pub async fn on_page_load(&mut self, code: Option<&str>) -> Res<&FlowStage> {
        match code.map(str::trim).filter(|c| !c.is_empty()) {
            None => {
                self.reset().await?;
                Ok(&self.stage)
            }
            Some(code) => self.resume(code).await,
        }
    }

    async fn resume(&mut self, code: &str) -> Res<&FlowStage> {
        let Some(provider) = self
            .store
            .get(PROVIDER_KEY)
            .await?
            .and_then(|p| p.parse::<Provider>().ok())
        else {
            self.reset().await?;
            return Ok(&self.stage);
        };

        let verifier = self.store.get(&verifier_key(provider)).await?;
        let started_at = self.store.get(&started_at_key(provider)).await?;

        // read once: the attempt is spent whatever happens next
        self.store.remove(PROVIDER_KEY).await?;
        self.store.remove(&verifier_key(provider)).await?;
        self.store.remove(&started_at_key(provider)).await?;

        let Some(uses_pkce) = self.adapter(provider).map(|a| a.uses_pkce()) else {
            self.reset().await?;
            return Ok(&self.stage);
        };
        if (uses_pkce && verifier.is_none()) || self.is_stale(started_at.as_deref()) {
            self.reset().await?;
            return Ok(&self.stage);
        }

        self.stage = FlowStage::Exchanging(provider);
        let mut token = match self.exchange(provider, code, verifier.as_deref()).await {
            Ok(token) => token,
            Err(e) => return Err(self.fail(e)),
        };

        self.stage = FlowStage::Fetching(provider);
        let library = match self.load_library(provider, &mut token).await {
            Ok(library) => library,
            Err(e) => return Err(self.fail(e)),
        };

        self.token = Some(token);
        self.library = library;
        self.stage = FlowStage::Ready(provider);
        self.selection = utils::pick_random(&self.library, self.pick_count);
        Ok(&self.stage)
    }

    /// Ready → Ready with a fresh selection. Never touches the network.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] outside [`FlowStage::Ready`].
    pub fn pick_more(&mut self) -> Res<&[NormalizedAlbum]> {
        if !matches!(self.stage, FlowStage::Ready(_)) {
            return Err(Error::InvalidState(
                "There is no album library to pick from yet".to_string(),
            ));
        }

        self.selection = utils::pick_random(&self.library, self.pick_count);
        Ok(&self.selection)
    }

    /// Forgets every in-flight attempt and returns to Idle.
    pub async fn reset(&mut self) -> Res<()> {
        self.store.remove(PROVIDER_KEY).await?;
        for provider in Provider::ALL {
            self.store.remove(&verifier_key(provider)).await?;
            self.store.remove(&started_at_key(provider)).await?;
        }

        self.token = None;
        self.library.clear();
        self.selection.clear();
        self.stage = FlowStage::Idle;
        Ok(())
    }

    fn is_stale(&self, started_at: Option<&str>) -> bool {
        let Some(started_at) = started_at.and_then(|s| s.parse::<i64>().ok()) else {
            return false;
        };
        Utc::now().timestamp() - started_at > self.attempt_ttl.num_seconds()
    }

    fn fail(&mut self, err: Error) -> Error {
        self.token = None;
        self.library.clear();
        self.selection.clear();
        self.stage = FlowStage::Failed(err.to_string());
        err
    }

    async fn exchange(
        &self,
        provider: Provider,
        code: &str,
        verifier: Option<&str>,
    ) -> Res<TokenResult> {
        let adapter = self.adapter(provider).ok_or_else(|| {
            Error::Config(format!("Provider {} is not configured", provider))
        })?;
        adapter.exchange_token(code, verifier).await
    }

    /// Library for `token`, from the cache when one is configured.
    ///
    /// The user id is resolved at most once and kept on the token so the
    /// direct fetch can reuse it.
    async fn load_library(
        &self,
        provider: Provider,
        token: &mut TokenResult,
    ) -> Res<Vec<NormalizedAlbum>> {
        let adapter = self.adapter(provider).ok_or_else(|| {
            Error::Config(format!("Provider {} is not configured", provider))
        })?;

        if let Some(cache) = &self.cache {
            if token.user_id.is_none() {
                token.user_id = adapter.resolve_user_id(token).await;
            }
            match Self::load_from_cache(cache, provider, token).await {
                Ok(Some(albums)) => return Ok(albums),
                Ok(None) => {}
                Err(e) => warning!("{}. Fetching from {} directly.", e, provider),
            }
        }

        adapter.fetch_library(token).await
    }

    /// Cache read, and on a miss exactly one sync followed by one re-read.
    ///
    /// `Ok(None)` means the cache cannot serve this user at all.
    async fn load_from_cache(
        cache: &CacheGateway,
        provider: Provider,
        token: &TokenResult,
    ) -> Res<Option<Vec<NormalizedAlbum>>> {
        let user_id = token.user_id.clone();

        if let Some(id) = &user_id {
            let albums = cache.albums(provider, id).await?;
            if !albums.is_empty() {
                return Ok(Some(albums));
            }
        }

        let synced = cache
            .sync(provider, &token.access_token, user_id.as_deref())
            .await?;

        match synced.or(user_id) {
            Some(id) => Ok(Some(cache.albums(provider, &id).await?)),
            None => Ok(None),
        }
    }
}
