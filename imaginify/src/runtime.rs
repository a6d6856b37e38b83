//! Runtime wiring: one store connection shared by the resolver and ledger,
//! plus the chat service.

use std::sync::Arc;
use std::time::Duration;

use iaccount::{
    AccountHooks, CreditLedger, CreditPolicy, IdentityProvider, IdentityResolver,
    NoopViewInvalidator, UserStore, UserStoreConfig, ViewInvalidator, create_user_store,
};
use ichat::{ChatService, HistoryPolicy, PrimingScript};
use iobserve::{SafeAccountHooks, TracingObservabilityHooks};
use iprovider::GenerativeBackend;
use tokio::sync::OnceCell;

use crate::providers::{ProviderBuildConfig, build_clerk_identity_provider, build_gemini_backend};
use crate::{ImaginifyConfig, ImaginifyError};

/// Account services bound to a single store connection.
#[derive(Clone)]
pub struct AccountServices {
    pub store: Arc<dyn UserStore>,
    pub resolver: IdentityResolver,
    pub ledger: CreditLedger,
}

pub struct Runtime {
    store_config: UserStoreConfig,
    identity: Arc<dyn IdentityProvider>,
    account_hooks: Arc<dyn AccountHooks>,
    view_invalidator: Arc<dyn ViewInvalidator>,
    credit_policy: CreditPolicy,
    accounts: OnceCell<AccountServices>,
    chat: ChatService,
}

impl Runtime {
    pub fn builder(
        backend: Arc<dyn GenerativeBackend>,
        identity: Arc<dyn IdentityProvider>,
    ) -> RuntimeBuilder {
        RuntimeBuilder::new(backend, identity)
    }

    /// Wires the Gemini backend and Clerk identity provider from `config`.
    /// Both keys are required.
    pub fn from_config(config: ImaginifyConfig) -> Result<Self, ImaginifyError> {
        let gemini_key = config.gemini_api_key.as_ref().ok_or_else(|| {
            ImaginifyError::configuration("GEMINI_API_KEY (or GOOGLE_API_KEY) is not set")
        })?;
        let clerk_key = config
            .clerk_secret_key
            .as_ref()
            .ok_or_else(|| ImaginifyError::configuration("CLERK_SECRET_KEY is not set"))?;

        let mut gemini = ProviderBuildConfig::new(gemini_key.expose())
            .with_timeout(config.provider_timeout);
        if let Some(base_url) = &config.gemini_api_base {
            gemini = gemini.with_base_url(base_url.clone());
        }
        let mut clerk =
            ProviderBuildConfig::new(clerk_key.expose()).with_timeout(config.provider_timeout);
        if let Some(base_url) = &config.clerk_api_base {
            clerk = clerk.with_base_url(base_url.clone());
        }

        let mut builder = Self::builder(
            build_gemini_backend(gemini)?,
            build_clerk_identity_provider(clerk)?,
        )
        .store(config.store)
        .credit_policy(config.credit_policy)
        .model(config.gemini_model)
        .history_policy(config.history_policy);

        if let Some(path) = &config.priming_path {
            builder = builder.priming(PrimingScript::from_path(path)?);
        }

        builder.build()
    }

    pub fn chat(&self) -> &ChatService {
        &self.chat
    }

    pub fn is_connected(&self) -> bool {
        self.accounts.initialized()
    }

    /// Connects the store on first use; later calls reuse the same connection.
    pub async fn accounts(&self) -> Result<&AccountServices, ImaginifyError> {
        self.accounts
            .get_or_try_init(|| async {
                let store = create_user_store(self.store_config.clone())?;
                tracing::info!(phase = "runtime", event = "store_connected", "user store connected");

                let resolver = IdentityResolver::new(Arc::clone(&store), Arc::clone(&self.identity))
                    .with_hooks(Arc::clone(&self.account_hooks))
                    .with_view_invalidator(Arc::clone(&self.view_invalidator));
                let ledger = CreditLedger::new(resolver.clone()).with_policy(self.credit_policy);

                Ok::<_, ImaginifyError>(AccountServices {
                    store,
                    resolver,
                    ledger,
                })
            })
            .await
    }

    pub async fn resolver(&self) -> Result<IdentityResolver, ImaginifyError> {
        Ok(self.accounts().await?.resolver.clone())
    }

    pub async fn ledger(&self) -> Result<CreditLedger, ImaginifyError> {
        Ok(self.accounts().await?.ledger.clone())
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("store_config", &self.store_config)
            .field("credit_policy", &self.credit_policy)
            .field("connected", &self.is_connected())
            .field("chat", &self.chat)
            .finish()
    }
}

pub struct RuntimeBuilder {
    backend: Arc<dyn GenerativeBackend>,
    identity: Arc<dyn IdentityProvider>,
    store_config: UserStoreConfig,
    account_hooks: Arc<dyn AccountHooks>,
    view_invalidator: Arc<dyn ViewInvalidator>,
    credit_policy: CreditPolicy,
    model: Option<String>,
    priming: Option<PrimingScript>,
    history_policy: HistoryPolicy,
    turn_timeout: Option<Duration>,
}

impl RuntimeBuilder {
    pub fn new(backend: Arc<dyn GenerativeBackend>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            backend,
            identity,
            store_config: UserStoreConfig::default(),
            account_hooks: Arc::new(SafeAccountHooks::new(TracingObservabilityHooks)),
            view_invalidator: Arc::new(NoopViewInvalidator),
            credit_policy: CreditPolicy::default(),
            model: None,
            priming: None,
            history_policy: HistoryPolicy::uncapped(),
            turn_timeout: None,
        }
    }

    pub fn store(mut self, store_config: UserStoreConfig) -> Self {
        self.store_config = store_config;
        self
    }

    pub fn account_hooks(mut self, account_hooks: Arc<dyn AccountHooks>) -> Self {
        self.account_hooks = account_hooks;
        self
    }

    pub fn view_invalidator(mut self, view_invalidator: Arc<dyn ViewInvalidator>) -> Self {
        self.view_invalidator = view_invalidator;
        self
    }

    pub fn credit_policy(mut self, credit_policy: CreditPolicy) -> Self {
        self.credit_policy = credit_policy;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn priming(mut self, priming: PrimingScript) -> Self {
        self.priming = Some(priming);
        self
    }

    pub fn history_policy(mut self, history_policy: HistoryPolicy) -> Self {
        self.history_policy = history_policy;
        self
    }

    pub fn turn_timeout(mut self, turn_timeout: Duration) -> Self {
        self.turn_timeout = Some(turn_timeout);
        self
    }

    pub fn build(self) -> Result<Runtime, ImaginifyError> {
        let mut chat = ChatService::builder(self.backend).history_policy(self.history_policy);
        if let Some(model) = self.model {
            chat = chat.model(model);
        }
        if let Some(priming) = self.priming {
            chat = chat.priming(priming);
        }
        if let Some(turn_timeout) = self.turn_timeout {
            chat = chat.turn_timeout(turn_timeout);
        }

        Ok(Runtime {
            store_config: self.store_config,
            identity: self.identity,
            account_hooks: self.account_hooks,
            view_invalidator: self.view_invalidator,
            credit_policy: self.credit_policy,
            accounts: OnceCell::new(),
            chat: chat.build()?,
        })
    }
}
