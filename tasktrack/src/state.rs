//! Application state management

use std::sync::Arc;

use crate::auth::{Argon2Hasher, JwtSigner, PasswordHasher, TokenSigner};
use crate::config::Config;
use crate::error::Result;
use crate::observability;
use crate::pipeline::Dispatcher;
use crate::repository::{MemoryTaskRepository, MemoryUserRepository, TaskRepository, UserRepository};
use crate::service::{Deadline, TaskService, UserService};

/// Application state shared across routes
///
/// Everything inside is reference counted, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    users: UserService,
    tasks: TaskService,
    signer: Arc<dyn TokenSigner>,
    dispatcher: Dispatcher,
}

impl AppState {
    /// Create a new builder for AppState
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn users(&self) -> &UserService {
        &self.users
    }

    pub fn tasks(&self) -> &TaskService {
        &self.tasks
    }

    /// Verifier used by the auth middleware
    pub fn signer(&self) -> Arc<dyn TokenSigner> {
        self.signer.clone()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

/// Builder for AppState
///
/// Collaborators not supplied are built from the configuration: in-memory
/// repositories, Argon2id hashing and an HS256 signer.
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<Config>,
    user_repository: Option<Arc<dyn UserRepository>>,
    task_repository: Option<Arc<dyn TaskRepository>>,
    hasher: Option<Arc<dyn PasswordHasher>>,
    signer: Option<Arc<dyn TokenSigner>>,
    root_span: Option<tracing::Span>,
}

impl AppStateBuilder {
    /// Create a new builder; config falls back to `Config::default()`
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn user_repository(mut self, repository: Arc<dyn UserRepository>) -> Self {
        self.user_repository = Some(repository);
        self
    }

    pub fn task_repository(mut self, repository: Arc<dyn TaskRepository>) -> Self {
        self.task_repository = Some(repository);
        self
    }

    pub fn password_hasher(mut self, hasher: Arc<dyn PasswordHasher>) -> Self {
        self.hasher = Some(hasher);
        self
    }

    pub fn token_signer(mut self, signer: Arc<dyn TokenSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Span request log lines are parented to
    pub fn root_span(mut self, span: tracing::Span) -> Self {
        self.root_span = Some(span);
        self
    }

    /// Build the AppState
    ///
    /// Fails when a default collaborator cannot be built from the
    /// configuration, e.g. an empty JWT secret.
    pub fn build(self) -> Result<AppState> {
        let config = self.config.unwrap_or_default();

        let signer: Arc<dyn TokenSigner> = match self.signer {
            Some(signer) => signer,
            None => Arc::new(JwtSigner::new(&config.auth.jwt)?),
        };
        let hasher: Arc<dyn PasswordHasher> = match self.hasher {
            Some(hasher) => hasher,
            None => Arc::new(Argon2Hasher::new(&config.auth.password)?),
        };
        let user_repository: Arc<dyn UserRepository> = match self.user_repository {
            Some(repository) => repository,
            None => Arc::new(MemoryUserRepository::new()),
        };
        let task_repository: Arc<dyn TaskRepository> = match self.task_repository {
            Some(repository) => repository,
            None => Arc::new(MemoryTaskRepository::new()),
        };

        let deadline = Deadline::new(config.service.request_timeout());
        let users = UserService::new(user_repository, hasher, signer.clone(), deadline)
            .with_token_policy(config.auth.jwt.issuer.clone(), config.auth.jwt.expiry());
        let tasks = TaskService::new(task_repository, deadline);

        let root = self
            .root_span
            .unwrap_or_else(|| observability::service_span(&config));

        Ok(AppState {
            config: Arc::new(config),
            users,
            tasks,
            signer,
            dispatcher: Dispatcher::new(root),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_default_config_needs_a_secret() {
        let result = AppState::builder().build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_build_with_secret() {
        let mut config = Config::default();
        config.auth.jwt.secret = "state-secret".into();
        config.service.request_timeout_secs = 3;

        let state = AppState::builder().config(config).build().unwrap();
        assert_eq!(state.config().auth.jwt.secret, "state-secret");
        assert_eq!(state.config().service.request_timeout_secs, 3);
    }
}
