//! Service context - dependency container for services
//!
//! Holds the stores, caches, collaborators, and the realtime bridge the
//! services need.

use std::sync::Arc;

use folio_cache::{ProfileCache, Publisher, RedisPool, ReplyCache};
use folio_common::{AppConfig, AppError, EngagementConfig, JwtService};
use folio_core::{
    AuthContext, CommentRepository, ContentValidator, Notification, NotificationSink, ProfileStore,
    ProjectRepository, ReactionLedger, Snowflake, SnowflakeGenerator,
};
use folio_db::{
    MemoryStore, PgCommentRepository, PgPool, PgProfileStore, PgProjectRepository,
    PgReactionLedger,
};
use tracing::{info, warn};

use super::error::{ServiceError, ServiceResult};
use super::notifier::{PubSubNotificationSink, TracingNotificationSink};
use super::reader::EngagementReader;
use super::validation::DefaultContentValidator;
use crate::dto::ViewDecorator;
use crate::realtime::{EventRelay, RealtimeBridge, RedisEventRelay};

/// Service context containing all dependencies
///
/// This is the main dependency container that gets passed to all services.
/// It provides access to:
/// - The reaction ledger and comment, project, and profile stores
/// - The profile and reply caches
/// - The realtime bridge
/// - Content validation and notification collaborators
/// - JWT service and Snowflake generator
#[derive(Clone)]
pub struct ServiceContext {
    // Stores
    ledger: Arc<dyn ReactionLedger>,
    comment_repo: Arc<dyn CommentRepository>,
    project_repo: Arc<dyn ProjectRepository>,

    // Caches
    profiles: Arc<ProfileCache>,
    replies: Arc<ReplyCache>,

    reader: EngagementReader,
    bridge: RealtimeBridge,

    // Collaborators
    validator: Arc<dyn ContentValidator>,
    notifier: Arc<dyn NotificationSink>,

    jwt_service: Arc<JwtService>,
    snowflake_generator: Arc<SnowflakeGenerator>,
    engagement: EngagementConfig,

    // Backends, for readiness checks
    pg_pool: Option<PgPool>,
    redis_pool: Option<RedisPool>,
}

impl ServiceContext {
    /// Wire a context from configuration
    ///
    /// Uses Postgres when a database is configured and the in-memory store
    /// otherwise. With Redis configured, change events are relayed and
    /// notifications published per user.
    pub async fn connect(config: &AppConfig) -> Result<Self, AppError> {
        let mut builder = ServiceContextBuilder::new()
            .engagement(config.engagement.clone())
            .jwt_service(Arc::new(JwtService::new(
                &config.jwt.secret,
                config.jwt.access_token_expiry,
            )))
            .snowflake_generator(Arc::new(SnowflakeGenerator::new(config.snowflake.worker_id)));

        builder = match &config.database {
            Some(db) => {
                info!("Connecting to PostgreSQL...");
                let pool = folio_db::connect(db)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                info!("PostgreSQL connection established");
                builder.postgres(pool)
            }
            None => {
                warn!("DATABASE_URL not set, using the in-memory store");
                builder.memory_store(MemoryStore::with_open_projects())
            }
        };

        if let Some(redis) = &config.redis {
            let pool = RedisPool::from_config(redis).map_err(|e| AppError::Cache(e.to_string()))?;
            let publisher = Publisher::new(pool.clone());
            info!("Redis pool created");
            builder = builder
                .redis_pool(pool)
                .relay(Arc::new(RedisEventRelay::new(publisher.clone())))
                .notifier(Arc::new(PubSubNotificationSink::new(publisher)));
        }

        builder.build().map_err(|e| AppError::Config(e.to_string()))
    }

    // === Stores ===

    pub fn ledger(&self) -> &dyn ReactionLedger {
        self.ledger.as_ref()
    }

    pub fn comment_repo(&self) -> &dyn CommentRepository {
        self.comment_repo.as_ref()
    }

    pub fn project_repo(&self) -> &dyn ProjectRepository {
        self.project_repo.as_ref()
    }

    // === Caches ===

    pub fn profiles(&self) -> &ProfileCache {
        &self.profiles
    }

    pub fn replies(&self) -> &ReplyCache {
        &self.replies
    }

    /// Shared read paths
    pub fn reader(&self) -> &EngagementReader {
        &self.reader
    }

    pub fn bridge(&self) -> &RealtimeBridge {
        &self.bridge
    }

    // === Collaborators ===

    pub fn validator(&self) -> &dyn ContentValidator {
        self.validator.as_ref()
    }

    pub fn notifier(&self) -> &dyn NotificationSink {
        self.notifier.as_ref()
    }

    pub fn jwt_service(&self) -> &JwtService {
        self.jwt_service.as_ref()
    }

    pub fn engagement(&self) -> &EngagementConfig {
        &self.engagement
    }

    /// Generate a new Snowflake ID
    pub fn generate_id(&self) -> Snowflake {
        self.snowflake_generator.generate()
    }

    pub fn pg_pool(&self) -> Option<&PgPool> {
        self.pg_pool.as_ref()
    }

    pub fn redis_pool(&self) -> Option<&RedisPool> {
        self.redis_pool.as_ref()
    }

    /// Send the acknowledgement or failure message for a mutating call
    pub(crate) async fn report<T>(
        &self,
        auth: &AuthContext,
        result: &ServiceResult<T>,
        success: &str,
    ) {
        let notification = match result {
            Ok(_) => Notification::success(auth.user_id(), success),
            Err(e) => Notification::failure(auth.user_id(), e.user_message()),
        };
        self.notifier.notify(notification).await;
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("stores", &"...")
            .field("profiles", &self.profiles)
            .field("replies", &self.replies.len())
            .field("bridge", &self.bridge)
            .field("postgres", &self.pg_pool.is_some())
            .field("redis", &self.redis_pool.is_some())
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
#[derive(Default)]
pub struct ServiceContextBuilder {
    ledger: Option<Arc<dyn ReactionLedger>>,
    comment_repo: Option<Arc<dyn CommentRepository>>,
    project_repo: Option<Arc<dyn ProjectRepository>>,
    profile_store: Option<Arc<dyn ProfileStore>>,
    validator: Option<Arc<dyn ContentValidator>>,
    notifier: Option<Arc<dyn NotificationSink>>,
    relay: Option<Arc<dyn EventRelay>>,
    jwt_service: Option<Arc<JwtService>>,
    snowflake_generator: Option<Arc<SnowflakeGenerator>>,
    engagement: Option<EngagementConfig>,
    pg_pool: Option<PgPool>,
    redis_pool: Option<RedisPool>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the Postgres repositories over `pool`
    pub fn postgres(mut self, pool: PgPool) -> Self {
        self.ledger = Some(Arc::new(PgReactionLedger::new(pool.clone())));
        self.comment_repo = Some(Arc::new(PgCommentRepository::new(pool.clone())));
        self.project_repo = Some(Arc::new(PgProjectRepository::new(pool.clone())));
        self.profile_store = Some(Arc::new(PgProfileStore::new(pool.clone())));
        self.pg_pool = Some(pool);
        self
    }

    /// Use one in-memory store for every repository
    pub fn memory_store(mut self, store: MemoryStore) -> Self {
        self.ledger = Some(Arc::new(store.clone()));
        self.comment_repo = Some(Arc::new(store.clone()));
        self.project_repo = Some(Arc::new(store.clone()));
        self.profile_store = Some(Arc::new(store));
        self
    }

    pub fn ledger(mut self, ledger: Arc<dyn ReactionLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn comment_repo(mut self, repo: Arc<dyn CommentRepository>) -> Self {
        self.comment_repo = Some(repo);
        self
    }

    pub fn project_repo(mut self, repo: Arc<dyn ProjectRepository>) -> Self {
        self.project_repo = Some(repo);
        self
    }

    pub fn profile_store(mut self, store: Arc<dyn ProfileStore>) -> Self {
        self.profile_store = Some(store);
        self
    }

    pub fn validator(mut self, validator: Arc<dyn ContentValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn relay(mut self, relay: Arc<dyn EventRelay>) -> Self {
        self.relay = Some(relay);
        self
    }

    pub fn jwt_service(mut self, service: Arc<JwtService>) -> Self {
        self.jwt_service = Some(service);
        self
    }

    pub fn snowflake_generator(mut self, generator: Arc<SnowflakeGenerator>) -> Self {
        self.snowflake_generator = Some(generator);
        self
    }

    pub fn engagement(mut self, config: EngagementConfig) -> Self {
        self.engagement = Some(config);
        self
    }

    pub fn redis_pool(mut self, pool: RedisPool) -> Self {
        self.redis_pool = Some(pool);
        self
    }

    /// Build the ServiceContext
    ///
    /// Validator, notifier, generator, and engagement settings fall back to
    /// defaults.
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if a store or the JWT service is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        let ledger = self
            .ledger
            .ok_or_else(|| ServiceError::validation("ledger is required"))?;
        let comment_repo = self
            .comment_repo
            .ok_or_else(|| ServiceError::validation("comment_repo is required"))?;
        let project_repo = self
            .project_repo
            .ok_or_else(|| ServiceError::validation("project_repo is required"))?;
        let profile_store = self
            .profile_store
            .ok_or_else(|| ServiceError::validation("profile_store is required"))?;
        let jwt_service = self
            .jwt_service
            .ok_or_else(|| ServiceError::validation("jwt_service is required"))?;

        let engagement = self.engagement.unwrap_or_default();
        let validator = self
            .validator
            .unwrap_or_else(|| Arc::new(DefaultContentValidator::from_config(&engagement)));
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(TracingNotificationSink));
        let snowflake_generator = self
            .snowflake_generator
            .unwrap_or_else(|| Arc::new(SnowflakeGenerator::new(0)));

        let profiles = Arc::new(ProfileCache::new(profile_store, engagement.profile_ttl()));
        let replies = Arc::new(ReplyCache::new(engagement.reply_cache_ttl()));
        let reader = EngagementReader::new(
            ledger.clone(),
            comment_repo.clone(),
            project_repo.clone(),
            replies.clone(),
            ViewDecorator::new(profiles.clone(), engagement.max_reply_depth),
        );
        let bridge = match self.relay {
            Some(relay) => RealtimeBridge::with_relay(reader.clone(), engagement.realtime_buffer, relay),
            None => RealtimeBridge::new(reader.clone(), engagement.realtime_buffer),
        };

        Ok(ServiceContext {
            ledger,
            comment_repo,
            project_repo,
            profiles,
            replies,
            reader,
            bridge,
            validator,
            notifier,
            jwt_service,
            snowflake_generator,
            engagement,
            pg_pool: self.pg_pool,
            redis_pool: self.redis_pool,
        })
    }
}
