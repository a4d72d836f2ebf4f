//! Guarded fragment factories.
//!
//! Fragment definitions sometimes depend on ambient context, for example
//! per-tenant seed data that only exists for one site. A factory registered
//! here never fails its caller: if producing the fragments returns an error
//! or panics, the load resolves to [`FragmentLoad::Fallback`] and the caller
//! gets an empty fragment mapping.
//!
//! ```rust
//! use prax_fragments::{FragmentDefinitions, SelectionRequest, define_fragments};
//!
//! # futures::executor::block_on(async {
//! let user_fragments = define_fragments::<&'static str>().register(|site: &'static str| async move {
//!     if site != "main" {
//!         return Err("site has no seeded roles");
//!     }
//!     Ok(FragmentDefinitions::new().define("basics", SelectionRequest::new().field("id", true)))
//! });
//!
//! assert!(user_fragments.load("main").await.is_loaded());
//! assert!(user_fragments.call("docs").await.is_empty());
//! # });
//! ```

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::warn;

use crate::config::{FallbackConfig, SelectionConfig};
use crate::error::SelectionResult;
use crate::fragments::FragmentDefinitions;
use crate::selector::Selector;

/// Boxed error returned by fragment sources.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Something that can produce fragment definitions for a context.
#[async_trait]
pub trait FragmentSource<C: Send + 'static>: Send + Sync {
    /// Build the fragment definitions for `context`.
    async fn fragments(&self, context: C) -> Result<FragmentDefinitions, BoxError>;
}

/// Type alias for boxed factory closures.
pub type FactoryFn<C> =
    Arc<dyn Fn(C) -> BoxFuture<'static, Result<FragmentDefinitions, BoxError>> + Send + Sync>;

/// A [`FragmentSource`] backed by an async closure.
pub struct FnSource<C> {
    factory: FactoryFn<C>,
}

impl<C: Send + 'static> FnSource<C> {
    /// Wrap an async closure.
    pub fn new<F, Fut, E>(f: F) -> Self
    where
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<FragmentDefinitions, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        Self {
            factory: Arc::new(move |context: C| {
                let fut = f(context);
                async move { fut.await.map_err(Into::<BoxError>::into) }.boxed()
            }),
        }
    }
}

impl<C> fmt::Debug for FnSource<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSource").finish()
    }
}

#[async_trait]
impl<C: Send + 'static> FragmentSource<C> for FnSource<C> {
    async fn fragments(&self, context: C) -> Result<FragmentDefinitions, BoxError> {
        (self.factory)(context).await
    }
}

/// Outcome of a guarded load.
#[derive(Debug, Clone, PartialEq)]
pub enum FragmentLoad {
    /// The factory succeeded.
    Loaded(FragmentDefinitions),
    /// The factory failed; the caller gets no fragments.
    Fallback {
        /// What went wrong, for diagnostics only.
        reason: String,
    },
}

impl FragmentLoad {
    /// Whether the factory succeeded.
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// Whether the fallback was used.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    /// The loaded definitions, if any.
    pub fn definitions(&self) -> Option<&FragmentDefinitions> {
        match self {
            Self::Loaded(definitions) => Some(definitions),
            Self::Fallback { .. } => None,
        }
    }

    /// The swallowed failure, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Loaded(_) => None,
            Self::Fallback { reason } => Some(reason),
        }
    }

    /// The loaded definitions, or an empty mapping on fallback.
    pub fn into_definitions(self) -> FragmentDefinitions {
        match self {
            Self::Loaded(definitions) => definitions,
            Self::Fallback { .. } => FragmentDefinitions::new(),
        }
    }
}

/// Entry point for registering guarded factories for context type `C`.
pub struct FragmentRegistry<C> {
    fallback: FallbackConfig,
    _context: PhantomData<fn(C)>,
}

/// Start defining guarded fragment factories for context type `C`.
pub fn define_fragments<C: Send + 'static>() -> FragmentRegistry<C> {
    FragmentRegistry {
        fallback: FallbackConfig::default(),
        _context: PhantomData,
    }
}

impl<C: Send + 'static> FragmentRegistry<C> {
    /// Apply the `[fallback]` section of a configuration.
    pub fn with_config(mut self, config: &SelectionConfig) -> Self {
        self.fallback = config.fallback.clone();
        self
    }

    /// Log swallowed failures at `warn`.
    pub fn log_failures(mut self, log: bool) -> Self {
        self.fallback.log = log;
        self
    }

    /// Guard an async closure.
    pub fn register<F, Fut, E>(self, factory: F) -> GuardedFactory<C>
    where
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<FragmentDefinitions, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        self.register_source(FnSource::new(factory))
    }

    /// Guard any [`FragmentSource`].
    pub fn register_source(self, source: impl FragmentSource<C> + 'static) -> GuardedFactory<C> {
        GuardedFactory {
            source: Arc::new(source),
            fallback: self.fallback,
        }
    }
}

impl<C> fmt::Debug for FragmentRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FragmentRegistry")
            .field("fallback", &self.fallback)
            .finish()
    }
}

/// A fragment factory whose failures degrade to an empty mapping.
pub struct GuardedFactory<C: Send + 'static> {
    source: Arc<dyn FragmentSource<C>>,
    fallback: FallbackConfig,
}

impl<C: Send + 'static> GuardedFactory<C> {
    /// Run the factory, converting any error or panic into a fallback.
    pub async fn load(&self, context: C) -> FragmentLoad {
        let reason = match panic::catch_unwind(AssertUnwindSafe(|| self.source.fragments(context)))
        {
            Ok(fut) => match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(Ok(definitions)) => return FragmentLoad::Loaded(definitions),
                Ok(Err(error)) => error.to_string(),
                Err(payload) => panic_message(payload.as_ref()),
            },
            Err(payload) => panic_message(payload.as_ref()),
        };

        if self.fallback.log {
            warn!(error = %reason, "Error initializing selection fragments, using none");
        }
        FragmentLoad::Fallback { reason }
    }

    /// Run the factory and return its definitions, or none on failure.
    pub async fn call(&self, context: C) -> FragmentDefinitions {
        self.load(context).await.into_definitions()
    }

    /// Run the factory and build a [`Selector`] from the result.
    ///
    /// A failed factory yields an empty selector; only expansion errors
    /// (reference cycles under [`CyclePolicy::Reject`](crate::CyclePolicy::Reject))
    /// are returned.
    pub async fn load_selector(
        &self,
        context: C,
        config: &SelectionConfig,
    ) -> SelectionResult<Selector> {
        let definitions = self.call(context).await;
        Selector::with_config(&definitions, config)
    }
}

impl<C: Send + 'static> Clone for GuardedFactory<C> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            fallback: self.fallback.clone(),
        }
    }
}

impl<C: Send + 'static> fmt::Debug for GuardedFactory<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardedFactory")
            .field("fallback", &self.fallback)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}
