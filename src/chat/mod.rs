//! End-to-end turn pipeline.

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ChatConfig;
use crate::error::Result;
use crate::models::{ModelDescriptor, ModelRegistry};
use crate::reconcile::{reconcile, TextAccumulator, TextStream};
use crate::request::{build_request, RequestOptions, RequestPlan};
use crate::routing::classify;
use crate::transport::{HttpTransport, Transport};
use crate::types::{ChatCompletion, ConversationTurn};
use crate::usage::UsageTracker;

/// Routes, builds, sends and reconciles conversation turns.
///
/// Usage is recorded only for turns that complete; a failed or cancelled
/// turn leaves the tracker untouched.
///
/// ```no_run
/// use chatroute::chat::ChatClient;
/// use chatroute::config::ChatConfig;
/// use chatroute::models::KnownModel;
/// use chatroute::types::{ChatMessage, ConversationTurn};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn run() -> chatroute::error::Result<()> {
/// let client = ChatClient::from_config(ChatConfig::from_env()?)?;
/// let turn = ConversationTurn::builder()
///     .messages(vec![ChatMessage::user("What is 2+2?")])
///     .model(KnownModel::Gpt41.descriptor())
///     .build();
/// let done = client.complete(&turn, CancellationToken::new()).await?;
/// println!("{}", done.text);
/// # Ok(())
/// # }
/// ```
pub struct ChatClient<T: Transport = HttpTransport> {
    config: ChatConfig,
    registry: ModelRegistry,
    transport: T,
    usage: Option<UsageTracker>,
    options: RequestOptions,
}

impl ChatClient<HttpTransport> {
    /// Client over HTTP using the built-in model catalogue.
    pub fn from_config(config: ChatConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::new(config, transport))
    }
}

impl<T: Transport> ChatClient<T> {
    pub fn new(config: ChatConfig, transport: T) -> Self {
        let options = RequestOptions::from(&config);
        Self {
            config,
            registry: ModelRegistry::builtin(),
            transport,
            usage: None,
            options,
        }
    }

    pub fn with_registry(mut self, registry: ModelRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_usage_tracker(mut self, tracker: UsageTracker) -> Self {
        self.usage = Some(tracker);
        self
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn usage(&self) -> Option<&UsageTracker> {
        self.usage.as_ref()
    }

    /// Classify and build without touching the network.
    pub fn plan(&self, turn: &ConversationTurn) -> Result<RequestPlan> {
        self.prepare(turn).map(|(plan, _)| plan)
    }

    /// Send the turn and return its text deltas. Usage is not recorded.
    pub async fn send(&self, turn: &ConversationTurn, cancel: CancellationToken) -> Result<TextStream> {
        let (plan, _) = self.prepare(turn)?;
        self.dispatch(&plan, cancel).await
    }

    /// Send the turn and return its deltas, recording a successful use of the
    /// model once the stream ends without error.
    pub async fn stream_and_record(
        &self,
        turn: &ConversationTurn,
        cancel: CancellationToken,
    ) -> Result<TextStream> {
        let (plan, model) = self.prepare(turn)?;
        let mut inner = self.dispatch(&plan, cancel).await?;
        let tracker = self.usage.clone();

        let stream = async_stream::stream! {
            let mut failed = false;
            while let Some(item) = inner.next().await {
                failed |= item.is_err();
                yield item;
            }
            if !failed {
                if let Some(tracker) = tracker {
                    tracker.record_successful_use(&model.id);
                }
            }
        };
        Ok(Box::pin(stream))
    }

    /// Send the turn and collect its full text.
    pub async fn complete(
        &self,
        turn: &ConversationTurn,
        cancel: CancellationToken,
    ) -> Result<ChatCompletion> {
        let (plan, model) = self.prepare(turn)?;
        let mut stream = self.dispatch(&plan, cancel).await?;

        let mut acc = TextAccumulator::new();
        while let Some(delta) = stream.next().await {
            acc.push(&delta?);
        }
        debug!(
            route = %plan.decision,
            model = %model.id,
            deltas = acc.delta_count(),
            "Turn completed"
        );

        if let Some(tracker) = &self.usage {
            tracker.record_successful_use(&model.id);
        }
        Ok(ChatCompletion {
            text: acc.into_text(),
            decision: plan.decision,
            model,
            streamed: plan.request.stream,
        })
    }

    fn prepare(&self, turn: &ConversationTurn) -> Result<(RequestPlan, ModelDescriptor)> {
        let model = self.registry.refresh_descriptor(&turn.model);
        let turn = ConversationTurn {
            model: model.clone(),
            ..turn.clone()
        };
        let decision = classify(&turn);
        let request = build_request(decision, &turn, &self.options)?;
        let plan = RequestPlan {
            decision,
            endpoint: self.config.endpoints.path_for(decision).to_string(),
            request,
        };
        Ok((plan, model))
    }

    async fn dispatch(&self, plan: &RequestPlan, cancel: CancellationToken) -> Result<TextStream> {
        info!(
            route = %plan.decision,
            endpoint = %plan.endpoint,
            model = %plan.request.model,
            stream = plan.request.stream,
            "Dispatching turn"
        );
        let response = self
            .transport
            .send(&plan.request, &plan.endpoint, &cancel)
            .await?;
        Ok(reconcile(response, cancel))
    }
}
