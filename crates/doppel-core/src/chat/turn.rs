//! One conversational turn, from user message to displayed reply.
//!
//! `process` runs the full pipeline in order:
//! sweep, assemble context, generate, parse, execute directives, sweep,
//! append the exchange to history. A turn always completes before the next
//! one starts; the processor takes `&mut self`.

use tracing::{debug, info};

use doppel_types::chat::ChatEntry;
use doppel_types::directive::DirectiveOutcome;
use doppel_types::error::TurnError;
use doppel_types::memory::FactRecord;
use doppel_types::user::UserProfile;

use crate::clock::{Clock, SystemClock};
use crate::context::ContextAssembler;
use crate::directive::executor::DirectiveExecutor;
use crate::directive::parser::parse_reply;
use crate::directive::trigger::parse_user_input;
use crate::generator::Generator;
use crate::memory::store::MemoryStore;
use crate::repository::fact::FactRepository;
use crate::repository::history::HistoryRepository;

/// What a turn produced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TurnReport {
    /// Generator reply with directive lines removed.
    pub display: String,
    /// The generator said it drew on stored memory.
    pub memory_referenced: bool,
    /// One outcome per directive in the reply.
    pub outcomes: Vec<DirectiveOutcome>,
    /// Facts removed by either expiry sweep.
    pub expired: Vec<FactRecord>,
}

/// Drives conversational turns for one user session.
pub struct TurnProcessor<R, H, G, C = SystemClock>
where
    R: FactRepository,
    H: HistoryRepository,
    G: Generator,
    C: Clock,
{
    store: MemoryStore<R, C>,
    history_repo: H,
    generator: G,
    profile: UserProfile,
    assembler: ContextAssembler,
    history: Vec<ChatEntry>,
}

impl<R, H, G, C> TurnProcessor<R, H, G, C>
where
    R: FactRepository,
    H: HistoryRepository,
    G: Generator,
    C: Clock,
{
    /// Start a session over an opened store, loading the user's chat history.
    pub async fn open(
        store: MemoryStore<R, C>,
        history_repo: H,
        generator: G,
        profile: UserProfile,
        assembler: ContextAssembler,
    ) -> Result<Self, TurnError> {
        let history = history_repo.load_history(store.username()).await?;
        debug!(
            username = %store.username(),
            history = history.len(),
            "chat session opened"
        );
        Ok(Self {
            store,
            history_repo,
            generator,
            profile,
            assembler,
            history,
        })
    }

    pub fn store(&self) -> &MemoryStore<R, C> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut MemoryStore<R, C> {
        &mut self.store
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn history(&self) -> &[ChatEntry] {
        &self.history
    }

    /// Run one turn.
    ///
    /// A generator failure aborts the turn before any directive is applied
    /// and before anything is written to history.
    #[tracing::instrument(name = "turn", skip(self, user_message), fields(username = %self.store.username()))]
    pub async fn process(&mut self, user_message: &str) -> Result<TurnReport, TurnError> {
        let now = self.store.now();
        let mut expired = self.store.sweep(now).await?;

        let context = self.assembler.build(
            &self.profile,
            self.store.list(),
            &self.history,
            user_message,
            now,
        );
        let raw = self.generator.generate(&context, user_message).await?;

        let reply = parse_reply(&raw);
        let execution = DirectiveExecutor::execute(&mut self.store, &reply.directives).await?;
        expired.extend(execution.expired);

        let at = self.store.now();
        let exchange = [
            ChatEntry::from_user(user_message, at),
            ChatEntry::from_ai(reply.display.clone(), at),
        ];
        self.history_repo
            .append_history(self.store.username(), &exchange)
            .await?;
        self.history.extend(exchange);

        info!(
            directives = execution.outcomes.len(),
            expired = expired.len(),
            memory_referenced = reply.memory_referenced,
            "turn complete"
        );

        Ok(TurnReport {
            display: reply.display,
            memory_referenced: reply.memory_referenced,
            outcomes: execution.outcomes,
            expired,
        })
    }

    /// Save from user input starting with a trigger prefix.
    ///
    /// Returns `None` when the input does not start with a trigger, so the
    /// caller can treat it as an ordinary message.
    pub async fn remember(
        &mut self,
        user_input: &str,
    ) -> Result<Option<DirectiveOutcome>, TurnError> {
        let Some(directive) = parse_user_input(user_input) else {
            return Ok(None);
        };
        let execution = DirectiveExecutor::execute(&mut self.store, &[directive]).await?;
        Ok(execution.outcomes.into_iter().next())
    }
}
