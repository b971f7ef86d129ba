//! Update dispatcher: the two scene controllers
//!
//! Every inbound update takes one end-to-end pass here:
//! user resolution -> per-user lock -> session load -> scene entry (when
//! idle) or step input (when a scene is active). Updates neither controller
//! consumes are reported as `PassThrough` so the embedder can route them to
//! ordinary command handlers.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, error};

use bot_core::{ChatTransport, Update, UserResolver};
use scene_session::{Session, SessionPatch, SessionStore};

use crate::context::Ctx;
use crate::error::{EngineError, Result};
use crate::middleware::{
    run_after_input_chain, run_chain, run_gated_chain, run_scene_after_chain,
};
use crate::registry::SceneRegistry;
use crate::types::{ActionResult, EntryState, ExitState, Gate, Scene, StepState};

/// What happened to an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A scene consumed the update.
    Handled,
    /// No scene claimed it; route it to ordinary handlers.
    PassThrough,
}

pub struct Dispatcher {
    registry: Arc<SceneRegistry>,
    store: Arc<dyn SessionStore>,
    transport: Arc<dyn ChatTransport>,
    users: Arc<dyn UserResolver>,
    // Serializes session read-modify-write per user. The engine itself never
    // locks the session row in the store.
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl Dispatcher {
    /// Take ownership of the registry and seal it: the scene set is immutable
    /// while the dispatcher serves traffic.
    pub fn new(
        mut registry: SceneRegistry,
        store: Arc<dyn SessionStore>,
        transport: Arc<dyn ChatTransport>,
        users: Arc<dyn UserResolver>,
    ) -> Self {
        registry.launch();
        Self {
            registry: Arc::new(registry),
            store,
            transport,
            users,
            locks: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    /// Push the registered scenes' command list to the transport menu.
    pub async fn publish_commands(&self) -> Result<()> {
        let commands = self.registry.commands();
        if commands.is_empty() {
            self.transport.delete_my_commands().await?;
        } else {
            self.transport.set_my_commands(&commands).await?;
        }
        Ok(())
    }

    pub async fn dispatch(&self, update: Update) -> Result<Dispatch> {
        let Some(user) = self.users.resolve(&update).await.map_err(EngineError::Other)? else {
            return Ok(Dispatch::PassThrough);
        };

        let lock = self.user_lock(&user.id);
        let _guard = lock.lock().await;

        let mut session = match self.store.find(&user.id).await? {
            Some(session) => session,
            None => {
                self.store
                    .create_or_update(&user.id, SessionPatch::default())
                    .await?
            }
        };

        let ctx = Ctx::new(update, user, self.transport.clone());

        if session.is_in_scene() {
            self.handle_step_input(&ctx, &mut session).await
        } else {
            self.enter_scene(&ctx, &mut session).await
        }
    }

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Scene-entry controller: transitions the session from idle to
    /// `(scene, steps[0])`.
    async fn enter_scene(&self, ctx: &Ctx, session: &mut Session) -> Result<Dispatch> {
        for scene in self.registry.scenes() {
            if !scene.matches(ctx).await {
                continue;
            }

            let mut state = EntryState {
                user: ctx.user.clone(),
            };
            let entered = match run_chain(ctx, &scene.before, &mut state).await {
                Ok(done) => done,
                Err(err) => {
                    error!(
                        user = %ctx.user.id,
                        scene = %scene.name,
                        update = ?ctx.update,
                        error = %err,
                        "scene entry chain failed"
                    );
                    false
                }
            };

            // A matching-but-rejected scene must not let a lower-priority
            // scene claim the same update.
            if !entered {
                return Ok(Dispatch::PassThrough);
            }

            self.enter_step(ctx, scene, 0, session).await?;
            return Ok(Dispatch::Handled);
        }

        Ok(Dispatch::PassThrough)
    }

    /// Step-input controller: owns every transition while a scene is active.
    async fn handle_step_input(&self, ctx: &Ctx, session: &mut Session) -> Result<Dispatch> {
        let scene_name = session
            .scene
            .clone()
            .ok_or_else(|| EngineError::Internal("session has no active scene".into()))?;
        let step_name = session
            .step
            .clone()
            .ok_or_else(|| EngineError::Internal("session has no active step".into()))?;

        let scene = self.registry.get(&scene_name).ok_or_else(|| {
            EngineError::Internal(format!("scene with name \"{scene_name}\" is not found"))
        })?;
        let step_index = scene.step_index(&step_name).ok_or_else(|| {
            EngineError::Internal(format!(
                "step with name \"{step_name}\" is not found in scene \"{scene_name}\""
            ))
        })?;
        let step = &scene.steps[step_index];
        let entered_at = session.step_entered_at.ok_or_else(|| {
            EngineError::Internal(format!(
                "session for scene \"{scene_name}\" has no step entry timestamp"
            ))
        })?;

        let mut state = StepState {
            scene: scene_name,
            step: step_name,
            step_index,
            entered_at,
            user: ctx.user.clone(),
            payload: session.payload.clone().unwrap_or_default(),
        };

        // Gatekeepers may mutate the payload (e.g. pagination) even when they
        // end up swallowing the update, so persist it regardless of outcome.
        let gate = run_gated_chain(ctx, &step.before_handle_input, &mut state).await;
        self.save_payload(session, &state).await?;
        let gate = match gate {
            Ok(gate) => gate,
            Err(err) => {
                error!(
                    state = ?state,
                    update = ?ctx.update,
                    error = %err,
                    "input gatekeeper failed"
                );
                // only this update is lost; the step is retried on the next one
                return Ok(Dispatch::Handled);
            }
        };

        let Some(gate) = gate else {
            debug!(scene = %state.scene, step = %state.step, "update swallowed by gatekeepers");
            return Ok(Dispatch::Handled);
        };

        match gate {
            Gate::Exit => {
                self.end_scene(ctx, scene, state, ActionResult::Exit, session)
                    .await?;
                return Ok(Dispatch::Handled);
            }
            Gate::Skip => {
                self.apply_transition(ctx, scene, state, ActionResult::Next, session)
                    .await?;
                return Ok(Dispatch::Handled);
            }
            Gate::Next => {}
        }

        let action = match (step.handle_input)(ctx, &mut state).await {
            Ok(action) => {
                self.save_payload(session, &state).await?;
                action
            }
            Err(err) => {
                error!(
                    state = ?state,
                    update = ?ctx.update,
                    error = %err,
                    "input handler failed"
                );
                // the handler is the one place the engine does not recover
                return Err(err);
            }
        };

        if !step.after_handle_input.is_empty() {
            if let Err(err) =
                run_after_input_chain(ctx, &step.after_handle_input, &mut state, action.as_ref())
                    .await
            {
                error!(
                    state = ?state,
                    update = ?ctx.update,
                    error = %err,
                    "after-handle-input chain failed"
                );
            }
            self.save_payload(session, &state).await?;
        }

        let Some(action) = action else {
            return Ok(Dispatch::Handled);
        };
        self.apply_transition(ctx, scene, state, action, session)
            .await?;
        Ok(Dispatch::Handled)
    }

    async fn apply_transition(
        &self,
        ctx: &Ctx,
        scene: &Scene,
        state: StepState,
        action: ActionResult,
        session: &mut Session,
    ) -> Result<()> {
        match action {
            ActionResult::Next => {
                if state.step_index + 1 < scene.steps.len() {
                    self.enter_step(ctx, scene, state.step_index + 1, session)
                        .await
                } else {
                    self.end_scene(ctx, scene, state, ActionResult::Next, session)
                        .await
                }
            }
            ActionResult::Back => {
                if state.step_index == 0 {
                    return Err(EngineError::Internal(format!(
                        "no step before \"{}\" in scene \"{}\"",
                        state.step, scene.name
                    )));
                }
                self.enter_step(ctx, scene, state.step_index - 1, session)
                    .await
            }
            ActionResult::SelectStep(selector) => {
                let index = scene.resolve_selector(&selector).ok_or_else(|| {
                    EngineError::Internal(format!(
                        "step {selector:?} is not found in scene \"{}\"",
                        scene.name
                    ))
                })?;
                self.enter_step(ctx, scene, index, session).await
            }
            ActionResult::Repeat => self.enter_step(ctx, scene, state.step_index, session).await,
            ActionResult::Exit => {
                self.end_scene(ctx, scene, state, ActionResult::Exit, session)
                    .await
            }
        }
    }

    /// Shared step-entry routine: persist the new position, then run the
    /// step's entry chain. The scene aborts rather than getting stuck when
    /// entry fails.
    async fn enter_step(
        &self,
        ctx: &Ctx,
        scene: &Scene,
        index: usize,
        session: &mut Session,
    ) -> Result<()> {
        let step = scene.steps.get(index).ok_or_else(|| {
            EngineError::Internal(format!(
                "step with index \"{index}\" is not found in scene \"{}\"",
                scene.name
            ))
        })?;

        let mut state = StepState {
            scene: scene.name.clone(),
            step: step.name.clone(),
            step_index: index,
            entered_at: chrono::Utc::now(),
            user: ctx.user.clone(),
            payload: session.payload.clone().unwrap_or_default(),
        };
        self.save_state(session, &state).await?;

        if step.on_enter.is_empty() {
            return Ok(());
        }

        match run_chain(ctx, &step.on_enter, &mut state).await {
            Ok(true) => self.save_state(session, &state).await,
            Ok(false) => self.clear_session(session).await,
            Err(err) => {
                error!(
                    state = ?state,
                    update = ?ctx.update,
                    error = %err,
                    "step entry failed"
                );
                self.clear_session(session).await
            }
        }
    }

    /// Scene completion/exit: run the `after` chain, then clear the session
    /// no matter what.
    async fn end_scene(
        &self,
        ctx: &Ctx,
        scene: &Scene,
        state: StepState,
        action: ActionResult,
        session: &mut Session,
    ) -> Result<()> {
        let mut exit_state = ExitState {
            user: state.user,
            payload: state.payload,
        };

        if !scene.after.is_empty() {
            if let Err(err) =
                run_scene_after_chain(ctx, &scene.after, &mut exit_state, &action).await
            {
                error!(
                    scene = %scene.name,
                    update = ?ctx.update,
                    error = %err,
                    "scene after chain failed"
                );
            }
        }

        self.clear_session(session).await
    }

    async fn save_state(&self, session: &mut Session, state: &StepState) -> Result<()> {
        session.set_step(
            state.scene.clone(),
            state.step.clone(),
            state.entered_at,
            state.payload.clone(),
        );
        *session = self.store.save(session).await?;
        Ok(())
    }

    async fn save_payload(&self, session: &mut Session, state: &StepState) -> Result<()> {
        session.payload = Some(state.payload.clone());
        *session = self.store.save(session).await?;
        Ok(())
    }

    async fn clear_session(&self, session: &mut Session) -> Result<()> {
        session.clear_scene();
        *session = self.store.save(session).await?;
        Ok(())
    }
}
