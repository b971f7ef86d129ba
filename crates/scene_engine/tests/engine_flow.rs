//! End-to-end dispatcher tests: scenes run against an in-memory session
//! store and a recording transport, driven update by update.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::json;

use bot_core::{
    ChatTransport, Command, InlineKeyboardMarkup, Kind, TransportError, Update, User, UserResolver,
};
use scene_engine::{
    build_button, callback_query, command, message, next_on, skip_on, use_if, ActionResult, Ctx,
    Dispatch, Dispatcher, Flow, Payload, Scene, SceneRegistry, Step, StepSelector, StepState,
};
use scene_session::{MemorySessionStore, SessionStore};

#[derive(Default)]
struct MockTransport {
    replies: StdMutex<Vec<String>>,
    answered: StdMutex<Vec<String>>,
    commands: StdMutex<Option<Vec<Command>>>,
    commands_deleted: StdMutex<bool>,
}

impl MockTransport {
    fn replies(&self) -> Vec<String> {
        self.replies.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn reply(
        &self,
        _chat_id: &str,
        text: &str,
        _markup: Option<InlineKeyboardMarkup>,
    ) -> Result<(), TransportError> {
        self.replies.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn edit_message_reply_markup(
        &self,
        _chat_id: &str,
        _message_id: i64,
        _markup: InlineKeyboardMarkup,
    ) -> Result<(), TransportError> {
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), TransportError> {
        self.answered.lock().unwrap().push(callback_id.to_string());
        Ok(())
    }

    async fn set_my_commands(&self, commands: &[Command]) -> Result<(), TransportError> {
        *self.commands.lock().unwrap() = Some(commands.to_vec());
        Ok(())
    }

    async fn delete_my_commands(&self) -> Result<(), TransportError> {
        *self.commands_deleted.lock().unwrap() = true;
        Ok(())
    }
}

/// Resolves the sender of the update as the engine user.
struct SenderResolver;

#[async_trait]
impl UserResolver for SenderResolver {
    async fn resolve(&self, update: &Update) -> anyhow::Result<Option<User>> {
        Ok(update.from_user().cloned())
    }
}

struct NobodyResolver;

#[async_trait]
impl UserResolver for NobodyResolver {
    async fn resolve(&self, _update: &Update) -> anyhow::Result<Option<User>> {
        Ok(None)
    }
}

fn user() -> User {
    User::new("u1")
}

struct Harness {
    dispatcher: Dispatcher,
    transport: Arc<MockTransport>,
    store: Arc<MemorySessionStore>,
}

impl Harness {
    fn new(registry: SceneRegistry) -> Self {
        let transport = Arc::new(MockTransport::default());
        let store = Arc::new(MemorySessionStore::new());
        let dispatcher = Dispatcher::new(
            registry,
            store.clone(),
            transport.clone(),
            Arc::new(SenderResolver),
        );
        Self {
            dispatcher,
            transport,
            store,
        }
    }

    async fn session(&self) -> scene_session::Session {
        self.store.find("u1").await.unwrap().unwrap()
    }
}

/// A step that prompts on entry and stores the incoming text under `key`.
fn capture_step(name: &str, prompt: &str, key: &str) -> Step {
    let key = key.to_string();
    Step::builder(name)
        .on_enter(scene_engine::reply(prompt))
        .handle(move |ctx: &Ctx, state: &mut StepState| {
            let key = key.clone();
            Box::pin(async move {
                if let Some(text) = ctx.update.text() {
                    state.payload.insert(key, json!(text));
                }
                Ok(Some(ActionResult::Next))
            })
        })
}

type AfterLog = Arc<StdMutex<Vec<(ActionResult, Payload)>>>;

fn recording_after(log: AfterLog) -> scene_engine::SceneAfterMiddleware {
    Box::new(move |_ctx, state, action| {
        log.lock()
            .unwrap()
            .push((action.clone(), state.payload.clone()));
        Box::pin(async { Ok(Flow::Continue) })
    })
}

fn registry(scene: Scene) -> SceneRegistry {
    let mut registry = SceneRegistry::new();
    registry.add_scene(scene).unwrap();
    registry
}

#[tokio::test]
async fn test_three_step_scene_runs_to_completion() {
    let after_log: AfterLog = Default::default();
    let scene = Scene::new("signup", use_if(command("signup")))
        .step(capture_step("name", "Your name?", "name"))
        .step(capture_step("email", "Your email?", "email"))
        .step(capture_step("city", "Your city?", "city"))
        .after(recording_after(after_log.clone()));
    let h = Harness::new(registry(scene));

    let result = h
        .dispatcher
        .dispatch(Update::command_message(user(), "/signup"))
        .await
        .unwrap();
    assert_eq!(result, Dispatch::Handled);
    assert_eq!(h.session().await.step.as_deref(), Some("name"));

    h.dispatcher
        .dispatch(Update::text_message(user(), "Ada"))
        .await
        .unwrap();
    assert_eq!(h.session().await.step.as_deref(), Some("email"));

    h.dispatcher
        .dispatch(Update::text_message(user(), "ada@example.com"))
        .await
        .unwrap();
    h.dispatcher
        .dispatch(Update::text_message(user(), "London"))
        .await
        .unwrap();

    // every step prompted exactly once, in order
    assert_eq!(
        h.transport.replies(),
        vec!["Your name?", "Your email?", "Your city?"]
    );

    // one completion, observed as Next, with the full payload
    let log = after_log.lock().unwrap();
    assert_eq!(log.len(), 1);
    let (action, payload) = &log[0];
    assert_eq!(*action, ActionResult::Next);
    assert_eq!(payload.get("name"), Some(&json!("Ada")));
    assert_eq!(payload.get("email"), Some(&json!("ada@example.com")));
    assert_eq!(payload.get("city"), Some(&json!("London")));

    // session is idle again
    assert!(!h.session().await.is_in_scene());
}

#[tokio::test]
async fn test_back_on_first_step_is_fatal_and_leaves_session_in_place() {
    let scene = Scene::new("s", use_if(command("s"))).step(
        Step::builder("first")
            .handle(|_ctx, _state| Box::pin(async { Ok(Some(ActionResult::Back)) })),
    );
    let h = Harness::new(registry(scene));

    h.dispatcher
        .dispatch(Update::command_message(user(), "/s"))
        .await
        .unwrap();
    let err = h
        .dispatcher
        .dispatch(Update::text_message(user(), "anything"))
        .await
        .unwrap_err();
    assert!(!err.is_user_input());

    // the failed transition must not have moved or cleared the session
    let session = h.session().await;
    assert_eq!(session.scene.as_deref(), Some("s"));
    assert_eq!(session.step.as_deref(), Some("first"));
}

#[tokio::test]
async fn test_gatekeeper_silence_swallows_update() {
    let handled = Arc::new(StdMutex::new(0usize));
    let handled_in_step = handled.clone();
    let scene = Scene::new("s", use_if(command("s"))).step(
        Step::builder("first")
            .gate(next_on(message(Kind::Text)))
            .handle(move |_ctx, _state| {
                *handled_in_step.lock().unwrap() += 1;
                Box::pin(async { Ok(Some(ActionResult::Next)) })
            }),
    );
    let h = Harness::new(registry(scene));

    h.dispatcher
        .dispatch(Update::command_message(user(), "/s"))
        .await
        .unwrap();

    // a callback press is not text input for this step
    let result = h
        .dispatcher
        .dispatch(Update::callback(user(), "cb1", "{}"))
        .await
        .unwrap();
    assert_eq!(result, Dispatch::Handled);
    assert_eq!(*handled.lock().unwrap(), 0);
    assert_eq!(h.session().await.step.as_deref(), Some("first"));
}

#[tokio::test]
async fn test_skip_gate_advances_without_running_handler() {
    let handled = Arc::new(StdMutex::new(0usize));
    let handled_in_step = handled.clone();
    let scene = Scene::new("s", use_if(command("s")))
        .step(
            Step::builder("optional")
                .gate(skip_on(command("skip")))
                .handle(move |_ctx, _state| {
                    *handled_in_step.lock().unwrap() += 1;
                    Box::pin(async { Ok(Some(ActionResult::Next)) })
                }),
        )
        .step(capture_step("last", "Last one", "last"));
    let h = Harness::new(registry(scene));

    h.dispatcher
        .dispatch(Update::command_message(user(), "/s"))
        .await
        .unwrap();
    h.dispatcher
        .dispatch(Update::command_message(user(), "/skip"))
        .await
        .unwrap();

    assert_eq!(*handled.lock().unwrap(), 0);
    assert_eq!(h.session().await.step.as_deref(), Some("last"));
}

#[tokio::test]
async fn test_rejected_entry_passes_through_and_shadows_later_scenes() {
    let second_entered = Arc::new(StdMutex::new(false));
    let flag = second_entered.clone();

    let guarded = Scene::new("guarded", use_if(command("go")))
        .before(Box::new(|_ctx, _state: &mut scene_engine::EntryState| {
            Box::pin(async { Ok(Flow::Halt) })
        }))
        .step(capture_step("only", "never shown", "x"));
    let fallback = Scene::new("fallback", use_if(command("go"))).step(
        Step::builder("only")
            .on_enter(Box::new(move |_ctx, _state: &mut StepState| {
                *flag.lock().unwrap() = true;
                Box::pin(async { Ok(Flow::Continue) })
            }))
            .handle(|_ctx, _state| Box::pin(async { Ok(Some(ActionResult::Exit)) })),
    );

    let mut reg = SceneRegistry::new();
    reg.add_scene(guarded).unwrap();
    reg.add_scene(fallback).unwrap();
    let h = Harness::new(reg);

    let result = h
        .dispatcher
        .dispatch(Update::command_message(user(), "/go"))
        .await
        .unwrap();

    // the higher-priority scene matched and rejected: the update falls
    // through to ordinary handlers, not to the next scene
    assert_eq!(result, Dispatch::PassThrough);
    assert!(!*second_entered.lock().unwrap());
    assert!(!h.session().await.is_in_scene());
}

/// A step that prompts on entry and always resolves to the given action.
fn jump_step(name: &str, prompt: &str, action: ActionResult) -> Step {
    Step::builder(name)
        .on_enter(scene_engine::reply(prompt))
        .handle(move |_ctx: &Ctx, _state: &mut StepState| {
            let action = action.clone();
            Box::pin(async move { Ok(Some(action)) })
        })
}

fn jump_scene(first_action: ActionResult) -> Scene {
    Scene::new("s", use_if(command("s")))
        .step(jump_step("a", "A?", first_action))
        .step(capture_step("b", "B?", "b"))
        .step(capture_step("c", "C?", "c"))
}

#[tokio::test]
async fn test_select_step_by_name_jumps_over_steps() {
    let h = Harness::new(registry(jump_scene(ActionResult::SelectStep("c".into()))));

    h.dispatcher
        .dispatch(Update::command_message(user(), "/s"))
        .await
        .unwrap();
    h.dispatcher
        .dispatch(Update::text_message(user(), "x"))
        .await
        .unwrap();

    // "b" was skipped entirely, its prompt never sent
    assert_eq!(h.session().await.step.as_deref(), Some("c"));
    assert_eq!(h.transport.replies(), vec!["A?", "C?"]);
}

#[tokio::test]
async fn test_select_step_by_index() {
    let selector = StepSelector::Index(1);
    let h = Harness::new(registry(jump_scene(ActionResult::SelectStep(selector))));

    h.dispatcher
        .dispatch(Update::command_message(user(), "/s"))
        .await
        .unwrap();
    h.dispatcher
        .dispatch(Update::text_message(user(), "x"))
        .await
        .unwrap();

    assert_eq!(h.session().await.step.as_deref(), Some("b"));
    assert_eq!(h.transport.replies(), vec!["A?", "B?"]);
}

#[tokio::test]
async fn test_select_step_with_unknown_name_is_fatal() {
    let h = Harness::new(registry(jump_scene(ActionResult::SelectStep(
        "nowhere".into(),
    ))));

    h.dispatcher
        .dispatch(Update::command_message(user(), "/s"))
        .await
        .unwrap();
    let err = h
        .dispatcher
        .dispatch(Update::text_message(user(), "x"))
        .await
        .unwrap_err();
    assert!(!err.is_user_input());

    // the failed jump must not have moved the session
    let session = h.session().await;
    assert_eq!(session.scene.as_deref(), Some("s"));
    assert_eq!(session.step.as_deref(), Some("a"));
}

#[tokio::test]
async fn test_back_returns_to_previous_step() {
    let scene = Scene::new("s", use_if(command("s")))
        .step(capture_step("a", "A?", "a"))
        .step(jump_step("b", "B?", ActionResult::Back));
    let h = Harness::new(registry(scene));

    h.dispatcher
        .dispatch(Update::command_message(user(), "/s"))
        .await
        .unwrap();
    h.dispatcher
        .dispatch(Update::text_message(user(), "x"))
        .await
        .unwrap();
    assert_eq!(h.session().await.step.as_deref(), Some("b"));

    h.dispatcher
        .dispatch(Update::text_message(user(), "y"))
        .await
        .unwrap();

    // back on "a" with its entry hooks re-run
    assert_eq!(h.session().await.step.as_deref(), Some("a"));
    assert_eq!(h.transport.replies(), vec!["A?", "B?", "A?"]);
}

#[tokio::test]
async fn test_repeat_refreshes_step_entry_timestamp() {
    let scene = Scene::new("s", use_if(command("s"))).step(
        Step::builder("first")
            .handle(|_ctx, _state| Box::pin(async { Ok(Some(ActionResult::Repeat)) })),
    );
    let h = Harness::new(registry(scene));

    h.dispatcher
        .dispatch(Update::command_message(user(), "/s"))
        .await
        .unwrap();
    let first_entry = h.session().await.step_entered_at.unwrap();

    tokio::time::sleep(Duration::from_millis(5)).await;
    h.dispatcher
        .dispatch(Update::text_message(user(), "again"))
        .await
        .unwrap();

    let session = h.session().await;
    assert_eq!(session.step.as_deref(), Some("first"));
    assert!(session.step_entered_at.unwrap() > first_entry);
}

#[tokio::test]
async fn test_stale_callback_is_swallowed_after_reentry() {
    // on entry the step renders a button; a press on a button from an
    // earlier entry of the same step must be ignored
    let rendered: Arc<StdMutex<Vec<String>>> = Default::default();
    let rendered_in_step = rendered.clone();
    let picked = Arc::new(StdMutex::new(0usize));
    let picked_in_step = picked.clone();

    let scene = Scene::new("pick", use_if(command("pick"))).step(
        Step::builder("choose")
            .on_enter(Box::new(move |_ctx, state: &mut StepState| {
                let button = build_button(state, "the one", "item-1").unwrap();
                rendered_in_step.lock().unwrap().push(button.callback_data);
                Box::pin(async { Ok(Flow::Continue) })
            }))
            .gate(next_on(callback_query()))
            .handle(move |_ctx, _state| {
                *picked_in_step.lock().unwrap() += 1;
                Box::pin(async { Ok(Some(ActionResult::Repeat)) })
            }),
    );
    let h = Harness::new(registry(scene));

    h.dispatcher
        .dispatch(Update::command_message(user(), "/pick"))
        .await
        .unwrap();
    let old_button = rendered.lock().unwrap()[0].clone();

    // pressing the fresh button re-enters the step and re-renders
    tokio::time::sleep(Duration::from_millis(5)).await;
    h.dispatcher
        .dispatch(Update::callback(user(), "cb1", old_button.clone()))
        .await
        .unwrap();
    assert_eq!(*picked.lock().unwrap(), 1);
    assert_eq!(rendered.lock().unwrap().len(), 2);

    // the old keyboard is now stale
    let result = h
        .dispatcher
        .dispatch(Update::callback(user(), "cb2", old_button))
        .await
        .unwrap();
    assert_eq!(result, Dispatch::Handled);
    assert_eq!(*picked.lock().unwrap(), 1);
    assert_eq!(h.session().await.step.as_deref(), Some("choose"));
}

#[tokio::test]
async fn test_session_survives_dispatcher_restart() {
    fn build_registry() -> SceneRegistry {
        let scene = Scene::new("signup", use_if(command("signup")))
            .step(capture_step("name", "Your name?", "name"))
            .step(capture_step("email", "Your email?", "email"));
        registry(scene)
    }

    let transport = Arc::new(MockTransport::default());
    let store = Arc::new(MemorySessionStore::new());

    let first = Dispatcher::new(
        build_registry(),
        store.clone(),
        transport.clone(),
        Arc::new(SenderResolver),
    );
    first
        .dispatch(Update::command_message(user(), "/signup"))
        .await
        .unwrap();
    drop(first);

    // a fresh dispatcher over the same store resumes mid-scene
    let second = Dispatcher::new(
        build_registry(),
        store.clone(),
        transport.clone(),
        Arc::new(SenderResolver),
    );
    second
        .dispatch(Update::text_message(user(), "Ada"))
        .await
        .unwrap();

    let session = store.find("u1").await.unwrap().unwrap();
    assert_eq!(session.step.as_deref(), Some("email"));
    assert_eq!(
        session.payload.unwrap().get("name"),
        Some(&json!("Ada"))
    );
}

#[tokio::test]
async fn test_unresolved_user_passes_through() {
    let scene = Scene::new("s", use_if(command("s"))).step(capture_step("only", "?", "x"));
    let dispatcher = Dispatcher::new(
        registry(scene),
        Arc::new(MemorySessionStore::new()),
        Arc::new(MockTransport::default()),
        Arc::new(NobodyResolver),
    );

    let result = dispatcher
        .dispatch(Update::command_message(user(), "/s"))
        .await
        .unwrap();
    assert_eq!(result, Dispatch::PassThrough);
}

#[tokio::test]
async fn test_publish_commands_sets_menu_or_clears_it() {
    let scene = Scene::new("create-account", use_if(command("create_account")))
        .command("create_account", "Create a new account")
        .step(capture_step("name", "Name?", "name"));
    let h = Harness::new(registry(scene));
    h.dispatcher.publish_commands().await.unwrap();
    let commands = h.transport.commands.lock().unwrap().clone().unwrap();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].command, "create_account");

    let empty = Harness::new(SceneRegistry::new());
    empty.dispatcher.publish_commands().await.unwrap();
    assert!(*empty.transport.commands_deleted.lock().unwrap());
}

#[tokio::test]
async fn test_exit_gate_runs_scene_after_with_exit() {
    let after_log: AfterLog = Default::default();
    let scene = Scene::new("s", use_if(command("s")))
        .step(
            Step::builder("first")
                .gate(scene_engine::exit_on(command("cancel")))
                .handle(|_ctx, _state| Box::pin(async { Ok(Some(ActionResult::Next)) })),
        )
        .after(recording_after(after_log.clone()));
    let h = Harness::new(registry(scene));

    h.dispatcher
        .dispatch(Update::command_message(user(), "/s"))
        .await
        .unwrap();
    h.dispatcher
        .dispatch(Update::command_message(user(), "/cancel"))
        .await
        .unwrap();

    let log = after_log.lock().unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].0, ActionResult::Exit);
    assert!(!h.session().await.is_in_scene());
}
