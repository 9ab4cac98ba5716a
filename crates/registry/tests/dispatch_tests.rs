use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use cuecard_registry::{
    BoundArguments, DispatchError, Parameter, PromptDefinition, PromptDispatcher, PromptProvider, PromptRegistryBuilder,
};
use cuecard_types::{MessageRole, NormalizedResult, PromptMessage};
use serde_json::{Map, Value, json};
use tokio_util::sync::CancellationToken;

async fn greeting(_arguments: BoundArguments) -> anyhow::Result<Vec<PromptMessage>> {
    Ok(vec![PromptMessage::assistant("Hello! How can I assist you today?")])
}

async fn summary(arguments: BoundArguments) -> anyhow::Result<Vec<PromptMessage>> {
    let text: String = arguments.get("text")?;
    let sentences: i64 = arguments.get("sentences")?;
    Ok(vec![PromptMessage::user(format!("sentences={sentences}; text={text}"))])
}

async fn conversation(_arguments: BoundArguments) -> anyhow::Result<Vec<PromptMessage>> {
    Ok(vec![PromptMessage::user("What is Rust?"), PromptMessage::assistant("A systems programming language.")])
}

async fn failing(_arguments: BoundArguments) -> anyhow::Result<NormalizedResult> {
    Err(anyhow::anyhow!("upstream unavailable"))
}

async fn failing_with_own_error(_arguments: BoundArguments) -> anyhow::Result<NormalizedResult> {
    Err(DispatchError::missing_required_argument("nested", "id").into())
}

async fn panicking(_arguments: BoundArguments) -> anyhow::Result<NormalizedResult> {
    panic!("handler exploded")
}

async fn watch_cancellation(arguments: BoundArguments) -> anyhow::Result<Vec<PromptMessage>> {
    let cancelled = arguments.cancellation().is_some_and(CancellationToken::is_cancelled);
    Ok(vec![PromptMessage::assistant(format!("cancelled={cancelled}"))])
}

fn standard_dispatcher() -> PromptDispatcher {
    let mut builder = PromptRegistryBuilder::new();
    builder
        .register(PromptDefinition::builder("greeting").description("A friendly greeting").handler(greeting))
        .expect("register greeting")
        .register(
            PromptDefinition::builder("summary")
                .description("Summarize a piece of text")
                .parameter(Parameter::text("text").description("Text to summarize"))
                .parameter(Parameter::integer("sentences").optional().default_value(3))
                .handler(summary),
        )
        .expect("register summary")
        .register(PromptDefinition::builder("conversation").handler(conversation))
        .expect("register conversation")
        .register(PromptDefinition::builder("failing").handler(failing))
        .expect("register failing")
        .register(PromptDefinition::builder("nested").handler(failing_with_own_error))
        .expect("register nested")
        .register(PromptDefinition::builder("panicking").handler(panicking))
        .expect("register panicking")
        .register(
            PromptDefinition::builder("watch")
                .parameter(Parameter::cancellation("cancellation"))
                .handler(watch_cancellation),
        )
        .expect("register watch");
    PromptDispatcher::new(Arc::new(builder.build()))
}

fn arguments(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

#[tokio::test]
async fn greeting_returns_a_single_assistant_message() {
    let dispatcher = standard_dispatcher();

    let greeting = dispatcher.list().into_iter().find(|descriptor| descriptor.name == "greeting").expect("listed");
    assert!(greeting.arguments.is_empty());

    let result = dispatcher.invoke("greeting", None, CancellationToken::new()).await.expect("invokes");
    assert_eq!(result.messages.len(), 1);
    assert_eq!(result.messages[0].role, MessageRole::Assistant);
    assert_eq!(result.messages[0].content.as_text(), "Hello! How can I assist you today?");
}

#[tokio::test]
async fn summary_uses_default_and_coerces_text() {
    let dispatcher = standard_dispatcher();

    let defaulted = dispatcher
        .invoke("summary", Some(&arguments(json!({ "text": "hello world" }))), CancellationToken::new())
        .await
        .expect("invokes with default");
    assert_eq!(defaulted.messages[0].content.as_text(), "sentences=3; text=hello world");

    let coerced = dispatcher
        .invoke(
            "summary",
            Some(&arguments(json!({ "text": "hello world", "sentences": "2" }))),
            CancellationToken::new(),
        )
        .await
        .expect("invokes with coerced value");
    assert_eq!(coerced.messages[0].content.as_text(), "sentences=2; text=hello world");
}

#[tokio::test]
async fn summary_reports_missing_and_unconvertible_arguments() {
    let dispatcher = standard_dispatcher();

    let missing = dispatcher.invoke("summary", None, CancellationToken::new()).await.expect_err("text missing");
    assert_eq!(missing, DispatchError::missing_required_argument("summary", "text"));

    let invalid = dispatcher
        .invoke(
            "summary",
            Some(&arguments(json!({ "text": "hello", "sentences": "abc" }))),
            CancellationToken::new(),
        )
        .await
        .expect_err("sentences invalid");
    assert!(matches!(invalid, DispatchError::ArgumentConversion { ref argument, .. } if argument == "sentences"));
}

#[tokio::test]
async fn catalog_preserves_registration_order_and_required_flags() {
    let dispatcher = standard_dispatcher();
    let descriptors = dispatcher.list();

    let names = descriptors.iter().map(|descriptor| descriptor.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["greeting", "summary", "conversation", "failing", "nested", "panicking", "watch"]);

    let summary = &descriptors[1];
    assert_eq!(summary.arguments.len(), 2);
    assert!(summary.arguments[0].required);
    assert!(!summary.arguments[1].required);
    assert!(descriptors[6].arguments.is_empty());
}

#[tokio::test]
async fn unknown_prompt_never_reaches_a_handler() {
    let called = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&called);
    let mut builder = PromptRegistryBuilder::new();
    builder
        .register(PromptDefinition::builder("tracked").handler(move |_arguments| {
            flag.store(true, Ordering::SeqCst);
            async { Ok::<_, anyhow::Error>(NormalizedResult::default()) }
        }))
        .expect("register tracked");
    let dispatcher = PromptDispatcher::new(Arc::new(builder.build()));

    let error = dispatcher.invoke("untracked", None, CancellationToken::new()).await.expect_err("unknown");

    assert_eq!(error, DispatchError::unknown_prompt("untracked"));
    assert!(!called.load(Ordering::SeqCst));
}

#[tokio::test]
async fn messages_keep_their_order() {
    let dispatcher = standard_dispatcher();

    let result = dispatcher.invoke("conversation", None, CancellationToken::new()).await.expect("invokes");

    assert_eq!(
        result.messages,
        vec![PromptMessage::user("What is Rust?"), PromptMessage::assistant("A systems programming language.")]
    );
}

#[tokio::test]
async fn handler_failures_are_wrapped_once() {
    let dispatcher = standard_dispatcher();

    let wrapped = dispatcher.invoke("failing", None, CancellationToken::new()).await.expect_err("fails");
    assert_eq!(wrapped, DispatchError::handler_invocation("failing", "upstream unavailable"));

    let passthrough = dispatcher.invoke("nested", None, CancellationToken::new()).await.expect_err("fails");
    assert_eq!(passthrough, DispatchError::missing_required_argument("nested", "id"));

    let panicked = dispatcher.invoke("panicking", None, CancellationToken::new()).await.expect_err("panics");
    assert!(matches!(panicked, DispatchError::HandlerInvocation { ref message, .. } if message.contains("handler exploded")));
}

#[tokio::test]
async fn panics_before_the_handler_future_is_built_are_caught() {
    let mut builder = PromptRegistryBuilder::new();
    builder
        .register(PromptDefinition::builder("eager").handler(|_arguments: BoundArguments| {
            let empty: Vec<i32> = Vec::new();
            let _ = empty[0];
            async { Ok::<_, anyhow::Error>(Vec::<PromptMessage>::new()) }
        }))
        .expect("register eager");
    let dispatcher = PromptDispatcher::new(Arc::new(builder.build()));

    let joined = tokio::spawn(async move { dispatcher.invoke("eager", None, CancellationToken::new()).await }).await;

    let error = joined.expect("panic stays inside the dispatcher").expect_err("reported as a failure");
    assert!(matches!(error, DispatchError::HandlerInvocation { ref prompt, ref message } if prompt == "eager" && message.contains("index out of bounds")));
}

#[tokio::test]
async fn cancellation_token_reaches_the_handler() {
    let dispatcher = standard_dispatcher();
    let token = CancellationToken::new();
    token.cancel();

    let result = dispatcher.invoke("watch", None, token).await.expect("invokes");

    assert_eq!(result.messages[0].content.as_text(), "cancelled=true");
}

struct Counter {
    calls: AtomicUsize,
}

impl Counter {
    async fn tick(self: Arc<Self>, arguments: BoundArguments) -> anyhow::Result<NormalizedResult> {
        let step: i64 = arguments.get("step")?;
        let total = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(NormalizedResult::new(vec![PromptMessage::assistant(format!("call {total}, step {step}"))]).with_description("tick"))
    }
}

impl PromptProvider for Counter {
    fn prompt_definitions() -> Vec<PromptDefinition> {
        vec![
            PromptDefinition::builder("tick")
                .parameter(Parameter::integer("step"))
                .method(Counter::tick),
        ]
    }
}

#[tokio::test]
async fn instance_bound_prompts_share_their_owner() {
    let counter = Arc::new(Counter { calls: AtomicUsize::new(0) });
    let mut builder = PromptRegistryBuilder::new();
    builder.register_all_on(Some(Arc::clone(&counter))).expect("register counter");
    let dispatcher = PromptDispatcher::new(Arc::new(builder.build()));
    let step = arguments(json!({ "step": 2 }));

    dispatcher.invoke("tick", Some(&step), CancellationToken::new()).await.expect("first call");
    let result = dispatcher.invoke("Tick", Some(&step), CancellationToken::new()).await.expect("second call");

    assert_eq!(result.description.as_deref(), Some("tick"));
    assert_eq!(result.messages[0].content.as_text(), "call 2, step 2");
    assert_eq!(counter.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn concurrent_invocations_are_independent() {
    let dispatcher = standard_dispatcher();

    let tasks = (1..=8)
        .map(|sentences| {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                let supplied = arguments(json!({ "text": "parallel", "sentences": sentences }));
                dispatcher.invoke("summary", Some(&supplied), CancellationToken::new()).await
            })
        })
        .collect::<Vec<_>>();

    for (index, task) in tasks.into_iter().enumerate() {
        let result = task.await.expect("task joins").expect("invokes");
        assert_eq!(result.messages[0].content.as_text(), format!("sentences={}; text=parallel", index + 1));
    }
}
