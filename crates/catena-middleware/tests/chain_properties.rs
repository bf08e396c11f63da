//! Behavioural properties of the chain orchestrator.
//!
//! These tests drive [`Chain`] only through its public API and check the
//! ordering, short-circuit, error containment, fallback, configuration and
//! repeatability guarantees.

use catena_core::{ChainError, StageError, StageResult};
use catena_middleware::{
    BoxFuture, Chain, ErrorHandler, FnErrorHandler, FnHandler, Handler, Middleware, Next,
    PipelineContext,
};
use proptest::prelude::*;
use serde_json::json;
use std::sync::{Arc, Mutex};

type Trace = Arc<Mutex<Vec<String>>>;
type TestChain = Chain<String, String, ()>;

const NAMES: [&str; 8] = ["m0", "m1", "m2", "m3", "m4", "m5", "m6", "m7"];

fn entries(trace: &Trace) -> Vec<String> {
    trace.lock().unwrap().clone()
}

fn seen_keys(ctx: &PipelineContext) -> String {
    let mut keys: Vec<&str> = ctx.data().keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys.join(",")
}

/// Records what it saw, writes its own key and continues.
struct Recording {
    name: &'static str,
    trace: Trace,
}

impl Middleware<String, String, ()> for Recording {
    fn name(&self) -> &'static str {
        self.name
    }

    fn run<'a>(
        &'a self,
        request: &'a String,
        response: String,
        transport: &'a (),
        ctx: &'a mut PipelineContext,
        next: Next<'a, String, String, ()>,
    ) -> BoxFuture<'a, StageResult<String>> {
        Box::pin(async move {
            self.trace
                .lock()
                .unwrap()
                .push(format!("{}:down[{}]", self.name, seen_keys(ctx)));
            ctx.insert_data(self.name, json!(true));
            let result = next.run(request, response, transport, ctx).await?;
            self.trace.lock().unwrap().push(format!("{}:up", self.name));
            Ok(result)
        })
    }
}

/// Returns a fixed value without calling `next`.
struct Stop {
    trace: Trace,
}

impl Middleware<String, String, ()> for Stop {
    fn name(&self) -> &'static str {
        "stop"
    }

    fn run<'a>(
        &'a self,
        _request: &'a String,
        _response: String,
        _transport: &'a (),
        _ctx: &'a mut PipelineContext,
        _next: Next<'a, String, String, ()>,
    ) -> BoxFuture<'a, StageResult<String>> {
        Box::pin(async move {
            self.trace.lock().unwrap().push("stop".to_string());
            Ok("stopped".to_string())
        })
    }
}

/// Fails before calling `next`, optionally declaring a recovery.
struct Failing {
    recover: bool,
    trace: Trace,
}

impl Middleware<String, String, ()> for Failing {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn run<'a>(
        &'a self,
        _request: &'a String,
        _response: String,
        _transport: &'a (),
        _ctx: &'a mut PipelineContext,
        _next: Next<'a, String, String, ()>,
    ) -> BoxFuture<'a, StageResult<String>> {
        Box::pin(async move {
            self.trace.lock().unwrap().push("failing".to_string());
            Err(StageError::validation("MissingAttribute", "Attribute 'age' is required").with_path("age"))
        })
    }

    fn on_error<'a>(
        &'a self,
        _request: &'a String,
        response: &'a String,
        _transport: &'a (),
        _ctx: &'a PipelineContext,
        error: &'a StageError,
    ) -> Option<BoxFuture<'a, String>> {
        if !self.recover {
            return None;
        }
        let trace = Arc::clone(&self.trace);
        Some(Box::pin(async move {
            trace.lock().unwrap().push("failing:on_error".to_string());
            format!("local:{}:{}:{response}", error.code(), error.path().unwrap_or(""))
        }))
    }
}

/// Upper-cases what `next` returned and tags it.
struct Upper;

impl Middleware<String, String, ()> for Upper {
    fn name(&self) -> &'static str {
        "upper"
    }

    fn run<'a>(
        &'a self,
        request: &'a String,
        response: String,
        transport: &'a (),
        ctx: &'a mut PipelineContext,
        next: Next<'a, String, String, ()>,
    ) -> BoxFuture<'a, StageResult<String>> {
        Box::pin(async move {
            let result = next.run(request, response, transport, ctx).await?;
            Ok(format!("{}+post", result.to_uppercase()))
        })
    }
}

/// Replaces any downstream failure with a value of its own.
struct Replace;

impl Middleware<String, String, ()> for Replace {
    fn name(&self) -> &'static str {
        "replace"
    }

    fn run<'a>(
        &'a self,
        request: &'a String,
        response: String,
        transport: &'a (),
        ctx: &'a mut PipelineContext,
        next: Next<'a, String, String, ()>,
    ) -> BoxFuture<'a, StageResult<String>> {
        Box::pin(async move {
            match next.run(request, response, transport, ctx).await {
                Ok(result) => Ok(result),
                Err(_) => Ok("replaced".to_string()),
            }
        })
    }
}

/// Propagates downstream failures with `?` and recovers them itself.
struct Guard;

impl Middleware<String, String, ()> for Guard {
    fn name(&self) -> &'static str {
        "guard"
    }

    fn run<'a>(
        &'a self,
        request: &'a String,
        response: String,
        transport: &'a (),
        ctx: &'a mut PipelineContext,
        next: Next<'a, String, String, ()>,
    ) -> BoxFuture<'a, StageResult<String>> {
        Box::pin(async move {
            let result = next.run(request, response, transport, ctx).await?;
            Ok(format!("guarded:{result}"))
        })
    }

    fn on_error<'a>(
        &'a self,
        _request: &'a String,
        _response: &'a String,
        _transport: &'a (),
        _ctx: &'a PipelineContext,
        error: &'a StageError,
    ) -> Option<BoxFuture<'a, String>> {
        Some(Box::pin(async move { format!("guard:{}", error.code()) }))
    }
}

fn default_handler(trace: &Trace) -> impl ErrorHandler<String, String, ()> {
    let trace = Arc::clone(trace);
    FnErrorHandler::new(
        move |_: &String, _: &String, _: &(), _: &PipelineContext, error: StageError| {
            trace.lock().unwrap().push("default".to_string());
            std::future::ready(format!("default:{}", error.code()))
        },
    )
}

fn terminal(trace: &Trace) -> impl Handler<String, String, ()> {
    let trace = Arc::clone(trace);
    FnHandler::new(
        move |request: &String, response: String, _: &(), ctx: &PipelineContext| {
            trace
                .lock()
                .unwrap()
                .push(format!("handler[{}]", seen_keys(ctx)));
            std::future::ready(Ok::<_, StageError>(format!("{response}{request}")))
        },
    )
}

fn failing_terminal(trace: &Trace) -> impl Handler<String, String, ()> {
    let trace = Arc::clone(trace);
    FnHandler::new(move |_: &String, _: String, _: &(), _: &PipelineContext| {
        trace.lock().unwrap().push("handler".to_string());
        std::future::ready(Err::<String, _>(StageError::external(
            "StoreUnavailable",
            "item store is unavailable",
        )))
    })
}

fn recording(name: &'static str, trace: &Trace) -> Recording {
    Recording {
        name,
        trace: Arc::clone(trace),
    }
}

#[tokio::test]
async fn test_context_holds_only_predecessor_fields() {
    let trace = Trace::default();
    let chain = TestChain::new(default_handler(&trace), String::new())
        .with(recording("m0", &trace))
        .with(recording("m1", &trace))
        .with(recording("m2", &trace))
        .handler(terminal(&trace));

    let result = chain.run("req".to_string(), ()).await.unwrap();

    assert_eq!(result, "req");
    assert_eq!(
        entries(&trace),
        vec![
            "m0:down[]",
            "m1:down[m0]",
            "m2:down[m0,m1]",
            "handler[m0,m1,m2]",
            "m2:up",
            "m1:up",
            "m0:up",
        ]
    );
}

#[tokio::test]
async fn test_short_circuit_skips_later_stages_and_handler() {
    let trace = Trace::default();
    let chain = TestChain::new(default_handler(&trace), String::new())
        .with(recording("m0", &trace))
        .with(Stop {
            trace: Arc::clone(&trace),
        })
        .with(recording("m2", &trace))
        .handler(terminal(&trace));

    let result = chain.run("req".to_string(), ()).await.unwrap();

    assert_eq!(result, "stopped");
    assert_eq!(entries(&trace), vec!["m0:down[]", "stop", "m0:up"]);
}

#[tokio::test]
async fn test_local_recovery_contains_the_error() {
    let trace = Trace::default();
    let chain = TestChain::new(default_handler(&trace), "so-far".to_string())
        .with(recording("m0", &trace))
        .with(Failing {
            recover: true,
            trace: Arc::clone(&trace),
        })
        .with(recording("m2", &trace))
        .handler(terminal(&trace));

    let result = chain.run("req".to_string(), ()).await.unwrap();

    assert_eq!(result, "local:MissingAttribute:age:so-far");
    assert_eq!(entries(&trace), vec!["m0:down[]", "failing", "failing:on_error"]);
}

#[tokio::test]
async fn test_recovered_result_is_not_post_processed() {
    let trace = Trace::default();
    let chain = TestChain::new(default_handler(&trace), String::new())
        .with(Upper)
        .with(Failing {
            recover: true,
            trace: Arc::clone(&trace),
        })
        .handler(terminal(&trace));

    let result = chain.run("req".to_string(), ()).await.unwrap();

    assert_eq!(result, "local:MissingAttribute:age:");
}

#[tokio::test]
async fn test_successful_result_is_post_processed() {
    let trace = Trace::default();
    let chain = TestChain::new(default_handler(&trace), String::new())
        .with(Upper)
        .handler(terminal(&trace));

    assert_eq!(chain.run("req".to_string(), ()).await.unwrap(), "REQ+post");
}

#[tokio::test]
async fn test_missing_recovery_falls_back_to_default() {
    let trace = Trace::default();
    let chain = TestChain::new(default_handler(&trace), String::new())
        .with(Failing {
            recover: false,
            trace: Arc::clone(&trace),
        })
        .handler(terminal(&trace));

    let result = chain.run("req".to_string(), ()).await.unwrap();

    assert_eq!(result, "default:MissingAttribute");
    assert_eq!(entries(&trace), vec!["failing", "default"]);
}

#[tokio::test]
async fn test_terminal_failure_goes_to_nearest_enclosing_stage() {
    let trace = Trace::default();
    let chain = TestChain::new(default_handler(&trace), String::new())
        .with(recording("m0", &trace))
        .with(Guard)
        .handler(failing_terminal(&trace));

    let result = chain.run("req".to_string(), ()).await.unwrap();

    assert_eq!(result, "guard:StoreUnavailable");
    assert_eq!(entries(&trace), vec!["m0:down[]", "handler"]);
}

#[tokio::test]
async fn test_terminal_failure_without_recovery_uses_default_once() {
    let trace = Trace::default();
    let chain = TestChain::new(default_handler(&trace), String::new())
        .with(recording("m0", &trace))
        .with(recording("m1", &trace))
        .handler(failing_terminal(&trace));

    let result = chain.run("req".to_string(), ()).await.unwrap();

    assert_eq!(result, "default:StoreUnavailable");
    let trace = entries(&trace);
    assert_eq!(trace.iter().filter(|e| *e == "default").count(), 1);
    assert!(!trace.iter().any(|e| e.ends_with(":up")));
}

#[tokio::test]
async fn test_missing_handler_fails_before_any_stage() {
    let trace = Trace::default();
    let chain = TestChain::new(default_handler(&trace), String::new())
        .with(recording("m0", &trace))
        .with(recording("m1", &trace));

    for _ in 0..3 {
        let error = chain.run("req".to_string(), ()).await.unwrap_err();
        assert_eq!(error, ChainError::HandlerNotDefined);
    }
    assert!(entries(&trace).is_empty());
}

#[tokio::test]
async fn test_repeated_runs_produce_identical_traces() {
    let trace = Trace::default();
    let chain = TestChain::new(default_handler(&trace), String::new())
        .with(recording("m0", &trace))
        .with(recording("m1", &trace))
        .handler(terminal(&trace));

    let mut traces = Vec::new();
    for _ in 0..3 {
        trace.lock().unwrap().clear();
        let result = chain.run("req".to_string(), ()).await.unwrap();
        assert_eq!(result, "req");
        traces.push(entries(&trace));
    }

    assert!(traces.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test]
async fn test_cloned_chain_shares_stages() {
    let trace = Trace::default();
    let shared: Arc<dyn Middleware<String, String, ()>> = Arc::new(recording("m0", &trace));
    let chain = TestChain::new(default_handler(&trace), "hello ".to_string())
        .with_arc(Arc::clone(&shared))
        .handler(terminal(&trace));
    let copy = chain.clone();

    assert_eq!(chain.run("world".to_string(), ()).await.unwrap(), "hello world");
    assert_eq!(copy.run("again".to_string(), ()).await.unwrap(), "hello again");
    assert_eq!(copy.stage_names(), vec!["m0"]);
}

proptest! {
    #[test]
    fn prop_down_pass_in_order_up_pass_reversed(count in 0usize..8) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();

        let trace = Trace::default();
        let chain = NAMES[..count]
            .iter()
            .fold(TestChain::new(default_handler(&trace), String::new()), |chain, name| {
                chain.with(recording(*name, &trace))
            })
            .handler(terminal(&trace));

        let result = runtime.block_on(chain.run("req".to_string(), ())).unwrap();
        prop_assert_eq!(result, "req");

        let trace = entries(&trace);
        prop_assert_eq!(trace.len(), count * 2 + 1);

        let down: Vec<String> = trace[..count]
            .iter()
            .map(|e| e.split(':').next().unwrap().to_string())
            .collect();
        let up: Vec<String> = trace[count + 1..]
            .iter()
            .map(|e| e.split(':').next().unwrap().to_string())
            .collect();

        let expected: Vec<String> = NAMES[..count].iter().map(|n| (*n).to_string()).collect();
        let mut reversed = expected.clone();
        reversed.reverse();

        prop_assert_eq!(down, expected);
        prop_assert_eq!(up, reversed);
        prop_assert!(trace[count].starts_with("handler["));
    }
}

/// One stage enclosing the recovering stage.
#[derive(Debug, Clone, Copy)]
enum Outer {
    Recording,
    Upper,
    Replace,
}

fn outer_stage() -> impl Strategy<Value = Outer> {
    prop_oneof![Just(Outer::Recording), Just(Outer::Upper), Just(Outer::Replace)]
}

proptest! {
    #[test]
    fn prop_recovery_is_final_under_any_outer_onion(
        outer in proptest::collection::vec(outer_stage(), 0..6),
        inner in 0usize..3,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();

        let trace = Trace::default();
        let chain = outer
            .iter()
            .zip(NAMES)
            .fold(TestChain::new(default_handler(&trace), "so-far".to_string()), |chain, (stage, name)| {
                match stage {
                    Outer::Recording => chain.with(recording(name, &trace)),
                    Outer::Upper => chain.with(Upper),
                    Outer::Replace => chain.with(Replace),
                }
            })
            .with(Failing {
                recover: true,
                trace: Arc::clone(&trace),
            });
        let chain = NAMES[..inner]
            .iter()
            .fold(chain, |chain, name| chain.with(recording(name, &trace)))
            .handler(terminal(&trace));

        let result = runtime.block_on(chain.run("req".to_string(), ())).unwrap();
        prop_assert_eq!(result, "local:MissingAttribute:age:so-far");

        let trace = entries(&trace);
        prop_assert!(!trace.iter().any(|e| e.ends_with(":up")));
        prop_assert!(!trace.iter().any(|e| e.starts_with("handler") || e == "default"));
        prop_assert_eq!(trace.iter().filter(|e| *e == "failing:on_error").count(), 1);
    }
}
