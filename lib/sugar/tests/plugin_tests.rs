//! Plugin pipeline tests against a scripted transport.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert2::{check, let_assert};
use bytes::Bytes;
use futures_util::future::BoxFuture;
use http::HeaderMap;
use sugar::{
    Client, Context, Error, Header, Logger, Plugin, Request, Response, Result, Retryer, Timeout,
    Transporter, params,
};

const URL: &str = "http://books.test/books";

/// Replays canned outcomes, then answers 200.
#[derive(Clone, Default)]
struct Scripted {
    calls: Arc<AtomicUsize>,
    outcomes: Arc<Mutex<VecDeque<Result<Response>>>>,
    delay: Option<Duration>,
}

impl Scripted {
    fn new(outcomes: impl IntoIterator<Item = Result<Response>>) -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(outcomes.into_iter().collect())),
            ..Self::default()
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transporter for Scripted {
    fn execute(&self, _request: Request) -> BoxFuture<'_, Result<Response>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tracing::info!("transport round trip");
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let next = self.outcomes.lock().expect("lock").pop_front();
            next.unwrap_or_else(|| Ok(status(200)))
        })
    }
}

fn status(code: u16) -> Response {
    Response::new(code, HeaderMap::new(), Bytes::new())
}

fn retryer(attempts: u32) -> Retryer {
    Retryer::new(attempts, Duration::from_millis(100), 2.0, Duration::from_secs(1))
}

fn client(transport: &Scripted, plugins: Vec<Arc<dyn Plugin>>) -> Client {
    let builder = Client::builder().transport(transport.clone());
    plugins
        .into_iter()
        .fold(builder, |builder, plugin| builder.plugin(Shared(plugin)))
        .build()
}

struct Shared(Arc<dyn Plugin>);

impl Plugin for Shared {
    fn handle<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<()>> {
        self.0.handle(ctx)
    }
}

/// Records its label into a shared journal before and after `next`.
struct Recorder {
    label: &'static str,
    journal: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn new(label: &'static str, journal: &Arc<Mutex<Vec<String>>>) -> Arc<dyn Plugin> {
        Arc::new(Self {
            label,
            journal: Arc::clone(journal),
        })
    }
}

impl Plugin for Recorder {
    fn handle<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.journal.lock().expect("lock").push(format!("{} before", self.label));
            let result = ctx.next().await;
            self.journal.lock().expect("lock").push(format!("{} after", self.label));
            result
        })
    }
}

#[tokio::test(start_paused = true)]
async fn retries_transient_errors_up_to_the_limit() {
    let transport = Scripted::new([
        Err(Error::connection("reset")),
        Err(Error::Timeout),
        Err(Error::connection("refused")),
        Ok(status(200)),
    ]);
    let reply = client(&transport, vec![Arc::new(retryer(3))])
        .get(URL, params![])
        .await;

    check!(transport.calls() == 3);
    let_assert!(Some(Error::Connection(message)) = reply.error());
    check!(message == "refused");
}

#[tokio::test(start_paused = true)]
async fn retry_stops_after_success() {
    let transport = Scripted::new([Err(Error::connection("reset")), Ok(status(201))]);
    let reply = client(&transport, vec![Arc::new(retryer(5))])
        .get(URL, params![])
        .await;

    check!(transport.calls() == 2);
    check!(reply.status() == Some(201));
}

#[tokio::test(start_paused = true)]
async fn non_transient_errors_are_not_retried() {
    let transport = Scripted::new([Err(Error::tls("bad certificate"))]);
    let reply = client(&transport, vec![Arc::new(retryer(3))])
        .get(URL, params![])
        .await;

    check!(transport.calls() == 1);
    check!(matches!(reply.error(), Some(Error::Tls(_))));
}

#[tokio::test(start_paused = true)]
async fn client_errors_are_not_retried() {
    let transport = Scripted::new([Ok(status(404))]);
    let reply = client(&transport, vec![Arc::new(retryer(3))])
        .get(URL, params![])
        .await;

    check!(transport.calls() == 1);
    check!(reply.status() == Some(404));
}

#[tokio::test(start_paused = true)]
async fn server_errors_are_retried_only_when_enabled() {
    let transport = Scripted::new([Ok(status(503)), Ok(status(503))]);
    let reply = client(&transport, vec![Arc::new(retryer(3))])
        .get(URL, params![])
        .await;
    check!(transport.calls() == 1);
    check!(reply.status() == Some(503));

    let transport = Scripted::new([Ok(status(503)), Ok(status(502))]);
    let reply = client(&transport, vec![Arc::new(retryer(3).retry_server_errors())])
        .get(URL, params![])
        .await;
    check!(transport.calls() == 3);
    check!(reply.status() == Some(200));
}

#[tokio::test]
async fn plugins_run_in_registration_order() {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let transport = Scripted::default();
    let client = client(
        &transport,
        vec![Recorder::new("outer", &journal), Recorder::new("inner", &journal)],
    );
    client.use_plugin(Shared(Recorder::new("late", &journal)));

    let reply = client.get(URL, params![]).await;
    check!(reply.status() == Some(200));
    check!(
        *journal.lock().expect("lock")
            == [
                "outer before",
                "inner before",
                "late before",
                "late after",
                "inner after",
                "outer after",
            ]
    );
}

#[tokio::test(start_paused = true)]
async fn retry_in_the_middle_reruns_downstream_plugins() {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let transport = Scripted::new([Err(Error::connection("reset"))]);
    let client = client(
        &transport,
        vec![
            Recorder::new("outer", &journal),
            Arc::new(retryer(2)),
            Recorder::new("inner", &journal),
        ],
    );

    let reply = client.get(URL, params![]).await;
    check!(reply.status() == Some(200));
    check!(transport.calls() == 2);
    check!(
        *journal.lock().expect("lock")
            == [
                "outer before",
                "inner before",
                "inner after",
                "inner before",
                "inner after",
                "outer after",
            ]
    );
}

fn cached(ctx: &mut Context) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        ctx.set_response(Some(status(304)));
        Ok(())
    })
}

#[tokio::test]
async fn plugin_can_short_circuit() {
    let transport = Scripted::default();
    let reply = Client::builder()
        .transport(transport.clone())
        .plugin(Logger::new())
        .plugin(cached)
        .build()
        .get(URL, params![])
        .await;

    check!(transport.calls() == 0);
    check!(reply.status() == Some(304));
}

fn swallow(_ctx: &mut Context) -> BoxFuture<'_, Result<()>> {
    Box::pin(async { Ok(()) })
}

#[tokio::test]
async fn pipeline_without_response_is_invalid() {
    let transport = Scripted::default();
    let reply = Client::builder()
        .transport(transport.clone())
        .plugin(swallow)
        .build()
        .get(URL, params![])
        .await;

    check!(transport.calls() == 0);
    check!(matches!(reply.error(), Some(Error::InvalidRequest(_))));
}

fn tag(ctx: &mut Context) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        ctx.request_mut().set_header("X-Plugin", "tagged")?;
        ctx.next().await
    })
}

#[tokio::test]
async fn plugin_changes_reach_the_transport() {
    let transport = Scripted::default();
    let reply = Client::builder()
        .transport(transport.clone())
        .plugin(tag)
        .build()
        .get(URL, params![])
        .await;

    let_assert!(Some(request) = reply.request());
    check!(request.header("x-plugin") == Some("tagged"));
}

#[tokio::test(start_paused = true)]
async fn timeout_bounds_the_rest_of_the_pipeline() {
    let transport = Scripted::slow(Duration::from_secs(10));
    let reply = client(&transport, vec![Arc::new(Timeout::new(Duration::from_secs(1)))])
        .get(URL, params![])
        .await;

    check!(transport.calls() == 1);
    check!(reply.error().is_some_and(Error::is_timeout));
}

#[tokio::test(start_paused = true)]
async fn timeout_per_attempt_is_retried() {
    let transport = Scripted::slow(Duration::from_secs(10));
    let reply = client(
        &transport,
        vec![
            Arc::new(retryer(3)),
            Arc::new(Timeout::new(Duration::from_secs(1))),
        ],
    )
    .get(URL, params![])
    .await;

    check!(transport.calls() == 3);
    check!(reply.error().is_some_and(Error::is_timeout));
}

/// Formatted `tracing` output of the current thread.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().expect("lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    fn output(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("lock")).into_owned()
    }
}

fn position(output: &str, needle: &str) -> usize {
    output
        .find(needle)
        .unwrap_or_else(|| panic!("{needle:?} not logged:\n{output}"))
}

#[tokio::test]
async fn logger_dumps_request_before_and_response_after_transport() {
    let logs = Captured::default();
    let _guard = logs.install();

    let transport = Scripted::new([Ok(Response::new(
        200,
        HeaderMap::new(),
        Bytes::from_static(b"bookA"),
    ))]);
    let reply = Client::builder()
        .transport(transport.clone())
        .plugin(Logger::new())
        .build()
        .get(URL, params![Header::new().add("X-Trace", "on")])
        .await;
    check!(reply.status() == Some(200));

    let output = logs.output();
    let request_dump = position(&output, "GET http://books.test/books HTTP/1.1");
    let header = position(&output, "x-trace: on");
    let round_trip = position(&output, "transport round trip");
    let response_dump = position(&output, "HTTP/1.1 200 OK");
    let body = position(&output, "bookA");
    let summary = position(&output, "request completed");

    check!(request_dump < header);
    check!(header < round_trip);
    check!(round_trip < response_dump);
    check!(response_dump < body);
    check!(body < summary);
}

#[tokio::test]
async fn logger_reports_pipeline_errors() {
    let logs = Captured::default();
    let _guard = logs.install();

    let transport = Scripted::new([Err(Error::connection("connection refused"))]);
    let reply = Client::builder()
        .transport(transport.clone())
        .plugin(Logger::new())
        .build()
        .get(URL, params![])
        .await;
    check!(reply.error().is_some_and(Error::is_connection));

    let output = logs.output();
    let request_dump = position(&output, "GET http://books.test/books HTTP/1.1");
    let round_trip = position(&output, "transport round trip");
    let failure = position(&output, "request failed");

    check!(request_dump < round_trip);
    check!(round_trip < failure);
    check!(output[failure..].contains("connection refused"));
    check!(!output.contains("received response"));
}

#[tokio::test]
async fn summary_logger_skips_dumps() {
    let logs = Captured::default();
    let _guard = logs.install();

    let transport = Scripted::default();
    let reply = Client::builder()
        .transport(transport.clone())
        .plugin(Logger::summary())
        .build()
        .get(URL, params![])
        .await;
    check!(reply.status() == Some(200));

    let output = logs.output();
    check!(output.contains("request completed"));
    check!(!output.contains("HTTP/1.1"));
}
