//! Workers as separate processes, reached over HTTP.
//!
//! A worker process serves `POST /task` and `POST /release` and shuts itself down after the
//! first of either, since a worker never gets a second task.

use log::{info, warn};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use space_tree::bound::Bound;
use space_tree::distributed::transport::{PendingReply, WorkerTransport};
use space_tree::distributed::wire::Frame;
use space_tree::distributed::worker::run_task;
use space_tree::error::Error;
use space_tree::rule::TaskRule;
use space_tree::statistic::Statistic;

type ShutdownSignal = Arc<Mutex<Option<oneshot::Sender<()>>>>;

fn text_response(status: StatusCode, text: String) -> Response<Body> {
    let mut response = Response::new(Body::from(text));
    *response.status_mut() = status;
    response
}

fn signal_shutdown(shutdown: &ShutdownSignal) {
    if let Ok(mut guard) = shutdown.lock() {
        if let Some(sender) = guard.take() {
            let _ = sender.send(());
        }
    }
}

async fn handle<B, S, R>(req: Request<Body>, shutdown: ShutdownSignal) -> Result<Response<Body>, Infallible>
where
    B: Bound + 'static,
    S: Statistic + 'static,
    R: TaskRule<B, S>,
{
    if req.method() != Method::POST {
        return Ok(text_response(StatusCode::METHOD_NOT_ALLOWED, "only POST is served".to_string()));
    }

    let path = req.uri().path().to_string();

    let body: Bytes = match hyper::body::to_bytes(req.into_body()).await {
        Ok(x) => x,
        Err(e) => return Ok(text_response(StatusCode::BAD_REQUEST, e.to_string())),
    };

    let response = match path.as_str() {
        "/task" => {
            let worker = Frame::from_bytes(&body).map(|x| x.worker).unwrap_or(0);
            info!("worker {} has received a message", worker);

            let frame = body.to_vec();
            let reply = match tokio::task::spawn_blocking(move || run_task::<B, S, R>(worker, &frame)).await {
                Ok(x) => x,
                Err(e) => Frame::failure(worker, &e.to_string()),
            };

            info!("worker {} is sending results", worker);
            Response::new(Body::from(reply.to_bytes()))
        }
        "/release" => {
            info!("released without a task");
            Response::new(Body::empty())
        }
        other => return Ok(text_response(StatusCode::NOT_FOUND, format!("no route {}", other))),
    };

    signal_shutdown(&shutdown);

    Ok(response)
}

/// Starts a worker on `addr` and returns the address it is bound to with the handle of the
/// server task, which completes once the worker has answered.
pub fn spawn_worker<B, S, R>(addr: SocketAddr) -> Result<(SocketAddr, JoinHandle<Result<(), Error>>), Error>
where
    B: Bound + 'static,
    S: Statistic + 'static,
    R: TaskRule<B, S>,
{
    let (sender, receiver) = oneshot::channel::<()>();
    let shutdown: ShutdownSignal = Arc::new(Mutex::new(Some(sender)));

    let make_svc = make_service_fn(move |_conn| {
        let shutdown = shutdown.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let shutdown = shutdown.clone();
                handle::<B, S, R>(req, shutdown)
            }))
        }
    });

    let server = Server::try_bind(&addr)
        .map_err(|e| Error::Transport(format!("cannot listen on {}: {}", addr, e)))?
        .serve(make_svc);
    let local_addr = server.local_addr();

    let graceful = server.with_graceful_shutdown(async {
        receiver.await.ok();
    });

    info!("worker listening on http://{}", local_addr);

    let handle = tokio::spawn(async move { graceful.await.map_err(|e| Error::Transport(e.to_string())) });

    Ok((local_addr, handle))
}

/// Posts frames to HTTP workers. Worker `i` is the `i`-th address (1-based).
pub struct HttpTransport {
    client: reqwest::Client,
    workers: Vec<String>,
    releases: Vec<JoinHandle<()>>,
}

impl HttpTransport {

    pub fn new(workers: Vec<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            workers,
            releases: Vec::new(),
        }
    }

    fn url(&self, worker: usize, route: &str) -> Result<String, Error> {

        let address = match worker.checked_sub(1).and_then(|i| self.workers.get(i)) {
            None => {
                return Err(Error::DispatchTarget {
                    target: worker,
                    workers: self.workers.len(),
                })
            }
            Some(x) => x,
        };

        let base = match address.starts_with("http://") || address.starts_with("https://") {
            true => address.trim_end_matches('/').to_string(),
            false => format!("http://{}", address),
        };

        Ok(format!("{}/{}", base, route))
    }

    /// Waits for every release message to be delivered.
    pub async fn finish(self) {
        for handle in self.releases {
            if let Err(e) = handle.await {
                warn!("release did not complete: {}", e);
            }
        }
    }
}

async fn post(client: reqwest::Client, url: String, body: Vec<u8>) -> Result<Vec<u8>, Error> {

    let response = client
        .post(&url)
        .body(body)
        .send()
        .await
        .map_err(|e| Error::Transport(format!("{}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(Error::Transport(format!("{} answered {}", url, response.status())));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::Transport(format!("{}: {}", url, e)))?;

    Ok(bytes.to_vec())
}

impl WorkerTransport for HttpTransport {

    fn num_workers(&self) -> usize {
        self.workers.len()
    }

    fn dispatch(&mut self, worker: usize, frame: Frame) -> Result<PendingReply, Error> {

        let url = self.url(worker, "task")?;
        let client = self.client.clone();
        let (sender, reply) = PendingReply::channel();

        tokio::spawn(async move {
            let outcome = post(client, url, frame.to_bytes()).await;
            if sender.send(outcome).is_err() {
                warn!("coordinator stopped waiting for worker {}", worker);
            }
        });

        Ok(reply)
    }

    fn release(&mut self, worker: usize) -> Result<(), Error> {

        let url = self.url(worker, "release")?;
        let client = self.client.clone();

        self.releases.push(tokio::spawn(async move {
            if let Err(e) = post(client, url, Frame::release(worker).to_bytes()).await {
                warn!("could not release worker {}: {}", worker, e);
            }
        }));

        Ok(())
    }
}
