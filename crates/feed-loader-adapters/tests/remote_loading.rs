//! Integration tests for the HTTP loader against a local test server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use feed_loader_adapters::{RemoteConfig, RemoteFeedImageDataLoader, RemoteLoadError};
use feed_loader_core::{FeedImageDataLoader, FetchResult};
use feed_loader_test_support::{FeedImageBuilder, SyntheticImageBuilder};
use url::Url;

/// Canned HTTP response served by [`serve`].
#[derive(Clone)]
struct Reply {
    status: &'static str,
    body: Vec<u8>,
    delay: Duration,
}

impl Reply {
    fn ok(body: Vec<u8>) -> Self {
        Self {
            status: "200 OK",
            body,
            delay: Duration::ZERO,
        }
    }

    fn status(status: &'static str, body: &[u8]) -> Self {
        Self {
            status,
            body: body.to_vec(),
            delay: Duration::ZERO,
        }
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Serves `reply` to every connection on a fresh local port and returns the
/// base URL plus a counter of requests seen.
fn serve(reply: Reply) -> (Url, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            counter.fetch_add(1, Ordering::SeqCst);
            let reply = reply.clone();
            thread::spawn(move || respond(stream, &reply));
        }
    });

    (Url::parse(&format!("http://{addr}/image.png")).unwrap(), hits)
}

fn respond(mut stream: TcpStream, reply: &Reply) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut line = String::new();
    while reader.read_line(&mut line).is_ok_and(|n| n > 0) {
        if line == "\r\n" {
            break;
        }
        line.clear();
    }

    thread::sleep(reply.delay);
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nContent-Type: image/png\r\nConnection: close\r\n\r\n",
        reply.status,
        reply.body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&reply.body);
    let _ = stream.flush();
}

fn make_sut() -> RemoteFeedImageDataLoader {
    let config = RemoteConfig {
        timeout: Duration::from_secs(5),
        ..RemoteConfig::default()
    };
    RemoteFeedImageDataLoader::new(&config).expect("build HTTP loader")
}

fn load(sut: &RemoteFeedImageDataLoader, url: &Url) -> FetchResult {
    let (tx, rx) = mpsc::channel();
    let _task = sut.load_image_data(
        url,
        Box::new(move |result| {
            let _ = tx.send(result);
        }),
    );
    rx.recv_timeout(Duration::from_secs(10)).expect("completion")
}

#[test]
fn test_delivers_body_on_200() {
    let payload = SyntheticImageBuilder::red_png();
    let (url, hits) = serve(Reply::ok(payload.clone()));
    let sut = make_sut();

    let data = load(&sut, &url).expect("success");

    assert_eq!(data, payload);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_non_200_is_invalid_data() {
    for status in ["404 Not Found", "500 Internal Server Error", "201 Created"] {
        let (url, _) = serve(Reply::status(status, b"any data"));
        let sut = make_sut();

        let err = load(&sut, &url).expect_err("failure");
        let code: u16 = status[..3].parse().unwrap();
        assert!(
            matches!(
                err.downcast_ref::<RemoteLoadError>(),
                Some(RemoteLoadError::InvalidData { status: got }) if *got == code
            ),
            "unexpected error for {status}: {err:#}"
        );
    }
}

#[test]
fn test_empty_200_is_invalid_data() {
    let (url, _) = serve(Reply::ok(Vec::new()));
    let sut = make_sut();

    let err = load(&sut, &url).expect_err("failure");

    assert!(matches!(
        err.downcast_ref::<RemoteLoadError>(),
        Some(RemoteLoadError::InvalidData { status: 200 })
    ));
}

#[test]
fn test_connection_refused_is_connectivity_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let url = Url::parse(&format!("http://{addr}/image.png")).unwrap();
    let sut = make_sut();

    let err = load(&sut, &url).expect_err("failure");

    assert!(matches!(
        err.downcast_ref::<RemoteLoadError>(),
        Some(RemoteLoadError::Connectivity(_))
    ));
}

#[test]
fn test_cancel_before_response_never_delivers() {
    let (url, _) = serve(Reply::ok(vec![1, 2, 3]).delayed(Duration::from_millis(200)));
    let sut = make_sut();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let task = sut.load_image_data(
        &url,
        Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );
    task.cancel();
    task.cancel();
    assert_eq!(sut.in_flight(), 0);

    thread::sleep(Duration::from_millis(600));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

/// Streams a `total`-byte 200 response in `chunk`-sized writes separated by
/// `pause`, reporting the running byte count after every write. The channel
/// closes once the server stops writing, either because the body is done or
/// because the client went away.
fn serve_trickle(total: usize, chunk: usize, pause: Duration) -> (Url, mpsc::Receiver<usize>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut line = String::new();
        while reader.read_line(&mut line).is_ok_and(|n| n > 0) {
            if line == "\r\n" {
                break;
            }
            line.clear();
        }

        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {total}\r\nContent-Type: image/png\r\nConnection: close\r\n\r\n"
        );
        if stream.write_all(head.as_bytes()).is_err() {
            return;
        }
        let block = vec![0xAB; chunk];
        let mut written = 0;
        while written < total {
            let len = chunk.min(total - written);
            if stream.write_all(&block[..len]).and_then(|()| stream.flush()).is_err() {
                return;
            }
            written += len;
            let _ = tx.send(written);
            thread::sleep(pause);
        }
    });

    (Url::parse(&format!("http://{addr}/large.png")).unwrap(), rx)
}

#[test]
fn test_cancel_mid_body_abandons_transfer() {
    const TOTAL: usize = 4 * 1024 * 1024;
    let (url, progress) = serve_trickle(TOTAL, 8 * 1024, Duration::from_millis(5));
    let sut = make_sut();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let task = sut.load_image_data(
        &url,
        Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );

    // Let a few 16 KiB reads happen before cancelling.
    loop {
        let written = progress
            .recv_timeout(Duration::from_secs(5))
            .expect("server should start streaming");
        if written >= 64 * 1024 {
            break;
        }
    }
    task.cancel();
    assert_eq!(sut.in_flight(), 0);

    let mut last = 0;
    loop {
        match progress.recv_timeout(Duration::from_secs(10)) {
            Ok(written) => last = written,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => panic!("server never stopped writing"),
        }
    }

    assert!(last < TOTAL, "whole body was sent after cancel ({last} bytes)");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_concurrent_requests_resolve_independently() {
    let (ok_url, _) = serve(Reply::ok(vec![7; 32]));
    let (bad_url, _) = serve(Reply::status("404 Not Found", b""));
    let sut = make_sut();
    let (tx, rx) = mpsc::channel();

    let tx_ok = tx.clone();
    let _a = sut.load_image_data(
        &ok_url,
        Box::new(move |r| tx_ok.send(("ok", r.is_ok())).unwrap()),
    );
    let _b = sut.load_image_data(
        &bad_url,
        Box::new(move |r| tx.send(("bad", r.is_ok())).unwrap()),
    );

    let mut results = vec![
        rx.recv_timeout(Duration::from_secs(10)).unwrap(),
        rx.recv_timeout(Duration::from_secs(10)).unwrap(),
    ];
    results.sort_unstable();
    assert_eq!(results, vec![("bad", false), ("ok", true)]);
}

#[test]
fn test_unreachable_any_url_never_errors_synchronously() {
    let sut = make_sut();
    let url = FeedImageBuilder::url("http://127.0.0.1:9/never.png");

    // Returns a handle immediately; the failure, if any, arrives later.
    let task = sut.load_image_data(&url, Box::new(|_| {}));
    task.cancel();
}
