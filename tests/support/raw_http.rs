//! One-shot HTTP/1.1 media host with control over body timing.
//!
//! wiremock sends each body in one piece, so tests that depend on how the
//! bytes arrive over time use this instead.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use super::socket_guard::should_skip_socket_bound_test;

/// How the body follows the headers.
#[derive(Debug, Clone, Copy)]
pub enum BodyPlan {
    /// `pieces` writes of `piece_len` bytes, `gap` apart.
    Trickle {
        pieces: usize,
        piece_len: usize,
        gap: Duration,
    },
    /// Declares `declared` bytes, sends `sent`, then goes quiet until the
    /// client hangs up.
    StallAfter { sent: usize, declared: usize },
}

impl BodyPlan {
    fn declared_len(self) -> usize {
        match self {
            Self::Trickle {
                pieces, piece_len, ..
            } => pieces * piece_len,
            Self::StallAfter { declared, .. } => declared,
        }
    }
}

/// Serves a single GET with `plan` and returns its URL, or `None` when
/// localhost sockets are unavailable.
pub async fn serve_once(plan: BodyPlan) -> Option<String> {
    if should_skip_socket_bound_test() {
        return None;
    }
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        respond(stream, plan).await;
    });
    Some(format!("http://{addr}/media"))
}

async fn respond(mut stream: TcpStream, plan: BodyPlan) {
    read_request_head(&mut stream).await;
    let head = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: video/mp4\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        plan.declared_len()
    );
    if stream.write_all(head.as_bytes()).await.is_err() {
        return;
    }
    match plan {
        BodyPlan::Trickle {
            pieces,
            piece_len,
            gap,
        } => {
            for index in 0..pieces {
                if index > 0 {
                    tokio::time::sleep(gap).await;
                }
                if stream.write_all(&vec![b'x'; piece_len]).await.is_err() {
                    return;
                }
                let _ = stream.flush().await;
            }
        }
        BodyPlan::StallAfter { sent, .. } => {
            if stream.write_all(&vec![b'x'; sent]).await.is_err() {
                return;
            }
            let _ = stream.flush().await;
            let mut sink = [0_u8; 256];
            while matches!(stream.read(&mut sink).await, Ok(n) if n > 0) {}
        }
    }
}

async fn read_request_head(stream: &mut TcpStream) {
    let mut received = Vec::new();
    let mut buf = [0_u8; 1024];
    while !received.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => received.extend_from_slice(&buf[..n]),
        }
    }
}
