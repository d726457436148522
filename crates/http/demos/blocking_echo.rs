//! Echoes every request body back, reading bodies on blocking threads.
//!
//! ```sh
//! cargo run --example blocking_echo
//! curl -d 'hello' http://127.0.0.1:8080/
//! ```

use std::io::{self, Read};
use std::sync::Arc;

use micro_http_input::config::InputConfig;
use micro_http_input::connection::HttpConnection;
use micro_http_input::endpoint::TcpEndPoint;
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Handle;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> io::Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = InputConfig::default();

    info!(port = 8080, "start listening");
    let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
        Ok(tcp_listener) => tcp_listener,
        Err(e) => {
            error!(cause = %e, "bind server error");
            return Err(e);
        }
    };

    loop {
        let (tcp_stream, remote_addr) = match tcp_listener.accept().await {
            Ok(stream_and_addr) => stream_and_addr,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };

        let handle = Handle::current();
        let endpoint = Arc::new(TcpEndPoint::new(tcp_stream, handle.clone(), &config));
        let connection = HttpConnection::new(endpoint, &config);

        tokio::task::spawn_blocking(move || {
            if let Err(e) = serve(&connection, &handle) {
                warn!(%remote_addr, cause = %e, "connection closed with error");
            }
            connection.endpoint().close();
        });
    }
}

fn serve(connection: &HttpConnection<TcpEndPoint>, handle: &Handle) -> io::Result<()> {
    while let Some(header) = connection.read_request_header()? {
        let mut body = Vec::new();
        connection.input().read_to_end(&mut body)?;
        info!(uri = %header.uri(), size = body.len(), "echo request body");

        let head = format!("HTTP/1.1 200 OK\r\ncontent-length: {}\r\n\r\n", body.len());
        write_all(connection.endpoint().stream(), handle, head.as_bytes())?;
        write_all(connection.endpoint().stream(), handle, &body)?;

        if !connection.complete_request() {
            break;
        }
    }
    Ok(())
}

fn write_all(stream: &TcpStream, handle: &Handle, mut bytes: &[u8]) -> io::Result<()> {
    while !bytes.is_empty() {
        handle.block_on(stream.writable())?;
        match stream.try_write(bytes) {
            Ok(written) => bytes = &bytes[written..],
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
