//! Minimal HTTP/1.0 exchange over embassy-net TCP

use embassy_net::dns::DnsQueryType;
use embassy_net::tcp::TcpSocket;
use embassy_net::Stack;
use embassy_time::{with_timeout, Duration};
use smart_street_light::system::error::TelemetryError;

const SOCKET_BUFFER: usize = 1024;

/// Sends `request` to `host:port` and reads the reply into `response` until
/// the peer closes
///
/// The whole exchange, DNS lookup included, is bounded by `timeout`.
/// Returns the number of response bytes.
pub async fn exchange(
    stack: Stack<'_>,
    host: &str,
    port: u16,
    request: &[u8],
    response: &mut [u8],
    timeout: Duration,
) -> Result<usize, TelemetryError> {
    with_timeout(timeout, exchange_inner(stack, host, port, request, response))
        .await
        .map_err(|_| TelemetryError::Timeout)?
}

async fn exchange_inner(
    stack: Stack<'_>,
    host: &str,
    port: u16,
    request: &[u8],
    response: &mut [u8],
) -> Result<usize, TelemetryError> {
    let address = stack
        .dns_query(host, DnsQueryType::A)
        .await
        .map_err(|_| TelemetryError::Dns)?
        .first()
        .copied()
        .ok_or(TelemetryError::Dns)?;

    let mut rx = [0u8; SOCKET_BUFFER];
    let mut tx = [0u8; SOCKET_BUFFER];
    let mut socket = TcpSocket::new(stack, &mut rx, &mut tx);

    socket
        .connect((address, port))
        .await
        .map_err(|_| TelemetryError::Connect)?;

    let mut sent = 0;
    while sent < request.len() {
        let n = socket
            .write(&request[sent..])
            .await
            .map_err(|_| TelemetryError::Io)?;
        if n == 0 {
            return Err(TelemetryError::Io);
        }
        sent += n;
    }
    socket.flush().await.map_err(|_| TelemetryError::Io)?;

    let mut len = 0;
    loop {
        if len == response.len() {
            socket.abort();
            return Err(TelemetryError::Overflow);
        }
        match socket.read(&mut response[len..]).await {
            Ok(0) => break,
            Ok(n) => len += n,
            Err(_) => return Err(TelemetryError::Io),
        }
    }
    socket.close();

    Ok(len)
}
