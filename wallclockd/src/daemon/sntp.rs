use std::time::Duration;

use rand::Rng;
use tokio::net::{lookup_host, UdpSocket};
use tracing::{debug, instrument};

use wallclock_proto::{
    client_packet, parse_server_packet, NtpTimestamp, PacketError, WallClockTime, PACKET_SIZE,
};

use super::config::TimeSourceConfig;

#[derive(Debug, thiserror::Error)]
pub enum SntpError {
    #[error("io error during fetch: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not resolve the time server address")]
    UnresolvableServer,
    #[error("timed out waiting for the server's response")]
    Timeout,
    #[error("invalid server response: {0}")]
    Packet(#[from] PacketError),
}

/// Query the configured server once and return the current UTC time.
///
/// The request carries a randomized origin timestamp so that responses can be
/// matched to it without leaking the local clock onto the network.
#[instrument(skip(config), fields(server = %config.server))]
pub async fn fetch_utc_time(config: &TimeSourceConfig) -> Result<WallClockTime, SntpError> {
    let addr = lookup_host(&config.server)
        .await?
        .next()
        .ok_or(SntpError::UnresolvableServer)?;

    let bind_addr = if addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
    let socket = UdpSocket::bind(bind_addr).await?;
    socket.connect(addr).await?;

    let origin = NtpTimestamp::from_bits(rand::thread_rng().gen());
    socket.send(&client_packet(origin)).await?;
    debug!("request sent, awaiting response");

    let mut buf = [0u8; PACKET_SIZE];
    let received = tokio::time::timeout(
        Duration::from_secs(config.timeout),
        socket.recv(&mut buf),
    )
    .await
    .map_err(|_| SntpError::Timeout)??;

    let transmit = parse_server_packet(&buf[..received], origin)?;
    let utc = WallClockTime::from_unix(transmit.to_unix());
    debug!(?utc, "received server time");

    Ok(utc)
}

#[cfg(test)]
mod tests {
    use super::*;

    use wallclock_proto::server_packet;

    /// Answer a single request, copying its transmit timestamp (bytes 40..48)
    /// into the response's origin field (bytes 24..32) like a real server.
    async fn serve_once(
        transmit: NtpTimestamp,
        corrupt: impl FnOnce(&mut [u8; PACKET_SIZE]) + Send + 'static,
    ) -> TimeSourceConfig {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let config = TimeSourceConfig {
            server: server.local_addr().unwrap().to_string(),
            timeout: 5,
        };

        tokio::spawn(async move {
            let mut buf = [0u8; PACKET_SIZE];
            let (len, peer) = server.recv_from(&mut buf).await.unwrap();
            assert_eq!(len, PACKET_SIZE);

            let mut response = server_packet(NtpTimestamp::default(), transmit);
            response[24..32].copy_from_slice(&buf[40..48]);
            corrupt(&mut response);
            server.send_to(&response, peer).await.unwrap();
        });

        config
    }

    #[tokio::test]
    async fn fetches_time_from_server() {
        // 2024-07-15 18:30:00 UTC
        let transmit = NtpTimestamp::from_seconds_since_ntp_epoch(3_930_057_000);
        let config = serve_once(transmit, |_| {}).await;

        let utc = fetch_utc_time(&config).await.unwrap();
        assert_eq!(utc.date.year, 2024);
        assert_eq!(utc.date.month, 7);
        assert_eq!(utc.date.day, 15);
        assert_eq!(utc.hour, 18);
        assert_eq!(utc.minute, 30);
        assert_eq!(utc.second, 0);
        assert_eq!(utc.weekday, 0);
    }

    #[tokio::test]
    async fn rejects_kiss_of_death() {
        let transmit = NtpTimestamp::from_seconds_since_ntp_epoch(3_930_057_000);
        let config = serve_once(transmit, |response| response[1] = 0).await;

        let result = fetch_utc_time(&config).await;
        assert!(matches!(
            result,
            Err(SntpError::Packet(PacketError::KissOfDeath))
        ));
    }

    #[tokio::test]
    async fn times_out_without_response() {
        // bind a socket that never answers
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let config = TimeSourceConfig {
            server: server.local_addr().unwrap().to_string(),
            timeout: 0,
        };

        let result = fetch_utc_time(&config).await;
        assert!(matches!(result, Err(SntpError::Timeout)));
    }
}
