use hermes::{
    EmptyReadPolicy, OutboundMessage, RelayClient, RelayConfig, RelayServer, SimulatedSource,
    StreamSource,
};
use hermes::source::SimulatedStream;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

const STEP: Duration = Duration::from_secs(5);

async fn start(source: SimulatedSource) -> RelayServer {
    let config = RelayConfig::default().with_host("127.0.0.1").with_port(0);
    RelayServer::new(config, Arc::new(source)).await.unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn relays_simulated_stream_end_to_end() {
        let source = SimulatedSource::with_default_streams();
        let expected: Vec<String> = source.find_streams().into_iter().map(|s| s.name).collect();
        let server = start(source).await;
        assert_ne!(server.connection().port(), 0);

        let mut client = RelayClient::connect(*server.connection()).await.unwrap();
        let streams = timeout(STEP, client.streams()).await.unwrap().unwrap();
        let names: Vec<String> = streams.into_iter().map(|s| s.name).collect();
        assert_eq!(names, expected);

        let channels = timeout(STEP, client.select("SimulatedEEG")).await.unwrap().unwrap();
        assert_eq!(channels.len(), 8);
        assert_eq!(channels[0], "Fp1");

        for _ in 0..2 {
            let frame = timeout(STEP, client.next_frame()).await.unwrap().unwrap().unwrap();
            assert_eq!(frame.selected_channels, channels);
            assert!(!frame.data.is_empty());
            assert_eq!(frame.data.len(), frame.timestamps.len());
            assert!(frame.data.iter().all(|row| row.len() == 8));
            assert!(frame.timestamps.windows(2).all(|w| w[0] < w[1]));
        }

        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn unknown_stream_gets_connect_error() {
        let server = start(SimulatedSource::with_default_streams()).await;
        let mut client = RelayClient::connect(*server.connection()).await.unwrap();

        timeout(STEP, client.streams()).await.unwrap().unwrap();
        let err = timeout(STEP, client.select("NotAStream")).await.unwrap().unwrap_err();
        assert_eq!(err, "Failed to connect to stream.");
        assert_eq!(timeout(STEP, client.next_message()).await.unwrap().unwrap(), None);
    }

    #[tokio::test]
    async fn empty_catalogue_reports_no_streams() {
        let server = start(SimulatedSource::new(vec![])).await;
        let mut client = RelayClient::connect(*server.connection()).await.unwrap();

        let err = timeout(STEP, client.streams()).await.unwrap().unwrap_err();
        assert_eq!(err, "No streams available.");
        assert_eq!(timeout(STEP, client.next_message()).await.unwrap().unwrap(), None);
    }

    #[tokio::test]
    async fn malformed_selection_gets_invalid_name_error() {
        let server = start(SimulatedSource::with_default_streams()).await;
        let mut client = RelayClient::connect(*server.connection()).await.unwrap();

        timeout(STEP, client.streams()).await.unwrap().unwrap();
        client.send_raw("{}").await.unwrap();
        let reply = timeout(STEP, client.next_message()).await.unwrap().unwrap();
        assert_eq!(reply, Some(OutboundMessage::error("Invalid stream name.")));
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let source = SimulatedSource::new(vec![
            SimulatedStream::new("Left", vec!["L1".to_string(), "L2".to_string()], 100.0),
            SimulatedStream::new("Right", vec!["R1".to_string()], 0.0),
        ]);
        let server = start(source).await;

        let mut left = RelayClient::connect(*server.connection()).await.unwrap();
        let mut right = RelayClient::connect(*server.connection()).await.unwrap();
        timeout(STEP, left.streams()).await.unwrap().unwrap();
        timeout(STEP, right.streams()).await.unwrap().unwrap();

        assert_eq!(timeout(STEP, left.select("Left")).await.unwrap().unwrap(), vec!["L1", "L2"]);
        assert_eq!(timeout(STEP, right.select("Right")).await.unwrap().unwrap(), vec!["R1"]);

        let left_frame = timeout(STEP, left.next_frame()).await.unwrap().unwrap().unwrap();
        let right_frame = timeout(STEP, right.next_frame()).await.unwrap().unwrap().unwrap();
        assert!(left_frame.data.iter().all(|row| row.len() == 2));
        assert!(right_frame.data.iter().all(|row| row.len() == 1));

        // Closing one client leaves the other streaming
        left.close().await.unwrap();
        let next = timeout(STEP, right.next_frame()).await.unwrap().unwrap();
        assert!(next.is_some());
    }

    #[tokio::test]
    async fn stalled_session_does_not_take_down_the_listener() {
        // Nothing is buffered until the first 100 ms tick, so the first read is empty
        let source = SimulatedSource::new(vec![SimulatedStream::new(
            "Slow",
            vec!["S1".to_string()],
            0.0,
        )]);
        let config = RelayConfig::default()
            .with_host("127.0.0.1")
            .with_port(0)
            .with_empty_reads(EmptyReadPolicy::immediate().with_max_consecutive(Some(1)));
        let server = RelayServer::new(config, Arc::new(source)).await.unwrap();

        let mut stalled = RelayClient::connect(*server.connection()).await.unwrap();
        timeout(STEP, stalled.streams()).await.unwrap().unwrap();
        let channels = timeout(STEP, stalled.select("Slow")).await.unwrap().unwrap();
        assert_eq!(channels, vec!["S1"]);
        // The session ends on its own; the socket closes without any sample frame
        let after = timeout(STEP, stalled.next_frame()).await.unwrap();
        assert!(matches!(after, Ok(None) | Err(_)), "got {:?}", after);

        let mut next = RelayClient::connect(*server.connection()).await.unwrap();
        let streams = timeout(STEP, next.streams()).await.unwrap().unwrap();
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].name, "Slow");
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_before_binding() {
        let config = RelayConfig::default().with_host("127.0.0.1").with_port(0).with_buffer_size(0);
        let err = RelayServer::new(config, Arc::new(SimulatedSource::with_default_streams()))
            .await
            .err()
            .unwrap();
        assert!(err.contains("buffer size"));
    }
}
