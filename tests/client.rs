use std::time::Duration;

use onewire_etl::{OneWireClient, OneWireError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const DOCUMENT: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\r\n\
<Devices-Detail-Response xmlns=\"http://www.embeddeddatasystems.com/schema/owserver\">\r\n\
<PollCount>77</PollCount>\r\n\
<DevicesConnected>2</DevicesConnected>\r\n\
<DeviceName>OW-SERVER-ENET-2</DeviceName>\r\n\
<FutureField>1</FutureField>\r\n\
<owd_EDS0065><ROMId>AA00000000000001</ROMId><PrimaryValue>42.5 %RH</PrimaryValue>\
<Temperature>21.0</Temperature><Humidity>42.5</Humidity></owd_EDS0065>\r\n\
<owd_EDS0068><ROMId>BB00000000000002</ROMId><Temperature>18.5</Temperature>\
<BarometricPressureMb>1009.1</BarometricPressureMb><Light>120</Light></owd_EDS0068>\r\n\
</Devices-Detail-Response>\r\n";

fn ok_response() -> Vec<u8> {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/xml\r\n\r\n{}",
        DOCUMENT
    )
    .into_bytes()
}

/// Accept one connection, read the request and answer with `chunks`,
/// pausing between them so they arrive as separate reads.
async fn fake_bridge(chunks: Vec<Vec<u8>>) -> (u16, tokio::task::JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 256];
        while !request.ends_with(b"\r\n\r\n") {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        for chunk in chunks {
            stream.write_all(&chunk).await.unwrap();
            stream.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        request
    });

    (port, handle)
}

fn client(port: u16) -> OneWireClient {
    OneWireClient::new("127.0.0.1", port, Duration::from_secs(2))
}

#[tokio::test]
async fn poll_decodes_reading_and_disconnects() {
    let (port, bridge) = fake_bridge(vec![ok_response()]).await;
    let mut client = client(port);

    let reading = client.poll().await.unwrap();
    assert_eq!(reading.poll_count, Some(77));
    assert_eq!(reading.device_name.as_deref(), Some("OW-SERVER-ENET-2"));
    assert_eq!(reading.eds0065[0].relative_humidity, Some(42.5));
    assert_eq!(reading.eds0068[0].illuminance, Some(120));
    assert!(!client.is_connected());

    let request = bridge.await.unwrap();
    assert_eq!(request, b"GET /details.xml HTTP/1.1\r\n\r\n");

    assert_eq!(client.list_sensor_readings().len(), 2);
    let temperatures = client.list_temperatures();
    assert_eq!(temperatures.len(), 2);
    assert_eq!(temperatures[1].rom_id, Some("BB00000000000002"));
    assert_eq!(client.list_humidities().len(), 1);
}

#[tokio::test]
async fn poll_assembles_split_response() {
    let bytes = ok_response();
    let third = bytes.len() / 3;
    let chunks = vec![
        bytes[..third].to_vec(),
        bytes[third..bytes.len() - 10].to_vec(),
        bytes[bytes.len() - 10..].to_vec(),
    ];
    let (port, bridge) = fake_bridge(chunks).await;
    let mut client = client(port);

    let reading = client.poll().await.unwrap();
    assert_eq!(reading.poll_count, Some(77));
    assert_eq!(reading.sensor_count(), 2);
    bridge.await.unwrap();
}

#[tokio::test]
async fn not_found_is_protocol_error() {
    let (port, bridge) = fake_bridge(vec![b"HTTP/1.1 404 Not Found\r\n\r\n".to_vec()]).await;
    let mut client = client(port);

    let err = client.poll().await.unwrap_err();
    assert!(matches!(err, OneWireError::Protocol { code: Some(404), .. }));
    assert!(client.last_reading().is_none());
    assert!(client.list_sensor_readings().is_empty());
    assert!(!client.is_connected());
    bridge.await.unwrap();
}

#[tokio::test]
async fn early_close_is_truncated_response() {
    let mut bytes = ok_response();
    bytes.truncate(bytes.len() - 12);
    let (port, bridge) = fake_bridge(vec![bytes]).await;
    let mut client = client(port);

    let err = client.poll().await.unwrap_err();
    assert!(matches!(err, OneWireError::TruncatedResponse { .. }));
    assert!(!client.is_connected());
    bridge.await.unwrap();
}

#[tokio::test]
async fn bad_field_fails_whole_poll() {
    let body = DOCUMENT.replace("<PollCount>77</PollCount>", "<PollCount>x</PollCount>");
    let response = format!("HTTP/1.1 200 OK\r\n\r\n{}", body).into_bytes();
    let (port, bridge) = fake_bridge(vec![response]).await;
    let mut client = client(port);

    let err = client.poll().await.unwrap_err();
    assert!(matches!(err, OneWireError::Decode(_)));
    assert!(!client.is_connected());
    bridge.await.unwrap();
}

#[tokio::test]
async fn unreachable_port_is_connection_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut client = client(port);
    let err = client.connect("127.0.0.1", port).await.unwrap_err();
    assert!(matches!(err, OneWireError::Connection { .. }));
    assert!(!client.is_connected());

    assert!(client.disconnect().await.is_ok());
    assert!(matches!(
        client.poll().await,
        Err(OneWireError::Connection { .. })
    ));
}

#[tokio::test]
async fn explicit_connect_then_poll() {
    let (port, bridge) = fake_bridge(vec![ok_response()]).await;
    let mut client = OneWireClient::new("localhost-unused", 1, Duration::from_secs(2));

    client.connect("127.0.0.1", port).await.unwrap();
    assert!(client.is_connected());

    let reading = client.poll().await.unwrap();
    assert_eq!(reading.total_devices, Some(2));
    assert!(!client.is_connected());
    bridge.await.unwrap();
}
