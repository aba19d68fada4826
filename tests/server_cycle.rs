//! End-to-end control server sessions over the mock transport

use fence_sentry::{
    hal::{MockCall, MockDistance, MockTemperature, MockTransport},
    ConnectionServer, DeviceState, Monitor, RequestKind, SensorConfig, SensorSource,
    ServeOutcome, ServerConfig, WifiConfig,
};

/// Browser-like headers carrying six `=` before the form body.
const HEADERS: &str = "POST / HTTP/1.1\r\n\
                       Host: 192.168.1.20\r\n\
                       Cache-Control: max-age=0\r\n\
                       Cookie: a=1; b=2; c=3; d=4; e=5\r\n\
                       Content-Type: application/x-www-form-urlencoded\r\n\r\n";

fn post(body: &str) -> Vec<u8> {
    format!("{}{}", HEADERS, body).into_bytes()
}

fn get() -> &'static [u8] {
    b"GET / HTTP/1.1\r\nHost: 192.168.1.20\r\nAccept: text/html\r\n\r\n"
}

/// Monitor whose sensors always report the same raw range and temperature.
fn steady_monitor(raw_mm: u16, celsius: u8, polls: usize) -> Monitor<MockDistance, MockTemperature> {
    let mut distance = MockDistance::new();
    distance.queue_mm(&vec![raw_mm; polls]);
    let mut temperature = MockTemperature::new();
    temperature.queue_c(&vec![celsius; polls]);
    Monitor::new(SensorSource::new(
        distance,
        temperature,
        &SensorConfig::default(),
    ))
}

fn page(transport: &MockTransport, index: usize) -> String {
    String::from_utf8(transport.responses[index].clone()).unwrap()
}

// ============================================================================
// Page Content
// ============================================================================

#[test]
fn get_serves_page_with_live_readings() {
    let state = DeviceState::new(70);
    let mut transport = MockTransport::new();
    transport.queue_client(get());
    transport.queue_client(&post("fenceNum=070&stop_server=1"));

    let mut monitor = steady_monitor(470, 25, 4);
    let mut server = ConnectionServer::new(transport, &state, ServerConfig::default());
    server.run(&WifiConfig::default(), &mut monitor).unwrap();

    let html = page(server.transport(), 0);
    assert!(html.starts_with("HTTP/1.0 200 OK\r\n"));
    assert!(html.contains("value=\"420\"> mm"));
    assert!(html.contains("value=\"77\"> <sup>O</sup>F"));
    assert!(html.contains("value=\"70\"> mm"));
    assert!(html.contains("background-color:grey"));
}

#[test]
fn far_range_shows_no_object() {
    let state = DeviceState::new(70);
    let mut transport = MockTransport::new();
    transport.queue_client(get());
    transport.queue_client(&post("fenceNum=070&stop_server=1"));

    // 2550 raw - 50 offset = 2500 mm
    let mut monitor = steady_monitor(2550, 20, 4);
    let mut server = ConnectionServer::new(transport, &state, ServerConfig::default());
    server.run(&WifiConfig::default(), &mut monitor).unwrap();

    assert!(page(server.transport(), 0).contains("No Object Detected!"));
}

#[test]
fn triggered_alarm_turns_page_red() {
    let state = DeviceState::new(70);
    let mut transport = MockTransport::new();
    transport.queue_client(get());
    transport.queue_client(&post("fenceNum=070&stop_server=1"));

    // 90 raw - 50 offset = 40 mm, inside the fence on the first poll
    let mut monitor = steady_monitor(90, 20, 4);
    let mut server = ConnectionServer::new(transport, &state, ServerConfig::default());
    server.run(&WifiConfig::default(), &mut monitor).unwrap();

    assert!(state.alarm.is_triggered());
    let html = page(server.transport(), 0);
    assert!(html.contains("WARNING!!! ALARM HAS BEEN TRIGGERED!"));
    assert!(html.contains("background-color:red"));
}

// ============================================================================
// Fence Updates
// ============================================================================

#[test]
fn zero_padded_fence_value() {
    let state = DeviceState::new(70);
    let mut transport = MockTransport::new();
    transport.queue_client(&post("fenceNum=075&stop_server=1"));

    let mut server = ConnectionServer::new(transport, &state, ServerConfig::default());
    server.run(&WifiConfig::default(), &mut steady_monitor(500, 20, 2)).unwrap();

    assert_eq!(state.fence.get(), 75);
    assert!(page(server.transport(), 0).contains("value=\"75\"> mm"));
}

#[test]
fn three_digit_then_two_digit_fence_across_connections() {
    let state = DeviceState::new(70);
    let mut transport = MockTransport::new();
    transport.queue_client(&post("fenceNum=150&stop_server=0"));
    transport.queue_client(&post("fenceNum=45&stop_server=0"));
    transport.queue_client(&post("fenceNum=45&stop_server=1"));

    let mut server = ConnectionServer::new(transport, &state, ServerConfig::default());
    let mut monitor = steady_monitor(500, 20, 2);

    server.serve(&mut monitor);
    assert_eq!(state.fence.get(), 45);
    assert!(page(server.transport(), 0).contains("value=\"150\"> mm"));
    assert!(page(server.transport(), 1).contains("value=\"45\"> mm"));
}

#[test]
fn moving_the_fence_changes_what_trips_the_alarm() {
    let state = DeviceState::new(70);
    let mut transport = MockTransport::new();
    transport.queue_timeout();
    transport.queue_client(&post("fenceNum=300&stop_server=0"));
    transport.queue_timeout();
    transport.queue_client(&post("fenceNum=300&stop_server=1"));

    // 250 raw - 50 offset = 200 mm: outside 70, inside 300
    let mut monitor = steady_monitor(250, 20, 4);
    let mut server = ConnectionServer::new(transport, &state, ServerConfig::default());

    server.serve(&mut monitor);
    assert!(state.alarm.is_triggered());
    assert!(!page(server.transport(), 0).contains("ALARM HAS BEEN TRIGGERED"));
    assert!(page(server.transport(), 1).contains("ALARM HAS BEEN TRIGGERED"));
}

#[test]
fn post_without_seventh_field_keeps_fence() {
    let state = DeviceState::new(70);
    let mut transport = MockTransport::new();
    transport.queue_client(b"POST / HTTP/1.1\r\n\r\nfenceNum=120&stop_server=1");

    let mut server = ConnectionServer::new(transport, &state, ServerConfig::default());
    server.serve(&mut steady_monitor(500, 20, 1));

    assert_eq!(state.fence.get(), 70);
    assert_eq!(server.transport().responses.len(), 1);
}

#[test]
fn custom_field_index() {
    let state = DeviceState::new(70);
    let mut transport = MockTransport::new();
    transport.queue_client(b"POST / HTTP/1.1\r\n\r\nfenceNum=220&stop_server=1");

    let config = ServerConfig::default().with_fence_field_index(1);
    let mut server = ConnectionServer::new(transport, &state, config);
    server.serve(&mut steady_monitor(500, 20, 1));

    assert_eq!(state.fence.get(), 220);
}

// ============================================================================
// Stop Requests
// ============================================================================

#[test]
fn stop_zero_and_absent_keep_serving() {
    let state = DeviceState::new(70);
    let mut transport = MockTransport::new();
    transport.queue_client(&post("fenceNum=100&stop_server=0"));
    transport.queue_client(&post("fenceNum=100"));
    transport.queue_client(get());
    transport.queue_client(&post("fenceNum=100&stop_server=1"));

    let mut server = ConnectionServer::new(transport, &state, ServerConfig::default());
    server.serve(&mut steady_monitor(500, 20, 1));

    assert_eq!(server.transport().responses.len(), 4);
    assert_eq!(server.transport().pending(), 0);
    assert_eq!(server.transport().calls.last(), Some(&MockCall::StopListener));
}

#[test]
fn stop_on_get_is_ignored() {
    let state = DeviceState::new(70);
    let mut transport = MockTransport::new();
    transport.queue_client(b"GET /?stop_server=1 HTTP/1.1\r\n\r\n");
    transport.queue_client(&post("fenceNum=100&stop_server=1"));

    let mut server = ConnectionServer::new(transport, &state, ServerConfig::default());
    server.serve(&mut steady_monitor(500, 20, 1));

    assert_eq!(server.transport().responses.len(), 2);
}

#[test]
fn stop_request_still_gets_a_page() {
    let state = DeviceState::new(70);
    let mut transport = MockTransport::new();
    transport.queue_client(&post("fenceNum=100&stop_server=1"));

    let mut server = ConnectionServer::new(transport, &state, ServerConfig::default());
    let outcome = server.accept_once(&mut steady_monitor(500, 20, 1));

    assert_eq!(
        outcome,
        Some(ServeOutcome::Responded {
            kind: RequestKind::Post,
            stop: true
        })
    );
    assert_eq!(server.transport().responses.len(), 1);
    assert_eq!(server.transport().close_count, 1);
}

// ============================================================================
// Faults
// ============================================================================

#[test]
fn faults_do_not_end_the_session() {
    let state = DeviceState::new(70);
    let mut transport = MockTransport::new();
    transport.queue_wait_fault();
    transport.queue_client_closed();
    transport.queue_client_receive_fault();
    transport.queue_client(b"PUT / HTTP/1.1\r\n\r\n");
    transport.queue_client(&post("fenceNum=100&stop_server=1"));
    transport.fail_close = true;

    let mut server = ConnectionServer::new(transport, &state, ServerConfig::default());
    server.serve(&mut steady_monitor(500, 20, 2));

    let transport = server.transport();
    assert_eq!(transport.responses.len(), 1);
    // Every accepted client is closed, even when closing fails
    assert_eq!(transport.close_count, 4);
    assert_eq!(state.fence.get(), 100);
}

#[test]
fn short_write_is_not_fatal() {
    let state = DeviceState::new(70);
    let mut transport = MockTransport::new();
    transport.send_limit = Some(100);
    transport.queue_client(get());
    transport.queue_client(&post("fenceNum=100&stop_server=1"));

    let mut server = ConnectionServer::new(transport, &state, ServerConfig::default());
    server.serve(&mut steady_monitor(500, 20, 1));

    let transport = server.transport();
    assert_eq!(transport.responses.len(), 2);
    assert!(transport.responses.iter().all(|r| r.len() == 100));
    assert_eq!(state.fence.get(), 100);
}

#[test]
fn failed_stop_listener_still_returns() {
    let state = DeviceState::new(70);
    let mut transport = MockTransport::new();
    transport.fail_stop_listener = true;
    transport.queue_client(&post("fenceNum=100&stop_server=1"));

    let mut server = ConnectionServer::new(transport, &state, ServerConfig::default());
    assert!(server
        .run(&WifiConfig::default(), &mut steady_monitor(500, 20, 1))
        .is_ok());
}

// ============================================================================
// Sensor Polling Between Clients
// ============================================================================

#[test]
fn every_timeout_polls_the_sensors() {
    let state = DeviceState::new(70);
    let mut transport = MockTransport::new();
    for _ in 0..5 {
        transport.queue_timeout();
    }
    transport.queue_client(&post("fenceNum=100&stop_server=1"));

    let mut monitor = steady_monitor(500, 20, 10);
    let mut server = ConnectionServer::new(transport, &state, ServerConfig::default());
    server.serve(&mut monitor);

    // One poll before the first wait plus one per timeout
    assert_eq!(monitor.sensors().last().distance_mm, 450);
    let (distance, _) = monitor_into_parts(monitor);
    assert_eq!(distance.read_count, 6);
}

#[test]
fn page_shows_reading_from_latest_poll() {
    let state = DeviceState::new(999);
    let mut distance = MockDistance::new();
    distance.queue_mm(&[300, 800]);
    let mut temperature = MockTemperature::new();
    temperature.queue_c(&[20, 30]);
    let mut monitor = Monitor::new(SensorSource::new(
        distance,
        temperature,
        &SensorConfig::default(),
    ));

    let mut transport = MockTransport::new();
    transport.queue_timeout();
    transport.queue_client(&post("fenceNum=999&stop_server=1"));
    let mut server = ConnectionServer::new(transport, &state, ServerConfig::default());
    server.serve(&mut monitor);

    let html = page(server.transport(), 0);
    assert!(html.contains("value=\"750\"> mm"));
    assert!(html.contains("value=\"86\"> <sup>O</sup>F"));
}

fn monitor_into_parts(
    monitor: Monitor<MockDistance, MockTemperature>,
) -> (MockDistance, MockTemperature) {
    monitor.into_inner().into_inner()
}
