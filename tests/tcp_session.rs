//! Control server over a real localhost socket

use std::io::{Read, Write};
use std::net::{Ipv4Addr, TcpStream};
use std::thread;
use std::time::Duration;

use fence_sentry::{
    hal::{MockDistance, MockTemperature, TcpTransport},
    ConnectionServer, DeviceState, Monitor, SensorConfig, SensorSource, ServerConfig, Transport,
};

static DEVICE: DeviceState = DeviceState::new(70);

const POST_PREFIX: &str = "POST / HTTP/1.1\r\n\
                           Host: localhost\r\n\
                           Cache-Control: max-age=0\r\n\
                           Cookie: a=1; b=2; c=3; d=4; e=5\r\n\r\n";

fn exchange(port: u16, request: &[u8]) -> String {
    let mut stream = TcpStream::connect((Ipv4Addr::LOCALHOST, port)).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    stream.write_all(request).unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();
    response
}

#[test]
fn browser_session_over_tcp() {
    let mut transport =
        TcpTransport::new(Ipv4Addr::LOCALHOST).with_accept_poll(Duration::from_millis(2));
    transport.start_listener(0).unwrap();
    let port = transport.local_port().unwrap();

    let config = ServerConfig::default()
        .with_accept_timeout_ms(50)
        .with_receive_timeout_ms(2000)
        .with_send_timeout_ms(2000);

    let server = thread::spawn(move || {
        let mut distance = MockDistance::new();
        distance.queue_mm(&[650; 256]);
        let mut temperature = MockTemperature::new();
        temperature.queue_c(&[21; 256]);
        let mut monitor = Monitor::new(SensorSource::new(
            distance,
            temperature,
            &SensorConfig::default(),
        ));

        let mut server = ConnectionServer::new(transport, &DEVICE, config);
        server.serve(&mut monitor);
        server.into_transport()
    });

    let page = exchange(port, b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n");
    assert!(page.starts_with("HTTP/1.0 200 OK\r\n"));
    assert!(page.contains("value=\"600\"> mm"));
    assert!(page.ends_with("</html>\r\n"));

    let page = exchange(port, format!("{}fenceNum=250&stop_server=0", POST_PREFIX).as_bytes());
    assert!(page.contains("value=\"250\"> mm"));
    assert_eq!(DEVICE.fence.get(), 250);

    let page = exchange(port, format!("{}fenceNum=250&stop_server=1", POST_PREFIX).as_bytes());
    assert!(page.contains("value=\"250\"> mm"));

    let transport = server.join().unwrap();
    assert!(!transport.is_connected());
    assert_eq!(transport.local_port(), None);
}
