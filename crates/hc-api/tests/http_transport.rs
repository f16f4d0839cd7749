use hc_api::{ApiConfig, ApiError, Credentials, HttpTransport, HyperCloudClient, Method, Transport};
use httpmock::prelude::*;
use serde_json::json;

fn transport(server: &MockServer, credentials: Credentials) -> HttpTransport {
    HttpTransport::new(&ApiConfig::new(server.base_url(), credentials)).expect("cliente http")
}

#[test]
fn access_token_is_sent_as_bearer() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
                         when.method(GET).path("/networks/net-1").header("authorization", "Bearer tok-123");
                         then.status(200).json_body(json!({
                             "id": "net-1", "netmask": "255.255.255.0",
                             "gateway": "10.0.0.1", "specification": "10.0.0.0/24"
                         }));
                     });

    let client = HyperCloudClient::new(transport(&server, Credentials::AccessToken("tok-123".into())));
    let network = client.network_show("net-1").expect("red");
    mock.assert();
    assert_eq!(network.cidr(), Ok("24"));
}

#[test]
fn application_credentials_use_basic_auth_and_json_body() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
                         // base64("app:secret")
                         when.method(POST)
                             .path("/ip_addresses")
                             .header("authorization", "Basic YXBwOnNlY3JldA==")
                             .json_body(json!({ "network": "net-1", "name": "hcflow: demo" }));
                         then.status(201).json_body(json!({ "id": "ip-1", "address": "10.0.0.7" }));
                     });

    let client = HyperCloudClient::new(transport(&server,
                                                 Credentials::Application { id: "app".into(),
                                                                            secret: "secret".into() }));
    let ip = client.ip_allocate("net-1", Some("hcflow: demo")).expect("ip");
    mock.assert();
    assert_eq!(ip.address, "10.0.0.7");
}

#[test]
fn status_outside_success_range_carries_the_remote_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
              when.method(DELETE).path("/disks/d-9");
              then.status(409).json_body(json!({ "error": "disk is attached" }));
          });

    let client = HyperCloudClient::new(transport(&server, Credentials::AccessToken("t".into())));
    match client.disk_delete("d-9") {
        Err(ApiError::Rejected { status, body }) => {
            assert_eq!(status, 409);
            assert!(body.contains("disk is attached"), "body: {body}");
        }
        other => panic!("se esperaba Rejected, llegó {other:?}"),
    }
}

#[test]
fn raw_transport_keeps_non_json_bodies_and_empty_bodies() {
    let server = MockServer::start();
    server.mock(|when, then| {
              when.method(GET).path("/broken");
              then.status(502).body("<html>bad gateway</html>");
          });
    server.mock(|when, then| {
              when.method(DELETE).path("/ip_addresses/ip-1");
              then.status(204);
          });

    let t = transport(&server, Credentials::AccessToken("t".into()));
    let broken = t.request(Method::Get, "/broken", None).expect("respuesta");
    assert_eq!(broken.status, 502);
    assert_eq!(broken.body, json!("<html>bad gateway</html>"));

    let empty = t.request(Method::Delete, "/ip_addresses/ip-1", None).expect("respuesta");
    assert!(empty.is_success());
    assert!(empty.body.is_null());
}

#[test]
fn unexpected_shape_is_a_decode_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
              when.method(GET).path("/templates");
              then.status(200).json_body(json!({ "not": "a list" }));
          });
    let client = HyperCloudClient::new(transport(&server, Credentials::AccessToken("t".into())));
    assert!(matches!(client.template_list(), Err(ApiError::Decode(_))));
}

#[test]
fn unreachable_api_is_a_transport_error() {
    // puerto reservado sin listener
    let config = ApiConfig::new("http://127.0.0.1:9", Credentials::AccessToken("t".into()));
    let client = HyperCloudClient::new(HttpTransport::new(&config).expect("cliente http"));
    assert!(matches!(client.disk_list(), Err(ApiError::Transport(_))));
}
