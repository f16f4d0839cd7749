use std::net::SocketAddr;

use hc_adapters::http_server::HttpServer;
use hc_adapters::net::bind_random_port;

fn get(addr: SocketAddr, path: &str) -> (u16, String) {
    let response = reqwest::blocking::get(format!("http://{addr}{path}")).expect("request http");
    let status = response.status().as_u16();
    (status, response.text().unwrap_or_default())
}

#[test]
fn serves_files_from_the_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir(dir.path().join("preseed")).expect("mkdir");
    std::fs::write(dir.path().join("preseed/ubuntu.cfg"), "d-i debian-installer/locale string en_US\n")
        .expect("escribir preseed");

    let mut server = HttpServer::start("127.0.0.1:0".parse().expect("addr"), dir.path().to_path_buf())
        .expect("levantar servidor");
    let addr = server.local_addr();

    let (status, body) = get(addr, "/preseed/ubuntu.cfg");
    assert_eq!(status, 200);
    assert_eq!(body, "d-i debian-installer/locale string en_US\n");

    assert_eq!(get(addr, "/missing.cfg").0, 404);

    server.shutdown();
    server.shutdown();
}

#[test]
fn occupied_single_candidate_port_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let taken = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = taken.local_addr().expect("addr").port();

    // único candidato ocupado: error, no panic
    let err = bind_random_port(port, port, |p| HttpServer::start(SocketAddr::from(([127, 0, 0, 1], p)), dir.path().into()))
        .err()
        .expect("el puerto está tomado");
    assert!(err.to_string().contains("no free port"), "{err}");
}
