mod common;

use std::sync::Arc;

use common::{fast_config, host, template, transport, write_key_pair, FakeComms};
use hc_adapters::{BuildConfig, BuildError, Builder, Communicator, MemoryUi, Provisioner, ShellProvisioner, Ui,
                  UiLevel};
use hc_api::{InMemoryHyperCloud, Method};
use hc_core::CancelToken;
use hc_domain::InstanceState;

const KEY: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIBuild builder@ci";

fn world() -> Arc<InMemoryHyperCloud> {
    Arc::new(InMemoryHyperCloud::new().with_template(template("tpl-old", "ubuntu", 20.04))
                                      .with_template(template("tpl-new", "ubuntu", 22.04))
                                      .with_template(template("tpl-other", "debian", 99.0)))
}

fn clone_config(dir: &std::path::Path) -> BuildConfig {
    BuildConfig { template_slug: "ubuntu".into(),
                  ssh_private_key_file: Some(write_key_pair(dir, "id_build", KEY)),
                  shutdown_from_api: true,
                  ..fast_config("web") }
}

fn uname() -> Arc<dyn Provisioner> {
    Arc::new(ShellProvisioner::new(vec!["uname -a".into()]))
}

#[test]
fn clone_build_produces_a_detached_renamed_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let world = world();
    let ui = Arc::new(MemoryUi::new());
    let comms = Arc::new(FakeComms::new().refusing_first(2));
    let builder = Builder::prepare(clone_config(dir.path())).expect("config válida");

    let artifact = builder.run_with_transport(transport(&world), host(&ui, &comms, uname()))
                          .expect("el build debería terminar");

    assert_eq!(artifact.builder_id(), "hypercloud.clone.disk");
    assert!(artifact.disk().name.starts_with("hcflow completed: web "), "{}", artifact.disk().name);
    assert_eq!(artifact.label(), format!("Disk: {} : {}", artifact.id(), artifact.disk().name));

    // clonado del template más nuevo del slug
    let body = world.last_body("POST /disks").expect("body del disco");
    assert_eq!(body["template"], "tpl-new");
    assert_eq!(body["name"], "hcflow in-progress: web");

    let stored = world.disk(artifact.id()).expect("disco en la API");
    assert_eq!(stored.instance_id, None);
    assert!(world.ips().is_empty(), "la IP debería liberarse");
    let instances = world.instances();
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].name, "hcflow: web");
    assert_eq!(instances[0].state, InstanceState::Terminated);
    assert_eq!(world.instance_public_keys(&instances[0].id).len(), 1);

    // dos rechazos y una conexión buena, siempre contra la IP asignada
    let targets = comms.targets();
    assert_eq!(targets.len(), 3);
    assert!(targets.iter().all(|t| t.host == "10.0.0.10" && t.username == "root" && t.port == 22));
    assert_eq!(comms.commands(), vec!["uname -a".to_string()]);
    assert!(ui.messages(UiLevel::Say).iter().any(|m| m == "Connected to SSH!"));
    assert!(ui.messages(UiLevel::Error).is_empty());

    artifact.destroy().expect("borrar artifact");
    assert!(world.disks().is_empty());
}

#[test]
fn teardown_deallocates_the_ip_before_terminating() {
    let dir = tempfile::tempdir().expect("tempdir");
    let world = world();
    let ui = Arc::new(MemoryUi::new());
    let comms = Arc::new(FakeComms::new());
    let builder = Builder::prepare(clone_config(dir.path())).expect("config válida");
    builder.run_with_transport(transport(&world), host(&ui, &comms, uname()))
           .expect("el build debería terminar");

    let id = world.instances()[0].id.clone();
    let calls = world.calls();
    let last = |call: &str| {
        calls.iter()
             .rposition(|c| c.starts_with(call))
             .unwrap_or_else(|| panic!("falta {call} en {calls:?}"))
    };
    let detach = last(&format!("PUT /instances/{id}/disks"));
    let networks = last(&format!("PUT /instances/{id}/networking"));
    let release = last("DELETE /ip_addresses/");
    let terminate = last(&format!("DELETE /instances/{id}"));
    assert!(detach < networks && networks < release && release < terminate, "{calls:?}");
}

#[test]
fn failed_rename_still_returns_the_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let world = world();
    world.reject(Method::Put, "/disks/disk-1", 500);
    let ui = Arc::new(MemoryUi::new());
    let comms = Arc::new(FakeComms::new());
    let builder = Builder::prepare(clone_config(dir.path())).expect("config válida");

    let artifact = builder.run_with_transport(transport(&world), host(&ui, &comms, uname()))
                          .expect("el disco igual es el artifact");
    assert_eq!(artifact.id(), "disk-1");
    assert_eq!(artifact.disk().name, "hcflow in-progress: web");
    assert!(ui.messages(UiLevel::Warn).iter().any(|m| m.starts_with("error renaming disk disk-1")));

    artifact.destroy().expect("borrar artifact");
    assert!(world.disks().is_empty());
}

#[test]
fn failed_provisioning_releases_everything() {
    let dir = tempfile::tempdir().expect("tempdir");
    let world = world();
    let ui = Arc::new(MemoryUi::new());
    let comms = Arc::new(FakeComms::new().with_exit_status(2));
    let builder = Builder::prepare(clone_config(dir.path())).expect("config válida");

    let err = builder.run_with_transport(transport(&world), host(&ui, &comms, uname()))
                     .expect_err("el aprovisionamiento falla");
    assert!(matches!(err, BuildError::Communicator(ref msg) if msg.contains("exited with status 2")), "{err}");

    assert!(world.disks().is_empty(), "el disco parcial se borra");
    assert!(world.ips().is_empty());
    assert!(world.instances().iter().all(|i| i.state == InstanceState::Terminated));
    assert_eq!(ui.messages(UiLevel::Error).len(), 1);
}

#[test]
fn unknown_template_stops_before_creating_resources() {
    let dir = tempfile::tempdir().expect("tempdir");
    let world = world();
    let ui = Arc::new(MemoryUi::new());
    let comms = Arc::new(FakeComms::new());
    let mut config = clone_config(dir.path());
    config.template_slug = "centos".into();
    let builder = Builder::prepare(config).expect("config válida");

    let err = builder.run_with_transport(transport(&world), host(&ui, &comms, uname()))
                     .expect_err("no hay template");
    assert!(err.to_string().starts_with("could not find template: centos"), "{err}");
    assert_eq!(world.count_calls("POST /disks"), 0);
    assert_eq!(world.count_calls("POST /ip_addresses"), 0);
}

/// Simula un guest que se apaga solo al terminar de aprovisionar.
struct GuestPowersOff(Arc<InMemoryHyperCloud>);

impl Provisioner for GuestPowersOff {
    fn provision(&self, _ui: &dyn Ui, _comm: &mut dyn Communicator) -> Result<(), BuildError> {
        for i in self.0.instances().into_iter().filter(|i| i.state == InstanceState::Running) {
            self.0.set_instance_state(&i.id, InstanceState::Stopped);
        }
        Ok(())
    }
}

#[test]
fn guest_initiated_shutdown_skips_the_api_stop() {
    let dir = tempfile::tempdir().expect("tempdir");
    let world = world();
    let ui = Arc::new(MemoryUi::new());
    let comms = Arc::new(FakeComms::new());
    let mut config = clone_config(dir.path());
    config.shutdown_from_api = false;
    let builder = Builder::prepare(config).expect("config válida");

    builder.run_with_transport(transport(&world), host(&ui, &comms, Arc::new(GuestPowersOff(world.clone()))))
           .expect("el build debería terminar");
    assert!(world.calls().iter().all(|c| !c.ends_with("/stop")));
}

/// Levanta la cancelación durante el aprovisionamiento.
struct CancelDuring(CancelToken);

impl Provisioner for CancelDuring {
    fn provision(&self, _ui: &dyn Ui, _comm: &mut dyn Communicator) -> Result<(), BuildError> {
        self.0.cancel();
        Ok(())
    }
}

#[test]
fn cancellation_unwinds_and_reports_cancelled() {
    let dir = tempfile::tempdir().expect("tempdir");
    let world = world();
    let ui = Arc::new(MemoryUi::new());
    let comms = Arc::new(FakeComms::new());
    let builder = Builder::prepare(clone_config(dir.path())).expect("config válida");

    let mut build_host = host(&ui, &comms, uname());
    build_host.provisioner = Arc::new(CancelDuring(build_host.cancel.clone()));

    let err = builder.run_with_transport(transport(&world), build_host).expect_err("cancelado");
    assert!(matches!(err, BuildError::Cancelled));
    assert!(world.disks().is_empty());
    assert!(world.ips().is_empty());
    assert!(world.instances().iter().all(|i| i.state == InstanceState::Terminated));
}
