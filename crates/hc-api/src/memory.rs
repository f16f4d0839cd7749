//! API de HyperCloud simulada en memoria.
//!
//! Implementa `Transport` y `UrlProbe` sobre un mundo mutable (discos,
//! instancias, IPs, claves, sesiones de consola) con las mismas transiciones
//! observables que la API real:
//! - un disco nuevo queda `creating` hasta la primera consulta;
//! - un attach con la instancia corriendo queda `attaching` hasta la
//!   siguiente consulta de la instancia;
//! - una sesión de consola queda `requested` hasta la primera consulta.
//!
//! Registra cada llamada (`calls()`) y permite inyectar rechazos por ruta.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use hc_domain::{BootDevice, ConsoleSession, ConsoleState, Disk, DiskState, Instance, InstanceDisk, InstanceState,
                IpAddress, Network, NetworkAdapter, PerformanceTier, PublicKey, Region, Template};
use log::debug;
use serde::Serialize;
use serde_json::{json, Value};

use crate::transport::{ApiResponse, Method, ProbeResponse, Transport, UrlProbe};
use crate::ApiError;

pub const DEFAULT_REGION: &str = "region-1";
pub const DEFAULT_DISK_TIER: &str = "tier-disk-1";
pub const DEFAULT_NETWORK: &str = "network-1";

#[derive(Default)]
struct World {
    next_id: u64,
    disks: Vec<Disk>,
    instances: Vec<Instance>,
    ips: Vec<IpAddress>,
    networks: Vec<Network>,
    templates: Vec<Template>,
    tiers: Vec<PerformanceTier>,
    keys: Vec<PublicKey>,
    instance_keys: HashMap<String, Vec<String>>,
    consoles: Vec<ConsoleSession>,
    heads: HashMap<String, ProbeResponse>,
    rejections: Vec<(Method, String, u16)>,
    calls: Vec<String>,
    bodies: Vec<(String, Value)>,
    console_url: String,
}

impl World {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

pub struct InMemoryHyperCloud {
    inner: Mutex<World>,
}

impl Default for InMemoryHyperCloud {
    fn default() -> Self {
        Self::new()
    }
}

fn ok<T: Serialize>(value: &T) -> ApiResponse {
    ApiResponse::new(200, serde_json::to_value(value).unwrap_or(Value::Null))
}

fn not_found(what: &str, id: &str) -> ApiResponse {
    ApiResponse::new(404, json!({ "error": format!("{what} {id} not found") }))
}

fn bad_request(msg: &str) -> ApiResponse {
    ApiResponse::new(422, json!({ "error": msg }))
}

fn str_field<'a>(body: Option<&'a Value>, field: &str) -> Option<&'a str> {
    body.and_then(|b| b.get(field)).and_then(Value::as_str)
}

fn id_list(body: Option<&Value>, field: &str) -> Vec<String> {
    body.and_then(|b| b.get(field))
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

impl InMemoryHyperCloud {
    /// Mundo con una región, un tier de disco y una red `10.0.0.0/24`.
    pub fn new() -> Self {
        let region = Region { id: DEFAULT_REGION.into(),
                              name: "London".into() };
        let world = World { tiers: vec![PerformanceTier { id: DEFAULT_DISK_TIER.into(),
                                                          name: "SSD".into(),
                                                          region }],
                            networks: vec![Network { id: DEFAULT_NETWORK.into(),
                                                     netmask: "255.255.255.0".into(),
                                                     gateway: "10.0.0.1".into(),
                                                     specification: "10.0.0.0/24".into() }],
                            console_url: "ws://127.0.0.1:1/console".into(),
                            ..World::default() };
        Self { inner: Mutex::new(world) }
    }

    fn world(&self) -> MutexGuard<'_, World> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn with_template(self, template: Template) -> Self {
        self.world().templates.push(template);
        self
    }

    pub fn with_public_key(self, key: PublicKey) -> Self {
        self.world().keys.push(key);
        self
    }

    pub fn with_disk(self, disk: Disk) -> Self {
        self.world().disks.push(disk);
        self
    }

    pub fn with_instance(self, instance: Instance) -> Self {
        self.world().instances.push(instance);
        self
    }

    /// Respuesta de HEAD para una URL externa.
    pub fn with_head(self, url: &str, status: u16, content_length: Option<&str>) -> Self {
        self.world().heads.insert(url.to_string(),
                                  ProbeResponse { status,
                                                  content_length: content_length.map(str::to_string) });
        self
    }

    /// URL websocket que devuelven las sesiones `vnc`.
    pub fn with_console_url(self, url: &str) -> Self {
        self.world().console_url = url.to_string();
        self
    }

    /// Rechaza siempre `method path` con `status`.
    pub fn reject(&self, method: Method, path: &str, status: u16) {
        self.world().rejections.push((method, path.to_string(), status));
    }

    pub fn clear_rejections(&self) {
        self.world().rejections.clear();
    }

    pub fn calls(&self) -> Vec<String> {
        self.world().calls.clone()
    }

    pub fn count_calls(&self, call: &str) -> usize {
        self.world().calls.iter().filter(|c| *c == call).count()
    }

    /// Último body enviado a `method path`.
    pub fn last_body(&self, call: &str) -> Option<Value> {
        self.world().bodies.iter().rev().find(|(c, _)| c == call).map(|(_, b)| b.clone())
    }

    pub fn disks(&self) -> Vec<Disk> {
        self.world().disks.clone()
    }

    pub fn disk(&self, id: &str) -> Option<Disk> {
        self.world().disks.iter().find(|d| d.id == id).cloned()
    }

    pub fn instances(&self) -> Vec<Instance> {
        self.world().instances.clone()
    }

    pub fn instance(&self, id: &str) -> Option<Instance> {
        self.world().instances.iter().find(|i| i.id == id).cloned()
    }

    pub fn ips(&self) -> Vec<IpAddress> {
        self.world().ips.clone()
    }

    pub fn public_keys(&self) -> Vec<PublicKey> {
        self.world().keys.clone()
    }

    pub fn instance_public_keys(&self, instance_id: &str) -> Vec<String> {
        self.world().instance_keys.get(instance_id).cloned().unwrap_or_default()
    }

    /// Fuerza el estado de una instancia (p.ej. simular un guest que se apagó solo).
    pub fn set_instance_state(&self, id: &str, state: InstanceState) {
        if let Some(i) = self.world().instances.iter_mut().find(|i| i.id == id) {
            i.state = state;
        }
    }

    fn handle(world: &mut World, method: Method, path: &str, body: Option<&Value>) -> ApiResponse {
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        match (method, segments.as_slice()) {
            (Method::Get, ["disks"]) => ok(&world.disks),
            (Method::Post, ["disks"]) => Self::create_disk(world, body),
            (Method::Get, ["disks", id]) => match world.disks.iter_mut().find(|d| d.id == *id) {
                Some(d) => {
                    let shown = d.clone();
                    if d.state == DiskState::Creating {
                        d.state = DiskState::Unattached;
                    }
                    ok(&shown)
                }
                None => not_found("disk", id),
            },
            (Method::Put, ["disks", id]) => match world.disks.iter_mut().find(|d| d.id == *id) {
                Some(d) => {
                    if let Some(name) = str_field(body, "name") {
                        d.name = name.to_string();
                    }
                    if let Some(cdrom) = body.and_then(|b| b.get("cdrom")).and_then(Value::as_bool) {
                        d.cdrom = cdrom;
                    }
                    ok(&*d)
                }
                None => not_found("disk", id),
            },
            (Method::Delete, ["disks", id]) => {
                let attached = world.disks.iter().find(|d| d.id == *id).map(|d| d.instance_id.is_some());
                match attached {
                    Some(true) => bad_request("disk is attached"),
                    Some(false) => {
                        world.disks.retain(|d| d.id != *id);
                        ApiResponse::new(204, Value::Null)
                    }
                    None => not_found("disk", id),
                }
            }
            (Method::Post, ["instances"]) => Self::create_instance(world, body),
            (Method::Get, ["instances", id]) => Self::show_instance(world, id),
            (Method::Put, ["instances", id]) => match world.instances.iter_mut().find(|i| i.id == *id) {
                Some(i) => {
                    match str_field(body, "boot_device") {
                        Some("disk") => i.boot_device = Some(BootDevice::Disk),
                        Some("cdrom") => i.boot_device = Some(BootDevice::Cdrom),
                        _ => {}
                    }
                    ok(&*i)
                }
                None => not_found("instance", id),
            },
            (Method::Delete, ["instances", id]) => {
                let disk_ids: Vec<String> = match world.instances.iter_mut().find(|i| i.id == *id) {
                    Some(i) => {
                        i.state = InstanceState::Terminated;
                        i.network_adapters.clear();
                        i.disks.drain(..).map(|d| d.id).collect()
                    }
                    None => return not_found("instance", id),
                };
                for d in world.disks.iter_mut().filter(|d| disk_ids.contains(&d.id)) {
                    d.instance_id = None;
                    d.state = DiskState::Unattached;
                }
                ApiResponse::new(204, Value::Null)
            }
            (Method::Get, ["instances", id, "state"]) => match world.instances.iter().find(|i| i.id == *id) {
                Some(i) => ok(&json!({ "state": i.state })),
                None => not_found("instance", id),
            },
            (Method::Post, ["instances", id, "start"]) => Self::transition(world, id, InstanceState::Running),
            (Method::Post, ["instances", id, "stop"]) => Self::transition(world, id, InstanceState::Stopped),
            (Method::Put, ["instances", id, "disks"]) => Self::update_disks(world, id, id_list(body, "disks")),
            (Method::Put, ["instances", id, "public_keys"]) => {
                if !world.instances.iter().any(|i| i.id == *id) {
                    return not_found("instance", id);
                }
                world.instance_keys.insert(id.to_string(), id_list(body, "public_keys"));
                ApiResponse::new(200, json!({}))
            }
            (Method::Put, ["instances", id, "networking"]) => match world.instances.iter_mut().find(|i| i.id == *id) {
                Some(i) => {
                    i.network_adapters.clear();
                    ok(&*i)
                }
                None => not_found("instance", id),
            },
            (Method::Post, ["instances", id, "remote_access"]) => {
                if !world.instances.iter().any(|i| i.id == *id) {
                    return not_found("instance", id);
                }
                let sid = world.id("console");
                let token = world.id("token");
                let session_type = str_field(body, "type").unwrap_or("vnc").to_string();
                world.consoles.push(ConsoleSession { id: sid.clone(),
                                                     session_type,
                                                     token,
                                                     host: None,
                                                     port: None,
                                                     url: None,
                                                     state: ConsoleState::Requested });
                ApiResponse::new(201, json!({ "id": sid }))
            }
            (Method::Get, ["console_sessions", id]) => {
                let url = world.console_url.clone();
                match world.consoles.iter_mut().find(|c| c.id == *id) {
                    Some(c) => {
                        let shown = c.clone();
                        if c.state == ConsoleState::Requested {
                            c.state = ConsoleState::Ready;
                            if c.is_vnc() {
                                c.url = Some(url);
                            } else {
                                c.host = Some("127.0.0.1".into());
                                c.port = Some(5900);
                            }
                        }
                        ok(&shown)
                    }
                    None => not_found("console session", id),
                }
            }
            (Method::Post, ["ip_addresses"]) => {
                let Some(network) = str_field(body, "network") else {
                    return bad_request("network is required");
                };
                if !world.networks.iter().any(|n| n.id == network) {
                    return not_found("network", network);
                }
                let id = world.id("ip");
                let address = format!("10.0.0.{}", 10 + world.ips.len());
                let ip = IpAddress { id,
                                     address,
                                     network: Some(network.to_string()) };
                world.ips.push(ip.clone());
                ApiResponse::new(201, serde_json::to_value(&ip).unwrap_or(Value::Null))
            }
            (Method::Delete, ["ip_addresses", id]) => {
                if !world.ips.iter().any(|ip| ip.id == *id) {
                    return not_found("ip address", id);
                }
                world.ips.retain(|ip| ip.id != *id);
                ApiResponse::new(204, Value::Null)
            }
            (Method::Get, ["networks", id]) => match world.networks.iter().find(|n| n.id == *id) {
                Some(n) => ok(n),
                None => not_found("network", id),
            },
            (Method::Get, ["templates"]) => ok(&world.templates),
            (Method::Get, ["performance_tiers", "disk"]) => ok(&world.tiers),
            (Method::Get, ["public_keys"]) => ok(&world.keys),
            (Method::Post, ["public_keys"]) => {
                let id = world.id("key");
                let key = PublicKey { id,
                                      name: str_field(body, "name").unwrap_or_default().to_string(),
                                      key: str_field(body, "key").unwrap_or_default().to_string() };
                world.keys.push(key.clone());
                ApiResponse::new(201, serde_json::to_value(&key).unwrap_or(Value::Null))
            }
            _ => ApiResponse::new(404, json!({ "error": format!("no route for {method} {path}") })),
        }
    }

    fn region_of(world: &World, region_id: &str) -> Region {
        world.tiers
             .iter()
             .map(|t| &t.region)
             .find(|r| r.id == region_id)
             .cloned()
             .unwrap_or(Region { id: region_id.to_string(),
                                 name: String::new() })
    }

    fn create_disk(world: &mut World, body: Option<&Value>) -> ApiResponse {
        let (Some(name), Some(region)) = (str_field(body, "name"), str_field(body, "region")) else {
            return bad_request("name and region are required");
        };
        if let Some(template) = str_field(body, "template") {
            if !world.templates.iter().any(|t| t.id == template) {
                return not_found("template", template);
            }
        }
        let id = world.id("disk");
        let disk = Disk { id,
                          name: name.to_string(),
                          size: body.and_then(|b| b.get("size")).and_then(Value::as_u64).unwrap_or(10),
                          region: Self::region_of(world, region),
                          performance_tier: str_field(body, "performance_tier").map(str::to_string),
                          state: DiskState::Creating,
                          instance_id: None,
                          cdrom: false };
        world.disks.push(disk.clone());
        ApiResponse::new(201, serde_json::to_value(&disk).unwrap_or(Value::Null))
    }

    fn create_instance(world: &mut World, body: Option<&Value>) -> ApiResponse {
        let Some(name) = str_field(body, "name") else {
            return bad_request("name is required");
        };
        let disk_ids = id_list(body, "disks");
        let ip_ids = id_list(body, "ip_addresses");
        if let Some(missing) = disk_ids.iter().find(|d| !world.disks.iter().any(|x| &x.id == *d)) {
            return not_found("disk", missing);
        }
        let ips: Vec<IpAddress> = world.ips.iter().filter(|ip| ip_ids.contains(&ip.id)).cloned().collect();
        if ips.len() != ip_ids.len() {
            return bad_request("unknown ip address");
        }
        let id = world.id("instance");
        let adapter_id = world.id("adapter");
        for d in world.disks.iter_mut().filter(|d| disk_ids.contains(&d.id)) {
            d.instance_id = Some(id.clone());
            d.state = DiskState::Attached;
        }
        let region = str_field(body, "region").map(|r| Self::region_of(world, r));
        let boot_device = match str_field(body, "boot_device") {
            Some("cdrom") => BootDevice::Cdrom,
            _ => BootDevice::Disk,
        };
        let instance = Instance { id,
                                  name: name.to_string(),
                                  memory: body.and_then(|b| b.get("memory")).and_then(Value::as_u64).unwrap_or(0),
                                  performance_tier: str_field(body, "performance_tier").map(str::to_string),
                                  region,
                                  disks: disk_ids.into_iter()
                                                 .enumerate()
                                                 .map(|(pos, id)| InstanceDisk { id,
                                                                                 state: DiskState::Attached,
                                                                                 position: Some(pos as u32) })
                                                 .collect(),
                                  network_adapters: vec![NetworkAdapter { id: adapter_id,
                                                                          ip_addresses: ips }],
                                  state: InstanceState::Stopped,
                                  boot_device: Some(boot_device) };
        world.instances.push(instance.clone());
        ApiResponse::new(201, serde_json::to_value(&instance).unwrap_or(Value::Null))
    }

    fn show_instance(world: &mut World, id: &str) -> ApiResponse {
        match world.instances.iter_mut().find(|i| i.id == id) {
            Some(i) => {
                let shown = i.clone();
                for d in i.disks.iter_mut().filter(|d| d.state.is_settling()) {
                    d.state = DiskState::Attached;
                }
                ok(&shown)
            }
            None => not_found("instance", id),
        }
    }

    fn transition(world: &mut World, id: &str, to: InstanceState) -> ApiResponse {
        match world.instances.iter_mut().find(|i| i.id == id) {
            Some(i) if i.state == InstanceState::Terminated => bad_request("instance is terminated"),
            Some(i) => {
                i.state = to;
                ok(&*i)
            }
            None => not_found("instance", id),
        }
    }

    fn update_disks(world: &mut World, id: &str, disk_ids: Vec<String>) -> ApiResponse {
        if let Some(missing) = disk_ids.iter().find(|d| !world.disks.iter().any(|x| &x.id == *d)) {
            return not_found("disk", missing);
        }
        let Some(instance) = world.instances.iter_mut().find(|i| i.id == id) else {
            return not_found("instance", id);
        };
        let live = instance.state == InstanceState::Running;
        let previous: Vec<InstanceDisk> = instance.disks.drain(..).collect();
        let mut next_position = previous.iter().filter_map(|d| d.position).map(|p| p + 1).max().unwrap_or(0);
        for disk_id in &disk_ids {
            match previous.iter().find(|d| &d.id == disk_id) {
                Some(kept) => instance.disks.push(kept.clone()),
                None => {
                    instance.disks.push(InstanceDisk { id: disk_id.clone(),
                                                       state: if live { DiskState::Attaching } else { DiskState::Attached },
                                                       position: Some(next_position) });
                    next_position += 1;
                }
            }
        }
        let instance_id = instance.id.clone();
        for d in world.disks.iter_mut() {
            if disk_ids.contains(&d.id) {
                d.instance_id = Some(instance_id.clone());
                d.state = DiskState::Attached;
            } else if d.instance_id.as_deref() == Some(instance_id.as_str()) {
                d.instance_id = None;
                d.state = DiskState::Unattached;
            }
        }
        ApiResponse::new(200, json!({}))
    }
}

impl Transport for InMemoryHyperCloud {
    fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<ApiResponse, ApiError> {
        let mut world = self.world();
        let call = format!("{method} {path}");
        debug!("in-memory {call}");
        world.calls.push(call.clone());
        if let Some(body) = body {
            world.bodies.push((call, body.clone()));
        }
        if let Some((_, _, status)) = world.rejections.iter().find(|(m, p, _)| *m == method && p == path) {
            return Ok(ApiResponse::new(*status, json!({ "error": "rejected" })));
        }
        Ok(Self::handle(&mut world, method, path, body))
    }
}

impl UrlProbe for InMemoryHyperCloud {
    fn head(&self, url: &str) -> Result<ProbeResponse, ApiError> {
        let mut world = self.world();
        world.calls.push(format!("HEAD {url}"));
        world.heads
             .get(url)
             .cloned()
             .ok_or_else(|| ApiError::Transport(format!("could not resolve {url}")))
    }
}
