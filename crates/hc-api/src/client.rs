//! Fachada tipada de recursos remotos.
//!
//! Cada operación devuelve `Result<T, ApiError>`; un status fuera de
//! `[200,300)` se convierte en `ApiError::Rejected` con el body remoto como
//! contexto. Las operaciones que en la API son asíncronas (crear disco,
//! attach/detach en vivo, start/stop, terminate, sesión de consola) esperan
//! acá mismo con `hc_core::poll`, a la cadencia de `poll_config()`.

use std::time::Duration;

use hc_core::{wait_for_condition, wait_for_state, PollConfig};
use hc_domain::{BootDevice, ConsoleSession, Disk, DiskState, Instance, InstanceState, IpAddress, Network,
                PerformanceTier, PublicKey, Template};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::requests::{CreateDiskRequest, CreateInstanceRequest, UpdateDiskRequest};
use crate::transport::{Method, Transport};
use crate::ApiError;

#[derive(Deserialize)]
struct StateBody {
    state: InstanceState,
}

#[derive(Deserialize)]
struct Created {
    id: String,
}

pub struct HyperCloudClient<T: Transport> {
    transport: T,
    poll: PollConfig,
}

impl<T: Transport> HyperCloudClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport,
               poll: PollConfig::state() }
    }

    /// Cadencia/timeout por defecto de las esperas internas.
    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn poll_config(&self) -> PollConfig {
        self.poll
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn raw(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, ApiError> {
        let response = self.transport.request(method, path, body.as_ref())?;
        if !response.is_success() {
            debug!("{method} {path} rejected with {}", response.status);
            return Err(ApiError::Rejected { status: response.status,
                                            body: response.body.to_string() });
        }
        Ok(response.body)
    }

    fn call<R: DeserializeOwned>(&self, method: Method, path: &str, body: Option<Value>) -> Result<R, ApiError> {
        let value = self.raw(method, path, body)?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode(format!("{method} {path}: {e}")))
    }

    fn encode<B: Serialize>(body: &B) -> Result<Value, ApiError> {
        serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    // ---- discos ----

    pub fn disk_show(&self, id: &str) -> Result<Disk, ApiError> {
        if id.is_empty() {
            return Err(ApiError::Config("disk id cannot be blank".into()));
        }
        self.call(Method::Get, &format!("/disks/{id}"), None)
    }

    pub fn disk_list(&self) -> Result<Vec<Disk>, ApiError> {
        self.call(Method::Get, "/disks", None)
    }

    /// Crea el disco y lo devuelve recién cuando la API lo reporta `unattached`.
    pub fn disk_create(&self, request: &CreateDiskRequest) -> Result<Disk, ApiError> {
        let created: Disk = self.call(Method::Post, "/disks", Some(Self::encode(request)?))?;
        info!("disk {} created, waiting for it to be unattached", created.id);
        let disk = wait_for_state(self.poll, &format!("disk {}", created.id), &[DiskState::Unattached.as_str()], || {
            self.disk_show(&created.id).map(DiskStateOf)
        })?;
        Ok(disk.0)
    }

    pub fn disk_update(&self, id: &str, update: &UpdateDiskRequest) -> Result<Disk, ApiError> {
        self.call(Method::Put, &format!("/disks/{id}"), Some(Self::encode(update)?))
    }

    pub fn disk_delete(&self, id: &str) -> Result<(), ApiError> {
        self.raw(Method::Delete, &format!("/disks/{id}"), None).map(|_| ())
    }

    // ---- instancias ----

    pub fn instance_show(&self, id: &str) -> Result<Instance, ApiError> {
        self.call(Method::Get, &format!("/instances/{id}"), None)
    }

    /// Consulta liviana que sólo trae el estado.
    pub fn instance_state(&self, id: &str) -> Result<InstanceState, ApiError> {
        let body: StateBody = self.call(Method::Get, &format!("/instances/{id}/state"), None)?;
        Ok(body.state)
    }

    pub fn instance_create(&self, request: &CreateInstanceRequest) -> Result<Instance, ApiError> {
        self.call(Method::Post, "/instances", Some(Self::encode(request)?))
    }

    pub fn instance_set_boot_device(&self, id: &str, device: BootDevice) -> Result<Instance, ApiError> {
        self.call(Method::Put, &format!("/instances/{id}"), Some(json!({ "boot_device": device })))
    }

    /// Reemplaza la lista de discos. Con la instancia apagada vuelve enseguida;
    /// si está corriendo espera a que ningún disco quede en attach/detach.
    pub fn instance_update_disks(&self, id: &str, disk_ids: &[String]) -> Result<(), ApiError> {
        self.raw(Method::Put, &format!("/instances/{id}/disks"), Some(json!({ "disks": disk_ids })))?;
        if self.instance_show(id)?.state == InstanceState::Stopped {
            return Ok(());
        }
        wait_for_condition(self.poll, &format!("instance {id} disks"), "settled", || {
            let instance = self.instance_show(id)?;
            Ok((!instance.has_settling_disks()).then_some(()))
        })?;
        Ok(())
    }

    pub fn instance_add_disk(&self, id: &str, disk_id: &str) -> Result<(), ApiError> {
        let mut ids = self.instance_show(id)?.disk_ids();
        ids.push(disk_id.to_string());
        self.instance_update_disks(id, &ids)
    }

    pub fn instance_remove_disk(&self, id: &str, disk_id: &str) -> Result<(), ApiError> {
        let ids: Vec<String> = self.instance_show(id)?
                                   .disk_ids()
                                   .into_iter()
                                   .filter(|d| d != disk_id)
                                   .collect();
        self.instance_update_disks(id, &ids)
    }

    pub fn instance_update_public_keys(&self, id: &str, key_ids: &[String]) -> Result<(), ApiError> {
        self.raw(Method::Put, &format!("/instances/{id}/public_keys"), Some(json!({ "public_keys": key_ids })))
            .map(|_| ())
    }

    pub fn instance_remove_networks(&self, id: &str) -> Result<(), ApiError> {
        self.raw(Method::Put, &format!("/instances/{id}/networking"), Some(json!({ "network_adapters": [] })))
            .map(|_| ())
    }

    /// Arranca y espera `running`.
    pub fn instance_start(&self, id: &str, timeout: Duration) -> Result<(), ApiError> {
        self.raw(Method::Post, &format!("/instances/{id}/start"), None)?;
        self.instance_wait_for_state(id, InstanceState::Running, self.poll.with_timeout(timeout))
    }

    /// Apaga desde la API y espera `stopped`.
    pub fn instance_stop(&self, id: &str, timeout: Duration) -> Result<(), ApiError> {
        self.raw(Method::Post, &format!("/instances/{id}/stop"), None)?;
        self.instance_wait_for_state(id, InstanceState::Stopped, self.poll.with_timeout(timeout))
    }

    pub fn instance_wait_for_state(&self, id: &str, desired: InstanceState, poll: PollConfig) -> Result<(), ApiError> {
        wait_for_state(poll, &format!("instance {id}"), &[desired.as_str()], || self.instance_state(id))?;
        Ok(())
    }

    /// Termina la instancia; con `wait` espera `terminated`.
    pub fn instance_terminate(&self, id: &str, wait: bool, timeout: Duration) -> Result<(), ApiError> {
        self.raw(Method::Delete, &format!("/instances/{id}"), None)?;
        if wait {
            wait_for_state(self.poll.with_timeout(timeout),
                           &format!("instance {id}"),
                           &[InstanceState::Terminated.as_str()],
                           || self.instance_show(id).map(|i| i.state))?;
        }
        Ok(())
    }

    // ---- consola ----

    /// Pide una sesión de consola (`vnc`, `serial`, ...) y espera a que esté lista.
    pub fn console_request(&self, instance_id: &str, console_type: &str, timeout: Duration) -> Result<ConsoleSession, ApiError> {
        let created: Created = self.call(Method::Post,
                                         &format!("/instances/{instance_id}/remote_access"),
                                         Some(json!({ "type": console_type })))?;
        let session = wait_for_condition(self.poll.with_timeout(timeout),
                                         &format!("console session {}", created.id),
                                         "ready",
                                         || {
                                             let s: ConsoleSession =
                                                 self.call(Method::Get, &format!("/console_sessions/{}", created.id), None)?;
                                             Ok(s.is_ready().then_some(s))
                                         })?;
        Ok(session)
    }

    // ---- red ----

    pub fn ip_allocate(&self, network_id: &str, name: Option<&str>) -> Result<IpAddress, ApiError> {
        let mut body = json!({ "network": network_id });
        if let Some(name) = name.filter(|n| !n.is_empty()) {
            body["name"] = json!(name);
        }
        self.call(Method::Post, "/ip_addresses", Some(body))
    }

    pub fn ip_deallocate(&self, id: &str) -> Result<(), ApiError> {
        self.raw(Method::Delete, &format!("/ip_addresses/{id}"), None).map(|_| ())
    }

    pub fn network_show(&self, id: &str) -> Result<Network, ApiError> {
        self.call(Method::Get, &format!("/networks/{id}"), None)
    }

    // ---- datos de referencia ----

    pub fn template_list(&self) -> Result<Vec<Template>, ApiError> {
        self.call(Method::Get, "/templates", None)
    }

    pub fn disk_tier_list(&self) -> Result<Vec<PerformanceTier>, ApiError> {
        self.call(Method::Get, "/performance_tiers/disk", None)
    }

    pub fn disk_tier_find(&self, id: &str) -> Result<Option<PerformanceTier>, ApiError> {
        Ok(self.disk_tier_list()?.into_iter().find(|t| t.id == id))
    }

    pub fn public_key_list(&self) -> Result<Vec<PublicKey>, ApiError> {
        self.call(Method::Get, "/public_keys", None)
    }

    pub fn public_key_create(&self, name: &str, key: &str) -> Result<PublicKey, ApiError> {
        self.call(Method::Post, "/public_keys", Some(json!({ "name": name, "key": key })))
    }
}

/// Adaptador para esperar sobre el estado de un `Disk` completo.
struct DiskStateOf(Disk);

impl AsRef<str> for DiskStateOf {
    fn as_ref(&self) -> &str {
        self.0.state.as_str()
    }
}
