//! Deja listo el disco de boot media (ISO) marcado como `cdrom`.
//!
//! Busca en la región un disco cuyo nombre contenga `md5=<hash>`. Si no
//! existe lo materializa:
//! 1. HEAD a `boot_disk_url`: status 200, `Content-Length` presente y por
//!    encima de `boot_media_min_size` (si no, precondición fatal antes de
//!    crear nada);
//! 2. disco en blanco `Downloading... <build>` attachado en vivo a la VM de
//!    descarga;
//! 3. `wget` + verificación md5 sobre el device (`/dev/xvd<a+pos>`) por SSH;
//! 4. rename a `<build> md5=<hash>` y detach en vivo.
//!
//! Si el disco está attachado a otra instancia sólo se desattacha cuando esa
//! instancia está apagada.

use hc_api::{CreateDiskRequest, UpdateDiskRequest, UrlProbe};
use hc_core::{Step, StepAction};
use hc_domain::{Disk, InstanceDisk, InstanceState};
use log::{info, warn};

use super::{finish, run_failed};
use crate::communicator::RemoteCmd;
use crate::error::BuildError;
use crate::state::{BuildState, StateKey};

pub const DOWNLOADING_PREFIX: &str = "Downloading... ";

/// GB. Un ISO más grande agranda el disco.
const BOOT_MEDIA_DISK_SIZE: u64 = 10;
const GIB: u64 = 1024 * 1024 * 1024;

/// Descarga al device y corta con exit 111 si el md5 de los primeros
/// `length` bytes no coincide.
pub fn download_command(url: &str, device: &str, length: u64, md5: &str) -> String {
    format!("wget {url} -qO- > {device} && if [ $(dd if={device} | head -c {length} | md5sum | cut -d ' ' -f1) != \"{md5}\" ]; then echo 'md5 does not match'; exit 111; fi")
}

#[derive(Default)]
pub struct StepPrepareBootMedia {
    /// Disco creado por este build que todavía no terminó de bajar.
    downloading: Option<String>,
    /// Disco de este build que sigue colgado del downloader.
    attached_to_downloader: Option<String>,
}

impl StepPrepareBootMedia {
    pub fn new() -> Self {
        Self::default()
    }

    fn execute(&mut self, state: &mut BuildState) -> Result<(), BuildError> {
        let region_id = state.region_ref()?.id.clone();
        let md5 = state.config.boot_disk_md5.clone();
        let client = state.client.clone();

        state.ui.say("Preparing boot disk");
        let existing = client.disk_list()?.into_iter().find(|d| d.is_boot_media_for(&md5, &region_id));
        let disk_id = match existing {
            Some(disk) => {
                state.ui.say(&format!("Found boot disk with md5 in name: {}", disk.id));
                disk.id
            }
            None => self.download(state, &region_id, &md5)?,
        };

        let disk = client.disk_show(&disk_id)?;
        if let Some(owner) = disk.instance_id.clone() {
            state.ui.say(&format!("Disk is attached to instance {owner}"));
            let instance = client.instance_show(&owner)?;
            if instance.state != InstanceState::Stopped {
                return Err(BuildError::precondition(format!("boot disk {} is already attached to instance {owner} in state {}",
                                                            disk.id, instance.state)));
            }
            state.ui.say("Instance is stopped, doing a quick non-live disk detach");
            client.instance_remove_disk(&owner, &disk.id)?;
        }

        let disk = client.disk_update(&disk.id, &UpdateDiskRequest::cdrom(true))?;
        state.boot_disk = Some(disk);
        Ok(())
    }

    /// Valida la URL y devuelve el tamaño anunciado.
    fn check_url(state: &BuildState) -> Result<u64, BuildError> {
        let url = &state.config.boot_disk_url;
        let min = state.config.boot_media_min_size;
        let bad = |why: String| BuildError::precondition(format!("error checking the supplied boot_disk_url {url}: {why}"));

        state.ui.say(&format!("Sanity checking the boot_disk_url exists: {url}"));
        let probe = state.client.transport().head(url).map_err(|e| bad(e.to_string()))?;
        if probe.status != 200 {
            return Err(bad(format!("status code returned was {}, expected 200", probe.status)));
        }
        let header = probe.content_length
                          .ok_or_else(|| bad("no Content-Length header was present".into()))?;
        let length: u64 = header.trim()
                                .parse()
                                .map_err(|_| bad(format!("Content-Length header was not an integer: {header}")))?;
        if length < min {
            return Err(bad(format!("Content-Length is {length} bytes, less than {min}; probably not a boot image")));
        }
        Ok(length)
    }

    fn download(&mut self, state: &mut BuildState, region_id: &str, md5: &str) -> Result<String, BuildError> {
        let length = Self::check_url(state)?;
        let client = state.client.clone();
        let downloader_id = state.config.downloader_vm_id.clone();

        state.ui.say(&format!("Checking for downloader VM with ID: {downloader_id}"));
        let downloader = client.instance_show(&downloader_id)?;

        state.ui.say("Creating blank disk to be used as the boot disk");
        let size = BOOT_MEDIA_DISK_SIZE.max(length.div_ceil(GIB));
        let request = CreateDiskRequest::blank(format!("{DOWNLOADING_PREFIX}{}", state.config.build_name),
                                               size,
                                               region_id,
                                               state.config.disk_performance_tier_id.as_str());
        let disk = client.disk_create(&request)?;
        self.downloading = Some(disk.id.clone());

        state.ui.say("Attaching the new disk to the downloader VM");
        client.instance_add_disk(&downloader_id, &disk.id)?;
        self.attached_to_downloader = Some(disk.id.clone());

        if downloader.state == InstanceState::Stopped {
            state.ui.say("Booting downloader VM");
            client.instance_start(&downloader_id, state.config.wait_timeout())?;
        }

        let downloader = client.instance_show(&downloader_id)?;
        let device = downloader.find_disk(&disk.id)
                               .and_then(InstanceDisk::device_path)
                               .ok_or_else(|| {
                                   BuildError::precondition(format!("couldn't find the position of disk {} attached to instance {downloader_id}",
                                                                    disk.id))
                               })?;
        let address = downloader.primary_address()
                                .ok_or_else(|| BuildError::precondition(format!("downloader VM {downloader_id} has no ip address")))?
                                .to_string();

        let target = state.ssh_target(&address);
        let mut comm = state.communicators
                            .connect(&target)
                            .map_err(|e| BuildError::Communicator(format!("connecting to downloader VM failed: {e}")))?;
        let command = download_command(&state.config.boot_disk_url, &device, length, md5);
        state.ui.say("Running SSH command to download file and dd to boot disk");
        state.ui.say(&command);
        let out = comm.run(&RemoteCmd::new(command))
                      .map_err(|e| BuildError::Communicator(format!("error running download command: {e}")))?;
        if !out.success() {
            return Err(BuildError::Communicator(format!("got exit status {} from downloader command, expected 0. Stdout: {}. Stderr: {}",
                                                        out.exit_status,
                                                        out.stdout.trim_end(),
                                                        out.stderr.trim_end())));
        }

        let tagged = format!("{} {}", state.config.build_name, Disk::md5_tag(md5));
        client.disk_update(&disk.id, &UpdateDiskRequest::rename(tagged))?;
        self.downloading = None;

        client.instance_remove_disk(&downloader_id, &disk.id)?;
        self.attached_to_downloader = None;
        info!("boot media {} downloaded and detached from {downloader_id}", disk.id);
        Ok(disk.id)
    }
}

impl Step<BuildState> for StepPrepareBootMedia {
    fn id(&self) -> &str {
        "prepare_boot_media"
    }

    fn requires(&self) -> Vec<StateKey> {
        vec![StateKey::Region]
    }

    fn run(&mut self, state: &mut BuildState) -> StepAction {
        let result = self.execute(state);
        finish(state, result)
    }

    /// Un disco a medio bajar no sirve como caché: se borra.
    fn cleanup(&mut self, state: &mut BuildState) {
        if !run_failed(state) {
            return;
        }
        // el detach va aunque el disco ya esté renombrado
        if let Some(attached) = self.attached_to_downloader.take() {
            let downloader_id = state.config.downloader_vm_id.clone();
            if let Err(e) = state.client.instance_remove_disk(&downloader_id, &attached) {
                state.ui.warn(&format!("error detaching boot disk {attached} from {downloader_id}: {e}"));
            }
        }
        let Some(disk_id) = self.downloading.take() else {
            return;
        };
        match state.client.disk_delete(&disk_id) {
            Ok(()) => warn!("deleted partially downloaded boot disk {disk_id}"),
            Err(e) => state.ui.warn(&format!("error deleting partial boot disk {disk_id}: {e}")),
        }
    }
}
