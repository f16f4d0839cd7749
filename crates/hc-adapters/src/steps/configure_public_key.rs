//! Reconcilia la clave pública local (`<ssh_private_key_file>.pub`) con las
//! registradas en la API y la asigna a la instancia.
//!
//! Se compara por contenido (trim de espacios); sólo se crea si ninguna
//! coincide, con nombre `<prefix>-<archivo de la clave privada>`.

use std::fs;
use std::path::{Path, PathBuf};

use hc_core::{Step, StepAction};

use super::finish;
use crate::error::BuildError;
use crate::state::{BuildState, StateKey};

pub struct StepConfigurePublicKey;

fn public_key_path(private_key: &Path) -> PathBuf {
    let mut raw = private_key.as_os_str().to_owned();
    raw.push(".pub");
    PathBuf::from(raw)
}

impl StepConfigurePublicKey {
    fn execute(&self, state: &mut BuildState) -> Result<(), BuildError> {
        let private_key = state.config
                               .ssh_private_key_file
                               .clone()
                               .ok_or_else(|| BuildError::precondition("ssh_private_key_file is required to configure a public key"))?;
        let pub_path = public_key_path(&private_key);
        if !pub_path.exists() {
            return Err(BuildError::precondition(format!("SSH public key file does not exist: {}", pub_path.display())));
        }
        let contents = fs::read_to_string(&pub_path)?;
        let contents = contents.trim();

        let keys = state.client.public_key_list()?;
        let key = match keys.into_iter().find(|k| k.same_material(contents)) {
            Some(found) => {
                state.ui.say("Public key already in system (matched by key content)");
                found
            }
            None => {
                state.ui.say("Public key not found. Creating.");
                let file_name = private_key.file_name()
                                           .map(|n| n.to_string_lossy().into_owned())
                                           .unwrap_or_default();
                let name = format!("{}-{file_name}", state.config.name_prefix);
                state.client.public_key_create(&name, contents)?
            }
        };

        let instance_id = state.instance_ref()?.id.clone();
        state.client.instance_update_public_keys(&instance_id, &[key.id])?;
        Ok(())
    }
}

impl Step<BuildState> for StepConfigurePublicKey {
    fn id(&self) -> &str {
        "configure_public_key"
    }

    fn requires(&self) -> Vec<StateKey> {
        vec![StateKey::Instance]
    }

    fn run(&mut self, state: &mut BuildState) -> StepAction {
        let result = self.execute(state);
        finish(state, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_key_sits_next_to_the_private_one() {
        assert_eq!(public_key_path(Path::new("/home/me/.ssh/id_ed25519")),
                   PathBuf::from("/home/me/.ssh/id_ed25519.pub"));
    }
}
