//! Communicator sobre el cliente `ssh` de OpenSSH.
//!
//! Cada comando es un proceso `ssh` nuevo (sin multiplexado). Con password y
//! sin clave privada se envuelve en `sshpass -e`, que lee `SSHPASS` del
//! entorno del proceso hijo.

use std::io;
use std::process::{Child, Command, Stdio};

use hc_adapters::{CmdOutput, Communicator, CommunicatorFactory, RemoteCmd, RemoteProcess, SshTarget};
use log::debug;

/// Exit status que usa `ssh` para errores propios (conexión, auth).
const SSH_FAILURE: i32 = 255;
const CONNECT_TIMEOUT_SECS: u32 = 10;

/// Argumentos de `ssh` para `target`, sin el programa.
pub fn ssh_args(target: &SshTarget, command: &str) -> Vec<String> {
    let mut args = vec!["-o".to_string(),
                        "StrictHostKeyChecking=no".to_string(),
                        "-o".to_string(),
                        "UserKnownHostsFile=/dev/null".to_string(),
                        "-o".to_string(),
                        format!("ConnectTimeout={CONNECT_TIMEOUT_SECS}"),
                        "-p".to_string(),
                        target.port.to_string()];
    match &target.private_key_file {
        Some(key) => {
            args.push("-o".into());
            args.push("BatchMode=yes".into());
            args.push("-i".into());
            args.push(key.display().to_string());
        }
        None => {
            args.push("-o".into());
            args.push("PubkeyAuthentication=no".into());
        }
    }
    args.push(format!("{}@{}", target.username, target.host));
    args.push("--".into());
    args.push(command.to_string());
    args
}

fn command_for(target: &SshTarget, command: &str) -> Command {
    let args = ssh_args(target, command);
    match (&target.password, &target.private_key_file) {
        (Some(password), None) => {
            let mut cmd = Command::new("sshpass");
            cmd.arg("-e").arg("ssh").args(args).env("SSHPASS", password);
            cmd
        }
        _ => {
            let mut cmd = Command::new("ssh");
            cmd.args(args);
            cmd
        }
    }
}

pub struct OpenSshProcess {
    child: Child,
}

impl RemoteProcess for OpenSshProcess {
    fn wait(self: Box<Self>) -> io::Result<CmdOutput> {
        let out = self.child.wait_with_output()?;
        Ok(CmdOutput { exit_status: out.status.code().unwrap_or(-1),
                       stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
                       stderr: String::from_utf8_lossy(&out.stderr).into_owned() })
    }
}

pub struct OpenSshCommunicator {
    target: SshTarget,
}

impl Communicator for OpenSshCommunicator {
    fn start(&mut self, cmd: &RemoteCmd) -> io::Result<Box<dyn RemoteProcess>> {
        debug!("ssh {}@{}: {}", self.target.username, self.target.host, cmd.command);
        let child = command_for(&self.target, &cmd.command).stdin(Stdio::null())
                                                          .stdout(Stdio::piped())
                                                          .stderr(Stdio::piped())
                                                          .spawn()?;
        Ok(Box::new(OpenSshProcess { child }))
    }
}

/// Abre "conexiones" verificando que `true` corre del otro lado.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenSshFactory;

impl CommunicatorFactory for OpenSshFactory {
    fn connect(&self, target: &SshTarget) -> io::Result<Box<dyn Communicator>> {
        let mut comm = OpenSshCommunicator { target: target.clone() };
        let probe = comm.run(&RemoteCmd::new("true"))?;
        match probe.exit_status {
            0 => Ok(Box::new(comm)),
            SSH_FAILURE => Err(io::Error::new(io::ErrorKind::ConnectionRefused, probe.stderr.trim().to_string())),
            status => Err(io::Error::other(format!("ssh probe exited with status {status}: {}", probe.stderr.trim()))),
        }
    }
}
