//! Fronteras con el host: ejecución remota de comandos y aprovisionamiento.
//!
//! El orquestador no implementa SSH; recibe un `CommunicatorFactory` que
//! abre conexiones y un `Provisioner` que corre entre el boot y el apagado.

use std::io;
use std::path::PathBuf;

use crate::error::BuildError;
use crate::ui::Ui;

/// Comando a ejecutar en la máquina remota (se pasa tal cual al shell).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCmd {
    pub command: String,
}

impl RemoteCmd {
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CmdOutput {
    pub exit_status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CmdOutput {
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

/// Proceso remoto ya lanzado.
pub trait RemoteProcess {
    fn wait(self: Box<Self>) -> io::Result<CmdOutput>;
}

pub trait Communicator {
    fn start(&mut self, cmd: &RemoteCmd) -> io::Result<Box<dyn RemoteProcess>>;

    /// `start` + `wait`.
    fn run(&mut self, cmd: &RemoteCmd) -> io::Result<CmdOutput> {
        self.start(cmd)?.wait()
    }
}

/// A dónde y cómo conectarse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Option<String>,
    pub private_key_file: Option<PathBuf>,
}

pub trait CommunicatorFactory: Send + Sync {
    /// Un `Err` no es fatal por sí mismo: el step de conexión reintenta
    /// hasta su timeout.
    fn connect(&self, target: &SshTarget) -> io::Result<Box<dyn Communicator>>;
}

/// Callback de aprovisionamiento (subir archivos, correr scripts).
pub trait Provisioner: Send + Sync {
    fn provision(&self, ui: &dyn Ui, comm: &mut dyn Communicator) -> Result<(), BuildError>;
}

/// Provisioner que no hace nada.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProvisioner;

impl Provisioner for NoopProvisioner {
    fn provision(&self, _ui: &dyn Ui, _comm: &mut dyn Communicator) -> Result<(), BuildError> {
        Ok(())
    }
}

/// Corre cada comando en orden y falla con el primer exit status distinto de 0.
#[derive(Debug, Default, Clone)]
pub struct ShellProvisioner {
    commands: Vec<String>,
}

impl ShellProvisioner {
    pub fn new(commands: Vec<String>) -> Self {
        Self { commands }
    }
}

impl Provisioner for ShellProvisioner {
    fn provision(&self, ui: &dyn Ui, comm: &mut dyn Communicator) -> Result<(), BuildError> {
        for command in &self.commands {
            ui.say(&format!("Provisioning with shell command: {command}"));
            let out = comm.run(&RemoteCmd::new(command.as_str()))
                          .map_err(|e| BuildError::Communicator(format!("{command}: {e}")))?;
            if !out.stdout.is_empty() {
                ui.say(out.stdout.trim_end());
            }
            if !out.success() {
                return Err(BuildError::Communicator(format!("command `{command}` exited with status {}: {}",
                                                            out.exit_status,
                                                            out.stderr.trim_end())));
            }
        }
        Ok(())
    }
}
