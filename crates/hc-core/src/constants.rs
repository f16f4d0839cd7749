//! Constantes del motor core.
//!
//! Valores por defecto de la primitiva de polling y de los umbrales que usan
//! los steps. Todos son sobreescribibles desde la configuración del build;
//! aquí sólo viven los defaults.

use std::time::Duration;

/// Cadencia de polling para estados de recursos remotos (disco, instancia,
/// sesión de consola).
pub const STATE_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Cadencia de polling mientras se espera que el guest se apague solo.
pub const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Timeout por defecto para cualquier espera remota (boot, stop, terminate,
/// consola lista, attach/detach en vivo).
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(180);

/// Tamaño mínimo (bytes) que debe anunciar `Content-Length` para aceptar una
/// URL de boot media. Heurística: algo más chico probablemente no es un ISO.
pub const BOOT_MEDIA_MIN_SIZE: u64 = 10 * 1024 * 1024;
