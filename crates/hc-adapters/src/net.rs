//! Utilidades de red locales: elección de puerto libre y la IP con la que
//! la instancia remota ve a este host.

use std::fmt::Display;
use std::net::{IpAddr, UdpSocket};

use log::debug;
use rand::seq::SliceRandom;

use crate::error::BuildError;

/// Prueba los puertos de `[min, max)` en orden aleatorio hasta que `bind`
/// funcione. Con `min == max` sólo prueba `min`.
pub fn bind_random_port<T, E, F>(min: u16, max: u16, mut bind: F) -> Result<(u16, T), BuildError>
    where E: Display,
          F: FnMut(u16) -> Result<T, E>
{
    let mut ports: Vec<u16> = if max > min { (min..max).collect() } else { vec![min] };
    ports.shuffle(&mut rand::thread_rng());
    for port in ports {
        debug!("trying port {port}");
        match bind(port) {
            Ok(bound) => return Ok((port, bound)),
            Err(e) => debug!("port {port} unavailable: {e}"),
        }
    }
    Err(BuildError::precondition(format!("no free port between {min} and {max}")))
}

/// IP local de salida (sin tráfico: un socket UDP "conectado" sólo elige
/// la ruta).
pub fn guess_local_ip() -> std::io::Result<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.connect("192.0.2.1:80")?;
    let ip = socket.local_addr()?.ip();
    if ip.is_loopback() || ip.is_unspecified() {
        return Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no local ip addresses found"));
    }
    Ok(ip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn skips_ports_that_fail() {
        let (port, _) = bind_random_port(7000, 7010, |p| if p == 7004 { Ok(()) } else { Err("busy") })
            .expect("debería encontrar 7004");
        assert_eq!(port, 7004);
    }

    #[test]
    fn exhausted_range_is_a_precondition_error() {
        let err = bind_random_port(7000, 7003, |_| Err::<(), _>("busy")).expect_err("no hay puertos");
        assert!(matches!(err, BuildError::Precondition(_)));
    }

    #[test]
    fn binds_a_real_listener() {
        let (port, listener) = bind_random_port(0, 0, |p| TcpListener::bind(("127.0.0.1", p))).expect("bind");
        assert_eq!(port, 0);
        assert_ne!(listener.local_addr().expect("addr").port(), 0);
    }
}
