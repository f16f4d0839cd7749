//! Cliente RFB mínimo: lo justo para autenticarse y mandar teclas.

use std::io::{self, Read, Write};

use log::{debug, info};

use crate::auth::{VncAuth, SECURITY_TYPE_VNC};
use crate::keys::KeyboardSink;
use crate::VncError;

const MSG_KEY_EVENT: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProtocolVersion {
    V3_3,
    V3_7,
    V3_8,
}

impl ProtocolVersion {
    /// Elige la versión más alta que ambos hablan a partir del banner
    /// `RFB xxx.yyy\n` del servidor.
    fn negotiate(banner: &[u8; 12]) -> Result<Self, VncError> {
        let text = String::from_utf8_lossy(banner);
        let parsed = text.strip_prefix("RFB ")
                         .and_then(|v| v.strip_suffix('\n'))
                         .and_then(|v| v.split_once('.'))
                         .and_then(|(major, minor)| Some((major.parse::<u32>().ok()?, minor.parse::<u32>().ok()?)));
        match parsed {
            Some((3, minor)) if minor >= 8 => Ok(Self::V3_8),
            Some((3, 7)) => Ok(Self::V3_7),
            Some((3, minor)) if minor >= 3 => Ok(Self::V3_3),
            Some((major, _)) if major > 3 => Ok(Self::V3_8),
            _ => Err(VncError::UnsupportedVersion(text.into_owned())),
        }
    }

    fn banner(self) -> &'static [u8; 12] {
        match self {
            Self::V3_3 => b"RFB 003.003\n",
            Self::V3_7 => b"RFB 003.007\n",
            Self::V3_8 => b"RFB 003.008\n",
        }
    }
}

pub struct RfbClient<S: Read + Write> {
    stream: S,
    version: ProtocolVersion,
    width: u16,
    height: u16,
    desktop_name: String,
}

fn read_u8<R: Read>(r: &mut R) -> io::Result<u8> {
    let mut b = [0u8; 1];
    r.read_exact(&mut b)?;
    Ok(b[0])
}

fn read_u16<R: Read>(r: &mut R) -> io::Result<u16> {
    let mut b = [0u8; 2];
    r.read_exact(&mut b)?;
    Ok(u16::from_be_bytes(b))
}

fn read_u32<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b)?;
    Ok(u32::from_be_bytes(b))
}

fn read_string<R: Read>(r: &mut R) -> io::Result<String> {
    let len = read_u32(r)? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

impl<S: Read + Write> RfbClient<S> {
    /// Handshake completo: versión, seguridad (VNC auth con `password`),
    /// resultado, ClientInit y ServerInit. `shared = true` no desconecta a
    /// otros clientes de la consola.
    pub fn connect(mut stream: S, password: &str, shared: bool) -> Result<Self, VncError> {
        let mut banner = [0u8; 12];
        stream.read_exact(&mut banner)?;
        let version = ProtocolVersion::negotiate(&banner)?;
        stream.write_all(version.banner())?;
        debug!("rfb version negotiated: {version:?}");

        if version == ProtocolVersion::V3_3 {
            // el servidor impone el tipo
            match read_u32(&mut stream)? {
                0 => return Err(VncError::Refused(read_string(&mut stream)?)),
                t if t == u32::from(SECURITY_TYPE_VNC) => {}
                t => return Err(VncError::NoSupportedSecurity(vec![t as u8])),
            }
        } else {
            let count = read_u8(&mut stream)?;
            if count == 0 {
                return Err(VncError::Refused(read_string(&mut stream)?));
            }
            let mut offered = vec![0u8; count as usize];
            stream.read_exact(&mut offered)?;
            if !offered.contains(&SECURITY_TYPE_VNC) {
                return Err(VncError::NoSupportedSecurity(offered));
            }
            stream.write_all(&[SECURITY_TYPE_VNC])?;
        }

        VncAuth::new(password).handshake(&mut stream)?;

        match read_u32(&mut stream)? {
            0 => {}
            _ if version == ProtocolVersion::V3_8 => return Err(VncError::AuthRejected(read_string(&mut stream)?)),
            status => return Err(VncError::AuthRejected(format!("security result {status}"))),
        }

        stream.write_all(&[u8::from(shared)])?;
        stream.flush()?;

        let width = read_u16(&mut stream)?;
        let height = read_u16(&mut stream)?;
        let mut pixel_format = [0u8; 16];
        stream.read_exact(&mut pixel_format)?;
        let desktop_name = read_string(&mut stream)?;
        info!("connected to vnc desktop '{desktop_name}' ({width}x{height})");

        Ok(Self { stream,
                  version,
                  width,
                  height,
                  desktop_name })
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn desktop_name(&self) -> &str {
        &self.desktop_name
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: Read + Write> KeyboardSink for RfbClient<S> {
    fn key_event(&mut self, keysym: u32, down: bool) -> io::Result<()> {
        let k = keysym.to_be_bytes();
        self.stream.write_all(&[MSG_KEY_EVENT, u8::from(down), 0, 0, k[0], k[1], k[2], k[3]])?;
        self.stream.flush()
    }
}
