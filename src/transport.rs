use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use crate::protocol::MAX_DATAGRAM_SIZE;
use crate::{Error, Result};

/// A blocking datagram socket with a receive timeout already configured.
///
/// Every exchange is one `send_to` followed by one `recv_from`; a receive that
/// runs past the timeout must fail with `WouldBlock` or `TimedOut`, the way
/// `std::net::UdpSocket` does once `set_read_timeout` is set.
pub trait Transport {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize>;
    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;
}

impl Transport for UdpSocket {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize> {
        UdpSocket::send_to(self, buf, addr)
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        UdpSocket::recv_from(self, buf)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize> {
        (**self).send_to(buf, addr)
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        (**self).recv_from(buf)
    }
}

/// IPv4 socket on an ephemeral port, broadcast enabled.
pub fn open_socket(timeout: Duration) -> io::Result<UdpSocket> {
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.set_broadcast(true)?;
    socket.set_read_timeout(Some(timeout))?;
    Ok(socket)
}

pub(crate) fn recv_error(e: io::Error) -> Error {
    match e.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Error::Timeout,
        _ => Error::Io(e),
    }
}

pub(crate) fn receive<T: Transport + ?Sized>(transport: &T) -> Result<(Vec<u8>, SocketAddr)> {
    let mut buf = [0u8; MAX_DATAGRAM_SIZE];
    let (len, from) = transport.recv_from(&mut buf).map_err(recv_error)?;
    Ok((buf[..len].to_vec(), from))
}

/// One request, one reply.
pub(crate) fn exchange<T: Transport + ?Sized>(
    transport: &T,
    addr: SocketAddr,
    request: &[u8],
) -> Result<Vec<u8>> {
    transport.send_to(request, addr)?;
    receive(transport).map(|(bytes, _)| bytes)
}
