//! embassy-net UDP socket adapter
//!
//! Implements the non-blocking `DatagramSocket` trait by polling the
//! embassy-net socket once with a no-op waker. Tasks that want to sleep
//! until a datagram arrives await [`EspUdpSocket::wait_readable`] first.

use core::task::{Context, Poll, Waker};

use embassy_futures::select::select;
use embassy_net::udp::{SendError, UdpSocket};
use embassy_net::{IpAddress, IpEndpoint, Stack};
use watchpost_hal::{DatagramSocket, NetError, SplitSocket};
use watchpost_protocol::Endpoint;

pub use watchpost_hal::Subnet;

pub struct EspUdpSocket<'a> {
    stack: Stack<'a>,
    socket: UdpSocket<'a>,
}

impl<'a> EspUdpSocket<'a> {
    /// Wrap a socket that is already bound
    pub fn new(stack: Stack<'a>, socket: UdpSocket<'a>) -> Self {
        Self { stack, socket }
    }

    /// Resolve once a datagram is queued
    pub async fn wait_readable(&self) {
        self.socket.wait_recv_ready().await
    }
}

impl DatagramSocket for EspUdpSocket<'_> {
    fn try_send_to(&mut self, payload: &[u8], dest: Endpoint) -> Result<(), NetError> {
        if !self.stack.is_config_up() {
            return Err(NetError::NotReady);
        }
        let remote = IpEndpoint::new(IpAddress::Ipv4(dest.ip), dest.port);
        let mut cx = Context::from_waker(Waker::noop());
        match self.socket.poll_send_to(payload, remote, &mut cx) {
            Poll::Ready(Ok(())) => Ok(()),
            Poll::Ready(Err(SendError::NoRoute)) => Err(NetError::NoRoute),
            Poll::Ready(Err(_)) => Err(NetError::NotReady),
            Poll::Pending => Err(NetError::WouldBlock),
        }
    }

    fn try_recv_from(&mut self, buffer: &mut [u8]) -> Result<Option<(usize, Endpoint)>, NetError> {
        let mut cx = Context::from_waker(Waker::noop());
        match self.socket.poll_recv_from(buffer, &mut cx) {
            Poll::Ready(Ok((len, meta))) => {
                #[allow(unreachable_patterns)]
                let ip = match meta.endpoint.addr {
                    IpAddress::Ipv4(ip) => ip,
                    _ => return Ok(None),
                };
                Ok(Some((len, Endpoint::new(ip, meta.endpoint.port))))
            }
            Poll::Ready(Err(_)) => Err(NetError::Truncated),
            Poll::Pending => Ok(None),
        }
    }
}

/// Routes datagrams between the access point and station interfaces
///
/// Destinations inside the access point subnet go out the AP socket and
/// everything else goes out the station socket. Receives drain the AP
/// side first; an AP receive error does not stop the station side from
/// being polled.
pub struct ApStaSocket<'a> {
    inner: SplitSocket<EspUdpSocket<'a>, EspUdpSocket<'a>>,
}

impl<'a> ApStaSocket<'a> {
    pub fn new(ap: EspUdpSocket<'a>, sta: EspUdpSocket<'a>, ap_subnet: Subnet) -> Self {
        Self {
            inner: SplitSocket::new(ap, sta, ap_subnet),
        }
    }

    /// Resolve once either side has a datagram queued
    pub async fn wait_readable(&self) {
        select(
            self.inner.local().wait_readable(),
            self.inner.upstream().wait_readable(),
        )
        .await;
    }
}

impl DatagramSocket for ApStaSocket<'_> {
    fn try_send_to(&mut self, payload: &[u8], dest: Endpoint) -> Result<(), NetError> {
        self.inner.try_send_to(payload, dest)
    }

    fn try_recv_from(&mut self, buffer: &mut [u8]) -> Result<Option<(usize, Endpoint)>, NetError> {
        self.inner.try_recv_from(buffer)
    }
}
