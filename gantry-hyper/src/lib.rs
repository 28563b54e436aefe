//! Serve a [`gantry::Dispatcher`] with hyper.

use std::convert::Infallible;
use std::future::{ready, Future, Ready};
use std::io;
use std::net::*;
use std::pin::Pin;
use std::task::{Context, Poll};

use gantry::Dispatcher;
use hyper::server::conn::AddrIncoming;
use hyper::service::Service;

pub use hyper::Server;

/// Serve a dispatcher over HTTP.
pub trait Serve {
    /// Bind a hyper server to the address.
    fn serve(self, addr: impl ToSocketAddr) -> io::Result<Server<AddrIncoming, MakeGantryService>>;

    /// Convert into a hyper `MakeService`.
    fn into_make_service(self) -> MakeGantryService;

    /// Convert into a hyper `Service`.
    fn into_service(self) -> GantryService;
}

impl Serve for Dispatcher {
    fn serve(self, addr: impl ToSocketAddr) -> io::Result<Server<AddrIncoming, MakeGantryService>> {
        let addr = addr.to_socket_addr()?;
        let builder = hyper::Server::try_bind(&addr)
            .map_err(|err| io::Error::new(io::ErrorKind::AddrNotAvailable, err))?;

        tracing::info!(%addr, "listening");
        Ok(builder.serve(self.into_make_service()))
    }

    fn into_make_service(self) -> MakeGantryService {
        MakeGantryService {
            service: self.into_service(),
        }
    }

    fn into_service(self) -> GantryService {
        GantryService { dispatcher: self }
    }
}

/// Creates a [`GantryService`] for every connection.
#[derive(Clone)]
pub struct MakeGantryService {
    service: GantryService,
}

impl<T> Service<T> for MakeGantryService {
    type Response = GantryService;
    type Error = Infallible;
    type Future = Ready<Result<Self::Response, Infallible>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _: T) -> Self::Future {
        ready(Ok(self.service.clone()))
    }
}

/// A hyper service that dispatches each request.
///
/// Hyper drops the response future when the client disconnects, which
/// abandons the request's traversal of the middleware chain.
#[derive(Clone)]
pub struct GantryService {
    dispatcher: Dispatcher,
}

impl Service<hyper::Request<hyper::Body>> for GantryService {
    type Response = hyper::Response<hyper::Body>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: hyper::Request<hyper::Body>) -> Self::Future {
        let (parts, body) = req.into_parts();
        let req = hyper::Request::from_parts(parts, gantry::http::Body::stream(body));
        let dispatcher = self.dispatcher.clone();

        Box::pin(async move {
            let res = dispatcher.dispatch(req).await.into_http();
            let (parts, body) = res.into_parts();
            Ok(hyper::Response::from_parts(parts, hyper::Body::from(body)))
        })
    }
}

/// Types that can be converted into a socket address.
pub trait ToSocketAddr {
    fn to_socket_addr(self) -> io::Result<SocketAddr>;
}

impl ToSocketAddr for SocketAddr {
    fn to_socket_addr(self) -> io::Result<SocketAddr> {
        Ok(self)
    }
}

macro_rules! to_socket_addr {
    ($($ty:ty),*) => {$(
        impl ToSocketAddr for $ty {
            fn to_socket_addr(self) -> io::Result<SocketAddr> {
                self.to_socket_addrs()?.next().ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidInput, "no socket address resolved")
                })
            }
        }
    )*}
}

to_socket_addr! {
    &str,
    String,
    (&str, u16),
    (IpAddr, u16),
    (String, u16),
    (Ipv4Addr, u16),
    (Ipv6Addr, u16),
    SocketAddrV4,
    SocketAddrV6
}
